use crate::infra::{build_optimizer, InMemoryCatalog};
use build_advisor::builds::{Build, ComponentType, OptimizationOutcome, OptimizationRequest};
use build_advisor::config::{AppConfig, CatalogConfig};
use build_advisor::error::AppError;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// What the computer will be used for, e.g. "4K gaming" or "video editing".
    #[arg(long, default_value = "1440p gaming")]
    pub(crate) purpose: String,
    /// Catalog id of a component already in the build. Repeat for each part.
    #[arg(long = "component")]
    pub(crate) components: Vec<String>,
    /// CSV catalog to use instead of the bundled one.
    #[arg(long)]
    pub(crate) catalog_csv: Option<PathBuf>,
    /// Print the full outcome as JSON instead of a summary.
    #[arg(long)]
    pub(crate) json: bool,
    /// Also print advisory suggestions for the supplied build.
    #[arg(long)]
    pub(crate) advice: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(path) = args.catalog_csv {
        config.catalog = CatalogConfig {
            csv_path: Some(path),
        };
    }

    let catalog = InMemoryCatalog::load(&config.catalog)?;
    let mut current = Build::new(args.purpose.clone());
    for id in &args.components {
        match catalog.get(id) {
            Some(component) => {
                if let Some(replaced) = current.place(component.clone()) {
                    println!(
                        "note: {id} replaces {} in the {} slot",
                        replaced.id, replaced.component_type
                    );
                }
            }
            None => println!("note: unknown component id {id} skipped"),
        }
    }

    let optimizer = build_optimizer(catalog, config.optimizer.clone());

    if args.advice {
        println!("Advice");
        for suggestion in optimizer.advise(current.clone()).await {
            let target = suggestion
                .suggested_component_id
                .as_ref()
                .map(|id| format!(" (try {id})"))
                .unwrap_or_default();
            println!("  - {}{}", suggestion.message, target);
        }
        println!();
    }

    let outcome = optimizer
        .optimize(OptimizationRequest::new(args.purpose, current))
        .await;

    if args.json {
        match serde_json::to_string_pretty(&outcome) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("failed to render outcome: {err}"),
        }
        return Ok(());
    }

    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &OptimizationOutcome) {
    println!(
        "Build for {} ({})",
        outcome.purpose,
        outcome.profile.kind.label()
    );
    for slot in ComponentType::ordered() {
        match outcome.build.get(slot) {
            Some(component) => println!(
                "  {:<12} {} {} ({:.0})",
                slot.label(),
                component.brand,
                component.name,
                component.price
            ),
            None => println!("  {:<12} -", slot.label()),
        }
    }
    println!("  {:<12} {:.0}", "total", outcome.build.total_price());

    if !outcome.changes.is_empty() {
        println!();
        println!("Changes");
        for change in &outcome.changes {
            println!("  - {}", change.note);
        }
    }

    if !outcome.flags.is_empty() {
        println!();
        println!("Unresolved");
        for flag in outcome.unresolved_flags() {
            println!("  - {flag}");
        }
    }

    println!();
    println!("{}", outcome.explanation);
}
