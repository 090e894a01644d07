use crate::cli::ServeArgs;
use crate::infra::{build_optimizer, AppState, InMemoryCatalog};
use crate::routes::with_build_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use build_advisor::config::AppConfig;
use build_advisor::error::AppError;
use build_advisor::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = InMemoryCatalog::load(&config.catalog)?;
    info!(
        components = catalog.len(),
        source = ?config.catalog.csv_path,
        "catalog ready"
    );
    let optimizer = Arc::new(build_optimizer(catalog, config.optimizer.clone()));

    let app = with_build_routes(optimizer)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "build advisor ready");

    axum::serve(listener, app).await?;
    Ok(())
}
