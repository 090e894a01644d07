use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::outcome::{BuildFlag, ExplanationSource, FlagKind};
use crate::builds::adapters::{ExplanationAdapter, ExplanationError, ExplanationRequest};
use crate::builds::domain::{ComponentType, SlotChange};

pub(crate) struct Explanation {
    pub text: String,
    pub source: ExplanationSource,
    pub flag: Option<BuildFlag>,
}

/// Ask the adapter for a rationale, bounded by `timeout`. Any failure yields
/// the templated summary plus an `ExplanationUnavailable` flag.
pub(crate) async fn explain<E>(
    explainer: Arc<E>,
    request: ExplanationRequest,
    changes: &[SlotChange],
    timeout: Duration,
) -> Explanation
where
    E: ExplanationAdapter + 'static,
{
    let fallback_text = fallback(&request, changes);
    let call = tokio::task::spawn_blocking(move || explainer.explain(&request));

    let error = match tokio::time::timeout(timeout, call).await {
        Ok(Ok(Ok(text))) if !text.trim().is_empty() => {
            return Explanation {
                text,
                source: ExplanationSource::Generated,
                flag: None,
            };
        }
        Ok(Ok(Ok(_))) => ExplanationError::Backend("empty explanation".to_string()),
        Ok(Ok(Err(err))) => err,
        Ok(Err(join_error)) => ExplanationError::Backend(join_error.to_string()),
        Err(_) => ExplanationError::TimedOut(timeout.as_millis()),
    };

    warn!(error = %error, "explanation unavailable; using template");
    Explanation {
        text: fallback_text,
        source: ExplanationSource::Fallback,
        flag: Some(BuildFlag::new(
            FlagKind::ExplanationUnavailable,
            None,
            error.to_string(),
        )),
    }
}

/// Deterministic plain-text summary used when no generated text is available.
pub(crate) fn fallback(request: &ExplanationRequest, changes: &[SlotChange]) -> String {
    let build = &request.recommended;
    let mut lines = vec![format!(
        "Recommended build for {} ({}): {} of {} slots filled, total price {:.0}.",
        request.profile.purpose,
        request.profile.kind.label(),
        build.len(),
        ComponentType::ordered().len(),
        build.total_price()
    )];

    for component in ComponentType::ordered()
        .into_iter()
        .filter_map(|slot| build.get(slot))
    {
        lines.push(format!(
            "- {}: {} {} ({:.0})",
            component.component_type, component.brand, component.name, component.price
        ));
    }

    if changes.is_empty() {
        lines.push("No components were changed.".to_string());
    } else {
        lines.push("Changes:".to_string());
        lines.extend(changes.iter().map(|change| format!("- {}", change.note)));
    }

    if !request.issues.is_empty() {
        lines.push("Outstanding compatibility issues:".to_string());
        lines.extend(
            request
                .issues
                .iter()
                .map(|issue| format!("- {}", issue.message)),
        );
    }

    lines.join("\n")
}
