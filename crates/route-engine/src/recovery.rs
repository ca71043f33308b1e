//! Failure recovery: rerouting after a selected backend reports failure

use crate::engine::rank_backends;
use crate::latency::NetworkLatencyModel;
use route_core::{FilteredBackend, RoutingResult};
use tracing::{error, info, warn};

/// Produces fallback routing decisions when a selected backend fails.
///
/// Recovery operates on the `considered_backends` snapshot already captured
/// in the prior result rather than a freshly read registry, keeping each
/// fallback deterministic relative to the decision it recovers from.
pub struct FailureRecoveryHandler;

impl FailureRecoveryHandler {
    /// Reroute to the next best backend after a failure.
    ///
    /// The failed backend is removed from the candidate pool and appended to
    /// `filtered_out` under the given reason. With no candidates left, the
    /// returned result is terminal: no selection and an infinite score.
    /// Invoking this without a selected backend in `result` is caller
    /// misuse; it is logged and the input is returned unchanged.
    pub fn handle_failure(
        result: &RoutingResult,
        failure_reason: &str,
        user_region: &str,
        latency: &NetworkLatencyModel,
    ) -> RoutingResult {
        let failed_backend = match &result.selected_backend {
            Some(backend) => backend.clone(),
            None => {
                error!("Cannot handle failure: no backend was selected");
                return result.clone();
            }
        };

        warn!(
            "Backend {} ({}) failed: {}",
            failed_backend.backend_id, failed_backend.chip_type, failure_reason
        );

        let remaining: Vec<_> = result
            .considered_backends
            .iter()
            .filter(|b| b.backend_id != failed_backend.backend_id)
            .cloned()
            .collect();

        let mut filtered_out = result.filtered_out.clone();
        filtered_out.push(FilteredBackend {
            backend: failed_backend.clone(),
            reason: failure_reason.to_string(),
        });

        if remaining.is_empty() {
            error!(
                "No fallback backends available for request {}",
                result.request.unique_id
            );
            return RoutingResult {
                request: result.request.clone(),
                selected_backend: None,
                score: f64::INFINITY,
                considered_backends: result.considered_backends.clone(),
                filtered_out,
                is_fallback: true,
                original_backend: Some(failed_backend),
                fallback_reason: failure_reason.to_string(),
                final_latency_ms: 0,
                final_cost: 0.0,
                sla_met: false,
            };
        }

        let ranked = rank_backends(&result.request, remaining, user_region, latency);
        let (next_best, next_score) = ranked[0].clone();

        let sla_met = next_score.total_latency_ms <= result.request.required_latency_ms;

        info!(
            "Rerouting request {} to fallback backend: {} in {}, latency {}ms",
            result.request.unique_id,
            next_best.chip_type,
            next_best.region,
            next_score.total_latency_ms
        );

        RoutingResult {
            request: result.request.clone(),
            selected_backend: Some(next_best),
            score: next_score.score,
            considered_backends: ranked.into_iter().map(|(backend, _)| backend).collect(),
            filtered_out,
            is_fallback: true,
            original_backend: Some(failed_backend),
            fallback_reason: failure_reason.to_string(),
            final_latency_ms: next_score.total_latency_ms,
            final_cost: next_score.total_cost,
            sla_met,
        }
    }
}
