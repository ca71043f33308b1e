//! Compatibility filtering of backends for a request
//!
//! A fixed, ordered chain of checks decides whether a backend may serve a
//! request at all. Evaluation short-circuits: the first failing check
//! supplies the rejection reason. The reason strings are surfaced verbatim
//! to end users and are part of the observable contract.

use route_core::{Backend, BackendStatus, InferenceRequest};

/// A single named compatibility check.
///
/// The order of the variants in [`CompatibilityCheck::ORDER`] is fixed:
/// cheap structural checks run before derived ones, and the first failure
/// determines the rejection reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatibilityCheck {
    /// Down backends are never routable
    Status,
    /// The requested model must be in the backend's supported list
    ModelSupport,
    /// The request input must fit the backend's token limit
    TokenSize,
    /// The request's compliance constraints must all be provided
    Compliance,
    /// Projected total latency must fit the request's SLA
    Latency,
    /// Projected cost must fit the request's cost bound, if one is set
    Cost,
}

impl CompatibilityCheck {
    /// The fixed evaluation order of the filter chain
    pub const ORDER: [CompatibilityCheck; 6] = [
        CompatibilityCheck::Status,
        CompatibilityCheck::ModelSupport,
        CompatibilityCheck::TokenSize,
        CompatibilityCheck::Compliance,
        CompatibilityCheck::Latency,
        CompatibilityCheck::Cost,
    ];

    /// Evaluate this check against a backend, returning the rejection reason
    /// if the backend fails it
    pub fn evaluate(
        &self,
        backend: &Backend,
        request: &InferenceRequest,
        network_latency_ms: u32,
    ) -> Option<String> {
        match self {
            CompatibilityCheck::Status => {
                if backend.status == BackendStatus::Down {
                    return Some("Backend is down".to_string());
                }
                None
            }
            CompatibilityCheck::ModelSupport => {
                if !backend.supports_model(&request.model_name) {
                    return Some(format!("Model {} not supported", request.model_name));
                }
                None
            }
            CompatibilityCheck::TokenSize => {
                if request.input_token_size > backend.max_token_size {
                    return Some("Token size exceeds backend limit".to_string());
                }
                None
            }
            CompatibilityCheck::Compliance => {
                let missing = backend.missing_compliance_tags(&request.compliance_constraints);
                if !missing.is_empty() {
                    return Some(format!("Missing compliance tags: {:?}", missing));
                }
                None
            }
            CompatibilityCheck::Latency => {
                let total_latency = projected_latency_ms(backend, network_latency_ms);
                if total_latency > request.required_latency_ms {
                    return Some(format!(
                        "Total latency ({}ms) exceeds required SLA ({}ms)",
                        total_latency, request.required_latency_ms
                    ));
                }
                None
            }
            CompatibilityCheck::Cost => {
                if let Some(max_cost) = request.max_cost {
                    let estimated_cost =
                        backend.cost_per_token * request.input_token_size as f64;
                    if estimated_cost > max_cost {
                        return Some(format!(
                            "Estimated cost (${:.6}) exceeds maximum (${:.6})",
                            estimated_cost, max_cost
                        ));
                    }
                }
                None
            }
        }
    }
}

/// Projected total latency used by the latency check: backend base latency
/// plus network latency plus estimated queue time, all inflated by 1.5 when
/// the backend is degraded.
fn projected_latency_ms(backend: &Backend, network_latency_ms: u32) -> u32 {
    let mut total = backend.latency_ms + network_latency_ms + backend.estimated_queue_time_ms;
    if backend.status == BackendStatus::Degraded {
        total = (total as f64 * 1.5) as u32;
    }
    total
}

/// The ordered, short-circuiting compatibility filter chain
pub struct CompatibilityFilter;

impl CompatibilityFilter {
    /// Run the full chain, returning the first rejection reason, or `None`
    /// if the backend is compatible with the request
    pub fn first_rejection(
        backend: &Backend,
        request: &InferenceRequest,
        network_latency_ms: u32,
    ) -> Option<String> {
        CompatibilityCheck::ORDER
            .iter()
            .find_map(|check| check.evaluate(backend, request, network_latency_ms))
    }
}
