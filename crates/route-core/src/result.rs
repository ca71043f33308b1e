//! Routing decision results

use crate::{Backend, InferenceRequest};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A backend that was rejected during filtering, with the reason it failed.
///
/// Exactly one reason is recorded per backend: the first check (in the fixed
/// filter order) that it failed. The reason text is part of the observable
/// contract and is surfaced verbatim to end users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredBackend {
    pub backend: Backend,
    pub reason: String,
}

/// Result of a routing decision, including the selected backend and the
/// evidence behind the choice.
///
/// A result is created once per routing decision or per failure-recovery step
/// and never mutated afterwards; fallback produces a new result that replaces
/// the prior one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingResult {
    /// The original inference request
    pub request: InferenceRequest,

    /// The chosen backend, if any
    pub selected_backend: Option<Backend>,

    /// Score of the selected backend (lower is better); infinity when
    /// no backend could be selected
    pub score: f64,

    /// Backends that passed every filter, ordered best score first
    pub considered_backends: Vec<Backend>,

    /// Backends rejected during filtering, each with its reason
    pub filtered_out: Vec<FilteredBackend>,

    /// Whether this is a fallback selection
    pub is_fallback: bool,

    /// The originally selected backend if this is a fallback
    pub original_backend: Option<Backend>,

    /// Reason for fallback if applicable
    pub fallback_reason: String,

    /// Expected latency for the selected backend
    pub final_latency_ms: u32,

    /// Expected cost for the selected backend
    pub final_cost: f64,

    /// Whether the required latency SLA is met
    pub sla_met: bool,
}

impl RoutingResult {
    /// Result for a request with no compatible backend at all
    pub fn unroutable(request: InferenceRequest, filtered_out: Vec<FilteredBackend>) -> Self {
        Self {
            request,
            selected_backend: None,
            score: f64::INFINITY,
            considered_backends: Vec::new(),
            filtered_out,
            is_fallback: false,
            original_backend: None,
            fallback_reason: String::new(),
            final_latency_ms: 0,
            final_cost: 0.0,
            sla_met: false,
        }
    }

    /// Whether a backend was selected
    pub fn is_routed(&self) -> bool {
        self.selected_backend.is_some()
    }

    /// Condensed JSON view of the decision, consumed by the dashboard and
    /// CLI for display and logging.
    pub fn summary(&self) -> Value {
        let mut output = json!({
            "request_info": {
                "id": self.request.unique_id,
                "model": self.request.model_name,
                "input_tokens": self.request.input_token_size,
                "required_latency_ms": self.request.required_latency_ms,
                "compliance": self.request.compliance_constraints,
                "priority": self.request.priority,
                "max_cost": self.request.max_cost,
                "prefer_cost_over_latency": self.request.prefer_cost_over_latency,
            },
            "considered_backends": self.considered_backends.iter().map(|backend| {
                json!({
                    "id": backend.backend_id,
                    "chip": backend.chip_type,
                    "region": backend.region,
                    "status": backend.status,
                })
            }).collect::<Vec<_>>(),
            "filtered_backends": self.filtered_out.iter().map(|filtered| {
                json!({
                    "id": filtered.backend.backend_id,
                    "chip": filtered.backend.chip_type,
                    "region": filtered.backend.region,
                    "reason": filtered.reason,
                })
            }).collect::<Vec<_>>(),
            "is_fallback": self.is_fallback,
            "sla_met": self.sla_met,
        });

        output["decision"] = match &self.selected_backend {
            Some(backend) => json!({
                "selected_backend_id": backend.backend_id,
                "chip_type": backend.chip_type,
                "region": backend.region,
                "status": backend.status,
                "score": self.score,
                "final_latency_ms": self.final_latency_ms,
                "final_cost": self.final_cost,
                "estimated_queue_time_ms": backend.estimated_queue_time_ms,
                "current_load": backend.current_load,
            }),
            None => json!({
                "error": "No compatible backend found",
            }),
        };

        if self.is_fallback {
            if let Some(original) = &self.original_backend {
                output["fallback_info"] = json!({
                    "original_backend_id": original.backend_id,
                    "original_chip_type": original.chip_type,
                    "failure_reason": self.fallback_reason,
                });
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BackendId, BackendStatus};
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn test_backend(id: &str) -> Backend {
        Backend {
            backend_id: BackendId::new(id),
            chip_type: "GPU".to_string(),
            latency_ms: 100,
            cost_per_token: 0.001,
            region: "us-east-1".to_string(),
            supported_models: vec!["m1".to_string()],
            status: BackendStatus::Healthy,
            compliance_tags: BTreeSet::new(),
            max_token_size: 2000,
            current_load: 0.0,
            estimated_queue_time_ms: 0,
            last_updated: Utc::now(),
        }
    }

    fn test_request() -> InferenceRequest {
        InferenceRequest::new("m1", 500, 150, BTreeSet::new())
    }

    #[test]
    fn test_unroutable_result() {
        let filtered = vec![FilteredBackend {
            backend: test_backend("b1"),
            reason: "Backend is down".to_string(),
        }];
        let result = RoutingResult::unroutable(test_request(), filtered);

        assert!(!result.is_routed());
        assert!(result.score.is_infinite());
        assert!(result.considered_backends.is_empty());
        assert!(!result.sla_met);
        assert_eq!(result.filtered_out.len(), 1);
    }

    #[test]
    fn test_summary_without_selection() {
        let result = RoutingResult::unroutable(test_request(), Vec::new());
        let summary = result.summary();

        assert_eq!(
            summary["decision"]["error"],
            json!("No compatible backend found")
        );
        assert_eq!(summary["is_fallback"], json!(false));
        assert_eq!(summary["sla_met"], json!(false));
        assert!(summary.get("fallback_info").is_none());
    }

    #[test]
    fn test_summary_with_selection() {
        let backend = test_backend("b1");
        let mut result = RoutingResult::unroutable(test_request(), Vec::new());
        result.selected_backend = Some(backend.clone());
        result.considered_backends = vec![backend];
        result.score = 0.1;
        result.final_latency_ms = 101;
        result.final_cost = 0.5;
        result.sla_met = true;

        let summary = result.summary();
        assert_eq!(summary["decision"]["selected_backend_id"], json!("b1"));
        assert_eq!(summary["decision"]["final_latency_ms"], json!(101));
        assert_eq!(summary["considered_backends"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_summary_with_fallback_info() {
        let failed = test_backend("b1");
        let mut result = RoutingResult::unroutable(test_request(), Vec::new());
        result.is_fallback = true;
        result.original_backend = Some(failed);
        result.fallback_reason = "connection timeout".to_string();

        let summary = result.summary();
        assert_eq!(summary["fallback_info"]["original_backend_id"], json!("b1"));
        assert_eq!(
            summary["fallback_info"]["failure_reason"],
            json!("connection timeout")
        );
    }
}
