//! Inference request model

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// An AI model inference request to be routed to an appropriate backend.
///
/// Requests are immutable by convention: construct a new one when parameters
/// change rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Name of the AI model to use
    pub model_name: String,

    /// Size of the input in tokens
    pub input_token_size: u32,

    /// Maximum acceptable latency in milliseconds (the SLA)
    pub required_latency_ms: u32,

    /// Compliance requirements the serving backend must satisfy
    /// (e.g. "gdpr", "hipaa")
    #[serde(default)]
    pub compliance_constraints: BTreeSet<String>,

    /// Unique identifier for the request
    #[serde(default = "generate_request_id")]
    pub unique_id: String,

    /// Priority level, 1-5 with 1 being highest
    #[serde(default = "default_priority")]
    pub priority: u8,

    /// Optional maximum cost per request, in USD
    #[serde(default)]
    pub max_cost: Option<f64>,

    /// Prioritize cost savings over minimal latency
    #[serde(default)]
    pub prefer_cost_over_latency: bool,
}

fn generate_request_id() -> String {
    format!("req-{}", Uuid::new_v4())
}

fn default_priority() -> u8 {
    1
}

impl InferenceRequest {
    /// Create a request with a generated id and default priority
    pub fn new(
        model_name: impl Into<String>,
        input_token_size: u32,
        required_latency_ms: u32,
        compliance_constraints: BTreeSet<String>,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            input_token_size,
            required_latency_ms,
            compliance_constraints,
            unique_id: generate_request_id(),
            priority: default_priority(),
            max_cost: None,
            prefer_cost_over_latency: false,
        }
    }

    /// Set the request priority (1-5, 1 highest)
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Set a maximum cost bound in USD
    pub fn with_max_cost(mut self, max_cost: f64) -> Self {
        self.max_cost = Some(max_cost);
        self
    }

    /// Prefer cost savings over minimal latency
    pub fn preferring_cost(mut self) -> Self {
        self.prefer_cost_over_latency = true;
        self
    }
}
