//! Backend entity model

use crate::{BackendId, BackendStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A hardware backend capable of running AI model inference.
///
/// Backends are mutable entities: `status`, `current_load`, and
/// `estimated_queue_time_ms` change over time through status updates and the
/// fluctuation simulator. All other fields are fixed at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backend {
    /// Unique identifier for the backend
    pub backend_id: BackendId,

    /// Type of hardware chip (e.g. "GPU", "TPU", "Groq LPU", "Cerebras")
    pub chip_type: String,

    /// Expected latency in milliseconds for standard inference
    pub latency_ms: u32,

    /// Cost per token in dollars
    pub cost_per_token: f64,

    /// Geographic region where the backend is located
    pub region: String,

    /// Model names supported by this backend
    pub supported_models: Vec<String>,

    /// Current operational status
    #[serde(default = "default_status")]
    pub status: BackendStatus,

    /// Compliance features provided by this backend
    #[serde(default)]
    pub compliance_tags: BTreeSet<String>,

    /// Maximum token size this backend can handle
    pub max_token_size: u32,

    /// Current load percentage (0-100)
    #[serde(default)]
    pub current_load: f64,

    /// Estimated time a new request would spend in queue
    #[serde(default)]
    pub estimated_queue_time_ms: u32,

    /// Last time the mutable state was updated
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

fn default_status() -> BackendStatus {
    // A backend that does not declare its status is not routable.
    BackendStatus::Down
}

impl Backend {
    /// Whether this backend supports the named model
    pub fn supports_model(&self, model_name: &str) -> bool {
        self.supported_models.iter().any(|m| m == model_name)
    }

    /// Compliance tags required by `constraints` but not provided here
    pub fn missing_compliance_tags(&self, constraints: &BTreeSet<String>) -> BTreeSet<String> {
        constraints.difference(&self.compliance_tags).cloned().collect()
    }

    /// Overwrite the health status, stamping the update time
    pub fn set_status(&mut self, status: BackendStatus) {
        self.status = status;
        self.last_updated = Utc::now();
    }

    /// Update load metrics, clamping load to [0, 100]
    pub fn set_load(&mut self, load: f64, queue_time_ms: u32) {
        self.current_load = load.clamp(0.0, 100.0);
        self.estimated_queue_time_ms = queue_time_ms;
        self.last_updated = Utc::now();
    }
}
