//! Region-to-region network latency estimates

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Latency within a single region, in milliseconds
pub const SAME_REGION_LATENCY_MS: u32 = 1;

/// Conservative latency assumed for unknown region pairs, in milliseconds
pub const DEFAULT_LATENCY_MS: u32 = 150;

/// Pairwise network latency estimates between regions.
///
/// Lookups never fail: same-region pairs resolve to
/// [`SAME_REGION_LATENCY_MS`] and pairs without data resolve to
/// [`DEFAULT_LATENCY_MS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkLatencyModel {
    latency_map: HashMap<String, HashMap<String, u32>>,
}

impl NetworkLatencyModel {
    /// Create an empty model; every cross-region lookup resolves to the
    /// conservative default
    pub fn empty() -> Self {
        Self {
            latency_map: HashMap::new(),
        }
    }

    /// Create a model pre-populated with latencies based on geographic
    /// proximity for the common cloud regions
    pub fn with_defaults() -> Self {
        let mut model = Self::empty();

        // Symmetric estimates between well-known regions
        let pairs: &[(&str, &str, u32)] = &[
            // US east-west
            ("us-east-1", "us-west-1", 70),
            ("us-east-1", "us-west-2", 80),
            ("us-west-1", "us-west-2", 20),
            // US to EU
            ("us-east-1", "eu-west-1", 80),
            ("us-east-1", "eu-central-1", 90),
            ("us-west-1", "eu-west-1", 140),
            // EU internal
            ("eu-west-1", "eu-central-1", 25),
            // Asia internal
            ("ap-northeast-1", "ap-southeast-1", 70),
            // US to Asia
            ("us-west-1", "ap-northeast-1", 110),
            ("us-west-1", "ap-southeast-1", 180),
            ("us-east-1", "ap-northeast-1", 170),
            // EU to Asia
            ("eu-central-1", "ap-southeast-1", 160),
        ];

        for (a, b, ms) in pairs {
            model.update(a, b, *ms);
            model.update(b, a, *ms);
        }

        // "global" backends are reachable from anywhere at moderate latency
        for region in [
            "us-east-1",
            "us-west-1",
            "us-west-2",
            "eu-west-1",
            "eu-central-1",
            "ap-northeast-1",
            "ap-southeast-1",
        ] {
            model.update("global", region, 100);
            model.update(region, "global", 100);
        }

        model
    }

    /// Create a model from a raw region-to-region table
    pub fn from_table(latency_map: HashMap<String, HashMap<String, u32>>) -> Self {
        Self { latency_map }
    }

    /// Load latency data from a JSON file, falling back to the built-in
    /// geography defaults if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Self {
        match Self::try_from_file(path) {
            Ok(model) => {
                info!("Loaded network latency data from {}", path.display());
                model
            }
            Err(e) => {
                error!(
                    "Failed to load latency data from {}: {}",
                    path.display(),
                    e
                );
                Self::with_defaults()
            }
        }
    }

    fn try_from_file(path: &Path) -> route_core::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let latency_map = serde_json::from_str(&contents)?;
        Ok(Self { latency_map })
    }

    /// Get the network latency between two regions in milliseconds
    pub fn latency(&self, from_region: &str, to_region: &str) -> u32 {
        if from_region == to_region {
            return SAME_REGION_LATENCY_MS;
        }

        if let Some(ms) = self
            .latency_map
            .get(from_region)
            .and_then(|destinations| destinations.get(to_region))
        {
            return *ms;
        }

        warn!(
            "No latency data for {} -> {}, assuming high latency",
            from_region, to_region
        );
        DEFAULT_LATENCY_MS
    }

    /// Update the latency between two regions, creating the source entry if
    /// it does not exist
    pub fn update(&mut self, from_region: &str, to_region: &str, latency_ms: u32) {
        self.latency_map
            .entry(from_region.to_string())
            .or_default()
            .insert(to_region.to_string(), latency_ms);
        debug!(
            "Updated latency: {} -> {} = {}ms",
            from_region, to_region, latency_ms
        );
    }
}

impl Default for NetworkLatencyModel {
    fn default() -> Self {
        Self::with_defaults()
    }
}
