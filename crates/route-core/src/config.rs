//! Configuration management for inferoute
//!
//! Provides a layered configuration system (defaults, configuration file,
//! environment variables) for the router itself, plus loaders for the flat
//! JSON data files: the backend registry, the network latency map, and
//! inference request lists.

use crate::{Backend, Error, InferenceRequest, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Main configuration for the routing engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Path to the JSON file with backend definitions
    pub backends_file: PathBuf,

    /// Optional path to network latency data; built-in geography defaults
    /// are used when absent
    pub latency_file: Option<PathBuf>,

    /// Default region for user requests
    pub user_region: String,

    /// Fluctuation simulator configuration
    pub fluctuation: FluctuationConfig,
}

/// Configuration for the fluctuation simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluctuationConfig {
    /// Per-backend probability of a status transition per invocation
    pub change_probability: f64,

    /// Fixed RNG seed for reproducible simulation runs
    pub seed: Option<u64>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            backends_file: PathBuf::from("models/backends.json"),
            latency_file: None,
            user_region: "us-east-1".to_string(),
            fluctuation: FluctuationConfig::default(),
        }
    }
}

impl Default for FluctuationConfig {
    fn default() -> Self {
        Self {
            change_probability: 0.1,
            seed: None,
        }
    }
}

impl RouterConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest)
    /// 2. Configuration file
    /// 3. Defaults (lowest)
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();

        // Start with defaults
        builder = builder.add_source(config::Config::try_from(&Self::default())?);

        // Add configuration file if one is pointed at
        if let Ok(config_path) = std::env::var("INFEROUTE_CONFIG") {
            builder = builder.add_source(config::File::with_name(&config_path).required(false));
        } else {
            builder = builder.add_source(config::File::with_name("inferoute").required(false));
        }

        // Environment variable overrides, e.g. INFEROUTE_USER_REGION
        builder = builder.add_source(
            config::Environment::with_prefix("INFEROUTE").separator("__"),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate().map_err(Error::config)?;
        Ok(config)
    }

    /// Set the backends file path
    pub fn with_backends_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.backends_file = path.into();
        self
    }

    /// Set the latency data file path
    pub fn with_latency_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.latency_file = Some(path.into());
        self
    }

    /// Set the default user region
    pub fn with_user_region(mut self, region: impl Into<String>) -> Self {
        self.user_region = region.into();
        self
    }

    /// Set a fixed fluctuation seed
    pub fn with_fluctuation_seed(mut self, seed: u64) -> Self {
        self.fluctuation.seed = Some(seed);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.user_region.is_empty() {
            return Err("user_region must not be empty".to_string());
        }

        let p = self.fluctuation.change_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(format!(
                "fluctuation change_probability must be in [0, 1], got {}",
                p
            ));
        }

        Ok(())
    }
}

/// Load backend definitions from a JSON file.
///
/// An unreadable or malformed file degrades to an empty registry (the system
/// reports "no routes possible" rather than crashing).
pub fn load_backends(path: &Path) -> Vec<Backend> {
    match try_load_json::<Vec<Backend>>(path) {
        Ok(backends) => {
            info!("Loaded {} backends from {}", backends.len(), path.display());
            backends
        }
        Err(e) => {
            error!("Failed to load backends from {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Load a list of inference requests from a JSON file.
///
/// Degrades to an empty list on failure.
pub fn load_requests(path: &Path) -> Vec<InferenceRequest> {
    match try_load_json::<Vec<InferenceRequest>>(path) {
        Ok(requests) => {
            info!(
                "Loaded {} requests from {}",
                requests.len(),
                path.display()
            );
            requests
        }
        Err(e) => {
            warn!("Failed to load requests from {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Load a single inference request from a JSON file.
///
/// Unlike the bulk loaders, an explicit single-request load propagates its
/// error to the caller.
pub fn load_request(path: &Path) -> Result<InferenceRequest> {
    try_load_json(path).map_err(|e| {
        error!("Failed to load request from {}: {}", path.display(), e);
        e
    })
}

fn try_load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
