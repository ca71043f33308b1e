//! # route-engine
//!
//! The routing decision engine for inferoute.
//!
//! This crate provides:
//! - A compatibility filter chain that rejects unfit backends with
//!   human-readable reasons
//! - A multi-factor scoring engine ranking the survivors
//! - The routing engine orchestrating filter -> score -> select-best over a
//!   shared backend registry
//! - Failure recovery producing deterministic fallback decisions
//! - A fluctuation simulator emulating real-world backend instability
//! - Aggregate statistics and routing recommendations
//!
//! ## Example
//!
//! ```rust
//! use route_core::{load_backends, InferenceRequest};
//! use route_engine::{NetworkLatencyModel, RoutingEngine};
//!
//! let backends = load_backends(std::path::Path::new("models/backends.json"));
//! let engine = RoutingEngine::new(
//!     backends,
//!     NetworkLatencyModel::with_defaults(),
//!     "us-east-1",
//! );
//!
//! let request = InferenceRequest::new("gpt-7b", 512, 200, Default::default());
//! let result = engine.route(&request, None);
//! println!("routed: {}", result.is_routed());
//! ```

pub mod engine;
pub mod filter;
pub mod fluctuation;
pub mod latency;
pub mod recovery;
pub mod scoring;
pub mod stats;

// Re-export commonly used types
pub use engine::RoutingEngine;
pub use filter::{CompatibilityCheck, CompatibilityFilter};
pub use fluctuation::{FluctuationSimulator, StatusChange, DEFAULT_CHANGE_PROBABILITY};
pub use latency::{NetworkLatencyModel, DEFAULT_LATENCY_MS, SAME_REGION_LATENCY_MS};
pub use recovery::FailureRecoveryHandler;
pub use scoring::{BackendScore, ScoringEngine};
pub use stats::{
    BackendStats, FailureAnalysis, GlobalStats, RankedBackend, Recommendation, RegionStats,
    RequestProfile, RoutingSummary, StatsAggregator,
};
