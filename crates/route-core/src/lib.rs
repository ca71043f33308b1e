//! # route-core
//!
//! Core types, configuration, and error handling for inferoute, a
//! chip-agnostic, latency-aware routing layer for real-time AI inference.
//!
//! This crate provides the foundational data structures shared across the
//! inferoute components:
//!
//! - Request and backend models with their status enum
//! - Routing result and filter-rejection types
//! - Configuration schema and flat-file loaders
//! - Error handling types and utilities

pub mod backend;
pub mod config;
pub mod error;
pub mod request;
pub mod result;
pub mod types;

// Re-export commonly used types at the crate root
pub use backend::Backend;
pub use config::{load_backends, load_request, load_requests, FluctuationConfig, RouterConfig};
pub use error::{Error, ErrorContext, Result};
pub use request::InferenceRequest;
pub use result::{FilteredBackend, RoutingResult};
pub use types::{BackendId, BackendStatus};
