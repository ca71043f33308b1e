//! Randomized backend health fluctuation
//!
//! Emulates real-world instability by randomly perturbing backend status and
//! load. The random source is injected at construction so tests can assert
//! exact transition sequences from a fixed seed.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use route_core::{Backend, BackendId, BackendStatus, FluctuationConfig};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default per-backend probability of a status transition per invocation
pub const DEFAULT_CHANGE_PROBABILITY: f64 = 0.1;

/// A single status transition produced by one fluctuation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub backend_id: BackendId,
    pub old_status: BackendStatus,
    pub new_status: BackendStatus,
}

/// Randomly perturbs backend health and load.
///
/// Per invocation, each backend independently transitions with the
/// configured probability, following a fixed table:
/// Healthy -> Degraded (0.8) or Down (0.2);
/// Degraded -> Healthy (0.5) or Down (0.5);
/// Down -> Degraded (0.7) or Healthy (0.3).
/// A backend that transitions also receives a fresh load in [10, 90] and a
/// queue time derived from it.
///
/// Draw order per backend is fixed (gate, transition, load, queue factor),
/// so a seeded run reproduces identical sequences.
#[derive(Debug)]
pub struct FluctuationSimulator<R: Rng = SmallRng> {
    rng: R,
    change_probability: f64,
}

impl FluctuationSimulator<SmallRng> {
    /// Create a simulator with an entropy-seeded RNG and the default
    /// change probability
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_entropy(), DEFAULT_CHANGE_PROBABILITY)
    }

    /// Create a simulator with a fixed seed for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed), DEFAULT_CHANGE_PROBABILITY)
    }

    /// Create a simulator from configuration
    pub fn from_config(config: &FluctuationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self::with_rng(rng, config.change_probability)
    }
}

impl Default for FluctuationSimulator<SmallRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> FluctuationSimulator<R> {
    /// Create a simulator with an injected random source
    pub fn with_rng(rng: R, change_probability: f64) -> Self {
        Self {
            rng,
            change_probability,
        }
    }

    /// Perturb the given backends in place, returning the list of status
    /// transitions that occurred
    pub fn perturb(&mut self, backends: &mut [Backend]) -> Vec<StatusChange> {
        let mut changes = Vec::new();

        for backend in backends.iter_mut() {
            if self.rng.gen::<f64>() >= self.change_probability {
                continue;
            }

            let old_status = backend.status;
            let roll: f64 = self.rng.gen();
            let new_status = match old_status {
                BackendStatus::Healthy => {
                    if roll < 0.8 {
                        BackendStatus::Degraded
                    } else {
                        BackendStatus::Down
                    }
                }
                BackendStatus::Degraded => {
                    if roll < 0.5 {
                        BackendStatus::Healthy
                    } else {
                        BackendStatus::Down
                    }
                }
                BackendStatus::Down => {
                    if roll < 0.7 {
                        BackendStatus::Degraded
                    } else {
                        BackendStatus::Healthy
                    }
                }
            };

            backend.set_status(new_status);
            info!(
                "Backend {} status changed from {} to {}",
                backend.backend_id, old_status, new_status
            );

            let load = self.rng.gen_range(10.0..90.0);
            let queue_time_ms = (load * self.rng.gen_range(0.5..2.0)) as u32;
            backend.set_load(load, queue_time_ms);

            changes.push(StatusChange {
                backend_id: backend.backend_id.clone(),
                old_status,
                new_status,
            });
        }

        changes
    }
}
