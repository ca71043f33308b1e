//! The routing engine: registry ownership and decision orchestration

use crate::filter::CompatibilityFilter;
use crate::fluctuation::{FluctuationSimulator, StatusChange};
use crate::latency::NetworkLatencyModel;
use crate::recovery::FailureRecoveryHandler;
use crate::scoring::{BackendScore, ScoringEngine};
use crate::stats::{
    BackendStats, GlobalStats, Recommendation, RegionStats, StatsAggregator,
};
use parking_lot::{Mutex, RwLock};
use rand::rngs::SmallRng;
use route_core::{
    load_backends, Backend, BackendId, BackendStatus, FilteredBackend, InferenceRequest,
    RouterConfig, RoutingResult,
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Selects the optimal backend for inference requests.
///
/// Owns the backend registry, the network latency model, and the default
/// user region. The registry is an ordered list: when two candidates score
/// identically, the one registered first wins.
///
/// The engine tolerates concurrent callers. A routing decision snapshots the
/// registry under one read lock, so filtering and scoring observe a
/// consistent view of every backend even while a background fluctuation
/// loop applies updates.
pub struct RoutingEngine {
    backends: RwLock<Vec<Backend>>,
    latency: RwLock<NetworkLatencyModel>,
    user_region: RwLock<String>,
    fluctuation: Mutex<FluctuationSimulator<SmallRng>>,
}

impl RoutingEngine {
    /// Create an engine from explicit parts
    pub fn new(
        backends: Vec<Backend>,
        latency: NetworkLatencyModel,
        user_region: impl Into<String>,
    ) -> Self {
        let engine = Self {
            backends: RwLock::new(backends),
            latency: RwLock::new(latency),
            user_region: RwLock::new(user_region.into()),
            fluctuation: Mutex::new(FluctuationSimulator::new()),
        };
        info!(
            "Routing engine initialized with {} backends",
            engine.backend_count()
        );
        engine
    }

    /// Create an engine from configuration, loading the backend registry
    /// and latency data files.
    ///
    /// Missing or malformed data files degrade gracefully: an unreadable
    /// backend file yields an empty registry, and an unreadable latency
    /// file falls back to the built-in geography defaults.
    pub fn from_config(config: &RouterConfig) -> Self {
        let backends = load_backends(&config.backends_file);
        let latency = match &config.latency_file {
            Some(path) => NetworkLatencyModel::from_file(path),
            None => NetworkLatencyModel::with_defaults(),
        };

        let engine = Self::new(backends, latency, config.user_region.clone());
        *engine.fluctuation.lock() = FluctuationSimulator::from_config(&config.fluctuation);
        engine
    }

    /// Number of registered backends
    pub fn backend_count(&self) -> usize {
        self.backends.read().len()
    }

    /// A point-in-time copy of the registry
    pub fn snapshot(&self) -> Vec<Backend> {
        self.backends.read().clone()
    }

    /// The default user region
    pub fn user_region(&self) -> String {
        self.user_region.read().clone()
    }

    /// Set the default region for latency calculations
    pub fn set_user_region(&self, region: impl Into<String>) {
        let region = region.into();
        info!("User region set to {}", region);
        *self.user_region.write() = region;
    }

    fn resolve_region(&self, user_region: Option<&str>) -> String {
        match user_region {
            Some(region) => region.to_string(),
            None => self.user_region(),
        }
    }

    /// Route an inference request to the best available backend based on
    /// compatibility, performance, cost, and compliance requirements.
    ///
    /// A request no backend can serve is a normal outcome, reported as a
    /// result with no selected backend, an infinite score, and the full
    /// list of rejection reasons.
    pub fn route(&self, request: &InferenceRequest, user_region: Option<&str>) -> RoutingResult {
        let region = self.resolve_region(user_region);
        info!(
            "Routing request {} for model {} from {}",
            request.unique_id, request.model_name, region
        );

        let backends = self.snapshot();
        let latency = self.latency.read();

        let mut compatible = Vec::new();
        let mut filtered_out = Vec::new();
        for backend in backends {
            let network_latency = latency.latency(&region, &backend.region);
            match CompatibilityFilter::first_rejection(&backend, request, network_latency) {
                Some(reason) => filtered_out.push(FilteredBackend { backend, reason }),
                None => compatible.push(backend),
            }
        }

        if compatible.is_empty() {
            warn!(
                "No compatible backends found for request {}",
                request.unique_id
            );
            return RoutingResult::unroutable(request.clone(), filtered_out);
        }

        let ranked = rank_backends(request, compatible, &region, &latency);
        let (best_backend, best_score) = ranked[0].clone();

        // Recomputed rather than inferred from filtering, so the flag stays
        // correct when this result is reused after a fallback.
        let sla_met = best_score.total_latency_ms <= request.required_latency_ms;

        info!(
            "Selected {} in {} for request {} with score {:.4}, latency {}ms",
            best_backend.chip_type,
            best_backend.region,
            request.unique_id,
            best_score.score,
            best_score.total_latency_ms
        );

        RoutingResult {
            request: request.clone(),
            selected_backend: Some(best_backend),
            score: best_score.score,
            considered_backends: ranked.into_iter().map(|(backend, _)| backend).collect(),
            filtered_out,
            is_fallback: false,
            original_backend: None,
            fallback_reason: String::new(),
            final_latency_ms: best_score.total_latency_ms,
            final_cost: best_score.total_cost,
            sla_met,
        }
    }

    /// Reroute after the selected backend of a prior result reports failure.
    ///
    /// Recovery is single-shot: each call shrinks the candidate pool by
    /// exactly one. Callers may re-invoke on the returned result to
    /// simulate cascading failures.
    pub fn handle_failure(
        &self,
        result: &RoutingResult,
        failure_reason: &str,
        user_region: Option<&str>,
    ) -> RoutingResult {
        let region = self.resolve_region(user_region);
        let latency = self.latency.read();
        FailureRecoveryHandler::handle_failure(result, failure_reason, &region, &latency)
    }

    /// Overwrite the status of a backend. Returns false if the backend is
    /// not registered.
    pub fn update_status(&self, backend_id: &BackendId, status: BackendStatus) -> bool {
        let mut backends = self.backends.write();
        match backends.iter_mut().find(|b| &b.backend_id == backend_id) {
            Some(backend) => {
                let old_status = backend.status;
                backend.set_status(status);
                info!(
                    "Backend {} status changed from {} to {}",
                    backend_id, old_status, status
                );
                true
            }
            None => {
                warn!("Backend {} not found, cannot update status", backend_id);
                false
            }
        }
    }

    /// Update load metrics for a backend, clamping load to [0, 100].
    /// Returns false if the backend is not registered.
    pub fn update_load(&self, backend_id: &BackendId, load: f64, queue_time_ms: u32) -> bool {
        let mut backends = self.backends.write();
        match backends.iter_mut().find(|b| &b.backend_id == backend_id) {
            Some(backend) => {
                backend.set_load(load, queue_time_ms);
                debug!(
                    "Backend {} load updated to {}%, queue {}ms",
                    backend_id, load, queue_time_ms
                );
                true
            }
            None => {
                warn!("Backend {} not found, cannot update load metrics", backend_id);
                false
            }
        }
    }

    /// Update network latency data between two regions
    pub fn update_latency(&self, from_region: &str, to_region: &str, latency_ms: u32) {
        self.latency.write().update(from_region, to_region, latency_ms);
    }

    /// Network latency between two regions according to the current model
    pub fn network_latency(&self, from_region: &str, to_region: &str) -> u32 {
        self.latency.read().latency(from_region, to_region)
    }

    /// Randomly degrade or recover backends to simulate real-world
    /// conditions, returning the transitions that occurred.
    ///
    /// The batch of changes is applied under one write lock, so concurrent
    /// routing decisions observe either none or all of them.
    pub fn simulate_fluctuation(&self) -> Vec<StatusChange> {
        let mut backends = self.backends.write();
        self.fluctuation.lock().perturb(&mut backends)
    }

    /// Global statistics over the current registry state
    pub fn global_stats(&self) -> GlobalStats {
        StatsAggregator::global_stats(&self.snapshot())
    }

    /// Per-region statistics over the current registry state
    pub fn region_stats(&self) -> BTreeMap<String, RegionStats> {
        StatsAggregator::region_stats(&self.snapshot())
    }

    /// Per-backend statistics, keyed by backend id
    pub fn backend_stats(&self) -> BTreeMap<BackendId, BackendStats> {
        StatsAggregator::backend_stats(&self.snapshot())
    }

    /// Routing recommendation for a hypothetical request profile
    pub fn recommend(
        &self,
        model_name: &str,
        required_latency_ms: u32,
        compliance_constraints: &[String],
        from_region: &str,
    ) -> Recommendation {
        StatsAggregator::recommend(
            self,
            model_name,
            required_latency_ms,
            compliance_constraints,
            from_region,
        )
    }
}

/// Score the given backends for a request and sort ascending by score.
///
/// The sort is stable, so backends with identical scores keep their registry
/// order.
pub(crate) fn rank_backends(
    request: &InferenceRequest,
    backends: Vec<Backend>,
    user_region: &str,
    latency: &NetworkLatencyModel,
) -> Vec<(Backend, BackendScore)> {
    let mut scored: Vec<(Backend, BackendScore)> = backends
        .into_iter()
        .map(|backend| {
            let network_latency = latency.latency(user_region, &backend.region);
            let score = ScoringEngine::score_backend(&backend, request, network_latency);
            (backend, score)
        })
        .collect();

    scored.sort_by(|a, b| a.1.score.total_cmp(&b.1.score));
    scored
}
