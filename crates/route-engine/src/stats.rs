//! Read-side aggregate statistics and routing recommendations

use crate::engine::RoutingEngine;
use crate::scoring::ScoringEngine;
use route_core::{Backend, BackendId, BackendStatus, InferenceRequest, RoutingResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Global statistics about the routing system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub total_backends: usize,
    pub healthy_backends: usize,
    pub degraded_backends: usize,
    pub down_backends: usize,
    pub unique_regions: usize,
    pub regions: Vec<String>,
    pub unique_chip_types: usize,
    pub chip_types: Vec<String>,
    pub supported_models: Vec<String>,
    /// Average load across backends that are not Down
    pub avg_system_load: f64,
    pub healthy_percentage: f64,
}

/// Statistics for the backends of one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStats {
    pub backend_count: usize,
    pub healthy_backends: usize,
    pub degraded_backends: usize,
    pub down_backends: usize,
    pub avg_load: f64,
    pub chip_types: Vec<String>,
    pub supported_models: Vec<String>,
    pub compliance_tags: Vec<String>,
}

/// Current state of a single backend, as reported to dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendStats {
    pub chip_type: String,
    pub region: String,
    pub status: BackendStatus,
    pub supported_models: Vec<String>,
    pub current_load: f64,
    pub queue_time_ms: u32,
    pub latency_ms: u32,
    pub cost_per_token: f64,
    pub compliance_tags: Vec<String>,
}

/// Summary over a batch of routing decisions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingSummary {
    pub total_requests: usize,
    pub successful_routes: usize,
    pub failed_routes: usize,
    pub fallback_routes: usize,
    /// Fallbacks as a percentage of successful routes
    pub fallback_percentage: f64,
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub avg_cost: f64,
    pub most_used_backend: Option<BackendId>,
    pub most_used_backend_count: usize,
    pub backend_usage: BTreeMap<BackendId, usize>,
}

/// The request profile a recommendation was computed for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestProfile {
    pub model: String,
    pub required_latency_ms: u32,
    pub compliance_constraints: Vec<String>,
    pub from_region: String,
}

/// A recommended or alternative backend for a request profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedBackend {
    pub backend_id: BackendId,
    pub chip_type: String,
    pub region: String,
    pub estimated_latency_ms: u32,
    pub estimated_cost: f64,
    pub meets_sla: bool,
}

/// Why routing failed for a request profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureAnalysis {
    pub filtered_backends_count: usize,
    /// Rejection reason frequencies across the filtered backends
    pub common_reasons: BTreeMap<String, usize>,
}

/// Routing recommendation for a hypothetical request profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub can_route: bool,
    pub sla_met: bool,
    pub request_profile: RequestProfile,
    pub recommended_backend: Option<RankedBackend>,
    pub alternatives: Vec<RankedBackend>,
    pub failure_analysis: Option<FailureAnalysis>,
    pub suggestions: Vec<String>,
}

/// Token size assumed for recommendation probe requests
const PROBE_TOKEN_SIZE: u32 = 1000;

/// Derives aggregate views from the current registry state. All
/// computations are pure reads; nothing here mutates a backend.
pub struct StatsAggregator;

impl StatsAggregator {
    /// Global statistics over a registry snapshot
    pub fn global_stats(backends: &[Backend]) -> GlobalStats {
        let total_backends = backends.len();
        let healthy_backends = Self::count_status(backends, BackendStatus::Healthy);
        let degraded_backends = Self::count_status(backends, BackendStatus::Degraded);
        let down_backends = Self::count_status(backends, BackendStatus::Down);

        let regions: BTreeSet<String> = backends.iter().map(|b| b.region.clone()).collect();
        let chip_types: BTreeSet<String> = backends.iter().map(|b| b.chip_type.clone()).collect();
        let supported_models: BTreeSet<String> = backends
            .iter()
            .flat_map(|b| b.supported_models.iter().cloned())
            .collect();

        let serving: Vec<&Backend> = backends
            .iter()
            .filter(|b| b.status != BackendStatus::Down)
            .collect();
        let avg_system_load = if serving.is_empty() {
            0.0
        } else {
            serving.iter().map(|b| b.current_load).sum::<f64>() / serving.len() as f64
        };

        let healthy_percentage = if total_backends > 0 {
            healthy_backends as f64 / total_backends as f64 * 100.0
        } else {
            0.0
        };

        GlobalStats {
            total_backends,
            healthy_backends,
            degraded_backends,
            down_backends,
            unique_regions: regions.len(),
            regions: regions.into_iter().collect(),
            unique_chip_types: chip_types.len(),
            chip_types: chip_types.into_iter().collect(),
            supported_models: supported_models.into_iter().collect(),
            avg_system_load,
            healthy_percentage,
        }
    }

    /// Statistics grouped by region
    pub fn region_stats(backends: &[Backend]) -> BTreeMap<String, RegionStats> {
        let mut stats: BTreeMap<String, RegionStats> = BTreeMap::new();

        for backend in backends {
            let entry = stats
                .entry(backend.region.clone())
                .or_insert_with(|| RegionStats {
                    backend_count: 0,
                    healthy_backends: 0,
                    degraded_backends: 0,
                    down_backends: 0,
                    avg_load: 0.0,
                    chip_types: Vec::new(),
                    supported_models: Vec::new(),
                    compliance_tags: Vec::new(),
                });

            entry.backend_count += 1;
            match backend.status {
                BackendStatus::Healthy => entry.healthy_backends += 1,
                BackendStatus::Degraded => entry.degraded_backends += 1,
                BackendStatus::Down => entry.down_backends += 1,
            }
            entry.avg_load += backend.current_load;
        }

        for (region, entry) in stats.iter_mut() {
            if entry.backend_count > 0 {
                entry.avg_load /= entry.backend_count as f64;
            }

            let in_region: Vec<&Backend> =
                backends.iter().filter(|b| &b.region == region).collect();
            entry.chip_types = Self::distinct(in_region.iter().map(|b| b.chip_type.clone()));
            entry.supported_models = Self::distinct(
                in_region
                    .iter()
                    .flat_map(|b| b.supported_models.iter().cloned()),
            );
            entry.compliance_tags = Self::distinct(
                in_region
                    .iter()
                    .flat_map(|b| b.compliance_tags.iter().cloned()),
            );
        }

        stats
    }

    /// Per-backend state, keyed by backend id
    pub fn backend_stats(backends: &[Backend]) -> BTreeMap<BackendId, BackendStats> {
        backends
            .iter()
            .map(|backend| {
                (
                    backend.backend_id.clone(),
                    BackendStats {
                        chip_type: backend.chip_type.clone(),
                        region: backend.region.clone(),
                        status: backend.status,
                        supported_models: backend.supported_models.clone(),
                        current_load: backend.current_load,
                        queue_time_ms: backend.estimated_queue_time_ms,
                        latency_ms: backend.latency_ms,
                        cost_per_token: backend.cost_per_token,
                        compliance_tags: backend.compliance_tags.iter().cloned().collect(),
                    },
                )
            })
            .collect()
    }

    /// Summarize a batch of routing decisions
    pub fn summarize(results: &[RoutingResult]) -> RoutingSummary {
        let total_requests = results.len();
        let routed: Vec<&RoutingResult> =
            results.iter().filter(|r| r.is_routed()).collect();
        let successful_routes = routed.len();
        let fallback_routes = results.iter().filter(|r| r.is_fallback).count();

        let mut backend_usage: BTreeMap<BackendId, usize> = BTreeMap::new();
        let mut total_latency = 0u64;
        let mut total_cost = 0.0;
        for result in &routed {
            total_latency += result.final_latency_ms as u64;
            total_cost += result.final_cost;
            if let Some(backend) = &result.selected_backend {
                *backend_usage.entry(backend.backend_id.clone()).or_insert(0) += 1;
            }
        }

        let avg_latency_ms = if successful_routes > 0 {
            total_latency as f64 / successful_routes as f64
        } else {
            0.0
        };
        let avg_cost = if successful_routes > 0 {
            total_cost / successful_routes as f64
        } else {
            0.0
        };

        // Ties resolve to the first id in key order
        let most_used = backend_usage
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(id, count)| (id.clone(), *count));

        RoutingSummary {
            total_requests,
            successful_routes,
            failed_routes: total_requests - successful_routes,
            fallback_routes,
            fallback_percentage: if successful_routes > 0 {
                fallback_routes as f64 / successful_routes as f64 * 100.0
            } else {
                0.0
            },
            success_rate: if total_requests > 0 {
                successful_routes as f64 / total_requests as f64 * 100.0
            } else {
                0.0
            },
            avg_latency_ms,
            avg_cost,
            most_used_backend: most_used.as_ref().map(|(id, _)| id.clone()),
            most_used_backend_count: most_used.map(|(_, count)| count).unwrap_or(0),
            backend_usage,
        }
    }

    /// Recommend backends for a hypothetical request profile by running one
    /// representative routing decision.
    ///
    /// Routable profiles report the winner plus up to two ranked
    /// alternatives; unroutable profiles report a rejection-reason tally
    /// with remediation suggestions.
    pub fn recommend(
        engine: &RoutingEngine,
        model_name: &str,
        required_latency_ms: u32,
        compliance_constraints: &[String],
        from_region: &str,
    ) -> Recommendation {
        let request = InferenceRequest::new(
            model_name,
            PROBE_TOKEN_SIZE,
            required_latency_ms,
            compliance_constraints.iter().cloned().collect(),
        );

        let result = engine.route(&request, Some(from_region));

        let mut recommendation = Recommendation {
            can_route: result.is_routed(),
            sla_met: result.sla_met,
            request_profile: RequestProfile {
                model: model_name.to_string(),
                required_latency_ms,
                compliance_constraints: compliance_constraints.to_vec(),
                from_region: from_region.to_string(),
            },
            recommended_backend: None,
            alternatives: Vec::new(),
            failure_analysis: None,
            suggestions: Vec::new(),
        };

        if let Some(selected) = &result.selected_backend {
            recommendation.recommended_backend = Some(RankedBackend {
                backend_id: selected.backend_id.clone(),
                chip_type: selected.chip_type.clone(),
                region: selected.region.clone(),
                estimated_latency_ms: result.final_latency_ms,
                estimated_cost: result.final_cost,
                meets_sla: result.sla_met,
            });

            for backend in result.considered_backends.iter().skip(1).take(2) {
                let network_latency = engine.network_latency(from_region, &backend.region);
                let score = ScoringEngine::score_backend(backend, &request, network_latency);
                recommendation.alternatives.push(RankedBackend {
                    backend_id: backend.backend_id.clone(),
                    chip_type: backend.chip_type.clone(),
                    region: backend.region.clone(),
                    estimated_latency_ms: score.total_latency_ms,
                    estimated_cost: score.total_cost,
                    meets_sla: score.total_latency_ms <= required_latency_ms,
                });
            }
        } else {
            let mut common_reasons: BTreeMap<String, usize> = BTreeMap::new();
            for filtered in &result.filtered_out {
                *common_reasons.entry(filtered.reason.clone()).or_insert(0) += 1;
            }

            recommendation.suggestions = Self::suggestions_for(&common_reasons);
            recommendation.failure_analysis = Some(FailureAnalysis {
                filtered_backends_count: result.filtered_out.len(),
                common_reasons,
            });
        }

        recommendation
    }

    /// Template remediation suggestions keyed off the rejection reasons seen
    fn suggestions_for(common_reasons: &BTreeMap<String, usize>) -> Vec<String> {
        let mut suggestions = Vec::new();
        let any = |needle: &str| common_reasons.keys().any(|reason| reason.contains(needle));

        if any("Model") {
            suggestions.push("Request a different supported model".to_string());
        }
        if any("latency") {
            suggestions.push(
                "Increase latency SLA or request from a region closer to compatible backends"
                    .to_string(),
            );
        }
        if any("compliance") {
            suggestions.push("Adjust compliance requirements if possible".to_string());
        }

        suggestions
    }

    fn count_status(backends: &[Backend], status: BackendStatus) -> usize {
        backends.iter().filter(|b| b.status == status).count()
    }

    fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
        values.collect::<BTreeSet<_>>().into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latency::NetworkLatencyModel;
    use chrono::Utc;

    const USER_REGION: &str = "user-region";

    fn backend(id: &str, region: &str, status: BackendStatus, load: f64) -> Backend {
        Backend {
            backend_id: BackendId::new(id),
            chip_type: format!("chip-{}", id),
            latency_ms: 100,
            cost_per_token: 0.001,
            region: region.to_string(),
            supported_models: vec!["m1".to_string()],
            status,
            compliance_tags: ["gdpr"].iter().map(|t| t.to_string()).collect(),
            max_token_size: 2000,
            current_load: load,
            estimated_queue_time_ms: 0,
            last_updated: Utc::now(),
        }
    }

    fn mixed_fleet() -> Vec<Backend> {
        vec![
            backend("a", "us-east-1", BackendStatus::Healthy, 20.0),
            backend("b", "us-east-1", BackendStatus::Degraded, 60.0),
            backend("c", "eu-west-1", BackendStatus::Down, 90.0),
            backend("d", "eu-west-1", BackendStatus::Healthy, 40.0),
        ]
    }

    #[test]
    fn test_global_stats() {
        let stats = StatsAggregator::global_stats(&mixed_fleet());

        assert_eq!(stats.total_backends, 4);
        assert_eq!(stats.healthy_backends, 2);
        assert_eq!(stats.degraded_backends, 1);
        assert_eq!(stats.down_backends, 1);
        assert_eq!(stats.unique_regions, 2);
        assert_eq!(stats.regions, vec!["eu-west-1", "us-east-1"]);
        assert_eq!(stats.unique_chip_types, 4);
        assert_eq!(stats.supported_models, vec!["m1"]);
        // Down backends are excluded from the load average: (20+60+40)/3
        assert!((stats.avg_system_load - 40.0).abs() < 1e-9);
        assert_eq!(stats.healthy_percentage, 50.0);
    }

    #[test]
    fn test_global_stats_empty_registry() {
        let stats = StatsAggregator::global_stats(&[]);
        assert_eq!(stats.total_backends, 0);
        assert_eq!(stats.avg_system_load, 0.0);
        assert_eq!(stats.healthy_percentage, 0.0);
    }

    #[test]
    fn test_region_stats() {
        let stats = StatsAggregator::region_stats(&mixed_fleet());

        assert_eq!(stats.len(), 2);

        let us = &stats["us-east-1"];
        assert_eq!(us.backend_count, 2);
        assert_eq!(us.healthy_backends, 1);
        assert_eq!(us.degraded_backends, 1);
        assert_eq!(us.down_backends, 0);
        assert!((us.avg_load - 40.0).abs() < 1e-9);
        assert_eq!(us.chip_types, vec!["chip-a", "chip-b"]);
        assert_eq!(us.compliance_tags, vec!["gdpr"]);

        let eu = &stats["eu-west-1"];
        assert_eq!(eu.backend_count, 2);
        assert_eq!(eu.down_backends, 1);
        assert!((eu.avg_load - 65.0).abs() < 1e-9);
    }

    #[test]
    fn test_backend_stats() {
        let stats = StatsAggregator::backend_stats(&mixed_fleet());

        assert_eq!(stats.len(), 4);
        let a = &stats[&BackendId::new("a")];
        assert_eq!(a.chip_type, "chip-a");
        assert_eq!(a.region, "us-east-1");
        assert_eq!(a.status, BackendStatus::Healthy);
        assert_eq!(a.current_load, 20.0);
    }

    fn engine_with(backends: Vec<Backend>) -> RoutingEngine {
        let mut latency = NetworkLatencyModel::empty();
        latency.update(USER_REGION, "us-east-1", 0);
        latency.update(USER_REGION, "eu-west-1", 0);
        RoutingEngine::new(backends, latency, USER_REGION)
    }

    #[test]
    fn test_summarize() {
        let engine = engine_with(mixed_fleet());
        let request = InferenceRequest::new("m1", 500, 500, Default::default());

        let results = vec![
            engine.route(&request, None),
            engine.route(&request, None),
            engine.route(&InferenceRequest::new("unknown", 500, 500, Default::default()), None),
        ];

        let summary = StatsAggregator::summarize(&results);
        assert_eq!(summary.total_requests, 3);
        assert_eq!(summary.successful_routes, 2);
        assert_eq!(summary.failed_routes, 1);
        assert_eq!(summary.fallback_routes, 0);
        assert!((summary.success_rate - 2.0 / 3.0 * 100.0).abs() < 1e-9);
        assert!(summary.avg_latency_ms > 0.0);

        let most_used = summary.most_used_backend.as_ref().unwrap();
        assert_eq!(summary.most_used_backend_count, 2);
        assert_eq!(summary.backend_usage[most_used], 2);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = StatsAggregator::summarize(&[]);
        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.most_used_backend, None);
    }

    #[test]
    fn test_recommend_routable_profile() {
        let engine = engine_with(mixed_fleet());

        let recommendation =
            engine.recommend("m1", 500, &["gdpr".to_string()], USER_REGION);

        assert!(recommendation.can_route);
        assert!(recommendation.sla_met);
        let recommended = recommendation.recommended_backend.as_ref().unwrap();
        assert_eq!(recommended.estimated_cost, 1.0); // 1000 tokens * 0.001

        // Up to two alternatives, never including the winner
        assert!(recommendation.alternatives.len() <= 2);
        for alternative in &recommendation.alternatives {
            assert_ne!(alternative.backend_id, recommended.backend_id);
            assert!(alternative.meets_sla);
        }
        assert!(recommendation.failure_analysis.is_none());
        assert!(recommendation.suggestions.is_empty());
    }

    #[test]
    fn test_recommend_unroutable_profile_analyzes_failures() {
        let engine = engine_with(mixed_fleet());

        let recommendation =
            engine.recommend("unknown-model", 500, &[], USER_REGION);

        assert!(!recommendation.can_route);
        assert!(recommendation.recommended_backend.is_none());

        let analysis = recommendation.failure_analysis.as_ref().unwrap();
        assert_eq!(analysis.filtered_backends_count, 4);
        // Three model rejections plus one down backend
        assert_eq!(
            analysis.common_reasons["Model unknown-model not supported"],
            3
        );
        assert_eq!(analysis.common_reasons["Backend is down"], 1);

        assert_eq!(
            recommendation.suggestions,
            vec!["Request a different supported model".to_string()]
        );
    }

    #[test]
    fn test_recommend_latency_failure_suggests_relaxing_sla() {
        let engine = engine_with(mixed_fleet());

        // 1ms SLA: every serving backend fails the latency check
        let recommendation = engine.recommend("m1", 1, &[], USER_REGION);

        assert!(!recommendation.can_route);
        assert!(recommendation
            .suggestions
            .contains(&"Increase latency SLA or request from a region closer to compatible backends".to_string()));
    }
}
