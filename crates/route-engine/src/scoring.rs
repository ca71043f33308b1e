//! Composite scoring of compatible backends
//!
//! The scoring formula is a fixed contract: adjustments are applied in a set
//! order and the three outputs (score, projected latency, projected cost)
//! are produced together so they stay consistent for a backend/request pair.
//! Lower scores are better.

use route_core::{Backend, BackendStatus, InferenceRequest};
use serde::{Deserialize, Serialize};

/// The outcome of scoring one backend for one request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackendScore {
    /// Composite ranking score; lower is better, infinity is unroutable
    pub score: f64,

    /// Projected end-to-end latency in milliseconds
    pub total_latency_ms: u32,

    /// Projected total cost in dollars
    pub total_cost: f64,
}

/// Computes composite ranking scores for compatible backends
pub struct ScoringEngine;

impl ScoringEngine {
    /// Base score: the product of backend latency and per-token cost
    pub fn base_score(backend: &Backend) -> f64 {
        backend.latency_ms as f64 * backend.cost_per_token
    }

    /// Adjust for backend health.
    ///
    /// Down backends are filtered before scoring; the infinity arm keeps the
    /// adjustment total on its own.
    pub fn health_adjustment(score: f64, backend: &Backend) -> f64 {
        match backend.status {
            BackendStatus::Down => f64::INFINITY,
            BackendStatus::Degraded => score * 1.5,
            BackendStatus::Healthy => score,
        }
    }

    /// Adjust for request priority: the score is multiplied by
    /// `1 / priority`
    pub fn priority_adjustment(score: f64, request: &InferenceRequest) -> f64 {
        score * (1.0 / request.priority as f64)
    }

    /// Adjust for cost preference: amplifies cost sensitivity when the
    /// request favors cost over latency
    pub fn cost_preference_adjustment(
        score: f64,
        backend: &Backend,
        request: &InferenceRequest,
    ) -> f64 {
        if request.prefer_cost_over_latency {
            score * (backend.cost_per_token * 1000.0)
        } else {
            score
        }
    }

    /// Adjust for load: queue times over 100ms are penalized, and the
    /// current load factor is always applied
    pub fn load_adjustment(score: f64, backend: &Backend) -> f64 {
        let queue_penalized = if backend.estimated_queue_time_ms > 100 {
            score * (1.0 + backend.estimated_queue_time_ms as f64 / 100.0)
        } else {
            score
        };

        queue_penalized * (1.0 + backend.current_load / 100.0)
    }

    /// Projected end-to-end latency: base plus network latency, inflated by
    /// 1.5 when degraded, plus estimated queue time
    pub fn projected_latency_ms(backend: &Backend, network_latency_ms: u32) -> u32 {
        let mut total = backend.latency_ms + network_latency_ms;
        if backend.status == BackendStatus::Degraded {
            total = (total as f64 * 1.5) as u32;
        }
        total + backend.estimated_queue_time_ms
    }

    /// Projected total cost for the request's input size
    pub fn projected_cost(backend: &Backend, request: &InferenceRequest) -> f64 {
        backend.cost_per_token * request.input_token_size as f64
    }

    /// Score a backend on all factors, producing the composite score and
    /// the projected latency and cost as one consistent result
    pub fn score_backend(
        backend: &Backend,
        request: &InferenceRequest,
        network_latency_ms: u32,
    ) -> BackendScore {
        let base = Self::base_score(backend);
        let health_adjusted = Self::health_adjustment(base, backend);
        let priority_adjusted = Self::priority_adjustment(health_adjusted, request);
        let cost_adjusted = Self::cost_preference_adjustment(priority_adjusted, backend, request);
        let score = Self::load_adjustment(cost_adjusted, backend);

        BackendScore {
            score,
            total_latency_ms: Self::projected_latency_ms(backend, network_latency_ms),
            total_cost: Self::projected_cost(backend, request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use route_core::BackendId;
    use std::collections::BTreeSet;

    fn backend(latency_ms: u32, cost_per_token: f64) -> Backend {
        Backend {
            backend_id: BackendId::new("test-backend"),
            chip_type: "GPU".to_string(),
            latency_ms,
            cost_per_token,
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

    fn request() -> InferenceRequest {
        InferenceRequest::new("m1", 500, 150, BTreeSet::new())
    }

    #[test]
    fn test_base_score() {
        assert_eq!(ScoringEngine::base_score(&backend(100, 0.001)), 0.1);
        assert_eq!(ScoringEngine::base_score(&backend(80, 0.002)), 0.16);
    }

    #[test]
    fn test_health_adjustment() {
        let mut b = backend(100, 0.001);
        assert_eq!(ScoringEngine::health_adjustment(1.0, &b), 1.0);

        b.status = BackendStatus::Degraded;
        assert_eq!(ScoringEngine::health_adjustment(1.0, &b), 1.5);

        b.status = BackendStatus::Down;
        assert!(ScoringEngine::health_adjustment(1.0, &b).is_infinite());
    }

    #[test]
    fn test_priority_adjustment() {
        let r1 = request().with_priority(1);
        assert_eq!(ScoringEngine::priority_adjustment(1.0, &r1), 1.0);

        let r2 = request().with_priority(2);
        assert_eq!(ScoringEngine::priority_adjustment(1.0, &r2), 0.5);

        let r5 = request().with_priority(5);
        assert_eq!(ScoringEngine::priority_adjustment(1.0, &r5), 0.2);
    }

    #[test]
    fn test_priority_monotonicity() {
        // For a fixed backend, the computed score never increases as the
        // numeric priority value grows.
        let b = backend(100, 0.001);
        let mut previous = f64::INFINITY;
        for priority in 1..=5 {
            let r = request().with_priority(priority);
            let score = ScoringEngine::score_backend(&b, &r, 0).score;
            assert!(score <= previous);
            previous = score;
        }
    }

    #[test]
    fn test_cost_preference_adjustment() {
        let b = backend(100, 0.002);

        let indifferent = request();
        assert_eq!(
            ScoringEngine::cost_preference_adjustment(1.0, &b, &indifferent),
            1.0
        );

        let cost_sensitive = request().preferring_cost();
        // 0.002 * 1000 = 2.0
        assert_eq!(
            ScoringEngine::cost_preference_adjustment(1.0, &b, &cost_sensitive),
            2.0
        );
    }

    #[test]
    fn test_cost_monotonicity() {
        // Increasing cost_per_token never decreases the score, with or
        // without the cost preference.
        for cost_sensitive in [false, true] {
            let mut previous = 0.0;
            for cost in [0.0001, 0.001, 0.01, 0.1] {
                let b = backend(100, cost);
                let mut r = request();
                if cost_sensitive {
                    r = r.preferring_cost();
                }
                let score = ScoringEngine::score_backend(&b, &r, 0).score;
                assert!(score >= previous);
                previous = score;
            }
        }
    }

    #[test]
    fn test_load_adjustment() {
        let mut b = backend(100, 0.001);

        // No load, no queue: unchanged
        assert_eq!(ScoringEngine::load_adjustment(1.0, &b), 1.0);

        // Load factor always applies
        b.current_load = 50.0;
        assert_eq!(ScoringEngine::load_adjustment(1.0, &b), 1.5);

        // Queue at the threshold does not trigger the queue penalty
        b.estimated_queue_time_ms = 100;
        assert_eq!(ScoringEngine::load_adjustment(1.0, &b), 1.5);

        // Queue above the threshold multiplies in on top of the load factor
        b.estimated_queue_time_ms = 200;
        assert_eq!(ScoringEngine::load_adjustment(1.0, &b), 3.0 * 1.5);
    }

    #[test]
    fn test_score_backend_reference_values() {
        // B1: 100ms * 0.001 = 0.1; B2: 80ms * 0.002 = 0.16
        let b1 = backend(100, 0.001);
        let b2 = backend(80, 0.002);
        let r = request();

        let s1 = ScoringEngine::score_backend(&b1, &r, 0);
        let s2 = ScoringEngine::score_backend(&b2, &r, 0);

        assert!((s1.score - 0.1).abs() < 1e-9);
        assert!((s2.score - 0.16).abs() < 1e-9);
        assert!(s1.score < s2.score);

        assert_eq!(s1.total_latency_ms, 100);
        assert_eq!(s1.total_cost, 0.5);
    }

    #[test]
    fn test_scores_are_non_negative() {
        let b = backend(100, 0.001);
        for priority in 1..=5 {
            let r = request().with_priority(priority);
            assert!(ScoringEngine::score_backend(&b, &r, 0).score >= 0.0);
        }
    }

    #[test]
    fn test_projected_latency_degraded() {
        let mut b = backend(100, 0.001);
        b.status = BackendStatus::Degraded;
        b.estimated_queue_time_ms = 10;

        // (100 + 20) * 1.5 + 10 = 190; queue time stays outside the
        // degraded inflation in the projection.
        assert_eq!(ScoringEngine::projected_latency_ms(&b, 20), 190);
    }

    #[test]
    fn test_projected_cost() {
        let b = backend(100, 0.002);
        let r = request(); // 500 tokens
        assert_eq!(ScoringEngine::projected_cost(&b, &r), 1.0);
    }
}
