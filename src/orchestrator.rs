//! Candidate orchestration pipeline.
//!
//! Runs the end-to-end request: gating, base shortest route, concurrent
//! shade/balanced variant generation on a fixed worker pool, validation and
//! similarity gating, and finalization into exactly three labeled
//! candidates. Every terminal path returns the same three-slot shape;
//! variant-scope failures downgrade their single slot, never the request.

use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, Timelike};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cache::RouteCache;
use crate::error::RouteError;
use crate::evaluate::{evaluate_route, EvaluatorConfig};
use crate::similarity::{are_similar, SimilarityConfig};
use crate::solar::sun_position;
use crate::spatial::point_along;
use crate::traits::{GeometryOracle, PathProvider, SafetyGate};
use crate::types::{
    GeoPoint, Route, RouteCandidate, RouteType, ShadowArea, SunPosition, UnavailableReason,
};
use crate::validate::{accept, reject_extreme, ValidatorConfig};
use crate::waypoint::{synthesize, RoutePurpose, WaypointConfig};

/// Pipeline tuning knobs, including the nested component configurations.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Local hours treated as night: [night_start_hour, 24) and
    /// [0, night_end_hour).
    pub night_start_hour: u32,
    pub night_end_hour: u32,
    /// Synthesizer attempts per variant before giving up.
    pub max_attempts: u32,
    /// Concurrent provider evaluations per batch.
    pub batch_size: usize,
    /// Fixed worker pool size.
    pub worker_threads: usize,
    /// Coarse budget for the two variant generations, measured from
    /// orchestration start.
    pub variant_budget: Duration,
    /// Corridor samples handed to the geometry oracle.
    pub corridor_samples: usize,
    /// Distance-penalty weight in the balanced score (points deducted per
    /// 1% of extra distance vs. the base route).
    pub balanced_distance_weight: f64,
    pub waypoint: WaypointConfig,
    pub validator: ValidatorConfig,
    pub similarity: SimilarityConfig,
    pub evaluator: EvaluatorConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            night_start_hour: 22,
            night_end_hour: 6,
            max_attempts: 3,
            batch_size: 5,
            worker_threads: 4,
            variant_budget: Duration::from_secs(20),
            corridor_samples: 12,
            balanced_distance_weight: 0.5,
            waypoint: WaypointConfig::default(),
            validator: ValidatorConfig::default(),
            similarity: SimilarityConfig::default(),
            evaluator: EvaluatorConfig::default(),
        }
    }
}

/// The root of the pipeline. Owns the worker pool; everything else is
/// injected.
pub struct CandidateOrchestrator<P, O, G> {
    provider: P,
    oracle: O,
    gate: G,
    pool: rayon::ThreadPool,
    cache: Option<RouteCache>,
    config: OrchestratorConfig,
}

impl<P, O, G> CandidateOrchestrator<P, O, G>
where
    P: PathProvider,
    O: GeometryOracle,
    G: SafetyGate,
{
    pub fn new(
        provider: P,
        oracle: O,
        gate: G,
        config: OrchestratorConfig,
    ) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads.max(2))
            .build()?;
        Ok(Self {
            provider,
            oracle,
            gate,
            pool,
            cache: None,
            config,
        })
    }

    /// Attach an injected result cache. The orchestrator only reads and
    /// writes through it; the caller owns its lifetime.
    pub fn with_cache(mut self, cache: RouteCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Produce exactly three candidates in shortest/shade/balanced order.
    pub fn recommend(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        time: DateTime<FixedOffset>,
    ) -> Vec<RouteCandidate> {
        let started = Instant::now();
        let cache_key = RouteCache::fingerprint(start, end, time);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&cache_key) {
                debug!(key = %cache_key, "cache hit");
                return hit;
            }
        }

        let gated = self.is_gated(start, time);
        let sun = sun_position(start.lat, start.lng, time);
        let shadows = self.fetch_shadows(start, end, &sun);

        // Base shortest route: a provider failure here is fatal to the
        // whole request.
        let base = match evaluate_route(
            &self.provider,
            &self.oracle,
            start,
            end,
            &[],
            RouteType::Shortest,
            &shadows,
            &self.config.evaluator,
        ) {
            Ok(route) => route,
            Err(err) => {
                warn!(error = %err, "base route generation failed");
                return all_unavailable();
            }
        };

        if gated {
            info!("request gated (night window or unsafe conditions)");
            let candidates = vec![
                base_candidate(&base),
                RouteCandidate::unavailable(RouteType::Shade, UnavailableReason::Safety),
                RouteCandidate::unavailable(RouteType::Balanced, UnavailableReason::Safety),
            ];
            self.store(cache_key, &candidates);
            return candidates;
        }

        let deadline = started + self.config.variant_budget;
        let (shade_result, balanced_result) = self.pool.join(
            || self.generate_variant(RouteType::Shade, start, end, &sun, &shadows, &base, deadline),
            || {
                self.generate_variant(
                    RouteType::Balanced,
                    start,
                    end,
                    &sun,
                    &shadows,
                    &base,
                    deadline,
                )
            },
        );

        // Validating/finalizing: the variants ran concurrently, so the
        // balanced slot is checked against the shade result only now.
        let balanced_result = match (&shade_result, balanced_result) {
            (Ok(shade), Ok(balanced))
                if are_similar(&balanced, shade, &self.config.similarity) =>
            {
                Err(UnavailableReason::Similarity)
            }
            (_, other) => other,
        };

        let candidates = vec![
            base_candidate(&base),
            self.variant_candidate(RouteType::Shade, shade_result, &base),
            self.variant_candidate(RouteType::Balanced, balanced_result, &base),
        ];

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            shade = candidates[1].route.is_some(),
            balanced = candidates[2].route.is_some(),
            "request finalized"
        );
        self.store(cache_key, &candidates);
        candidates
    }

    fn is_gated(&self, start: GeoPoint, time: DateTime<FixedOffset>) -> bool {
        let hour = time.hour();
        let night = hour >= self.config.night_start_hour || hour < self.config.night_end_hour;
        night || self.gate.is_unsafe(start, time)
    }

    /// Straight-corridor samples for the shadow query; an oracle failure is
    /// recovered as "no shadow data".
    fn fetch_shadows(&self, start: GeoPoint, end: GeoPoint, sun: &SunPosition) -> Vec<ShadowArea> {
        let samples = self.config.corridor_samples.max(2);
        let corridor: Vec<GeoPoint> = (0..=samples)
            .map(|i| point_along(start, end, i as f64 / samples as f64))
            .collect();
        match self.oracle.shadows_near(&corridor, sun) {
            Ok(shadows) => shadows,
            Err(err) => {
                warn!(error = %err, "shadow oracle failed; continuing without shadow data");
                Vec::new()
            }
        }
    }

    /// Generate one non-base variant. All failures collapse into a slot
    /// reason; nothing propagates to the caller.
    fn generate_variant(
        &self,
        route_type: RouteType,
        start: GeoPoint,
        end: GeoPoint,
        sun: &SunPosition,
        shadows: &[ShadowArea],
        base: &Route,
        deadline: Instant,
    ) -> Result<Route, UnavailableReason> {
        let purpose = match route_type {
            RouteType::Shade => RoutePurpose::SeekShadow,
            RouteType::Balanced => RoutePurpose::Balanced,
            RouteType::Shortest => RoutePurpose::AvoidShadow,
        };

        let mut saw_candidate = false;
        let mut saw_similar = false;

        for attempt in 0..self.config.max_attempts {
            if Instant::now() >= deadline {
                let err = RouteError::Timeout("variant generation");
                debug!(?route_type, attempt, error = %err, "variant budget exhausted");
                return Err(err.unavailable_reason());
            }

            let waypoints = synthesize(start, end, sun, purpose, attempt, &self.config.waypoint);
            if waypoints.is_empty() {
                debug!(?route_type, attempt, "no plausible waypoints");
                continue;
            }

            for batch in waypoints.chunks(self.config.batch_size.max(1)) {
                if Instant::now() >= deadline {
                    return Err(RouteError::Timeout("variant generation").unavailable_reason());
                }

                // Fan out the batch on the worker pool; results come back
                // in submission order.
                let results: Vec<Result<Route, RouteError>> = batch
                    .par_iter()
                    .map(|waypoint| {
                        evaluate_route(
                            &self.provider,
                            &self.oracle,
                            start,
                            end,
                            std::slice::from_ref(waypoint),
                            route_type,
                            shadows,
                            &self.config.evaluator,
                        )
                    })
                    .collect();

                let mut best: Option<(f64, Route)> = None;
                for result in results {
                    let route = match result {
                        Ok(route) => route,
                        Err(err) => {
                            debug!(?route_type, error = %err, "candidate evaluation failed");
                            continue;
                        }
                    };
                    saw_candidate = true;
                    if reject_extreme(&route, base, &self.config.validator) {
                        continue;
                    }
                    if !accept(&route, base, &self.config.validator) {
                        continue;
                    }
                    if are_similar(&route, base, &self.config.similarity) {
                        saw_similar = true;
                        continue;
                    }
                    let score = self.variant_score(&route, base);
                    let better = best
                        .as_ref()
                        .map(|(best_score, _)| score > *best_score)
                        .unwrap_or(true);
                    if better {
                        best = Some((score, route));
                    }
                }

                // Early exit: the batch produced a valid candidate.
                if let Some((score, route)) = best {
                    debug!(?route_type, attempt, score, "variant accepted");
                    return Ok(route);
                }
            }
        }

        if saw_similar {
            return Err(UnavailableReason::Similarity);
        }
        let err = if saw_candidate {
            RouteError::ValidationRejected
        } else {
            RouteError::NoWaypointFound
        };
        debug!(?route_type, error = %err, "variant exhausted all attempts");
        Err(err.unavailable_reason())
    }

    /// Declared scoring: shadow percentage for shade, shadow gain minus a
    /// distance penalty for balanced. Selection never depends on arrival
    /// order.
    fn variant_score(&self, route: &Route, base: &Route) -> f64 {
        match route.route_type {
            RouteType::Shade => f64::from(route.shadow_percentage),
            RouteType::Balanced => balanced_score(route, base, self.config.balanced_distance_weight),
            RouteType::Shortest => -route.distance_m,
        }
    }

    fn variant_candidate(
        &self,
        route_type: RouteType,
        result: Result<Route, UnavailableReason>,
        base: &Route,
    ) -> RouteCandidate {
        match result {
            Ok(route) => {
                let score = self.variant_score(&route, base);
                let description = describe_delta(&route, base);
                RouteCandidate::available(route, description, score)
            }
            Err(reason) => RouteCandidate::unavailable(route_type, reason),
        }
    }

    fn store(&self, key: String, candidates: &[RouteCandidate]) {
        if let Some(cache) = &self.cache {
            cache.insert(key, candidates.to_vec());
        }
    }
}

fn balanced_score(route: &Route, base: &Route, distance_weight: f64) -> f64 {
    let gain = f64::from(route.shadow_percentage) - f64::from(base.shadow_percentage);
    let extra_pct = if base.distance_m > f64::EPSILON {
        (route.distance_m / base.distance_m - 1.0) * 100.0
    } else {
        0.0
    };
    gain - distance_weight * extra_pct
}

fn base_candidate(base: &Route) -> RouteCandidate {
    let description = format!(
        "{:.0} m, {:.0} min, {}% shade",
        base.distance_m, base.duration_min, base.shadow_percentage
    );
    RouteCandidate::available(base.clone(), description, 100.0)
}

/// Distance and shadow deltas vs. the base, for non-base slots.
fn describe_delta(route: &Route, base: &Route) -> String {
    let extra_m = route.distance_m - base.distance_m;
    let shade_delta =
        i16::from(route.shadow_percentage) - i16::from(base.shadow_percentage);
    format!(
        "{}{:.0} m, {}{} pts shade vs shortest",
        if extra_m >= 0.0 { "+" } else { "" },
        extra_m,
        if shade_delta >= 0 { "+" } else { "" },
        shade_delta
    )
}

/// Total degradation: the fixed three-slot shape with no routes.
fn all_unavailable() -> Vec<RouteCandidate> {
    vec![
        RouteCandidate::unavailable(RouteType::Shortest, UnavailableReason::Generation),
        RouteCandidate::unavailable(RouteType::Shade, UnavailableReason::Generation),
        RouteCandidate::unavailable(RouteType::Balanced, UnavailableReason::Generation),
    ]
}
