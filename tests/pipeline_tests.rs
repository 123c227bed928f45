//! End-to-end orchestration tests against mock collaborators.
//!
//! The path provider interpolates straight legs through the requested
//! waypoints and the shadow oracle shades everything beyond a cross-track
//! threshold from the direct line, so a straight base route scores zero and
//! any real detour gains shade. No network, no containers.

use chrono::{DateTime, FixedOffset, TimeZone};
use geo::{LineString, Polygon};

use shadewalk::error::RouteError;
use shadewalk::orchestrator::{CandidateOrchestrator, OrchestratorConfig};
use shadewalk::similarity::are_similar;
use shadewalk::spatial::{cross_track_m, haversine_m, point_along};
use shadewalk::traits::{GeometryOracle, Path, PathProvider, SafetyGate};
use shadewalk::types::{GeoPoint, RouteType, ShadowArea, SunPosition};

const WALK_SPEED_M_S: f64 = 1.4;
const POINTS_PER_LEG: usize = 24;

fn busan_start() -> GeoPoint {
    GeoPoint::new(35.1587, 129.1550)
}

fn busan_end() -> GeoPoint {
    GeoPoint::new(35.1620, 129.1600)
}

fn summer_afternoon() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 7, 15, 14, 0, 0)
        .unwrap()
}

fn late_night() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(9 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 7, 15, 23, 0, 0)
        .unwrap()
}

/// Straight-leg provider: interpolates each stop-to-stop leg and reports the
/// stop-polyline length at walking speed.
struct GridProvider;

impl PathProvider for GridProvider {
    fn path(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        waypoints: &[GeoPoint],
    ) -> Result<Path, RouteError> {
        let mut stops = Vec::with_capacity(waypoints.len() + 2);
        stops.push(start);
        stops.extend_from_slice(waypoints);
        stops.push(end);

        let mut points = Vec::new();
        for pair in stops.windows(2) {
            for step in 0..POINTS_PER_LEG {
                let t = step as f64 / POINTS_PER_LEG as f64;
                points.push(point_along(pair[0], pair[1], t));
            }
        }
        points.push(end);

        let distance_m: f64 = stops
            .windows(2)
            .map(|pair| haversine_m(pair[0], pair[1]))
            .sum();
        Ok(Path {
            duration_s: distance_m / WALK_SPEED_M_S,
            points,
            distance_m,
        })
    }
}

struct FailingProvider;

impl PathProvider for FailingProvider {
    fn path(
        &self,
        _start: GeoPoint,
        _end: GeoPoint,
        _waypoints: &[GeoPoint],
    ) -> Result<Path, RouteError> {
        Err(RouteError::Provider("connection refused".to_string()))
    }
}

fn dummy_area() -> ShadowArea {
    let ring = LineString::from(vec![
        (129.15, 35.15),
        (129.17, 35.15),
        (129.17, 35.17),
        (129.15, 35.17),
    ]);
    ShadowArea {
        id: 1,
        building_height_m: 25.0,
        building: Polygon::new(ring.clone(), vec![]),
        shadow: Polygon::new(ring, vec![]),
    }
}

/// Shades every point farther than `threshold_m` off the direct line between
/// the fixed endpoints. The straight base route scores 0, detours score high.
struct OffLineOracle {
    start: GeoPoint,
    end: GeoPoint,
    threshold_m: f64,
}

impl OffLineOracle {
    fn for_pair(start: GeoPoint, end: GeoPoint) -> Self {
        Self {
            start,
            end,
            threshold_m: 5.0,
        }
    }
}

impl GeometryOracle for OffLineOracle {
    fn shadows_near(
        &self,
        _corridor: &[GeoPoint],
        _sun: &SunPosition,
    ) -> Result<Vec<ShadowArea>, RouteError> {
        Ok(vec![dummy_area()])
    }

    fn contains(&self, _shadows: &[ShadowArea], point: GeoPoint) -> bool {
        cross_track_m(point, self.start, self.end) > self.threshold_m
    }
}

struct SunlessOracle;

impl GeometryOracle for SunlessOracle {
    fn shadows_near(
        &self,
        _corridor: &[GeoPoint],
        _sun: &SunPosition,
    ) -> Result<Vec<ShadowArea>, RouteError> {
        Ok(Vec::new())
    }

    fn contains(&self, _shadows: &[ShadowArea], _point: GeoPoint) -> bool {
        false
    }
}

struct BrokenOracle;

impl GeometryOracle for BrokenOracle {
    fn shadows_near(
        &self,
        _corridor: &[GeoPoint],
        _sun: &SunPosition,
    ) -> Result<Vec<ShadowArea>, RouteError> {
        Err(RouteError::Oracle("service unavailable".to_string()))
    }

    fn contains(&self, _shadows: &[ShadowArea], _point: GeoPoint) -> bool {
        false
    }
}

struct OpenGate;

impl SafetyGate for OpenGate {
    fn is_unsafe(&self, _location: GeoPoint, _time: DateTime<FixedOffset>) -> bool {
        false
    }
}

struct ClosedGate;

impl SafetyGate for ClosedGate {
    fn is_unsafe(&self, _location: GeoPoint, _time: DateTime<FixedOffset>) -> bool {
        true
    }
}

/// Tight geographic tolerance so a shaded detour is not collapsed into the
/// straight base route by the similarity gate.
fn test_config() -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default();
    config.similarity.coord_tolerance_deg = 0.00003;
    config
}

#[test]
fn returns_three_slots_in_fixed_order() {
    let orchestrator = CandidateOrchestrator::new(
        GridProvider,
        OffLineOracle::for_pair(busan_start(), busan_end()),
        OpenGate,
        test_config(),
    )
    .unwrap();

    let candidates = orchestrator.recommend(busan_start(), busan_end(), summer_afternoon());

    assert_eq!(candidates.len(), 3);
    assert_eq!(candidates[0].route_type, RouteType::Shortest);
    assert_eq!(candidates[1].route_type, RouteType::Shade);
    assert_eq!(candidates[2].route_type, RouteType::Balanced);
    for candidate in &candidates {
        assert!(!candidate.display_name.is_empty());
        assert!(!candidate.description.is_empty());
        assert!(!candidate.color.is_empty());
    }
}

#[test]
fn base_slot_is_the_direct_route() {
    let orchestrator = CandidateOrchestrator::new(
        GridProvider,
        OffLineOracle::for_pair(busan_start(), busan_end()),
        OpenGate,
        test_config(),
    )
    .unwrap();

    let candidates = orchestrator.recommend(busan_start(), busan_end(), summer_afternoon());

    let base = candidates[0].route.as_ref().expect("base route present");
    assert_eq!(base.waypoint_count, 0);
    assert_eq!(base.shadow_percentage, 0);
    let direct = haversine_m(busan_start(), busan_end());
    assert!((base.distance_m - direct).abs() < 1.0);
    assert!(base.duration_min > 0.0);
}

#[test]
fn shade_variant_detours_into_shadow() {
    let orchestrator = CandidateOrchestrator::new(
        GridProvider,
        OffLineOracle::for_pair(busan_start(), busan_end()),
        OpenGate,
        test_config(),
    )
    .unwrap();

    let candidates = orchestrator.recommend(busan_start(), busan_end(), summer_afternoon());

    let base = candidates[0].route.as_ref().expect("base route present");
    let shade = candidates[1].route.as_ref().expect("shade route present");
    assert_eq!(shade.waypoint_count, 1);
    assert!(
        i16::from(shade.shadow_percentage) - i16::from(base.shadow_percentage) >= 8,
        "shade gain too small: {} vs {}",
        shade.shadow_percentage,
        base.shadow_percentage
    );
    assert!(shade.distance_m / base.distance_m <= 1.65);
    assert!(!are_similar(shade, base, &test_config().similarity));
}

#[test]
fn balanced_slot_is_filled_or_declared_similar() {
    let config = test_config();
    let orchestrator = CandidateOrchestrator::new(
        GridProvider,
        OffLineOracle::for_pair(busan_start(), busan_end()),
        OpenGate,
        config.clone(),
    )
    .unwrap();

    let candidates = orchestrator.recommend(busan_start(), busan_end(), summer_afternoon());

    let base = candidates[0].route.as_ref().expect("base route present");
    match &candidates[2].route {
        Some(balanced) => {
            let gain = i16::from(balanced.shadow_percentage) - i16::from(base.shadow_percentage);
            assert!(gain >= 3, "balanced gain too small: {}", gain);
            assert!(balanced.distance_m / base.distance_m <= 1.6);
        }
        // The concurrent shade variant may legitimately claim the same walk.
        None => assert_eq!(candidates[2].description, "similar to existing route"),
    }
}

#[test]
fn night_requests_only_fill_the_base_slot() {
    let orchestrator = CandidateOrchestrator::new(
        GridProvider,
        OffLineOracle::for_pair(busan_start(), busan_end()),
        OpenGate,
        test_config(),
    )
    .unwrap();

    let candidates = orchestrator.recommend(busan_start(), busan_end(), late_night());

    assert!(candidates[0].route.is_some());
    for candidate in &candidates[1..] {
        assert!(candidate.route.is_none());
        assert_eq!(candidate.description, "unavailable for safety reasons");
    }
}

#[test]
fn unsafe_conditions_gate_like_night() {
    let orchestrator = CandidateOrchestrator::new(
        GridProvider,
        OffLineOracle::for_pair(busan_start(), busan_end()),
        ClosedGate,
        test_config(),
    )
    .unwrap();

    let candidates = orchestrator.recommend(busan_start(), busan_end(), summer_afternoon());

    assert!(candidates[0].route.is_some());
    assert!(candidates[1].route.is_none());
    assert!(candidates[2].route.is_none());
    assert_eq!(candidates[1].description, "unavailable for safety reasons");
}

#[test]
fn exhausted_variant_budget_times_out_both_variants() {
    // A zero budget is already spent once the base route exists, so both
    // variant slots must degrade to the timeout reason while the base slot
    // keeps its route.
    let mut config = test_config();
    config.variant_budget = std::time::Duration::ZERO;
    let orchestrator = CandidateOrchestrator::new(
        GridProvider,
        OffLineOracle::for_pair(busan_start(), busan_end()),
        OpenGate,
        config,
    )
    .unwrap();

    let candidates = orchestrator.recommend(busan_start(), busan_end(), summer_afternoon());

    assert!(candidates[0].route.is_some());
    for candidate in &candidates[1..] {
        assert!(candidate.route.is_none());
        assert_eq!(candidate.description, "processing timeout");
    }
}

#[test]
fn provider_failure_degrades_every_slot() {
    let orchestrator = CandidateOrchestrator::new(
        FailingProvider,
        OffLineOracle::for_pair(busan_start(), busan_end()),
        OpenGate,
        test_config(),
    )
    .unwrap();

    let candidates = orchestrator.recommend(busan_start(), busan_end(), summer_afternoon());

    assert_eq!(candidates.len(), 3);
    for candidate in &candidates {
        assert!(candidate.route.is_none());
        assert_eq!(candidate.description, "route generation failed");
    }
}

#[test]
fn no_shadow_data_leaves_variants_unavailable() {
    // Every candidate scores 0% shade, so no variant can clear its minimum
    // improvement and both non-base slots degrade.
    let orchestrator =
        CandidateOrchestrator::new(GridProvider, SunlessOracle, OpenGate, test_config()).unwrap();

    let candidates = orchestrator.recommend(busan_start(), busan_end(), summer_afternoon());

    assert!(candidates[0].route.is_some());
    assert!(candidates[1].route.is_none());
    assert!(candidates[2].route.is_none());
}

#[test]
fn oracle_failure_still_returns_the_base_route() {
    let orchestrator =
        CandidateOrchestrator::new(GridProvider, BrokenOracle, OpenGate, test_config()).unwrap();

    let candidates = orchestrator.recommend(busan_start(), busan_end(), summer_afternoon());

    assert_eq!(candidates.len(), 3);
    let base = candidates[0].route.as_ref().expect("base route present");
    assert_eq!(base.shadow_percentage, 0);
}

#[test]
fn cached_request_returns_the_same_candidates() {
    let orchestrator = CandidateOrchestrator::new(
        GridProvider,
        OffLineOracle::for_pair(busan_start(), busan_end()),
        OpenGate,
        test_config(),
    )
    .unwrap()
    .with_cache(shadewalk::cache::RouteCache::new(
        std::time::Duration::from_secs(300),
        16,
    ));

    let first = orchestrator.recommend(busan_start(), busan_end(), summer_afternoon());
    let second = orchestrator.recommend(busan_start(), busan_end(), summer_afternoon());
    assert_eq!(first, second);
}

#[test]
fn repeated_requests_are_deterministic() {
    // Two independent orchestrators over the same inputs agree; waypoint
    // synthesis is seeded from the endpoints, not from entropy.
    let build = || {
        CandidateOrchestrator::new(
            GridProvider,
            OffLineOracle::for_pair(busan_start(), busan_end()),
            OpenGate,
            test_config(),
        )
        .unwrap()
    };
    let first = build().recommend(busan_start(), busan_end(), summer_afternoon());
    let second = build().recommend(busan_start(), busan_end(), summer_afternoon());
    assert_eq!(first, second);
}
