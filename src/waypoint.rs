//! Detour waypoint synthesis.
//!
//! Produces a small set of candidate detour points biased toward or away
//! from the sun's direction, constrained so a path through them stays
//! legible: forward-progressing, inside a bearing cone around the
//! destination, and within detour-ratio and lateral-offset caps.
//!
//! Randomized offsets are a determinism mechanism, not entropy: the RNG is
//! seeded from the quantized endpoints, so a fixed (start, end) pair always
//! yields the same candidates for a given purpose and attempt.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::spatial::{
    bearing_deg, clamp_to_cone, cross_track_m, haversine_m, makes_forward_progress,
    normalize_bearing, offset_by_bearing, point_along,
};
use crate::types::{GeoPoint, SunPosition};

/// What the detour is biased toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePurpose {
    /// Bias toward the sun (stay out of building shadow).
    AvoidShadow,
    /// Bias toward the anti-solar direction, where shadows fall.
    SeekShadow,
    /// Alternate perpendicular offsets around the destination bearing.
    Balanced,
}

/// Tunable synthesis parameters.
///
/// The angular cones and caps are empirically chosen; they are configuration
/// rather than constants so callers can tighten or relax them.
#[derive(Debug, Clone)]
pub struct WaypointConfig {
    /// Minimum candidates per attempt.
    pub min_candidates: usize,
    /// Maximum candidates per attempt.
    pub max_candidates: usize,
    /// One candidate per this many metres of straight-line distance.
    pub candidate_spacing_m: f64,
    /// Forward-progress dot-product threshold as a fraction of |start->end|^2.
    pub forward_min_fraction: f64,
    /// Geographic bound padding around the endpoints, degrees.
    pub bound_padding_deg: f64,
    /// Candidates closer than this to an accepted one are dropped.
    pub dedup_distance_m: f64,
}

impl Default for WaypointConfig {
    fn default() -> Self {
        Self {
            min_candidates: 2,
            max_candidates: 20,
            candidate_spacing_m: 150.0,
            forward_min_fraction: 0.5,
            bound_padding_deg: 0.005,
            dedup_distance_m: 12.0,
        }
    }
}

/// One parameterization of the detour projection.
#[derive(Debug, Clone, Copy)]
struct DetourStrategy {
    /// Fraction of the way along the straight line for the base point.
    progress_ratio: f64,
    /// Detour projection distance, metres.
    detour_m: f64,
    /// Half-width of the bearing cone around the destination bearing.
    cone_half_width_deg: f64,
    /// Extra rotation applied to the preferred bearing.
    angle_offset_deg: f64,
    /// Cap on (start->wp->end) / (start->end).
    max_detour_ratio: f64,
    /// Cap on perpendicular offset as a fraction of straight-line distance.
    max_lateral_fraction: f64,
}

/// Strategies per attempt: repeated failures explore a different region of
/// the solution space instead of repeating identical work.
fn strategies_for(purpose: RoutePurpose, attempt: u32) -> [DetourStrategy; 3] {
    let base = match purpose {
        RoutePurpose::SeekShadow => [
            DetourStrategy {
                progress_ratio: 0.6,
                detour_m: 40.0,
                cone_half_width_deg: 60.0,
                angle_offset_deg: 0.0,
                max_detour_ratio: 1.5,
                max_lateral_fraction: 0.25,
            },
            DetourStrategy {
                progress_ratio: 0.7,
                detour_m: 60.0,
                cone_half_width_deg: 50.0,
                angle_offset_deg: 15.0,
                max_detour_ratio: 1.4,
                max_lateral_fraction: 0.22,
            },
            DetourStrategy {
                progress_ratio: 0.8,
                detour_m: 30.0,
                cone_half_width_deg: 45.0,
                angle_offset_deg: -15.0,
                max_detour_ratio: 1.3,
                max_lateral_fraction: 0.2,
            },
        ],
        RoutePurpose::AvoidShadow => [
            DetourStrategy {
                progress_ratio: 0.6,
                detour_m: 35.0,
                cone_half_width_deg: 55.0,
                angle_offset_deg: 0.0,
                max_detour_ratio: 1.35,
                max_lateral_fraction: 0.22,
            },
            DetourStrategy {
                progress_ratio: 0.75,
                detour_m: 50.0,
                cone_half_width_deg: 50.0,
                angle_offset_deg: 10.0,
                max_detour_ratio: 1.3,
                max_lateral_fraction: 0.2,
            },
            DetourStrategy {
                progress_ratio: 0.65,
                detour_m: 25.0,
                cone_half_width_deg: 45.0,
                angle_offset_deg: -10.0,
                max_detour_ratio: 1.25,
                max_lateral_fraction: 0.18,
            },
        ],
        RoutePurpose::Balanced => [
            DetourStrategy {
                progress_ratio: 0.65,
                detour_m: 30.0,
                cone_half_width_deg: 45.0,
                angle_offset_deg: 0.0,
                max_detour_ratio: 1.2,
                max_lateral_fraction: 0.18,
            },
            DetourStrategy {
                progress_ratio: 0.7,
                detour_m: 45.0,
                cone_half_width_deg: 45.0,
                angle_offset_deg: 20.0,
                max_detour_ratio: 1.15,
                max_lateral_fraction: 0.15,
            },
            DetourStrategy {
                progress_ratio: 0.6,
                detour_m: 20.0,
                cone_half_width_deg: 50.0,
                angle_offset_deg: -20.0,
                max_detour_ratio: 1.2,
                max_lateral_fraction: 0.16,
            },
        ],
    };

    // Rotate the strategy order and scale detour distances by attempt so a
    // retry starts from a different parameterization.
    let shift = (attempt as usize) % 3;
    let scale = 1.0 + 0.35 * f64::from(attempt);
    let mut rotated = [base[shift % 3], base[(shift + 1) % 3], base[(shift + 2) % 3]];
    for strategy in &mut rotated {
        strategy.detour_m *= scale;
    }
    rotated
}

/// Deterministic seed from the quantized endpoints.
///
/// Quantization is lat/lng times 10^4 rounded to an integer; the composite
/// mixes all four components with fixed odd multipliers. Tests depend on
/// this derivation staying stable.
pub fn derive_seed(start: GeoPoint, end: GeoPoint) -> u64 {
    fn quantize(value: f64) -> i64 {
        (value * 10_000.0).round() as i64
    }
    let a = quantize(start.lat).wrapping_mul(73_856_093);
    let b = quantize(start.lng).wrapping_mul(19_349_663);
    let c = quantize(end.lat).wrapping_mul(83_492_791);
    let d = quantize(end.lng).wrapping_mul(2_654_435_761);
    (a ^ b ^ c ^ d) as u64
}

/// Synthesize candidate detour points for one attempt.
///
/// Returns an empty vector when no plausible candidate survives the
/// geometric filters; the caller decides whether that is terminal.
pub fn synthesize(
    start: GeoPoint,
    end: GeoPoint,
    sun: &SunPosition,
    purpose: RoutePurpose,
    attempt: u32,
    config: &WaypointConfig,
) -> Vec<GeoPoint> {
    let straight_m = haversine_m(start, end);
    if straight_m < 1.0 {
        return Vec::new();
    }

    let count = ((straight_m / config.candidate_spacing_m).ceil() as usize)
        .clamp(config.min_candidates, config.max_candidates);
    let dest_bearing = bearing_deg(start, end);
    let strategies = strategies_for(purpose, attempt);

    let mut rng = ChaCha8Rng::seed_from_u64(derive_seed(start, end).wrapping_add(u64::from(attempt)));

    let lat_min = start.lat.min(end.lat) - config.bound_padding_deg;
    let lat_max = start.lat.max(end.lat) + config.bound_padding_deg;
    let lng_min = start.lng.min(end.lng) - config.bound_padding_deg;
    let lng_max = start.lng.max(end.lng) + config.bound_padding_deg;

    let mut candidates: Vec<GeoPoint> = Vec::with_capacity(count);

    for index in 0..count {
        let strategy = strategies[index % strategies.len()];

        let preferred = preferred_bearing(purpose, sun, dest_bearing, index);
        let rotated = normalize_bearing(
            preferred + strategy.angle_offset_deg + rng.gen_range(-5.0..5.0),
        );
        let constrained = clamp_to_cone(rotated, dest_bearing, strategy.cone_half_width_deg);

        let spread = (index as f64 / count as f64 - 0.5) * 0.2;
        let ratio = (strategy.progress_ratio + spread + rng.gen_range(-0.05..0.05))
            .clamp(0.2, 0.9);
        let detour_m = strategy.detour_m * (1.0 + rng.gen_range(-0.2..0.2));

        let base = point_along(start, end, ratio);
        let waypoint = offset_by_bearing(base, detour_m, constrained);

        // Plausibility filters, cheapest first.
        if waypoint.lat < lat_min
            || waypoint.lat > lat_max
            || waypoint.lng < lng_min
            || waypoint.lng > lng_max
        {
            continue;
        }
        if haversine_m(waypoint, end) >= haversine_m(base, end) {
            continue;
        }
        let through_m = haversine_m(start, waypoint) + haversine_m(waypoint, end);
        if through_m / straight_m > strategy.max_detour_ratio {
            continue;
        }
        if cross_track_m(waypoint, start, end) > strategy.max_lateral_fraction * straight_m {
            continue;
        }
        if !makes_forward_progress(start, end, waypoint, config.forward_min_fraction) {
            continue;
        }
        if candidates
            .iter()
            .any(|accepted| haversine_m(*accepted, waypoint) < config.dedup_distance_m)
        {
            continue;
        }

        candidates.push(waypoint);
    }

    candidates
}

/// The bearing the detour should lean toward before cone clamping.
fn preferred_bearing(
    purpose: RoutePurpose,
    sun: &SunPosition,
    dest_bearing: f64,
    index: usize,
) -> f64 {
    match purpose {
        RoutePurpose::AvoidShadow => sun.azimuth_deg,
        RoutePurpose::SeekShadow => normalize_bearing(sun.azimuth_deg + 180.0),
        RoutePurpose::Balanced => {
            let side = if index % 2 == 0 { 90.0 } else { -90.0 };
            normalize_bearing(dest_bearing + side)
        }
    }
}
