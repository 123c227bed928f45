//! Route quality validation.
//!
//! A naive "most shadow" search degenerates into long, winding detours.
//! These checks keep accepted detours legible and roughly monotonic toward
//! the destination: bounded extra distance, a minimum fraction of
//! forward-progressing steps, bounded regressing runs, and a zigzag cap.
//! Thresholds are type-dependent and relax as shadow coverage rises, since
//! useful shadow often requires minor retracing.

use crate::spatial::haversine_m;
use crate::types::{GeoPoint, Route, RoutePoint, RouteType};

/// Tunable validation thresholds. Empirically chosen defaults; exposed as
/// configuration rather than constants.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Absolute minimum route size.
    pub min_route_distance_m: f64,
    pub min_route_points: usize,
    /// Distance-ratio caps vs. the base route, per type.
    pub shortest_max_distance_ratio: f64,
    pub shade_max_distance_ratio: f64,
    pub balanced_max_distance_ratio: f64,
    /// Extra ratio headroom for shade routes with a large shadow gain.
    pub shade_large_gain_pts: i16,
    pub shade_large_gain_ratio_bonus: f64,
    /// Minimum shadow-percentage improvement for shade candidates.
    /// Stricter when the base route has little shadow.
    pub low_shadow_cutoff_pct: u8,
    pub shade_min_improvement_strict_pts: i16,
    pub shade_min_improvement_relaxed_pts: i16,
    /// Minimum improvement for balanced candidates.
    pub balanced_min_improvement_pts: i16,
    /// Pre-filter bounds for obviously extreme candidates.
    pub extreme_detour_ratio: f64,
    pub extreme_min_efficiency: f64,
    /// Zigzag score weights and short-segment threshold.
    pub zigzag_reversal_weight: f64,
    pub zigzag_short_segment_weight: f64,
    pub short_segment_m: f64,
    /// Bearing change treated as a direction reversal, degrees.
    pub reversal_angle_deg: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_route_distance_m: 50.0,
            min_route_points: 3,
            shortest_max_distance_ratio: 1.1,
            shade_max_distance_ratio: 1.5,
            balanced_max_distance_ratio: 1.6,
            shade_large_gain_pts: 20,
            shade_large_gain_ratio_bonus: 0.15,
            low_shadow_cutoff_pct: 30,
            shade_min_improvement_strict_pts: 12,
            shade_min_improvement_relaxed_pts: 8,
            balanced_min_improvement_pts: 3,
            extreme_detour_ratio: 2.0,
            extreme_min_efficiency: 0.4,
            zigzag_reversal_weight: 0.6,
            zigzag_short_segment_weight: 0.4,
            short_segment_m: 5.0,
            reversal_angle_deg: 100.0,
        }
    }
}

/// Per-type progression thresholds, derived from (route type, shadow
/// percentage).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationCriteria {
    pub min_progress_efficiency: f64,
    pub max_regressing_run_ratio: f64,
    pub max_regressing_distance_ratio: f64,
    pub max_zigzag_score: f64,
}

impl ValidationCriteria {
    /// More declared/measured shadow buys more leniency.
    pub fn for_route(route_type: RouteType, shadow_percentage: u8) -> Self {
        let base = match route_type {
            RouteType::Shortest => Self {
                min_progress_efficiency: 0.8,
                max_regressing_run_ratio: 0.15,
                max_regressing_distance_ratio: 0.2,
                max_zigzag_score: 0.5,
            },
            RouteType::Shade => Self {
                min_progress_efficiency: 0.65,
                max_regressing_run_ratio: 0.25,
                max_regressing_distance_ratio: 0.3,
                max_zigzag_score: 0.65,
            },
            RouteType::Balanced => Self {
                min_progress_efficiency: 0.7,
                max_regressing_run_ratio: 0.2,
                max_regressing_distance_ratio: 0.25,
                max_zigzag_score: 0.6,
            },
        };
        let leniency = f64::from(shadow_percentage) / 100.0 * 0.1;
        Self {
            min_progress_efficiency: (base.min_progress_efficiency - leniency).max(0.5),
            max_regressing_run_ratio: base.max_regressing_run_ratio + leniency,
            max_regressing_distance_ratio: base.max_regressing_distance_ratio + leniency,
            max_zigzag_score: base.max_zigzag_score + leniency,
        }
    }
}

/// Step-by-step progression statistics for a point sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressionStats {
    /// Fraction of steps that strictly decrease remaining distance.
    pub efficiency: f64,
    /// Longest consecutive regressing run as a fraction of the step count.
    pub longest_regressing_run_ratio: f64,
    /// Total regressing distance as a fraction of total walked distance.
    pub regressing_distance_ratio: f64,
    /// Weighted combination of reversal frequency and short-segment share.
    pub zigzag_score: f64,
}

/// Walk the route's points and derive progression statistics toward
/// `destination`.
pub fn analyze_progression(
    points: &[RoutePoint],
    destination: GeoPoint,
    config: &ValidatorConfig,
) -> ProgressionStats {
    if points.len() < 2 {
        return ProgressionStats {
            efficiency: 1.0,
            longest_regressing_run_ratio: 0.0,
            regressing_distance_ratio: 0.0,
            zigzag_score: 0.0,
        };
    }

    let steps = points.len() - 1;
    let mut forward_steps = 0usize;
    let mut regressing_run = 0usize;
    let mut longest_run = 0usize;
    let mut total_m = 0.0;
    let mut regressing_m = 0.0;
    let mut short_segments = 0usize;
    let mut reversals = 0usize;
    let mut prev_bearing: Option<f64> = None;

    let mut remaining = haversine_m(points[0].location(), destination);
    for pair in points.windows(2) {
        let from = pair[0].location();
        let to = pair[1].location();
        let segment_m = haversine_m(from, to);
        total_m += segment_m;

        let next_remaining = haversine_m(to, destination);
        if next_remaining < remaining {
            forward_steps += 1;
            regressing_run = 0;
        } else {
            regressing_run += 1;
            longest_run = longest_run.max(regressing_run);
            regressing_m += segment_m;
        }
        remaining = next_remaining;

        if segment_m < config.short_segment_m {
            short_segments += 1;
        }
        if segment_m > f64::EPSILON {
            let bearing = crate::spatial::bearing_deg(from, to);
            if let Some(prev) = prev_bearing {
                if crate::spatial::bearing_diff_deg(bearing, prev).abs()
                    > config.reversal_angle_deg
                {
                    reversals += 1;
                }
            }
            prev_bearing = Some(bearing);
        }
    }

    let efficiency = forward_steps as f64 / steps as f64;
    let longest_regressing_run_ratio = longest_run as f64 / steps as f64;
    let regressing_distance_ratio = if total_m > f64::EPSILON {
        regressing_m / total_m
    } else {
        0.0
    };
    let zigzag_score = config.zigzag_reversal_weight * (reversals as f64 / steps as f64)
        + config.zigzag_short_segment_weight * (short_segments as f64 / steps as f64);

    ProgressionStats {
        efficiency,
        longest_regressing_run_ratio,
        regressing_distance_ratio,
        zigzag_score,
    }
}

/// Cheap pre-filter: is the candidate too extreme to be worth validating?
pub fn reject_extreme(candidate: &Route, base: &Route, config: &ValidatorConfig) -> bool {
    if base.distance_m > f64::EPSILON
        && candidate.distance_m / base.distance_m > config.extreme_detour_ratio
    {
        return true;
    }
    let destination = match candidate.points.last() {
        Some(point) => point.location(),
        None => return true,
    };
    let stats = analyze_progression(&candidate.points, destination, config);
    stats.efficiency < config.extreme_min_efficiency
}

/// Full acceptance decision for a candidate against the base route.
/// Criteria run in order; the first failure short-circuits.
pub fn accept(candidate: &Route, base: &Route, config: &ValidatorConfig) -> bool {
    // Minimum absolute size.
    if candidate.distance_m < config.min_route_distance_m
        || candidate.points.len() < config.min_route_points
    {
        return false;
    }

    // Distance ratio vs. base.
    let ratio = if base.distance_m > f64::EPSILON {
        candidate.distance_m / base.distance_m
    } else {
        f64::INFINITY
    };
    let improvement =
        i16::from(candidate.shadow_percentage) - i16::from(base.shadow_percentage);
    let max_ratio = match candidate.route_type {
        RouteType::Shortest => config.shortest_max_distance_ratio,
        RouteType::Shade => {
            if improvement >= config.shade_large_gain_pts {
                config.shade_max_distance_ratio + config.shade_large_gain_ratio_bonus
            } else {
                config.shade_max_distance_ratio
            }
        }
        RouteType::Balanced => config.balanced_max_distance_ratio,
    };
    if ratio > max_ratio {
        return false;
    }

    // Progression analysis against type/shadow-dependent thresholds.
    let destination = match candidate.points.last() {
        Some(point) => point.location(),
        None => return false,
    };
    let stats = analyze_progression(&candidate.points, destination, config);
    let criteria = ValidationCriteria::for_route(candidate.route_type, candidate.shadow_percentage);
    if stats.efficiency < criteria.min_progress_efficiency
        || stats.longest_regressing_run_ratio > criteria.max_regressing_run_ratio
        || stats.regressing_distance_ratio > criteria.max_regressing_distance_ratio
        || stats.zigzag_score > criteria.max_zigzag_score
    {
        return false;
    }

    // Type-specific shadow-gain requirements.
    match candidate.route_type {
        RouteType::Shortest => true,
        RouteType::Shade => {
            let required = if base.shadow_percentage < config.low_shadow_cutoff_pct {
                config.shade_min_improvement_strict_pts
            } else {
                config.shade_min_improvement_relaxed_pts
            };
            improvement >= required
        }
        RouteType::Balanced => {
            improvement >= config.balanced_min_improvement_pts
                && ratio <= config.balanced_max_distance_ratio
        }
    }
}
