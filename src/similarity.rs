//! Duplicate detection between route candidates.
//!
//! Two routes are "effectively the same walk" when either their aggregate
//! metrics are within tight relative tolerances, or their sampled geometries
//! overlap almost everywhere.

use crate::types::Route;

/// Similarity tolerances. Exposed as configuration; the defaults mirror the
/// thresholds the candidate pipeline was tuned with.
#[derive(Debug, Clone)]
pub struct SimilarityConfig {
    /// Relative distance difference below which routes look alike.
    pub max_distance_rel_diff: f64,
    /// Relative duration difference threshold.
    pub max_duration_rel_diff: f64,
    /// Relative shadow-percentage difference threshold.
    pub max_shadow_rel_diff: f64,
    /// Sample cap per route for the geographic comparison.
    pub sample_cap: usize,
    /// Coordinate tolerance for a point-to-point match, degrees.
    pub coord_tolerance_deg: f64,
    /// Overlap ratio above which geometries count as the same.
    pub min_overlap_ratio: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            max_distance_rel_diff: 0.05,
            max_duration_rel_diff: 0.08,
            max_shadow_rel_diff: 0.08,
            sample_cap: 50,
            coord_tolerance_deg: 0.0005,
            min_overlap_ratio: 0.85,
        }
    }
}

/// Whether two routes are practically the same walk.
///
/// Symmetric: `are_similar(a, b) == are_similar(b, a)`.
pub fn are_similar(a: &Route, b: &Route, config: &SimilarityConfig) -> bool {
    characteristically_similar(a, b, config) || geographically_similar(a, b, config)
}

fn characteristically_similar(a: &Route, b: &Route, config: &SimilarityConfig) -> bool {
    relative_diff(a.distance_m, b.distance_m) < config.max_distance_rel_diff
        && relative_diff(a.duration_min, b.duration_min) < config.max_duration_rel_diff
        && relative_diff(
            f64::from(a.shadow_percentage),
            f64::from(b.shadow_percentage),
        ) < config.max_shadow_rel_diff
}

/// |a - b| relative to the larger magnitude; equal-and-zero pairs differ by 0.
fn relative_diff(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale < f64::EPSILON {
        return 0.0;
    }
    (a - b).abs() / scale
}

fn geographically_similar(a: &Route, b: &Route, config: &SimilarityConfig) -> bool {
    let samples_a = sample(a, config.sample_cap);
    let samples_b = sample(b, config.sample_cap);
    if samples_a.is_empty() || samples_b.is_empty() {
        return false;
    }
    // Overlap in both directions keeps the relation symmetric; a route that
    // is a sub-path of another still counts as the same walk.
    let forward = overlap_ratio(&samples_a, &samples_b, config.coord_tolerance_deg);
    let backward = overlap_ratio(&samples_b, &samples_a, config.coord_tolerance_deg);
    forward.max(backward) > config.min_overlap_ratio
}

fn sample(route: &Route, cap: usize) -> Vec<(f64, f64)> {
    let len = route.points.len();
    if len == 0 {
        return Vec::new();
    }
    let stride = len.div_ceil(cap.max(1)).max(1);
    let mut out: Vec<(f64, f64)> = route
        .points
        .iter()
        .step_by(stride)
        .map(|p| (p.lat, p.lng))
        .collect();
    let last = (route.points[len - 1].lat, route.points[len - 1].lng);
    if out.last() != Some(&last) {
        out.push(last);
    }
    out
}

fn overlap_ratio(from: &[(f64, f64)], to: &[(f64, f64)], tolerance: f64) -> f64 {
    let matched = from
        .iter()
        .filter(|(lat, lng)| {
            to.iter()
                .any(|(olat, olng)| (lat - olat).abs() <= tolerance && (lng - olng).abs() <= tolerance)
        })
        .count();
    matched as f64 / from.len() as f64
}
