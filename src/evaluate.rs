//! Route evaluation: provider call plus shadow scoring.

use tracing::debug;

use crate::error::RouteError;
use crate::traits::{GeometryOracle, PathProvider};
use crate::types::{GeoPoint, Route, RoutePoint, RouteType, ShadowArea};

/// Evaluation parameters.
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Upper bound on containment queries per route; the first and last
    /// points are always included.
    pub max_samples: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self { max_samples: 50 }
    }
}

/// Obtain a concrete route through the given waypoints and score its shadow
/// coverage.
///
/// Sampled points get their `in_shadow` flag set; unsampled points keep
/// `None`. An empty or single-point provider geometry is a provider failure.
pub fn evaluate_route<P, O>(
    provider: &P,
    oracle: &O,
    start: GeoPoint,
    end: GeoPoint,
    waypoints: &[GeoPoint],
    route_type: RouteType,
    shadows: &[ShadowArea],
    config: &EvaluatorConfig,
) -> Result<Route, RouteError>
where
    P: PathProvider + ?Sized,
    O: GeometryOracle + ?Sized,
{
    let path = provider.path(start, end, waypoints)?;
    if path.points.len() < 2 {
        return Err(RouteError::Provider(format!(
            "path has {} points",
            path.points.len()
        )));
    }

    let mut points: Vec<RoutePoint> = path.points.iter().copied().map(RoutePoint::from).collect();
    let shadow_percentage = sample_shadow_percentage(oracle, &mut points, shadows, config);

    debug!(
        route_type = ?route_type,
        distance_m = path.distance_m,
        shadow_percentage,
        waypoints = waypoints.len(),
        "evaluated route"
    );

    Ok(Route {
        points,
        distance_m: path.distance_m,
        duration_min: path.duration_s / 60.0,
        shadow_percentage,
        route_type,
        waypoint_count: waypoints.len(),
    })
}

/// Sample up to `max_samples` points (always the endpoints) against the
/// shadow set and return the integer in-shadow percentage.
fn sample_shadow_percentage<O>(
    oracle: &O,
    points: &mut [RoutePoint],
    shadows: &[ShadowArea],
    config: &EvaluatorConfig,
) -> u8
where
    O: GeometryOracle + ?Sized,
{
    if points.is_empty() || shadows.is_empty() {
        return 0;
    }

    let max_samples = config.max_samples.max(2);
    let len = points.len();
    // The final point always gets a sample, so the stride only has the
    // remaining budget to spend on the leading points.
    let stride = (len - 1).div_ceil(max_samples - 1).max(1);

    let mut sampled = 0usize;
    let mut hits = 0usize;
    let mut index = 0usize;
    while index < len - 1 {
        let in_shadow = oracle.contains(shadows, points[index].location());
        points[index].in_shadow = Some(in_shadow);
        sampled += 1;
        if in_shadow {
            hits += 1;
        }
        index += stride;
    }

    // The last point anchors the destination sample.
    let in_shadow = oracle.contains(shadows, points[len - 1].location());
    points[len - 1].in_shadow = Some(in_shadow);
    sampled += 1;
    if in_shadow {
        hits += 1;
    }

    ((hits as f64 / sampled as f64) * 100.0).round() as u8
}
