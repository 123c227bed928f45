//! Geodesic helpers for short urban distances.
//!
//! Haversine for distances, spherical forward projection for destination
//! points, and a local planar frame for perpendicular-offset and
//! forward-progress tests. At pedestrian scales (a few kilometres) the
//! planar approximations are well within the tolerances the validators use.

use crate::types::GeoPoint;

/// Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points in metres.
pub fn haversine_m(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlat = (to.lat - from.lat).to_radians();
    let dlng = (to.lng - from.lng).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Initial compass bearing from `from` to `to`, in degrees [0, 360).
pub fn bearing_deg(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlng = (to.lng - from.lng).to_radians();

    let y = dlng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();

    normalize_bearing(y.atan2(x).to_degrees())
}

/// Destination point after travelling `distance_m` along `bearing` from
/// `origin` (spherical forward projection).
pub fn offset_by_bearing(origin: GeoPoint, distance_m: f64, bearing: f64) -> GeoPoint {
    let angular = distance_m / EARTH_RADIUS_M;
    let bearing_rad = bearing.to_radians();
    let lat1 = origin.lat.to_radians();
    let lng1 = origin.lng.to_radians();

    let lat2 =
        (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing_rad.cos()).asin();
    let lng2 = lng1
        + (bearing_rad.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    GeoPoint::new(lat2.to_degrees(), lng2.to_degrees())
}

/// Linear interpolation between two points.
///
/// Good enough for progress-ratio base points over sub-kilometre legs.
pub fn point_along(a: GeoPoint, b: GeoPoint, fraction: f64) -> GeoPoint {
    GeoPoint::new(
        a.lat + (b.lat - a.lat) * fraction,
        a.lng + (b.lng - a.lng) * fraction,
    )
}

/// Offset of `point` from `origin` in a local planar frame, as
/// (east, north) metres.
pub fn local_offset_m(origin: GeoPoint, point: GeoPoint) -> (f64, f64) {
    let east = (point.lng - origin.lng).to_radians() * origin.lat.to_radians().cos()
        * EARTH_RADIUS_M;
    let north = (point.lat - origin.lat).to_radians() * EARTH_RADIUS_M;
    (east, north)
}

/// Perpendicular distance in metres from `point` to the line through
/// `a` and `b`, computed in the local planar frame.
pub fn cross_track_m(point: GeoPoint, a: GeoPoint, b: GeoPoint) -> f64 {
    let (ex, ey) = local_offset_m(a, b);
    let (px, py) = local_offset_m(a, point);
    let len_sq = ex * ex + ey * ey;
    if len_sq < f64::EPSILON {
        return (px * px + py * py).sqrt();
    }
    // Scalar cross product gives the signed area of the parallelogram;
    // dividing by the base length yields the height.
    (ex * py - ey * px).abs() / len_sq.sqrt()
}

/// Whether `waypoint` lies substantially in the forward direction: the dot
/// product of start->end and start->waypoint must be at least
/// `min_fraction` of |start->end|^2.
pub fn makes_forward_progress(
    start: GeoPoint,
    end: GeoPoint,
    waypoint: GeoPoint,
    min_fraction: f64,
) -> bool {
    let (ex, ey) = local_offset_m(start, end);
    let (wx, wy) = local_offset_m(start, waypoint);
    let dot = ex * wx + ey * wy;
    let len_sq = ex * ex + ey * ey;
    dot >= min_fraction * len_sq
}

/// Normalize a bearing into [0, 360).
pub fn normalize_bearing(bearing: f64) -> f64 {
    bearing.rem_euclid(360.0)
}

/// Signed smallest difference `a - b` between two bearings, in (-180, 180].
pub fn bearing_diff_deg(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 { diff - 360.0 } else { diff }
}

/// Clamp `bearing` to within `half_width` degrees of `center`.
pub fn clamp_to_cone(bearing: f64, center: f64, half_width: f64) -> f64 {
    let diff = bearing_diff_deg(bearing, center);
    if diff.abs() <= half_width {
        normalize_bearing(bearing)
    } else if diff > 0.0 {
        normalize_bearing(center + half_width)
    } else {
        normalize_bearing(center - half_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_same_point_is_zero() {
        let p = GeoPoint::new(35.1587, 129.1550);
        assert!(haversine_m(p, p) < 0.001);
    }

    #[test]
    fn haversine_known_distance() {
        // Las Vegas to Los Angeles, ~370 km.
        let lv = GeoPoint::new(36.17, -115.14);
        let la = GeoPoint::new(34.05, -118.24);
        let d = haversine_m(lv, la);
        assert!(d > 350_000.0 && d < 400_000.0, "got {}", d);
    }

    #[test]
    fn bearing_cardinal_directions() {
        let origin = GeoPoint::new(35.0, 129.0);
        let north = GeoPoint::new(35.01, 129.0);
        let east = GeoPoint::new(35.0, 129.01);
        assert!(bearing_deg(origin, north).abs() < 0.5);
        assert!((bearing_deg(origin, east) - 90.0).abs() < 0.5);
    }

    #[test]
    fn offset_round_trips_distance() {
        let origin = GeoPoint::new(35.1587, 129.1550);
        let moved = offset_by_bearing(origin, 250.0, 45.0);
        let d = haversine_m(origin, moved);
        assert!((d - 250.0).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn cross_track_of_lateral_offset() {
        let a = GeoPoint::new(35.0, 129.0);
        let b = GeoPoint::new(35.0, 129.02);
        let mid = point_along(a, b, 0.5);
        let off = offset_by_bearing(mid, 100.0, 0.0); // due north of the line
        let d = cross_track_m(off, a, b);
        assert!((d - 100.0).abs() < 2.0, "got {}", d);
    }

    #[test]
    fn forward_progress_rejects_backtracking() {
        let start = GeoPoint::new(35.0, 129.0);
        let end = GeoPoint::new(35.0, 129.02);
        let behind = GeoPoint::new(35.0, 128.99);
        let ahead = point_along(start, end, 0.7);
        assert!(!makes_forward_progress(start, end, behind, 0.5));
        assert!(makes_forward_progress(start, end, ahead, 0.5));
    }

    #[test]
    fn cone_clamping() {
        assert_eq!(clamp_to_cone(100.0, 90.0, 45.0), 100.0);
        assert_eq!(clamp_to_cone(200.0, 90.0, 45.0), 135.0);
        assert_eq!(clamp_to_cone(350.0, 90.0, 45.0), 45.0);
    }

    #[test]
    fn bearing_diff_wraps() {
        assert_eq!(bearing_diff_deg(10.0, 350.0), 20.0);
        assert_eq!(bearing_diff_deg(350.0, 10.0), -20.0);
    }
}
