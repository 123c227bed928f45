//! Core value types for the candidate engine.
//!
//! Everything here is a per-request value object; nothing is shared mutable
//! state across requests.

use geo::Polygon;
use serde::{Deserialize, Serialize};

/// A geographic point in WGS84 decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A sampled point along a route.
///
/// `in_shadow` is `Some` only for points that were actually tested against
/// the shadow geometry; unsampled points stay `None` ("unknown") rather than
/// being interpolated from the aggregate percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub lat: f64,
    pub lng: f64,
    pub in_shadow: Option<bool>,
}

impl RoutePoint {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

impl From<GeoPoint> for RoutePoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            lat: point.lat,
            lng: point.lng,
            in_shadow: None,
        }
    }
}

/// Horizontal sun position for a (location, timestamp) pair.
///
/// Azimuth is a compass bearing: 0 = north, 90 = east, 180 = south,
/// 270 = west. Altitude at or below zero means the sun is below the horizon
/// and no usable shadow geometry exists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunPosition {
    pub altitude_deg: f64,
    pub azimuth_deg: f64,
}

impl SunPosition {
    pub fn is_above_horizon(&self) -> bool {
        self.altitude_deg > 0.0
    }
}

/// A building and the shadow polygon it casts for one sun position.
///
/// Produced by a [`crate::traits::GeometryOracle`]; lives for the request.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowArea {
    pub id: u64,
    pub building_height_m: f64,
    pub building: Polygon<f64>,
    pub shadow: Polygon<f64>,
}

/// The three fixed candidate slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    Shortest,
    Shade,
    Balanced,
}

impl RouteType {
    pub fn display_name(&self) -> &'static str {
        match self {
            RouteType::Shortest => "Shortest route",
            RouteType::Shade => "Shade route",
            RouteType::Balanced => "Balanced route",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RouteType::Shortest => "#3b82f6",
            RouteType::Shade => "#22c55e",
            RouteType::Balanced => "#f59e0b",
        }
    }
}

/// A concrete walking route returned by the path provider and scored against
/// the shadow geometry.
///
/// `points` and `distance_m` are produced together by the provider and are
/// not mutated independently; `shadow_percentage` is computed from the point
/// sequence present at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub points: Vec<RoutePoint>,
    pub distance_m: f64,
    pub duration_min: f64,
    pub shadow_percentage: u8,
    pub route_type: RouteType,
    pub waypoint_count: usize,
}

/// Why a candidate slot could not be filled with a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnavailableReason {
    Safety,
    Quality,
    Timeout,
    Similarity,
    Generation,
}

impl UnavailableReason {
    /// Short, stable reason string suitable for direct display.
    pub fn message(&self) -> &'static str {
        match self {
            UnavailableReason::Safety => "unavailable for safety reasons",
            UnavailableReason::Quality => "quality threshold not met",
            UnavailableReason::Timeout => "processing timeout",
            UnavailableReason::Similarity => "similar to existing route",
            UnavailableReason::Generation => "route generation failed",
        }
    }
}

/// One of the three fixed output slots.
///
/// An absent route is a valid terminal state meaning "could not be
/// generated", not an error; callers always receive exactly three candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCandidate {
    pub route_type: RouteType,
    pub display_name: String,
    pub route: Option<Route>,
    pub description: String,
    pub score: f64,
    pub color: String,
}

impl RouteCandidate {
    /// A slot filled with a generated route.
    pub fn available(route: Route, description: String, score: f64) -> Self {
        let route_type = route.route_type;
        Self {
            route_type,
            display_name: route_type.display_name().to_string(),
            route: Some(route),
            description,
            score,
            color: route_type.color().to_string(),
        }
    }

    /// A placeholder slot carrying the downgrade reason.
    pub fn unavailable(route_type: RouteType, reason: UnavailableReason) -> Self {
        Self {
            route_type,
            display_name: route_type.display_name().to_string(),
            route: None,
            description: reason.message().to_string(),
            score: 0.0,
            color: route_type.color().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_point_from_geo_point_has_unknown_shadow() {
        let point = RoutePoint::from(GeoPoint::new(35.15, 129.15));
        assert_eq!(point.in_shadow, None);
        assert_eq!(point.location(), GeoPoint::new(35.15, 129.15));
    }

    #[test]
    fn sun_below_horizon() {
        let sun = SunPosition {
            altitude_deg: -3.0,
            azimuth_deg: 290.0,
        };
        assert!(!sun.is_above_horizon());
    }

    #[test]
    fn unavailable_candidate_keeps_slot_metadata() {
        let candidate = RouteCandidate::unavailable(RouteType::Shade, UnavailableReason::Timeout);
        assert_eq!(candidate.route_type, RouteType::Shade);
        assert!(candidate.route.is_none());
        assert_eq!(candidate.description, "processing timeout");
        assert!(!candidate.display_name.is_empty());
    }
}
