//! Seams for the external collaborators.
//!
//! These are intentionally minimal. The core calls out through these traits
//! and never owns the street network, the shadow grid or the weather signal;
//! concrete adapters live at the edges (see [`crate::osrm`] and
//! [`crate::shadow`]).

use chrono::{DateTime, FixedOffset};

use crate::error::RouteError;
use crate::types::{GeoPoint, ShadowArea, SunPosition};

/// A concrete walking path between two points.
///
/// Points and distance are produced together by the provider; the core never
/// recomputes one without the other.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub points: Vec<GeoPoint>,
    pub distance_m: f64,
    pub duration_s: f64,
}

/// Walking-directions provider.
///
/// `waypoints` are ordered intermediate points the path must pass through;
/// an empty slice requests the shortest path. An empty or single-point
/// geometry in the response is a provider failure.
pub trait PathProvider: Send + Sync {
    fn path(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        waypoints: &[GeoPoint],
    ) -> Result<Path, RouteError>;
}

/// Building/shadow geometry service.
pub trait GeometryOracle: Send + Sync {
    /// Shadow areas cast near the given corridor for one sun position.
    ///
    /// Any caching (for example by region and hour) is the oracle's concern.
    fn shadows_near(
        &self,
        corridor: &[GeoPoint],
        sun: &SunPosition,
    ) -> Result<Vec<ShadowArea>, RouteError>;

    /// Whether `point` falls inside any of the given shadow areas.
    fn contains(&self, shadows: &[ShadowArea], point: GeoPoint) -> bool;
}

/// Weather/night gating decision, consulted once at the start of a request.
pub trait SafetyGate: Send + Sync {
    fn is_unsafe(&self, location: GeoPoint, time: DateTime<FixedOffset>) -> bool;
}
