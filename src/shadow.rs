//! Building-footprint shadow oracle.
//!
//! A concrete [`GeometryOracle`] for deployments without an external shadow
//! service: each building footprint is projected along the anti-solar
//! bearing by its shadow length, and the hull of the footprint plus its
//! projection is the shadow polygon. The core only ever talks to the trait.

use geo::{Centroid, Contains, ConvexHull, MultiPoint, Point, Polygon};
use tracing::debug;

use crate::error::RouteError;
use crate::solar::shadow_length_m;
use crate::spatial::{haversine_m, normalize_bearing, offset_by_bearing};
use crate::traits::GeometryOracle;
use crate::types::{GeoPoint, ShadowArea, SunPosition};

/// A building with a footprint polygon (x = lng, y = lat) and a height.
#[derive(Debug, Clone)]
pub struct Building {
    pub id: u64,
    pub height_m: f64,
    pub footprint: Polygon<f64>,
}

/// Oracle over a fixed set of buildings.
#[derive(Debug, Clone)]
pub struct BuildingShadowOracle {
    buildings: Vec<Building>,
    /// Buildings beyond this distance from the corridor are ignored.
    pub search_radius_m: f64,
    /// Cap on projected shadow length; low sun otherwise produces
    /// kilometre-scale polygons of no routing value.
    pub max_shadow_length_m: f64,
}

impl BuildingShadowOracle {
    pub fn new(buildings: Vec<Building>) -> Self {
        Self {
            buildings,
            search_radius_m: 200.0,
            max_shadow_length_m: 500.0,
        }
    }

    fn near_corridor(&self, building: &Building, corridor: &[GeoPoint]) -> bool {
        let Some(centroid) = building.footprint.centroid() else {
            return false;
        };
        let center = GeoPoint::new(centroid.y(), centroid.x());
        corridor
            .iter()
            .any(|point| haversine_m(*point, center) <= self.search_radius_m)
    }

    fn cast_shadow(&self, building: &Building, sun: &SunPosition) -> Polygon<f64> {
        let length = shadow_length_m(building.height_m, sun.altitude_deg)
            .min(self.max_shadow_length_m);
        // Shadows fall along the reciprocal of the solar azimuth.
        let direction = normalize_bearing(sun.azimuth_deg + 180.0);

        let mut hull_points: Vec<Point<f64>> = Vec::new();
        for coord in building.footprint.exterior().coords() {
            let origin = GeoPoint::new(coord.y, coord.x);
            let tip = offset_by_bearing(origin, length, direction);
            hull_points.push(Point::new(coord.x, coord.y));
            hull_points.push(Point::new(tip.lng, tip.lat));
        }
        MultiPoint::new(hull_points).convex_hull()
    }
}

impl GeometryOracle for BuildingShadowOracle {
    fn shadows_near(
        &self,
        corridor: &[GeoPoint],
        sun: &SunPosition,
    ) -> Result<Vec<ShadowArea>, RouteError> {
        if !sun.is_above_horizon() {
            return Ok(Vec::new());
        }

        let areas: Vec<ShadowArea> = self
            .buildings
            .iter()
            .filter(|building| self.near_corridor(building, corridor))
            .map(|building| ShadowArea {
                id: building.id,
                building_height_m: building.height_m,
                building: building.footprint.clone(),
                shadow: self.cast_shadow(building, sun),
            })
            .collect();

        debug!(
            buildings = self.buildings.len(),
            shadows = areas.len(),
            altitude_deg = sun.altitude_deg,
            "computed shadow areas"
        );
        Ok(areas)
    }

    fn contains(&self, shadows: &[ShadowArea], point: GeoPoint) -> bool {
        let p = Point::new(point.lng, point.lat);
        shadows.iter().any(|area| area.shadow.contains(&p))
    }
}
