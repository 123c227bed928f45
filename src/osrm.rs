//! OSRM HTTP adapter for walking routes.

use serde::Deserialize;

use crate::error::RouteError;
use crate::polyline::Polyline;
use crate::traits::{Path, PathProvider};
use crate::types::GeoPoint;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "foot".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl PathProvider for OsrmClient {
    fn path(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        waypoints: &[GeoPoint],
    ) -> Result<Path, RouteError> {
        let mut stops: Vec<GeoPoint> = Vec::with_capacity(waypoints.len() + 2);
        stops.push(start);
        stops.extend_from_slice(waypoints);
        stops.push(end);

        let coords = stops
            .iter()
            .map(|p| format!("{:.6},{:.6}", p.lng, p.lat))
            .collect::<Vec<_>>()
            .join(";");

        let url = format!(
            "{}/route/v1/{}/{}?overview=full&geometries=polyline&steps=false",
            self.config.base_url, self.config.profile, coords
        );

        let body: OsrmRouteResponse = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json())?;

        if body.code != "Ok" {
            return Err(RouteError::Provider(format!("OSRM code {}", body.code)));
        }
        let route = body
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| RouteError::Provider("OSRM returned no routes".to_string()))?;

        let points: Vec<GeoPoint> = Polyline::decode(&route.geometry)
            .map_err(|err| RouteError::Provider(format!("bad geometry: {}", err)))?
            .into_points()
            .into_iter()
            .map(|(lat, lng)| GeoPoint::new(lat, lng))
            .collect();
        if points.len() < 2 {
            return Err(RouteError::Provider(format!(
                "OSRM geometry has {} points",
                points.len()
            )));
        }

        Ok(Path {
            points,
            distance_m: route.distance,
            duration_s: route.duration,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: String,
}
