//! Error taxonomy for the candidate pipeline.
//!
//! Variant-scope failures are recovered at the orchestrator into per-slot
//! "unavailable" placeholders; only the base shortest-route provider failure
//! degrades the whole request.

use std::fmt;

use crate::types::UnavailableReason;

#[derive(Debug)]
pub enum RouteError {
    /// The external path service was unreachable or returned an invalid or
    /// empty result.
    Provider(String),
    /// The shadow-geometry service was unreachable or returned an invalid
    /// result.
    Oracle(String),
    /// A bounded operation exceeded its time budget.
    Timeout(&'static str),
    /// A synthesized route failed quality validation. Not a system fault.
    ValidationRejected,
    /// The synthesizer could not produce any plausible detour point.
    NoWaypointFound,
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Provider(msg) => write!(f, "path provider error: {}", msg),
            RouteError::Oracle(msg) => write!(f, "geometry oracle error: {}", msg),
            RouteError::Timeout(stage) => write!(f, "timed out during {}", stage),
            RouteError::ValidationRejected => write!(f, "route failed quality validation"),
            RouteError::NoWaypointFound => write!(f, "no plausible detour waypoint found"),
        }
    }
}

impl RouteError {
    /// The slot downgrade a variant-scope failure collapses into.
    pub fn unavailable_reason(&self) -> UnavailableReason {
        match self {
            RouteError::Timeout(_) => UnavailableReason::Timeout,
            RouteError::ValidationRejected => UnavailableReason::Quality,
            RouteError::Provider(_) | RouteError::Oracle(_) | RouteError::NoWaypointFound => {
                UnavailableReason::Generation
            }
        }
    }
}

impl std::error::Error for RouteError {}

impl From<reqwest::Error> for RouteError {
    fn from(err: reqwest::Error) -> Self {
        RouteError::Provider(err.to_string())
    }
}
