//! shadewalk core
//!
//! Shadow-aware pedestrian route candidate generation: solar geometry,
//! detour waypoint synthesis, route scoring/validation, and the bounded-time
//! orchestration pipeline. Turn-by-turn pathfinding is delegated to an
//! external walking-directions provider behind [`traits::PathProvider`].

pub mod cache;
pub mod error;
pub mod evaluate;
pub mod orchestrator;
pub mod osrm;
pub mod osrm_data;
pub mod polyline;
pub mod shadow;
pub mod similarity;
pub mod solar;
pub mod spatial;
pub mod traits;
pub mod types;
pub mod validate;
pub mod waypoint;
