//! delve-core: procedural dungeon level generation
//!
//! Builds a single level by partitioning the map into regions, placing and
//! reshaping rooms, joining them with corridors and validating that the
//! result is one connected walkable area. Choke points of the finished level
//! are reported for later gameplay use.
//!
//! Generation is fully deterministic for a given seed and configuration.

pub mod config;
pub mod error;
pub mod mapgen;

mod consts;
mod rng;

pub use config::GenConfig;
pub use consts::*;
pub use error::{ConfigError, GenError, InvalidReason, TemplateError};
pub use mapgen::{Level, LevelArchetype, LevelGenerator, MapTemplate};
pub use rng::GameRng;
