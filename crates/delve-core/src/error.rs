//! Error types
//!
//! A map that fails validation is not an error: the orchestrator simply
//! retries. Only bad input and an exhausted retry budget surface here.

use thiserror::Error;

/// Level generation errors
#[derive(Debug, Error)]
pub enum GenError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid template: {0}")]
    Template(#[from] TemplateError),

    #[error("Level generation exhausted its retry budget after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

/// Configuration errors, reported before any attempt is made
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Map {width}x{height} is too small for a 3x3 region layout (need at least {min_width}x{min_height})")]
    MapTooSmall {
        width: usize,
        height: usize,
        min_width: usize,
        min_height: usize,
    },

    #[error("Room bounds for {what} are inverted or empty: {min}..={max}")]
    BadRoomBounds {
        what: &'static str,
        min: usize,
        max: usize,
    },

    #[error("Percentage '{field}' must be at most 100, got {value}")]
    BadPercent { field: &'static str, value: u32 },

    #[error("Forced blocked region ({x}, {y}) is outside the 3x3 layout")]
    RegionOutOfRange { x: usize, y: usize },

    #[error("Retry budget must be at least 1")]
    NoAttempts,

    #[error("A river needs at least one bridge")]
    NoBridges,

    #[error("Pillar stride must be at least 2, got {0}")]
    BadPillarStride(usize),

    #[error("Corridor cost '{field}' must be positive")]
    ZeroCost { field: &'static str },

    #[error("Could not parse configuration: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

/// Special level template errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template is empty")]
    Empty,

    #[error("Template is {width}x{height} but the map is only {map_width}x{map_height}")]
    TooLarge {
        width: usize,
        height: usize,
        map_width: usize,
        map_height: usize,
    },

    #[error("Template has no room cells (letters A-Z)")]
    NoRooms,

    #[error("Unknown template glyph '{glyph}' at ({x}, {y})")]
    UnknownGlyph { glyph: char, x: usize, y: usize },

    #[error("Template marker '{0}' appears more than once")]
    DuplicateMarker(char),
}

/// Why a generation attempt was abandoned
///
/// Recorded in the attempt's validity flag and logged; the orchestrator
/// retries instead of surfacing it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    #[error("no room could be placed")]
    NoRooms,

    #[error("room {room} shrank to {area} cells (minimum {min})")]
    RoomTooSmall { room: usize, area: usize, min: usize },

    #[error("room {room} is unreachable from the first room")]
    RoomUnreached { room: usize },

    #[error("passable cell ({x}, {y}) is cut off from the rooms")]
    StrayFloor { x: i32, y: i32 },

    #[error("room {room} has no door proposal next to it")]
    NoDoorProposal { room: usize },

    #[error("rejected by hook: {0}")]
    Rejected(String),
}
