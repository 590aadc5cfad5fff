//! Generator constants
//!
//! Default level dimensions and the fixed macro layout.

/// Default map dimensions
pub const MAP_W: usize = 80;
pub const MAP_H: usize = 22;

/// Regions per side of the macro partition (3x3)
pub const REGIONS_PER_SIDE: usize = 3;

/// Fewest regions left free by random blocking
pub const MIN_FREE_REGIONS: usize = 2;

/// Default retry budget
pub const DEFAULT_MAX_ATTEMPTS: u32 = 200;

/// Placement tries per auxiliary room / sub-room roll
pub const PLACEMENT_TRIES: u32 = 12;

/// Upper bound on repair joins when closing connectivity gaps
pub const MAX_JOIN_ITERATIONS: usize = 100;
