//! Generator configuration
//!
//! Every tunable of the pipeline lives here: dimensions, room bounds, retry
//! budget, reshape probabilities and corridor costs. Configurations load from
//! JSON; any field left out keeps its default.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_MAX_ATTEMPTS, MAP_H, MAP_W, REGIONS_PER_SIDE};
use crate::error::ConfigError;

/// Width/height bounds for a class of rooms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomBounds {
    pub min_w: usize,
    pub min_h: usize,
    pub max_w: usize,
    pub max_h: usize,
}

impl RoomBounds {
    pub const fn new(min_w: usize, min_h: usize, max_w: usize, max_h: usize) -> Self {
        Self {
            min_w,
            min_h,
            max_w,
            max_h,
        }
    }

    /// Smallest cell count a room of this class may shrink to
    pub const fn min_area(&self) -> usize {
        self.min_w * self.min_h
    }

    fn validate(&self, what: &'static str) -> Result<(), ConfigError> {
        if self.min_w == 0 || self.min_w > self.max_w {
            return Err(ConfigError::BadRoomBounds {
                what,
                min: self.min_w,
                max: self.max_w,
            });
        }
        if self.min_h == 0 || self.min_h > self.max_h {
            return Err(ConfigError::BadRoomBounds {
                what,
                min: self.min_h,
                max: self.max_h,
            });
        }
        Ok(())
    }
}

/// Region partition settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Regions `(column, row)` that are always blocked
    pub forced_blocked: Vec<(usize, usize)>,
    /// Upper bound on additional randomly blocked regions
    pub max_random_blocked: usize,
    /// Chance that two adjacent free regions share one large room
    pub merge_pct: u32,
    /// Chance that the centre column or row is given over to a river
    pub river_pct: u32,
    /// Most crossings a river leaves for corridors
    pub max_bridges: usize,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            forced_blocked: Vec::new(),
            max_random_blocked: 2,
            merge_pct: 25,
            river_pct: 20,
            max_bridges: 2,
        }
    }
}

/// Room reshaping probabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReshapeConfig {
    pub cut_corners_pct: u32,
    pub pillars_pct: u32,
    /// Distance between pillars
    pub pillar_stride: usize,
    pub cavify_pct: u32,
    pub cavify_rounds: u32,
    pub cavify_grow_pct: u32,
    pub cavify_erode_pct: u32,
}

impl Default for ReshapeConfig {
    fn default() -> Self {
        Self {
            cut_corners_pct: 30,
            pillars_pct: 20,
            pillar_stride: 2,
            cavify_pct: 15,
            cavify_rounds: 3,
            cavify_grow_pct: 25,
            cavify_erode_pct: 10,
        }
    }
}

/// How corridors are routed between two entry cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorridorStyle {
    /// Cost-weighted shortest path
    #[default]
    Directed,
    /// Biased random walk, falling back to a directed path
    Walk,
    /// Coin flip between the two per connection
    Mixed,
}

/// Step costs for directed pathfinding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorridorCosts {
    /// Stepping onto existing non-room floor
    pub floor: u32,
    /// Cutting through solid wall
    pub wall: u32,
    /// Crossing any room's interior
    pub room: u32,
}

impl Default for CorridorCosts {
    fn default() -> Self {
        Self {
            floor: 1,
            wall: 5,
            room: 60,
        }
    }
}

/// Corridor settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorridorConfig {
    pub style: CorridorStyle,
    pub costs: CorridorCosts,
    /// Chance per room of an extra loop-forming corridor
    pub extra_pct: u32,
    /// Longest random walk before it is abandoned
    pub walk_max_len: usize,
    /// Chance that a walk step heads toward the target
    pub walk_bias_pct: u32,
    pub allow_diagonal: bool,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            style: CorridorStyle::Directed,
            costs: CorridorCosts::default(),
            extra_pct: 15,
            walk_max_len: 400,
            walk_bias_pct: 70,
            allow_diagonal: false,
        }
    }
}

/// Decoration settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationConfig {
    /// Chance that an eligible door proposal becomes a door
    pub door_pct: u32,
    pub dark_room_pct: u32,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            door_pct: 60,
            dark_room_pct: 15,
        }
    }
}

/// Complete generator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    pub width: usize,
    pub height: usize,
    /// Attempts before generation is reported as exhausted
    pub max_attempts: u32,
    pub room: RoomBounds,
    pub aux_room: RoomBounds,
    pub sub_room: RoomBounds,
    pub regions: RegionConfig,
    pub aux_room_pct: u32,
    pub sub_room_pct: u32,
    pub max_sub_room_depth: u32,
    pub reshape: ReshapeConfig,
    pub corridor: CorridorConfig,
    pub decoration: DecorationConfig,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            width: MAP_W,
            height: MAP_H,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            room: RoomBounds::new(4, 3, 14, 7),
            aux_room: RoomBounds::new(3, 2, 6, 4),
            sub_room: RoomBounds::new(2, 2, 6, 4),
            regions: RegionConfig::default(),
            aux_room_pct: 50,
            sub_room_pct: 25,
            max_sub_room_depth: 2,
            reshape: ReshapeConfig::default(),
            corridor: CorridorConfig::default(),
            decoration: DecorationConfig::default(),
        }
    }
}

impl GenConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GenConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can drive the pipeline at all
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Border plus three regions of at least three cells each
        let min_side = 2 + REGIONS_PER_SIDE * 3;
        if self.width < min_side || self.height < min_side {
            return Err(ConfigError::MapTooSmall {
                width: self.width,
                height: self.height,
                min_width: min_side,
                min_height: min_side,
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }

        self.room.validate("main rooms")?;
        self.aux_room.validate("auxiliary rooms")?;
        self.sub_room.validate("sub-rooms")?;

        for &(x, y) in &self.regions.forced_blocked {
            if x >= REGIONS_PER_SIDE || y >= REGIONS_PER_SIDE {
                return Err(ConfigError::RegionOutOfRange { x, y });
            }
        }

        let percents = [
            ("regions.merge_pct", self.regions.merge_pct),
            ("regions.river_pct", self.regions.river_pct),
            ("aux_room_pct", self.aux_room_pct),
            ("sub_room_pct", self.sub_room_pct),
            ("reshape.cut_corners_pct", self.reshape.cut_corners_pct),
            ("reshape.pillars_pct", self.reshape.pillars_pct),
            ("reshape.cavify_pct", self.reshape.cavify_pct),
            ("reshape.cavify_grow_pct", self.reshape.cavify_grow_pct),
            ("reshape.cavify_erode_pct", self.reshape.cavify_erode_pct),
            ("corridor.extra_pct", self.corridor.extra_pct),
            ("corridor.walk_bias_pct", self.corridor.walk_bias_pct),
            ("decoration.door_pct", self.decoration.door_pct),
            ("decoration.dark_room_pct", self.decoration.dark_room_pct),
        ];
        for (field, value) in percents {
            if value > 100 {
                return Err(ConfigError::BadPercent { field, value });
            }
        }

        if self.regions.max_bridges == 0 {
            return Err(ConfigError::NoBridges);
        }

        if self.reshape.pillar_stride < 2 {
            return Err(ConfigError::BadPillarStride(self.reshape.pillar_stride));
        }

        let costs = self.corridor.costs;
        for (field, value) in [
            ("floor", costs.floor),
            ("wall", costs.wall),
            ("room", costs.room),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroCost { field });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(GenConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GenConfig::from_json_str(r#"{ "max_attempts": 5, "corridor": { "style": "walk" } }"#)
            .expect("valid config");
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.corridor.style, CorridorStyle::Walk);
        assert_eq!(config.corridor.costs, CorridorCosts::default());
        assert_eq!(config.width, MAP_W);
    }

    #[test]
    fn test_rejects_tiny_map() {
        let config = GenConfig {
            width: 8,
            ..GenConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MapTooSmall { width: 8, .. })
        ));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let config = GenConfig {
            room: RoomBounds::new(9, 3, 4, 7),
            ..GenConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadRoomBounds { min: 9, max: 4, .. })
        ));
    }

    #[test]
    fn test_rejects_bad_percent_and_region() {
        let mut config = GenConfig::default();
        config.decoration.door_pct = 140;
        assert_eq!(
            config.validate(),
            Err(ConfigError::BadPercent {
                field: "decoration.door_pct",
                value: 140
            })
        );

        let mut config = GenConfig::default();
        config.regions.forced_blocked.push((3, 0));
        assert_eq!(
            config.validate(),
            Err(ConfigError::RegionOutOfRange { x: 3, y: 0 })
        );
    }

    #[test]
    fn test_rejects_bridgeless_river() {
        let config = GenConfig::from_json_str(r#"{ "regions": { "river_pct": 50, "max_bridges": 0 } }"#);
        assert_eq!(config, Err(ConfigError::NoBridges));

        let mut config = GenConfig::default();
        config.regions.river_pct = 101;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadPercent { field: "regions.river_pct", .. })
        ));
    }

    #[test]
    fn test_rejects_garbage_json() {
        assert!(matches!(
            GenConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
