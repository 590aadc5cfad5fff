//! Map cell types

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Cell/terrain type
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[repr(u8)]
pub enum CellType {
    #[default]
    Wall = 0,
    Floor = 1,
    Door = 2,
    Stairs = 3,
    /// River; never walked or carved
    Water = 4,
}

impl CellType {
    /// Check if this is passable (can walk through)
    pub const fn is_passable(&self) -> bool {
        matches!(self, CellType::Floor | CellType::Door | CellType::Stairs)
    }

    /// Get the debug dump character for this cell type
    pub const fn symbol(&self) -> char {
        match self {
            CellType::Wall => '#',
            CellType::Floor => '.',
            CellType::Door => '+',
            CellType::Stairs => '>',
            CellType::Water => '~',
        }
    }
}

bitflags! {
    /// Per-cell state flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CellFlags: u8 {
        /// Has been explored by the player
        const EXPLORED = 0x01;
        /// Currently seen by the player
        const SEEN = 0x02;
        /// Part of an unlit room
        const DARK = 0x04;
    }
}

/// Reference to an item lying on a cell (owned by the population layer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Reference to an actor standing on a cell (owned by the population layer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

/// A single map cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Actual terrain type
    pub typ: CellType,

    pub flags: CellFlags,

    pub item: Option<ItemId>,

    pub actor: Option<ActorId>,
}

impl Cell {
    /// Create a solid wall cell
    pub const fn wall() -> Self {
        Self {
            typ: CellType::Wall,
            flags: CellFlags::empty(),
            item: None,
            actor: None,
        }
    }

    /// Create a floor cell
    pub const fn floor() -> Self {
        Self {
            typ: CellType::Floor,
            ..Self::wall()
        }
    }

    /// Back to solid, unexplored wall with no references
    pub fn reset(&mut self) {
        *self = Self::wall();
    }

    pub const fn is_passable(&self) -> bool {
        self.typ.is_passable()
    }

    pub fn is_explored(&self) -> bool {
        self.flags.contains(CellFlags::EXPLORED)
    }

    pub fn is_seen(&self) -> bool {
        self.flags.contains(CellFlags::SEEN)
    }
}
