//! Rooms
//!
//! A room is a bounding rectangle plus an explicit member set. Reshaping
//! edits the member set, so after cavify the members may leave the original
//! rectangle; the rectangle is kept for spatial queries.

use serde::{Deserialize, Serialize};

use crate::rng::GameRng;

use super::cell::CellType;
use super::geom::{Pos, Rect};
use super::grid::Map;

/// Index of a room in the room arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub usize);

/// How a room came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomKind {
    /// The room of a region (or of two merged regions)
    Main,
    /// Extra small room placed inside a blocked region
    Aux,
    /// Walled-off room nested inside another room
    Sub,
    /// Room stamped from a special level template
    Template,
}

/// Region coordinates `(column, row)` in the 3x3 layout
pub type RegionCoord = (usize, usize);

/// A room on the map
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub kind: RoomKind,
    /// Bounds at placement time
    pub rect: Rect,
    /// Member cells, sorted row-major
    pub cells: Vec<Pos>,
    /// Enclosing room (sub-rooms only)
    pub parent: Option<RoomId>,
    /// Sub-rooms carved out of this room
    pub children: Vec<RoomId>,
    /// Regions this room belongs to (main rooms only; two when merged)
    pub regions: Vec<RegionCoord>,
    pub is_dark: bool,
}

impl Room {
    /// Create a rectangular room covering all of `rect`
    pub fn new(id: RoomId, kind: RoomKind, rect: Rect) -> Self {
        Self {
            id,
            kind,
            rect,
            cells: rect.positions().collect(),
            parent: None,
            children: Vec::new(),
            regions: Vec::new(),
            is_dark: false,
        }
    }

    /// Create a room from an arbitrary cell set
    pub fn from_cells(id: RoomId, kind: RoomKind, mut cells: Vec<Pos>) -> Self {
        cells.sort_unstable();
        cells.dedup();
        let rect = bounding_rect(&cells);
        Self {
            id,
            kind,
            rect,
            cells,
            parent: None,
            children: Vec::new(),
            regions: Vec::new(),
            is_dark: false,
        }
    }

    pub fn area(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, p: Pos) -> bool {
        self.cells.binary_search(&p).is_ok()
    }

    /// Check if this is a subroom
    pub fn is_subroom(&self) -> bool {
        self.parent.is_some()
    }

    /// Check if this room has subrooms
    pub fn has_subrooms(&self) -> bool {
        !self.children.is_empty()
    }

    /// Only plain main/aux rooms are reshaped; nested rooms keep their walls
    pub fn is_reshapeable(&self) -> bool {
        matches!(self.kind, RoomKind::Main | RoomKind::Aux) && !self.has_subrooms()
    }

    /// Get center point of the original bounds
    pub fn center(&self) -> Pos {
        self.rect.center()
    }

    /// Member cells with at least one orthogonal non-member neighbour
    pub fn boundary_cells(&self) -> Vec<Pos> {
        self.cells
            .iter()
            .copied()
            .filter(|p| p.neighbors4().any(|n| !self.contains(n)))
            .collect()
    }

    /// Random member cell
    pub fn random_cell(&self, rng: &mut GameRng) -> Option<Pos> {
        rng.choose(&self.cells).copied()
    }

    /// Make `p` a floor member of this room
    pub fn claim(&mut self, map: &mut Map, p: Pos) {
        if let Err(i) = self.cells.binary_search(&p) {
            self.cells.insert(i, p);
        }
        map.set_type(p, CellType::Floor);
        map.room_map.set(p, Some(self.id));
    }

    /// Drop `p` from this room, leaving `typ` behind on the map
    pub fn release(&mut self, map: &mut Map, p: Pos, typ: CellType) {
        if let Ok(i) = self.cells.binary_search(&p) {
            self.cells.remove(i);
        }
        map.set_type(p, typ);
        if map.room_at(p) == Some(self.id) {
            map.room_map.set(p, None);
        }
    }
}

/// Smallest rectangle covering every position (an empty set gives an
/// invalid rectangle)
pub fn bounding_rect(cells: &[Pos]) -> Rect {
    cells.iter().fold(
        Rect::new(i32::MAX, i32::MAX, i32::MIN, i32::MIN),
        |r, p| Rect::new(r.x0.min(p.x), r.y0.min(p.y), r.x1.max(p.x), r.y1.max(p.y)),
    )
}

/// Stamp a room's members onto the map as floor owned by the room
pub fn register_room(map: &mut Map, room: &Room) {
    for &p in &room.cells {
        map.set_type(p, CellType::Floor);
        map.room_map.set(p, Some(room.id));
    }
}
