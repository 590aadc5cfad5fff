//! Dense 2D grids and the level map
//!
//! `Grid<T>` backs every per-cell array the generator needs: terrain, room
//! ownership, door proposals and the no-carve mask.

use serde::{Deserialize, Serialize};

use super::cell::{Cell, CellType};
use super::geom::{Pos, Rect};
use super::room::RoomId;

/// A fixed-size row-major 2D array
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        Self {
            width,
            height,
            data: vec![fill; width * height],
        }
    }

    /// Overwrite every cell
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T> Grid<T> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(0, 0, self.width as i32, self.height as i32)
    }

    pub fn in_bounds(&self, p: Pos) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as usize) < self.width && (p.y as usize) < self.height
    }

    /// Inside the map and not on its outermost ring
    pub fn is_interior(&self, p: Pos) -> bool {
        p.x >= 1 && p.y >= 1 && (p.x as usize) + 1 < self.width && (p.y as usize) + 1 < self.height
    }

    /// Flat index of an in-bounds position
    pub fn index(&self, p: Pos) -> Option<usize> {
        self.in_bounds(p)
            .then(|| p.y as usize * self.width + p.x as usize)
    }

    pub fn pos_of(&self, index: usize) -> Pos {
        Pos::new((index % self.width) as i32, (index / self.width) as i32)
    }

    pub fn get(&self, p: Pos) -> Option<&T> {
        self.index(p).map(|i| &self.data[i])
    }

    pub fn get_mut(&mut self, p: Pos) -> Option<&mut T> {
        self.index(p).map(move |i| &mut self.data[i])
    }

    /// Write `value` at `p`; out-of-bounds writes are ignored
    pub fn set(&mut self, p: Pos, value: T) {
        if let Some(slot) = self.get_mut(p) {
            *slot = value;
        }
    }

    /// Every position, row-major
    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<T> {
        self.bounds().positions()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pos, &T)> {
        self.data.iter().enumerate().map(|(i, v)| (self.pos_of(i), v))
    }
}

impl<T: Copy + Default> Grid<T> {
    /// Value at `p`, or the default outside the grid
    pub fn at(&self, p: Pos) -> T {
        self.get(p).copied().unwrap_or_default()
    }
}

/// The level being generated: terrain plus per-cell bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Map {
    pub cells: Grid<Cell>,
    /// Owning room of each cell
    pub room_map: Grid<Option<RoomId>>,
    /// Cells corridors may never carve through
    pub no_carve: Grid<bool>,
}

impl Map {
    /// Solid wall everywhere; the border is protected from carving
    pub fn new(width: usize, height: usize) -> Self {
        let mut map = Self {
            cells: Grid::new(width, height, Cell::wall()),
            room_map: Grid::new(width, height, None),
            no_carve: Grid::new(width, height, false),
        };
        map.reset();
        map
    }

    /// Back to the state at the start of an attempt
    pub fn reset(&mut self) {
        for cell in self.cells.data.iter_mut() {
            cell.reset();
        }
        self.room_map.fill(None);
        self.no_carve.fill(false);
        for p in self.cells.positions() {
            if !self.cells.is_interior(p) {
                self.no_carve.set(p, true);
            }
        }
    }

    pub fn width(&self) -> usize {
        self.cells.width()
    }

    pub fn height(&self) -> usize {
        self.cells.height()
    }

    pub fn cell(&self, p: Pos) -> Option<&Cell> {
        self.cells.get(p)
    }

    pub fn cell_type(&self, p: Pos) -> CellType {
        self.cells.get(p).map(|c| c.typ).unwrap_or_default()
    }

    pub fn set_type(&mut self, p: Pos, typ: CellType) {
        if let Some(cell) = self.cells.get_mut(p) {
            cell.typ = typ;
        }
    }

    pub fn is_passable(&self, p: Pos) -> bool {
        self.cells.get(p).is_some_and(Cell::is_passable)
    }

    pub fn is_interior(&self, p: Pos) -> bool {
        self.cells.is_interior(p)
    }

    pub fn room_at(&self, p: Pos) -> Option<RoomId> {
        self.room_map.at(p)
    }

    pub fn is_carvable(&self, p: Pos) -> bool {
        self.cells.in_bounds(p) && !self.no_carve.at(p)
    }

    /// All passable positions, row-major
    pub fn passable_positions(&self) -> Vec<Pos> {
        self.cells
            .iter()
            .filter(|(_, c)| c.is_passable())
            .map(|(p, _)| p)
            .collect()
    }

    /// One character per cell, one line per row
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width() + 1) * self.height());
        for y in 0..self.height() {
            for x in 0..self.width() {
                out.push(self.cell_type(Pos::new(x as i32, y as i32)).symbol());
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_indexing() {
        let mut g = Grid::new(4, 3, 0u8);
        assert_eq!(g.len(), 12);
        g.set(Pos::new(3, 2), 7);
        assert_eq!(g.at(Pos::new(3, 2)), 7);
        assert_eq!(g.index(Pos::new(3, 2)), Some(11));
        assert_eq!(g.pos_of(11), Pos::new(3, 2));

        // Out of bounds reads default and writes are dropped
        g.set(Pos::new(4, 0), 9);
        assert_eq!(g.at(Pos::new(4, 0)), 0);
        assert_eq!(g.at(Pos::new(-1, 0)), 0);
        assert!(g.get(Pos::new(0, 3)).is_none());
    }

    #[test]
    fn test_interior() {
        let g = Grid::new(5, 5, false);
        assert!(g.is_interior(Pos::new(1, 1)));
        assert!(g.is_interior(Pos::new(3, 3)));
        assert!(!g.is_interior(Pos::new(0, 2)));
        assert!(!g.is_interior(Pos::new(4, 2)));
    }

    #[test]
    fn test_new_map_is_solid_with_protected_border() {
        let map = Map::new(10, 6);
        assert!(map.passable_positions().is_empty());
        assert!(!map.is_carvable(Pos::new(0, 0)));
        assert!(!map.is_carvable(Pos::new(9, 3)));
        assert!(map.is_carvable(Pos::new(4, 3)));
        assert!(!map.is_carvable(Pos::new(10, 3)));
    }

    #[test]
    fn test_reset_discards_everything() {
        let mut map = Map::new(8, 8);
        map.set_type(Pos::new(3, 3), CellType::Floor);
        map.room_map.set(Pos::new(3, 3), Some(RoomId(0)));
        map.no_carve.set(Pos::new(4, 4), true);

        map.reset();
        assert_eq!(map, Map::new(8, 8));
    }

    #[test]
    fn test_ascii_dump() {
        let mut map = Map::new(4, 3);
        map.set_type(Pos::new(1, 1), CellType::Floor);
        map.set_type(Pos::new(2, 1), CellType::Door);
        assert_eq!(map.to_ascii(), "####\n#.+#\n####\n");
    }
}
