//! Positions and rectangles
//!
//! Rectangles are inclusive on both ends, like the free-space rectangles the
//! room placer carves out of regions.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A grid position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

/// The four orthogonal steps, in N, E, S, W order
pub const DIRS4: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// The eight surrounding cells in clockwise ring order starting north-west
pub const RING8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
];

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Orthogonal neighbours in N, E, S, W order
    pub fn neighbors4(self) -> impl Iterator<Item = Pos> {
        DIRS4.into_iter().map(move |(dx, dy)| self.offset(dx, dy))
    }

    /// All eight neighbours in ring order
    pub fn neighbors8(self) -> impl Iterator<Item = Pos> {
        RING8.into_iter().map(move |(dx, dy)| self.offset(dx, dy))
    }

    pub fn manhattan(self, other: Pos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn is_orthogonal_to(self, other: Pos) -> bool {
        self.manhattan(other) == 1
    }
}

/// Row-major order, so sorted position lists read top to bottom
impl Ord for Pos {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Pos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An inclusive axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Rect {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle with the given top-left corner and size
    pub const fn from_size(x0: i32, y0: i32, w: i32, h: i32) -> Self {
        Self::new(x0, y0, x0 + w - 1, y0 + h - 1)
    }

    pub fn width(&self) -> i32 {
        (self.x1 - self.x0 + 1).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.y1 - self.y0 + 1).max(0)
    }

    pub fn area(&self) -> i32 {
        self.width() * self.height()
    }

    pub fn contains(&self, p: Pos) -> bool {
        p.x >= self.x0 && p.x <= self.x1 && p.y >= self.y0 && p.y <= self.y1
    }

    /// Check if this rectangle contains another
    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.x0 <= other.x0 && self.x1 >= other.x1 && self.y0 <= other.y0 && self.y1 >= other.y1
    }

    /// Check if this rectangle intersects another
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.x1 < other.x0 || self.x0 > other.x1 || self.y1 < other.y0 || self.y0 > other.y1)
    }

    /// Grow (or with a negative amount, shrink) on every side
    pub fn expand(&self, by: i32) -> Rect {
        Rect::new(self.x0 - by, self.y0 - by, self.x1 + by, self.y1 + by)
    }

    pub fn shrink(&self, by: i32) -> Rect {
        self.expand(-by)
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    pub fn center(&self) -> Pos {
        Pos::new((self.x0 + self.x1) / 2, (self.y0 + self.y1) / 2)
    }

    /// Every position inside, row-major
    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let Rect { x0, y0, x1, y1 } = *self;
        (y0..=y1).flat_map(move |y| (x0..=x1).map(move |x| Pos::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_dimensions() {
        let r = Rect::from_size(2, 3, 5, 4);
        assert_eq!(r, Rect::new(2, 3, 6, 6));
        assert_eq!(r.width(), 5);
        assert_eq!(r.height(), 4);
        assert_eq!(r.area(), 20);
        assert_eq!(r.positions().count(), 20);
        assert_eq!(Rect::new(3, 0, 2, 5).area(), 0);
    }

    #[test]
    fn test_rect_relations() {
        let outer = Rect::new(0, 0, 10, 10);
        let inner = Rect::new(2, 2, 4, 4);
        let apart = Rect::new(12, 0, 14, 3);

        assert!(outer.contains_rect(&inner));
        assert!(!inner.contains_rect(&outer));
        assert!(outer.intersects(&inner));
        assert!(!outer.intersects(&apart));
        assert_eq!(inner.expand(2), Rect::new(0, 0, 6, 6));
        assert_eq!(inner.shrink(1), Rect::new(3, 3, 3, 3));
        assert_eq!(inner.union(&apart), Rect::new(2, 0, 14, 4));
    }

    #[test]
    fn test_pos_order_is_row_major() {
        let mut v = vec![Pos::new(3, 1), Pos::new(0, 2), Pos::new(1, 1)];
        v.sort();
        assert_eq!(v, vec![Pos::new(1, 1), Pos::new(3, 1), Pos::new(0, 2)]);
    }

    #[test]
    fn test_neighbors() {
        let p = Pos::new(5, 5);
        assert_eq!(p.neighbors4().count(), 4);
        assert!(p.neighbors4().all(|n| n.is_orthogonal_to(p)));
        assert_eq!(p.neighbors8().count(), 8);
        assert_eq!(p.neighbors8().next(), Some(Pos::new(4, 4)));
    }
}
