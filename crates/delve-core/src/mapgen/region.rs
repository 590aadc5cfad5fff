//! Macro partition of the map into a 3x3 layout of regions
//!
//! Every region is a candidate container for one main room. Regions can be
//! blocked (no main room, maybe an auxiliary one), merged pairwise into one
//! large room, or reserved for a river.

use serde::{Deserialize, Serialize};

use crate::config::{RegionConfig, RoomBounds};
use crate::consts::{MIN_FREE_REGIONS, REGIONS_PER_SIDE};
use crate::rng::GameRng;

use super::geom::Rect;
use super::river::RiverAxis;
use super::room::{RegionCoord, RoomId};

/// One cell of the macro partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub rect: Rect,
    pub main_room: Option<RoomId>,
    /// True until a room claims the region or it is blocked
    pub is_free: bool,
    pub is_blocked: bool,
    /// Given over to a river: no room of any kind
    pub is_reserved: bool,
}

impl Region {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            main_room: None,
            is_free: true,
            is_blocked: false,
            is_reserved: false,
        }
    }

    /// Random room rectangle inside the region, one cell away from its edge
    pub fn rnd_room_rect(&self, bounds: &RoomBounds, rng: &mut GameRng) -> Option<Rect> {
        rnd_rect_in(self.rect.shrink(1), bounds, rng)
    }

    /// No main room here. Reserved regions stay untouched.
    pub fn block(&mut self) {
        if self.is_reserved {
            return;
        }
        self.is_free = false;
        self.is_blocked = true;
    }
}

/// Random rectangle fully inside `area` whose size respects `bounds`.
/// `None` when `area` cannot hold even the minimum size.
pub fn rnd_rect_in(area: Rect, bounds: &RoomBounds, rng: &mut GameRng) -> Option<Rect> {
    let max_w = (bounds.max_w as i32).min(area.width());
    let max_h = (bounds.max_h as i32).min(area.height());
    let (min_w, min_h) = (bounds.min_w as i32, bounds.min_h as i32);
    if max_w < min_w || max_h < min_h {
        return None;
    }

    let w = rng.range(min_w, max_w);
    let h = rng.range(min_h, max_h);
    let x0 = rng.range(area.x0, area.x1 - w + 1);
    let y0 = rng.range(area.y0, area.y1 - h + 1);
    Some(Rect::from_size(x0, y0, w, h))
}

/// The 3x3 region layout, indexed `[column][row]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionGrid {
    regions: [[Region; REGIONS_PER_SIDE]; REGIONS_PER_SIDE],
}

/// Split `len` cells into three spans; the edges absorb the remainder
fn split_lengths(len: usize) -> [usize; REGIONS_PER_SIDE] {
    let base = len / REGIONS_PER_SIDE;
    let rem = len % REGIONS_PER_SIDE;
    [base + rem.div_ceil(2), base, base + rem / 2]
}

impl RegionGrid {
    /// Partition the playable area (everything but the map border)
    pub fn partition(width: usize, height: usize) -> Self {
        let cols = split_lengths(width.saturating_sub(2));
        let rows = split_lengths(height.saturating_sub(2));

        let mut regions = [[Region::new(Rect::new(0, 0, 0, 0)); REGIONS_PER_SIDE]; REGIONS_PER_SIDE];
        let mut x0 = 1;
        for (cx, &w) in cols.iter().enumerate() {
            let mut y0 = 1;
            for (cy, &h) in rows.iter().enumerate() {
                regions[cx][cy] = Region::new(Rect::from_size(x0, y0, w as i32, h as i32));
                y0 += h as i32;
            }
            x0 += w as i32;
        }
        Self { regions }
    }

    pub fn get(&self, (x, y): RegionCoord) -> &Region {
        &self.regions[x][y]
    }

    pub fn get_mut(&mut self, (x, y): RegionCoord) -> &mut Region {
        &mut self.regions[x][y]
    }

    /// All coordinates, row by row
    pub fn coords() -> impl Iterator<Item = RegionCoord> {
        (0..REGIONS_PER_SIDE).flat_map(|y| (0..REGIONS_PER_SIDE).map(move |x| (x, y)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionCoord, &Region)> {
        Self::coords().map(|c| (c, self.get(c)))
    }

    pub fn free_coords(&self) -> Vec<RegionCoord> {
        self.iter().filter(|(_, r)| r.is_free).map(|(c, _)| c).collect()
    }

    pub fn blocked_coords(&self) -> Vec<RegionCoord> {
        self.iter().filter(|(_, r)| r.is_blocked).map(|(c, _)| c).collect()
    }

    pub fn reserved_coords(&self) -> Vec<RegionCoord> {
        self.iter().filter(|(_, r)| r.is_reserved).map(|(c, _)| c).collect()
    }

    /// Reserve the centre column (vertical river) or centre row (horizontal
    /// river). Must run before blocking and room placement.
    pub fn reserve_river(&mut self, axis: RiverAxis) {
        let mid = REGIONS_PER_SIDE / 2;
        for i in 0..REGIONS_PER_SIDE {
            let coord = match axis {
                RiverAxis::Vertical => (mid, i),
                RiverAxis::Horizontal => (i, mid),
            };
            let region = self.get_mut(coord);
            region.is_free = false;
            region.is_reserved = true;
        }
    }

    /// Block the forced regions, then a random number of further free ones,
    /// always leaving at least `MIN_FREE_REGIONS` free
    pub fn randomly_block_regions(&mut self, config: &RegionConfig, rng: &mut GameRng) {
        for &coord in &config.forced_blocked {
            self.get_mut(coord).block();
        }

        let extra = rng.rn2(config.max_random_blocked as u32 + 1);
        for _ in 0..extra {
            let free = self.free_coords();
            if free.len() <= MIN_FREE_REGIONS {
                break;
            }
            if let Some(&coord) = rng.choose(&free) {
                self.get_mut(coord).block();
            }
        }
    }

    /// Maybe pick two orthogonally adjacent free regions to share one room
    pub fn pick_merge_pair(
        &self,
        merge_pct: u32,
        rng: &mut GameRng,
    ) -> Option<(RegionCoord, RegionCoord)> {
        if !rng.percent(merge_pct) {
            return None;
        }

        let mut pairs = Vec::new();
        for (x, y) in Self::coords() {
            if !self.get((x, y)).is_free {
                continue;
            }
            if x + 1 < REGIONS_PER_SIDE && self.get((x + 1, y)).is_free {
                pairs.push(((x, y), (x + 1, y)));
            }
            if y + 1 < REGIONS_PER_SIDE && self.get((x, y + 1)).is_free {
                pairs.push(((x, y), (x, y + 1)));
            }
        }
        rng.choose(&pairs).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{MAP_H, MAP_W};
    use crate::mapgen::geom::Pos;

    #[test]
    fn test_split_lengths_absorb_remainder_at_edges() {
        assert_eq!(split_lengths(78), [26, 26, 26]);
        assert_eq!(split_lengths(20), [7, 6, 7]);
        assert_eq!(split_lengths(19), [7, 6, 6]);
    }

    #[test]
    fn test_partition_tiles_playable_area() {
        let grid = RegionGrid::partition(MAP_W, MAP_H);
        let playable = Rect::new(1, 1, MAP_W as i32 - 2, MAP_H as i32 - 2);

        let total: i32 = grid.iter().map(|(_, r)| r.rect.area()).sum();
        assert_eq!(total, playable.area());

        for p in playable.positions() {
            let owners = grid.iter().filter(|(_, r)| r.rect.contains(p)).count();
            assert_eq!(owners, 1, "{p:?} should be in exactly one region");
        }
        assert!(grid.iter().all(|(_, r)| r.is_free && r.main_room.is_none()));
        assert_eq!(grid.get((0, 0)).rect.x0, 1);
        assert!(grid.get((2, 2)).rect.contains(Pos::new(MAP_W as i32 - 2, MAP_H as i32 - 2)));
    }

    #[test]
    fn test_forced_blocking() {
        let mut grid = RegionGrid::partition(MAP_W, MAP_H);
        let mut rng = GameRng::new(1);
        let config = RegionConfig {
            forced_blocked: vec![(1, 1), (2, 0)],
            max_random_blocked: 0,
            merge_pct: 0,
            ..RegionConfig::default()
        };
        grid.randomly_block_regions(&config, &mut rng);
        assert_eq!(grid.blocked_coords(), vec![(2, 0), (1, 1)]);
        assert_eq!(grid.free_coords().len(), 7);
    }

    #[test]
    fn test_reserved_river_regions() {
        let mut grid = RegionGrid::partition(MAP_W, MAP_H);
        grid.reserve_river(RiverAxis::Vertical);
        assert_eq!(grid.reserved_coords(), vec![(1, 0), (1, 1), (1, 2)]);
        assert_eq!(grid.free_coords().len(), 6);

        // Forced blocking cannot turn the river into an aux room slot
        let config = RegionConfig {
            forced_blocked: vec![(1, 1), (0, 2)],
            max_random_blocked: 0,
            ..RegionConfig::default()
        };
        grid.randomly_block_regions(&config, &mut GameRng::new(1));
        assert_eq!(grid.blocked_coords(), vec![(0, 2)]);
        assert!(grid.get((1, 1)).is_reserved && !grid.get((1, 1)).is_blocked);

        let mut grid = RegionGrid::partition(MAP_W, MAP_H);
        grid.reserve_river(RiverAxis::Horizontal);
        assert_eq!(grid.reserved_coords(), vec![(0, 1), (1, 1), (2, 1)]);
        assert!(grid.pick_merge_pair(100, &mut GameRng::new(2)).is_some_and(
            |((_, ay), (_, by))| ay != 1 && by != 1
        ));
    }

    #[test]
    fn test_random_blocking_leaves_free_regions() {
        for seed in 0..50 {
            let mut grid = RegionGrid::partition(MAP_W, MAP_H);
            let mut rng = GameRng::new(seed);
            let config = RegionConfig {
                forced_blocked: Vec::new(),
                max_random_blocked: 9,
                merge_pct: 0,
                ..RegionConfig::default()
            };
            grid.randomly_block_regions(&config, &mut rng);
            assert!(grid.free_coords().len() >= MIN_FREE_REGIONS);
        }
    }

    #[test]
    fn test_rnd_room_rect_respects_bounds() {
        let region = Region::new(Rect::new(1, 1, 26, 7));
        let bounds = RoomBounds::new(4, 3, 14, 7);
        let mut rng = GameRng::new(9);
        for _ in 0..200 {
            let r = region.rnd_room_rect(&bounds, &mut rng).expect("region is large enough");
            assert!(region.rect.shrink(1).contains_rect(&r));
            assert!((4..=14).contains(&r.width()));
            assert!((3..=5).contains(&r.height()));
        }
    }

    #[test]
    fn test_rnd_room_rect_too_small() {
        let region = Region::new(Rect::new(1, 1, 4, 4));
        let bounds = RoomBounds::new(4, 3, 14, 7);
        let mut rng = GameRng::new(9);
        assert!(region.rnd_room_rect(&bounds, &mut rng).is_none());
    }

    #[test]
    fn test_merge_pair_is_adjacent_and_free() {
        let grid = RegionGrid::partition(MAP_W, MAP_H);
        let mut rng = GameRng::new(5);
        let ((ax, ay), (bx, by)) = grid.pick_merge_pair(100, &mut rng).expect("all regions free");
        assert_eq!(ax.abs_diff(bx) + ay.abs_diff(by), 1);
        assert!(grid.pick_merge_pair(0, &mut rng).is_none());
    }
}
