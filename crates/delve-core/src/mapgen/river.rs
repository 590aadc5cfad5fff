//! Rivers through the reserved centre regions
//!
//! A river is a band of water running the full length of the playable area
//! inside the reserved column or row of regions. Water is never carved, so
//! corridors can only get across over the bridges: one-cell strips across
//! the band that stay carvable. Bridges no corridor used are flooded once
//! the corridors are in.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::rng::GameRng;

use super::cell::CellType;
use super::geom::{Pos, Rect};
use super::grid::Map;
use super::region::RegionGrid;

const MIN_WIDTH: i32 = 2;
const MAX_WIDTH: i32 = 4;
/// Rows (or columns) between two bridges
const BRIDGE_SPACING: i32 = 3;

/// Direction the river flows in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiverAxis {
    /// Top to bottom through the centre column
    Vertical,
    /// Left to right through the centre row
    Horizontal,
}

impl RiverAxis {
    pub fn random(rng: &mut GameRng) -> Self {
        if rng.one_in(2) {
            RiverAxis::Vertical
        } else {
            RiverAxis::Horizontal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct River {
    pub axis: RiverAxis,
    /// Every cell of the river, bridges included
    pub band: Rect,
    /// Crossings, each one cell thick and as wide as the band
    pub bridges: Vec<Rect>,
}

impl River {
    pub fn is_bridge(&self, p: Pos) -> bool {
        self.bridges.iter().any(|b| b.contains(p))
    }

    /// Turn bridge cells no corridor was carved through into water
    pub fn flood_unused_bridges(&self, map: &mut Map) {
        for p in self.bridges.iter().flat_map(Rect::positions) {
            if map.cell_type(p) == CellType::Wall {
                map.set_type(p, CellType::Water);
                map.no_carve.set(p, true);
            }
        }
    }
}

/// Carve a river through the reserved regions of `regions`.
///
/// Returns `None` (map untouched) when nothing is reserved or the reserved
/// strip is too thin for a band with a dry cell on each bank.
pub fn mk_river(
    map: &mut Map,
    regions: &RegionGrid,
    axis: RiverAxis,
    max_bridges: usize,
    rng: &mut GameRng,
) -> Option<River> {
    let strip = regions
        .reserved_coords()
        .into_iter()
        .map(|c| regions.get(c).rect)
        .reduce(|a, b| a.union(&b))?;

    // Across-axis span keeps one dry cell on each bank
    let (lo, hi) = match axis {
        RiverAxis::Vertical => (strip.x0 + 1, strip.x1 - 1),
        RiverAxis::Horizontal => (strip.y0 + 1, strip.y1 - 1),
    };
    if hi - lo + 1 < MIN_WIDTH {
        return None;
    }
    let width = rng.range(MIN_WIDTH, MAX_WIDTH.min(hi - lo + 1));
    let start = rng.range(lo, hi - width + 1);

    let band = match axis {
        RiverAxis::Vertical => Rect::new(start, strip.y0, start + width - 1, strip.y1),
        RiverAxis::Horizontal => Rect::new(strip.x0, start, strip.x1, start + width - 1),
    };

    let (first, last) = match axis {
        RiverAxis::Vertical => (band.y0 + 1, band.y1 - 1),
        RiverAxis::Horizontal => (band.x0 + 1, band.x1 - 1),
    };
    let mut spots: Vec<i32> = (first..=last).collect();
    rng.shuffle(&mut spots);
    let wanted = rng.range(1, max_bridges.max(1) as i32) as usize;

    let mut picked: Vec<i32> = Vec::with_capacity(wanted);
    for at in spots {
        if picked.len() == wanted {
            break;
        }
        if picked.iter().all(|&q| (q - at).abs() >= BRIDGE_SPACING) {
            picked.push(at);
        }
    }
    picked.sort_unstable();

    let bridges: Vec<Rect> = picked
        .into_iter()
        .map(|at| match axis {
            RiverAxis::Vertical => Rect::new(band.x0, at, band.x1, at),
            RiverAxis::Horizontal => Rect::new(at, band.y0, at, band.y1),
        })
        .collect();

    let river = River {
        axis,
        band,
        bridges,
    };
    for p in band.positions() {
        if !river.is_bridge(p) {
            map.set_type(p, CellType::Water);
            map.no_carve.set(p, true);
        }
    }
    trace!(?axis, ?band, bridges = river.bridges.len(), "river");
    Some(river)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorridorCosts;
    use crate::consts::{MAP_H, MAP_W};
    use crate::mapgen::corridor::mk_pathfind_cor;

    fn river_map(axis: RiverAxis, max_bridges: usize, seed: u64) -> (Map, RegionGrid, River) {
        let mut map = Map::new(MAP_W, MAP_H);
        let mut regions = RegionGrid::partition(MAP_W, MAP_H);
        regions.reserve_river(axis);
        let mut rng = GameRng::new(seed);
        let river = mk_river(&mut map, &regions, axis, max_bridges, &mut rng).expect("wide strip");
        (map, regions, river)
    }

    #[test]
    fn test_band_crosses_the_whole_map() {
        for seed in 0..20 {
            let (map, regions, river) = river_map(RiverAxis::Vertical, 3, seed);
            let column = regions.get((1, 0)).rect;
            assert!((MIN_WIDTH..=MAX_WIDTH).contains(&river.band.width()));
            assert!(river.band.x0 > column.x0 && river.band.x1 < column.x1);
            assert_eq!((river.band.y0, river.band.y1), (1, MAP_H as i32 - 2));

            for p in river.band.positions() {
                if river.is_bridge(p) {
                    assert!(map.is_carvable(p));
                    assert_eq!(map.cell_type(p), CellType::Wall);
                } else {
                    assert_eq!(map.cell_type(p), CellType::Water);
                    assert!(!map.is_carvable(p));
                }
            }
        }
    }

    #[test]
    fn test_bridges_are_spaced() {
        for seed in 0..20 {
            let (_, _, river) = river_map(RiverAxis::Horizontal, 4, seed);
            assert!((1..=4).contains(&river.bridges.len()));
            assert!(river.bridges.iter().all(|b| b.width() == 1 && b.height() == river.band.height()));
            assert!(river.bridges.windows(2).all(|w| w[1].x0 - w[0].x0 >= BRIDGE_SPACING));
        }
    }

    #[test]
    fn test_paths_cross_on_a_bridge() {
        let (map, _, river) = river_map(RiverAxis::Vertical, 1, 4);
        let route = mk_pathfind_cor(&map, Pos::new(5, 10), Pos::new(74, 10), &CorridorCosts::default())
            .expect("bridge is open");
        let in_band: Vec<Pos> = route.iter().copied().filter(|&p| river.band.contains(p)).collect();
        assert_eq!(in_band.len() as i32, river.band.width());
        assert!(in_band.iter().all(|&p| river.is_bridge(p)));
    }

    #[test]
    fn test_unused_bridges_flood() {
        let (mut map, _, river) = river_map(RiverAxis::Vertical, 1, 9);
        river.flood_unused_bridges(&mut map);
        assert!(river.band.positions().all(|p| map.cell_type(p) == CellType::Water));
        assert!(mk_pathfind_cor(&map, Pos::new(5, 10), Pos::new(74, 10), &CorridorCosts::default()).is_none());
    }

    #[test]
    fn test_no_reserved_regions_no_river() {
        let mut map = Map::new(MAP_W, MAP_H);
        let regions = RegionGrid::partition(MAP_W, MAP_H);
        let before = map.clone();
        assert!(mk_river(&mut map, &regions, RiverAxis::Vertical, 2, &mut GameRng::new(1)).is_none());
        assert_eq!(map, before);
    }
}
