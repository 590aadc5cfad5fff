//! Choke point analysis
//!
//! A choke point is a single passable cell whose removal splits the walkable
//! area into exactly two parts. Candidates come from a cheap look at the
//! cell's 8-ring and are confirmed with flood fills.

use serde::{Deserialize, Serialize};

use super::flood::flood_fill;
use super::geom::Pos;
use super::grid::{Grid, Map};

/// A confirmed single-cell cut
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChokePointData {
    pub pos: Pos,
    /// The two parts, each sorted row-major. `sides[0]` holds the row-major
    /// first cell of the two.
    pub sides: [Vec<Pos>; 2],
    /// Side holding the player start, if any
    pub player_side: Option<usize>,
    /// Side holding the stairs, if any
    pub stairs_side: Option<usize>,
}

impl ChokePointData {
    /// Which side `p` lies on
    pub fn side_of(&self, p: Pos) -> Option<usize> {
        self.sides.iter().position(|side| side.binary_search(&p).is_ok())
    }
}

/// Runs of consecutive open cells around `p` that touch it orthogonally.
/// Returns one orthogonal representative per run.
fn ring_groups(map: &Map, p: Pos) -> Vec<Pos> {
    let ring: Vec<Pos> = p.neighbors8().collect();
    let open: Vec<bool> = ring.iter().map(|&c| map.is_passable(c)).collect();
    let Some(closed) = open.iter().position(|&o| !o) else {
        // Fully open ring is a single group
        return Vec::new();
    };

    let mut reps = Vec::new();
    let mut current: Option<Pos> = None;
    let mut in_run = false;
    for k in 1..=ring.len() {
        let i = (closed + k) % ring.len();
        if open[i] {
            in_run = true;
            if current.is_none() && ring[i].is_orthogonal_to(p) {
                current = Some(ring[i]);
            }
        } else {
            if in_run {
                reps.extend(current.take());
            }
            in_run = false;
        }
    }
    reps
}

fn collect(reached: &Grid<bool>) -> Vec<Pos> {
    reached.iter().filter(|&(_, &r)| r).map(|(p, _)| p).collect()
}

/// Confirm `p` as a cut: the first group's side and one unreached group's
/// side must together with `p` cover every passable cell
fn confirm(map: &Map, p: Pos, reps: &[Pos], total: usize) -> Option<[Vec<Pos>; 2]> {
    let first = flood_fill(map, &reps[..1], Some(p));
    let other = reps.iter().copied().find(|&r| !first.at(r))?;
    let second = flood_fill(map, &[other], Some(p));

    let mut sides = [collect(&first), collect(&second)];
    if sides[0].len() + sides[1].len() + 1 != total {
        return None;
    }
    if sides[1].first() < sides[0].first() {
        sides.swap(0, 1);
    }
    Some(sides)
}

/// Every single-cell cut of the map, in row-major order of position
pub fn find_choke_points(map: &Map, player: Option<Pos>, stairs: Option<Pos>) -> Vec<ChokePointData> {
    let passable = map.passable_positions();
    let total = passable.len();

    let mut found = Vec::new();
    for p in passable {
        let reps = ring_groups(map, p);
        if reps.len() < 2 {
            continue;
        }
        let Some(sides) = confirm(map, p, &reps, total) else {
            continue;
        };
        let mut choke = ChokePointData {
            pos: p,
            sides,
            player_side: None,
            stairs_side: None,
        };
        choke.player_side = player.and_then(|s| choke.side_of(s));
        choke.stairs_side = stairs.and_then(|s| choke.side_of(s));
        found.push(choke);
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::cell::CellType;
    use crate::mapgen::flood::count_reached;
    use crate::mapgen::geom::Rect;

    /// 3x4 block, a one-cell bridge, then an 8x5 block
    fn dumbbell() -> Map {
        let mut map = Map::new(14, 7);
        for p in Rect::new(1, 1, 3, 4).positions().chain(Rect::new(5, 1, 12, 5).positions()) {
            map.set_type(p, CellType::Floor);
        }
        map.set_type(Pos::new(4, 2), CellType::Floor);
        map
    }

    #[test]
    fn test_ring_groups() {
        let map = dumbbell();
        assert_eq!(ring_groups(&map, Pos::new(4, 2)).len(), 2);
        // Interior of a block has a fully open ring
        assert!(ring_groups(&map, Pos::new(8, 3)).is_empty());
        // A corner cell has one group
        assert_eq!(ring_groups(&map, Pos::new(1, 1)).len(), 1);
    }

    #[test]
    fn test_bridge_sides() {
        let map = dumbbell();
        let chokes = find_choke_points(&map, Some(Pos::new(1, 1)), Some(Pos::new(12, 5)));

        let positions: Vec<Pos> = chokes.iter().map(|c| c.pos).collect();
        assert_eq!(positions, vec![Pos::new(3, 2), Pos::new(4, 2), Pos::new(5, 2)]);

        let bridge = &chokes[1];
        assert_eq!(bridge.sides[0].len(), 12);
        assert_eq!(bridge.sides[1].len(), 40);
        assert_eq!(bridge.player_side, Some(0));
        assert_eq!(bridge.stairs_side, Some(1));

        // Cutting the bridge really leaves exactly these sizes
        let left = flood_fill(&map, &bridge.sides[0][..1], Some(bridge.pos));
        let right = flood_fill(&map, &bridge.sides[1][..1], Some(bridge.pos));
        assert_eq!(count_reached(&left), 12);
        assert_eq!(count_reached(&right), 40);
        assert!(bridge.sides[1].iter().all(|&p| !left.at(p)));
    }

    #[test]
    fn test_sides_exclude_the_cut() {
        let map = dumbbell();
        for choke in find_choke_points(&map, None, None) {
            assert_eq!(choke.side_of(choke.pos), None);
            assert!(choke.sides.iter().all(|s| s.is_sorted()));
            assert_eq!(choke.player_side, None);
        }
    }

    #[test]
    fn test_loop_has_no_choke_points() {
        let mut map = Map::new(12, 8);
        for p in Rect::new(2, 2, 9, 5).positions() {
            if !Rect::new(3, 3, 8, 4).contains(p) {
                map.set_type(p, CellType::Floor);
            }
        }
        assert!(find_choke_points(&map, None, None).is_empty());
    }

    #[test]
    fn test_corridor_cells_are_choke_points() {
        let mut map = Map::new(20, 5);
        for x in 2..=10 {
            map.set_type(Pos::new(x, 2), CellType::Floor);
        }
        let chokes = find_choke_points(&map, Some(Pos::new(2, 2)), None);
        // Every cell but the two ends
        assert_eq!(chokes.len(), 7);
        assert!(chokes.iter().all(|c| c.player_side == Some(0)));
    }
}
