//! Flood fill and connectivity validation

use std::collections::VecDeque;

use crate::error::InvalidReason;

use super::geom::Pos;
use super::grid::{Grid, Map};
use super::room::Room;

/// Breadth-first fill over passable cells with 4-connectivity.
///
/// `blocked` is treated as solid, which is how cut cells are tested.
pub fn flood_fill(map: &Map, starts: &[Pos], blocked: Option<Pos>) -> Grid<bool> {
    let mut reached = Grid::new(map.width(), map.height(), false);
    let mut queue = VecDeque::new();

    for &p in starts {
        if map.is_passable(p) && Some(p) != blocked && !reached.at(p) {
            reached.set(p, true);
            queue.push_back(p);
        }
    }

    while let Some(p) = queue.pop_front() {
        for n in p.neighbors4() {
            if Some(n) == blocked || reached.at(n) || !map.is_passable(n) {
                continue;
            }
            reached.set(n, true);
            queue.push_back(n);
        }
    }
    reached
}

/// Breadth-first step distances from `start` over passable cells
pub fn distance_map(map: &Map, start: Pos) -> Grid<Option<u32>> {
    let mut dist = Grid::new(map.width(), map.height(), None);
    if !map.is_passable(start) {
        return dist;
    }
    dist.set(start, Some(0));
    let mut queue = VecDeque::from([start]);
    while let Some(p) = queue.pop_front() {
        let d = dist.at(p).unwrap_or(0);
        for n in p.neighbors4() {
            if map.is_passable(n) && dist.at(n).is_none() {
                dist.set(n, Some(d + 1));
                queue.push_back(n);
            }
        }
    }
    dist
}

/// Number of reached cells
pub fn count_reached(reached: &Grid<bool>) -> usize {
    reached.iter().filter(|&(_, &r)| r).count()
}

/// Is a sorted cell set 4-connected on its own
pub fn is_cell_set_connected(cells: &[Pos]) -> bool {
    let Some(&first) = cells.first() else {
        return true;
    };

    let mut seen = vec![false; cells.len()];
    seen[0] = true;
    let mut stack = vec![first];
    let mut count = 1;

    while let Some(p) = stack.pop() {
        for n in p.neighbors4() {
            if let Ok(i) = cells.binary_search(&n) {
                if !seen[i] {
                    seen[i] = true;
                    count += 1;
                    stack.push(n);
                }
            }
        }
    }
    count == cells.len()
}

/// Every room has a cell reachable from the first room
pub fn is_all_rooms_connected(map: &Map, rooms: &[Room]) -> bool {
    let Some(first) = rooms.first().and_then(|r| r.cells.first()) else {
        return rooms.is_empty();
    };
    let reached = flood_fill(map, &[*first], None);
    rooms
        .iter()
        .all(|room| room.cells.iter().any(|&p| reached.at(p)))
}

/// Full reachability check of a finished map.
///
/// All rooms must be reached from the first room's first cell, no passable
/// cell may be cut off, and with several rooms each room needs a door
/// proposal next to one of its members.
pub fn validate_connectivity(
    map: &Map,
    rooms: &[Room],
    door_proposals: &Grid<bool>,
) -> Result<(), InvalidReason> {
    let Some(&start) = rooms.first().and_then(|r| r.cells.first()) else {
        return Err(InvalidReason::NoRooms);
    };
    let reached = flood_fill(map, &[start], None);

    for room in rooms {
        if !room.cells.iter().any(|&p| reached.at(p)) {
            return Err(InvalidReason::RoomUnreached { room: room.id.0 });
        }
    }

    if let Some(p) = map.passable_positions().into_iter().find(|&p| !reached.at(p)) {
        return Err(InvalidReason::StrayFloor { x: p.x, y: p.y });
    }

    if rooms.len() > 1 {
        for room in rooms {
            let has_door = room
                .cells
                .iter()
                .any(|p| p.neighbors4().any(|n| door_proposals.at(n)));
            if !has_door {
                return Err(InvalidReason::NoDoorProposal { room: room.id.0 });
            }
        }
    }
    Ok(())
}
