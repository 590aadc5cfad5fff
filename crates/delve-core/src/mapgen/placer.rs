//! Room placement
//!
//! Main rooms go one per free region (or one per merged pair of regions),
//! auxiliary rooms into blocked regions, and sub-rooms are walled off inside
//! existing rooms.

use std::collections::VecDeque;

use tracing::trace;

use crate::config::{GenConfig, RoomBounds};
use crate::consts::PLACEMENT_TRIES;
use crate::rng::GameRng;

use super::cell::CellType;
use super::geom::{Pos, Rect};
use super::grid::{Grid, Map};
use super::region::{RegionGrid, rnd_rect_in};
use super::room::{Room, RoomId, RoomKind, register_room};

/// Append a rectangular room to the arena and stamp it on the map
pub fn add_room(map: &mut Map, rooms: &mut Vec<Room>, kind: RoomKind, rect: Rect) -> RoomId {
    let id = RoomId(rooms.len());
    let room = Room::new(id, kind, rect);
    register_room(map, &room);
    rooms.push(room);
    id
}

/// Place the main rooms: an optional merged room spanning two regions, then
/// one room per remaining free region. Regions too small for a room stay
/// roomless.
pub fn mk_main_rooms(
    map: &mut Map,
    regions: &mut RegionGrid,
    rooms: &mut Vec<Room>,
    config: &GenConfig,
    rng: &mut GameRng,
) {
    if let Some((a, b)) = regions.pick_merge_pair(config.regions.merge_pct, rng) {
        mk_merged_room(map, regions, rooms, (a, b), &config.room, rng);
    }

    for coord in RegionGrid::coords() {
        let region = regions.get(coord);
        if !region.is_free {
            continue;
        }
        let Some(rect) = region.rnd_room_rect(&config.room, rng) else {
            trace!(?coord, "region too small for a room");
            continue;
        };
        let id = add_room(map, rooms, RoomKind::Main, rect);
        rooms[id.0].regions.push(coord);
        let region = regions.get_mut(coord);
        region.main_room = Some(id);
        region.is_free = false;
    }
}

/// One large room across two adjacent regions. It always reaches past the
/// shared border so it really belongs to both.
fn mk_merged_room(
    map: &mut Map,
    regions: &mut RegionGrid,
    rooms: &mut Vec<Room>,
    (a, b): ((usize, usize), (usize, usize)),
    room: &RoomBounds,
    rng: &mut GameRng,
) {
    let area = regions.get(a).rect.union(&regions.get(b).rect).shrink(1);
    let (w, h) = (area.width() as usize, area.height() as usize);
    let bounds = if a.1 == b.1 {
        RoomBounds::new(w / 2 + 1, room.min_h, w, room.max_h)
    } else {
        RoomBounds::new(room.min_w, h / 2 + 1, room.max_w, h)
    };

    let (ra, rb) = (regions.get(a).rect, regions.get(b).rect);
    let Some(rect) = (0..PLACEMENT_TRIES)
        .filter_map(|_| rnd_rect_in(area, &bounds, rng))
        .find(|r| r.intersects(&ra) && r.intersects(&rb))
    else {
        return;
    };
    let id = add_room(map, rooms, RoomKind::Main, rect);
    rooms[id.0].regions = vec![a, b];
    for coord in [a, b] {
        let region = regions.get_mut(coord);
        region.main_room = Some(id);
        region.is_free = false;
    }
    trace!(?a, ?b, ?rect, "merged regions");
}

/// No room, no carving restriction and solid wall everywhere in `area`
fn is_area_clear(map: &Map, area: Rect) -> bool {
    area.positions().all(|p| {
        map.cells.in_bounds(p)
            && map.room_at(p).is_none()
            && map.cell_type(p) == CellType::Wall
            && !map.no_carve.at(p)
    })
}

/// Small extra rooms inside blocked regions, kept one wall cell away from
/// everything else
pub fn mk_aux_rooms(
    map: &mut Map,
    regions: &RegionGrid,
    rooms: &mut Vec<Room>,
    config: &GenConfig,
    rng: &mut GameRng,
) {
    for coord in regions.blocked_coords() {
        if !rng.percent(config.aux_room_pct) {
            continue;
        }
        let area = regions.get(coord).rect.shrink(1);
        for _ in 0..PLACEMENT_TRIES {
            let Some(rect) = rnd_rect_in(area, &config.aux_room, rng) else {
                break;
            };
            if is_area_clear(map, rect.expand(1)) {
                add_room(map, rooms, RoomKind::Aux, rect);
                break;
            }
        }
    }
}

/// Carve sub-rooms with a FIFO worklist; nesting stops at
/// `max_sub_room_depth`
pub fn mk_sub_rooms(
    map: &mut Map,
    rooms: &mut Vec<Room>,
    door_proposals: &mut Grid<bool>,
    config: &GenConfig,
    rng: &mut GameRng,
) {
    let mut worklist: VecDeque<(RoomId, u32)> = rooms
        .iter()
        .filter(|r| matches!(r.kind, RoomKind::Main | RoomKind::Aux))
        .map(|r| (r.id, 0))
        .collect();

    while let Some((parent, depth)) = worklist.pop_front() {
        if depth >= config.max_sub_room_depth || !rng.percent(config.sub_room_pct) {
            continue;
        }
        if let Some(child) =
            try_carve_sub_room(map, rooms, door_proposals, parent, &config.sub_room, rng)
        {
            worklist.push_back((child, depth + 1));
        }
    }
}

/// Wall off a rectangle inside `parent`, leaving one door.
///
/// The rectangle plus its wall shell plus one more ring must lie inside the
/// parent's members, so the parent keeps a connected floor ring around it.
fn try_carve_sub_room(
    map: &mut Map,
    rooms: &mut Vec<Room>,
    door_proposals: &mut Grid<bool>,
    parent: RoomId,
    bounds: &RoomBounds,
    rng: &mut GameRng,
) -> Option<RoomId> {
    let area = rooms[parent.0].rect.shrink(2);

    for _ in 0..PLACEMENT_TRIES {
        let inner = rnd_rect_in(area, bounds, rng)?;
        if !inner
            .expand(2)
            .positions()
            .all(|p| rooms[parent.0].contains(p))
        {
            continue;
        }

        let shell = inner.expand(1);
        let mut door_candidates = Vec::new();
        {
            let host = &mut rooms[parent.0];
            for p in shell.positions() {
                if inner.contains(p) {
                    host.release(map, p, CellType::Floor);
                } else {
                    host.release(map, p, CellType::Wall);
                    map.no_carve.set(p, true);
                    if is_shell_side(&shell, p) {
                        door_candidates.push(p);
                    }
                }
            }
        }

        let id = add_room(map, rooms, RoomKind::Sub, inner);
        rooms[id.0].parent = Some(parent);
        rooms[parent.0].children.push(id);

        if let Some(&door) = rng.choose(&door_candidates) {
            map.set_type(door, CellType::Floor);
            door_proposals.set(door, true);
        }
        trace!(?parent, child = ?id, ?inner, "carved sub-room");
        return Some(id);
    }
    None
}

/// Shell cell that is not a corner, so it touches the inside orthogonally
fn is_shell_side(shell: &Rect, p: Pos) -> bool {
    let on_x_edge = p.x == shell.x0 || p.x == shell.x1;
    let on_y_edge = p.y == shell.y0 || p.y == shell.y1;
    on_x_edge != on_y_edge
}
