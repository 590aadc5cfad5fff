//! Room reshaping: corner cutting, pillars and cavify
//!
//! Each transform edits a room's member set and the map together. Only
//! plain main and auxiliary rooms are reshaped; rooms holding sub-rooms keep
//! their rectangle so the nested walls stay intact.

use tracing::trace;

use crate::config::{GenConfig, RoomBounds};
use crate::error::InvalidReason;
use crate::rng::GameRng;

use super::cell::CellType;
use super::flood::is_cell_set_connected;
use super::geom::{Pos, Rect};
use super::grid::Map;
use super::region::RegionGrid;
use super::room::{Room, RoomKind};

/// Size bounds a room of this kind was placed with
pub fn bounds_for(kind: RoomKind, config: &GenConfig) -> RoomBounds {
    match kind {
        RoomKind::Main => config.room,
        RoomKind::Aux => config.aux_room,
        RoomKind::Sub => config.sub_room,
        RoomKind::Template => RoomBounds::new(1, 1, usize::MAX, usize::MAX),
    }
}

/// Roll every transform for every eligible room, then reject the attempt if
/// any room fell below its minimum area
pub fn reshape_rooms(
    map: &mut Map,
    rooms: &mut [Room],
    regions: Option<&RegionGrid>,
    config: &GenConfig,
    rng: &mut GameRng,
) -> Result<(), InvalidReason> {
    let reshape = &config.reshape;
    let interior = map.cells.bounds().shrink(1);

    for room in rooms.iter_mut().filter(|r| r.is_reshapeable()) {
        let bounds = bounds_for(room.kind, config);

        if rng.percent(reshape.cut_corners_pct) {
            cut_corners(map, room, &bounds, rng);
        }
        if rng.percent(reshape.pillars_pct) {
            add_pillars(map, room, reshape.pillar_stride);
        }
        if rng.percent(reshape.cavify_pct) {
            let limit = regions
                .map(|grid| cavify_limit(grid, room))
                .unwrap_or(interior);
            cavify(map, room, limit, bounds.min_area(), config, rng);
        }
    }

    for room in rooms.iter() {
        let min = bounds_for(room.kind, config).min_area();
        if room.area() < min {
            return Err(InvalidReason::RoomTooSmall {
                room: room.id.0,
                area: room.area(),
                min,
            });
        }
    }
    Ok(())
}

/// Area a room may grow into: its own regions (or the region holding it)
/// minus a one-cell margin
fn cavify_limit(grid: &RegionGrid, room: &Room) -> Rect {
    let own = room
        .regions
        .iter()
        .map(|&c| grid.get(c).rect)
        .reduce(|a, b| a.union(&b));
    own.or_else(|| {
        grid.iter()
            .map(|(_, r)| r.rect)
            .find(|r| r.contains_rect(&room.rect))
    })
    .unwrap_or(room.rect.expand(1))
    .shrink(1)
}

/// Remove triangular wedges from random corners of the room's rectangle
pub fn cut_corners(map: &mut Map, room: &mut Room, bounds: &RoomBounds, rng: &mut GameRng) {
    let rect = room.rect;
    let (w, h) = (rect.width(), rect.height());
    if w < bounds.min_w as i32 + 2 || h < bounds.min_h as i32 + 2 {
        return;
    }
    let max_leg = w.min(h) / 3;
    if max_leg < 1 {
        return;
    }

    let corners = [
        (rect.x0, rect.y0, 1, 1),
        (rect.x1, rect.y0, -1, 1),
        (rect.x0, rect.y1, 1, -1),
        (rect.x1, rect.y1, -1, -1),
    ];
    for (cx, cy, sx, sy) in corners {
        if !rng.one_in(2) {
            continue;
        }
        let leg = rng.range(1, max_leg);
        for dy in 0..leg {
            for dx in 0..leg - dy {
                room.release(map, Pos::new(cx + sx * dx, cy + sy * dy), CellType::Wall);
            }
        }
        trace!(room = room.id.0, cx, cy, leg, "cut corner");
    }
}

/// Wall pillars on a regular lattice, never next to the room's edge
pub fn add_pillars(map: &mut Map, room: &mut Room, stride: usize) {
    let rect = room.rect;
    let stride = stride.max(2);
    for y in (rect.y0 + 2..=rect.y1 - 2).step_by(stride) {
        for x in (rect.x0 + 2..=rect.x1 - 2).step_by(stride) {
            let p = Pos::new(x, y);
            if room.contains(p) && p.neighbors8().all(|n| room.contains(n)) {
                room.release(map, p, CellType::Wall);
            }
        }
    }
}

/// Roughen the room into a cave: grow into nearby wall and erode the edge
/// while keeping the room connected and at least `min_area` large
pub fn cavify(
    map: &mut Map,
    room: &mut Room,
    limit: Rect,
    min_area: usize,
    config: &GenConfig,
    rng: &mut GameRng,
) {
    let reshape = &config.reshape;
    for _ in 0..reshape.cavify_rounds {
        let mut grow: Vec<Pos> = room
            .cells
            .iter()
            .flat_map(|p| p.neighbors4())
            .filter(|&n| !room.contains(n))
            .collect();
        grow.sort_unstable();
        grow.dedup();

        for p in grow {
            if can_grow_into(map, room, limit, p) && rng.percent(reshape.cavify_grow_pct) {
                room.claim(map, p);
            }
        }

        for p in room.boundary_cells() {
            if room.area() <= min_area || !rng.percent(reshape.cavify_erode_pct) {
                continue;
            }
            let mut rest = room.cells.clone();
            rest.retain(|&c| c != p);
            if is_cell_set_connected(&rest) {
                room.release(map, p, CellType::Wall);
            }
        }
    }
    trace!(room = room.id.0, area = room.area(), "cavified");
}

fn can_grow_into(map: &Map, room: &Room, limit: Rect, p: Pos) -> bool {
    limit.contains(p)
        && map.is_carvable(p)
        && map.cell_type(p) == CellType::Wall
        && map.room_at(p).is_none()
        && p
            .neighbors8()
            .all(|n| map.room_at(n).is_none_or(|id| id == room.id))
}
