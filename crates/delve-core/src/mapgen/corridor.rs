//! Corridor generation
//!
//! Rooms are joined in four phases:
//! 1. Rooms of neighbouring regions along each row and column
//! 2. Rooms still on their own, to the nearest room elsewhere
//! 3. Closest pairs across classes until everything is reachable
//! 4. Random extra corridors for loops
//!
//! A corridor runs between two entry cells and is routed by a cost-weighted
//! shortest path or by a biased random walk.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::{debug, trace};

use crate::config::{CorridorConfig, CorridorCosts, CorridorStyle};
use crate::consts::{MAX_JOIN_ITERATIONS, REGIONS_PER_SIDE};
use crate::rng::GameRng;

use super::cell::CellType;
use super::flood::flood_fill;
use super::geom::{DIRS4, Pos, RING8, Rect};
use super::grid::{Grid, Map};
use super::region::RegionGrid;
use super::room::{Room, RoomId};

/// Tracks room connectivity using equivalence classes
#[derive(Debug, Clone)]
pub struct ConnectivityTracker {
    /// Each room's equivalence class (rooms in same class are connected)
    smeq: Vec<usize>,
}

impl ConnectivityTracker {
    /// Create a new tracker for the given number of rooms
    pub fn new(num_rooms: usize) -> Self {
        Self {
            smeq: (0..num_rooms).collect(),
        }
    }

    /// Seed the classes from what is already walkable on the map
    pub fn from_map(map: &Map, rooms: &[&Room]) -> Self {
        let mut tracker = Self::new(rooms.len());
        for i in 0..rooms.len() {
            if (0..i).any(|k| tracker.are_connected(k, i)) {
                continue;
            }
            let Some(&start) = rooms[i].cells.first() else {
                continue;
            };
            let reached = flood_fill(map, &[start], None);
            for j in i + 1..rooms.len() {
                if rooms[j].cells.iter().any(|&p| reached.at(p)) {
                    tracker.merge(i, j);
                }
            }
        }
        tracker
    }

    /// Check if two rooms are connected (in same equivalence class)
    pub fn are_connected(&self, a: usize, b: usize) -> bool {
        if a >= self.smeq.len() || b >= self.smeq.len() {
            return false;
        }
        self.smeq[a] == self.smeq[b]
    }

    /// Merge equivalence classes when rooms are connected
    pub fn merge(&mut self, a: usize, b: usize) {
        if a >= self.smeq.len() || b >= self.smeq.len() {
            return;
        }

        let old_class = self.smeq[b];
        let new_class = self.smeq[a];
        for eq in &mut self.smeq {
            if *eq == old_class {
                *eq = new_class;
            }
        }
    }

    /// Number of rooms sharing `a`'s class
    pub fn class_size(&self, a: usize) -> usize {
        self.smeq.get(a).map_or(0, |&class| {
            self.smeq.iter().filter(|&&c| c == class).count()
        })
    }

    /// Check if all rooms are connected
    pub fn all_connected(&self) -> bool {
        let Some(&first_class) = self.smeq.first() else {
            return true;
        };
        self.smeq.iter().all(|&c| c == first_class)
    }
}

/// Cells where a corridor may leave `room`: outside every room, carvable,
/// orthogonally next to a member and clear of other rooms' members
pub fn valid_room_corr_entries(map: &Map, room: &Room) -> Vec<Pos> {
    let mut entries: Vec<Pos> = room
        .cells
        .iter()
        .flat_map(|p| p.neighbors4())
        .filter(|&n| {
            map.room_at(n).is_none()
                && map.is_interior(n)
                && map.is_carvable(n)
                && n
                    .neighbors8()
                    .all(|m| map.room_at(m).is_none_or(|id| id == room.id))
        })
        .collect();
    entries.sort_unstable();
    entries.dedup();
    entries
}

fn step_cost(map: &Map, p: Pos, costs: &CorridorCosts) -> Option<u32> {
    if !map.is_interior(p) || !map.is_carvable(p) {
        None
    } else if map.room_at(p).is_some() {
        Some(costs.room)
    } else if map.is_passable(p) {
        Some(costs.floor)
    } else {
        Some(costs.wall)
    }
}

/// Cheapest 4-connected route from `from` to `to`.
///
/// Entering a room cell, existing floor or solid wall each has its own cost;
/// no-carve cells and the border are impassable. Equal costs resolve toward
/// the lower cell index so the route is reproducible.
pub fn mk_pathfind_cor(map: &Map, from: Pos, to: Pos, costs: &CorridorCosts) -> Option<Vec<Pos>> {
    let grid = &map.cells;
    let start = grid.index(from)?;
    let goal = grid.index(to)?;
    step_cost(map, from, costs)?;
    step_cost(map, to, costs)?;

    let mut dist = vec![u32::MAX; grid.len()];
    let mut prev: Vec<Option<usize>> = vec![None; grid.len()];
    let mut heap = BinaryHeap::new();
    dist[start] = 0;
    heap.push(Reverse((0u32, start)));

    while let Some(Reverse((d, idx))) = heap.pop() {
        if idx == goal {
            break;
        }
        if d > dist[idx] {
            continue;
        }
        let p = grid.pos_of(idx);
        for n in p.neighbors4() {
            let (Some(ni), Some(cost)) = (grid.index(n), step_cost(map, n, costs)) else {
                continue;
            };
            let nd = d.saturating_add(cost);
            if nd < dist[ni] {
                dist[ni] = nd;
                prev[ni] = Some(idx);
                heap.push(Reverse((nd, ni)));
            }
        }
    }

    if dist[goal] == u32::MAX {
        return None;
    }
    let mut route = vec![to];
    let mut cur = goal;
    while let Some(p) = prev[cur] {
        route.push(grid.pos_of(p));
        cur = p;
    }
    route.reverse();
    Some(route)
}

fn can_walk(map: &Map, area: &Rect, p: Pos) -> bool {
    area.contains(p) && map.is_interior(p) && map.is_carvable(p)
}

/// Step one cell toward `to`, diagonally only when allowed
fn step_toward(cur: Pos, to: Pos, allow_diagonal: bool, rng: &mut GameRng) -> (i32, i32) {
    let dx = (to.x - cur.x).signum();
    let dy = (to.y - cur.y).signum();
    if dx != 0 && dy != 0 && !allow_diagonal {
        if rng.one_in(2) { (dx, 0) } else { (0, dy) }
    } else {
        (dx, dy)
    }
}

fn random_step(allow_diagonal: bool, rng: &mut GameRng) -> (i32, i32) {
    if allow_diagonal {
        RING8[rng.rn2(8) as usize]
    } else {
        DIRS4[rng.rn2(4) as usize]
    }
}

/// Append the move `cur -> cur + (dx, dy)` to `path`. A diagonal move also
/// carves one of the two orthogonal corner cells so the corridor stays
/// 4-connected. Returns the new position, or `None` if blocked.
fn push_step(
    map: &Map,
    area: &Rect,
    path: &mut Vec<Pos>,
    cur: Pos,
    (dx, dy): (i32, i32),
) -> Option<Pos> {
    let next = cur.offset(dx, dy);
    if !can_walk(map, area, next) {
        return None;
    }
    if dx != 0 && dy != 0 {
        let corner = [cur.offset(dx, 0), cur.offset(0, dy)]
            .into_iter()
            .find(|&c| can_walk(map, area, c))?;
        path.push(corner);
    }
    path.push(next);
    Some(next)
}

/// Biased random walk from `from` to `to` inside `area`.
///
/// Each step heads for the target with probability `walk_bias_pct`, else
/// goes a random way. Gives up after `walk_max_len` steps.
pub fn rnd_walk_between(
    map: &Map,
    from: Pos,
    to: Pos,
    area: Rect,
    config: &CorridorConfig,
    rng: &mut GameRng,
) -> Option<Vec<Pos>> {
    if !can_walk(map, &area, from) || !can_walk(map, &area, to) {
        return None;
    }

    let mut path = vec![from];
    let mut cur = from;
    let mut steps = 0;
    while cur != to {
        if steps >= config.walk_max_len {
            return None;
        }
        steps += 1;
        let dir = if rng.percent(config.walk_bias_pct) {
            step_toward(cur, to, config.allow_diagonal, rng)
        } else {
            random_step(config.allow_diagonal, rng)
        };
        if let Some(next) = push_step(map, &area, &mut path, cur, dir) {
            cur = next;
        }
    }
    Some(path)
}

/// Aimless walk of `len` steps from `p0`, staying inside `area`
pub fn rnd_walk(
    map: &Map,
    p0: Pos,
    len: usize,
    allow_diagonal: bool,
    area: Rect,
    rng: &mut GameRng,
) -> Vec<Pos> {
    let mut path = vec![p0];
    let mut cur = p0;
    for _ in 0..len {
        let dir = random_step(allow_diagonal, rng);
        if let Some(next) = push_step(map, &area, &mut path, cur, dir) {
            cur = next;
        }
    }
    path
}

/// Greedy walk that only ever shortens the distance to `p1`.
///
/// A smooth walk moves along the axis with the larger remaining distance;
/// otherwise any shortening step is picked at random. Fails when both
/// shortening steps are blocked.
pub fn pathfinder_walk(
    map: &Map,
    p0: Pos,
    p1: Pos,
    is_smooth: bool,
    area: Rect,
    rng: &mut GameRng,
) -> Option<Vec<Pos>> {
    if !can_walk(map, &area, p0) {
        return None;
    }

    let mut path = vec![p0];
    let mut cur = p0;
    while cur != p1 {
        let dx = (p1.x - cur.x).signum();
        let dy = (p1.y - cur.y).signum();
        let horizontal = Pos::new(cur.x + dx, cur.y);
        let vertical = Pos::new(cur.x, cur.y + dy);

        let mut options = Vec::with_capacity(2);
        if dx != 0 {
            options.push(horizontal);
        }
        if dy != 0 {
            options.push(vertical);
        }
        if options.len() == 2 {
            let prefer_vertical = if is_smooth {
                (p1.y - cur.y).abs() > (p1.x - cur.x).abs()
            } else {
                rng.one_in(2)
            };
            if prefer_vertical {
                options.swap(0, 1);
            }
        }

        cur = options.into_iter().find(|&p| can_walk(map, &area, p))?;
        path.push(cur);
    }
    Some(path)
}

/// Turn a route into floor and record its door proposals: both ends, plus
/// the outer cell wherever the route crosses into or out of a room
pub fn carve_route(map: &mut Map, route: &[Pos], door_proposals: &mut Grid<bool>) {
    for &p in route {
        if map.cell_type(p) == CellType::Wall {
            map.set_type(p, CellType::Floor);
        }
    }
    for pair in route.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        match (map.room_at(a).is_some(), map.room_at(b).is_some()) {
            (true, false) => door_proposals.set(b, true),
            (false, true) => door_proposals.set(a, true),
            _ => {}
        }
    }
    if let (Some(&first), Some(&last)) = (route.first(), route.last()) {
        door_proposals.set(first, true);
        door_proposals.set(last, true);
    }
}

/// Route between two entry cells in the given style
fn route_between(
    map: &Map,
    from: Pos,
    to: Pos,
    style: CorridorStyle,
    config: &CorridorConfig,
    rng: &mut GameRng,
) -> Option<Vec<Pos>> {
    let area = map.cells.bounds().shrink(1);
    let style = match style {
        CorridorStyle::Mixed if rng.one_in(2) => CorridorStyle::Walk,
        CorridorStyle::Mixed => CorridorStyle::Directed,
        other => other,
    };
    match style {
        CorridorStyle::Walk => rnd_walk_between(map, from, to, area, config, rng)
            .or_else(|| pathfinder_walk(map, from, to, rng.one_in(2), area, rng))
            .or_else(|| mk_pathfind_cor(map, from, to, &config.costs)),
        _ => mk_pathfind_cor(map, from, to, &config.costs),
    }
}

/// Join two rooms with one corridor. Returns the carved route, or `None`
/// (with the map untouched) if no route exists.
pub fn join_rooms(
    map: &mut Map,
    a: &Room,
    b: &Room,
    door_proposals: &mut Grid<bool>,
    config: &CorridorConfig,
    rng: &mut GameRng,
) -> Option<Vec<Pos>> {
    let mut entries_a = valid_room_corr_entries(map, a);
    let mut entries_b = valid_room_corr_entries(map, b);
    rng.shuffle(&mut entries_a);
    rng.shuffle(&mut entries_b);

    let target = b.center();
    let from = entries_a.iter().copied().min_by_key(|p| p.manhattan(target))?;
    let to = entries_b.iter().copied().min_by_key(|p| p.manhattan(from))?;

    let route = route_between(map, from, to, config.style, config, rng)?;
    carve_route(map, &route, door_proposals);
    trace!(a = a.id.0, b = b.id.0, len = route.len(), "dug corridor");
    Some(route)
}

/// What the connection phase achieved
#[derive(Debug, Clone, Default)]
pub struct CorridorOutcome {
    /// Every carved route, in carving order
    pub routes: Vec<Vec<Pos>>,
    pub failed_joins: usize,
    pub all_connected: bool,
}

struct Joiner<'a> {
    map: &'a mut Map,
    rooms: Vec<&'a Room>,
    door_proposals: &'a mut Grid<bool>,
    config: &'a CorridorConfig,
    rng: &'a mut GameRng,
    tracker: ConnectivityTracker,
    outcome: CorridorOutcome,
}

impl Joiner<'_> {
    fn join(&mut self, i: usize, j: usize) -> bool {
        if i == j {
            return false;
        }
        let route = join_rooms(
            self.map,
            self.rooms[i],
            self.rooms[j],
            self.door_proposals,
            self.config,
            self.rng,
        );
        match route {
            Some(route) => {
                self.tracker.merge(i, j);
                self.outcome.routes.push(route);
                true
            }
            None => {
                self.outcome.failed_joins += 1;
                false
            }
        }
    }

    fn distance(&self, i: usize, j: usize) -> i32 {
        self.rooms[i].center().manhattan(self.rooms[j].center())
    }
}

/// Main rooms of neighbouring regions, row by row then column by column;
/// roomless regions are skipped and a merged room counts once
fn macro_lines(grid: &RegionGrid) -> Vec<Vec<RoomId>> {
    let mut lines: Vec<Vec<RoomId>> = Vec::new();
    for y in 0..REGIONS_PER_SIDE {
        lines.push((0..REGIONS_PER_SIDE).filter_map(|x| grid.get((x, y)).main_room).collect());
    }
    for x in 0..REGIONS_PER_SIDE {
        lines.push((0..REGIONS_PER_SIDE).filter_map(|y| grid.get((x, y)).main_room).collect());
    }
    for line in &mut lines {
        line.dedup();
    }
    lines
}

/// Connect every room that is not a sub-room
pub fn connect_rooms(
    map: &mut Map,
    rooms: &[Room],
    regions: Option<&RegionGrid>,
    door_proposals: &mut Grid<bool>,
    config: &CorridorConfig,
    rng: &mut GameRng,
) -> CorridorOutcome {
    let plan: Vec<&Room> = rooms.iter().filter(|r| !r.is_subroom()).collect();
    let n = plan.len();
    let tracker = ConnectivityTracker::from_map(map, &plan);
    let index_of = |id: RoomId| plan.iter().position(|r| r.id == id);

    let lines: Vec<(usize, usize)> = regions
        .map(macro_lines)
        .unwrap_or_default()
        .iter()
        .flat_map(|line| line.windows(2).map(|w| (w[0], w[1])).collect::<Vec<_>>())
        .filter_map(|(a, b)| Some((index_of(a)?, index_of(b)?)))
        .collect();

    let mut joiner = Joiner {
        map,
        rooms: plan,
        door_proposals,
        config,
        rng,
        tracker,
        outcome: CorridorOutcome::default(),
    };

    // Phase 1: neighbouring regions
    for (i, j) in lines {
        if !joiner.tracker.are_connected(i, j) {
            joiner.join(i, j);
        }
    }

    // Phase 2: anything still alone joins its nearest reachable neighbour
    for i in 0..n {
        if joiner.tracker.class_size(i) > 1 {
            continue;
        }
        let mut others: Vec<usize> = (0..n).filter(|&j| !joiner.tracker.are_connected(i, j)).collect();
        others.sort_by_key(|&j| (joiner.distance(i, j), j));
        for j in others {
            if joiner.join(i, j) {
                break;
            }
        }
    }

    // Phase 3: closest pair between room 0's class and the rest
    let mut failed: Vec<(usize, usize)> = Vec::new();
    for _ in 0..MAX_JOIN_ITERATIONS {
        if joiner.tracker.all_connected() {
            break;
        }
        let best = (0..n)
            .filter(|&i| joiner.tracker.are_connected(0, i))
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .filter(|&(i, j)| !joiner.tracker.are_connected(i, j) && !failed.contains(&(i, j)))
            .min_by_key(|&(i, j)| (joiner.distance(i, j), i, j));
        let Some((i, j)) = best else {
            break;
        };
        if !joiner.join(i, j) {
            failed.push((i, j));
        }
    }

    // Phase 4: extra corridors for loops
    if n > 2 {
        for i in 0..n {
            if !joiner.rng.percent(joiner.config.extra_pct) {
                continue;
            }
            let mut j = joiner.rng.rn2(n as u32 - 1) as usize;
            if j >= i {
                j += 1;
            }
            joiner.join(i, j);
        }
    }

    joiner.outcome.all_connected = joiner.tracker.all_connected();
    debug!(
        corridors = joiner.outcome.routes.len(),
        failed = joiner.outcome.failed_joins,
        connected = joiner.outcome.all_connected,
        "corridors done"
    );
    joiner.outcome
}
