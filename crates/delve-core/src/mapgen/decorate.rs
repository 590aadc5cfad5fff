//! Level decoration: doors, player start, stairs and dark rooms

use tracing::trace;

use crate::config::DecorationConfig;
use crate::rng::GameRng;

use super::cell::{CellFlags, CellType};
use super::flood::distance_map;
use super::geom::Pos;
use super::grid::{Grid, Map};
use super::room::Room;

/// Floor with solid wall on one opposite pair of sides and open floor on
/// the other pair
fn is_door_frame(map: &Map, p: Pos) -> bool {
    if map.cell_type(p) != CellType::Floor {
        return false;
    }
    let open = |dx, dy| map.is_passable(p.offset(dx, dy));
    let (n, s) = (open(0, -1), open(0, 1));
    let (e, w) = (open(1, 0), open(-1, 0));
    (!n && !s && e && w) || (n && s && !e && !w)
}

/// Check if there's a door next to a position (4 cardinal directions)
pub fn bydoor(map: &Map, p: Pos) -> bool {
    p.neighbors4().any(|n| map.cell_type(n) == CellType::Door)
}

/// Turn some door proposals into real doors. Returns the number placed.
pub fn place_doors(
    map: &mut Map,
    door_proposals: &Grid<bool>,
    config: &DecorationConfig,
    rng: &mut GameRng,
) -> usize {
    let mut placed = 0;
    for p in door_proposals.positions() {
        if !door_proposals.at(p) || !is_door_frame(map, p) || bydoor(map, p) {
            continue;
        }
        if rng.percent(config.door_pct) {
            map.set_type(p, CellType::Door);
            placed += 1;
        }
    }
    trace!(placed, "doors");
    placed
}

/// The preset start if there is one, else a random cell of the first room
pub fn pick_player_start(rooms: &[Room], preset: Option<Pos>, rng: &mut GameRng) -> Option<Pos> {
    preset.or_else(|| rooms.first()?.random_cell(rng))
}

/// Put the stairs at the preset position, or at the room cell farthest
/// (in walking steps) from `start`. Ties go to the first cell row-major.
pub fn place_stairs(map: &mut Map, start: Pos, preset: Option<Pos>) -> Option<Pos> {
    let stairs = match preset {
        Some(p) => p,
        None => {
            let dist = distance_map(map, start);
            let mut best: Option<(u32, Pos)> = None;
            for p in map.room_map.positions() {
                if map.room_at(p).is_none() || map.cell_type(p) != CellType::Floor {
                    continue;
                }
                let Some(d) = dist.at(p) else {
                    continue;
                };
                if best.is_none_or(|(bd, _)| d > bd) {
                    best = Some((d, p));
                }
            }
            best?.1
        }
    };
    map.set_type(stairs, CellType::Stairs);
    Some(stairs)
}

/// Mark rooms unlit at random
pub fn mark_dark_rooms(
    map: &mut Map,
    rooms: &mut [Room],
    config: &DecorationConfig,
    rng: &mut GameRng,
) {
    for room in rooms.iter_mut() {
        if !rng.percent(config.dark_room_pct) {
            continue;
        }
        room.is_dark = true;
        for &p in &room.cells {
            if let Some(cell) = map.cells.get_mut(p) {
                cell.flags.insert(CellFlags::DARK);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::geom::Rect;
    use crate::mapgen::room::{RoomId, RoomKind, register_room};

    fn corridor_map() -> (Map, Grid<bool>) {
        let mut map = Map::new(20, 8);
        for x in 2..=12 {
            map.set_type(Pos::new(x, 3), CellType::Floor);
        }
        let mut proposals = Grid::new(20, 8, false);
        proposals.set(Pos::new(5, 3), true);
        proposals.set(Pos::new(6, 3), true);
        (map, proposals)
    }

    #[test]
    fn test_doors_need_a_frame_and_no_neighbour_door() {
        let (mut map, proposals) = corridor_map();
        let config = DecorationConfig {
            door_pct: 100,
            ..DecorationConfig::default()
        };
        let mut rng = GameRng::new(0);

        assert_eq!(place_doors(&mut map, &proposals, &config, &mut rng), 1);
        assert_eq!(map.cell_type(Pos::new(5, 3)), CellType::Door);
        assert_eq!(map.cell_type(Pos::new(6, 3)), CellType::Floor);
    }

    #[test]
    fn test_no_door_in_open_floor() {
        let (mut map, proposals) = corridor_map();
        map.set_type(Pos::new(5, 2), CellType::Floor);
        map.set_type(Pos::new(6, 2), CellType::Floor);
        let config = DecorationConfig {
            door_pct: 100,
            ..DecorationConfig::default()
        };
        let mut rng = GameRng::new(0);

        assert_eq!(place_doors(&mut map, &proposals, &config, &mut rng), 0);
    }

    #[test]
    fn test_stairs_at_farthest_room_cell() {
        let mut map = Map::new(20, 8);
        let room = Room::new(RoomId(0), RoomKind::Main, Rect::new(2, 2, 10, 3));
        register_room(&mut map, &room);

        let stairs = place_stairs(&mut map, Pos::new(2, 2), None);
        assert_eq!(stairs, Some(Pos::new(10, 3)));
        assert_eq!(map.cell_type(Pos::new(10, 3)), CellType::Stairs);

        // Preset wins
        let preset = Pos::new(4, 2);
        assert_eq!(place_stairs(&mut map, Pos::new(2, 2), Some(preset)), Some(preset));
    }

    #[test]
    fn test_player_start_in_first_room() {
        let room = Room::new(RoomId(0), RoomKind::Main, Rect::new(2, 2, 6, 5));
        let mut rng = GameRng::new(4);
        let start = pick_player_start(std::slice::from_ref(&room), None, &mut rng).expect("room has cells");
        assert!(room.contains(start));
        assert_eq!(pick_player_start(&[], None, &mut rng), None);
        assert_eq!(pick_player_start(&[], Some(Pos::new(1, 1)), &mut rng), Some(Pos::new(1, 1)));
    }

    #[test]
    fn test_dark_rooms_flag_cells() {
        let mut map = Map::new(20, 8);
        let mut rooms = vec![Room::new(RoomId(0), RoomKind::Main, Rect::new(2, 2, 4, 4))];
        register_room(&mut map, &rooms[0]);
        let config = DecorationConfig {
            dark_room_pct: 100,
            ..DecorationConfig::default()
        };
        let mut rng = GameRng::new(0);

        mark_dark_rooms(&mut map, &mut rooms, &config, &mut rng);
        assert!(rooms[0].is_dark);
        let cell = map.cell(Pos::new(3, 3)).expect("in bounds");
        assert!(cell.flags.contains(CellFlags::DARK));
        assert!(!map.cell(Pos::new(6, 6)).expect("in bounds").flags.contains(CellFlags::DARK));
    }
}
