//! Level generation
//!
//! Contains the grid model, region layout, rivers, room placement and
//! reshaping, corridors, validation, choke point analysis and the phase pipeline.

mod cell;
mod choke;
mod corridor;
mod decorate;
mod flood;
mod geom;
mod grid;
mod orchestrator;
mod placer;
mod region;
mod reshape;
mod river;
mod room;
mod template;

pub use cell::{ActorId, Cell, CellFlags, CellType, ItemId};
pub use choke::{ChokePointData, find_choke_points};
pub use corridor::{
    ConnectivityTracker, CorridorOutcome, carve_route, connect_rooms, join_rooms,
    mk_pathfind_cor, pathfinder_walk, rnd_walk, rnd_walk_between, valid_room_corr_entries,
};
pub use decorate::{bydoor, mark_dark_rooms, pick_player_start, place_doors, place_stairs};
pub use flood::{
    count_reached, distance_map, flood_fill, is_all_rooms_connected, is_cell_set_connected,
    validate_connectivity,
};
pub use geom::{DIRS4, Pos, RING8, Rect};
pub use grid::{Grid, Map};
pub use orchestrator::{GenContext, GenPhase, Level, LevelArchetype, LevelGenerator, PhaseHook};
pub use placer::{add_room, mk_aux_rooms, mk_main_rooms, mk_sub_rooms};
pub use region::{Region, RegionGrid, rnd_rect_in};
pub use reshape::{add_pillars, bounds_for, cavify, cut_corners, reshape_rooms};
pub use river::{River, RiverAxis, mk_river};
pub use room::{RegionCoord, Room, RoomId, RoomKind, bounding_rect, register_room};
pub use template::{BUILTIN_TEMPLATES, MapTemplate, StampedTemplate};
