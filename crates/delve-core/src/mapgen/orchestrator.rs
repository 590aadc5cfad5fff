//! Generation pipeline
//!
//! Every attempt runs the phases in order on a fresh [`GenContext`]. Any
//! phase may mark the attempt invalid; the generator then throws the whole
//! context away and starts over from [`GenPhase::Regions`], drawing from the
//! same random stream. Only a fully validated context becomes a [`Level`].

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use tracing::{debug, info, warn};

use crate::config::{CorridorStyle, GenConfig};
use crate::error::{GenError, InvalidReason};
use crate::rng::GameRng;

use super::cell::CellType;
use super::choke::{ChokePointData, find_choke_points};
use super::corridor::{connect_rooms, rnd_walk};
use super::decorate::{mark_dark_rooms, pick_player_start, place_doors, place_stairs};
use super::flood::validate_connectivity;
use super::geom::Pos;
use super::grid::{Grid, Map};
use super::placer::{mk_aux_rooms, mk_main_rooms, mk_sub_rooms};
use super::region::RegionGrid;
use super::reshape::reshape_rooms;
use super::river::{River, RiverAxis, mk_river};
use super::room::Room;
use super::template::MapTemplate;

/// Pipeline phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum GenPhase {
    Regions,
    Rooms,
    Reshape,
    Corridors,
    Decorate,
    Validate,
    ChokePoints,
    Done,
}

impl GenPhase {
    /// The phase after this one
    pub const fn next(self) -> Option<GenPhase> {
        match self {
            GenPhase::Regions => Some(GenPhase::Rooms),
            GenPhase::Rooms => Some(GenPhase::Reshape),
            GenPhase::Reshape => Some(GenPhase::Corridors),
            GenPhase::Corridors => Some(GenPhase::Decorate),
            GenPhase::Decorate => Some(GenPhase::Validate),
            GenPhase::Validate => Some(GenPhase::ChokePoints),
            GenPhase::ChokePoints => Some(GenPhase::Done),
            GenPhase::Done => None,
        }
    }
}

/// The kind of level to build; each picks its own strategy for the phases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelArchetype {
    /// Rooms in a region layout joined by corridors
    Standard,
    /// Cave-like rooms joined by wandering tunnels
    Cavern,
    /// A fixed special level layout
    Template(MapTemplate),
}

impl LevelArchetype {
    pub fn name(&self) -> &str {
        match self {
            LevelArchetype::Standard => "standard",
            LevelArchetype::Cavern => "cavern",
            LevelArchetype::Template(t) => &t.name,
        }
    }

    /// The configuration this archetype runs the shared pipeline with
    fn tune(&self, base: &GenConfig) -> GenConfig {
        let mut config = base.clone();
        match self {
            LevelArchetype::Standard => {}
            LevelArchetype::Cavern => {
                config.sub_room_pct = 0;
                config.reshape.cut_corners_pct = 0;
                config.reshape.pillars_pct = 0;
                config.reshape.cavify_pct = 100;
                config.corridor.style = CorridorStyle::Walk;
            }
            LevelArchetype::Template(_) => {
                config.corridor.extra_pct = 0;
            }
        }
        config
    }
}

/// Everything one attempt builds. Discarded as a whole on failure.
#[derive(Debug, Clone)]
pub struct GenContext {
    /// 1-based attempt number
    pub attempt: u32,
    /// Phase currently running (or the last one that ran)
    pub phase: GenPhase,
    pub map: Map,
    /// `None` for layouts that do not use regions
    pub regions: Option<RegionGrid>,
    pub river: Option<River>,
    pub rooms: Vec<Room>,
    pub door_proposals: Grid<bool>,
    /// Carved corridor routes
    pub corridors: Vec<Vec<Pos>>,
    pub player_start: Option<Pos>,
    pub stairs: Option<Pos>,
    pub choke_points: Vec<ChokePointData>,
    invalid: Option<InvalidReason>,
}

impl GenContext {
    pub fn new(width: usize, height: usize, attempt: u32) -> Self {
        Self {
            attempt,
            phase: GenPhase::Regions,
            map: Map::new(width, height),
            regions: None,
            river: None,
            rooms: Vec::new(),
            door_proposals: Grid::new(width, height, false),
            corridors: Vec::new(),
            player_start: None,
            stairs: None,
            choke_points: Vec::new(),
            invalid: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.invalid.is_none()
    }

    /// Clear the validity flag. The first reason given is kept.
    pub fn invalidate(&mut self, reason: InvalidReason) {
        if self.invalid.is_none() {
            self.invalid = Some(reason);
        }
    }

    pub fn invalid_reason(&self) -> Option<&InvalidReason> {
        self.invalid.as_ref()
    }

    fn into_level(self, seed: u64, archetype: &LevelArchetype) -> Level {
        Level {
            archetype: archetype.name().to_string(),
            map: self.map,
            river: self.river,
            rooms: self.rooms,
            door_proposals: self.door_proposals,
            choke_points: self.choke_points,
            player_start: self.player_start.unwrap_or_default(),
            stairs: self.stairs.unwrap_or_default(),
            seed,
            attempts: self.attempt,
        }
    }
}

/// Observer called after every phase of every attempt
pub trait PhaseHook {
    /// May inspect or change the context, including invalidating it
    fn after_phase(&mut self, phase: GenPhase, ctx: &mut GenContext) {
        let _ = (phase, ctx);
    }
}

impl PhaseHook for () {}

/// A finished, validated level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Level {
    pub archetype: String,
    pub map: Map,
    pub river: Option<River>,
    pub rooms: Vec<Room>,
    pub door_proposals: Grid<bool>,
    pub choke_points: Vec<ChokePointData>,
    pub player_start: Pos,
    pub stairs: Pos,
    pub seed: u64,
    /// Attempts used, including the successful one
    pub attempts: u32,
}

impl Level {
    /// ASCII dump with the player start marked `@`
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.map.width() + 1) * self.map.height());
        for y in 0..self.map.height() as i32 {
            for x in 0..self.map.width() as i32 {
                let p = Pos::new(x, y);
                if p == self.player_start {
                    out.push('@');
                } else {
                    out.push(self.map.cell_type(p).symbol());
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Seeded level generator
#[derive(Debug, Clone)]
pub struct LevelGenerator {
    config: GenConfig,
    rng: GameRng,
}

impl LevelGenerator {
    pub fn new(config: GenConfig, seed: u64) -> Result<Self, GenError> {
        config.validate()?;
        Ok(Self {
            config,
            rng: GameRng::new(seed),
        })
    }

    pub fn config(&self) -> &GenConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn generate_standard(&mut self) -> Result<Level, GenError> {
        self.generate(&LevelArchetype::Standard)
    }

    pub fn generate_cavern(&mut self) -> Result<Level, GenError> {
        self.generate(&LevelArchetype::Cavern)
    }

    pub fn generate_from_template(&mut self, template: &MapTemplate) -> Result<Level, GenError> {
        self.generate(&LevelArchetype::Template(template.clone()))
    }

    pub fn generate(&mut self, archetype: &LevelArchetype) -> Result<Level, GenError> {
        self.generate_with_hook(archetype, &mut ())
    }

    /// Run attempts until one validates or the retry budget is spent
    pub fn generate_with_hook(
        &mut self,
        archetype: &LevelArchetype,
        hook: &mut dyn PhaseHook,
    ) -> Result<Level, GenError> {
        let config = archetype.tune(&self.config);
        if let LevelArchetype::Template(template) = archetype {
            template.check_fits(config.width, config.height)?;
        }

        for attempt in 1..=config.max_attempts {
            let mut ctx = GenContext::new(config.width, config.height, attempt);
            self.run_attempt(&config, archetype, &mut ctx, hook)?;

            if let Some(reason) = ctx.invalid_reason() {
                warn!(attempt, phase = %ctx.phase, %reason, "attempt abandoned");
                continue;
            }
            info!(
                archetype = archetype.name(),
                seed = self.rng.seed(),
                attempt,
                rooms = ctx.rooms.len(),
                choke_points = ctx.choke_points.len(),
                "level generated"
            );
            return Ok(ctx.into_level(self.rng.seed(), archetype));
        }

        info!(attempts = config.max_attempts, "retry budget exhausted");
        Err(GenError::Exhausted {
            attempts: config.max_attempts,
        })
    }

    fn run_attempt(
        &mut self,
        config: &GenConfig,
        archetype: &LevelArchetype,
        ctx: &mut GenContext,
        hook: &mut dyn PhaseHook,
    ) -> Result<(), GenError> {
        let mut phase = Some(GenPhase::Regions);
        while let Some(current) = phase {
            ctx.phase = current;
            self.run_phase(current, config, archetype, ctx)?;
            hook.after_phase(current, ctx);
            if !ctx.is_valid() {
                break;
            }
            debug!(attempt = ctx.attempt, phase = %current, "phase complete");
            phase = current.next();
        }
        Ok(())
    }

    fn run_phase(
        &mut self,
        phase: GenPhase,
        config: &GenConfig,
        archetype: &LevelArchetype,
        ctx: &mut GenContext,
    ) -> Result<(), GenError> {
        let rng = &mut self.rng;
        match phase {
            GenPhase::Regions => {
                if !matches!(archetype, LevelArchetype::Template(_)) {
                    let mut regions = RegionGrid::partition(config.width, config.height);
                    let river_axis = if rng.percent(config.regions.river_pct) {
                        let axis = RiverAxis::random(rng);
                        regions.reserve_river(axis);
                        Some(axis)
                    } else {
                        None
                    };
                    regions.randomly_block_regions(&config.regions, rng);
                    if let Some(axis) = river_axis {
                        ctx.river =
                            mk_river(&mut ctx.map, &regions, axis, config.regions.max_bridges, rng);
                    }
                    ctx.regions = Some(regions);
                }
            }
            GenPhase::Rooms => {
                if let LevelArchetype::Template(template) = archetype {
                    let stamped = template.stamp(&mut ctx.map, &mut ctx.door_proposals, rng)?;
                    ctx.rooms = stamped.rooms;
                    ctx.player_start = stamped.player_start;
                    ctx.stairs = stamped.stairs;
                } else if let Some(regions) = ctx.regions.as_mut() {
                    mk_main_rooms(&mut ctx.map, regions, &mut ctx.rooms, config, rng);
                    mk_aux_rooms(&mut ctx.map, regions, &mut ctx.rooms, config, rng);
                    mk_sub_rooms(&mut ctx.map, &mut ctx.rooms, &mut ctx.door_proposals, config, rng);
                }
                if ctx.rooms.is_empty() {
                    ctx.invalidate(InvalidReason::NoRooms);
                }
            }
            GenPhase::Reshape => {
                if !matches!(archetype, LevelArchetype::Template(_)) {
                    let result = reshape_rooms(
                        &mut ctx.map,
                        &mut ctx.rooms,
                        ctx.regions.as_ref(),
                        config,
                        rng,
                    );
                    if let Err(reason) = result {
                        ctx.invalidate(reason);
                    }
                }
            }
            GenPhase::Corridors => {
                let outcome = connect_rooms(
                    &mut ctx.map,
                    &ctx.rooms,
                    ctx.regions.as_ref(),
                    &mut ctx.door_proposals,
                    &config.corridor,
                    rng,
                );
                ctx.corridors = outcome.routes;
                if matches!(archetype, LevelArchetype::Cavern) {
                    add_side_passages(ctx, config, rng);
                }
            }
            GenPhase::Decorate => {
                if let Some(river) = &ctx.river {
                    river.flood_unused_bridges(&mut ctx.map);
                }
                place_doors(&mut ctx.map, &ctx.door_proposals, &config.decoration, rng);
                let Some(start) = pick_player_start(&ctx.rooms, ctx.player_start, rng) else {
                    ctx.invalidate(InvalidReason::NoRooms);
                    return Ok(());
                };
                ctx.player_start = Some(start);
                ctx.stairs = place_stairs(&mut ctx.map, start, ctx.stairs);
                mark_dark_rooms(&mut ctx.map, &mut ctx.rooms, &config.decoration, rng);
            }
            GenPhase::Validate => {
                if let Err(reason) =
                    validate_connectivity(&ctx.map, &ctx.rooms, &ctx.door_proposals)
                {
                    ctx.invalidate(reason);
                }
            }
            GenPhase::ChokePoints => {
                ctx.choke_points = find_choke_points(&ctx.map, ctx.player_start, ctx.stairs);
            }
            GenPhase::Done => {}
        }
        Ok(())
    }
}

/// Short dead-end tunnels branching off the carved corridors
fn add_side_passages(ctx: &mut GenContext, config: &GenConfig, rng: &mut GameRng) {
    let cells: Vec<Pos> = ctx.corridors.iter().flatten().copied().collect();
    let area = ctx.map.cells.bounds().shrink(1);
    for _ in 0..rng.rnd(3) {
        let Some(&from) = rng.choose(&cells) else {
            return;
        };
        let len = rng.range(4, 10) as usize;
        let path = rnd_walk(&ctx.map, from, len, config.corridor.allow_diagonal, area, rng);
        for p in path {
            if ctx.map.cell_type(p) == CellType::Wall {
                ctx.map.set_type(p, CellType::Floor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_phase_order() {
        let order: Vec<GenPhase> =
            std::iter::successors(Some(GenPhase::Regions), |p| p.next()).collect();
        assert_eq!(order, GenPhase::iter().collect::<Vec<_>>());
        assert_eq!(GenPhase::Done.next(), None);
    }

    #[test]
    fn test_first_invalid_reason_sticks() {
        let mut ctx = GenContext::new(20, 20, 1);
        assert!(ctx.is_valid());
        ctx.invalidate(InvalidReason::NoRooms);
        ctx.invalidate(InvalidReason::RoomUnreached { room: 2 });
        assert_eq!(ctx.invalid_reason(), Some(&InvalidReason::NoRooms));
    }

    #[test]
    fn test_rejects_bad_config() {
        let config = GenConfig {
            max_attempts: 0,
            ..GenConfig::default()
        };
        assert!(matches!(
            LevelGenerator::new(config, 1),
            Err(GenError::Config(_))
        ));
    }

    #[test]
    fn test_standard_level_is_valid() {
        let mut generator = LevelGenerator::new(GenConfig::default(), 42).expect("default config");
        let level = generator.generate_standard().expect("level");

        assert_eq!(level.seed, 42);
        assert_eq!(level.archetype, "standard");
        assert!(level.attempts >= 1);
        assert!(validate_connectivity(&level.map, &level.rooms, &level.door_proposals).is_ok());
        assert!(level.map.is_passable(level.player_start));
        assert_eq!(level.map.cell_type(level.stairs), CellType::Stairs);
    }

    #[test]
    fn test_cavern_level_is_valid() {
        let mut generator = LevelGenerator::new(GenConfig::default(), 7).expect("default config");
        let level = generator.generate_cavern().expect("level");
        assert_eq!(level.archetype, "cavern");
        assert!(validate_connectivity(&level.map, &level.rooms, &level.door_proposals).is_ok());
    }

    #[test]
    fn test_template_level_keeps_markers() {
        let template = MapTemplate::builtin("boss").expect("built-in");
        let mut generator = LevelGenerator::new(GenConfig::default(), 3).expect("default config");
        let level = generator.generate_from_template(&template).expect("level");

        assert_eq!(level.archetype, "boss");
        assert_eq!(level.rooms.len(), 3);
        assert_eq!(level.map.cell_type(level.stairs), CellType::Stairs);
        assert!(level.to_ascii().contains('@'));
    }

    #[test]
    fn test_oversized_template_is_rejected_up_front() {
        let template = MapTemplate::parse("wide", &"A".repeat(100)).expect("valid glyphs");
        let mut generator = LevelGenerator::new(GenConfig::default(), 3).expect("default config");
        assert!(matches!(
            generator.generate_from_template(&template),
            Err(GenError::Template(_))
        ));
    }
}
