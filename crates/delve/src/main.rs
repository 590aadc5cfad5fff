//! delve command-line tool
//!
//! Generates one dungeon level and prints it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use delve_core::mapgen::{BUILTIN_TEMPLATES, Level, LevelArchetype, MapTemplate};
use delve_core::{ConfigError, GameRng, GenConfig, GenError, LevelGenerator, TemplateError};

/// Level layouts the tool can build
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Archetype {
    Standard,
    Cavern,
    Template,
}

/// Procedural dungeon level generator
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(author, version, about = "Generate a dungeon level", long_about = None)]
struct Args {
    /// Random seed (picked at random when omitted)
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,

    /// Kind of level to generate (standard, or template when --template is given)
    #[arg(short = 'a', long = "archetype", value_enum)]
    archetype: Option<Archetype>,

    /// Built-in template name or path to a template file
    #[arg(short = 't', long = "template")]
    template: Option<String>,

    /// JSON configuration file
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Print a JSON summary instead of the map
    #[arg(long = "json")]
    json: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Generation(#[from] GenError),

    #[error("The template archetype needs --template (built-ins: {builtins})", builtins = BUILTIN_TEMPLATES.join(", "))]
    MissingTemplate,

    #[error("--template only applies to the template archetype, not {0:?}")]
    TemplateConflict(Archetype),

    #[error("Could not encode summary: {0}")]
    Json(#[from] serde_json::Error),
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn load_template(source: &str) -> Result<MapTemplate, CliError> {
    if let Some(template) = MapTemplate::builtin(source) {
        return Ok(template);
    }
    let path = PathBuf::from(source);
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source)
        .to_string();
    Ok(MapTemplate::parse(&name, &read(&path)?)?)
}

fn archetype(args: &Args) -> Result<LevelArchetype, CliError> {
    Ok(match (args.archetype, args.template.as_deref()) {
        (None | Some(Archetype::Template), Some(source)) => {
            LevelArchetype::Template(load_template(source)?)
        }
        (Some(Archetype::Template), None) => return Err(CliError::MissingTemplate),
        (Some(other), Some(_)) => return Err(CliError::TemplateConflict(other)),
        (None | Some(Archetype::Standard), None) => LevelArchetype::Standard,
        (Some(Archetype::Cavern), None) => LevelArchetype::Cavern,
    })
}

fn print_summary(level: &Level) {
    print!("{}", level.to_ascii());
    println!();
    println!(
        "{} level, seed {}, {} attempt(s)",
        level.archetype, level.seed, level.attempts
    );
    println!(
        "rooms: {}  choke points: {}  start: ({}, {})  stairs: ({}, {})",
        level.rooms.len(),
        level.choke_points.len(),
        level.player_start.x,
        level.player_start.y,
        level.stairs.x,
        level.stairs.y
    );
}

fn print_json(level: &Level) -> Result<(), CliError> {
    let rows: Vec<String> = level.to_ascii().lines().map(str::to_string).collect();
    let summary = serde_json::json!({
        "archetype": level.archetype,
        "seed": level.seed,
        "attempts": level.attempts,
        "rooms": level.rooms.len(),
        "choke_points": level.choke_points.len(),
        "river_bridges": level.river.as_ref().map(|r| r.bridges.len()),
        "player_start": level.player_start,
        "stairs": level.stairs,
        "map": rows,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run(args: &Args) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => GenConfig::from_json_str(&read(path)?)?,
        None => GenConfig::default(),
    };
    let seed = args.seed.unwrap_or_else(|| GameRng::from_entropy().seed());
    let archetype = archetype(args)?;
    let mut generator = LevelGenerator::new(config, seed)?;
    debug!(
        seed,
        archetype = archetype.name(),
        max_attempts = generator.config().max_attempts,
        "generating"
    );
    let level = generator.generate(&archetype)?;

    if args.json {
        print_json(&level)
    } else {
        print_summary(&level);
        Ok(())
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("delve: {e}");
            ExitCode::FAILURE
        }
    }
}
