//! # Delve Main Entry Point
//!
//! Generates a cave from the command line, optionally rendering it as ASCII and
//! writing the result to JSON.

use clap::Parser;
use delve::{
    generation::utils::seeded_rng, plan_placements, render_ascii, CaveConfig, CaveGenerator,
    DelveResult, EntityKind, Generator, Position,
};
use log::{info, warn, LevelFilter};
use std::path::PathBuf;

/// Command line arguments for the cave generator.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "Procedural cave generator for 2D roguelikes")]
#[command(version)]
struct Args {
    /// Random seed for cave generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON configuration file with parameter pools and placement rules
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// X coordinate of the root tile
    #[arg(long)]
    root_x: Option<i32>,

    /// Y coordinate of the root tile
    #[arg(long)]
    root_y: Option<i32>,

    /// Print the cave as ASCII
    #[arg(short, long)]
    render: bool,

    /// Write the generated cave to this JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Plan entity placements and print a summary
    #[arg(long)]
    place: bool,

    /// Reject caves whose floor is not connected
    #[arg(long)]
    strict: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> DelveResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level);

    info!("Starting Delve v{}", delve::VERSION);

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            CaveConfig::load(path)?
        }
        None => CaveConfig {
            seed: None,
            ..CaveConfig::default()
        },
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.root_x.is_some() || args.root_y.is_some() {
        config.root_position = Position::new(
            args.root_x.unwrap_or(config.root_position.x),
            args.root_y.unwrap_or(config.root_position.y),
        );
    }

    let seed = config.resolve_seed();
    config.seed = Some(seed);
    let mut rng = seeded_rng(seed);

    let generator = if args.strict {
        CaveGenerator::strict()
    } else {
        CaveGenerator::new()
    };
    let cave = generator.generate(&config, &mut rng)?;
    info!(
        "Generated cave with seed {}: {} floor tiles, {} features, depth {}",
        seed,
        cave.floor_tiles.len(),
        cave.features.len(),
        cave.depth()
    );
    if !cave.is_connected() {
        warn!("Cave floor is not fully connected to the root tile");
    }

    if args.render {
        print!("{}", render_ascii(&cave));
    }

    if args.place {
        let commands = plan_placements(&cave, &config.placement, &mut rng)?;
        for kind in [EntityKind::Obstacle, EntityKind::Enemy, EntityKind::Chest] {
            let count = commands.iter().filter(|c| c.kind == kind).count();
            println!("{:?}: {}", kind, count);
        }
    }

    if let Some(path) = &args.output {
        std::fs::write(path, cave.to_json()?)?;
        info!("Wrote cave to {}", path.display());
    }

    Ok(())
}

/// Initializes env_logger at the requested level.
///
/// Unknown level names fall back to info. `RUST_LOG` still refines the filter.
fn initialize_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .parse_default_env()
        .init();
}
