// =============================================================================
// nes-gym: drive NES ROMs as RL environments from the command line
// =============================================================================
//   cargo run --release -- run --rom smb.nes --objectives smb.objectives --steps 50000
//   cargo run --release -- ram --rom smb.nes --frames 600 --addr 0x6D --addr 0x86

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use nes_gym::objectives::parse_address;
use nes_gym::{
    Buttons, Console, EnvConfig, LexicographicReward, NesEnv, RAM_SIZE, RenderMode,
    TetanesEmulator,
};

#[derive(Parser)]
#[command(name = "nes-gym", about = "NES games as step-driven RL environments")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a random agent scored by an objective file
    Run(RunArgs),
    /// Step a ROM and print RAM bytes as they change
    Ram(RamArgs),
}

#[derive(Parser)]
struct RunArgs {
    #[arg(long)]
    rom: PathBuf,
    #[arg(long)]
    objectives: PathBuf,
    #[arg(long, default_value = "10000")]
    steps: u64,
    #[arg(long)]
    fps: Option<i32>,
    #[arg(long)]
    max_episode_length: Option<i64>,
    /// headless or windowed
    #[arg(long)]
    render: Option<RenderMode>,
    #[arg(long)]
    seed: Option<u64>,
    /// JSON environment config; flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser)]
struct RamArgs {
    #[arg(long)]
    rom: PathBuf,
    #[arg(long, default_value = "600")]
    frames: u64,
    /// Address to watch, decimal or 0x hex. Repeatable; all of RAM when omitted.
    #[arg(long, value_parser = parse_watch_address)]
    addr: Vec<u16>,
    /// Press Start every N frames to get past title screens (0 disables)
    #[arg(long, default_value = "120")]
    start_every: u64,
}

fn parse_watch_address(s: &str) -> std::result::Result<u16, String> {
    parse_address(s).ok_or_else(|| format!("invalid address '{s}'"))
}

// =============================================================================
// Random agent
// =============================================================================

fn run(args: &RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => EnvConfig::from_json_file(path)?,
        None => EnvConfig::default(),
    };
    if let Some(fps) = args.fps {
        config.fps_limit = fps;
    }
    if let Some(max) = args.max_episode_length {
        config.max_episode_length = max;
    }
    if let Some(mode) = args.render {
        config.render_mode = mode;
    }

    let policy = LexicographicReward::from_file(&args.objectives)
        .with_context(|| format!("loading objectives from {}", args.objectives.display()))?;
    info!(objectives = policy.objectives().len(), "objectives loaded");

    let mut env = NesEnv::from_rom(&args.rom, policy, config)
        .with_context(|| format!("starting environment for {}", args.rom.display()))?;
    env.reset(args.seed, None)?;

    let mut episode = 1u64;
    let mut episode_return = 0.0;
    let mut best_return = f64::NEG_INFINITY;
    for _ in 0..args.steps {
        let action = env.sample_action();
        let result = env.step(action)?;
        episode_return += result.reward;
        if result.terminated || result.truncated {
            info!(
                episode,
                steps = env.frame_count(),
                episode_return,
                truncated = result.truncated,
                "episode finished"
            );
            best_return = best_return.max(episode_return);
            episode += 1;
            episode_return = 0.0;
            env.reset(None, None)?;
        }
    }
    info!(
        episodes = episode - 1,
        best_return,
        partial_return = episode_return,
        total_frames = env.console().total_frames(),
        "run complete"
    );
    Ok(())
}

// =============================================================================
// RAM explorer
// =============================================================================

fn ram(args: &RamArgs) -> Result<()> {
    let engine = TetanesEmulator::new(&args.rom)
        .with_context(|| format!("loading {}", args.rom.display()))?;
    let mut console = Console::new(Box::new(engine));

    let watched: Vec<u16> = if args.addr.is_empty() {
        (0..RAM_SIZE as u16).collect()
    } else {
        args.addr.clone()
    };
    let mut last: Vec<u8> = watched.iter().map(|&addr| console.peek(addr)).collect();

    println!(" frame  addr     old -> new");
    for frame in 1..=args.frames {
        let buttons = if args.start_every > 0 && frame % args.start_every == 0 {
            Buttons::START
        } else {
            Buttons::NONE
        };
        console.frame_advance(buttons)?;
        for (&addr, old) in watched.iter().zip(last.iter_mut()) {
            let val = console.peek(addr);
            if val != *old {
                println!("{frame:>6}  0x{addr:04X}  {old:>3} -> {val:>3}");
                *old = val;
            }
        }
    }
    Ok(())
}

// =============================================================================
// Main
// =============================================================================

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run(args) => run(args),
        Commands::Ram(args) => ram(args),
    }
}
