mod app;
mod config;
mod display;
#[cfg(feature = "rpi")]
mod gpio;
mod logging;
mod sink;

use anyhow::{Context, Result};
use app::{App, RigSession};
use clap::{Parser, ValueHint};
use config::RigConfig;
use display::ScreenState;
use finchgate_experiment::{SessionController, SessionEvent, TrialCatalog};
use finchgate_timing::SystemTimer;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sink::DailyFileSink;
use std::io;
use std::path::PathBuf;
use tracing::{error, info};
use winit::event_loop::EventLoop;

#[derive(Parser)]
#[command(author, version, about = "Zebra finch flight rig: cue display and gate recorder")]
struct Cli {
    /// Rig configuration file [default: rig.toml if present]
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Seed the trial sequence, overriding the configuration file
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug keybinds (Tab next trial, 1/2/3 mimic the gates)
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = RigConfig::load_or_default(cli.config.as_deref())?;
    if cli.seed.is_some() {
        config.session.seed = cli.seed;
    }
    config.debug.keybinds |= cli.debug;

    let log_file = logging::init(&config.logging, &config.paths.log_path)?;
    info!("Logging to {}", log_file.display());

    let result = run(&config);
    if let Err(e) = &result {
        error!("{e:#}");
    }
    if config.debug.hold_on_exit {
        println!("Press Enter to exit");
        let _ = io::stdin().read_line(&mut String::new());
    }
    result
}

fn run(config: &RigConfig) -> Result<()> {
    let timer = SystemTimer::new();
    let session = start_session(config, timer.clone())?;

    let event_loop = EventLoop::<SessionEvent>::with_user_event().build()?;

    #[cfg(feature = "rpi")]
    let _gates = gpio::watch(&config.gates, event_loop.create_proxy())?;
    #[cfg(not(feature = "rpi"))]
    if !config.debug.keybinds {
        tracing::warn!("Built without GPIO support and debug keybinds are off; no crossings can be recorded");
    }

    App::new(session, timer, config.debug.keybinds).run(event_loop)
}

/// Validates the catalog before anything touches the data directory, then
/// opens the day's data file and proposes the first obstacle.
fn start_session(config: &RigConfig, timer: SystemTimer) -> Result<RigSession> {
    let catalog = TrialCatalog::load(&config.catalog_source()?).context("trial catalog rejected")?;
    let sink = DailyFileSink::open(&config.paths.data_path).with_context(|| {
        format!(
            "cannot open the data file in {}",
            config.paths.data_path.display()
        )
    })?;
    let rng = match config.session.seed {
        Some(seed) => {
            info!("Trial selection seeded with {seed}");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };

    Ok(SessionController::new(
        catalog,
        ScreenState::new(timer.clone()),
        sink,
        timer,
        rng,
        config.session.clone(),
    ))
}
