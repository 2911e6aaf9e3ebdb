#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless runner that plays a scripted Hearthguard run and logs its events.

mod autopilot;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use hearthguard_core::{Command, Event, Phase, ProfileSnapshot};
use hearthguard_simulation::{Simulation, SimulationConfig};
use log::{debug, info, warn};

use crate::autopilot::Autopilot;

/// Command-line options for the headless runner.
#[derive(Debug, Parser)]
#[command(name = "hearthguard", about = "Run a scripted Hearthguard defence without a renderer")]
struct Cli {
    /// TOML file overriding the default run configuration
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Seed replacing the configured one
    #[arg(long)]
    seed: Option<u64>,
    /// Simulated seconds to run before stopping
    #[arg(long, default_value_t = 900.0)]
    seconds: f32,
    /// Length of one tick in milliseconds
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    anyhow::ensure!(cli.tick_ms > 0, "tick length must be positive");
    anyhow::ensure!(
        cli.seconds.is_finite() && cli.seconds > 0.0,
        "run length must be positive"
    );

    let mut simulation = Simulation::new(config, &ProfileSnapshot::default())
        .context("configuration rejected")?;
    run(&mut simulation, Duration::from_millis(cli.tick_ms), cli.seconds)?;
    print_summary(&simulation);
    Ok(())
}

fn run(simulation: &mut Simulation, tick: Duration, seconds: f32) -> Result<()> {
    let mut autopilot = Autopilot::default();
    let mut events = Vec::new();
    simulation.apply(Command::StartGame, &mut events);
    simulation.apply(Command::FinishLoading, &mut events);
    let mut plan_pending = true;

    let budget = Duration::try_from_secs_f32(seconds).context("run length out of range")?;
    let mut elapsed = Duration::ZERO;
    while elapsed < budget && !simulation.world().phase.is_terminal() {
        if plan_pending {
            for command in autopilot.plan_day(simulation.world()) {
                simulation.apply(command, &mut events);
            }
            plan_pending = false;
        }
        if simulation.world().phase == Phase::Day {
            simulation.apply(Autopilot::steer(simulation.world()), &mut events);
        }

        simulation.tick(tick, &mut events);
        elapsed += tick;

        for event in events.drain(..) {
            if event == (Event::PhaseChanged { phase: Phase::Day }) {
                plan_pending = true;
            }
            report(&event);
        }
    }
    Ok(())
}

fn report(event: &Event) {
    match event {
        Event::PhaseChanged { phase } => info!("phase: {phase:?}"),
        Event::WaveStarted {
            wave,
            enemies,
            boss,
        } => info!("wave {wave}: {enemies} enemies, bosses {boss:?}"),
        Event::Message { text } => info!("{text}"),
        Event::ActionRejected { reason } => warn!("action rejected: {reason}"),
        Event::GameOver { delta } | Event::Victory { delta } => info!(
            "run over: score {}, wave {}, {} skill points earned",
            delta.score, delta.wave_reached, delta.skill_points_earned
        ),
        other => debug!("{other:?}"),
    }
}

fn print_summary(simulation: &Simulation) {
    let snapshot = simulation.snapshot();
    println!("phase:    {:?}", snapshot.phase);
    println!("wave:     {}", snapshot.wave);
    println!("score:    {}", snapshot.score);
    println!(
        "base:     {:.0}/{:.0}",
        snapshot.base_health, snapshot.base_max_health
    );
    println!(
        "stock:    {} wood, {} stone, {} gold",
        snapshot.stockpile.wood, snapshot.stockpile.stone, snapshot.stockpile.gold
    );
    if let Some(delta) = simulation.outcome() {
        println!(
            "outcome:  {} ({} skill points)",
            if delta.victory { "victory" } else { "defeat" },
            delta.skill_points_earned
        );
    }
}
