use std::time::Duration;

use hearthguard_core::{
    BuildingKind, Command, Event, GridCell, HeroKind, Phase, ProfileSnapshot,
};
use hearthguard_simulation::{Simulation, SimulationConfig, SimulationSnapshot};

const TICK: Duration = Duration::from_millis(50);

#[test]
fn deterministic_replay_produces_identical_runs() {
    let first = replay(0xfeed);
    let second = replay(0xfeed);

    assert_eq!(first.events, second.events, "event log diverged between runs");
    assert_eq!(first.snapshot, second.snapshot, "final state diverged");

    assert!(first
        .events
        .iter()
        .any(|event| matches!(event, Event::EnemySpawned { .. })));
    assert!(first
        .events
        .iter()
        .any(|event| matches!(event, Event::PhaseChanged { phase: Phase::Night })));
}

struct ReplayOutcome {
    events: Vec<Event>,
    snapshot: SimulationSnapshot,
}

fn replay(seed: u64) -> ReplayOutcome {
    let config = SimulationConfig {
        seed,
        grid_half_extent: 10,
        day_duration_secs: 2.0,
        final_wave: 2,
        night_end_delay_secs: 1.0,
        ..SimulationConfig::default()
    };
    let mut simulation =
        Simulation::new(config, &ProfileSnapshot::default()).expect("valid config");
    let mut events = Vec::new();

    for command in scripted_commands() {
        simulation.apply(command, &mut events);
    }
    for step in 0..2_400 {
        if step == 10 {
            simulation.apply(Command::Move { x: 1.0, z: 0.5 }, &mut events);
        }
        simulation.tick(TICK, &mut events);
    }

    ReplayOutcome {
        events,
        snapshot: simulation.snapshot(),
    }
}

fn scripted_commands() -> Vec<Command> {
    vec![
        Command::StartGame,
        Command::FinishLoading,
        Command::Build {
            kind: BuildingKind::Tower,
            cell: GridCell::new(3, 0),
        },
        Command::Build {
            kind: BuildingKind::Wall,
            cell: GridCell::new(-3, 2),
        },
        Command::Build {
            kind: BuildingKind::Wall,
            cell: GridCell::new(-3, 3),
        },
        Command::Recruit {
            kind: HeroKind::Knight,
        },
        Command::Recruit {
            kind: HeroKind::Archer,
        },
    ]
}
