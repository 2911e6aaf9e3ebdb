use std::time::Duration;

use glam::Vec2;
use hearthguard_core::{
    ActionError, BossFlag, BuildingKind, Command, EnemyKind, EntityId, Event, GridCell, HeroKind,
    MetaProgression, Phase, ProfileSnapshot, SkillId, Stockpile, TargetRef, WaveCount,
    WaveDefinition,
};
use hearthguard_simulation::{EntityKind, Simulation, SimulationConfig};
use hearthguard_system_waves::calculate_reward;
use hearthguard_world::{query, Enemy};

const TICK: Duration = Duration::from_millis(50);

fn single_wolf_config() -> SimulationConfig {
    SimulationConfig {
        grid_half_extent: 8,
        day_duration_secs: 1.0,
        final_wave: 1,
        night_end_delay_secs: 0.5,
        waves: vec![WaveDefinition {
            counts: vec![WaveCount {
                kind: EnemyKind::Wolf,
                count: 1,
            }],
            delay_secs: 0.5,
            boss: BossFlag::None,
        }],
        ..SimulationConfig::default()
    }
}

fn started(config: SimulationConfig) -> (Simulation, Vec<Event>) {
    let mut simulation =
        Simulation::new(config, &ProfileSnapshot::default()).expect("valid config");
    let mut events = Vec::new();
    simulation.apply(Command::StartGame, &mut events);
    simulation.apply(Command::FinishLoading, &mut events);
    (simulation, events)
}

/// A long day on a roomy grid with resources to spare.
fn open_field() -> (Simulation, Vec<Event>) {
    let (mut simulation, events) = started(SimulationConfig {
        grid_half_extent: 16,
        day_duration_secs: 600.0,
        ..single_wolf_config()
    });
    simulation.world_mut().stockpile = Stockpile::new(10_000, 10_000, 10_000);
    (simulation, events)
}

fn build(simulation: &mut Simulation, kind: BuildingKind, cell: GridCell) -> EntityId {
    let mut events = Vec::new();
    simulation.apply(Command::Build { kind, cell }, &mut events);
    query::building_at(simulation.world(), cell)
        .map(|building| building.id)
        .expect("building placed")
}

fn release(simulation: &mut Simulation, kind: EnemyKind, position: Vec2) -> EntityId {
    let world = simulation.world_mut();
    world.phase = Phase::Night;
    let id = world.allocate_id();
    world.enemies.push(Enemy::new(id, kind, position));
    id
}

fn enemy(simulation: &Simulation, id: EntityId) -> &Enemy {
    simulation
        .world()
        .enemies
        .iter()
        .find(|enemy| enemy.id == id)
        .expect("enemy alive")
}

fn run_until(
    simulation: &mut Simulation,
    events: &mut Vec<Event>,
    max_ticks: usize,
    done: impl Fn(&Simulation) -> bool,
) -> bool {
    for _ in 0..max_ticks {
        if done(simulation) {
            return true;
        }
        simulation.tick(TICK, events);
    }
    done(simulation)
}

#[test]
fn phases_advance_from_menu_to_night() {
    let mut simulation =
        Simulation::new(single_wolf_config(), &ProfileSnapshot::default()).expect("valid");
    let mut events = Vec::new();
    assert_eq!(simulation.world().phase, Phase::Menu);

    simulation.tick(TICK, &mut events);
    assert_eq!(simulation.world().elapsed, Duration::ZERO);

    simulation.apply(Command::StartGame, &mut events);
    assert_eq!(simulation.world().phase, Phase::Loading);
    simulation.apply(Command::FinishLoading, &mut events);
    assert_eq!(simulation.world().phase, Phase::Day);
    assert_eq!(simulation.world().wave, 1);
    assert!(!simulation.world().resources.is_empty());
    assert_eq!(simulation.snapshot().partners.len(), 2);

    events.clear();
    assert!(run_until(&mut simulation, &mut events, 40, |sim| {
        sim.world().phase == Phase::Night
    }));
    assert!(events.contains(&Event::WaveStarted {
        wave: 1,
        enemies: 1,
        boss: BossFlag::None,
    }));
    assert!(events.contains(&Event::PhaseChanged {
        phase: Phase::Night
    }));
    assert!(simulation.snapshot().partners.is_empty());
}

#[test]
fn defended_final_wave_ends_in_victory() {
    let (mut simulation, mut events) = started(single_wolf_config());
    simulation.apply(
        Command::Recruit {
            kind: HeroKind::Archer,
        },
        &mut events,
    );
    simulation.apply(
        Command::Recruit {
            kind: HeroKind::Knight,
        },
        &mut events,
    );
    simulation.apply(
        Command::Build {
            kind: BuildingKind::Tower,
            cell: GridCell::new(2, 2),
        },
        &mut events,
    );
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::ActionRejected { .. })));

    assert!(run_until(&mut simulation, &mut events, 4_000, |sim| {
        sim.world().phase.is_terminal()
    }));

    assert_eq!(simulation.world().phase, Phase::Victory);
    let delta = *simulation.outcome().expect("run ended");
    assert!(delta.victory);
    assert_eq!(delta.wave_reached, 1);
    assert_eq!(
        delta.skill_points_earned,
        calculate_reward(delta.score, 1, true)
    );
    assert!(events.contains(&Event::WaveCleared { wave: 1 }));
    assert!(events.contains(&Event::Victory { delta }));
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::EnemyKilled { kind: EnemyKind::Wolf, .. })));

    let elapsed = simulation.world().elapsed;
    simulation.tick(TICK, &mut events);
    assert_eq!(simulation.world().elapsed, elapsed);
}

#[test]
fn fallen_base_ends_in_game_over() {
    let (mut simulation, mut events) = started(single_wolf_config());
    assert!(run_until(&mut simulation, &mut events, 40, |sim| {
        sim.world().phase == Phase::Night
    }));

    simulation.world_mut().base.health = 0.0;
    simulation.tick(TICK, &mut events);

    assert_eq!(simulation.world().phase, Phase::GameOver);
    let delta = *simulation.outcome().expect("run ended");
    assert!(!delta.victory);
    assert_eq!(
        delta.skill_points_earned,
        calculate_reward(delta.score, 1, false)
    );
    assert!(events.contains(&Event::GameOver { delta }));
}

#[test]
fn building_is_rejected_at_night() {
    let (mut simulation, mut events) = started(single_wolf_config());
    assert!(run_until(&mut simulation, &mut events, 40, |sim| {
        sim.world().phase == Phase::Night
    }));
    let stockpile = simulation.world().stockpile;
    events.clear();

    simulation.apply(
        Command::Build {
            kind: BuildingKind::Wall,
            cell: GridCell::new(4, 4),
        },
        &mut events,
    );

    assert!(events.contains(&Event::ActionRejected {
        reason: ActionError::InvalidPhase {
            phase: Phase::Night
        },
    }));
    assert_eq!(simulation.world().stockpile, stockpile);
    assert!(simulation.world().buildings.is_empty());
}

#[test]
fn cleared_wave_returns_to_day_with_next_wave() {
    let config = SimulationConfig {
        final_wave: 3,
        ..single_wolf_config()
    };
    let (mut simulation, mut events) = started(config);
    assert!(run_until(&mut simulation, &mut events, 40, |sim| {
        sim.world().phase == Phase::Night && sim.spawns_remaining() == 0
    }));

    for enemy in &mut simulation.world_mut().enemies {
        enemy.health = 0.0;
    }
    assert!(run_until(&mut simulation, &mut events, 40, |sim| {
        sim.world().phase == Phase::Day
    }));

    assert_eq!(simulation.world().wave, 2);
    assert!(events.contains(&Event::WaveCleared { wave: 1 }));
    assert_eq!(simulation.snapshot().partners.len(), 2);
    assert!(simulation.world().score > 0);
}

#[test]
fn huts_send_out_collectors() {
    let config = SimulationConfig {
        day_duration_secs: 60.0,
        ..single_wolf_config()
    };
    let (mut simulation, mut events) = started(config);
    simulation.apply(
        Command::Build {
            kind: BuildingKind::Hut,
            cell: GridCell::new(-3, 3),
        },
        &mut events,
    );

    assert!(run_until(&mut simulation, &mut events, 500, |sim| {
        !sim.world().collectors.is_empty()
    }));
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::CollectorSpawned { .. })));
    assert_eq!(simulation.snapshot().collectors.len(), 1);
}

#[test]
fn player_gathers_nearby_nodes() {
    let (mut simulation, mut events) = started(single_wolf_config());
    simulation.world_mut().resources.truncate(1);
    let node = simulation.world().resources[0].clone();
    let before = simulation.world().stockpile.total();
    simulation.world_mut().player.position = node.position;

    simulation.tick(TICK, &mut events);

    assert_eq!(simulation.world().stockpile.total(), before + node.amount);
    assert!(events.contains(&Event::ResourcesGathered {
        kind: node.kind,
        amount: node.amount,
    }));
}

#[test]
fn day_length_skill_extends_the_day() {
    let profile = ProfileSnapshot {
        meta: MetaProgression {
            skill_points: 1,
            ..MetaProgression::default()
        },
        ..ProfileSnapshot::default()
    };
    let config = SimulationConfig {
        day_duration_secs: 10.0,
        ..single_wolf_config()
    };
    let mut simulation = Simulation::new(config, &profile).expect("valid config");
    let mut events = Vec::new();
    simulation.apply(Command::StartGame, &mut events);
    simulation.apply(Command::FinishLoading, &mut events);
    simulation.apply(
        Command::UpgradeSkill {
            skill: SkillId::DayLength,
        },
        &mut events,
    );

    let bonus = simulation.world().effects.day_length_secs;
    assert!(bonus > 0.0);
    assert!(simulation.snapshot().day_remaining_secs > 10.0);
}

#[test]
fn snapshot_lists_entities_by_kind() {
    let (mut simulation, mut events) = started(single_wolf_config());
    simulation.apply(
        Command::Recruit {
            kind: HeroKind::Tank,
        },
        &mut events,
    );
    simulation.apply(
        Command::Build {
            kind: BuildingKind::Wall,
            cell: GridCell::new(5, 5),
        },
        &mut events,
    );

    let snapshot = simulation.snapshot();
    let kinds: Vec<EntityKind> = snapshot.entities.iter().map(|entity| entity.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EntityKind::Defender(HeroKind::Tank),
            EntityKind::Building(BuildingKind::Wall),
        ]
    );
    assert_eq!(snapshot.base_health_fraction(), 1.0);
    assert_eq!(snapshot.phase, Phase::Day);
}

#[test]
fn building_rusher_keeps_its_spawn_objective() {
    let (mut simulation, mut events) = open_field();
    let hut = build(&mut simulation, BuildingKind::Hut, GridCell::new(-6, 0));
    let boar = release(&mut simulation, EnemyKind::Boar, Vec2::new(30.0, 0.0));
    if let Some(enemy) = simulation.world_mut().enemies.last_mut() {
        enemy.original_target = Some(hut);
        enemy.target_building = Some(hut);
    }

    for _ in 0..30 {
        simulation.tick(TICK, &mut events);
        let enemy = enemy(&simulation, boar);
        assert_eq!(enemy.target_building, Some(hut));
        assert_eq!(enemy.current_target, Some(TargetRef::Building(hut)));
    }
    assert!(enemy(&simulation, boar).position.x < 30.0);
}

#[test]
fn ground_enemies_walk_around_walls() {
    let (mut simulation, mut events) = open_field();
    for gz in -2..=2 {
        let _ = build(&mut simulation, BuildingKind::Wall, GridCell::new(4, gz));
    }
    let wolf = release(&mut simulation, EnemyKind::Wolf, Vec2::new(20.0, 0.0));

    let mut widest = 0.0_f32;
    for _ in 0..800 {
        if simulation.world().base.health < simulation.world().base.max_health {
            break;
        }
        simulation.tick(TICK, &mut events);
        widest = widest.max(enemy(&simulation, wolf).position.y.abs());
    }

    assert!(simulation.world().base.health < simulation.world().base.max_health);
    assert!(widest >= 4.0, "wolf cut through the wall line (widest {widest})");
    assert!(simulation
        .world()
        .buildings
        .iter()
        .all(|wall| wall.health == wall.max_health));
}

#[test]
fn sealed_base_is_breached_through_the_nearest_wall() {
    let (mut simulation, mut events) = open_field();
    let mut gate = None;
    for gx in -3..=3_i32 {
        for gz in -3..=3_i32 {
            if gx.abs().max(gz.abs()) != 3 {
                continue;
            }
            let id = build(&mut simulation, BuildingKind::Wall, GridCell::new(gx, gz));
            if (gx, gz) == (3, 0) {
                gate = Some(id);
            }
        }
    }
    let gate = gate.expect("ring includes the east wall");
    let wolf = release(&mut simulation, EnemyKind::Wolf, Vec2::new(20.0, 0.0));

    assert!(run_until(&mut simulation, &mut events, 800, |sim| {
        query::building(sim.world(), gate).map_or(true, |wall| wall.health < wall.max_health)
    }));
    assert_eq!(enemy(&simulation, wolf).target_building, Some(gate));

    for _ in 0..40 {
        simulation.tick(TICK, &mut events);
        if query::building(simulation.world(), gate).is_none() {
            break;
        }
        assert_eq!(enemy(&simulation, wolf).target_building, Some(gate));
    }
    assert_eq!(simulation.world().base.health, simulation.world().base.max_health);
}
