#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-order simulation driver.
//!
//! [`Simulation`] owns the world together with every system and advances them
//! in a fixed order each tick: timers and weather, player and partners, the
//! economy, then during the night spawning, enemy AI, hero AI, towers,
//! projectiles, death cleanup and the wave completion check. All randomness
//! flows from one seeded generator, so two runs fed the same commands and tick
//! lengths produce identical events.

mod ai;
pub mod config;
mod economy;
pub mod snapshot;

use std::{f32::consts::TAU, time::Duration};

use glam::Vec2;
use hearthguard_core::{
    BossFlag, BuildingKind, Command, EnemyKind, EntityId, Event, HeroKind, MetaProgressionDelta,
    Phase, ProfileSnapshot, SoundCue, TargetRef, Weather, CELL_SIZE,
};
use hearthguard_system_combat::{advance_projectiles, process_tower_attack};
use hearthguard_system_pathfinding::Pathfinder;
use hearthguard_system_threat::ThreatSystem;
use hearthguard_system_waves::{
    calculate_reward, create_wave_spawn_queue, wave_definition, WaveSpawner,
};
use hearthguard_world::{query, Enemy, Projectile, ProjectileSpawn, World};
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use config::{ConfigError, SimulationConfig};
pub use snapshot::{EntityKind, EntitySnapshot, SimulationSnapshot};

use ai::{Battlefield, Tick};

/// Base health fraction below which rage mode switches on.
pub const RAGE_THRESHOLD: f32 = 0.25;

const COMBO_MULTIPLIER_STEP: f32 = 0.1;
const COMBO_MULTIPLIER_CAP: u32 = 10;
const SPAWN_RING_INSET: i32 = 2;

/// One run of the game, from the menu to its terminal phase.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    world: World,
    pathfinder: Pathfinder,
    threat: ThreatSystem,
    spawner: WaveSpawner,
    rng: ChaCha8Rng,
    max_tick: Duration,
    day_timer: f32,
    weather_timer: f32,
    combo_timer: f32,
    night_end_timer: Option<f32>,
    path_revision: u64,
    spawn_buffer: Vec<EnemyKind>,
    projectile_buffer: Vec<ProjectileSpawn>,
    outcome: Option<MetaProgressionDelta>,
}

impl Simulation {
    /// Creates a run in the menu phase.
    ///
    /// The profile supplies skill levels and unspent skill points carried over
    /// from earlier runs.
    pub fn new(config: SimulationConfig, profile: &ProfileSnapshot) -> Result<Self, ConfigError> {
        config.validate()?;
        let world = World::new(config.world_settings(), profile);
        let max_tick = config.max_tick();
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            path_revision: world.walls.revision(),
            config,
            world,
            pathfinder: Pathfinder::default(),
            threat: ThreatSystem::default(),
            spawner: WaveSpawner::new(),
            max_tick,
            day_timer: 0.0,
            weather_timer: 0.0,
            combo_timer: 0.0,
            night_end_timer: None,
            spawn_buffer: Vec::new(),
            projectile_buffer: Vec::new(),
            outcome: None,
        })
    }

    /// Configuration the run was created with.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Authoritative world state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for scenario setup.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Progress reported when the run ended, if it has.
    #[must_use]
    pub fn outcome(&self) -> Option<&MetaProgressionDelta> {
        self.outcome.as_ref()
    }

    /// Enemies still waiting to spawn this night.
    #[must_use]
    pub fn spawns_remaining(&self) -> usize {
        self.spawner.remaining()
    }

    /// Number of cached path results.
    #[must_use]
    pub fn cached_paths(&self) -> usize {
        self.pathfinder.cache_len()
    }

    /// Applies a player command, broadcasting its events.
    pub fn apply(&mut self, command: Command, out_events: &mut Vec<Event>) {
        let previous = self.world.phase;
        hearthguard_world::apply(&mut self.world, command, out_events);
        if previous == Phase::Loading && self.world.phase == Phase::Day {
            self.begin_run(out_events);
        }
        self.sync_path_cache();
    }

    /// Advances the run by `dt`, capped at the configured maximum tick.
    ///
    /// Does nothing outside the day and night phases.
    pub fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if !self.world.phase.is_running() {
            return;
        }
        let dt = dt.min(self.max_tick);
        let dt_secs = dt.as_secs_f32();
        if dt_secs <= 0.0 {
            return;
        }
        self.world.elapsed = self.world.elapsed.saturating_add(dt);

        self.update_timers(dt_secs, out_events);
        economy::move_player(&mut self.world, dt_secs);
        economy::gather(&mut self.world, out_events);
        economy::update_resources(&mut self.world, &mut self.rng, dt_secs);
        economy::update_collectors(&mut self.world, dt_secs, out_events);
        economy::spawn_collectors(&mut self.world, dt_secs, out_events);

        if self.world.phase == Phase::Night {
            self.night_tick(dt, dt_secs, out_events);
        }
    }

    /// Captures the state presentation layers need for one frame.
    #[must_use]
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot::capture(&self.world, self.day_remaining(), self.spawner.remaining())
    }

    fn day_length(&self) -> f32 {
        self.config.day_duration_secs + self.world.effects.day_length_secs
    }

    fn day_remaining(&self) -> f32 {
        if self.world.phase == Phase::Day {
            (self.day_length() - self.day_timer).max(0.0)
        } else {
            0.0
        }
    }

    fn begin_run(&mut self, out_events: &mut Vec<Event>) {
        economy::seed_resources(&mut self.world, &mut self.rng);
        self.day_timer = 0.0;
        self.roll_weather(out_events);
        info!(
            "run started: seed {:#x}, {} waves, {} resource nodes",
            self.config.seed,
            self.config.final_wave,
            self.world.resources.len()
        );
    }

    fn sync_path_cache(&mut self) {
        let revision = self.world.walls.revision();
        if revision != self.path_revision {
            self.pathfinder.clear_cache();
            self.path_revision = revision;
            debug!("wall grid changed, path cache cleared at revision {revision}");
        }
    }

    fn roll_weather(&mut self, out_events: &mut Vec<Event>) {
        self.weather_timer = 0.0;
        let weather = Weather::ALL[self.rng.gen_range(0..Weather::ALL.len())];
        if weather != self.world.weather {
            self.world.weather = weather;
            debug!("weather is now {weather:?}");
            out_events.push(Event::WeatherChanged { weather });
        }
    }

    fn update_timers(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        self.weather_timer += dt;
        if self.weather_timer >= self.config.weather_interval_secs {
            self.roll_weather(out_events);
        }

        if self.world.combo > 0 {
            self.combo_timer -= dt;
            if self.combo_timer <= 0.0 {
                self.world.combo = 0;
                out_events.push(Event::ComboChanged { combo: 0 });
            }
        }

        if self.world.phase == Phase::Day {
            self.day_timer += dt;
            if self.day_timer >= self.day_length() {
                self.start_night(out_events);
            }
        }
    }

    fn start_night(&mut self, out_events: &mut Vec<Event>) {
        let wave = self.world.wave;
        let queue = create_wave_spawn_queue(&self.config.waves, wave, &mut self.rng);
        let (delay_secs, boss) = wave_definition(&self.config.waves, wave)
            .map_or((0.0, BossFlag::None), |definition| {
                (definition.delay_secs, definition.boss)
            });
        let enemies = u32::try_from(queue.len()).unwrap_or(u32::MAX);
        self.spawner.start(queue, delay_secs);
        self.night_end_timer = None;
        self.day_timer = 0.0;

        self.world.phase = Phase::Night;
        for partner in &mut self.world.partners {
            partner.visible = false;
        }
        self.roll_weather(out_events);

        info!("night {wave} falls with {enemies} enemies, bosses: {boss:?}");
        out_events.push(Event::PhaseChanged {
            phase: Phase::Night,
        });
        out_events.push(Event::WaveStarted {
            wave,
            enemies,
            boss,
        });
        out_events.push(Event::Sound { cue: SoundCue::Dusk });
    }

    fn night_tick(&mut self, dt: Duration, dt_secs: f32, out_events: &mut Vec<Event>) {
        self.spawner.advance(dt, &mut self.spawn_buffer);
        let spawns = std::mem::take(&mut self.spawn_buffer);
        for &kind in &spawns {
            self.spawn_enemy(kind, out_events);
        }
        self.spawn_buffer = spawns;
        self.spawn_buffer.clear();

        let destroyed = self.run_combat(dt_secs, out_events);
        self.cleanup(&destroyed, out_events);
        self.update_rage(out_events);

        if self.world.base.health <= 0.0 {
            self.end_run(false, out_events);
            return;
        }
        self.check_wave_clear(dt_secs, out_events);
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, out_events: &mut Vec<Event>) {
        let radius = (self.world.walls.half_extent() - SPAWN_RING_INSET) as f32 * CELL_SIZE;
        let angle = self.rng.gen_range(0.0..TAU);
        let position = self.world.base.position + Vec2::from_angle(angle) * radius;
        let id = self.world.allocate_id();
        let mut enemy = Enemy::new(id, kind, position);

        let profile = enemy.profile();
        if profile.targets_buildings {
            if let Some(structure) = query::nearest_structure(&self.world, position) {
                enemy.original_target = Some(structure.id);
                enemy.target_building = Some(structure.id);
            }
        }
        if profile.boss {
            out_events.push(Event::Sound {
                cue: SoundCue::BossRoar,
            });
            out_events.push(Event::Message {
                text: format!("{kind:?} has entered the field"),
            });
        }

        debug!("spawned {kind:?} {id:?} at {position}");
        out_events.push(Event::EnemySpawned { id, kind });
        self.world.enemies.push(enemy);
    }

    /// Runs enemy, hero, tower and projectile resolution for one tick.
    fn run_combat(&mut self, dt: f32, out_events: &mut Vec<Event>) -> Vec<EntityId> {
        let World {
            enemies,
            defenders,
            buildings,
            base,
            walls,
            projectiles,
            effects,
            weather,
            rage_active,
            elapsed,
            ..
        } = &mut self.world;
        let tick = Tick {
            weather: *weather,
            rage_active: *rage_active,
            effects: &*effects,
            now: *elapsed,
            dt,
        };

        let destroyed = ai::update_enemies(
            Battlefield {
                enemies: enemies.as_mut_slice(),
                defenders: defenders.as_mut_slice(),
                buildings: buildings.as_mut_slice(),
                base,
                walls: &*walls,
            },
            &mut self.pathfinder,
            &mut self.threat,
            tick,
            out_events,
        );

        ai::update_defenders(
            defenders,
            enemies,
            &self.threat,
            tick,
            &mut self.rng,
            &mut self.projectile_buffer,
            out_events,
        );

        let ctx = tick.combat(&self.threat);
        for tower in buildings
            .iter_mut()
            .filter(|building| building.kind == BuildingKind::Tower)
        {
            process_tower_attack(tower, enemies, &ctx, &mut self.projectile_buffer);
        }
        projectiles.extend(self.projectile_buffer.drain(..).map(Projectile::launch));
        advance_projectiles(projectiles, enemies, &ctx);

        destroyed
    }

    fn cleanup(&mut self, destroyed: &[EntityId], out_events: &mut Vec<Event>) {
        let (dead, alive): (Vec<Enemy>, Vec<Enemy>) = std::mem::take(&mut self.world.enemies)
            .into_iter()
            .partition(|enemy| !enemy.is_alive());
        self.world.enemies = alive;
        for enemy in &dead {
            self.record_kill(enemy, out_events);
        }

        let mut fallen: Vec<(EntityId, HeroKind)> = Vec::new();
        self.world.defenders.retain(|defender| {
            if defender.is_alive() {
                return true;
            }
            fallen.push((defender.id, defender.kind));
            false
        });
        for (id, kind) in fallen {
            let target = TargetRef::Defender(id);
            for enemy in &mut self.world.enemies {
                let _ = enemy.threat_table.remove(&target);
                if enemy.current_target == Some(target) {
                    enemy.current_target = None;
                }
            }
            debug!("{kind:?} {id:?} fell");
            out_events.push(Event::DefenderKilled { id, kind });
        }

        for &id in destroyed {
            if let Some(building) = self.world.remove_building(id) {
                debug!("{:?} {id:?} destroyed at {:?}", building.kind, building.cell);
                out_events.push(Event::BuildingDestroyed {
                    id,
                    kind: building.kind,
                    cell: building.cell,
                });
            }
        }
        self.sync_path_cache();
    }

    fn record_kill(&mut self, enemy: &Enemy, out_events: &mut Vec<Event>) {
        let profile = enemy.profile();
        self.world.combo = self.world.combo.saturating_add(1);
        self.combo_timer = self.config.combo_window_secs;

        let bonus = self.world.combo.min(COMBO_MULTIPLIER_CAP) as f32 * COMBO_MULTIPLIER_STEP;
        let score = (profile.score as f32 * (1.0 + bonus)).round() as u32;
        self.world.score = self.world.score.saturating_add(score);
        self.world.stockpile.gold = self.world.stockpile.gold.saturating_add(profile.bounty);
        if profile.boss {
            self.world.bosses_killed = self.world.bosses_killed.saturating_add(1);
        }

        debug!(
            "{:?} {:?} killed for {score} points, combo {}",
            enemy.kind, enemy.id, self.world.combo
        );
        out_events.push(Event::EnemyKilled {
            id: enemy.id,
            kind: enemy.kind,
            score,
        });
        out_events.push(Event::Sound {
            cue: SoundCue::EnemyDeath,
        });
        out_events.push(Event::ComboChanged {
            combo: self.world.combo,
        });
    }

    fn update_rage(&mut self, out_events: &mut Vec<Event>) {
        let active = self.world.base.health_fraction() < RAGE_THRESHOLD;
        if active != self.world.rage_active {
            self.world.rage_active = active;
            info!("rage mode {}", if active { "on" } else { "off" });
            out_events.push(Event::RageModeChanged { active });
        }
    }

    fn check_wave_clear(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        if !self.spawner.is_empty() || !self.world.enemies.is_empty() {
            return;
        }
        let remaining = match self.night_end_timer {
            Some(remaining) => remaining - dt,
            None => {
                let wave = self.world.wave;
                info!("wave {wave} cleared");
                out_events.push(Event::WaveCleared { wave });
                out_events.push(Event::Message {
                    text: format!("Wave {wave} repelled"),
                });
                self.config.night_end_delay_secs
            }
        };
        if remaining > 0.0 {
            self.night_end_timer = Some(remaining);
            return;
        }

        self.night_end_timer = None;
        if self.world.wave >= self.config.final_wave {
            self.end_run(true, out_events);
        } else {
            self.dawn(out_events);
        }
    }

    fn dawn(&mut self, out_events: &mut Vec<Event>) {
        self.world.wave = self.world.wave.saturating_add(1);
        self.world.phase = Phase::Day;
        self.day_timer = 0.0;
        self.world.projectiles.clear();
        economy::regenerate_resources(&mut self.world);

        let regen = self.world.effects.fortress_regen;
        if regen > 0.0 {
            let base = &mut self.world.base;
            base.health = (base.health + regen).min(base.max_health);
        }
        self.update_rage(out_events);
        for partner in &mut self.world.partners {
            partner.visible = true;
        }
        self.roll_weather(out_events);

        let wave = self.world.wave;
        info!("dawn, wave {wave} is next");
        out_events.push(Event::PhaseChanged { phase: Phase::Day });
        out_events.push(Event::Sound { cue: SoundCue::Dawn });
        out_events.push(Event::Message {
            text: format!("Dawn breaks. Prepare for wave {wave}"),
        });
    }

    fn end_run(&mut self, victory: bool, out_events: &mut Vec<Event>) {
        let world = &mut self.world;
        let reward = calculate_reward(world.score, world.wave, victory);
        let delta = MetaProgressionDelta {
            victory,
            score: world.score,
            wave_reached: world.wave,
            resources_gathered: world.resources_gathered,
            bosses_killed: world.bosses_killed,
            skill_points_earned: reward,
            skill_points_spent: world.skill_points_spent,
        };
        world.phase = if victory {
            Phase::Victory
        } else {
            Phase::GameOver
        };
        self.spawner.clear();
        self.night_end_timer = None;
        self.outcome = Some(delta);

        info!(
            "run ended in {} at wave {} with score {}, {reward} skill points earned",
            if victory { "victory" } else { "defeat" },
            delta.wave_reached,
            delta.score
        );
        out_events.push(Event::PhaseChanged {
            phase: self.world.phase,
        });
        if victory {
            out_events.push(Event::Victory { delta });
            out_events.push(Event::Sound {
                cue: SoundCue::Victory,
            });
        } else {
            out_events.push(Event::GameOver { delta });
            out_events.push(Event::Sound {
                cue: SoundCue::Defeat,
            });
        }
    }
}
