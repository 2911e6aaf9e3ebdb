#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combat resolution over entity records.
//!
//! Every function here works on the slices it is handed and keeps no state
//! between calls. Randomness comes from the caller's generator so runs replay
//! exactly from a seed.

use std::time::Duration;

use glam::Vec2;
use hearthguard_core::{
    EntityId, Event, HeroKind, SkillEffects, SoundCue, TargetRef, Weather,
};
use hearthguard_system_threat::ThreatSystem;
use hearthguard_world::{
    elevate, Base, Building, Defender, Enemy, ProjectileKind, ProjectileSpawn,
};
use log::debug;
use rand::Rng;

pub mod abilities;
pub mod projectiles;

pub use abilities::{ability_for, process_defender_ability, AbilityHandler, AbilityScope};
pub use projectiles::advance_projectiles;

/// Seconds between uses of a hero ability.
pub const ABILITY_COOLDOWN_SECS: f32 = 6.0;
/// Height projectiles are launched from.
pub const LAUNCH_HEIGHT: f32 = 1.0;
/// Radius of a bomber carrot's splash.
pub const SPLASH_RADIUS: f32 = 2.5;

const CRIT_MULTIPLIER: f32 = 2.0;
const TOWER_RANGE: f32 = 12.0;
const TOWER_DAMAGE: f32 = 15.0;
const TOWER_COOLDOWN_SECS: f32 = 1.5;
const BOSS_ATTACK_COOLDOWN_SECS: f32 = 1.0;
const ENEMY_ATTACK_COOLDOWN_SECS: f32 = 1.5;
const DEFENDER_REACH_MARGIN: f32 = 0.5;
const BUILDING_REACH_MARGIN: f32 = 1.0;

/// Per-tick inputs shared by every combat call.
#[derive(Clone, Copy, Debug)]
pub struct CombatContext<'a> {
    /// Active weather.
    pub weather: Weather,
    /// Whether the base is low enough to enable rage mode.
    pub rage_active: bool,
    /// Skill effects of the current run.
    pub effects: &'a SkillEffects,
    /// Simulation time at the start of the tick.
    pub now: Duration,
    /// Seconds advanced by the tick.
    pub dt: f32,
    /// Threat bookkeeping used to credit damage.
    pub threat: &'a ThreatSystem,
}

impl CombatContext<'_> {
    /// Attack range of a hero after weather modifiers.
    #[must_use]
    pub fn defender_range(&self, kind: HeroKind) -> f32 {
        kind.profile().range * self.weather.defender_range_factor()
    }

    /// Attack range of a tower after skill bonuses.
    #[must_use]
    pub fn tower_range(&self) -> f32 {
        TOWER_RANGE * (1.0 + self.effects.tower_range_pct / 100.0)
    }
}

/// Index of the living enemy nearest to `position` within `max_range`.
///
/// Exact distance ties resolve toward the lower entity id.
#[must_use]
pub fn find_nearest_enemy(enemies: &[Enemy], position: Vec2, max_range: f32) -> Option<usize> {
    enemies
        .iter()
        .enumerate()
        .filter(|(_, enemy)| enemy.is_alive())
        .map(|(index, enemy)| (index, enemy.position.distance(position), enemy.id))
        .filter(|(_, distance, _)| *distance <= max_range)
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.2.cmp(&b.2)))
        .map(|(index, _, _)| index)
}

/// Index of the living enemy with the least health; ties resolve by id.
#[must_use]
pub fn find_weakest_enemy(enemies: &[Enemy]) -> Option<usize> {
    enemies
        .iter()
        .enumerate()
        .filter(|(_, enemy)| enemy.is_alive())
        .min_by(|(_, a), (_, b)| a.health.total_cmp(&b.health).then(a.id.cmp(&b.id)))
        .map(|(index, _)| index)
}

/// Runs one hero's basic attack.
///
/// The hero keeps attacking its current target while it stays alive and in
/// range, otherwise it switches to the nearest enemy in range. Bombers launch a
/// splashing projectile instead of striking directly.
pub fn process_defender_attack<R: Rng + ?Sized>(
    defender: &mut Defender,
    enemies: &mut [Enemy],
    ctx: &CombatContext<'_>,
    rng: &mut R,
    out_projectiles: &mut Vec<ProjectileSpawn>,
    out_events: &mut Vec<Event>,
) {
    defender.attack_timer = (defender.attack_timer - ctx.dt).max(0.0);
    if !defender.is_alive() {
        return;
    }

    let range = ctx.defender_range(defender.kind);
    let current = defender.target.and_then(|id| {
        enemies.iter().position(|enemy| {
            enemy.id == id
                && enemy.is_alive()
                && enemy.position.distance(defender.position) <= range
        })
    });
    let Some(index) = current.or_else(|| find_nearest_enemy(enemies, defender.position, range))
    else {
        defender.target = None;
        return;
    };
    let enemy = &mut enemies[index];
    defender.target = Some(enemy.id);

    if defender.attack_timer > 0.0 {
        return;
    }
    let profile = defender.profile();
    defender.attack_timer = profile.attack_cooldown;

    let mut damage = defender.damage;
    if ctx.rage_active {
        damage *= 1.0 + ctx.effects.rage_bonus_pct / 100.0;
    }
    let crit_chance = profile.crit_chance + ctx.effects.crit_chance;
    if rng.gen::<f32>() < crit_chance {
        damage *= CRIT_MULTIPLIER;
        debug!("{:?} {:?} crit for {damage}", defender.kind, defender.id);
        out_events.push(Event::CriticalHit {
            position: enemy.position,
        });
        out_events.push(Event::Sound {
            cue: SoundCue::Critical,
        });
    }

    let source = TargetRef::Defender(defender.id);
    if defender.kind == HeroKind::Bomber {
        out_projectiles.push(ProjectileSpawn {
            kind: ProjectileKind::Carrot,
            origin: elevate(defender.position, LAUNCH_HEIGHT),
            target: elevate(enemy.position, enemy.collision_height()),
            damage,
            splash_radius: SPLASH_RADIUS,
            source: Some(source),
        });
    } else {
        enemy.take_damage(damage);
        ctx.threat.add_threat(enemy, source, damage, ctx.now);
    }
}

/// Runs one tower's attack, launching an arrow at the nearest enemy in range.
pub fn process_tower_attack(
    tower: &mut Building,
    enemies: &[Enemy],
    ctx: &CombatContext<'_>,
    out_projectiles: &mut Vec<ProjectileSpawn>,
) {
    tower.attack_timer = (tower.attack_timer - ctx.dt).max(0.0);
    if tower.attack_timer > 0.0 || !tower.is_alive() {
        return;
    }
    let origin = tower.position();
    let Some(index) = find_nearest_enemy(enemies, origin, ctx.tower_range()) else {
        return;
    };
    let enemy = &enemies[index];
    tower.attack_timer = TOWER_COOLDOWN_SECS;
    out_projectiles.push(ProjectileSpawn {
        kind: ProjectileKind::Arrow,
        origin: elevate(origin, LAUNCH_HEIGHT),
        target: elevate(enemy.position, enemy.collision_height()),
        damage: TOWER_DAMAGE * (1.0 + ctx.effects.tower_damage_pct / 100.0),
        splash_radius: 0.0,
        source: Some(TargetRef::Building(tower.id)),
    });
}

/// Distance from which an enemy can strike the target.
#[must_use]
pub fn enemy_reach(enemy: &Enemy, target: TargetRef) -> f32 {
    let range = enemy.profile().attack_range;
    match target {
        TargetRef::Defender(_) => range + DEFENDER_REACH_MARGIN,
        TargetRef::Building(_) => range + BUILDING_REACH_MARGIN,
        TargetRef::Base => range + Base::RADIUS,
    }
}

/// What an enemy attack struck.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttackOutcome {
    /// A hero was hit.
    Defender {
        /// Hero that was hit.
        id: EntityId,
    },
    /// A building was hit.
    Building {
        /// Building that was hit.
        id: EntityId,
        /// Whether the hit brought the building to zero health.
        destroyed: bool,
    },
    /// The main base was hit.
    Base,
}

/// Runs one enemy's attack.
///
/// Status timers tick down on every call, even when no attack happens.
/// Confused enemies never attack. The enemy strikes its hero target if it has
/// one, else its assigned building, else the base.
pub fn process_enemy_attack(
    enemy: &mut Enemy,
    defenders: &mut [Defender],
    buildings: &mut [Building],
    base: &mut Base,
    ctx: &CombatContext<'_>,
    out_events: &mut Vec<Event>,
) -> Option<AttackOutcome> {
    enemy.confused_time = (enemy.confused_time - ctx.dt).max(0.0);
    enemy.slowed_time = (enemy.slowed_time - ctx.dt).max(0.0);
    enemy.attack_timer = (enemy.attack_timer - ctx.dt).max(0.0);
    if !enemy.is_alive() || enemy.is_confused() {
        return None;
    }

    let profile = enemy.profile();
    let cooldown = if profile.boss {
        BOSS_ATTACK_COOLDOWN_SECS
    } else {
        ENEMY_ATTACK_COOLDOWN_SECS
    };

    let hero = match enemy.current_target {
        Some(TargetRef::Defender(id)) => defenders
            .iter_mut()
            .find(|defender| defender.id == id && defender.is_alive()),
        _ => None,
    };
    if let Some(defender) = hero {
        let target = TargetRef::Defender(defender.id);
        if enemy.position.distance(defender.position) > enemy_reach(enemy, target)
            || enemy.attack_timer > 0.0
        {
            return None;
        }
        enemy.attack_timer = cooldown;
        defender.health = (defender.health - profile.damage).max(0.0);
        ctx.threat.add_threat(enemy, target, profile.damage, ctx.now);
        return Some(AttackOutcome::Defender { id: defender.id });
    }

    let building = enemy.target_building.and_then(|id| {
        buildings
            .iter_mut()
            .find(|building| building.id == id && building.is_alive())
    });
    if let Some(building) = building {
        let reach = enemy_reach(enemy, TargetRef::Building(building.id));
        if enemy.position.distance(building.position()) > reach || enemy.attack_timer > 0.0 {
            return None;
        }
        enemy.attack_timer = cooldown;
        building.health = (building.health - profile.damage).max(0.0);
        return Some(AttackOutcome::Building {
            id: building.id,
            destroyed: !building.is_alive(),
        });
    }

    if enemy.position.distance(base.position) > enemy_reach(enemy, TargetRef::Base)
        || enemy.attack_timer > 0.0
    {
        return None;
    }
    enemy.attack_timer = cooldown;
    base.take_damage(profile.damage);
    out_events.push(Event::BaseDamaged {
        health: base.health,
    });
    Some(AttackOutcome::Base)
}
