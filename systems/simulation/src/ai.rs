//! Night-time drivers for enemies and heroes.

use std::time::Duration;

use glam::Vec2;
use hearthguard_core::{BuildingKind, EntityId, Event, GridCell, SkillEffects, TargetRef, Weather};
use hearthguard_system_combat::{
    enemy_reach, find_nearest_enemy, process_defender_ability, process_defender_attack,
    process_enemy_attack, AttackOutcome, CombatContext,
};
use hearthguard_system_pathfinding::{smooth_path, Pathfinder};
use hearthguard_system_threat::{target_position, ThreatSystem};
use hearthguard_world::{Base, Building, Defender, Enemy, ProjectileSpawn, WallGrid};
use log::debug;
use rand::Rng;

use crate::economy::step_toward;

const RETARGET_INTERVAL_SECS: f32 = 0.5;
const SLOWED_SPEED_FACTOR: f32 = 0.5;
const BREACH_RADIUS: f32 = 25.0;
const ENGAGE_MARGIN: f32 = 6.0;
const APPROACH_FRACTION: f32 = 0.9;

/// Shared per-tick inputs for the drivers.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Tick<'a> {
    pub(crate) weather: Weather,
    pub(crate) rage_active: bool,
    pub(crate) effects: &'a SkillEffects,
    pub(crate) now: Duration,
    pub(crate) dt: f32,
}

impl<'a> Tick<'a> {
    pub(crate) fn combat<'c>(&self, threat: &'c ThreatSystem) -> CombatContext<'c>
    where
        'a: 'c,
    {
        CombatContext {
            weather: self.weather,
            rage_active: self.rage_active,
            effects: self.effects,
            now: self.now,
            dt: self.dt,
            threat,
        }
    }
}

/// Mutable world state the enemy driver works on.
pub(crate) struct Battlefield<'w> {
    pub(crate) enemies: &'w mut [Enemy],
    pub(crate) defenders: &'w mut [Defender],
    pub(crate) buildings: &'w mut [Building],
    pub(crate) base: &'w mut Base,
    pub(crate) walls: &'w WallGrid,
}

/// Retargets, moves and attacks with every living enemy.
///
/// Returns the buildings brought down this tick.
pub(crate) fn update_enemies(
    field: Battlefield<'_>,
    pathfinder: &mut Pathfinder,
    threat: &mut ThreatSystem,
    tick: Tick<'_>,
    out_events: &mut Vec<Event>,
) -> Vec<EntityId> {
    let Battlefield {
        enemies,
        defenders,
        buildings,
        base,
        walls,
    } = field;
    let mut destroyed = Vec::new();

    for enemy in enemies.iter_mut().filter(|enemy| enemy.is_alive()) {
        threat.decay_threat(enemy, tick.dt);
        retarget(enemy, threat, defenders, buildings, tick.dt);
        if !enemy.is_confused() {
            let speed_factor = tick.weather.enemy_speed_factor();
            move_enemy(
                enemy,
                pathfinder,
                walls,
                defenders,
                buildings,
                base.position,
                speed_factor,
                tick,
            );
        }

        let ctx = tick.combat(threat);
        let outcome = process_enemy_attack(enemy, defenders, buildings, base, &ctx, out_events);
        if let Some(AttackOutcome::Building {
            id,
            destroyed: true,
        }) = outcome
        {
            destroyed.push(id);
        }
    }
    destroyed
}

fn retarget(
    enemy: &mut Enemy,
    threat: &mut ThreatSystem,
    defenders: &[Defender],
    buildings: &[Building],
    dt: f32,
) {
    enemy.retarget_timer -= dt;
    let target_lost = match enemy.current_target {
        None => true,
        Some(TargetRef::Base) => false,
        Some(target) => target_position(target, defenders, buildings, Vec2::ZERO).is_none(),
    };
    if enemy.retarget_timer > 0.0 && !target_lost {
        return;
    }
    enemy.retarget_timer = RETARGET_INTERVAL_SECS;
    if enemy.is_confused() {
        return;
    }

    let target = threat.select_target(enemy, defenders, buildings);
    let assigned = enemy
        .target_building
        .and_then(|id| standing_building(buildings, id));
    enemy.target_building = match (target, assigned) {
        (TargetRef::Building(_), Some(building)) if building.kind == BuildingKind::Wall => {
            Some(building.id)
        }
        (TargetRef::Building(id), _) => Some(id),
        (TargetRef::Defender(_) | TargetRef::Base, _) => assigned.map(|building| building.id),
    };
    enemy.current_target = Some(match (target, enemy.target_building) {
        (TargetRef::Defender(_), _) => target,
        (_, Some(id)) => TargetRef::Building(id),
        (_, None) => TargetRef::Base,
    });
}

fn standing_building(buildings: &[Building], id: EntityId) -> Option<&Building> {
    buildings
        .iter()
        .find(|building| building.id == id && building.is_alive())
}

/// What the enemy is walking toward, mirroring the attack preference.
fn movement_goal(
    enemy: &Enemy,
    defenders: &[Defender],
    buildings: &[Building],
    base: Vec2,
) -> (TargetRef, Vec2) {
    if let Some(target @ TargetRef::Defender(_)) = enemy.current_target {
        if let Some(position) = target_position(target, defenders, buildings, base) {
            return (target, position);
        }
    }
    if let Some(id) = enemy.target_building {
        let target = TargetRef::Building(id);
        if let Some(position) = target_position(target, defenders, buildings, base) {
            return (target, position);
        }
    }
    (TargetRef::Base, base)
}

#[allow(clippy::too_many_arguments)]
fn move_enemy(
    enemy: &mut Enemy,
    pathfinder: &mut Pathfinder,
    walls: &WallGrid,
    defenders: &[Defender],
    buildings: &[Building],
    base: Vec2,
    speed_factor: f32,
    tick: Tick<'_>,
) {
    let (target, goal) = movement_goal(enemy, defenders, buildings, base);
    if enemy.position.distance(goal) <= enemy_reach(enemy, target) {
        return;
    }

    let profile = enemy.profile();
    let mut speed = profile.speed * speed_factor;
    if enemy.is_slowed() {
        speed *= SLOWED_SPEED_FACTOR;
    }
    let step = speed * tick.dt;
    if profile.flying {
        enemy.position = step_toward(enemy.position, goal, step);
        return;
    }

    let goal_cell = GridCell::from_world(goal);
    let stale = enemy.path.is_empty()
        || enemy.path_revision != walls.revision()
        || enemy.path_goal != Some(goal_cell);
    if stale {
        enemy.clear_path();
        enemy.path_goal = Some(goal_cell);
        enemy.path_revision = walls.revision();
        match pathfinder.find_path(walls, enemy.position, goal, tick.now) {
            Some(path) => {
                enemy.path = smooth_path(walls, &path);
                enemy.path_index = 1.min(enemy.path.len());
            }
            None => {
                breach(enemy, buildings);
                return;
            }
        }
    }

    follow_path(enemy, walls, goal, step);
}

/// Points a blocked enemy at the nearest wall so it can tear through.
fn breach(enemy: &mut Enemy, buildings: &[Building]) {
    let wall = buildings
        .iter()
        .filter(|building| building.kind == BuildingKind::Wall && building.is_alive())
        .map(|building| (building.position().distance(enemy.position), building.id))
        .filter(|(distance, _)| *distance <= BREACH_RADIUS)
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    let Some((_, id)) = wall else {
        return;
    };
    if enemy.target_building == Some(id) {
        return;
    }
    debug!("{:?} {:?} has no path, breaching wall {id:?}", enemy.kind, enemy.id);
    enemy.target_building = Some(id);
    enemy.current_target = Some(TargetRef::Building(id));
    enemy.clear_path();
}

fn follow_path(enemy: &mut Enemy, walls: &WallGrid, goal: Vec2, step: f32) {
    let mut remaining = step;
    while remaining > 0.0 {
        let Some(&waypoint) = enemy.path.get(enemy.path_index) else {
            let next = step_toward(enemy.position, goal, remaining);
            let cell = GridCell::from_world(next);
            if cell == GridCell::from_world(enemy.position) || walls.is_walkable(cell) {
                enemy.position = next;
            }
            return;
        };
        let distance = enemy.position.distance(waypoint);
        if distance > remaining {
            enemy.position = step_toward(enemy.position, waypoint, remaining);
            return;
        }
        enemy.position = waypoint;
        enemy.path_index += 1;
        remaining -= distance;
    }
}

/// Runs abilities, movement and attacks for every hero.
pub(crate) fn update_defenders<R: Rng + ?Sized>(
    defenders: &mut [Defender],
    enemies: &mut [Enemy],
    threat: &ThreatSystem,
    tick: Tick<'_>,
    rng: &mut R,
    out_projectiles: &mut Vec<ProjectileSpawn>,
    out_events: &mut Vec<Event>,
) {
    let ctx = tick.combat(threat);
    for index in 0..defenders.len() {
        let _ = process_defender_ability(index, defenders, enemies, &ctx, out_events);

        let defender = &mut defenders[index];
        if defender.is_alive() {
            let range = ctx.defender_range(defender.kind);
            let step = defender.profile().speed * tick.dt;
            match find_nearest_enemy(enemies, defender.position, range + ENGAGE_MARGIN) {
                Some(nearest) => {
                    let target = enemies[nearest].position;
                    let distance = defender.position.distance(target);
                    let approach = (distance - range * APPROACH_FRACTION).max(0.0);
                    defender.position =
                        step_toward(defender.position, target, step.min(approach));
                }
                None => defender.position = step_toward(defender.position, defender.post, step),
            }
        }

        process_defender_attack(defender, enemies, &ctx, rng, out_projectiles, out_events);
    }
}
