//! Hero abilities dispatched by archetype.
//!
//! Each archetype maps to at most one handler with a uniform signature, so a
//! new hero only needs a new table entry.

use hearthguard_core::{Event, HeroKind};
use hearthguard_system_threat::ThreatSystem;
use hearthguard_world::{Defender, Enemy};
use log::debug;

use crate::{find_nearest_enemy, find_weakest_enemy, CombatContext, ABILITY_COOLDOWN_SECS};

const SLOW_RADIUS: f32 = 5.0;
const SLOW_SECS: f32 = 4.0;
const CONFUSE_SECS: f32 = 5.0;
const TAUNT_RADIUS: f32 = 8.0;
const TAUNT_SECS: f32 = 3.0;
const HEAL_RADIUS: f32 = 6.0;
const HEAL_AMOUNT: f32 = 20.0;
const TELEPORT_OFFSET: f32 = 1.0;

/// Everything an ability may read or change.
#[derive(Debug)]
pub struct AbilityScope<'a> {
    /// Index of the casting hero within `defenders`.
    pub caster: usize,
    /// Every hero, caster included.
    pub defenders: &'a mut [Defender],
    /// Every enemy.
    pub enemies: &'a mut [Enemy],
    /// Threat bookkeeping.
    pub threat: &'a ThreatSystem,
    /// Caster's attack range after weather.
    pub range: f32,
}

/// Ability implementation; returns whether the ability took effect.
pub type AbilityHandler = fn(&mut AbilityScope<'_>) -> bool;

/// Ability handler for a hero archetype, if it has one.
#[must_use]
pub fn ability_for(kind: HeroKind) -> Option<AbilityHandler> {
    match kind {
        HeroKind::Tunneler => Some(burrow),
        HeroKind::Shadow => Some(confuse),
        HeroKind::Tank => Some(taunt_pulse),
        HeroKind::Assassin => Some(shadow_step),
        HeroKind::Healer => Some(mend),
        HeroKind::Knight | HeroKind::Archer | HeroKind::Bomber => None,
    }
}

/// Advances a hero's ability timers and fires the ability when ready.
///
/// The cooldown only restarts when the ability takes effect, so a hero with
/// nothing to act on tries again next tick.
pub fn process_defender_ability(
    caster: usize,
    defenders: &mut [Defender],
    enemies: &mut [Enemy],
    ctx: &CombatContext<'_>,
    out_events: &mut Vec<Event>,
) -> bool {
    let Some(hero) = defenders.get_mut(caster) else {
        return false;
    };
    hero.ability_timer = (hero.ability_timer - ctx.dt).max(0.0);
    hero.taunt_time = (hero.taunt_time - ctx.dt).max(0.0);
    if !hero.is_alive() || hero.ability_timer > 0.0 {
        return false;
    }
    let (id, kind) = (hero.id, hero.kind);
    let Some(handler) = ability_for(kind) else {
        return false;
    };

    let mut scope = AbilityScope {
        caster,
        defenders,
        enemies,
        threat: ctx.threat,
        range: ctx.defender_range(kind),
    };
    if !handler(&mut scope) {
        return false;
    }

    scope.defenders[caster].ability_timer = ABILITY_COOLDOWN_SECS;
    debug!("{kind:?} {id:?} used its ability");
    out_events.push(Event::AbilityUsed { id, kind });
    true
}

fn burrow(scope: &mut AbilityScope<'_>) -> bool {
    let origin = scope.defenders[scope.caster].position;
    let mut affected = false;
    for enemy in scope.enemies.iter_mut() {
        if enemy.is_alive() && enemy.position.distance(origin) <= SLOW_RADIUS {
            enemy.slowed_time = SLOW_SECS;
            affected = true;
        }
    }
    affected
}

fn confuse(scope: &mut AbilityScope<'_>) -> bool {
    let origin = scope.defenders[scope.caster].position;
    let Some(index) = find_nearest_enemy(scope.enemies, origin, scope.range) else {
        return false;
    };
    let enemy = &mut scope.enemies[index];
    enemy.confused_time = CONFUSE_SECS;
    scope.threat.clear_threat(enemy);
    true
}

fn taunt_pulse(scope: &mut AbilityScope<'_>) -> bool {
    let origin = scope.defenders[scope.caster].position;
    let mut affected = false;
    for enemy in scope.enemies.iter_mut() {
        if enemy.is_alive() && enemy.position.distance(origin) <= TAUNT_RADIUS {
            enemy.target_building = None;
            affected = true;
        }
    }
    if affected {
        scope.defenders[scope.caster].taunt_time = TAUNT_SECS;
    }
    affected
}

fn shadow_step(scope: &mut AbilityScope<'_>) -> bool {
    let Some(index) = find_weakest_enemy(scope.enemies) else {
        return false;
    };
    let target = scope.enemies[index].position;
    let caster = &mut scope.defenders[scope.caster];
    let approach = (caster.position - target).try_normalize().unwrap_or(glam::Vec2::X);
    caster.position = target + approach * TELEPORT_OFFSET;
    caster.target = Some(scope.enemies[index].id);
    true
}

fn mend(scope: &mut AbilityScope<'_>) -> bool {
    let origin = scope.defenders[scope.caster].position;
    let mut healed = false;
    for (index, ally) in scope.defenders.iter_mut().enumerate() {
        if index == scope.caster || !ally.is_alive() || ally.health >= ally.max_health {
            continue;
        }
        if ally.position.distance(origin) <= HEAL_RADIUS {
            ally.heal(HEAL_AMOUNT);
            healed = true;
        }
    }
    healed
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use hearthguard_core::{EnemyKind, EntityId, SkillEffects, Weather};
    use std::time::Duration;

    fn run(
        defenders: &mut [Defender],
        enemies: &mut [Enemy],
        caster: usize,
    ) -> (bool, Vec<Event>) {
        let effects = SkillEffects::default();
        let threat = ThreatSystem::default();
        let ctx = CombatContext {
            weather: Weather::Clear,
            rage_active: false,
            effects: &effects,
            now: Duration::ZERO,
            dt: 0.05,
            threat: &threat,
        };
        defenders[caster].ability_timer = 0.0;
        let mut events = Vec::new();
        let used = process_defender_ability(caster, defenders, enemies, &ctx, &mut events);
        (used, events)
    }

    fn enemy(id: u32, kind: EnemyKind, x: f32) -> Enemy {
        Enemy::new(EntityId::new(id), kind, Vec2::new(x, 0.0))
    }

    #[test]
    fn tunneler_slows_everything_within_five_units() {
        let mut defenders = [Defender::new(EntityId::new(1), HeroKind::Tunneler, Vec2::ZERO, 0.0)];
        let mut enemies = [enemy(2, EnemyKind::Wolf, 4.9), enemy(3, EnemyKind::Wolf, 5.1)];

        let (used, events) = run(&mut defenders, &mut enemies, 0);

        assert!(used);
        assert_eq!(enemies[0].slowed_time, SLOW_SECS);
        assert_eq!(enemies[1].slowed_time, 0.0);
        assert_eq!(defenders[0].ability_timer, ABILITY_COOLDOWN_SECS);
        assert_eq!(
            events,
            vec![Event::AbilityUsed {
                id: EntityId::new(1),
                kind: HeroKind::Tunneler
            }]
        );
    }

    #[test]
    fn shadow_confuses_the_nearest_enemy_and_wipes_its_threat() {
        let mut defenders = [Defender::new(EntityId::new(1), HeroKind::Shadow, Vec2::ZERO, 0.0)];
        let mut enemies = [enemy(2, EnemyKind::Wolf, 5.0), enemy(3, EnemyKind::Wolf, 2.0)];
        enemies[1].current_target = Some(hearthguard_core::TargetRef::Base);

        let (used, _) = run(&mut defenders, &mut enemies, 0);

        assert!(used);
        assert_eq!(enemies[1].confused_time, CONFUSE_SECS);
        assert!(enemies[1].current_target.is_none());
        assert_eq!(enemies[0].confused_time, 0.0);
    }

    #[test]
    fn tank_pulls_nearby_enemies_off_buildings_and_taunts() {
        let mut defenders = [Defender::new(EntityId::new(1), HeroKind::Tank, Vec2::ZERO, 0.0)];
        let mut enemies = [enemy(2, EnemyKind::Boar, 7.0), enemy(3, EnemyKind::Boar, 9.0)];
        enemies[0].target_building = Some(EntityId::new(40));
        enemies[1].target_building = Some(EntityId::new(40));

        let (used, _) = run(&mut defenders, &mut enemies, 0);

        assert!(used);
        assert!(enemies[0].target_building.is_none());
        assert_eq!(enemies[1].target_building, Some(EntityId::new(40)));
        assert!(defenders[0].is_taunting());
    }

    #[test]
    fn assassin_lands_beside_the_weakest_enemy() {
        let mut defenders = [Defender::new(EntityId::new(1), HeroKind::Assassin, Vec2::ZERO, 0.0)];
        let mut enemies = [enemy(2, EnemyKind::Troll, 10.0), enemy(3, EnemyKind::Crow, 30.0)];

        let (used, _) = run(&mut defenders, &mut enemies, 0);

        assert!(used);
        assert!((defenders[0].position - Vec2::new(29.0, 0.0)).length() < 1e-4);
        assert_eq!(defenders[0].target, Some(EntityId::new(3)));
    }

    #[test]
    fn healer_restores_wounded_allies_in_range_only() {
        let mut defenders = [
            Defender::new(EntityId::new(1), HeroKind::Healer, Vec2::ZERO, 0.0),
            Defender::new(EntityId::new(2), HeroKind::Knight, Vec2::new(5.0, 0.0), 0.0),
            Defender::new(EntityId::new(3), HeroKind::Knight, Vec2::new(7.0, 0.0), 0.0),
        ];
        defenders[0].health = 10.0;
        defenders[1].health = 100.0;
        defenders[2].health = 100.0;

        let (used, _) = run(&mut defenders, &mut [], 0);

        assert!(used);
        assert_eq!(defenders[0].health, 10.0);
        assert_eq!(defenders[1].health, 120.0);
        assert_eq!(defenders[2].health, 100.0);
    }

    #[test]
    fn abilities_without_effect_keep_the_cooldown_ready() {
        let mut defenders = [Defender::new(EntityId::new(1), HeroKind::Tunneler, Vec2::ZERO, 0.0)];
        let (used, events) = run(&mut defenders, &mut [], 0);
        assert!(!used);
        assert!(events.is_empty());
        assert_eq!(defenders[0].ability_timer, 0.0);
        assert!(ability_for(HeroKind::Knight).is_none());
    }
}
