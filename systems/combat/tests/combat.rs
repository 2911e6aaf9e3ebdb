use std::time::Duration;

use glam::Vec2;
use hearthguard_core::{
    BuildingKind, EnemyKind, EntityId, Event, GridCell, HeroKind, SkillEffects, TargetRef, Weather,
};
use hearthguard_system_combat::{
    advance_projectiles, process_defender_ability, process_defender_attack, process_enemy_attack,
    AttackOutcome, CombatContext, ABILITY_COOLDOWN_SECS,
};
use hearthguard_system_threat::ThreatSystem;
use hearthguard_world::{
    elevate, Base, Building, Defender, Enemy, Projectile, ProjectileKind, ProjectileSpawn,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn context<'a>(effects: &'a SkillEffects, threat: &'a ThreatSystem, dt: f32) -> CombatContext<'a> {
    CombatContext {
        weather: Weather::Clear,
        rage_active: false,
        effects,
        now: Duration::from_secs(1),
        dt,
        threat,
    }
}

fn troll(id: u32, x: f32, z: f32) -> Enemy {
    Enemy::new(EntityId::new(id), EnemyKind::Troll, Vec2::new(x, z))
}

fn wall(id: u32, cell: GridCell, health: f32) -> Building {
    Building {
        id: EntityId::new(id),
        kind: BuildingKind::Wall,
        cell,
        health,
        max_health: 120.0,
        attack_timer: 0.0,
        spawn_timer: 0.0,
    }
}

#[test]
fn carrot_splash_hits_the_cluster_equally_and_spares_the_outlier() {
    let effects = SkillEffects::default();
    let threat = ThreatSystem::default();
    let ctx = context(&effects, &threat, 0.1);
    let mut enemies = vec![
        troll(1, 5.0, 0.0),
        troll(2, 6.5, 0.0),
        troll(3, 5.0, -2.0),
        troll(4, 8.0, 0.0),
    ];
    let mut projectiles = vec![Projectile::launch(ProjectileSpawn {
        kind: ProjectileKind::Carrot,
        origin: elevate(Vec2::new(5.0, 0.0), 3.0),
        target: elevate(Vec2::new(5.0, 0.0), 0.5),
        damage: 25.0,
        splash_radius: 2.5,
        source: Some(TargetRef::Defender(EntityId::new(9))),
    })];

    advance_projectiles(&mut projectiles, &mut enemies, &ctx);

    assert!(projectiles.is_empty());
    for enemy in &enemies[..3] {
        assert_eq!(enemy.health, enemy.max_health - 25.0);
        assert!(enemy
            .threat_table
            .contains_key(&TargetRef::Defender(EntityId::new(9))));
    }
    assert_eq!(enemies[3].health, enemies[3].max_health);
}

#[test]
fn bomber_volley_lands_as_a_splash() {
    let effects = SkillEffects::default();
    let threat = ThreatSystem::default();
    let ctx = context(&effects, &threat, 0.05);
    let mut bomber = Defender::new(EntityId::new(20), HeroKind::Bomber, Vec2::ZERO, 0.0);
    bomber.attack_timer = 0.0;
    let mut enemies = vec![
        troll(1, 6.0, 0.0),
        troll(2, 6.0, 1.0),
        troll(3, 6.0, -1.0),
        troll(4, 6.0, 5.0),
    ];
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut spawns = Vec::new();
    let mut events = Vec::new();

    process_defender_attack(
        &mut bomber,
        &mut enemies,
        &ctx,
        &mut rng,
        &mut spawns,
        &mut events,
    );
    assert_eq!(spawns.len(), 1);
    assert_eq!(bomber.target, Some(EntityId::new(1)));
    assert!(enemies.iter().all(|enemy| enemy.health == enemy.max_health));

    let mut projectiles: Vec<Projectile> = spawns.into_iter().map(Projectile::launch).collect();
    let mut ticks = 0;
    while !projectiles.is_empty() {
        advance_projectiles(&mut projectiles, &mut enemies, &ctx);
        ticks += 1;
        assert!(ticks < 200);
    }

    let dealt = enemies[0].max_health - enemies[0].health;
    assert!(dealt > 0.0);
    assert_eq!(enemies[1].max_health - enemies[1].health, dealt);
    assert_eq!(enemies[2].max_health - enemies[2].health, dealt);
    assert_eq!(enemies[3].health, enemies[3].max_health);
}

#[test]
fn enemies_tear_down_their_assigned_building() {
    let effects = SkillEffects::default();
    let threat = ThreatSystem::default();
    let ctx = context(&effects, &threat, 0.05);
    let cell = GridCell::new(3, 0);
    let mut buildings = vec![wall(40, cell, 1.0)];
    let mut enemy = Enemy::new(EntityId::new(1), EnemyKind::Boar, cell.to_world() + Vec2::X);
    enemy.target_building = Some(EntityId::new(40));
    let mut base = Base {
        position: Vec2::ZERO,
        health: 1000.0,
        max_health: 1000.0,
    };
    let mut events = Vec::new();

    let outcome = process_enemy_attack(
        &mut enemy,
        &mut [],
        &mut buildings,
        &mut base,
        &ctx,
        &mut events,
    );

    assert_eq!(
        outcome,
        Some(AttackOutcome::Building {
            id: EntityId::new(40),
            destroyed: true
        })
    );
    assert!(!buildings[0].is_alive());
    assert_eq!(base.health, 1000.0);
    assert!(events.is_empty());
}

#[test]
fn confused_enemies_hold_their_attack_until_it_wears_off() {
    let effects = SkillEffects::default();
    let threat = ThreatSystem::default();
    let ctx = context(&effects, &threat, 0.5);
    let mut enemy = Enemy::new(EntityId::new(1), EnemyKind::Wolf, Vec2::new(3.5, 0.0));
    enemy.confused_time = 0.75;
    let mut base = Base {
        position: Vec2::ZERO,
        health: 1000.0,
        max_health: 1000.0,
    };
    let mut events = Vec::new();

    let first = process_enemy_attack(&mut enemy, &mut [], &mut [], &mut base, &ctx, &mut events);
    assert_eq!(first, None);
    assert_eq!(base.health, 1000.0);

    let second = process_enemy_attack(&mut enemy, &mut [], &mut [], &mut base, &ctx, &mut events);
    assert_eq!(second, Some(AttackOutcome::Base));
    assert_eq!(base.health, 1000.0 - EnemyKind::Wolf.profile().damage);
    assert_eq!(
        events,
        vec![Event::BaseDamaged {
            health: base.health
        }]
    );
}

#[test]
fn bosses_swing_faster_than_regular_enemies() {
    let effects = SkillEffects::default();
    let threat = ThreatSystem::default();
    let ctx = context(&effects, &threat, 0.25);
    let mut base = Base {
        position: Vec2::ZERO,
        health: 10_000.0,
        max_health: 10_000.0,
    };
    let mut fox = Enemy::new(EntityId::new(1), EnemyKind::FoxBoss, Vec2::new(3.5, 0.0));
    let mut wolf = Enemy::new(EntityId::new(2), EnemyKind::Wolf, Vec2::new(-3.5, 0.0));
    let mut events = Vec::new();
    let mut fox_hits = 0;
    let mut wolf_hits = 0;

    for _ in 0..12 {
        if process_enemy_attack(&mut fox, &mut [], &mut [], &mut base, &ctx, &mut events).is_some() {
            fox_hits += 1;
        }
        if process_enemy_attack(&mut wolf, &mut [], &mut [], &mut base, &ctx, &mut events).is_some() {
            wolf_hits += 1;
        }
    }

    assert_eq!(fox_hits, 3);
    assert_eq!(wolf_hits, 2);
}

#[test]
fn hero_attacks_feed_the_threat_table() {
    let effects = SkillEffects::default();
    let threat = ThreatSystem::default();
    let ctx = context(&effects, &threat, 0.05);
    let mut knight = Defender::new(EntityId::new(5), HeroKind::Knight, Vec2::ZERO, 0.0);
    let mut enemies = vec![troll(1, 1.5, 0.0)];
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    process_defender_attack(
        &mut knight,
        &mut enemies,
        &ctx,
        &mut rng,
        &mut Vec::new(),
        &mut Vec::new(),
    );

    let entry = enemies[0].threat_table[&TargetRef::Defender(EntityId::new(5))];
    assert!(entry.threat > 0.0);
    assert_eq!(enemies[0].last_damage_source, Some(TargetRef::Defender(EntityId::new(5))));
}

#[test]
fn tank_taunt_fires_after_warmup_and_then_cools_down() {
    let effects = SkillEffects::default();
    let threat = ThreatSystem::default();
    let ctx = context(&effects, &threat, 0.5);
    let mut defenders = vec![Defender::new(EntityId::new(1), HeroKind::Tank, Vec2::ZERO, 0.0)];
    let mut enemies = vec![troll(2, 4.0, 0.0)];
    enemies[0].target_building = Some(EntityId::new(77));
    let mut events = Vec::new();

    let mut fired_at = None;
    for tick in 0..10 {
        if process_defender_ability(0, &mut defenders, &mut enemies, &ctx, &mut events) {
            fired_at = Some(tick);
            break;
        }
    }

    assert_eq!(fired_at, Some(3));
    assert!(enemies[0].target_building.is_none());
    assert!(defenders[0].is_taunting());
    assert_eq!(defenders[0].ability_timer, ABILITY_COOLDOWN_SECS);
    assert_eq!(events.len(), 1);
}
