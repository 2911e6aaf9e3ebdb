//! Read-only views handed to presentation layers.

use glam::{Vec2, Vec3};
use hearthguard_core::{BuildingKind, EnemyKind, EntityId, HeroKind, Phase, Stockpile, Weather};
use hearthguard_world::{elevate, query, World};

/// What an [`EntitySnapshot`] depicts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A hostile unit.
    Enemy(EnemyKind),
    /// A recruited hero.
    Defender(HeroKind),
    /// A placed structure.
    Building(BuildingKind),
}

/// Position and health of one combat entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Entity identifier.
    pub id: EntityId,
    /// Archetype of the entity.
    pub kind: EntityKind,
    /// Position including height; flying enemies report their altitude.
    pub position: Vec3,
    /// Remaining health.
    pub health: f32,
    /// Health when undamaged.
    pub max_health: f32,
}

/// Everything a renderer or HUD needs for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationSnapshot {
    /// Current lifecycle phase.
    pub phase: Phase,
    /// One-based wave number.
    pub wave: u32,
    /// Score accumulated this run.
    pub score: u32,
    /// Resources held by the player.
    pub stockpile: Stockpile,
    /// Remaining base health.
    pub base_health: f32,
    /// Base health when undamaged.
    pub base_max_health: f32,
    /// Whether rage mode is active.
    pub rage_active: bool,
    /// Active weather.
    pub weather: Weather,
    /// Current kill combo.
    pub combo: u32,
    /// Whether a boss is on the field.
    pub boss_active: bool,
    /// Seconds left before nightfall; zero outside the day.
    pub day_remaining_secs: f32,
    /// Enemies still waiting to spawn this night.
    pub spawns_remaining: usize,
    /// Player avatar position.
    pub player: Vec2,
    /// Positions of visible partners.
    pub partners: Vec<Vec2>,
    /// Positions of collectors on a trip.
    pub collectors: Vec<Vec2>,
    /// Positions of projectiles in flight.
    pub projectiles: Vec<Vec3>,
    /// Enemies, heroes and buildings.
    pub entities: Vec<EntitySnapshot>,
}

impl SimulationSnapshot {
    pub(crate) fn capture(world: &World, day_remaining_secs: f32, spawns_remaining: usize) -> Self {
        let enemies = world.enemies.iter().map(|enemy| EntitySnapshot {
            id: enemy.id,
            kind: EntityKind::Enemy(enemy.kind),
            position: elevate(enemy.position, enemy.altitude),
            health: enemy.health,
            max_health: enemy.max_health,
        });
        let defenders = world.defenders.iter().map(|defender| EntitySnapshot {
            id: defender.id,
            kind: EntityKind::Defender(defender.kind),
            position: elevate(defender.position, 0.0),
            health: defender.health,
            max_health: defender.max_health,
        });
        let buildings = world.buildings.iter().map(|building| EntitySnapshot {
            id: building.id,
            kind: EntityKind::Building(building.kind),
            position: elevate(building.position(), 0.0),
            health: building.health,
            max_health: building.max_health,
        });

        Self {
            phase: world.phase,
            wave: world.wave,
            score: world.score,
            stockpile: world.stockpile,
            base_health: world.base.health,
            base_max_health: world.base.max_health,
            rage_active: world.rage_active,
            weather: world.weather,
            combo: world.combo,
            boss_active: query::boss_active(world),
            day_remaining_secs,
            spawns_remaining,
            player: world.player.position,
            partners: world
                .partners
                .iter()
                .filter(|partner| partner.visible)
                .map(|partner| partner.position)
                .collect(),
            collectors: world
                .collectors
                .iter()
                .map(|collector| collector.position)
                .collect(),
            projectiles: world
                .projectiles
                .iter()
                .map(|projectile| projectile.position)
                .collect(),
            entities: enemies.chain(defenders).chain(buildings).collect(),
        }
    }

    /// Looks up an entity by identifier.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    /// Fraction of base health remaining.
    #[must_use]
    pub fn base_health_fraction(&self) -> f32 {
        if self.base_max_health > 0.0 {
            self.base_health / self.base_max_health
        } else {
            0.0
        }
    }
}
