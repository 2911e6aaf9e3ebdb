//! Mutable entity records stored by the world.

use std::{collections::BTreeMap, time::Duration};

use glam::{Vec2, Vec3};
use hearthguard_core::{
    BuildingKind, EnemyKind, EnemyProfile, EntityId, GridCell, HeroKind, HeroProfile,
    ResourceKind, TargetRef,
};

/// Accumulated threat an enemy holds against one source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThreatEntry {
    /// Threat value, always in `(0, max_threat]`.
    pub threat: f32,
    /// Simulation time of the last change.
    pub last_update: Duration,
}

/// Hostile unit attacking the base.
#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    /// Identifier allocated by the world.
    pub id: EntityId,
    /// Archetype selecting stats and behaviour.
    pub kind: EnemyKind,
    /// Ground position.
    pub position: Vec2,
    /// Height of the collision centre above the ground.
    pub altitude: f32,
    /// Remaining hit points.
    pub health: f32,
    /// Hit points at spawn.
    pub max_health: f32,
    /// Seconds until the next attack is allowed.
    pub attack_timer: f32,
    /// Seconds of confusion remaining.
    pub confused_time: f32,
    /// Seconds of slow remaining.
    pub slowed_time: f32,
    /// Threat accumulated per source.
    pub threat_table: BTreeMap<TargetRef, ThreatEntry>,
    /// Source that most recently damaged the enemy.
    pub last_damage_source: Option<TargetRef>,
    /// Simulation time of the most recent damage.
    pub last_damage_time: Duration,
    /// Target chosen by the last selection.
    pub current_target: Option<TargetRef>,
    /// Building the enemy is assigned to smash, if any.
    pub target_building: Option<EntityId>,
    /// Building the enemy was sent after when it spawned.
    pub original_target: Option<EntityId>,
    /// Seconds until target selection runs again.
    pub retarget_timer: f32,
    /// Smoothed waypoints toward the current goal.
    pub path: Vec<Vec2>,
    /// Index of the next waypoint in `path`.
    pub path_index: usize,
    /// Wall grid revision the path was planned against.
    pub path_revision: u64,
    /// Goal cell the path was planned toward.
    pub path_goal: Option<GridCell>,
}

impl Enemy {
    /// Creates an enemy at full health using its archetype profile.
    #[must_use]
    pub fn new(id: EntityId, kind: EnemyKind, position: Vec2) -> Self {
        let profile = kind.profile();
        Self {
            id,
            kind,
            position,
            altitude: if profile.flying { profile.altitude } else { 0.0 },
            health: profile.max_health,
            max_health: profile.max_health,
            attack_timer: 0.0,
            confused_time: 0.0,
            slowed_time: 0.0,
            threat_table: BTreeMap::new(),
            last_damage_source: None,
            last_damage_time: Duration::ZERO,
            current_target: None,
            target_building: None,
            original_target: None,
            retarget_timer: 0.0,
            path: Vec::new(),
            path_index: 0,
            path_revision: 0,
            path_goal: None,
        }
    }

    /// Archetype profile.
    #[must_use]
    pub fn profile(&self) -> &'static EnemyProfile {
        self.kind.profile()
    }

    /// Reports whether the enemy still has health.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Reports whether the enemy is confused.
    #[must_use]
    pub fn is_confused(&self) -> bool {
        self.confused_time > 0.0
    }

    /// Reports whether the enemy is slowed.
    #[must_use]
    pub fn is_slowed(&self) -> bool {
        self.slowed_time > 0.0
    }

    /// Height used for projectile collision.
    ///
    /// Ground units collide at half a unit above the ground.
    #[must_use]
    pub fn collision_height(&self) -> f32 {
        if self.profile().flying {
            self.altitude
        } else {
            0.5
        }
    }

    /// Sum of every threat table entry.
    #[must_use]
    pub fn total_threat(&self) -> f32 {
        self.threat_table.values().map(|entry| entry.threat).sum()
    }

    /// Applies damage, clamping health at zero.
    pub fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
    }

    /// Discards the current path so the next tick plans a new one.
    pub fn clear_path(&mut self) {
        self.path.clear();
        self.path_index = 0;
        self.path_goal = None;
    }
}

/// Recruited hero defending the base.
#[derive(Clone, Debug, PartialEq)]
pub struct Defender {
    /// Identifier allocated by the world.
    pub id: EntityId,
    /// Archetype selecting stats and ability.
    pub kind: HeroKind,
    /// Ground position.
    pub position: Vec2,
    /// Position the hero returns to when idle.
    pub post: Vec2,
    /// Remaining hit points.
    pub health: f32,
    /// Hit points at recruitment.
    pub max_health: f32,
    /// Damage per attack after skill scaling.
    pub damage: f32,
    /// Seconds until the next attack is allowed.
    pub attack_timer: f32,
    /// Seconds until the ability is ready.
    pub ability_timer: f32,
    /// Seconds of active taunt remaining.
    pub taunt_time: f32,
    /// Enemy the hero is engaging.
    pub target: Option<EntityId>,
}

impl Defender {
    /// Creates a hero with stats scaled by `stat_bonus_pct`.
    #[must_use]
    pub fn new(id: EntityId, kind: HeroKind, position: Vec2, stat_bonus_pct: f32) -> Self {
        let profile = kind.profile();
        let scale = 1.0 + stat_bonus_pct / 100.0;
        Self {
            id,
            kind,
            position,
            post: position,
            health: profile.max_health * scale,
            max_health: profile.max_health * scale,
            damage: profile.damage * scale,
            attack_timer: 0.0,
            ability_timer: ABILITY_WARMUP_SECS,
            taunt_time: 0.0,
            target: None,
        }
    }

    /// Archetype profile.
    #[must_use]
    pub fn profile(&self) -> &'static HeroProfile {
        self.kind.profile()
    }

    /// Reports whether the hero still has health.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Reports whether the hero is forcing enemies to target it.
    #[must_use]
    pub fn is_taunting(&self) -> bool {
        self.taunt_time > 0.0
    }

    /// Restores health up to the maximum.
    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health);
    }
}

/// Seconds before a freshly recruited hero may use its ability.
const ABILITY_WARMUP_SECS: f32 = 2.0;

/// Structure placed on the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Building {
    /// Identifier allocated by the world.
    pub id: EntityId,
    /// Kind of structure.
    pub kind: BuildingKind,
    /// Occupied cell.
    pub cell: GridCell,
    /// Remaining hit points.
    pub health: f32,
    /// Hit points at placement.
    pub max_health: f32,
    /// Seconds until a tower may fire again.
    pub attack_timer: f32,
    /// Seconds until a hut sends out another collector.
    pub spawn_timer: f32,
}

impl Building {
    /// World position of the building centre.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.cell.to_world()
    }

    /// Reports whether the building still stands.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

/// Projectile flavours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProjectileKind {
    /// Single-target tower arrow.
    Arrow,
    /// Bomber carrot that splashes on impact.
    Carrot,
}

impl ProjectileKind {
    /// Travel speed in world units per second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        match self {
            Self::Arrow => 30.0,
            Self::Carrot => 18.0,
        }
    }
}

/// Launch request produced by combat resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSpawn {
    /// Projectile flavour.
    pub kind: ProjectileKind,
    /// Launch position including height.
    pub origin: Vec3,
    /// Aim point including height.
    pub target: Vec3,
    /// Damage applied on impact.
    pub damage: f32,
    /// Splash radius; zero for single-target projectiles.
    pub splash_radius: f32,
    /// Attacker credited with the damage.
    pub source: Option<TargetRef>,
}

/// Projectile in flight.
#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    /// Projectile flavour.
    pub kind: ProjectileKind,
    /// Current position including height.
    pub position: Vec3,
    /// Launch position.
    pub origin: Vec3,
    /// Displacement per second.
    pub velocity: Vec3,
    /// Damage applied on impact.
    pub damage: f32,
    /// Splash radius; zero for single-target projectiles.
    pub splash_radius: f32,
    /// Distance covered so far.
    pub distance_traveled: f32,
    /// Distance from the origin after which the projectile expires.
    pub max_distance: f32,
    /// Attacker credited with the damage.
    pub source: Option<TargetRef>,
}

impl Projectile {
    /// Launches a projectile toward the requested aim point.
    ///
    /// The projectile may fly a little past the aim point before expiring.
    #[must_use]
    pub fn launch(spawn: ProjectileSpawn) -> Self {
        let offset = spawn.target - spawn.origin;
        let direction = offset.try_normalize().unwrap_or(Vec3::X);
        Self {
            kind: spawn.kind,
            position: spawn.origin,
            origin: spawn.origin,
            velocity: direction * spawn.kind.speed(),
            damage: spawn.damage,
            splash_radius: spawn.splash_radius,
            distance_traveled: 0.0,
            max_distance: offset.length() + OVERSHOOT,
            source: spawn.source,
        }
    }
}

const OVERSHOOT: f32 = 2.0;

/// Lifts a ground position to the provided height.
#[must_use]
pub fn elevate(ground: Vec2, height: f32) -> Vec3 {
    Vec3::new(ground.x, height, ground.y)
}

/// Projects a 3D position onto the ground plane.
#[must_use]
pub fn ground(point: Vec3) -> Vec2 {
    Vec2::new(point.x, point.z)
}

/// Player-controlled avatar.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    /// Ground position.
    pub position: Vec2,
    /// Normalized movement input.
    pub input: Vec2,
    /// Movement speed in world units per second.
    pub speed: f32,
}

/// Non-combat companion that trails the player during the day.
#[derive(Clone, Debug, PartialEq)]
pub struct Partner {
    /// Identifier allocated by the world.
    pub id: EntityId,
    /// Ground position.
    pub position: Vec2,
    /// Offset from the player the partner tries to keep.
    pub offset: Vec2,
    /// Whether the partner is shown; partners hide at night.
    pub visible: bool,
}

/// Hut worker making a single gathering trip.
#[derive(Clone, Debug, PartialEq)]
pub struct Collector {
    /// Identifier allocated by the world.
    pub id: EntityId,
    /// Hut that spawned the collector.
    pub hut: EntityId,
    /// Ground position.
    pub position: Vec2,
    /// Trip progress.
    pub state: CollectorState,
}

/// Progress of a collector trip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CollectorState {
    /// Looking for a node to harvest.
    Idle,
    /// Walking to a node.
    Outbound {
        /// Node being approached.
        node: EntityId,
    },
    /// Carrying a load back to the base.
    Returning {
        /// Carried resource.
        kind: ResourceKind,
        /// Carried amount.
        amount: u32,
    },
}

/// Lifecycle of a resource node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeState {
    /// Ready to be gathered.
    Available,
    /// Gathered and shrinking out of view.
    Shrinking {
        /// Seconds until the node disappears.
        remaining: f32,
    },
    /// Gone and waiting to regrow.
    Respawning {
        /// Seconds until the node is available again.
        remaining: f32,
    },
}

/// Gatherable tree or rock.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceNode {
    /// Identifier allocated by the world.
    pub id: EntityId,
    /// Resource yielded.
    pub kind: ResourceKind,
    /// Ground position.
    pub position: Vec2,
    /// Amount yielded per harvest.
    pub amount: u32,
    /// Lifecycle state.
    pub state: NodeState,
}

impl ResourceNode {
    /// Reports whether the node can be gathered.
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self.state, NodeState::Available)
    }
}

/// Main base at the centre of the map.
#[derive(Clone, Debug, PartialEq)]
pub struct Base {
    /// Ground position of the base centre.
    pub position: Vec2,
    /// Remaining hit points.
    pub health: f32,
    /// Maximum hit points.
    pub max_health: f32,
}

impl Base {
    /// Collision radius used for attack reach.
    pub const RADIUS: f32 = 3.0;

    /// Applies damage, clamping health at zero.
    pub fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
    }

    /// Fraction of health remaining in `[0, 1]`.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }
}
