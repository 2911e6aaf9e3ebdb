#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Hearthguard simulation.
//!
//! This crate defines the vocabulary that connects adapters, the authoritative
//! world, and the pure systems. Adapters submit [`Command`] values describing
//! player intent, the simulation executes those commands and advances its
//! clock, and then broadcasts [`Event`] values that presentation layers react
//! to. Nothing in this crate owns state beyond plain data.
//!
//! World positions are expressed as [`glam::Vec2`] on the ground plane, where
//! `x` is the world x axis and `y` carries the world z axis. Elevation, when an
//! entity has one, is stored separately.

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub mod archetypes;
pub mod progression;

pub use archetypes::{
    BuildingKind, BuildingProfile, EnemyKind, EnemyProfile, HeroKind, HeroProfile,
};
pub use progression::{
    MetaProgression, MetaProgressionDelta, ProfileSnapshot, SkillEffects, SkillId, SkillTree,
};

/// Side length of a single grid cell measured in world units.
pub const CELL_SIZE: f32 = 2.0;

/// Location of a single grid cell expressed as signed column and row indices.
///
/// The grid is centred on the main base, so negative coordinates are common.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    gx: i32,
    gz: i32,
}

impl GridCell {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(gx: i32, gz: i32) -> Self {
        Self { gx, gz }
    }

    /// Column index of the cell along the world x axis.
    #[must_use]
    pub const fn gx(&self) -> i32 {
        self.gx
    }

    /// Row index of the cell along the world z axis.
    #[must_use]
    pub const fn gz(&self) -> i32 {
        self.gz
    }

    /// Quantizes a world position to the cell that contains it.
    ///
    /// Grid coordinates are derived by rounding `world / CELL_SIZE`, so a cell
    /// is centred on its world position rather than anchored at a corner.
    #[must_use]
    pub fn from_world(position: Vec2) -> Self {
        Self {
            gx: (position.x / CELL_SIZE).round() as i32,
            gz: (position.y / CELL_SIZE).round() as i32,
        }
    }

    /// World position of the cell centre.
    #[must_use]
    pub fn to_world(self) -> Vec2 {
        Vec2::new(self.gx as f32 * CELL_SIZE, self.gz as f32 * CELL_SIZE)
    }

    /// Returns the orthogonally adjacent cell on the provided side.
    #[must_use]
    pub const fn neighbor(self, side: Side) -> Self {
        let (dx, dz) = side.offset();
        Self {
            gx: self.gx + dx,
            gz: self.gz + dz,
        }
    }

    /// Computes the Manhattan distance between two cells.
    #[must_use]
    pub fn manhattan_distance(self, other: GridCell) -> u32 {
        self.gx.abs_diff(other.gx) + self.gz.abs_diff(other.gz)
    }

    /// Squared Euclidean distance between two cells, in cells.
    #[must_use]
    pub fn distance_squared(self, other: GridCell) -> i64 {
        let dx = i64::from(self.gx) - i64::from(other.gx);
        let dz = i64::from(self.gz) - i64::from(other.gz);
        dx * dx + dz * dz
    }
}

/// Orthogonal sides of a grid cell, listed clockwise starting at north.
///
/// North points toward increasing `gz`, east toward increasing `gx`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Toward increasing row indices.
    North,
    /// Toward increasing column indices.
    East,
    /// Toward decreasing row indices.
    South,
    /// Toward decreasing column indices.
    West,
}

impl Side {
    /// All sides in clockwise order.
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

    /// Position of the side within [`Side::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    /// Side that faces the opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Next side when turning clockwise.
    #[must_use]
    pub const fn clockwise(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Cell offset `(dx, dz)` of the neighbor on this side.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::East => (1, 0),
            Self::South => (0, -1),
            Self::West => (-1, 0),
        }
    }
}

/// Rotation expressed as clockwise quarter turns from north.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rotation(u8);

impl Rotation {
    /// Rotation pointing north.
    pub const NONE: Rotation = Rotation(0);

    /// Creates a rotation from a number of clockwise quarter turns.
    #[must_use]
    pub const fn from_quarter_turns(turns: u8) -> Self {
        Self(turns % 4)
    }

    /// Rotation that points toward the provided side.
    #[must_use]
    pub const fn facing(side: Side) -> Self {
        Self(side.index() as u8)
    }

    /// Number of clockwise quarter turns, always in `0..4`.
    #[must_use]
    pub const fn quarter_turns(&self) -> u8 {
        self.0
    }

    /// Rotation in whole degrees.
    #[must_use]
    pub const fn degrees(&self) -> u16 {
        self.0 as u16 * 90
    }
}

/// Structural shape a wall cell presents based on its live connections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentType {
    /// Isolated wall with no connected neighbors.
    Post,
    /// Wall connected on exactly one side.
    End,
    /// Wall connected on two opposite sides.
    Straight,
    /// Wall connected on two adjacent sides.
    Corner,
    /// Wall connected on three sides.
    Tee,
    /// Wall connected on all four sides.
    Cross,
    /// Reserved diagonal piece that never links to its neighbors.
    Diagonal,
}

/// Unique identifier assigned to every simulated entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Something an enemy can attack or accumulate threat against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TargetRef {
    /// A recruited hero.
    Defender(EntityId),
    /// A placed building, including walls and towers.
    Building(EntityId),
    /// The main base at the centre of the map.
    Base,
}

impl TargetRef {
    /// Reports whether the reference points at a defender.
    #[must_use]
    pub const fn is_defender(&self) -> bool {
        matches!(self, Self::Defender(_))
    }
}

/// Gatherable resource types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Harvested from trees.
    Wood,
    /// Harvested from rocks.
    Stone,
}

/// Price of an action in each currency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cost {
    /// Wood required.
    pub wood: u32,
    /// Stone required.
    pub stone: u32,
    /// Gold required.
    pub gold: u32,
}

impl Cost {
    /// Creates a new cost.
    #[must_use]
    pub const fn new(wood: u32, stone: u32, gold: u32) -> Self {
        Self { wood, stone, gold }
    }

    /// Applies a percentage discount, rounding each component down.
    ///
    /// Discounts at or above 100 percent make the action free.
    #[must_use]
    pub fn discounted(self, percent: f32) -> Self {
        let keep = (100.0 - percent).clamp(0.0, 100.0).round() as u32;
        let apply = |value: u32| value.saturating_mul(keep) / 100;
        Self {
            wood: apply(self.wood),
            stone: apply(self.stone),
            gold: apply(self.gold),
        }
    }
}

/// Resources currently held by the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stockpile {
    /// Wood available for construction.
    pub wood: u32,
    /// Stone available for construction.
    pub stone: u32,
    /// Gold available for recruiting.
    pub gold: u32,
}

impl Stockpile {
    /// Creates a stockpile holding the provided amounts.
    #[must_use]
    pub const fn new(wood: u32, stone: u32, gold: u32) -> Self {
        Self { wood, stone, gold }
    }

    /// Reports whether every component of `cost` is covered.
    #[must_use]
    pub const fn can_afford(&self, cost: Cost) -> bool {
        self.wood >= cost.wood && self.stone >= cost.stone && self.gold >= cost.gold
    }

    /// Deducts `cost` when affordable, returning whether the spend happened.
    #[must_use]
    pub fn spend(&mut self, cost: Cost) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.wood -= cost.wood;
        self.stone -= cost.stone;
        self.gold -= cost.gold;
        true
    }

    /// Adds gathered resources of the given kind.
    pub fn deposit(&mut self, kind: ResourceKind, amount: u32) {
        match kind {
            ResourceKind::Wood => self.wood = self.wood.saturating_add(amount),
            ResourceKind::Stone => self.stone = self.stone.saturating_add(amount),
        }
    }

    /// Total of every component, used for lifetime statistics.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.wood.saturating_add(self.stone).saturating_add(self.gold)
    }
}

/// Lifecycle phases of a single run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the player to start a run.
    Menu,
    /// Presentation assets are being prepared.
    Loading,
    /// Gathering and building; no enemies spawn.
    Day,
    /// A wave attacks the base.
    Night,
    /// The base fell.
    GameOver,
    /// The final wave was survived.
    Victory,
}

impl Phase {
    /// Reports whether the run has ended.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::GameOver | Self::Victory)
    }

    /// Reports whether the simulation clock advances in this phase.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Day | Self::Night)
    }
}

/// Weather affecting combat and movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weather {
    /// No modifiers.
    Clear,
    /// Defender attack range shrinks.
    Foggy,
    /// Enemies move more slowly.
    Rainy,
}

impl Weather {
    /// All weather kinds in roll order.
    pub const ALL: [Weather; 3] = [Weather::Clear, Weather::Foggy, Weather::Rainy];

    /// Multiplier applied to defender attack range.
    #[must_use]
    pub const fn defender_range_factor(&self) -> f32 {
        match self {
            Self::Foggy => 0.7,
            Self::Clear | Self::Rainy => 1.0,
        }
    }

    /// Multiplier applied to enemy movement speed.
    #[must_use]
    pub const fn enemy_speed_factor(&self) -> f32 {
        match self {
            Self::Rainy => 0.85,
            Self::Clear | Self::Foggy => 1.0,
        }
    }
}

/// Boss composition attached to a wave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossFlag {
    /// No boss appears.
    #[default]
    None,
    /// The fox boss closes the wave.
    Fox,
    /// The raven boss closes the wave.
    Raven,
    /// Both bosses close the wave, fox first.
    Both,
}

impl BossFlag {
    /// Boss archetypes spawned for this flag, in spawn order.
    #[must_use]
    pub const fn bosses(&self) -> &'static [EnemyKind] {
        match self {
            Self::None => &[],
            Self::Fox => &[EnemyKind::FoxBoss],
            Self::Raven => &[EnemyKind::RavenBoss],
            Self::Both => &[EnemyKind::FoxBoss, EnemyKind::RavenBoss],
        }
    }
}

/// Number of enemies of a single archetype in a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveCount {
    /// Archetype to spawn.
    pub kind: EnemyKind,
    /// Number of copies.
    pub count: u32,
}

/// Scripted composition of one night.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveDefinition {
    /// Regular enemies grouped by archetype.
    pub counts: Vec<WaveCount>,
    /// Seconds between consecutive spawns.
    pub delay_secs: f32,
    /// Bosses appended after every regular enemy.
    #[serde(default)]
    pub boss: BossFlag,
}

/// Presentation cues the simulation requests without owning playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// A structure was placed.
    Build,
    /// A player action was refused.
    Reject,
    /// A critical strike landed.
    Critical,
    /// An enemy died.
    EnemyDeath,
    /// A boss entered the field.
    BossRoar,
    /// Night began.
    Dusk,
    /// Day began.
    Dawn,
    /// The base fell.
    Defeat,
    /// The final wave was survived.
    Victory,
}

/// Reasons a player action may be rejected without mutating state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The action is not available in the current phase.
    #[error("action is not available during {phase:?}")]
    InvalidPhase {
        /// Phase the simulation was in.
        phase: Phase,
    },
    /// The target cell lies outside the playable grid.
    #[error("cell ({}, {}) lies outside the grid", .cell.gx(), .cell.gz())]
    OutOfBounds {
        /// Requested cell.
        cell: GridCell,
    },
    /// The target cell belongs to the main base.
    #[error("cell ({}, {}) is part of the base", .cell.gx(), .cell.gz())]
    BaseFootprint {
        /// Requested cell.
        cell: GridCell,
    },
    /// The target cell already holds a structure.
    #[error("cell ({}, {}) is occupied", .cell.gx(), .cell.gz())]
    Occupied {
        /// Requested cell.
        cell: GridCell,
    },
    /// The stockpile does not cover the price.
    #[error("insufficient resources: need {needed:?}, have {available:?}")]
    InsufficientResources {
        /// Price of the action.
        needed: Cost,
        /// Resources held when the action was attempted.
        available: Stockpile,
    },
    /// No building exists at the requested cell.
    #[error("no building at ({}, {})", .cell.gx(), .cell.gz())]
    MissingBuilding {
        /// Requested cell.
        cell: GridCell,
    },
    /// The skill is already at its maximum level.
    #[error("skill {skill:?} is already at its maximum level")]
    SkillMaxed {
        /// Skill that was requested.
        skill: SkillId,
    },
    /// No unspent skill points remain.
    #[error("no skill points available")]
    NoSkillPoints,
}

/// Commands that express all permissible player inputs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Leaves the menu and begins loading a run.
    StartGame,
    /// Signals that presentation assets are ready; the first day begins.
    FinishLoading,
    /// Sets the player's normalized movement vector.
    Move {
        /// Horizontal input along world x, in `[-1, 1]`.
        x: f32,
        /// Vertical input along world z, in `[-1, 1]`.
        z: f32,
    },
    /// Requests construction of a building on a grid cell.
    Build {
        /// Type of building to construct.
        kind: BuildingKind,
        /// Cell the building occupies.
        cell: GridCell,
    },
    /// Requests removal of the building on a grid cell.
    Demolish {
        /// Cell whose building should be removed.
        cell: GridCell,
    },
    /// Requests recruitment of a hero.
    Recruit {
        /// Archetype of the hero.
        kind: HeroKind,
    },
    /// Spends a skill point on the provided skill.
    UpgradeSkill {
        /// Skill to raise by one level.
        skill: SkillId,
    },
}

/// Events broadcast by the simulation after processing commands and ticks.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The run entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: Phase,
    },
    /// A night began and its spawn queue was revealed.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
        /// Total enemies queued, bosses included.
        enemies: u32,
        /// Bosses closing the wave.
        boss: BossFlag,
    },
    /// Every enemy of the wave has been defeated.
    WaveCleared {
        /// One-based wave number.
        wave: u32,
    },
    /// The weather changed.
    WeatherChanged {
        /// Weather that became active.
        weather: Weather,
    },
    /// An enemy entered the field.
    EnemySpawned {
        /// Identifier of the enemy.
        id: EntityId,
        /// Archetype of the enemy.
        kind: EnemyKind,
    },
    /// An enemy was defeated.
    EnemyKilled {
        /// Identifier of the enemy.
        id: EntityId,
        /// Archetype of the enemy.
        kind: EnemyKind,
        /// Score awarded for the kill.
        score: u32,
    },
    /// A hero joined the defence.
    DefenderRecruited {
        /// Identifier of the hero.
        id: EntityId,
        /// Archetype of the hero.
        kind: HeroKind,
    },
    /// A hero fell.
    DefenderKilled {
        /// Identifier of the hero.
        id: EntityId,
        /// Archetype of the hero.
        kind: HeroKind,
    },
    /// A hero used its special ability.
    AbilityUsed {
        /// Identifier of the hero.
        id: EntityId,
        /// Archetype of the hero.
        kind: HeroKind,
    },
    /// A structure was placed.
    BuildingPlaced {
        /// Identifier of the building.
        id: EntityId,
        /// Type of the building.
        kind: BuildingKind,
        /// Cell occupied by the building.
        cell: GridCell,
    },
    /// A structure was destroyed by enemies.
    BuildingDestroyed {
        /// Identifier of the building.
        id: EntityId,
        /// Type of the building.
        kind: BuildingKind,
        /// Cell the building occupied.
        cell: GridCell,
    },
    /// A structure was demolished by the player.
    BuildingRemoved {
        /// Identifier of the building.
        id: EntityId,
        /// Type of the building.
        kind: BuildingKind,
        /// Cell the building occupied.
        cell: GridCell,
    },
    /// A player action was refused.
    ActionRejected {
        /// Why the action failed.
        reason: ActionError,
    },
    /// A skill gained a level.
    SkillUpgraded {
        /// Upgraded skill.
        skill: SkillId,
        /// Level after the upgrade.
        level: u32,
    },
    /// A critical strike landed; presentation may show an explosion here.
    CriticalHit {
        /// Ground position of the struck enemy.
        position: Vec2,
    },
    /// The main base lost health.
    BaseDamaged {
        /// Remaining base health.
        health: f32,
    },
    /// Rage mode switched on or off.
    RageModeChanged {
        /// Whether rage mode is now active.
        active: bool,
    },
    /// The kill combo changed.
    ComboChanged {
        /// Current combo count; zero when the combo lapsed.
        combo: u32,
    },
    /// Resources reached the stockpile.
    ResourcesGathered {
        /// Kind of resource.
        kind: ResourceKind,
        /// Amount added.
        amount: u32,
    },
    /// A hut sent out a collector.
    CollectorSpawned {
        /// Identifier of the collector.
        id: EntityId,
    },
    /// Free-form text for the message log.
    Message {
        /// Text to display.
        text: String,
    },
    /// A sound the presentation layer should play.
    Sound {
        /// Cue to play.
        cue: SoundCue,
    },
    /// The base fell; the run is over.
    GameOver {
        /// Progress earned by the run.
        delta: MetaProgressionDelta,
    },
    /// The final wave was survived; the run is over.
    Victory {
        /// Progress earned by the run.
        delta: MetaProgressionDelta,
    },
}
