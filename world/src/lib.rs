#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for Hearthguard.
//!
//! The [`World`] is the explicit simulation context handed to every system.
//! Player input flows in through [`apply`]; read-only helpers live in
//! [`query`]. Systems mutate entity records directly, so the entity lists are
//! public, but every placement or removal that affects the wall grid goes
//! through the world so grid, building list, and enemy references stay in
//! sync.

use std::time::Duration;

use glam::Vec2;
use hearthguard_core::{
    ActionError, BuildingKind, Command, EntityId, Event, GridCell, HeroKind, Phase,
    ProfileSnapshot, SkillEffects, SkillId, SkillTree, SoundCue, Stockpile, TargetRef, Weather,
};
use log::debug;

pub mod entities;
pub mod walls;

pub use entities::{
    elevate, ground, Base, Building, Collector, CollectorState, Defender, Enemy, NodeState,
    Partner, Player, Projectile, ProjectileKind, ProjectileSpawn, ResourceNode, ThreatEntry,
};
pub use walls::{determine_segment_type, WallCell, WallGrid, WallOptions};

const PLAYER_SPEED: f32 = 8.0;
const PLAYER_START: Vec2 = Vec2::new(0.0, -8.0);
const PARTNER_OFFSETS: [Vec2; 2] = [Vec2::new(-2.0, -2.0), Vec2::new(2.0, -2.0)];
const BASE_FOOTPRINT_HALF_EXTENT: i32 = 1;
const RECRUIT_RING_OFFSET: f32 = 3.0;
const RECRUIT_ANGLE_STEP: f32 = 2.4;

/// Seconds between collectors sent out by a hut.
pub const COLLECTOR_INTERVAL_SECS: f32 = 20.0;

/// Parameters used to create a fresh world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldSettings {
    /// Largest absolute cell coordinate of the playable grid.
    pub grid_half_extent: i32,
    /// Hit points of the main base.
    pub base_max_health: f32,
    /// Resources available when the run starts.
    pub stockpile: Stockpile,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            grid_half_extent: 30,
            base_max_health: 1000.0,
            stockpile: Stockpile::new(60, 40, 50),
        }
    }
}

/// Represents the state of the Hearthguard simulation.
#[derive(Clone, Debug)]
pub struct World {
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Simulation time elapsed while running.
    pub elapsed: Duration,
    /// Walls and obstructions consulted by pathfinding.
    pub walls: WallGrid,
    /// Main base.
    pub base: Base,
    /// Live enemies.
    pub enemies: Vec<Enemy>,
    /// Recruited heroes.
    pub defenders: Vec<Defender>,
    /// Placed structures.
    pub buildings: Vec<Building>,
    /// Projectiles in flight.
    pub projectiles: Vec<Projectile>,
    /// Player avatar.
    pub player: Player,
    /// Companions trailing the player.
    pub partners: Vec<Partner>,
    /// Hut workers on a trip.
    pub collectors: Vec<Collector>,
    /// Trees and rocks.
    pub resources: Vec<ResourceNode>,
    /// Resources held by the player.
    pub stockpile: Stockpile,
    /// Skill levels.
    pub skills: SkillTree,
    /// Effects derived from `skills`.
    pub effects: SkillEffects,
    /// Unspent skill points.
    pub skill_points: u32,
    /// Skill points spent during this run.
    pub skill_points_spent: u32,
    /// Active weather.
    pub weather: Weather,
    /// Whether rage mode is active.
    pub rage_active: bool,
    /// One-based wave number; zero before the first day.
    pub wave: u32,
    /// Score accumulated this run.
    pub score: u32,
    /// Current kill combo.
    pub combo: u32,
    /// Resources gathered this run.
    pub resources_gathered: u32,
    /// Bosses defeated this run.
    pub bosses_killed: u32,
    next_id: u32,
}

impl World {
    /// Creates a world in the menu phase from settings and a persisted profile.
    #[must_use]
    pub fn new(settings: WorldSettings, profile: &ProfileSnapshot) -> Self {
        let mut walls = WallGrid::new(settings.grid_half_extent);
        for gx in -BASE_FOOTPRINT_HALF_EXTENT..=BASE_FOOTPRINT_HALF_EXTENT {
            for gz in -BASE_FOOTPRINT_HALF_EXTENT..=BASE_FOOTPRINT_HALF_EXTENT {
                walls.set_blocked(GridCell::new(gx, gz), true);
            }
        }

        let mut world = Self {
            phase: Phase::Menu,
            elapsed: Duration::ZERO,
            walls,
            base: Base {
                position: Vec2::ZERO,
                health: settings.base_max_health,
                max_health: settings.base_max_health,
            },
            enemies: Vec::new(),
            defenders: Vec::new(),
            buildings: Vec::new(),
            projectiles: Vec::new(),
            player: Player {
                position: PLAYER_START,
                input: Vec2::ZERO,
                speed: PLAYER_SPEED,
            },
            partners: Vec::new(),
            collectors: Vec::new(),
            resources: Vec::new(),
            stockpile: settings.stockpile,
            skills: profile.skills.clone(),
            effects: profile.skills.effects(),
            skill_points: profile.meta.skill_points,
            skill_points_spent: 0,
            weather: Weather::Clear,
            rage_active: false,
            wave: 0,
            score: 0,
            combo: 0,
            resources_gathered: 0,
            bosses_killed: 0,
            next_id: 1,
        };

        for offset in PARTNER_OFFSETS {
            let id = world.allocate_id();
            world.partners.push(Partner {
                id,
                position: PLAYER_START + offset,
                offset,
                visible: true,
            });
        }
        world
    }

    /// Hands out the next unused entity identifier.
    pub fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Reports whether the cell is covered by the main base.
    #[must_use]
    pub fn is_base_footprint(&self, cell: GridCell) -> bool {
        let centre = GridCell::from_world(self.base.position);
        (cell.gx() - centre.gx()).abs() <= BASE_FOOTPRINT_HALF_EXTENT
            && (cell.gz() - centre.gz()).abs() <= BASE_FOOTPRINT_HALF_EXTENT
    }

    /// Stores the player's movement input, clamping each axis to `[-1, 1]`.
    pub fn set_movement(&mut self, x: f32, z: f32) {
        let clamp = |value: f32| if value.is_finite() { value.clamp(-1.0, 1.0) } else { 0.0 };
        self.player.input = Vec2::new(clamp(x), clamp(z));
    }

    /// Builds a structure on a grid cell during the day.
    pub fn place_building(
        &mut self,
        kind: BuildingKind,
        cell: GridCell,
    ) -> Result<EntityId, ActionError> {
        if self.phase != Phase::Day {
            return Err(ActionError::InvalidPhase { phase: self.phase });
        }
        if !self.walls.in_bounds(cell) {
            return Err(ActionError::OutOfBounds { cell });
        }
        if self.is_base_footprint(cell) {
            return Err(ActionError::BaseFootprint { cell });
        }
        if self.walls.is_blocked(cell) {
            return Err(ActionError::Occupied { cell });
        }

        let profile = kind.profile();
        let cost = profile.cost.discounted(self.effects.cheap_buildings_pct);
        let available = self.stockpile;
        if !self.stockpile.spend(cost) {
            return Err(ActionError::InsufficientResources {
                needed: cost,
                available,
            });
        }

        let id = self.allocate_id();
        let max_health = match kind {
            BuildingKind::Wall => profile.max_health + self.effects.wall_health,
            BuildingKind::Tower | BuildingKind::Hut => profile.max_health,
        };
        match kind {
            BuildingKind::Wall => {
                let _ = self.walls.add_wall(cell, id, WallOptions::default());
            }
            BuildingKind::Tower | BuildingKind::Hut => self.walls.set_blocked(cell, true),
        }
        self.buildings.push(Building {
            id,
            kind,
            cell,
            health: max_health,
            max_health,
            attack_timer: 0.0,
            spawn_timer: COLLECTOR_INTERVAL_SECS,
        });
        Ok(id)
    }

    /// Removes the building on a cell during the day.
    pub fn demolish(&mut self, cell: GridCell) -> Result<Building, ActionError> {
        if self.phase != Phase::Day {
            return Err(ActionError::InvalidPhase { phase: self.phase });
        }
        let id = query::building_at(self, cell)
            .map(|building| building.id)
            .ok_or(ActionError::MissingBuilding { cell })?;
        self.remove_building(id)
            .ok_or(ActionError::MissingBuilding { cell })
    }

    /// Removes a building, freeing its cell and dropping enemy references to it.
    pub fn remove_building(&mut self, id: EntityId) -> Option<Building> {
        let index = self.buildings.iter().position(|building| building.id == id)?;
        let building = self.buildings.remove(index);
        match building.kind {
            BuildingKind::Wall => {
                let _ = self.walls.remove_wall(building.cell);
            }
            BuildingKind::Tower | BuildingKind::Hut => {
                self.walls.set_blocked(building.cell, false);
            }
        }

        let target = TargetRef::Building(id);
        for enemy in &mut self.enemies {
            let _ = enemy.threat_table.remove(&target);
            if enemy.target_building == Some(id) {
                enemy.target_building = None;
            }
            if enemy.original_target == Some(id) {
                enemy.original_target = None;
            }
            if enemy.current_target == Some(target) {
                enemy.current_target = None;
            }
        }
        Some(building)
    }

    /// Recruits a hero beside the base.
    pub fn recruit(&mut self, kind: HeroKind) -> Result<EntityId, ActionError> {
        if !self.phase.is_running() {
            return Err(ActionError::InvalidPhase { phase: self.phase });
        }
        let cost = kind.profile().cost();
        let available = self.stockpile;
        if !self.stockpile.spend(cost) {
            return Err(ActionError::InsufficientResources {
                needed: cost,
                available,
            });
        }

        let id = self.allocate_id();
        let angle = self.defenders.len() as f32 * RECRUIT_ANGLE_STEP;
        let post = self.base.position
            + Vec2::from_angle(angle) * (Base::RADIUS + RECRUIT_RING_OFFSET);
        self.defenders.push(Defender::new(
            id,
            kind,
            post,
            self.effects.hero_stats_pct,
        ));
        Ok(id)
    }

    /// Spends a skill point on the provided skill, returning its new level.
    pub fn upgrade_skill(&mut self, skill: SkillId) -> Result<u32, ActionError> {
        if self.skills.level(skill) >= skill.max_level() {
            return Err(ActionError::SkillMaxed { skill });
        }
        if self.skill_points == 0 {
            return Err(ActionError::NoSkillPoints);
        }
        let level = self
            .skills
            .upgrade(skill)
            .ok_or(ActionError::SkillMaxed { skill })?;
        self.skill_points -= 1;
        self.skill_points_spent = self.skill_points_spent.saturating_add(1);
        self.effects = self.skills.effects();
        Ok(level)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let outcome = match command {
        Command::StartGame => {
            if world.phase == Phase::Menu {
                world.phase = Phase::Loading;
                out_events.push(Event::PhaseChanged {
                    phase: Phase::Loading,
                });
                Ok(())
            } else {
                Err(ActionError::InvalidPhase { phase: world.phase })
            }
        }
        Command::FinishLoading => {
            if world.phase == Phase::Loading {
                world.phase = Phase::Day;
                world.wave = 1;
                out_events.push(Event::PhaseChanged { phase: Phase::Day });
                Ok(())
            } else {
                Err(ActionError::InvalidPhase { phase: world.phase })
            }
        }
        Command::Move { x, z } => {
            world.set_movement(x, z);
            Ok(())
        }
        Command::Build { kind, cell } => world.place_building(kind, cell).map(|id| {
            out_events.push(Event::BuildingPlaced { id, kind, cell });
            out_events.push(Event::Sound {
                cue: SoundCue::Build,
            });
        }),
        Command::Demolish { cell } => world.demolish(cell).map(|building| {
            out_events.push(Event::BuildingRemoved {
                id: building.id,
                kind: building.kind,
                cell: building.cell,
            });
        }),
        Command::Recruit { kind } => world.recruit(kind).map(|id| {
            out_events.push(Event::DefenderRecruited { id, kind });
            out_events.push(Event::Message {
                text: format!("{kind:?} joined the defence"),
            });
        }),
        Command::UpgradeSkill { skill } => world.upgrade_skill(skill).map(|level| {
            out_events.push(Event::SkillUpgraded { skill, level });
        }),
    };

    if let Err(reason) = outcome {
        debug!("rejected {command:?}: {reason}");
        out_events.push(Event::ActionRejected { reason });
        out_events.push(Event::Sound {
            cue: SoundCue::Reject,
        });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use hearthguard_core::{EntityId, GridCell};

    use super::{Building, Defender, World};

    /// Live building occupying the cell.
    #[must_use]
    pub fn building_at(world: &World, cell: GridCell) -> Option<&Building> {
        world
            .buildings
            .iter()
            .find(|building| building.cell == cell && building.is_alive())
    }

    /// Live building with the provided identifier.
    #[must_use]
    pub fn building(world: &World, id: EntityId) -> Option<&Building> {
        world
            .buildings
            .iter()
            .find(|building| building.id == id && building.is_alive())
    }

    /// Live defender with the provided identifier.
    #[must_use]
    pub fn defender(world: &World, id: EntityId) -> Option<&Defender> {
        world
            .defenders
            .iter()
            .find(|defender| defender.id == id && defender.is_alive())
    }

    /// Reports whether any boss is on the field.
    #[must_use]
    pub fn boss_active(world: &World) -> bool {
        world
            .enemies
            .iter()
            .any(|enemy| enemy.is_alive() && enemy.kind.is_boss())
    }

    /// Number of collectors currently out for a hut.
    #[must_use]
    pub fn collectors_for(world: &World, hut: EntityId) -> usize {
        world
            .collectors
            .iter()
            .filter(|collector| collector.hut == hut)
            .count()
    }

    /// Nearest live non-wall building to a position, ties broken by id.
    #[must_use]
    pub fn nearest_structure(world: &World, position: Vec2) -> Option<&Building> {
        world
            .buildings
            .iter()
            .filter(|building| building.is_alive() && building.kind != super::BuildingKind::Wall)
            .min_by(|a, b| {
                a.position()
                    .distance_squared(position)
                    .total_cmp(&b.position().distance_squared(position))
                    .then(a.id.cmp(&b.id))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearthguard_core::{Cost, EnemyKind};

    fn day_world() -> World {
        let mut world = World::new(WorldSettings::default(), &ProfileSnapshot::default());
        let mut events = Vec::new();
        apply(&mut world, Command::StartGame, &mut events);
        apply(&mut world, Command::FinishLoading, &mut events);
        assert_eq!(world.phase, Phase::Day);
        world
    }

    #[test]
    fn base_footprint_is_blocked_from_the_start() {
        let world = World::new(WorldSettings::default(), &ProfileSnapshot::default());
        assert!(world.walls.is_blocked_cell(GridCell::new(1, -1)));
        assert!(world.walls.is_walkable(GridCell::new(2, 0)));
        assert_eq!(world.partners.len(), 2);
    }

    #[test]
    fn building_outside_the_day_is_rejected() {
        let mut world = World::new(WorldSettings::default(), &ProfileSnapshot::default());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Build {
                kind: BuildingKind::Wall,
                cell: GridCell::new(4, 4),
            },
            &mut events,
        );
        assert_eq!(
            events[0],
            Event::ActionRejected {
                reason: ActionError::InvalidPhase { phase: Phase::Menu }
            }
        );
        assert!(world.buildings.is_empty());
    }

    #[test]
    fn rejected_build_leaves_stockpile_untouched() {
        let mut world = day_world();
        world.stockpile = Stockpile::new(4, 100, 0);
        let result = world.place_building(BuildingKind::Wall, GridCell::new(5, 5));
        assert_eq!(
            result,
            Err(ActionError::InsufficientResources {
                needed: Cost::new(5, 5, 0),
                available: Stockpile::new(4, 100, 0),
            })
        );
        assert_eq!(world.stockpile, Stockpile::new(4, 100, 0));
        assert!(!world.walls.has_wall(GridCell::new(5, 5)));
    }

    #[test]
    fn cheap_buildings_and_wall_health_apply_on_placement() {
        let mut profile = ProfileSnapshot::default();
        let _ = profile.skills.upgrade(SkillId::CheapBuildings);
        let _ = profile.skills.upgrade(SkillId::CheapBuildings);
        let _ = profile.skills.upgrade(SkillId::WallHealth);
        let mut world = World::new(WorldSettings::default(), &profile);
        world.phase = Phase::Day;

        let id = world
            .place_building(BuildingKind::Tower, GridCell::new(4, 0))
            .expect("tower");
        assert_eq!(world.stockpile, Stockpile::new(44, 28, 50));
        assert!(world.walls.is_blocked_cell(GridCell::new(4, 0)));
        assert_eq!(query::building(&world, id).map(|b| b.max_health), Some(200.0));

        let wall = world
            .place_building(BuildingKind::Wall, GridCell::new(6, 0))
            .expect("wall");
        assert_eq!(query::building(&world, wall).map(|b| b.max_health), Some(145.0));
    }

    #[test]
    fn occupied_and_base_cells_are_refused() {
        let mut world = day_world();
        let cell = GridCell::new(3, 3);
        let _ = world.place_building(BuildingKind::Wall, cell).expect("wall");
        assert_eq!(
            world.place_building(BuildingKind::Hut, cell),
            Err(ActionError::Occupied { cell })
        );
        assert_eq!(
            world.place_building(BuildingKind::Wall, GridCell::new(0, 1)),
            Err(ActionError::BaseFootprint {
                cell: GridCell::new(0, 1)
            })
        );
    }

    #[test]
    fn removing_a_building_drops_enemy_references() {
        let mut world = day_world();
        let hut = world
            .place_building(BuildingKind::Hut, GridCell::new(6, 6))
            .expect("hut");
        let enemy_id = world.allocate_id();
        let mut enemy = Enemy::new(enemy_id, EnemyKind::Boar, Vec2::new(20.0, 20.0));
        enemy.target_building = Some(hut);
        enemy.original_target = Some(hut);
        enemy.current_target = Some(TargetRef::Building(hut));
        let _ = enemy.threat_table.insert(
            TargetRef::Building(hut),
            ThreatEntry {
                threat: 5.0,
                last_update: Duration::ZERO,
            },
        );
        world.enemies.push(enemy);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Demolish {
                cell: GridCell::new(6, 6),
            },
            &mut events,
        );

        let enemy = &world.enemies[0];
        assert!(enemy.target_building.is_none());
        assert!(enemy.original_target.is_none());
        assert!(enemy.current_target.is_none());
        assert!(enemy.threat_table.is_empty());
        assert!(world.walls.is_walkable(GridCell::new(6, 6)));
        assert!(matches!(events[0], Event::BuildingRemoved { id, .. } if id == hut));
    }

    #[test]
    fn skill_upgrades_consume_points() {
        let mut profile = ProfileSnapshot::default();
        profile.meta.skill_points = 1;
        let mut world = World::new(WorldSettings::default(), &profile);

        assert_eq!(world.upgrade_skill(SkillId::TowerDamage), Ok(1));
        assert_eq!(world.effects.tower_damage_pct, 10.0);
        assert_eq!(
            world.upgrade_skill(SkillId::TowerDamage),
            Err(ActionError::NoSkillPoints)
        );
        assert_eq!(world.skill_points_spent, 1);
    }

    #[test]
    fn recruits_pay_gold_and_gain_posts_around_the_base() {
        let mut world = day_world();
        let first = world.recruit(HeroKind::Knight).expect("knight");
        let second = world.recruit(HeroKind::Archer).expect("archer");
        assert_ne!(first, second);
        assert_eq!(world.stockpile.gold, 5);
        for defender in &world.defenders {
            assert!((defender.post.length() - 6.0).abs() < 1e-4);
        }
        assert!(matches!(
            world.recruit(HeroKind::Tank),
            Err(ActionError::InsufficientResources { .. })
        ));
    }
}
