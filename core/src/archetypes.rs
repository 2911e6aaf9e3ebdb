//! Per-archetype stat tables for enemies, heroes, and buildings.
//!
//! Every behavioural knob that differs between archetypes lives here so the
//! systems never branch on scattered type checks.

use serde::{Deserialize, Serialize};

use crate::Cost;

/// Enemy archetypes that can appear in a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Fast pack hunter that seeks out heroes.
    Wolf,
    /// Sturdy charger that rushes buildings.
    Boar,
    /// Flying harrier that prefers ranged heroes.
    Crow,
    /// Slow brute that smashes structures.
    Troll,
    /// Ground boss.
    FoxBoss,
    /// Flying boss.
    RavenBoss,
}

impl EnemyKind {
    /// All enemy archetypes.
    pub const ALL: [EnemyKind; 6] = [
        EnemyKind::Wolf,
        EnemyKind::Boar,
        EnemyKind::Crow,
        EnemyKind::Troll,
        EnemyKind::FoxBoss,
        EnemyKind::RavenBoss,
    ];

    /// Stat profile for the archetype.
    #[must_use]
    pub const fn profile(self) -> &'static EnemyProfile {
        match self {
            Self::Wolf => &WOLF,
            Self::Boar => &BOAR,
            Self::Crow => &CROW,
            Self::Troll => &TROLL,
            Self::FoxBoss => &FOX_BOSS,
            Self::RavenBoss => &RAVEN_BOSS,
        }
    }

    /// Reports whether the archetype is a boss.
    #[must_use]
    pub const fn is_boss(self) -> bool {
        self.profile().boss
    }
}

/// Static stats shared by every enemy of one archetype.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyProfile {
    /// Starting hit points.
    pub max_health: f32,
    /// Ground speed in world units per second.
    pub speed: f32,
    /// Damage dealt per attack.
    pub damage: f32,
    /// Reach of an attack measured from the enemy to the target's edge.
    pub attack_range: f32,
    /// Radius within which heroes become candidates without prior threat.
    pub aggro_range: f32,
    /// Distance beyond which a hero target is abandoned.
    pub leash_range: f32,
    /// Weighting between heroes (1.0) and buildings (0.0).
    pub defender_focus: f32,
    /// Hero archetypes that receive a flat priority bonus.
    pub priority_targets: &'static [HeroKind],
    /// Whether the enemy flies over walls.
    pub flying: bool,
    /// Height of the collision centre above the ground.
    pub altitude: f32,
    /// Whether buildings are considered as targets at all.
    pub targets_buildings: bool,
    /// Scale applied to incoming threat.
    pub threat_multiplier: f32,
    /// Score awarded on defeat before combo scaling.
    pub score: u32,
    /// Gold awarded on defeat.
    pub bounty: u32,
    /// Whether the archetype is a boss.
    pub boss: bool,
}

const WOLF: EnemyProfile = EnemyProfile {
    max_health: 40.0,
    speed: 4.5,
    damage: 6.0,
    attack_range: 1.5,
    aggro_range: 10.0,
    leash_range: 18.0,
    defender_focus: 0.8,
    priority_targets: &[],
    flying: false,
    altitude: 0.5,
    targets_buildings: false,
    threat_multiplier: 1.0,
    score: 10,
    bounty: 2,
    boss: false,
};

const BOAR: EnemyProfile = EnemyProfile {
    max_health: 80.0,
    speed: 3.0,
    damage: 12.0,
    attack_range: 1.5,
    aggro_range: 6.0,
    leash_range: 12.0,
    defender_focus: 0.2,
    priority_targets: &[],
    flying: false,
    altitude: 0.5,
    targets_buildings: true,
    threat_multiplier: 0.8,
    score: 15,
    bounty: 3,
    boss: false,
};

const CROW: EnemyProfile = EnemyProfile {
    max_health: 25.0,
    speed: 5.0,
    damage: 4.0,
    attack_range: 1.5,
    aggro_range: 12.0,
    leash_range: 20.0,
    defender_focus: 0.7,
    priority_targets: &[HeroKind::Archer, HeroKind::Bomber],
    flying: true,
    altitude: 3.0,
    targets_buildings: false,
    threat_multiplier: 1.2,
    score: 12,
    bounty: 2,
    boss: false,
};

const TROLL: EnemyProfile = EnemyProfile {
    max_health: 200.0,
    speed: 2.0,
    damage: 25.0,
    attack_range: 2.0,
    aggro_range: 8.0,
    leash_range: 14.0,
    defender_focus: 0.4,
    priority_targets: &[HeroKind::Tank, HeroKind::Knight],
    flying: false,
    altitude: 0.8,
    targets_buildings: true,
    threat_multiplier: 0.6,
    score: 30,
    bounty: 6,
    boss: false,
};

const FOX_BOSS: EnemyProfile = EnemyProfile {
    max_health: 600.0,
    speed: 3.5,
    damage: 30.0,
    attack_range: 2.0,
    aggro_range: 14.0,
    leash_range: 24.0,
    defender_focus: 0.6,
    priority_targets: &[HeroKind::Assassin, HeroKind::Shadow],
    flying: false,
    altitude: 1.0,
    targets_buildings: true,
    threat_multiplier: 0.5,
    score: 150,
    bounty: 25,
    boss: true,
};

const RAVEN_BOSS: EnemyProfile = EnemyProfile {
    max_health: 450.0,
    speed: 4.0,
    damage: 22.0,
    attack_range: 2.0,
    aggro_range: 16.0,
    leash_range: 26.0,
    defender_focus: 0.7,
    priority_targets: &[HeroKind::Archer, HeroKind::Bomber, HeroKind::Healer],
    flying: true,
    altitude: 4.0,
    targets_buildings: false,
    threat_multiplier: 0.5,
    score: 150,
    bounty: 25,
    boss: true,
};

/// Hero archetypes the player can recruit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeroKind {
    /// Plain melee fighter.
    Knight,
    /// Long-range marksman.
    Archer,
    /// Lobs exploding carrots that splash nearby enemies.
    Bomber,
    /// Burrows to slow every enemy close by.
    Tunneler,
    /// Confuses the nearest enemy.
    Shadow,
    /// Taunts enemies away from buildings.
    Tank,
    /// Teleports onto the weakest enemy.
    Assassin,
    /// Restores health to nearby heroes.
    Healer,
}

impl HeroKind {
    /// All hero archetypes.
    pub const ALL: [HeroKind; 8] = [
        HeroKind::Knight,
        HeroKind::Archer,
        HeroKind::Bomber,
        HeroKind::Tunneler,
        HeroKind::Shadow,
        HeroKind::Tank,
        HeroKind::Assassin,
        HeroKind::Healer,
    ];

    /// Stat profile for the archetype.
    #[must_use]
    pub const fn profile(self) -> &'static HeroProfile {
        match self {
            Self::Knight => &KNIGHT,
            Self::Archer => &ARCHER,
            Self::Bomber => &BOMBER,
            Self::Tunneler => &TUNNELER,
            Self::Shadow => &SHADOW,
            Self::Tank => &TANK,
            Self::Assassin => &ASSASSIN,
            Self::Healer => &HEALER,
        }
    }
}

/// Static stats shared by every hero of one archetype.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeroProfile {
    /// Starting hit points.
    pub max_health: f32,
    /// Damage dealt per attack.
    pub damage: f32,
    /// Attack range in world units.
    pub range: f32,
    /// Seconds between attacks.
    pub attack_cooldown: f32,
    /// Probability in `[0, 1]` that an attack critically strikes.
    pub crit_chance: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Gold spent to recruit.
    pub cost_gold: u32,
    /// Whether the hero attacks from range.
    pub ranged: bool,
}

impl HeroProfile {
    /// Price of recruiting the hero.
    #[must_use]
    pub const fn cost(&self) -> Cost {
        Cost::new(0, 0, self.cost_gold)
    }
}

const KNIGHT: HeroProfile = HeroProfile {
    max_health: 150.0,
    damage: 12.0,
    range: 2.0,
    attack_cooldown: 1.0,
    crit_chance: 0.10,
    speed: 5.0,
    cost_gold: 20,
    ranged: false,
};

const ARCHER: HeroProfile = HeroProfile {
    max_health: 80.0,
    damage: 10.0,
    range: 10.0,
    attack_cooldown: 1.2,
    crit_chance: 0.15,
    speed: 5.0,
    cost_gold: 25,
    ranged: true,
};

const BOMBER: HeroProfile = HeroProfile {
    max_health: 90.0,
    damage: 18.0,
    range: 8.0,
    attack_cooldown: 2.0,
    crit_chance: 0.10,
    speed: 4.5,
    cost_gold: 35,
    ranged: true,
};

const TUNNELER: HeroProfile = HeroProfile {
    max_health: 110.0,
    damage: 9.0,
    range: 2.0,
    attack_cooldown: 1.0,
    crit_chance: 0.05,
    speed: 5.0,
    cost_gold: 30,
    ranged: false,
};

const SHADOW: HeroProfile = HeroProfile {
    max_health: 90.0,
    damage: 11.0,
    range: 6.0,
    attack_cooldown: 1.1,
    crit_chance: 0.20,
    speed: 6.0,
    cost_gold: 30,
    ranged: true,
};

const TANK: HeroProfile = HeroProfile {
    max_health: 260.0,
    damage: 8.0,
    range: 2.0,
    attack_cooldown: 1.4,
    crit_chance: 0.05,
    speed: 4.0,
    cost_gold: 40,
    ranged: false,
};

const ASSASSIN: HeroProfile = HeroProfile {
    max_health: 85.0,
    damage: 22.0,
    range: 2.0,
    attack_cooldown: 1.3,
    crit_chance: 0.30,
    speed: 6.5,
    cost_gold: 45,
    ranged: false,
};

const HEALER: HeroProfile = HeroProfile {
    max_health: 90.0,
    damage: 5.0,
    range: 7.0,
    attack_cooldown: 1.5,
    crit_chance: 0.05,
    speed: 4.5,
    cost_gold: 40,
    ranged: true,
};

/// Structures the player can place on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    /// Auto-tiling wall segment that blocks ground movement.
    Wall,
    /// Arrow tower that fires at the nearest enemy.
    Tower,
    /// Hut that periodically sends out resource collectors.
    Hut,
}

impl BuildingKind {
    /// Stat profile for the building.
    #[must_use]
    pub const fn profile(self) -> &'static BuildingProfile {
        match self {
            Self::Wall => &WALL,
            Self::Tower => &TOWER,
            Self::Hut => &HUT,
        }
    }
}

/// Static stats shared by every building of one kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildingProfile {
    /// Starting hit points before skill bonuses.
    pub max_health: f32,
    /// Undiscounted price.
    pub cost: Cost,
}

const WALL: BuildingProfile = BuildingProfile {
    max_health: 120.0,
    cost: Cost::new(5, 5, 0),
};

const TOWER: BuildingProfile = BuildingProfile {
    max_health: 200.0,
    cost: Cost::new(20, 15, 0),
};

const HUT: BuildingProfile = BuildingProfile {
    max_health: 150.0,
    cost: Cost::new(25, 5, 0),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_weights_stay_normalised() {
        for kind in EnemyKind::ALL {
            let focus = kind.profile().defender_focus;
            assert!((0.0..=1.0).contains(&focus), "{kind:?} focus {focus}");
            assert!(kind.profile().leash_range > kind.profile().aggro_range);
        }
    }

    #[test]
    fn flying_enemies_prefer_ranged_heroes() {
        for kind in EnemyKind::ALL {
            let profile = kind.profile();
            if profile.flying {
                assert!(profile
                    .priority_targets
                    .iter()
                    .any(|hero| hero.profile().ranged));
            }
        }
    }

    #[test]
    fn only_bosses_are_flagged_as_bosses() {
        let bosses: Vec<_> = EnemyKind::ALL
            .into_iter()
            .filter(|kind| kind.is_boss())
            .collect();
        assert_eq!(bosses, vec![EnemyKind::FoxBoss, EnemyKind::RavenBoss]);
    }
}
