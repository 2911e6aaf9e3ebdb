//! Skill tree and meta-progression data that cross the persistence boundary.
//!
//! The simulation never touches storage. Adapters inject a [`ProfileSnapshot`]
//! when a run starts and persist the [`MetaProgressionDelta`] it reports when
//! the run ends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Upgradeable skills.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillId {
    /// Percentage bonus to tower damage.
    TowerDamage,
    /// Percentage bonus to tower range.
    TowerRange,
    /// Flat bonus to hero critical strike chance.
    CritChance,
    /// Percentage damage bonus while rage mode is active.
    RageBonus,
    /// Percentage discount on building prices.
    CheapBuildings,
    /// Flat bonus to wall hit points.
    WallHealth,
    /// Percentage bonus to hero health and damage.
    HeroStats,
    /// Extra seconds of daylight.
    DayLength,
    /// Base hit points restored at every dawn.
    FortressRegen,
}

impl SkillId {
    /// All skills.
    pub const ALL: [SkillId; 9] = [
        SkillId::TowerDamage,
        SkillId::TowerRange,
        SkillId::CritChance,
        SkillId::RageBonus,
        SkillId::CheapBuildings,
        SkillId::WallHealth,
        SkillId::HeroStats,
        SkillId::DayLength,
        SkillId::FortressRegen,
    ];

    /// Highest level the skill can reach.
    #[must_use]
    pub const fn max_level(self) -> u32 {
        5
    }

    /// Effect contributed by a single level of the skill.
    const fn per_level(self) -> f32 {
        match self {
            Self::TowerDamage | Self::TowerRange | Self::CheapBuildings | Self::HeroStats => 10.0,
            Self::CritChance => 0.05,
            Self::RageBonus => 15.0,
            Self::WallHealth => 25.0,
            Self::DayLength => 10.0,
            Self::FortressRegen => 50.0,
        }
    }
}

/// Per-skill levels owned by the player.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTree {
    levels: BTreeMap<SkillId, u32>,
}

impl SkillTree {
    /// Current level of a skill; zero when never upgraded.
    #[must_use]
    pub fn level(&self, skill: SkillId) -> u32 {
        self.levels.get(&skill).copied().unwrap_or(0)
    }

    /// Raises a skill by one level, returning the new level.
    ///
    /// Returns `None` when the skill is already maxed.
    pub fn upgrade(&mut self, skill: SkillId) -> Option<u32> {
        let level = self.levels.entry(skill).or_insert(0);
        if *level >= skill.max_level() {
            return None;
        }
        *level += 1;
        Some(*level)
    }

    /// Derives the effect lookup consumed by combat and economy formulas.
    #[must_use]
    pub fn effects(&self) -> SkillEffects {
        let value = |skill: SkillId| self.level(skill) as f32 * skill.per_level();
        SkillEffects {
            tower_damage_pct: value(SkillId::TowerDamage),
            tower_range_pct: value(SkillId::TowerRange),
            crit_chance: value(SkillId::CritChance),
            rage_bonus_pct: value(SkillId::RageBonus),
            cheap_buildings_pct: value(SkillId::CheapBuildings),
            wall_health: value(SkillId::WallHealth),
            hero_stats_pct: value(SkillId::HeroStats),
            day_length_secs: value(SkillId::DayLength),
            fortress_regen: value(SkillId::FortressRegen),
        }
    }
}

/// Flattened skill effects.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SkillEffects {
    /// Percentage added to tower damage.
    pub tower_damage_pct: f32,
    /// Percentage added to tower range.
    pub tower_range_pct: f32,
    /// Probability added to every hero's critical strike chance.
    pub crit_chance: f32,
    /// Percentage added to hero damage while rage mode is active.
    pub rage_bonus_pct: f32,
    /// Percentage removed from building prices.
    pub cheap_buildings_pct: f32,
    /// Hit points added to every wall.
    pub wall_health: f32,
    /// Percentage added to hero health and damage.
    pub hero_stats_pct: f32,
    /// Seconds added to every day.
    pub day_length_secs: f32,
    /// Base hit points restored at dawn.
    pub fortress_regen: f32,
}

/// Lifetime counters that survive between runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaProgression {
    /// Runs started.
    pub games_played: u32,
    /// Highest wave ever reached.
    pub best_wave: u32,
    /// Resources gathered across every run.
    pub total_resources: u64,
    /// Bosses defeated across every run.
    pub bosses_killed: u32,
    /// Skill points not yet spent.
    pub skill_points: u32,
}

impl MetaProgression {
    /// Folds the outcome of one run into the lifetime counters.
    pub fn apply(&mut self, delta: &MetaProgressionDelta) {
        self.games_played = self.games_played.saturating_add(1);
        self.best_wave = self.best_wave.max(delta.wave_reached);
        self.total_resources = self
            .total_resources
            .saturating_add(u64::from(delta.resources_gathered));
        self.bosses_killed = self.bosses_killed.saturating_add(delta.bosses_killed);
        self.skill_points = self
            .skill_points
            .saturating_sub(delta.skill_points_spent)
            .saturating_add(delta.skill_points_earned);
    }
}

/// Outcome of a single run reported to the persistence layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaProgressionDelta {
    /// Whether the run ended in victory.
    pub victory: bool,
    /// Final score.
    pub score: u32,
    /// Wave the run ended on.
    pub wave_reached: u32,
    /// Resources gathered during the run.
    pub resources_gathered: u32,
    /// Bosses defeated during the run.
    pub bosses_killed: u32,
    /// Skill points awarded for the run.
    pub skill_points_earned: u32,
    /// Skill points spent on upgrades during the run.
    pub skill_points_spent: u32,
}

/// Persisted player state injected at the start of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    /// Skill levels.
    pub skills: SkillTree,
    /// Lifetime counters.
    pub meta: MetaProgression,
}
