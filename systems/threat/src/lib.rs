#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Threat bookkeeping and target selection for enemies.
//!
//! Each enemy carries a threat table keyed by the source that provoked it.
//! Selection blends accumulated threat with proximity, archetype preferences,
//! and target health, then biases the result between heroes and buildings by
//! the enemy's `defender_focus`. A taunting hero nearby overrides everything.

use std::{cmp::Ordering, time::Duration};

use glam::Vec2;
use hearthguard_core::TargetRef;
use hearthguard_world::{Building, Defender, Enemy, ThreatEntry};

/// Tunable weights for [`ThreatSystem`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Upper clamp for a single table entry.
    pub max_threat: f32,
    /// Threat removed from every entry per second.
    pub decay_rate: f32,
    /// Radius within which a taunting hero overrides selection.
    pub taunt_radius: f32,
    /// Radius within which building targeters consider structures.
    pub building_scan_radius: f32,
    /// Priority per unit of distance inside the aggro range.
    pub proximity_weight: f32,
    /// Flat bonus for archetypes listed in the enemy's priority targets.
    pub priority_bonus: f32,
    /// Flat bonus for candidates below `low_health_fraction` of their maximum.
    pub low_health_bonus: f32,
    /// Health fraction under which the low health bonus applies.
    pub low_health_fraction: f32,
    /// Priority assigned to taunting heroes outside the override radius.
    pub taunt_priority: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_threat: 200.0,
            decay_rate: 5.0,
            taunt_radius: 8.0,
            building_scan_radius: 25.0,
            proximity_weight: 2.0,
            priority_bonus: 20.0,
            low_health_bonus: 15.0,
            low_health_fraction: 0.3,
            taunt_priority: 1000.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    target: TargetRef,
    priority: f32,
    distance: f32,
}

/// Threat accumulation and target selection with a reusable candidate buffer.
#[derive(Debug, Default)]
pub struct ThreatSystem {
    config: Config,
    candidates: Vec<Candidate>,
}

impl ThreatSystem {
    /// Creates a threat system with the provided weights.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            candidates: Vec::new(),
        }
    }

    /// Weights the system was created with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Adds threat from `source`, scaled by the enemy's threat multiplier.
    ///
    /// The entry is clamped to `max_threat`. The source is also recorded as the
    /// enemy's most recent attacker.
    pub fn add_threat(&self, enemy: &mut Enemy, source: TargetRef, amount: f32, now: Duration) {
        enemy.last_damage_source = Some(source);
        enemy.last_damage_time = now;

        let scaled = amount * enemy.profile().threat_multiplier;
        if scaled.is_nan() || scaled <= 0.0 {
            return;
        }
        let entry = enemy.threat_table.entry(source).or_insert(ThreatEntry {
            threat: 0.0,
            last_update: now,
        });
        entry.threat = (entry.threat + scaled).min(self.config.max_threat);
        entry.last_update = now;
    }

    /// Decays every entry by `decay_rate * dt`, dropping exhausted entries.
    pub fn decay_threat(&self, enemy: &mut Enemy, dt: f32) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }
        let decay = self.config.decay_rate * dt;
        enemy.threat_table.retain(|_, entry| {
            entry.threat -= decay;
            entry.threat > 0.0
        });
    }

    /// Wipes the threat table and the current target.
    pub fn clear_threat(&self, enemy: &mut Enemy) {
        enemy.threat_table.clear();
        enemy.current_target = None;
    }

    /// Chooses what the enemy should attack next.
    ///
    /// Dead or missing heroes and buildings are never returned. Exact priority
    /// ties resolve toward the lower [`TargetRef`].
    pub fn select_target(
        &mut self,
        enemy: &Enemy,
        defenders: &[Defender],
        buildings: &[Building],
    ) -> TargetRef {
        if let Some(taunter) = self.nearby_taunter(enemy, defenders) {
            return taunter;
        }

        let profile = enemy.profile();
        self.candidates.clear();

        for defender in defenders.iter().filter(|defender| defender.is_alive()) {
            let target = TargetRef::Defender(defender.id);
            let distance = enemy.position.distance(defender.position);
            if distance > profile.aggro_range && !enemy.threat_table.contains_key(&target) {
                continue;
            }

            let mut priority = self.base_priority(
                enemy,
                target,
                distance,
                defender.health,
                defender.max_health,
            );
            if profile.priority_targets.contains(&defender.kind) {
                priority += self.config.priority_bonus;
            }
            if defender.is_taunting() {
                priority = self.config.taunt_priority;
            }
            self.candidates.push(Candidate {
                target,
                priority: priority * profile.defender_focus,
                distance,
            });
        }

        if profile.targets_buildings {
            for building in buildings.iter().filter(|building| building.is_alive()) {
                let distance = enemy.position.distance(building.position());
                if distance > self.config.building_scan_radius {
                    continue;
                }
                let target = TargetRef::Building(building.id);
                let priority = self.base_priority(
                    enemy,
                    target,
                    distance,
                    building.health,
                    building.max_health,
                );
                self.candidates.push(Candidate {
                    target,
                    priority: priority * (1.0 - profile.defender_focus),
                    distance,
                });
            }
        }

        self.candidates.sort_by(|a, b| {
            b.priority
                .partial_cmp(&a.priority)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.target.cmp(&b.target))
        });

        let Some(best) = self.candidates.first().copied() else {
            return fallback_target(enemy, buildings);
        };
        if best.target.is_defender() && best.distance > profile.leash_range {
            return fallback_target(enemy, buildings);
        }
        best.target
    }

    fn nearby_taunter(&self, enemy: &Enemy, defenders: &[Defender]) -> Option<TargetRef> {
        defenders
            .iter()
            .filter(|defender| defender.is_alive() && defender.is_taunting())
            .map(|defender| (enemy.position.distance(defender.position), defender.id))
            .filter(|(distance, _)| *distance <= self.config.taunt_radius)
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| TargetRef::Defender(id))
    }

    fn base_priority(
        &self,
        enemy: &Enemy,
        target: TargetRef,
        distance: f32,
        health: f32,
        max_health: f32,
    ) -> f32 {
        let threat = enemy
            .threat_table
            .get(&target)
            .map_or(0.0, |entry| entry.threat);
        let proximity =
            ((enemy.profile().aggro_range - distance) * self.config.proximity_weight).max(0.0);
        let mut priority = threat + proximity;
        if max_health > 0.0 && health < max_health * self.config.low_health_fraction {
            priority += self.config.low_health_bonus;
        }
        priority
    }
}

/// Objective an enemy returns to after abandoning a hero: its original
/// building if that still stands, otherwise the base.
#[must_use]
pub fn fallback_target(enemy: &Enemy, buildings: &[Building]) -> TargetRef {
    enemy
        .original_target
        .filter(|id| {
            buildings
                .iter()
                .any(|building| building.id == *id && building.is_alive())
        })
        .map_or(TargetRef::Base, TargetRef::Building)
}

/// Resolves a target to its current ground position.
///
/// Returns `None` when the referenced hero or building is gone.
#[must_use]
pub fn target_position(
    target: TargetRef,
    defenders: &[Defender],
    buildings: &[Building],
    base: Vec2,
) -> Option<Vec2> {
    match target {
        TargetRef::Defender(id) => defenders
            .iter()
            .find(|defender| defender.id == id && defender.is_alive())
            .map(|defender| defender.position),
        TargetRef::Building(id) => buildings
            .iter()
            .find(|building| building.id == id && building.is_alive())
            .map(Building::position),
        TargetRef::Base => Some(base),
    }
}
