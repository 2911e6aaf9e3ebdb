//! Scripted player used by the headless runner.

use glam::Vec2;
use hearthguard_core::{BuildingKind, Command, GridCell, HeroKind, Phase, Stockpile};
use hearthguard_world::{query, World};

/// Cells the autopilot fortifies, in build order.
const TOWER_PLAN: [(i32, i32); 8] = [
    (3, 0),
    (-3, 0),
    (0, 3),
    (0, -3),
    (3, 3),
    (-3, -3),
    (3, -3),
    (-3, 3),
];
const HUT_CELL: (i32, i32) = (-5, 5);
const WALL_PLAN: [(i32, i32); 6] = [(5, -1), (5, 0), (5, 1), (-5, -1), (-5, 0), (-5, 1)];
const RECRUIT_ORDER: [HeroKind; 4] = [
    HeroKind::Archer,
    HeroKind::Knight,
    HeroKind::Bomber,
    HeroKind::Healer,
];
const ARRIVAL_RADIUS: f32 = 0.5;

/// Plays a fixed build order each day and walks the avatar to resources.
#[derive(Debug, Default)]
pub(crate) struct Autopilot {
    recruited: usize,
}

impl Autopilot {
    /// Commands to issue at the start of a day, spending what the stockpile allows.
    pub(crate) fn plan_day(&mut self, world: &World) -> Vec<Command> {
        if world.phase != Phase::Day {
            return Vec::new();
        }
        let mut budget = world.stockpile;
        let mut commands = Vec::new();

        let hut = std::iter::once((BuildingKind::Hut, HUT_CELL));
        let towers = TOWER_PLAN.iter().map(|&cell| (BuildingKind::Tower, cell));
        let walls = WALL_PLAN.iter().map(|&cell| (BuildingKind::Wall, cell));
        for (kind, (gx, gz)) in hut.chain(towers).chain(walls) {
            let cell = GridCell::new(gx, gz);
            if query::building_at(world, cell).is_some() {
                continue;
            }
            let cost = kind.profile().cost.discounted(world.effects.cheap_buildings_pct);
            if budget.spend(cost) {
                commands.push(Command::Build { kind, cell });
            }
        }

        while let Some(kind) = self.next_recruit(&mut budget) {
            commands.push(Command::Recruit { kind });
        }
        commands
    }

    fn next_recruit(&mut self, budget: &mut Stockpile) -> Option<HeroKind> {
        let kind = RECRUIT_ORDER[self.recruited % RECRUIT_ORDER.len()];
        if !budget.spend(kind.profile().cost()) {
            return None;
        }
        self.recruited += 1;
        Some(kind)
    }

    /// Movement toward the nearest available resource node, or a stop.
    pub(crate) fn steer(world: &World) -> Command {
        let player = world.player.position;
        let nearest = world
            .resources
            .iter()
            .filter(|node| node.is_available())
            .map(|node| node.position)
            .min_by(|a, b| a.distance_squared(player).total_cmp(&b.distance_squared(player)));
        let direction = match nearest {
            Some(target) if target.distance(player) > ARRIVAL_RADIUS => {
                (target - player).normalize_or_zero()
            }
            _ => Vec2::ZERO,
        };
        Command::Move {
            x: direction.x,
            z: direction.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearthguard_core::ProfileSnapshot;
    use hearthguard_world::WorldSettings;

    fn day_world(stockpile: Stockpile) -> World {
        let mut world = World::new(
            WorldSettings {
                stockpile,
                ..WorldSettings::default()
            },
            &ProfileSnapshot::default(),
        );
        world.phase = Phase::Day;
        world
    }

    #[test]
    fn plan_stays_within_budget() {
        let world = day_world(Stockpile::new(60, 40, 50));
        let mut autopilot = Autopilot::default();

        let commands = autopilot.plan_day(&world);

        assert_eq!(
            commands,
            vec![
                Command::Build {
                    kind: BuildingKind::Hut,
                    cell: GridCell::new(-5, 5),
                },
                Command::Build {
                    kind: BuildingKind::Tower,
                    cell: GridCell::new(3, 0),
                },
                Command::Build {
                    kind: BuildingKind::Wall,
                    cell: GridCell::new(5, -1),
                },
                Command::Build {
                    kind: BuildingKind::Wall,
                    cell: GridCell::new(5, 0),
                },
                Command::Build {
                    kind: BuildingKind::Wall,
                    cell: GridCell::new(5, 1),
                },
                Command::Recruit {
                    kind: HeroKind::Archer,
                },
                Command::Recruit {
                    kind: HeroKind::Knight,
                },
            ]
        );
    }

    #[test]
    fn nothing_is_planned_at_night() {
        let mut world = day_world(Stockpile::new(500, 500, 500));
        world.phase = Phase::Night;
        assert!(Autopilot::default().plan_day(&world).is_empty());
    }

    #[test]
    fn steering_stops_without_resources() {
        let world = day_world(Stockpile::default());
        assert_eq!(Autopilot::steer(&world), Command::Move { x: 0.0, z: 0.0 });
    }
}
