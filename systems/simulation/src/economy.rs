//! Player movement, gathering, resource regrowth and hut collectors.

use std::f32::consts::TAU;

use glam::Vec2;
use hearthguard_core::{BuildingKind, Event, ResourceKind, CELL_SIZE};
use hearthguard_world::{
    query, Base, Collector, CollectorState, NodeState, ResourceNode, World,
    COLLECTOR_INTERVAL_SECS,
};
use log::debug;
use rand::Rng;

const GATHER_RADIUS: f32 = 2.0;
const SHRINK_SECS: f32 = 0.5;
const RESPAWN_MIN_SECS: f32 = 20.0;
const RESPAWN_MAX_SECS: f32 = 40.0;
const MAX_COLLECTORS_PER_HUT: usize = 2;
const COLLECTOR_SPEED: f32 = 4.0;
const COLLECTOR_REACH: f32 = 0.5;
const PARTNER_SPEED: f32 = 7.0;
const TREE_COUNT: usize = 10;
const ROCK_COUNT: usize = 6;
const TREE_YIELD: u32 = 5;
const ROCK_YIELD: u32 = 4;
const NODE_MIN_RADIUS: f32 = 10.0;

/// Scatters trees and rocks around the base.
pub(crate) fn seed_resources<R: Rng + ?Sized>(world: &mut World, rng: &mut R) {
    world.resources.clear();
    let outer = (world.walls.half_extent() - 3) as f32 * CELL_SIZE;
    let inner = NODE_MIN_RADIUS.min(outer);
    let layout = std::iter::repeat((ResourceKind::Wood, TREE_YIELD))
        .take(TREE_COUNT)
        .chain(std::iter::repeat((ResourceKind::Stone, ROCK_YIELD)).take(ROCK_COUNT));
    for (kind, amount) in layout {
        let angle = rng.gen_range(0.0..TAU);
        let radius = rng.gen_range(inner..=outer);
        let id = world.allocate_id();
        world.resources.push(ResourceNode {
            id,
            kind,
            position: world.base.position + Vec2::from_angle(angle) * radius,
            amount,
            state: NodeState::Available,
        });
    }
}

/// Makes every depleted node available again.
pub(crate) fn regenerate_resources(world: &mut World) {
    for node in &mut world.resources {
        node.state = NodeState::Available;
    }
}

/// Moves the player by its input and lets partners trail behind while visible.
pub(crate) fn move_player(world: &mut World, dt: f32) {
    let limit = world.walls.half_extent() as f32 * CELL_SIZE;
    let direction = world.player.input.clamp_length_max(1.0);
    let player = &mut world.player;
    player.position = (player.position + direction * player.speed * dt)
        .clamp(Vec2::splat(-limit), Vec2::splat(limit));

    let anchor = world.player.position;
    for partner in world.partners.iter_mut().filter(|partner| partner.visible) {
        partner.position =
            step_toward(partner.position, anchor + partner.offset, PARTNER_SPEED * dt);
    }
}

/// Harvests every available node within reach of the player.
pub(crate) fn gather(world: &mut World, out_events: &mut Vec<Event>) {
    let player = world.player.position;
    for node in &mut world.resources {
        if !node.is_available() || node.position.distance(player) > GATHER_RADIUS {
            continue;
        }
        node.state = NodeState::Shrinking {
            remaining: SHRINK_SECS,
        };
        world.stockpile.deposit(node.kind, node.amount);
        world.resources_gathered = world.resources_gathered.saturating_add(node.amount);
        out_events.push(Event::ResourcesGathered {
            kind: node.kind,
            amount: node.amount,
        });
    }
}

/// Advances shrink and regrowth countdowns.
pub(crate) fn update_resources<R: Rng + ?Sized>(world: &mut World, rng: &mut R, dt: f32) {
    for node in &mut world.resources {
        node.state = match node.state {
            NodeState::Available => NodeState::Available,
            NodeState::Shrinking { remaining } if remaining > dt => NodeState::Shrinking {
                remaining: remaining - dt,
            },
            NodeState::Shrinking { .. } => NodeState::Respawning {
                remaining: rng.gen_range(RESPAWN_MIN_SECS..=RESPAWN_MAX_SECS),
            },
            NodeState::Respawning { remaining } if remaining > dt => NodeState::Respawning {
                remaining: remaining - dt,
            },
            NodeState::Respawning { .. } => NodeState::Available,
        };
    }
}

/// Counts down hut timers and sends out collectors.
pub(crate) fn spawn_collectors(world: &mut World, dt: f32, out_events: &mut Vec<Event>) {
    let mut due = Vec::new();
    for hut in world
        .buildings
        .iter_mut()
        .filter(|building| building.kind == BuildingKind::Hut && building.is_alive())
    {
        hut.spawn_timer -= dt;
        if hut.spawn_timer <= 0.0 {
            hut.spawn_timer += COLLECTOR_INTERVAL_SECS;
            due.push((hut.id, hut.position()));
        }
    }

    for (hut, position) in due {
        if query::collectors_for(world, hut) >= MAX_COLLECTORS_PER_HUT {
            continue;
        }
        let id = world.allocate_id();
        world.collectors.push(Collector {
            id,
            hut,
            position,
            state: CollectorState::Idle,
        });
        debug!("hut {hut:?} sent collector {id:?}");
        out_events.push(Event::CollectorSpawned { id });
    }
}

/// Walks collectors through their trip and deposits finished loads.
pub(crate) fn update_collectors(world: &mut World, dt: f32, out_events: &mut Vec<Event>) {
    let step = COLLECTOR_SPEED * dt;
    let base = world.base.position;
    let mut deposits = Vec::new();

    for collector in &mut world.collectors {
        match collector.state {
            CollectorState::Idle => {
                if let Some(node) = nearest_available(&world.resources, collector.position) {
                    collector.state = CollectorState::Outbound { node: node.id };
                }
            }
            CollectorState::Outbound { node } => {
                let Some(target) = world
                    .resources
                    .iter_mut()
                    .find(|candidate| candidate.id == node && candidate.is_available())
                else {
                    collector.state = CollectorState::Idle;
                    continue;
                };
                collector.position = step_toward(collector.position, target.position, step);
                if collector.position.distance(target.position) <= COLLECTOR_REACH {
                    target.state = NodeState::Shrinking {
                        remaining: SHRINK_SECS,
                    };
                    collector.state = CollectorState::Returning {
                        kind: target.kind,
                        amount: target.amount,
                    };
                }
            }
            CollectorState::Returning { kind, amount } => {
                collector.position = step_toward(collector.position, base, step);
                if collector.position.distance(base) <= Base::RADIUS {
                    deposits.push((collector.id, kind, amount));
                }
            }
        }
    }

    for (id, kind, amount) in deposits {
        world.collectors.retain(|collector| collector.id != id);
        world.stockpile.deposit(kind, amount);
        world.resources_gathered = world.resources_gathered.saturating_add(amount);
        out_events.push(Event::ResourcesGathered { kind, amount });
    }
}

fn nearest_available(resources: &[ResourceNode], position: Vec2) -> Option<&ResourceNode> {
    resources
        .iter()
        .filter(|node| node.is_available())
        .min_by(|a, b| {
            a.position
                .distance_squared(position)
                .total_cmp(&b.position.distance_squared(position))
                .then(a.id.cmp(&b.id))
        })
}

/// Moves `from` toward `to` by at most `max_step`.
pub(crate) fn step_toward(from: Vec2, to: Vec2, max_step: f32) -> Vec2 {
    let offset = to - from;
    let distance = offset.length();
    if distance <= max_step || distance <= f32::EPSILON {
        to
    } else {
        from + offset / distance * max_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_toward_never_overshoots() {
        let from = Vec2::ZERO;
        assert_eq!(step_toward(from, Vec2::new(1.0, 0.0), 5.0), Vec2::new(1.0, 0.0));
        assert_eq!(step_toward(from, Vec2::new(10.0, 0.0), 2.0), Vec2::new(2.0, 0.0));
        assert_eq!(step_toward(from, from, 2.0), from);
    }

    #[test]
    fn nodes_shrink_then_regrow() {
        use hearthguard_core::{EntityId, ProfileSnapshot};
        use hearthguard_world::WorldSettings;
        use rand::SeedableRng;

        let mut world = World::new(WorldSettings::default(), &ProfileSnapshot::default());
        world.resources.push(ResourceNode {
            id: EntityId::new(99),
            kind: ResourceKind::Wood,
            position: world.player.position,
            amount: 5,
            state: NodeState::Available,
        });
        let wood = world.stockpile.wood;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(1);
        let mut events = Vec::new();

        gather(&mut world, &mut events);
        assert_eq!(world.stockpile.wood, wood + 5);
        assert_eq!(world.resources_gathered, 5);

        update_resources(&mut world, &mut rng, 0.6);
        let NodeState::Respawning { remaining } = world.resources[0].state else {
            panic!("node should be respawning");
        };
        assert!((RESPAWN_MIN_SECS..=RESPAWN_MAX_SECS).contains(&remaining));

        gather(&mut world, &mut events);
        assert_eq!(world.stockpile.wood, wood + 5);

        update_resources(&mut world, &mut rng, RESPAWN_MAX_SECS);
        assert!(world.resources[0].is_available());
    }
}
