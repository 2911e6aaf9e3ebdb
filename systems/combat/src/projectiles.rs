//! Projectile flight and impact.

use glam::Vec3;
use hearthguard_world::{elevate, ground, Enemy, Projectile};

use crate::CombatContext;

const HIT_RADIUS: f32 = 1.5;
const MAX_TRAVEL: f32 = 100.0;

/// Moves every projectile one tick and resolves impacts.
///
/// A projectile is swept along its path for the tick and strikes the first
/// living enemy it passes within the hit radius, ties going to the lower id.
/// Carrots then damage every living enemy within their splash radius of the
/// impact, measured on the ground plane, for the full damage each. Spent
/// projectiles and those that flew past their range are removed.
pub fn advance_projectiles(
    projectiles: &mut Vec<Projectile>,
    enemies: &mut [Enemy],
    ctx: &CombatContext<'_>,
) {
    projectiles.retain_mut(|projectile| {
        let start = projectile.position;
        let step = projectile.velocity * ctx.dt;
        projectile.position += step;
        projectile.distance_traveled += step.length();

        if let Some((index, impact)) = first_contact(enemies, start, projectile.position) {
            if projectile.splash_radius > 0.0 {
                let center = ground(impact);
                for enemy in enemies.iter_mut().filter(|enemy| enemy.is_alive()) {
                    if enemy.position.distance(center) <= projectile.splash_radius {
                        strike(enemy, projectile, ctx);
                    }
                }
            } else {
                strike(&mut enemies[index], projectile, ctx);
            }
            return false;
        }

        projectile.position.distance(projectile.origin) <= projectile.max_distance
            && projectile.distance_traveled <= MAX_TRAVEL
    });
}

fn strike(enemy: &mut Enemy, projectile: &Projectile, ctx: &CombatContext<'_>) {
    enemy.take_damage(projectile.damage);
    if let Some(source) = projectile.source {
        ctx.threat.add_threat(enemy, source, projectile.damage, ctx.now);
    }
}

/// Enemy struck by the segment `start..end`, with the point of impact.
fn first_contact(enemies: &[Enemy], start: Vec3, end: Vec3) -> Option<(usize, Vec3)> {
    enemies
        .iter()
        .enumerate()
        .filter(|(_, enemy)| enemy.is_alive())
        .filter_map(|(index, enemy)| {
            let center = elevate(enemy.position, enemy.collision_height());
            let closest = closest_point(start, end, center);
            (closest.distance(center) < HIT_RADIUS).then(|| {
                (index, start.distance(closest), enemy.id, closest)
            })
        })
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.2.cmp(&b.2)))
        .map(|(index, _, _, closest)| (index, closest))
}

fn closest_point(start: Vec3, end: Vec3, point: Vec3) -> Vec3 {
    let segment = end - start;
    let length_squared = segment.length_squared();
    if length_squared <= f32::EPSILON {
        return start;
    }
    let t = ((point - start).dot(segment) / length_squared).clamp(0.0, 1.0);
    start + segment * t
}
