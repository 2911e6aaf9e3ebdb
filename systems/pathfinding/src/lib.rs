#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid pathfinding over the wall grid with result caching.
//!
//! Searches run 4-directional A* with unit edge costs and a Manhattan
//! heuristic. Results, including "no path", are cached per start and goal cell
//! for a short time-to-live. Any wall mutation can change reachability
//! anywhere, so owners must call [`Pathfinder::clear_cache`] whenever the grid
//! revision changes.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, HashSet, VecDeque},
    time::Duration,
};

use glam::Vec2;
use hearthguard_core::{GridCell, Side};
use hearthguard_world::WallGrid;
use log::debug;

/// Tunable limits for [`Pathfinder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    cache_ttl: Duration,
    cache_capacity: usize,
    max_iterations: usize,
    search_radius: i32,
}

impl Config {
    /// Creates a configuration with explicit limits.
    #[must_use]
    pub const fn new(
        cache_ttl: Duration,
        cache_capacity: usize,
        max_iterations: usize,
        search_radius: i32,
    ) -> Self {
        Self {
            cache_ttl,
            cache_capacity,
            max_iterations,
            search_radius,
        }
    }

    /// Age after which a cached result is recomputed.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Maximum number of cached results.
    #[must_use]
    pub const fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    /// Node expansions after which a search gives up.
    #[must_use]
    pub const fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Radius of the ring search used to replace blocked endpoints.
    #[must_use]
    pub const fn search_radius(&self) -> i32 {
        self.search_radius
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), 200, 1000, 5)
    }
}

type CacheKey = (GridCell, GridCell);

#[derive(Clone, Debug)]
struct CacheEntry {
    path: Option<Vec<Vec2>>,
    stored_at: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenNode {
    f: u32,
    h: u32,
    sequence: u32,
    cell: GridCell,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the lowest f first.
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* path planner with a time-limited result cache and reusable scratch space.
#[derive(Debug, Default)]
pub struct Pathfinder {
    config: Config,
    cache: HashMap<CacheKey, CacheEntry>,
    insertion_order: VecDeque<CacheKey>,
    open: BinaryHeap<OpenNode>,
    g_score: HashMap<GridCell, u32>,
    came_from: HashMap<GridCell, GridCell>,
    closed: HashSet<GridCell>,
}

impl Pathfinder {
    /// Creates a pathfinder with the provided limits.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Limits the pathfinder was created with.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Number of cached results.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drops every cached result.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.insertion_order.clear();
    }

    /// Plans a path between two world positions.
    ///
    /// Returns the waypoints as cell centres from start to goal, or `None`
    /// when the goal is unreachable. Blocked endpoints are replaced by the
    /// nearest walkable cell within the search radius.
    pub fn find_path(
        &mut self,
        grid: &WallGrid,
        start: Vec2,
        target: Vec2,
        now: Duration,
    ) -> Option<Vec<Vec2>> {
        let key = (GridCell::from_world(start), GridCell::from_world(target));
        if let Some(entry) = self.cache.get(&key) {
            if now.saturating_sub(entry.stored_at) < self.config.cache_ttl {
                return entry.path.clone();
            }
        }

        let path = self.search(grid, key.0, key.1);
        if path.is_none() {
            debug!("no path from {:?} to {:?}", key.0, key.1);
        }
        self.store(key, path.clone(), now);
        path
    }

    fn store(&mut self, key: CacheKey, path: Option<Vec<Vec2>>, now: Duration) {
        if self
            .cache
            .insert(
                key,
                CacheEntry {
                    path,
                    stored_at: now,
                },
            )
            .is_some()
        {
            self.insertion_order.retain(|existing| *existing != key);
        }
        self.insertion_order.push_back(key);

        while self.cache.len() > self.config.cache_capacity {
            let Some(oldest) = self.insertion_order.pop_front() else {
                break;
            };
            let _ = self.cache.remove(&oldest);
        }
    }

    fn search(&mut self, grid: &WallGrid, start: GridCell, goal: GridCell) -> Option<Vec<Vec2>> {
        let goal = if grid.is_walkable(goal) {
            goal
        } else {
            self.nearest_walkable(grid, goal, start)?
        };
        let start = if grid.is_walkable(start) {
            start
        } else {
            self.nearest_walkable(grid, start, goal)?
        };

        let cells = self.astar(grid, start, goal)?;
        Some(cells.into_iter().map(GridCell::to_world).collect())
    }

    /// Closest walkable cell to `origin` on the smallest non-empty ring.
    ///
    /// Ties prefer the cell nearer to `toward`, then the lower cell coordinate.
    fn nearest_walkable(
        &self,
        grid: &WallGrid,
        origin: GridCell,
        toward: GridCell,
    ) -> Option<GridCell> {
        for radius in 1..=self.config.search_radius {
            let mut best: Option<(i64, i64, GridCell)> = None;
            for dx in -radius..=radius {
                for dz in -radius..=radius {
                    if dx.abs() != radius && dz.abs() != radius {
                        continue;
                    }
                    let cell = GridCell::new(origin.gx() + dx, origin.gz() + dz);
                    if !grid.is_walkable(cell) {
                        continue;
                    }
                    let candidate = (
                        cell.distance_squared(origin),
                        cell.distance_squared(toward),
                        cell,
                    );
                    if best.map_or(true, |current| candidate < current) {
                        best = Some(candidate);
                    }
                }
            }
            if let Some((_, _, cell)) = best {
                return Some(cell);
            }
        }
        None
    }

    fn astar(&mut self, grid: &WallGrid, start: GridCell, goal: GridCell) -> Option<Vec<GridCell>> {
        self.open.clear();
        self.g_score.clear();
        self.came_from.clear();
        self.closed.clear();

        let mut sequence = 0u32;
        let h = start.manhattan_distance(goal);
        self.open.push(OpenNode {
            f: h,
            h,
            sequence,
            cell: start,
        });
        let _ = self.g_score.insert(start, 0);

        let mut iterations = 0usize;
        while let Some(node) = self.open.pop() {
            iterations += 1;
            if iterations > self.config.max_iterations {
                debug!("path search from {start:?} to {goal:?} hit the iteration cap");
                return None;
            }

            if node.cell == goal {
                return Some(self.reconstruct(start, goal));
            }
            if !self.closed.insert(node.cell) {
                continue;
            }

            let g = self.g_score.get(&node.cell).copied().unwrap_or(u32::MAX);
            for side in Side::ALL {
                let next = node.cell.neighbor(side);
                if self.closed.contains(&next) || !grid.is_walkable(next) {
                    continue;
                }
                let tentative = g.saturating_add(1);
                if tentative >= self.g_score.get(&next).copied().unwrap_or(u32::MAX) {
                    continue;
                }
                let _ = self.g_score.insert(next, tentative);
                let _ = self.came_from.insert(next, node.cell);
                let h = next.manhattan_distance(goal);
                sequence = sequence.wrapping_add(1);
                self.open.push(OpenNode {
                    f: tentative.saturating_add(h),
                    h,
                    sequence,
                    cell: next,
                });
            }
        }
        None
    }

    fn reconstruct(&self, start: GridCell, goal: GridCell) -> Vec<GridCell> {
        let mut cells = vec![goal];
        let mut current = goal;
        while current != start {
            let Some(parent) = self.came_from.get(&current) else {
                break;
            };
            current = *parent;
            cells.push(current);
        }
        cells.reverse();
        cells
    }
}

/// Reports whether a straight line between two points crosses no blocked cell.
///
/// The line is rasterized with Bresenham over grid cells. The first cell is
/// skipped so a unit standing next to a wall can always depart.
#[must_use]
pub fn has_line_of_sight(grid: &WallGrid, from: Vec2, to: Vec2) -> bool {
    let start = GridCell::from_world(from);
    let end = GridCell::from_world(to);
    let (mut x, mut z) = (start.gx(), start.gz());
    let dx = (end.gx() - x).abs();
    let dz = -(end.gz() - z).abs();
    let step_x = if x < end.gx() { 1 } else { -1 };
    let step_z = if z < end.gz() { 1 } else { -1 };
    let mut error = dx + dz;
    let mut first = true;

    loop {
        if !first && !grid.is_walkable(GridCell::new(x, z)) {
            return false;
        }
        first = false;
        if x == end.gx() && z == end.gz() {
            return true;
        }
        let doubled = error * 2;
        if doubled >= dz {
            error += dz;
            x += step_x;
        }
        if doubled <= dx {
            error += dx;
            z += step_z;
        }
    }
}

/// Drops waypoints that can be skipped along an unobstructed straight line.
///
/// The first and last waypoints are always kept.
#[must_use]
pub fn smooth_path(grid: &WallGrid, path: &[Vec2]) -> Vec<Vec2> {
    if path.len() <= 2 {
        return path.to_vec();
    }

    let last = path.len() - 1;
    let mut smoothed = vec![path[0]];
    let mut current = 0;
    while current < last {
        let mut next = last;
        while next > current + 1 && !has_line_of_sight(grid, path[current], path[next]) {
            next -= 1;
        }
        smoothed.push(path[next]);
        current = next;
    }
    smoothed
}
