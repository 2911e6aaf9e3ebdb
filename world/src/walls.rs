//! Cell-addressed wall registry with neighbor-driven auto-tiling.

use std::collections::{BTreeMap, BTreeSet};

use hearthguard_core::{EntityId, GridCell, Rotation, SegmentType, Side};

/// Explicit overrides applied when a wall is placed.
///
/// A pinned segment or rotation is never re-derived from the neighbor set.
/// Pinning [`SegmentType::Diagonal`] additionally exempts the cell from linking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WallOptions {
    /// Segment archetype to pin, if any.
    pub segment: Option<SegmentType>,
    /// Rotation to pin, if any.
    pub rotation: Option<Rotation>,
}

/// Single placed wall segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WallCell {
    cell: GridCell,
    owner: EntityId,
    neighbors: [Option<GridCell>; 4],
    segment: SegmentType,
    rotation: Rotation,
    segment_locked: bool,
    rotation_locked: bool,
}

impl WallCell {
    fn new(cell: GridCell, owner: EntityId, options: WallOptions) -> Self {
        Self {
            cell,
            owner,
            neighbors: [None; 4],
            segment: options.segment.unwrap_or(SegmentType::Post),
            rotation: options.rotation.unwrap_or(Rotation::NONE),
            segment_locked: options.segment.is_some(),
            rotation_locked: options.rotation.is_some(),
        }
    }

    /// Grid cell occupied by the wall.
    #[must_use]
    pub const fn cell(&self) -> GridCell {
        self.cell
    }

    /// Building that owns the wall.
    #[must_use]
    pub const fn owner(&self) -> EntityId {
        self.owner
    }

    /// Linked neighbor on the provided side.
    #[must_use]
    pub const fn neighbor(&self, side: Side) -> Option<GridCell> {
        self.neighbors[side.index()]
    }

    /// Number of linked neighbors.
    #[must_use]
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.iter().filter(|link| link.is_some()).count()
    }

    /// Segment archetype currently presented.
    #[must_use]
    pub const fn segment(&self) -> SegmentType {
        self.segment
    }

    /// Rotation currently presented.
    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Reports whether the segment archetype is pinned.
    #[must_use]
    pub const fn is_segment_locked(&self) -> bool {
        self.segment_locked
    }

    /// Reports whether the rotation is pinned.
    #[must_use]
    pub const fn is_rotation_locked(&self) -> bool {
        self.rotation_locked
    }

    fn is_diagonal(&self) -> bool {
        self.segment_locked && self.segment == SegmentType::Diagonal
    }

    fn presence(&self) -> [bool; 4] {
        self.neighbors.map(|link| link.is_some())
    }
}

/// Derives the segment archetype and rotation from a neighbor presence mask.
///
/// The mask is indexed by [`Side::index`]. Rotations follow these rules:
/// an end points at its only neighbor, a straight is `0` for north-south and
/// `1` for east-west, a corner faces the first side (clockwise from north)
/// whose clockwise successor is also present, and a tee faces its open side.
#[must_use]
pub fn determine_segment_type(mask: [bool; 4]) -> (SegmentType, Rotation) {
    let present: Vec<Side> = Side::ALL
        .into_iter()
        .filter(|side| mask[side.index()])
        .collect();

    match present.as_slice() {
        [] => (SegmentType::Post, Rotation::NONE),
        [only] => (SegmentType::End, Rotation::facing(*only)),
        [first, second] if first.opposite() == *second => {
            (SegmentType::Straight, Rotation::facing(*first))
        }
        [_, _] => {
            let concave = present
                .iter()
                .copied()
                .find(|side| mask[side.clockwise().index()])
                .unwrap_or(Side::North);
            (SegmentType::Corner, Rotation::facing(concave))
        }
        [_, _, _] => {
            let open = Side::ALL
                .into_iter()
                .find(|side| !mask[side.index()])
                .unwrap_or(Side::North);
            (SegmentType::Tee, Rotation::facing(open))
        }
        _ => (SegmentType::Cross, Rotation::NONE),
    }
}

/// Registry of placed walls and non-wall obstructions on a bounded grid.
///
/// The grid spans `-half_extent..=half_extent` on both axes. Every mutation
/// bumps [`WallGrid::revision`] so path caches can detect staleness.
#[derive(Clone, Debug)]
pub struct WallGrid {
    half_extent: i32,
    walls: BTreeMap<GridCell, WallCell>,
    blocked: BTreeSet<GridCell>,
    revision: u64,
}

impl WallGrid {
    /// Creates an empty grid spanning `-half_extent..=half_extent`.
    #[must_use]
    pub fn new(half_extent: i32) -> Self {
        Self {
            half_extent: half_extent.max(0),
            walls: BTreeMap::new(),
            blocked: BTreeSet::new(),
            revision: 0,
        }
    }

    /// Largest absolute cell coordinate inside the grid.
    #[must_use]
    pub const fn half_extent(&self) -> i32 {
        self.half_extent
    }

    /// Monotonic counter bumped on every mutation.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Reports whether the cell lies inside the grid bounds.
    #[must_use]
    pub fn in_bounds(&self, cell: GridCell) -> bool {
        cell.gx().abs() <= self.half_extent && cell.gz().abs() <= self.half_extent
    }

    /// Places a wall, linking it to orthogonal wall neighbors.
    ///
    /// Returns `None` without mutating anything when the cell already holds a
    /// wall or lies outside the grid.
    pub fn add_wall(
        &mut self,
        cell: GridCell,
        owner: EntityId,
        options: WallOptions,
    ) -> Option<&WallCell> {
        if self.walls.contains_key(&cell) || !self.in_bounds(cell) {
            return None;
        }

        let mut wall = WallCell::new(cell, owner, options);
        let mut linked = Vec::new();
        for side in Side::ALL {
            let neighbor_cell = cell.neighbor(side);
            let Some(neighbor) = self.walls.get_mut(&neighbor_cell) else {
                continue;
            };
            if wall.is_diagonal() || neighbor.is_diagonal() {
                continue;
            }
            neighbor.neighbors[side.opposite().index()] = Some(cell);
            wall.neighbors[side.index()] = Some(neighbor_cell);
            linked.push(neighbor_cell);
        }

        let _ = self.walls.insert(cell, wall);
        self.recompute(cell);
        for neighbor in linked {
            self.recompute(neighbor);
        }
        self.revision = self.revision.wrapping_add(1);
        self.walls.get(&cell)
    }

    /// Removes a wall, unlinking it before re-deriving its former neighbors.
    pub fn remove_wall(&mut self, cell: GridCell) -> Option<WallCell> {
        let neighbors = self.walls.get(&cell)?.neighbors;
        for side in Side::ALL {
            if let Some(neighbor_cell) = neighbors[side.index()] {
                if let Some(neighbor) = self.walls.get_mut(&neighbor_cell) {
                    neighbor.neighbors[side.opposite().index()] = None;
                }
            }
        }

        let removed = self.walls.remove(&cell);
        for neighbor_cell in neighbors.into_iter().flatten() {
            self.recompute(neighbor_cell);
        }
        self.revision = self.revision.wrapping_add(1);
        removed
    }

    /// Marks or clears a non-wall obstruction.
    pub fn set_blocked(&mut self, cell: GridCell, blocked: bool) {
        let changed = if blocked {
            self.blocked.insert(cell)
        } else {
            self.blocked.remove(&cell)
        };
        if changed {
            self.revision = self.revision.wrapping_add(1);
        }
    }

    /// Reports whether the cell carries a non-wall obstruction.
    #[must_use]
    pub fn is_blocked_cell(&self, cell: GridCell) -> bool {
        self.blocked.contains(&cell)
    }

    /// Reports whether the cell holds a wall.
    #[must_use]
    pub fn has_wall(&self, cell: GridCell) -> bool {
        self.walls.contains_key(&cell)
    }

    /// Wall stored at the cell.
    #[must_use]
    pub fn get_wall(&self, cell: GridCell) -> Option<&WallCell> {
        self.walls.get(&cell)
    }

    /// Reports whether the cell holds a wall or an obstruction.
    #[must_use]
    pub fn is_blocked(&self, cell: GridCell) -> bool {
        self.has_wall(cell) || self.is_blocked_cell(cell)
    }

    /// Reports whether ground units may stand on the cell.
    #[must_use]
    pub fn is_walkable(&self, cell: GridCell) -> bool {
        self.in_bounds(cell) && !self.is_blocked(cell)
    }

    /// Iterator over every wall in cell order.
    pub fn walls(&self) -> impl Iterator<Item = &WallCell> {
        self.walls.values()
    }

    /// Number of placed walls.
    #[must_use]
    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }

    /// Re-derives every link, segment, and rotation from the occupied cells.
    pub fn rebuild_segments(&mut self) {
        let cells: Vec<GridCell> = self.walls.keys().copied().collect();
        for cell in &cells {
            let mut links = [None; 4];
            let diagonal = self.walls.get(cell).is_some_and(WallCell::is_diagonal);
            for side in Side::ALL {
                let neighbor_cell = cell.neighbor(side);
                let linkable = self
                    .walls
                    .get(&neighbor_cell)
                    .is_some_and(|neighbor| !neighbor.is_diagonal());
                if linkable && !diagonal {
                    links[side.index()] = Some(neighbor_cell);
                }
            }
            if let Some(wall) = self.walls.get_mut(cell) {
                wall.neighbors = links;
            }
        }
        for cell in cells {
            self.recompute(cell);
        }
    }

    fn recompute(&mut self, cell: GridCell) {
        let Some(wall) = self.walls.get_mut(&cell) else {
            return;
        };
        let (segment, rotation) = determine_segment_type(wall.presence());
        if !wall.segment_locked {
            wall.segment = segment;
        }
        if !wall.rotation_locked {
            wall.rotation = rotation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(sides: &[Side]) -> [bool; 4] {
        let mut mask = [false; 4];
        for side in sides {
            mask[side.index()] = true;
        }
        mask
    }

    #[test]
    fn corner_faces_first_clockwise_pair() {
        let (segment, rotation) = determine_segment_type(mask(&[Side::West, Side::North]));
        assert_eq!(segment, SegmentType::Corner);
        assert_eq!(rotation, Rotation::facing(Side::West));
    }

    #[test]
    fn diagonal_walls_never_link() {
        let mut grid = WallGrid::new(4);
        let pinned = WallOptions {
            segment: Some(SegmentType::Diagonal),
            rotation: None,
        };
        let _ = grid.add_wall(GridCell::new(0, 0), EntityId::new(1), pinned);
        let _ = grid.add_wall(GridCell::new(1, 0), EntityId::new(2), WallOptions::default());

        let diagonal = grid.get_wall(GridCell::new(0, 0)).expect("diagonal");
        assert_eq!(diagonal.segment(), SegmentType::Diagonal);
        assert_eq!(diagonal.neighbor_count(), 0);
        let plain = grid.get_wall(GridCell::new(1, 0)).expect("plain");
        assert_eq!(plain.segment(), SegmentType::Post);
    }

    #[test]
    fn blocking_bumps_revision_only_on_change() {
        let mut grid = WallGrid::new(4);
        grid.set_blocked(GridCell::new(2, 2), true);
        let revision = grid.revision();
        grid.set_blocked(GridCell::new(2, 2), true);
        assert_eq!(grid.revision(), revision);
        assert!(!grid.is_walkable(GridCell::new(2, 2)));
        assert!(!grid.has_wall(GridCell::new(2, 2)));
    }

    #[test]
    fn out_of_bounds_cells_are_rejected() {
        let mut grid = WallGrid::new(2);
        assert!(grid
            .add_wall(GridCell::new(3, 0), EntityId::new(1), WallOptions::default())
            .is_none());
        assert!(!grid.is_walkable(GridCell::new(0, -3)));
        assert_eq!(grid.revision(), 0);
    }
}
