//! Grid geometry shared by the pathfinder, the world, and the systems.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Number of checkpoint zones every route must thread, in order.
pub const CHECKPOINT_COUNT: usize = 5;

/// Location of a single grid cell expressed as x and y coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    x: u32,
    y: u32,
}

impl GridCell {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two cells.
    #[must_use]
    pub fn manhattan_distance(self, other: GridCell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Axis-aligned rectangular zone expressed in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneRect {
    origin: GridCell,
    width: u32,
    height: u32,
}

impl ZoneRect {
    /// Constructs a zone from an upper-left origin cell and a size.
    #[must_use]
    pub const fn new(origin: GridCell, width: u32, height: u32) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    /// Upper-left cell that anchors the zone.
    #[must_use]
    pub const fn origin(&self) -> GridCell {
        self.origin
    }

    /// Width of the zone in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the zone in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the zone covers the provided cell.
    #[must_use]
    pub const fn contains(&self, cell: GridCell) -> bool {
        cell.x() >= self.origin.x()
            && cell.x() < self.origin.x() + self.width
            && cell.y() >= self.origin.y()
            && cell.y() < self.origin.y() + self.height
    }

    /// Cell routed through when the zone acts as a waypoint.
    ///
    /// For the 2x2 zones used by the default board this is the origin
    /// offset by (+1, +1).
    #[must_use]
    pub const fn center(&self) -> GridCell {
        GridCell::new(
            self.origin.x() + self.width / 2,
            self.origin.y() + self.height / 2,
        )
    }
}

/// Board description: grid dimensions, projection scale, and zone layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    columns: u32,
    rows: u32,
    cell_length: f32,
    spawn: ZoneRect,
    goal: ZoneRect,
    checkpoints: [ZoneRect; CHECKPOINT_COUNT],
}

impl GridSpec {
    /// Creates a board description from explicit dimensions and zones.
    #[must_use]
    pub const fn new(
        columns: u32,
        rows: u32,
        cell_length: f32,
        spawn: ZoneRect,
        goal: ZoneRect,
        checkpoints: [ZoneRect; CHECKPOINT_COUNT],
    ) -> Self {
        Self {
            columns,
            rows,
            cell_length,
            spawn,
            goal,
            checkpoints,
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a square cell in world units.
    #[must_use]
    pub const fn cell_length(&self) -> f32 {
        self.cell_length
    }

    /// Zone enemies emerge from.
    #[must_use]
    pub const fn spawn(&self) -> ZoneRect {
        self.spawn
    }

    /// Zone enemies are trying to reach.
    #[must_use]
    pub const fn goal(&self) -> ZoneRect {
        self.goal
    }

    /// Checkpoint zones in mandatory visiting order.
    #[must_use]
    pub const fn checkpoints(&self) -> &[ZoneRect; CHECKPOINT_COUNT] {
        &self.checkpoints
    }

    /// Reports whether the cell lies inside the grid bounds.
    #[must_use]
    pub const fn contains(&self, cell: GridCell) -> bool {
        cell.x() < self.columns && cell.y() < self.rows
    }

    /// Reports whether the cell belongs to the spawn, goal, or a checkpoint
    /// zone. Zone cells stay traversable regardless of tower occupancy.
    #[must_use]
    pub fn is_zone(&self, cell: GridCell) -> bool {
        if self.spawn.contains(cell) || self.goal.contains(cell) {
            return true;
        }
        self.checkpoints.iter().any(|zone| zone.contains(cell))
    }

    /// Ordered waypoint cells a full route must visit:
    /// spawn center, the five checkpoint centers, goal center.
    #[must_use]
    pub fn waypoints(&self) -> [GridCell; CHECKPOINT_COUNT + 2] {
        [
            self.spawn.center(),
            self.checkpoints[0].center(),
            self.checkpoints[1].center(),
            self.checkpoints[2].center(),
            self.checkpoints[3].center(),
            self.checkpoints[4].center(),
            self.goal.center(),
        ]
    }

    /// Projects a cell to its world-space center.
    #[must_use]
    pub fn cell_center(&self, cell: GridCell) -> Vec2 {
        Vec2::new(
            (cell.x() as f32 + 0.5) * self.cell_length,
            (cell.y() as f32 + 0.5) * self.cell_length,
        )
    }

    /// Converts a distance measured in cells to world units.
    #[must_use]
    pub const fn cells_to_world(&self, cells: f32) -> f32 {
        cells * self.cell_length
    }
}

impl Default for GridSpec {
    /// The default 22x15 board with a serpentine checkpoint layout.
    fn default() -> Self {
        Self::new(
            22,
            15,
            32.0,
            ZoneRect::new(GridCell::new(0, 13), 2, 2),
            ZoneRect::new(GridCell::new(20, 0), 2, 2),
            [
                ZoneRect::new(GridCell::new(18, 11), 2, 2),
                ZoneRect::new(GridCell::new(2, 8), 2, 2),
                ZoneRect::new(GridCell::new(18, 5), 2, 2),
                ZoneRect::new(GridCell::new(2, 2), 2, 2),
                ZoneRect::new(GridCell::new(10, 0), 2, 2),
            ],
        )
    }
}

/// Resolved route through the board, sampled fractionally by enemies.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    cells: Vec<GridCell>,
    points: Vec<Vec2>,
}

impl Path {
    /// Builds a path from route cells, projecting each to world space.
    #[must_use]
    pub fn from_cells(cells: Vec<GridCell>, spec: &GridSpec) -> Self {
        let points = cells.iter().map(|cell| spec.cell_center(*cell)).collect();
        Self { cells, points }
    }

    /// Route cells in traversal order.
    #[must_use]
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Number of cells composing the route.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the route contains no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// World position for a fractional route index.
    ///
    /// Indices are clamped to the route's ends, so staggered enemies that
    /// have not yet entered the board resolve to the first route cell.
    #[must_use]
    pub fn sample(&self, path_index: f32) -> Vec2 {
        debug_assert!(!self.points.is_empty(), "sample requires a non-empty path");
        let last = self.points.len() - 1;
        let clamped = path_index.clamp(0.0, last as f32);
        let lower = clamped.floor() as usize;
        let upper = (lower + 1).min(last);
        let fraction = clamped - lower as f32;
        self.points[lower].lerp(self.points[upper], fraction)
    }
}
