#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Checkpoint-sequenced grid pathfinding for the Gem Defence board.
//!
//! Routes are planned as independent A* segments between consecutive
//! waypoints (spawn center, the five checkpoint centers, goal center). Any
//! unsolvable segment invalidates the whole route, which callers must treat
//! as "no route currently exists" and refuse the triggering action.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use gem_defence_core::{GridCell, GridSpec, Path};

/// Plans the full spawn-to-goal route through every checkpoint in order.
///
/// Each segment starts where the previous one ended; duplicate joint cells
/// are dropped so the result is a single contiguous cell sequence. Returns
/// `None` as soon as any segment is unreachable.
#[must_use]
pub fn plan_route(spec: &GridSpec, obstacles: &HashSet<GridCell>) -> Option<Path> {
    let waypoints = spec.waypoints();
    let mut cells: Vec<GridCell> = Vec::new();

    for pair in waypoints.windows(2) {
        let segment = find_path(spec, pair[0], pair[1], obstacles)?;
        let skip = usize::from(!cells.is_empty());
        cells.extend(segment.into_iter().skip(skip));
    }

    Some(Path::from_cells(cells, spec))
}

/// Searches for a shortest 4-connected path between two cells.
///
/// A cell is traversable when it lies inside the grid and is either part of
/// a spawn/goal/checkpoint zone or free of towers. Ties between equal-cost
/// frontier nodes break on insertion order, keeping the chosen route stable
/// for a fixed obstacle set. The search holds no state between calls, so it
/// is safe to re-run whenever the obstacle set changes.
#[must_use]
pub fn find_path(
    spec: &GridSpec,
    start: GridCell,
    goal: GridCell,
    obstacles: &HashSet<GridCell>,
) -> Option<Vec<GridCell>> {
    if !is_walkable(spec, start, obstacles) || !is_walkable(spec, goal, obstacles) {
        return None;
    }

    if start == goal {
        return Some(vec![start]);
    }

    let columns = spec.columns();
    let rows = spec.rows();
    let cell_count = usize::try_from(u64::from(columns) * u64::from(rows)).ok()?;
    if cell_count == 0 {
        return None;
    }

    let mut best_cost = vec![u32::MAX; cell_count];
    let mut parents: Vec<Option<GridCell>> = vec![None; cell_count];
    let mut open = BinaryHeap::new();
    let mut sequence: u64 = 0;

    let start_index = index(columns, start)?;
    best_cost[start_index] = 0;
    open.push(Reverse(OpenEntry {
        estimate: start.manhattan_distance(goal),
        sequence,
        cell: start,
    }));

    while let Some(Reverse(entry)) = open.pop() {
        let cell = entry.cell;
        if cell == goal {
            return Some(reconstruct(&parents, columns, start, goal));
        }

        let current_index = index(columns, cell)?;
        let cost = best_cost[current_index];
        if entry.estimate > cost + cell.manhattan_distance(goal) {
            continue;
        }

        for neighbor in cardinal_neighbors(cell, columns, rows) {
            if !is_walkable(spec, neighbor, obstacles) {
                continue;
            }

            let Some(neighbor_index) = index(columns, neighbor) else {
                continue;
            };

            let step_cost = cost + 1;
            if step_cost >= best_cost[neighbor_index] {
                continue;
            }

            best_cost[neighbor_index] = step_cost;
            parents[neighbor_index] = Some(cell);
            sequence += 1;
            open.push(Reverse(OpenEntry {
                estimate: step_cost + neighbor.manhattan_distance(goal),
                sequence,
                cell: neighbor,
            }));
        }
    }

    None
}

/// Walkability predicate shared by the route planner and its callers.
///
/// Zone cells stay traversable even when the obstacle set claims them, so a
/// stray tower inside a zone can never sever the route.
#[must_use]
pub fn is_walkable(spec: &GridSpec, cell: GridCell, obstacles: &HashSet<GridCell>) -> bool {
    spec.contains(cell) && (spec.is_zone(cell) || !obstacles.contains(&cell))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenEntry {
    estimate: u32,
    sequence: u64,
    cell: GridCell,
}

fn reconstruct(
    parents: &[Option<GridCell>],
    columns: u32,
    start: GridCell,
    goal: GridCell,
) -> Vec<GridCell> {
    let mut cells = vec![goal];
    let mut cursor = goal;

    while cursor != start {
        let Some(slot) = index(columns, cursor) else {
            break;
        };
        let Some(parent) = parents[slot] else {
            break;
        };
        cells.push(parent);
        cursor = parent;
    }

    cells.reverse();
    cells
}

fn cardinal_neighbors(cell: GridCell, columns: u32, rows: u32) -> impl Iterator<Item = GridCell> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(y) = cell.y().checked_sub(1) {
        candidates[count] = Some(GridCell::new(cell.x(), y));
        count += 1;
    }

    if cell.x() + 1 < columns {
        candidates[count] = Some(GridCell::new(cell.x() + 1, cell.y()));
        count += 1;
    }

    if cell.y() + 1 < rows {
        candidates[count] = Some(GridCell::new(cell.x(), cell.y() + 1));
        count += 1;
    }

    if let Some(x) = cell.x().checked_sub(1) {
        candidates[count] = Some(GridCell::new(x, cell.y()));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}

fn index(columns: u32, cell: GridCell) -> Option<usize> {
    let x = usize::try_from(cell.x()).ok()?;
    let y = usize::try_from(cell.y()).ok()?;
    let width = usize::try_from(columns).ok()?;
    y.checked_mul(width)?.checked_add(x)
}
