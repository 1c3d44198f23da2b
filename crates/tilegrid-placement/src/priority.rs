//! Wavefront priority for sweep tasks.
//!
//! A sweep tile's priority is its Manhattan distance to the sweep's terminal
//! corner, so tiles with more downstream diagonals still pending run first.

use tracing::debug;

use tilegrid_core::{Axis, TileCoord, TileMapping};

use crate::classify::{SweepDirection, parse_sweep};
use crate::context::{PlacementContext, task_tile};
use crate::error::{PlacementError, PlacementResult};
use crate::runtime::{DefaultPolicy, RegionTree, TaskDescriptor, TaskPriority};

pub fn select_task_priority(
    ctx: &PlacementContext,
    tree: &dyn RegionTree,
    default: &dyn DefaultPolicy,
    task: &TaskDescriptor,
) -> PlacementResult<TaskPriority> {
    let Some(direction) = parse_sweep(&task.name) else {
        return Ok(default.select_task_priority(task));
    };
    let direction = direction?;

    let req = task
        .regions
        .first()
        .ok_or_else(|| PlacementError::NoRegionArgument(task.name.clone()))?;
    let (sample, mapping) = ctx.registry().resolve(tree, req)?;
    let tile = task_tile(tree, task, mapping.extents())?;

    let priority = wavefront_priority(mapping, direction, tile);
    debug!(sample, task = %task.name, %tile, priority, "sweep priority assigned");
    Ok(priority)
}

/// Diagonals between `tile` and the corner where `direction` ends.
///
/// `tile` must lie inside `mapping`. Grids too large for `TaskPriority`
/// saturate at `TaskPriority::MAX`.
pub(crate) fn wavefront_priority(mapping: &TileMapping, direction: SweepDirection, tile: TileCoord) -> TaskPriority {
    debug_assert!(mapping.contains(tile), "tile {tile} outside the sample grid");
    let extents = mapping.extents();
    Axis::ALL
        .into_iter()
        .map(|axis| {
            let coord = tile.get(axis);
            let remaining = if direction.reversed(axis) {
                coord
            } else {
                extents[axis.index()] - coord - 1
            };
            TaskPriority::try_from(remaining).unwrap_or(TaskPriority::MAX)
        })
        .fold(0, TaskPriority::saturating_add)
}
