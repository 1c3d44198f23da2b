//! Task classification.
//!
//! Maps a task descriptor onto the closed set of categories the placement
//! policy handles. Classification only looks at the descriptor; geometry is
//! resolved later by the policies.

use std::sync::LazyLock;

use regex::Regex;

use tilegrid_core::{Axis, Side};

use crate::error::{PlacementError, PlacementResult};
use crate::runtime::TaskDescriptor;

static BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^bound_([xyz])_(lo|hi)$").expect("boundary task regex"));

static SWEEP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^sweep_(\d+)").expect("sweep task regex"));

const SWEEP_PREFIX: &str = "sweep_";
const BOUNDARY_PREFIX: &str = "bound_";
const QUEUE_PREFIXES: [&str; 2] = ["TradeQueue_fillTarget", "TradeQueue_pull"];
const WORK_PREFIX: &str = "work";
const GLOBAL_ENTRY: &str = "main";
const STAGING_PREFIX: &str = "__binary_";

/// Direction of a wavefront sweep. Bit `i` set means axis `i` is traversed
/// in decreasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepDirection(u8);

impl SweepDirection {
    pub fn new(id: u8) -> Option<Self> {
        (id <= 7).then_some(Self(id))
    }

    pub fn id(self) -> u8 {
        self.0
    }

    pub fn reversed(self, axis: Axis) -> bool {
        (self.0 >> axis.index()) & 1 == 1
    }
}

/// Domain face a boundary task updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryFace {
    pub axis: Axis,
    pub side: Side,
}

/// Tasks that run on the rank owning the tile they are centered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileTask {
    Sweep(SweepDirection),
    Boundary(BoundaryFace),
    QueueMaintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    /// Drives one sample.
    Single,
    /// Drives a coupled pair of samples.
    Dual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCategory {
    TileCentered(TileTask),
    Driver(DriverKind),
    /// Index-space launch; the slicer makes the final decision.
    IndexSpace,
    /// Whitelisted global task left to the runtime's default policy.
    Global,
}

/// Classify a single task launch. Unrecognized tasks are an error.
pub fn classify(task: &TaskDescriptor) -> PlacementResult<TaskCategory> {
    let name = task.name.as_str();
    if let Some(direction) = parse_sweep(name) {
        return Ok(TaskCategory::TileCentered(TileTask::Sweep(direction?)));
    }
    if name.starts_with(BOUNDARY_PREFIX) {
        return Ok(TaskCategory::TileCentered(TileTask::Boundary(parse_boundary(name)?)));
    }
    if QUEUE_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return Ok(TaskCategory::TileCentered(TileTask::QueueMaintenance));
    }
    if name.starts_with(WORK_PREFIX) {
        return match name {
            "workSingle" => Ok(TaskCategory::Driver(DriverKind::Single)),
            "workDual" => Ok(TaskCategory::Driver(DriverKind::Dual)),
            _ => Err(PlacementError::UnexpectedWorkTask(name.to_string())),
        };
    }
    if task.is_index_space {
        return Ok(TaskCategory::IndexSpace);
    }
    if name == GLOBAL_ENTRY || name.starts_with(STAGING_PREFIX) {
        return Ok(TaskCategory::Global);
    }
    Err(PlacementError::UnhandledTask(name.to_string()))
}

/// Sweep direction encoded in a `sweep_<n>` name, where `n` is 1-based.
///
/// Returns `None` for tasks that are not sweeps.
pub fn parse_sweep(name: &str) -> Option<PlacementResult<SweepDirection>> {
    if !name.starts_with(SWEEP_PREFIX) {
        return None;
    }
    let direction = SWEEP_RE
        .captures(name)
        .and_then(|caps| caps[1].parse::<u8>().ok())
        .and_then(|n| n.checked_sub(1))
        .and_then(SweepDirection::new)
        .ok_or_else(|| PlacementError::InvalidSweepId(name.to_string()));
    Some(direction)
}

fn parse_boundary(name: &str) -> PlacementResult<BoundaryFace> {
    let caps = BOUNDARY_RE
        .captures(name)
        .ok_or_else(|| PlacementError::MalformedBoundaryTask(name.to_string()))?;
    let axis = match &caps[1] {
        "x" => Axis::X,
        "y" => Axis::Y,
        _ => Axis::Z,
    };
    let side = if &caps[2] == "hi" { Side::Hi } else { Side::Lo };
    Ok(BoundaryFace { axis, side })
}
