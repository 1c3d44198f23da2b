//! Interfaces to the execution runtime.
//!
//! The runtime owns tasks, region trees and physical instances. The policies
//! only see them through the descriptors and traits in this module, and only
//! ever query them.

use std::fmt;

use serde::{Deserialize, Serialize};

use tilegrid_core::{DriverPayload, ProcKind, Processor, TileRect};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

opaque_id!(
    /// A logical region in the runtime's region forest.
    RegionId,
    "region"
);
opaque_id!(
    /// A partition of a logical region.
    PartitionId,
    "partition"
);
opaque_id!(FieldId, "field");
opaque_id!(MemoryId, "memory");

/// Scheduling priority; higher runs first.
pub type TaskPriority = i32;

/// Depth of a tile-level region: root, tile partition, tile.
pub const TILE_REGION_DEPTH: u32 = 2;

/// Depth of a region one partition below a tile, as targeted by halo copies.
pub const HALO_REGION_DEPTH: u32 = TILE_REGION_DEPTH + 2;

/// What a region requirement names: a region, or a partition projected by an
/// index launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionRef {
    Region(RegionId),
    Partition(PartitionId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRequirement {
    pub target: RegionRef,
    pub fields: Vec<FieldId>,
    /// Already restricted to a fixed physical instance.
    pub restricted: bool,
}

impl RegionRequirement {
    pub fn region(region: RegionId, fields: Vec<FieldId>) -> Self {
        Self {
            target: RegionRef::Region(region),
            fields,
            restricted: false,
        }
    }

    pub fn partition(partition: PartitionId, fields: Vec<FieldId>) -> Self {
        Self {
            target: RegionRef::Partition(partition),
            fields,
            restricted: false,
        }
    }

    pub fn region_id(&self) -> Option<RegionId> {
        match self.target {
            RegionRef::Region(region) => Some(region),
            RegionRef::Partition(_) => None,
        }
    }
}

/// Read-only view of the runtime's region forest.
pub trait RegionTree {
    /// Partition this region is a sub-region of, if it is not a root.
    fn parent_partition(&self, region: RegionId) -> Option<PartitionId>;

    /// Region a partition was made from.
    fn partition_parent(&self, partition: PartitionId) -> RegionId;

    /// Coordinate of a region within its immediate parent partition.
    /// The dimension is the length of the returned point.
    fn color_point(&self, region: RegionId) -> Option<Vec<i64>>;

    /// Number of tree edges between the region's index space and its root.
    fn index_space_depth(&self, region: RegionId) -> u32;

    /// Externally attached sample id tag. Only root regions carry one.
    fn sample_tag(&self, region: RegionId) -> Option<u32>;

    fn root_of(&self, mut region: RegionId) -> RegionId {
        while let Some(partition) = self.parent_partition(region) {
            region = self.partition_parent(partition);
        }
        region
    }
}

/// A physical instance handle returned by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhysicalInstance {
    pub id: u64,
    pub memory: MemoryId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceHandle {
    /// Deferred placeholder; the runtime may use any existing copy.
    Virtual,
    Physical(PhysicalInstance),
}

/// Layout requirements for a requested instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutConstraints {
    pub fields: Vec<FieldId>,
    pub contiguous: bool,
    pub inorder: bool,
}

/// Instance and memory services of the runtime.
pub trait InstanceRuntime {
    /// Memory the runtime's default policy picks for a processor.
    fn select_target_memory(&self, processor: &Processor, req: &RegionRequirement) -> MemoryId;

    /// Find an instance of `region` in `memory` satisfying `constraints`,
    /// creating one if none exists.
    fn find_or_create_instance(
        &self,
        memory: MemoryId,
        constraints: &LayoutConstraints,
        region: RegionId,
    ) -> Option<PhysicalInstance>;
}

/// The runtime's own default decisions, used where this policy defers.
pub trait DefaultPolicy {
    fn select_initial_processor(&self, task: &TaskDescriptor) -> Processor;

    fn select_task_priority(&self, task: &TaskDescriptor) -> TaskPriority;
}

/// Everything a mapper needs from the runtime.
pub trait MapperRuntime: RegionTree + InstanceRuntime + DefaultPolicy {}

impl<T: RegionTree + InstanceRuntime + DefaultPolicy> MapperRuntime for T {}

/// A task launch as presented by the runtime.
#[derive(Debug, Clone)]
pub struct TaskDescriptor {
    pub name: String,
    pub is_index_space: bool,
    pub regions: Vec<RegionRequirement>,
    /// Decoded argument payload; only driver tasks carry one.
    pub payload: Option<DriverPayload>,
    /// Processor kind of the task's preferred variant.
    pub preferred_kind: ProcKind,
    /// Representative processor already chosen for an index launch.
    pub target_proc: Option<Processor>,
}

impl TaskDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_index_space: false,
            regions: Vec::new(),
            payload: None,
            preferred_kind: ProcKind::Host,
            target_proc: None,
        }
    }

    pub fn with_region(mut self, req: RegionRequirement) -> Self {
        self.regions.push(req);
        self
    }

    pub fn with_payload(mut self, payload: DriverPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_preferred_kind(mut self, kind: ProcKind) -> Self {
        self.preferred_kind = kind;
        self
    }

    pub fn index_space(mut self, target_proc: Processor) -> Self {
        self.is_index_space = true;
        self.target_proc = Some(target_proc);
        self
    }
}

/// Domain of an index-space launch. Dimension is the length of `lo`/`hi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchDomain {
    pub lo: Vec<i64>,
    pub hi: Vec<i64>,
}

impl LaunchDomain {
    pub fn dim(&self) -> usize {
        self.lo.len()
    }
}

impl fmt::Display for LaunchDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}..={:?}", self.lo, self.hi)
    }
}

/// One point of an index launch, pinned to a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSlice {
    pub domain: TileRect,
    pub processor: Processor,
    pub recurse: bool,
    pub stealable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SliceOutput {
    pub slices: Vec<TaskSlice>,
    /// Whether the runtime should re-check that slices are disjoint.
    pub verify_correctness: bool,
}

/// An explicit region-to-region copy.
#[derive(Debug, Clone)]
pub struct CopyDescriptor {
    pub src_requirements: Vec<RegionRequirement>,
    pub dst_requirements: Vec<RegionRequirement>,
    pub src_indirect_requirements: usize,
    pub dst_indirect_requirements: usize,
    pub is_index_space: bool,
}

impl CopyDescriptor {
    pub fn single(src: RegionRequirement, dst: RegionRequirement) -> Self {
        Self {
            src_requirements: vec![src],
            dst_requirements: vec![dst],
            src_indirect_requirements: 0,
            dst_indirect_requirements: 0,
            is_index_space: false,
        }
    }
}

/// Candidate instances the runtime offers for each copy requirement.
#[derive(Debug, Clone, Default)]
pub struct CopyInput {
    pub src_instances: Vec<Vec<InstanceHandle>>,
    pub dst_instances: Vec<Vec<InstanceHandle>>,
}

impl CopyInput {
    /// Input with one empty candidate list per side.
    pub fn empty() -> Self {
        Self {
            src_instances: vec![Vec::new()],
            dst_instances: vec![Vec::new()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutput {
    pub src_instance: InstanceHandle,
    pub dst_instance: PhysicalInstance,
    pub dst_processor: Processor,
}
