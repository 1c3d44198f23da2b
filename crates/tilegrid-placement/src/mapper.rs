//! Mapper facade: the entry points the runtime calls.
//!
//! Each decision has a `try_` form returning the policy's `Result`, and an
//! infallible form that logs any error and terminates the process. A
//! placement error means the tile-locality invariant can no longer be kept,
//! so there is no degraded mode.

use std::sync::Arc;

use tracing::error;

use tilegrid_core::Processor;

use crate::context::PlacementContext;
use crate::copy::map_copy;
use crate::error::PlacementResult;
use crate::placer::select_initial_processor;
use crate::priority::select_task_priority;
use crate::runtime::{
    CopyDescriptor, CopyInput, CopyOutput, LaunchDomain, MapperRuntime, MemoryId, RegionId, RegionRequirement,
    SliceOutput, TaskDescriptor, TaskPriority,
};
use crate::slicer::slice_task;

/// One mapper instance, bound to a local processor. Instances on the same
/// rank share one context.
#[derive(Debug, Clone)]
pub struct TileMapper {
    ctx: Arc<PlacementContext>,
    local: Processor,
}

impl TileMapper {
    pub fn new(ctx: Arc<PlacementContext>, local: Processor) -> Self {
        Self { ctx, local }
    }

    /// One mapper per local processor, all sharing `ctx`.
    pub fn for_processors(ctx: Arc<PlacementContext>, local: impl IntoIterator<Item = Processor>) -> Vec<Self> {
        local.into_iter().map(|p| Self::new(Arc::clone(&ctx), p)).collect()
    }

    pub fn context(&self) -> &PlacementContext {
        &self.ctx
    }

    pub fn local_processor(&self) -> Processor {
        self.local
    }

    pub fn try_select_initial_processor<R: MapperRuntime>(
        &self,
        rt: &R,
        task: &TaskDescriptor,
    ) -> PlacementResult<Processor> {
        select_initial_processor(&self.ctx, rt, rt, task)
    }

    pub fn select_initial_processor<R: MapperRuntime>(&self, rt: &R, task: &TaskDescriptor) -> Processor {
        or_exit(self.try_select_initial_processor(rt, task))
    }

    pub fn try_select_task_priority<R: MapperRuntime>(
        &self,
        rt: &R,
        task: &TaskDescriptor,
    ) -> PlacementResult<TaskPriority> {
        select_task_priority(&self.ctx, rt, rt, task)
    }

    pub fn select_task_priority<R: MapperRuntime>(&self, rt: &R, task: &TaskDescriptor) -> TaskPriority {
        or_exit(self.try_select_task_priority(rt, task))
    }

    pub fn try_slice_task<R: MapperRuntime>(
        &self,
        rt: &R,
        task: &TaskDescriptor,
        domain: &LaunchDomain,
    ) -> PlacementResult<SliceOutput> {
        slice_task(&self.ctx, rt, task, domain)
    }

    pub fn slice_task<R: MapperRuntime>(&self, rt: &R, task: &TaskDescriptor, domain: &LaunchDomain) -> SliceOutput {
        or_exit(self.try_slice_task(rt, task, domain))
    }

    pub fn try_map_copy<R: MapperRuntime>(
        &self,
        rt: &R,
        copy: &CopyDescriptor,
        input: &CopyInput,
    ) -> PlacementResult<CopyOutput> {
        map_copy(&self.ctx, rt, rt, copy, input)
    }

    pub fn map_copy<R: MapperRuntime>(&self, rt: &R, copy: &CopyDescriptor, input: &CopyInput) -> CopyOutput {
        or_exit(self.try_map_copy(rt, copy, input))
    }

    /// Memory for an instance used by `processor`; left to the runtime.
    pub fn select_target_memory<R: MapperRuntime>(
        &self,
        rt: &R,
        processor: &Processor,
        req: &RegionRequirement,
    ) -> MemoryId {
        rt.select_target_memory(processor, req)
    }

    /// Region to materialize for a requirement: always exactly the requested
    /// one, never a covering ancestor. `None` for partition requirements.
    pub fn select_instance_region(&self, req: &RegionRequirement) -> Option<RegionId> {
        req.region_id()
    }
}

fn or_exit<T>(result: PlacementResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            error!(class = ?e.class(), "{e}");
            std::process::exit(1)
        }
    }
}
