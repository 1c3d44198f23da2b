//! Initial processor selection for single-point task launches.
//!
//! Tile-centered tasks go to the rank owning their tile, round-robin over
//! that rank's processors of the task's preferred kind. Driver tasks go to
//! the default processor of their sample's first rank. Index launches and
//! whitelisted global tasks defer to the runtime's default policy.

use tracing::debug;

use tilegrid_core::{DriverPayload, Processor, Side, TileCoord};

use crate::classify::{DriverKind, TaskCategory, TileTask, classify};
use crate::context::{PlacementContext, task_tile};
use crate::error::{PlacementError, PlacementResult};
use crate::runtime::{DefaultPolicy, RegionTree, TaskDescriptor};

/// Pick the processor a single-point task launch starts on.
pub fn select_initial_processor(
    ctx: &PlacementContext,
    tree: &dyn RegionTree,
    default: &dyn DefaultPolicy,
    task: &TaskDescriptor,
) -> PlacementResult<Processor> {
    match classify(task)? {
        TaskCategory::TileCentered(kind) => place_tile_task(ctx, tree, task, kind),
        TaskCategory::Driver(kind) => place_driver(ctx, task, kind),
        TaskCategory::IndexSpace | TaskCategory::Global => Ok(default.select_initial_processor(task)),
    }
}

fn place_tile_task(
    ctx: &PlacementContext,
    tree: &dyn RegionTree,
    task: &TaskDescriptor,
    kind: TileTask,
) -> PlacementResult<Processor> {
    let req = task
        .regions
        .first()
        .ok_or_else(|| PlacementError::NoRegionArgument(task.name.clone()))?;
    let (sample, mapping) = ctx.registry().resolve(tree, req)?;

    // Far-face boundary tasks are launched on the tile one over.
    let mut extra = [0u32; 3];
    if let TileTask::Boundary(face) = kind {
        if face.side == Side::Hi {
            extra[face.axis.index()] = 1;
        }
    }
    let [tx, ty, tz] = mapping.extents();
    let launched = task_tile(tree, task, [tx + extra[0], ty + extra[1], tz + extra[2]])?;
    let tile = match (
        launched.x.checked_sub(extra[0]),
        launched.y.checked_sub(extra[1]),
        launched.z.checked_sub(extra[2]),
    ) {
        (Some(x), Some(y), Some(z)) => TileCoord::new(x, y, z),
        _ => return Err(PlacementError::IncorrectTiling(task.name.clone())),
    };

    let (rank, processor) = ctx.tile_processor(mapping, tile, task.preferred_kind)?;
    debug!(
        sample,
        task = %task.name,
        %tile,
        rank,
        %processor,
        "sequential launch placed"
    );
    Ok(processor)
}

fn place_driver(ctx: &PlacementContext, task: &TaskDescriptor, kind: DriverKind) -> PlacementResult<Processor> {
    let sample = match (kind, &task.payload) {
        (DriverKind::Single, Some(payload @ DriverPayload::Single(_)))
        | (DriverKind::Dual, Some(payload @ DriverPayload::Dual(_))) => payload.sample_id(),
        _ => None,
    }
    .ok_or_else(|| PlacementError::InvalidDriverPayload(task.name.clone()))?;

    let rank = ctx.registry().get(sample)?.rank(TileCoord::ORIGIN);
    let processor = ctx.pool().default_processor(rank)?;
    debug!(sample, task = %task.name, rank, %processor, "work task placed");
    Ok(processor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{RegionId, RegionRequirement};
    use tilegrid_core::{MultiConfig, ProcKind, ProcessorId, Rank, RegistrationInput, SampleConfig};

    /// Every region is a root tagged with sample 0, colored at `point`.
    struct FlatTree {
        point: Vec<i64>,
    }

    impl RegionTree for FlatTree {
        fn parent_partition(&self, _region: RegionId) -> Option<crate::runtime::PartitionId> {
            None
        }
        fn partition_parent(&self, _partition: crate::runtime::PartitionId) -> RegionId {
            RegionId(0)
        }
        fn color_point(&self, _region: RegionId) -> Option<Vec<i64>> {
            Some(self.point.clone())
        }
        fn index_space_depth(&self, _region: RegionId) -> u32 {
            0
        }
        fn sample_tag(&self, _region: RegionId) -> Option<u32> {
            Some(0)
        }
    }

    struct Fallback;

    impl DefaultPolicy for Fallback {
        fn select_initial_processor(&self, _task: &TaskDescriptor) -> Processor {
            Processor { id: ProcessorId(999), rank: 0, kind: ProcKind::Utility }
        }
        fn select_task_priority(&self, _task: &TaskDescriptor) -> crate::runtime::TaskPriority {
            0
        }
    }

    fn context() -> PlacementContext {
        let inputs = vec![RegistrationInput::Single(SampleConfig::new([4, 4, 4], [2, 2, 2]))];
        let procs = (0..8u32).flat_map(|rank: Rank| {
            [ProcKind::Host, ProcKind::Host, ProcKind::Accelerator]
                .into_iter()
                .enumerate()
                .map(move |(i, kind)| Processor {
                    id: ProcessorId(u64::from(rank) * 10 + i as u64),
                    rank,
                    kind,
                })
        });
        PlacementContext::new(&inputs, procs, 0).unwrap()
    }

    fn tile_task(name: &str) -> TaskDescriptor {
        TaskDescriptor::new(name).with_region(RegionRequirement::region(RegionId(1), vec![]))
    }

    #[test]
    fn sweep_task_lands_on_owning_rank() {
        let ctx = context();
        let tree = FlatTree { point: vec![3, 1, 0] };
        let proc = select_initial_processor(&ctx, &tree, &Fallback, &tile_task("sweep_1")).unwrap();
        // Rank 4, slot 6, two host CPUs: 6 % 2 == 0.
        assert_eq!(proc.rank, 4);
        assert_eq!(proc.id, ProcessorId(40));
    }

    #[test]
    fn preferred_kind_selects_bucket() {
        let ctx = context();
        let tree = FlatTree { point: vec![3, 1, 1] };
        let task = tile_task("TradeQueue_pull").with_preferred_kind(ProcKind::Accelerator);
        let proc = select_initial_processor(&ctx, &tree, &Fallback, &task).unwrap();
        assert_eq!(proc.kind, ProcKind::Accelerator);
        assert_eq!(proc.rank, 4);
    }

    #[test]
    fn far_face_boundary_task_shifts_back_one_tile() {
        let ctx = context();
        // Launched on x == 4, one past the last tile.
        let tree = FlatTree { point: vec![4, 0, 0] };
        let hi = select_initial_processor(&ctx, &tree, &Fallback, &tile_task("bound_x_hi")).unwrap();
        assert_eq!(hi.rank, 4);

        let lo = select_initial_processor(&ctx, &tree, &Fallback, &tile_task("bound_x_lo"));
        assert!(matches!(lo, Err(PlacementError::IncorrectTiling(_))));

        let tree = FlatTree { point: vec![1, 0, 0] };
        let lo = select_initial_processor(&ctx, &tree, &Fallback, &tile_task("bound_x_lo")).unwrap();
        assert_eq!(lo.rank, 0);
    }

    #[test]
    fn far_face_task_on_first_tile_is_rejected() {
        let ctx = context();
        let tree = FlatTree { point: vec![0, 0, 0] };
        let err = select_initial_processor(&ctx, &tree, &Fallback, &tile_task("bound_y_hi")).unwrap_err();
        assert!(matches!(err, PlacementError::IncorrectTiling(_)));
    }

    #[test]
    fn tile_task_without_regions_is_rejected() {
        let ctx = context();
        let tree = FlatTree { point: vec![0, 0, 0] };
        let err = select_initial_processor(&ctx, &tree, &Fallback, &TaskDescriptor::new("sweep_2")).unwrap_err();
        assert!(matches!(err, PlacementError::NoRegionArgument(_)));
    }

    #[test]
    fn driver_goes_to_first_rank_default_processor() {
        let ctx = context();
        let tree = FlatTree { point: vec![] };
        let task = TaskDescriptor::new("workSingle")
            .with_payload(DriverPayload::Single(SampleConfig::new([4, 4, 4], [2, 2, 2])));
        let proc = select_initial_processor(&ctx, &tree, &Fallback, &task).unwrap();
        assert_eq!(proc, Processor { id: ProcessorId(0), rank: 0, kind: ProcKind::Host });
    }

    #[test]
    fn driver_payload_must_match_task() {
        let ctx = context();
        let tree = FlatTree { point: vec![] };
        let config = SampleConfig::new([4, 4, 4], [2, 2, 2]);
        let task = TaskDescriptor::new("workDual").with_payload(DriverPayload::Single(config.clone()));
        assert!(matches!(
            select_initial_processor(&ctx, &tree, &Fallback, &task),
            Err(PlacementError::InvalidDriverPayload(_))
        ));

        let mut second = config.clone();
        second.mapping.sample_id = 1;
        let task = TaskDescriptor::new("workDual")
            .with_payload(DriverPayload::Dual(MultiConfig { configs: vec![second, config] }));
        assert!(matches!(
            select_initial_processor(&ctx, &tree, &Fallback, &task),
            Err(PlacementError::UnknownSample { sample: 1, .. })
        ));
    }

    #[test]
    fn global_and_index_tasks_defer_to_default() {
        let ctx = context();
        let tree = FlatTree { point: vec![] };
        let main = select_initial_processor(&ctx, &tree, &Fallback, &TaskDescriptor::new("main")).unwrap();
        assert_eq!(main.id, ProcessorId(999));

        let target = Processor { id: ProcessorId(1), rank: 0, kind: ProcKind::Host };
        let index = TaskDescriptor::new("flux_update").index_space(target);
        assert_eq!(
            select_initial_processor(&ctx, &tree, &Fallback, &index).unwrap().id,
            ProcessorId(999)
        );
    }

    #[test]
    fn unhandled_task_is_rejected() {
        let ctx = context();
        let tree = FlatTree { point: vec![] };
        let err = select_initial_processor(&ctx, &tree, &Fallback, &TaskDescriptor::new("stray")).unwrap_err();
        assert!(matches!(err, PlacementError::UnhandledTask(_)));
    }
}
