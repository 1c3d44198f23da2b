//! Index-space launch slicing.
//!
//! A launch over a sample's full tile grid is cut into one slice per tile,
//! each pinned to the processor the tile's rank and slot select. Slices are
//! final: not recursively re-sliced, not stealable.

use tracing::debug;

use tilegrid_core::TileRect;

use crate::context::PlacementContext;
use crate::error::{PlacementError, PlacementResult};
use crate::runtime::{LaunchDomain, RegionTree, SliceOutput, TaskDescriptor, TaskSlice};

pub fn slice_task(
    ctx: &PlacementContext,
    tree: &dyn RegionTree,
    task: &TaskDescriptor,
    domain: &LaunchDomain,
) -> PlacementResult<SliceOutput> {
    let req = task
        .regions
        .first()
        .ok_or_else(|| PlacementError::NoRegionArgument(task.name.clone()))?;
    let (sample, mapping) = ctx.registry().resolve(tree, req)?;

    let full = LaunchDomain {
        lo: vec![0; 3],
        hi: mapping.extents().iter().map(|&t| i64::from(t) - 1).collect(),
    };
    if *domain != full {
        return Err(PlacementError::SliceDomain {
            task: task.name.clone(),
            domain: domain.to_string(),
        });
    }
    let kind = task
        .target_proc
        .ok_or_else(|| PlacementError::MissingTargetProcessor(task.name.clone()))?
        .kind;

    let mut slices = Vec::with_capacity(mapping.num_tiles() as usize);
    for tile in mapping.tiles() {
        let (rank, processor) = ctx.tile_processor(mapping, tile, kind)?;
        debug!(sample, task = %task.name, %tile, rank, %processor, "index-space slice placed");
        slices.push(TaskSlice {
            domain: TileRect::point(tile),
            processor,
            recurse: false,
            stealable: false,
        });
    }

    Ok(SliceOutput {
        slices,
        verify_correctness: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{PartitionId, RegionId, RegionRequirement};
    use tilegrid_core::{ProcKind, Processor, ProcessorId, RegistrationInput, SampleConfig};

    struct TaggedRoot;

    impl RegionTree for TaggedRoot {
        fn parent_partition(&self, _region: RegionId) -> Option<PartitionId> {
            None
        }
        fn partition_parent(&self, _partition: PartitionId) -> RegionId {
            RegionId(0)
        }
        fn color_point(&self, _region: RegionId) -> Option<Vec<i64>> {
            None
        }
        fn index_space_depth(&self, _region: RegionId) -> u32 {
            0
        }
        fn sample_tag(&self, _region: RegionId) -> Option<u32> {
            Some(0)
        }
    }

    fn context() -> PlacementContext {
        let inputs = vec![RegistrationInput::Single(SampleConfig::new([2, 2, 1], [1, 2, 1]))];
        let procs = (0..2).map(|rank| Processor {
            id: ProcessorId(u64::from(rank)),
            rank,
            kind: ProcKind::Host,
        });
        PlacementContext::new(&inputs, procs, 0).unwrap()
    }

    fn launch() -> TaskDescriptor {
        let target = Processor { id: ProcessorId(0), rank: 0, kind: ProcKind::Host };
        TaskDescriptor::new("flux_update")
            .with_region(RegionRequirement::partition(PartitionId(1), vec![]))
            .index_space(target)
    }

    #[test]
    fn one_final_slice_per_tile() {
        let ctx = context();
        let domain = LaunchDomain { lo: vec![0, 0, 0], hi: vec![1, 1, 0] };
        let out = slice_task(&ctx, &TaggedRoot, &launch(), &domain).unwrap();

        assert!(!out.verify_correctness);
        assert_eq!(out.slices.len(), 4);
        assert!(out.slices.iter().all(|s| !s.recurse && !s.stealable));
        let ranks: Vec<_> = out.slices.iter().map(|s| s.processor.rank).collect();
        assert_eq!(ranks, vec![0, 0, 1, 1]);
    }

    #[test]
    fn partial_domain_is_rejected() {
        let ctx = context();
        for domain in [
            LaunchDomain { lo: vec![0, 0, 0], hi: vec![0, 1, 0] },
            LaunchDomain { lo: vec![1, 0, 0], hi: vec![1, 1, 0] },
            LaunchDomain { lo: vec![0, 0], hi: vec![1, 1] },
        ] {
            let err = slice_task(&ctx, &TaggedRoot, &launch(), &domain).unwrap_err();
            assert!(matches!(err, PlacementError::SliceDomain { .. }), "{domain}");
        }
    }

    #[test]
    fn target_processor_kind_is_required() {
        let ctx = context();
        let mut task = launch();
        task.target_proc = None;
        let domain = LaunchDomain { lo: vec![0, 0, 0], hi: vec![1, 1, 0] };
        assert!(matches!(
            slice_task(&ctx, &TaggedRoot, &task, &domain),
            Err(PlacementError::MissingTargetProcessor(_))
        ));
    }
}
