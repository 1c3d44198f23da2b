//! Placement of explicit halo-exchange copies.
//!
//! Copies are mapped by their destination tile. The source is always a
//! virtual instance; the destination is a real instance of the whole tile
//! region, in the memory best suited to the processor owning that tile.

use tracing::debug;

use crate::context::{PlacementContext, tile_in_bounds};
use crate::error::{PlacementError, PlacementResult};
use crate::runtime::{
    CopyDescriptor, CopyInput, CopyOutput, HALO_REGION_DEPTH, InstanceHandle, InstanceRuntime, LayoutConstraints,
    RegionTree, TILE_REGION_DEPTH,
};

pub fn map_copy(
    ctx: &PlacementContext,
    tree: &dyn RegionTree,
    instances: &dyn InstanceRuntime,
    copy: &CopyDescriptor,
    input: &CopyInput,
) -> PlacementResult<CopyOutput> {
    check_copy_shape(copy, input)?;
    let src_req = &copy.src_requirements[0];
    let dst_req = &copy.dst_requirements[0];

    let (sample, mapping) = ctx.registry().resolve(tree, dst_req)?;
    let (Some(src_region), Some(dst_region)) = (src_req.region_id(), dst_req.region_id()) else {
        return Err(PlacementError::UnexpectedCopyArguments("copy requirements must name regions"));
    };

    let src_depth = tree.index_space_depth(src_region);
    let dst_depth = tree.index_space_depth(dst_region);
    if src_depth != TILE_REGION_DEPTH || dst_depth != HALO_REGION_DEPTH {
        return Err(PlacementError::UnexpectedCopyBounds(format!(
            "source depth {src_depth}, destination depth {dst_depth}"
        )));
    }

    // Widen the destination to its whole tile so existing instances are reused.
    let dst_partition = tree
        .parent_partition(dst_region)
        .ok_or_else(|| PlacementError::UnexpectedCopyBounds(format!("{dst_region} has no parent")))?;
    let tile_region = tree.partition_parent(dst_partition);

    let src_point = tree.color_point(src_region).unwrap_or_default();
    let dst_point = tree.color_point(tile_region).unwrap_or_default();
    if src_point != dst_point {
        return Err(PlacementError::UnexpectedCopyBounds(format!(
            "source tile {src_point:?} differs from destination tile {dst_point:?}"
        )));
    }
    let tile = tile_in_bounds(&dst_point, mapping.extents()).ok_or_else(|| {
        PlacementError::UnexpectedCopyBounds(format!("tile {dst_point:?} outside sample {sample}"))
    })?;

    let (rank, processor) = ctx.tile_processor(mapping, tile, ctx.copy_kind())?;
    let memory = instances.select_target_memory(&processor, dst_req);
    let constraints = LayoutConstraints {
        fields: dst_req.fields.clone(),
        contiguous: false,
        inorder: false,
    };
    let dst_instance = instances
        .find_or_create_instance(memory, &constraints, tile_region)
        .ok_or(PlacementError::InstanceUnavailable(tile_region))?;

    debug!(sample, %tile, rank, %processor, %memory, "explicit copy destination placed");
    Ok(CopyOutput {
        src_instance: InstanceHandle::Virtual,
        dst_instance,
        dst_processor: processor,
    })
}

fn check_copy_shape(copy: &CopyDescriptor, input: &CopyInput) -> PlacementResult<()> {
    let fail = |reason| Err(PlacementError::UnexpectedCopyArguments(reason));
    if copy.src_indirect_requirements != 0 || copy.dst_indirect_requirements != 0 {
        return fail("indirect copies are not supported");
    }
    if copy.is_index_space {
        return fail("index-space copies are not supported");
    }
    if copy.src_requirements.len() != 1 || copy.dst_requirements.len() != 1 {
        return fail("expected exactly one source and one destination requirement");
    }
    if copy.dst_requirements[0].restricted {
        return fail("destination is restricted");
    }
    if copy.src_requirements[0].fields.len() != 1 || copy.dst_requirements[0].fields.len() != 1 {
        return fail("expected exactly one field per side");
    }
    // The runtime does not offer the existing destination instances today.
    // If it starts to, this policy must be revisited.
    let offered = |lists: &[Vec<InstanceHandle>]| lists.first().is_some_and(|l| !l.is_empty());
    if offered(&input.src_instances) || offered(&input.dst_instances) {
        return fail("runtime offered candidate instances");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{FieldId, RegionId, RegionRequirement};

    fn copy() -> CopyDescriptor {
        CopyDescriptor::single(
            RegionRequirement::region(RegionId(1), vec![FieldId(0)]),
            RegionRequirement::region(RegionId(2), vec![FieldId(0)]),
        )
    }

    fn shape_error(copy: &CopyDescriptor, input: &CopyInput) -> &'static str {
        match check_copy_shape(copy, input) {
            Err(PlacementError::UnexpectedCopyArguments(reason)) => reason,
            other => panic!("expected shape error, got {other:?}"),
        }
    }

    #[test]
    fn plain_copy_passes_shape_checks() {
        assert!(check_copy_shape(&copy(), &CopyInput::empty()).is_ok());
        assert!(check_copy_shape(&copy(), &CopyInput::default()).is_ok());
    }

    #[test]
    fn indirect_and_index_copies_are_rejected() {
        let mut c = copy();
        c.src_indirect_requirements = 1;
        assert!(shape_error(&c, &CopyInput::empty()).contains("indirect"));

        let mut c = copy();
        c.is_index_space = true;
        assert!(shape_error(&c, &CopyInput::empty()).contains("index-space"));
    }

    #[test]
    fn multi_field_and_restricted_copies_are_rejected() {
        let mut c = copy();
        c.dst_requirements[0].fields.push(FieldId(1));
        assert!(shape_error(&c, &CopyInput::empty()).contains("one field"));

        let mut c = copy();
        c.dst_requirements[0].restricted = true;
        assert!(shape_error(&c, &CopyInput::empty()).contains("restricted"));

        let mut c = copy();
        c.src_requirements.push(c.src_requirements[0].clone());
        assert!(shape_error(&c, &CopyInput::empty()).contains("exactly one source"));
    }

    #[test]
    fn offered_instances_are_rejected() {
        let mut input = CopyInput::empty();
        input.dst_instances[0].push(InstanceHandle::Virtual);
        assert!(shape_error(&copy(), &input).contains("candidate"));
    }
}
