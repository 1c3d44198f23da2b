//! Immutable placement context, built once at startup.

use tilegrid_core::{ProcKind, Processor, Rank, RegistrationInput, TileCoord, TileMapping};

use crate::error::{PlacementError, PlacementResult};
use crate::pool::ProcessorPool;
use crate::registry::SampleRegistry;
use crate::runtime::{RegionTree, TaskDescriptor};

/// Sample registry plus processor pool. Never mutated after construction,
/// so it can be shared freely between mapper instances.
#[derive(Debug, Clone)]
pub struct PlacementContext {
    registry: SampleRegistry,
    pool: ProcessorPool,
    copy_kind: ProcKind,
}

impl PlacementContext {
    /// Enumerate processors and register samples.
    ///
    /// `local_rank` is the rank this policy instance runs on; it decides the
    /// processor kind that receives halo-copy data.
    pub fn new(
        inputs: &[RegistrationInput],
        processors: impl IntoIterator<Item = Processor>,
        local_rank: Rank,
    ) -> PlacementResult<Self> {
        let pool = ProcessorPool::from_processors(processors);
        let registry = SampleRegistry::build(inputs, pool.supplied_ranks())?;
        let copy_kind = pool.copy_destination_kind(local_rank);
        Ok(Self {
            registry,
            pool,
            copy_kind,
        })
    }

    pub fn registry(&self) -> &SampleRegistry {
        &self.registry
    }

    pub fn pool(&self) -> &ProcessorPool {
        &self.pool
    }

    pub fn copy_kind(&self) -> ProcKind {
        self.copy_kind
    }

    /// Owning rank of a tile and the processor of `kind` its slot lands on.
    pub fn tile_processor(
        &self,
        mapping: &TileMapping,
        tile: TileCoord,
        kind: ProcKind,
    ) -> PlacementResult<(Rank, Processor)> {
        let rank = mapping.rank(tile);
        let processor = self.pool.pick(rank, kind, mapping.slot(tile))?;
        Ok((rank, processor))
    }
}

/// Tile a task is centered on, read from its first region argument.
///
/// `extents` bounds the accepted coordinate; callers widen it by one on the
/// far face for boundary tasks.
pub(crate) fn task_tile(
    tree: &dyn RegionTree,
    task: &TaskDescriptor,
    extents: [u32; 3],
) -> PlacementResult<TileCoord> {
    let req = task
        .regions
        .first()
        .ok_or_else(|| PlacementError::NoRegionArgument(task.name.clone()))?;
    let incorrect = || PlacementError::IncorrectTiling(task.name.clone());
    let region = req.region_id().ok_or_else(incorrect)?;
    let point = tree.color_point(region).ok_or_else(incorrect)?;
    tile_in_bounds(&point, extents).ok_or_else(incorrect)
}

/// Convert a 3D color point to a tile, if it lies inside `extents`.
pub(crate) fn tile_in_bounds(point: &[i64], extents: [u32; 3]) -> Option<TileCoord> {
    let [x, y, z] = <[i64; 3]>::try_from(point).ok()?;
    let coord = |c: i64, extent: u32| u32::try_from(c).ok().filter(|&c| c < extent);
    Some(TileCoord::new(
        coord(x, extents[0])?,
        coord(y, extents[1])?,
        coord(z, extents[2])?,
    ))
}
