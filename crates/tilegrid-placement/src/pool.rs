//! Processor pool: the cluster's processors bucketed by rank and kind.

use std::collections::{BTreeSet, HashMap};

use tilegrid_core::{ProcKind, Processor, Rank};

use crate::error::{PlacementError, PlacementResult};

/// Preference order for the processor that receives halo-copy data.
pub const COPY_KIND_PRIORITY: [ProcKind; 3] = [ProcKind::Accelerator, ProcKind::HostOffload, ProcKind::Host];

/// Immutable enumeration of every processor visible to the job.
#[derive(Debug, Clone, Default)]
pub struct ProcessorPool {
    buckets: HashMap<(Rank, ProcKind), Vec<Processor>>,
}

impl ProcessorPool {
    /// Bucket processors by `(rank, kind)`, keeping enumeration order.
    pub fn from_processors(processors: impl IntoIterator<Item = Processor>) -> Self {
        let mut buckets: HashMap<(Rank, ProcKind), Vec<Processor>> = HashMap::new();
        for proc in processors {
            buckets.entry((proc.rank, proc.kind)).or_default().push(proc);
        }
        Self { buckets }
    }

    /// Processors of `kind` on `rank`. An empty bucket is an error.
    pub fn procs(&self, rank: Rank, kind: ProcKind) -> PlacementResult<&[Processor]> {
        match self.buckets.get(&(rank, kind)) {
            Some(procs) if !procs.is_empty() => Ok(procs),
            _ => Err(PlacementError::EmptyProcessorBucket { rank, kind }),
        }
    }

    /// Pick a processor by slot, round-robin over the bucket.
    pub fn pick(&self, rank: Rank, kind: ProcKind, slot: u32) -> PlacementResult<Processor> {
        let procs = self.procs(rank, kind)?;
        Ok(procs[slot as usize % procs.len()])
    }

    /// The rank's default processor: its first host CPU.
    pub fn default_processor(&self, rank: Rank) -> PlacementResult<Processor> {
        self.pick(rank, ProcKind::Host, 0)
    }

    pub fn has_kind(&self, rank: Rank, kind: ProcKind) -> bool {
        self.buckets.get(&(rank, kind)).is_some_and(|p| !p.is_empty())
    }

    /// Number of ranks hosting at least one host CPU.
    pub fn supplied_ranks(&self) -> u32 {
        let ranks: BTreeSet<Rank> = self
            .buckets
            .iter()
            .filter(|((_, kind), procs)| *kind == ProcKind::Host && !procs.is_empty())
            .map(|((rank, _), _)| *rank)
            .collect();
        ranks.len() as u32
    }

    /// Kind that receives halo-copy data, decided by what `local_rank` hosts.
    ///
    /// Falls back to plain host processors when the rank has none of the
    /// preferred kinds.
    pub fn copy_destination_kind(&self, local_rank: Rank) -> ProcKind {
        COPY_KIND_PRIORITY
            .into_iter()
            .find(|&kind| self.has_kind(local_rank, kind))
            .unwrap_or(ProcKind::Host)
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
