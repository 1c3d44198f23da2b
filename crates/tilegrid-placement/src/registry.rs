//! Sample registry: one tile mapping per registered sample.
//!
//! Ranks are handed out sequentially: each sample gets one rank per
//! super-tile, starting right after the previous sample's range.

use tracing::{info, warn};

use tilegrid_core::{ConfigError, Rank, RegistrationInput, SampleId, TileMapping};

use crate::error::{PlacementError, PlacementResult};
use crate::runtime::{RegionRef, RegionRequirement, RegionTree};

#[derive(Debug, Clone, Default)]
pub struct SampleRegistry {
    samples: Vec<TileMapping>,
}

impl SampleRegistry {
    /// Register every sample of `inputs`, in order, and check that the job
    /// was given enough ranks.
    pub fn build(inputs: &[RegistrationInput], supplied_ranks: u32) -> PlacementResult<Self> {
        let configs: Vec<_> = inputs.iter().flat_map(RegistrationInput::samples).collect();

        // The total across samples may exceed Rank::MAX.
        let mut required = 0u64;
        for (i, config) in configs.iter().enumerate() {
            required += u64::from(config.mapping.num_ranks(i + 1)?);
        }
        if required > u64::from(supplied_ranks) {
            return Err(ConfigError::InsufficientRanks {
                required,
                supplied: supplied_ranks,
            }
            .into());
        }
        if required < u64::from(supplied_ranks) {
            warn!(supplied_ranks, required, "more ranks supplied than required");
        }

        let mut samples = Vec::with_capacity(configs.len());
        let mut next_rank: Rank = 0;
        for config in configs {
            let mapping = TileMapping::new(&config.mapping, next_rank, samples.len() + 1)?;
            next_rank = mapping.ranks().end;
            info!(
                sample = samples.len(),
                tiles = ?mapping.extents(),
                tiles_per_rank = ?mapping.tiles_per_rank(),
                ranks = ?mapping.ranks(),
                "registered sample"
            );
            samples.push(mapping);
        }
        Ok(Self { samples })
    }

    pub fn get(&self, sample: SampleId) -> PlacementResult<&TileMapping> {
        self.samples
            .get(sample as usize)
            .ok_or(PlacementError::UnknownSample {
                sample,
                registered: self.samples.len(),
            })
    }

    /// Total ranks targeted by all samples.
    pub fn required_ranks(&self) -> u32 {
        self.samples.iter().map(TileMapping::num_ranks).sum()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SampleId, &TileMapping)> {
        self.samples.iter().enumerate().map(|(i, m)| (i as SampleId, m))
    }

    /// Find the sample a region requirement belongs to, via the sample tag
    /// on the root of its region tree.
    pub fn resolve(
        &self,
        tree: &dyn RegionTree,
        req: &RegionRequirement,
    ) -> PlacementResult<(SampleId, &TileMapping)> {
        let region = match req.target {
            RegionRef::Region(region) => region,
            RegionRef::Partition(partition) => tree.partition_parent(partition),
        };
        let root = tree.root_of(region);
        let sample = tree
            .sample_tag(root)
            .ok_or(PlacementError::MissingSampleTag(root))?;
        Ok((sample, self.get(sample)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilegrid_core::{MultiConfig, SampleConfig, TileCoord};

    fn single(tiles: [u32; 3], per_rank: [u32; 3]) -> RegistrationInput {
        RegistrationInput::Single(SampleConfig::new(tiles, per_rank))
    }

    #[test]
    fn ranks_are_assigned_contiguously() {
        let inputs = vec![
            single([4, 4, 4], [2, 2, 2]),
            RegistrationInput::Dual(MultiConfig {
                configs: vec![
                    SampleConfig::new([2, 2, 2], [1, 2, 2]),
                    SampleConfig::new([3, 1, 1], [1, 1, 1]),
                ],
            }),
        ];
        let registry = SampleRegistry::build(&inputs, 13).unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(0).unwrap().ranks(), 0..8);
        assert_eq!(registry.get(1).unwrap().ranks(), 8..10);
        assert_eq!(registry.get(2).unwrap().ranks(), 10..13);
        assert_eq!(registry.required_ranks(), 13);
        assert_eq!(registry.get(2).unwrap().rank(TileCoord::new(2, 0, 0)), 12);
    }

    #[test]
    fn insufficient_ranks_fail_construction() {
        let inputs = vec![single([4, 4, 4], [2, 2, 2]), single([2, 1, 1], [1, 1, 1])];
        let err = SampleRegistry::build(&inputs, 9).unwrap_err();
        assert!(matches!(
            err,
            PlacementError::Config(ConfigError::InsufficientRanks { required: 10, supplied: 9 })
        ));
    }

    #[test]
    fn excess_ranks_only_warn() {
        let registry = SampleRegistry::build(&[single([2, 2, 2], [2, 2, 2]), single([2, 1, 1], [1, 1, 1])], 6).unwrap();
        assert_eq!(registry.required_ranks(), 3);
        assert!(registry.required_ranks() < 6);
        assert_eq!(registry.get(1).unwrap().ranks(), 1..3);
    }

    #[test]
    fn rank_total_does_not_wrap() {
        // Each sample needs 2^31 ranks; together they need 2^32.
        let inputs = vec![single([65536, 32768, 1], [1, 1, 1]), single([65536, 32768, 1], [1, 1, 1])];
        let err = SampleRegistry::build(&inputs, 8).unwrap_err();
        assert!(matches!(
            err,
            PlacementError::Config(ConfigError::InsufficientRanks { required: 4_294_967_296, supplied: 8 })
        ));
    }

    #[test]
    fn uncountable_sample_is_invalid_tiling() {
        let err = SampleRegistry::build(&[single([65536, 65536, 1], [1, 1, 1])], 8).unwrap_err();
        assert!(matches!(
            err,
            PlacementError::Config(ConfigError::InvalidTiling { sample: 1, .. })
        ));
    }

    #[test]
    fn invalid_tiling_reports_registration_position() {
        let inputs = vec![single([2, 2, 2], [1, 1, 1]), single([3, 2, 2], [2, 1, 1])];
        let err = SampleRegistry::build(&inputs, 64).unwrap_err();
        assert!(matches!(
            err,
            PlacementError::Config(ConfigError::InvalidTiling { sample: 2, .. })
        ));
    }

    #[test]
    fn unknown_sample_is_rejected() {
        let registry = SampleRegistry::build(&[single([1, 1, 1], [1, 1, 1])], 1).unwrap();
        assert!(matches!(
            registry.get(1),
            Err(PlacementError::UnknownSample { sample: 1, registered: 1 })
        ));
    }
}
