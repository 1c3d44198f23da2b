//! Tile geometry mapping.
//!
//! Super-tiles map to ranks in row-major order, starting at the sample's
//! first rank. Within a super-tile each tile gets a row-major slot id; the
//! placement layer matches slots to real processors (not necessarily one
//! processor per slot).

use serde::Serialize;

use crate::config::MappingConfig;
use crate::error::ConfigResult;
use crate::types::{Rank, TileCoord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileMapping {
    tiles_per_rank: [u32; 3],
    ranks_per_dim: [u32; 3],
    first_rank: Rank,
}

impl TileMapping {
    /// Build the mapping for a sample whose ranks start at `first_rank`.
    ///
    /// `position` is the 1-based registration position, used only to name
    /// the sample if the tiling is invalid.
    ///
    /// Fails if the sample's rank range would run past `Rank::MAX`.
    pub fn new(config: &MappingConfig, first_rank: Rank, position: usize) -> ConfigResult<Self> {
        let num_ranks = config.num_ranks(position)?;
        if first_rank.checked_add(num_ranks).is_none() {
            return Err(config.invalid(position));
        }
        let t = config.tiles;
        let s = config.tiles_per_rank;
        Ok(Self {
            tiles_per_rank: s,
            ranks_per_dim: [t[0] / s[0], t[1] / s[1], t[2] / s[2]],
            first_rank,
        })
    }

    pub fn rank(&self, tile: TileCoord) -> Rank {
        let [sx, sy, sz] = self.tiles_per_rank;
        let [_, ry, rz] = self.ranks_per_dim;
        self.first_rank + (tile.x / sx) * ry * rz + (tile.y / sy) * rz + (tile.z / sz)
    }

    /// Row-major index of the tile within its super-tile.
    pub fn slot(&self, tile: TileCoord) -> u32 {
        let [sx, sy, sz] = self.tiles_per_rank;
        (tile.x % sx) * sy * sz + (tile.y % sy) * sz + (tile.z % sz)
    }

    pub fn first_rank(&self) -> Rank {
        self.first_rank
    }

    pub fn num_ranks(&self) -> u32 {
        self.ranks_per_dim.iter().product()
    }

    /// Ranks owned by this sample, `[first_rank, first_rank + num_ranks)`.
    pub fn ranks(&self) -> std::ops::Range<Rank> {
        self.first_rank..self.first_rank + self.num_ranks()
    }

    pub fn tiles_per_rank(&self) -> [u32; 3] {
        self.tiles_per_rank
    }

    pub fn slots_per_rank(&self) -> u32 {
        self.tiles_per_rank.iter().product()
    }

    pub fn x_tiles(&self) -> u32 {
        self.tiles_per_rank[0] * self.ranks_per_dim[0]
    }

    pub fn y_tiles(&self) -> u32 {
        self.tiles_per_rank[1] * self.ranks_per_dim[1]
    }

    pub fn z_tiles(&self) -> u32 {
        self.tiles_per_rank[2] * self.ranks_per_dim[2]
    }

    pub fn extents(&self) -> [u32; 3] {
        [self.x_tiles(), self.y_tiles(), self.z_tiles()]
    }

    pub fn num_tiles(&self) -> u32 {
        self.x_tiles() * self.y_tiles() * self.z_tiles()
    }

    pub fn contains(&self, tile: TileCoord) -> bool {
        tile.x < self.x_tiles() && tile.y < self.y_tiles() && tile.z < self.z_tiles()
    }

    /// All tiles of the grid in row-major order (z fastest).
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let [tx, ty, tz] = self.extents();
        (0..tx).flat_map(move |x| (0..ty).flat_map(move |y| (0..tz).map(move |z| TileCoord::new(x, y, z))))
    }
}
