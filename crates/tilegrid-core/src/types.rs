//! Shared types used across tilegrid crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Distributed-memory participant id (an address space in the job).
pub type Rank = u32;

/// Sample id, assigned in registration order.
pub type SampleId = u32;

/// Opaque processor handle as enumerated by the execution runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessorId(pub u64);

impl fmt::Display for ProcessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proc-{:x}", self.0)
    }
}

/// Kind of a physical processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcKind {
    /// Plain host CPU core.
    Host,
    /// Host-offload processor (a multi-core OpenMP-style group).
    HostOffload,
    /// Accelerator (GPU).
    Accelerator,
    /// Runtime utility processor.
    Utility,
    /// I/O processor.
    Io,
}

impl ProcKind {
    pub fn label(&self) -> &'static str {
        match self {
            ProcKind::Host => "host",
            ProcKind::HostOffload => "host_offload",
            ProcKind::Accelerator => "accelerator",
            ProcKind::Utility => "utility",
            ProcKind::Io => "io",
        }
    }
}

impl fmt::Display for ProcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A physical processor: its handle, owning rank, and kind.
///
/// Rank membership is fixed at enumeration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Processor {
    pub id: ProcessorId,
    pub rank: Rank,
    pub kind: ProcKind,
}

impl fmt::Display for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}({})", self.id, self.rank, self.kind)
    }
}

/// Grid axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Face of the domain along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Lo,
    Hi,
}

/// Unsigned 3D tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl TileCoord {
    pub const ORIGIN: TileCoord = TileCoord { x: 0, y: 0, z: 0 };

    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    pub fn get(&self, axis: Axis) -> u32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

impl From<[u32; 3]> for TileCoord {
    fn from([x, y, z]: [u32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}

/// Inclusive 3D rectangle of tiles, as used by index-space launch domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRect {
    pub lo: [i64; 3],
    pub hi: [i64; 3],
}

impl TileRect {
    pub fn point(tile: TileCoord) -> Self {
        let p = [i64::from(tile.x), i64::from(tile.y), i64::from(tile.z)];
        Self { lo: p, hi: p }
    }

    /// The single tile this rectangle covers, if it is a unit rectangle.
    pub fn as_point(&self) -> Option<TileCoord> {
        if self.lo != self.hi {
            return None;
        }
        let [x, y, z] = self.lo;
        Some(TileCoord::new(
            u32::try_from(x).ok()?,
            u32::try_from(y).ok()?,
            u32::try_from(z).ok()?,
        ))
    }
}

impl fmt::Display for TileRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{},{}]..=[{},{},{}]",
            self.lo[0], self.lo[1], self.lo[2], self.hi[0], self.hi[1], self.hi[2]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_rect_roundtrips_tile() {
        let tile = TileCoord::new(3, 1, 0);
        assert_eq!(TileRect::point(tile).as_point(), Some(tile));
    }

    #[test]
    fn non_unit_rect_is_not_a_point() {
        let rect = TileRect { lo: [0, 0, 0], hi: [1, 0, 0] };
        assert_eq!(rect.as_point(), None);
    }

    #[test]
    fn negative_rect_is_not_a_tile() {
        let rect = TileRect { lo: [-1, 0, 0], hi: [-1, 0, 0] };
        assert_eq!(rect.as_point(), None);
    }

    #[test]
    fn proc_kind_serializes_snake_case() {
        let s = toml::to_string(&std::collections::HashMap::from([("k", ProcKind::HostOffload)])).unwrap();
        assert!(s.contains("host_offload"));
    }
}
