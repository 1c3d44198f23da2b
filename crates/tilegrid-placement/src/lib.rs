//! Tilegrid placement policy: where every task and halo copy runs.
//!
//! Placement is a pure function of a tile's coordinate and the static
//! configuration: each sample's tiles are grouped into super-tiles, one
//! super-tile per rank, and a tile's slot within its super-tile picks a
//! processor on that rank. This keeps a tile's state on the same processor
//! for the whole run.
//!
//! # Components
//!
//! - **`registry`**: Samples and their rank ranges
//! - **`pool`**: Processors bucketed by rank and kind
//! - **`classify`**: Task name → category
//! - **`placer`**: Initial processor for single-point launches
//! - **`priority`**: Wavefront priority for sweep tasks
//! - **`slicer`**: Per-tile slices for index-space launches
//! - **`copy`**: Instance placement for explicit halo copies
//! - **`mapper`**: Runtime-facing facade; errors terminate the process

pub mod classify;
pub mod context;
pub mod copy;
pub mod error;
pub mod mapper;
pub mod placer;
pub mod pool;
pub mod priority;
pub mod registry;
pub mod runtime;
pub mod slicer;

pub use classify::{BoundaryFace, DriverKind, SweepDirection, TaskCategory, TileTask, classify};
pub use context::PlacementContext;
pub use error::{ErrorClass, PlacementError, PlacementResult};
pub use mapper::TileMapper;
pub use pool::ProcessorPool;
pub use registry::SampleRegistry;
pub use runtime::*;
