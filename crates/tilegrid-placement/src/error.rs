//! Placement error types.
//!
//! None of these are recoverable: the mapper facade logs them and exits.

use thiserror::Error;

use tilegrid_core::{ConfigError, ProcKind, Rank, SampleId};

use crate::runtime::RegionId;

/// Coarse class of a placement error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Inconsistent tiling parameters, insufficient ranks.
    Configuration,
    /// Runtime-supplied metadata does not match what the policy assumes.
    Protocol,
    /// A required processor or instance does not exist.
    Resource,
}

/// Errors that can occur while making a placement decision.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Missing sample id tag on root region {0}")]
    MissingSampleTag(RegionId),

    #[error("Sample {sample} is not registered ({registered} sample(s) known)")]
    UnknownSample { sample: SampleId, registered: usize },

    #[error("No region argument on launch of task {0}")]
    NoRegionArgument(String),

    #[error("Launch of task {0} using incorrect tiling")]
    IncorrectTiling(String),

    #[error("Unexpected DOM boundary task name: {0}")]
    MalformedBoundaryTask(String),

    #[error("Task {0}: invalid sweep id")]
    InvalidSweepId(String),

    #[error("Unexpected work task name: {0}")]
    UnexpectedWorkTask(String),

    #[error("Work task {0} carries no matching sample payload")]
    InvalidDriverPayload(String),

    #[error("Unhandled non-index space task {0}")]
    UnhandledTask(String),

    #[error("Index-space launch of task {task} over {domain} does not cover the top-level tiling")]
    SliceDomain { task: String, domain: String },

    #[error("Index-space launch of task {0} has no target processor")]
    MissingTargetProcessor(String),

    #[error("Unexpected arguments on explicit copy: {0}")]
    UnexpectedCopyArguments(&'static str),

    #[error("Unexpected bounds on explicit copy: {0}")]
    UnexpectedCopyBounds(String),

    #[error("No {kind} processors on rank {rank}")]
    EmptyProcessorBucket { rank: Rank, kind: ProcKind },

    #[error("Could not locate destination instance for explicit copy on region {0}")]
    InstanceUnavailable(RegionId),
}

impl PlacementError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PlacementError::Config(_) => ErrorClass::Configuration,
            PlacementError::EmptyProcessorBucket { .. } | PlacementError::InstanceUnavailable(_) => {
                ErrorClass::Resource
            }
            _ => ErrorClass::Protocol,
        }
    }
}

pub type PlacementResult<T> = Result<T, PlacementError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_configuration_class() {
        let err: PlacementError = ConfigError::InsufficientRanks { required: 4, supplied: 2 }.into();
        assert_eq!(err.class(), ErrorClass::Configuration);
        assert_eq!(err.to_string(), "4 rank(s) required, but 2 rank(s) supplied");
    }

    #[test]
    fn missing_resources_are_resource_class() {
        let err = PlacementError::EmptyProcessorBucket { rank: 3, kind: ProcKind::Accelerator };
        assert_eq!(err.class(), ErrorClass::Resource);
        assert_eq!(err.to_string(), "No accelerator processors on rank 3");
        assert_eq!(PlacementError::InstanceUnavailable(RegionId(9)).class(), ErrorClass::Resource);
    }

    #[test]
    fn naming_errors_are_protocol_class() {
        let err = PlacementError::UnhandledTask("stray".to_string());
        assert_eq!(err.class(), ErrorClass::Protocol);
        assert!(err.to_string().contains("stray"));
    }
}
