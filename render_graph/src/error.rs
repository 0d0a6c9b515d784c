//! Render graph errors.

use thiserror::Error;

use crate::backend::BackendError;
use crate::graph::PassHandle;
use crate::resources::ResourceId;
use crate::tracking::HazardError;

/// Failures that abort a graph operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("render graph was already submitted; call reset() before executing again")]
    AlreadySubmitted,

    #[error("pass handle does not belong to this graph")]
    InvalidPassHandle,

    #[error("descriptor handle does not belong to this graph")]
    InvalidDescriptorHandle,

    #[error("command stream '{0}' was submitted without being closed")]
    StreamNotClosed(String),
}

/// Non-fatal problems found while compiling or executing a graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphDiagnostic {
    #[error(transparent)]
    Hazard(#[from] HazardError),

    #[error("pass {pass:?} references transient resource {resource:?} that was never created")]
    UnknownTransientResource {
        pass: PassHandle,
        resource: ResourceId,
    },
}
