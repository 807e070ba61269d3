//! Error types for subsurf.
//!
//! Every fallible operation of the sync protocol and the configuration
//! surface returns [`Result`]. Errors are reported before any state is
//! touched, so a rejected call leaves the context exactly as it was.

use thiserror::Error;

use crate::subsurf::SyncState;

/// Result type alias using [`SubsurfError`].
pub type Result<T> = std::result::Result<T, SubsurfError>;

/// Coarse classification of a [`SubsurfError`].
///
/// Callers that only need to know whether they misused the protocol or
/// passed bad data can match on this instead of the individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The call is not legal in the current sync state.
    InvalidSyncState,
    /// An argument is malformed, unknown, or violates a topology constraint.
    InvalidValue,
}

/// The kind of element an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// A vertex.
    Vert,
    /// An edge.
    Edge,
    /// A face.
    Face,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ElementKind::Vert => "vertex",
            ElementKind::Edge => "edge",
            ElementKind::Face => "face",
        })
    }
}

/// Errors that can occur while configuring or synchronizing a subdivision context.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubsurfError {
    /// The operation is not allowed in the current sync state.
    #[error("{operation} is not allowed in sync state {state:?}")]
    InvalidSyncState {
        /// Name of the rejected operation.
        operation: &'static str,
        /// State the context was in.
        state: SyncState,
    },

    /// A handle does not resolve to a live element.
    #[error("unknown {kind} handle {handle}")]
    MissingHandle {
        /// Element kind of the handle.
        kind: ElementKind,
        /// Debug rendering of the handle.
        handle: String,
    },

    /// A handle was synced twice within one full resync pass.
    #[error("{kind} handle {handle} was already synced in this pass")]
    DuplicateHandle {
        /// Element kind of the handle.
        kind: ElementKind,
        /// Debug rendering of the handle.
        handle: String,
    },

    /// An element cannot be deleted while other elements still reference it.
    #[error("{kind} {handle} is still referenced by {edges} edges and {faces} faces")]
    DanglingAdjacency {
        /// Element kind of the handle.
        kind: ElementKind,
        /// Debug rendering of the handle.
        handle: String,
        /// Number of edges still attached.
        edges: usize,
        /// Number of faces still attached.
        faces: usize,
    },

    /// An edge would change endpoints while faces are attached to it.
    #[error("edge {handle} cannot change endpoints while {faces} faces use it")]
    EdgeEndpointsInUse {
        /// Debug rendering of the edge handle.
        handle: String,
        /// Number of faces attached.
        faces: usize,
    },

    /// A face definition is not a valid polygon for the current topology.
    #[error("malformed face {handle}: {reason}")]
    MalformedFace {
        /// Debug rendering of the face handle.
        handle: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A sample slice does not have the configured number of layers.
    #[error("sample has {actual} components, expected {expected}")]
    InvalidSample {
        /// Number of interpolated layers the context expects.
        expected: usize,
        /// Length of the slice that was passed.
        actual: usize,
    },

    /// A face index passed to a grid operation is not a live face.
    #[error("face index {index} is not live")]
    UnknownFace {
        /// Raw arena slot of the face.
        index: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl SubsurfError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        SubsurfError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    pub(crate) fn missing<H: std::fmt::Debug>(kind: ElementKind, handle: &H) -> Self {
        SubsurfError::MissingHandle {
            kind,
            handle: format!("{handle:?}"),
        }
    }

    pub(crate) fn duplicate<H: std::fmt::Debug>(kind: ElementKind, handle: &H) -> Self {
        SubsurfError::DuplicateHandle {
            kind,
            handle: format!("{handle:?}"),
        }
    }

    pub(crate) fn malformed_face<H: std::fmt::Debug>(handle: &H, reason: &'static str) -> Self {
        SubsurfError::MalformedFace {
            handle: format!("{handle:?}"),
            reason,
        }
    }

    /// The coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubsurfError::InvalidSyncState { .. } => ErrorKind::InvalidSyncState,
            SubsurfError::MissingHandle { .. }
            | SubsurfError::DuplicateHandle { .. }
            | SubsurfError::DanglingAdjacency { .. }
            | SubsurfError::EdgeEndpointsInUse { .. }
            | SubsurfError::MalformedFace { .. }
            | SubsurfError::InvalidSample { .. }
            | SubsurfError::UnknownFace { .. }
            | SubsurfError::InvalidParameter { .. } => ErrorKind::InvalidValue,
        }
    }
}
