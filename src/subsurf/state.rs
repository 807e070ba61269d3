//! The sync state machine.

use crate::error::{Result, SubsurfError};

/// Where a context is in its sync protocol.
///
/// A full resync walks `None → Vert → Edge → Face → None` and only moves
/// forward; a partial sync goes `None → Partial → None`. Steps of the full
/// path may be skipped (a mesh without faces never enters `Face`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SyncState {
    /// No sync is open.
    #[default]
    None,
    /// Full resync, accepting vertices.
    Vert,
    /// Full resync, accepting edges.
    Edge,
    /// Full resync, accepting faces.
    Face,
    /// Partial sync, accepting edits and deletions in any order.
    Partial,
}

/// Operations that drive the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SyncOp {
    InitFull,
    InitPartial,
    Vert,
    Edge,
    Face,
    Delete,
    Process,
}

impl SyncState {
    /// Whether a sync pass is open.
    #[inline]
    pub fn is_open(self) -> bool {
        self != SyncState::None
    }

    /// Whether the open pass is a full resync.
    #[inline]
    pub fn is_full(self) -> bool {
        matches!(self, SyncState::Vert | SyncState::Edge | SyncState::Face)
    }

    /// The state after `op`, or `InvalidSyncState` naming `operation`.
    pub(crate) fn transition(self, op: SyncOp, operation: &'static str) -> Result<SyncState> {
        use SyncOp as O;
        use SyncState as S;

        let next = match (self, op) {
            (S::None, O::InitFull) => S::Vert,
            (S::None, O::InitPartial) => S::Partial,
            (S::Vert, O::Vert) => S::Vert,
            (S::Vert | S::Edge, O::Edge) => S::Edge,
            (S::Vert | S::Edge | S::Face, O::Face) => S::Face,
            (S::Partial, O::Vert | O::Edge | O::Face | O::Delete) => S::Partial,
            (S::Vert | S::Edge | S::Face | S::Partial, O::Process) => S::None,
            _ => {
                return Err(SubsurfError::InvalidSyncState {
                    operation,
                    state: self,
                })
            }
        };
        Ok(next)
    }
}
