// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for map construction.
//!
//! Two families matter to callers: input-structure errors abort the geometry
//! that produced them and the run continues; invariant violations indicate a
//! welding bug or input beyond the supported "at most two half-faces per
//! face" model and abort the whole run.

use crate::keys::DartId;

/// Result type alias for topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or exporting the map.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A sew attempted to occupy a link slot that is already taken.
    #[error("dart {0:?} is already linked in dimension {1}")]
    AlreadyLinked(DartId, usize),

    /// A second half-edge registered the same directed edge key.
    #[error("edge key {0} is already pending in the weld index")]
    PendingEdge(String),

    /// A second half-face registered the same face signature.
    #[error("face signature {0} is already pending in the weld index")]
    PendingFace(String),

    /// Two face cycles matched by signature but differ in length.
    #[error("face cycles differ in length, cannot 3-sew")]
    FaceCycleMismatch,

    /// A shell's semantic tag sequence does not pair up with its rings.
    #[error("shell has {tags} semantic tags for {rings} rings")]
    SemanticsMismatch { rings: usize, tags: usize },

    /// A ring tag points outside the geometry's semantic surface table.
    #[error("semantic tag {index} outside surface table of {len} entries")]
    SemanticTagOutOfRange { index: u32, len: usize },

    /// A ring references a vertex index outside the model's vertex table.
    #[error("ring references vertex {index} outside the vertex table ({len} entries)")]
    RingIndexOutOfBounds { index: usize, len: usize },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// `true` for programming-level faults that must abort the whole run.
    ///
    /// Input-structure errors (semantics mismatches, bad indices) are not
    /// fatal: the builder records them and continues with the next geometry.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Error::AlreadyLinked(..)
                | Error::PendingEdge(_)
                | Error::PendingFace(_)
                | Error::FaceCycleMismatch
        )
    }
}
