//! Failure reporting for shuffle attempts
//!
//! Two tiers: [`Failure`] is the expected, retryable outcome of a single
//! pipeline step, while [`ShuffleError`] is what a caller sees once the
//! retry budget for a level is used up. Broken invariants (writing a fixed
//! cell, unknown screen ids) panic instead.

#[cfg(not(feature = "std"))]
use crate::compat::*;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use thiserror::Error;

/// The pipeline step that rejected an attempt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// Border exits could not all be placed.
    Edges,
    Spikes,
    Overpasses,
    /// Could not shrink to the target size.
    Refine,
    RefineEdges,
    Arenas,
    Underpasses,
    Pits,
    Ramps,
    Stairs,
    /// A strategy's pre-inference check rejected the grid.
    Preinfer,
    /// Some screen had no legal tile.
    InferScreen,
    BannedNeighbor,
    AllEmpty,
    /// Wall or bridge targets could not be met.
    RefineLayout,
    Statues,
    PitDestination,
    /// The early-terrain stage failed.
    EarlyFill,
    Disconnected,
    /// A dependent shuffle (paired levels) failed.
    Dependent,
}

/// A retryable pipeline failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {detail}")]
pub struct Failure {
    pub kind: FailureKind,
    pub detail: String,
}

impl Failure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Result of one pipeline step.
pub type Step<T = ()> = Result<T, Failure>;

/// Fatal errors surfaced to the caller of a shuffle.
#[derive(Error, Debug, Clone)]
pub enum ShuffleError {
    #[error("could not shuffle level {level} after {attempts} attempts (last failure: {last})")]
    Exhausted {
        level: String,
        attempts: usize,
        last: Failure,
    },

    #[error("invalid shuffle configuration: {0}")]
    Config(String),
}
