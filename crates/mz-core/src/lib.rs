//! mz-core: cave and maze shuffling engine
//!
//! Regenerates the screen layout of a level while keeping its size, exits,
//! stairs and feature counts, and keeping every entrance reachable. The crate
//! has no I/O dependencies: callers hand it a [`Survey`] and a screen catalog
//! and get back a [`Layout`].
//!
//! Supports `no_std` environments by disabling the default `std` feature.
//! JSON configuration loading is gated behind `cfg(feature = "std")`.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

/// Re-exports of alloc types needed when building without std.
/// In std mode, these are provided by the std prelude.
#[cfg(not(feature = "std"))]
pub(crate) mod compat {
    pub use alloc::borrow::ToOwned;
    pub use alloc::boxed::Box;
    pub use alloc::format;
    pub use alloc::string::{String, ToString};
    pub use alloc::vec;
    pub use alloc::vec::Vec;
}

pub mod catalog;
pub mod config;
pub mod error;
pub mod layout;
pub mod maze;
pub mod rng;
pub mod shuffle;
pub mod survey;

pub use catalog::{Screen, ScreenCatalog, ScreenId, Tileset};
pub use config::{ShuffleConfig, Tuning};
pub use error::{Failure, FailureKind, ShuffleError, Step};
pub use layout::Layout;
pub use maze::{Dir, Grid, GridCoord, Monogrid, Pos, Tag, Tile};
pub use rng::ShuffleRng;
pub use shuffle::{CaveStrategy, MazeShuffle, MazeShuffles, ShuffleOutcome};
pub use survey::Survey;
