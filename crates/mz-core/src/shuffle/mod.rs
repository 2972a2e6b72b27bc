//! Randomized level shuffling
//!
//! An attempt floods a grid, places exits and features, trims it down to
//! the surveyed size, then infers concrete screens. [`CaveStrategy`]
//! variants customize individual steps; [`MazeShuffle`] retries attempts
//! until one survives every check.

pub mod attempt;
pub mod cycle;
pub mod grow;
pub mod labyrinth;
pub mod orchestrator;
pub mod paired;
pub mod pipeline;
pub mod river;
pub mod strategy;
pub mod swamp;
pub mod twostage;
pub mod wide;

pub use attempt::{Attempt, Excursion, Margins};
pub use cycle::{CycleCaveShuffle, TightCycleCaveShuffle};
pub use labyrinth::LabyrinthShuffle;
pub use orchestrator::{run_attempt, MazeShuffle, MazeShuffles, ShuffleOutcome};
pub use paired::{OverpassShuffle, PairedOutcome, PairedShuffle, UnderpassRecord};
pub use river::{RiverCaveShuffle, SaberaPalaceShuffle, WaterfallRiverCaveShuffle};
pub use strategy::{CaveShuffle, CaveStrategy, MAX_ATTEMPTS};
pub use swamp::SwampShuffle;
pub use twostage::EarlyStage;
pub use wide::{CryptEntranceShuffle, WideCaveShuffle};
