//! Grid representations and connectivity analysis

pub mod coord;
pub mod grid;
pub mod monogrid;
pub mod tag;
pub mod unionfind;

pub use coord::{Dir, GridCoord, Pos};
pub use grid::{Grid, Overrides};
pub use monogrid::{Cursor, Monogrid};
pub use tag::{Tag, Tile};
pub use unionfind::{Partition, UnionFind};
