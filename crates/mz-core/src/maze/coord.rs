//! Doubled-resolution grid coordinates
//!
//! A [`GridCoord`] packs a half-integer `(y, x)` pair into a single integer:
//! the high nibble of each byte holds the whole part and the `0x8` bit holds
//! the half. For a height-3, width-2 map (corners omitted):
//!
//! ```text
//!        0008        0018
//!  0800  0808  0810  0818  0820
//!        1008        1018
//!  1800  1808  1810  1818  1820
//!        2008        2018
//! ```
//!
//! Centers carry both half bits, edges exactly one, corners none.

use core::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Vertical half step.
pub const HALF_Y: i32 = 0x800;
/// Horizontal half step.
pub const HALF_X: i32 = 0x8;
/// Offset from a screen's top-left corner to its center.
pub const CENTER: i32 = 0x808;

/// Cardinal direction, numbered to match edge-mask bits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumIter,
)]
#[repr(u8)]
pub enum Dir {
    Up = 0,
    Left = 1,
    Down = 2,
    Right = 3,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Left, Dir::Down, Dir::Right];

    /// Direction from its numeric index (taken mod 4).
    pub const fn from_index(i: usize) -> Dir {
        Dir::ALL[i & 3]
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn opposite(self) -> Dir {
        Dir::from_index(self as usize ^ 2)
    }

    /// Bit for this direction in a 4-bit edge mask.
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// True for left and right.
    pub const fn is_horizontal(self) -> bool {
        (self as u8) & 1 != 0
    }

    /// Half step on the grid toward this direction.
    pub const fn grid_delta(self) -> i32 {
        match self {
            Dir::Up => -HALF_Y,
            Dir::Left => -HALF_X,
            Dir::Down => HALF_Y,
            Dir::Right => HALF_X,
        }
    }

    /// Index of the edge in a row-major 3x3 tile.
    pub const fn tile_index(self) -> usize {
        match self {
            Dir::Up => 1,
            Dir::Left => 3,
            Dir::Down => 7,
            Dir::Right => 5,
        }
    }

    pub const fn dy(self) -> i32 {
        match self {
            Dir::Up => -1,
            Dir::Down => 1,
            _ => 0,
        }
    }

    pub const fn dx(self) -> i32 {
        match self {
            Dir::Left => -1,
            Dir::Right => 1,
            _ => 0,
        }
    }
}

/// Screen position within a layout: `y << 4 | x`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Pos(pub u8);

impl Pos {
    pub const fn new(y: usize, x: usize) -> Pos {
        Pos(((y as u8) << 4) | (x as u8 & 0xf))
    }

    pub const fn y(self) -> usize {
        (self.0 >> 4) as usize
    }

    pub const fn x(self) -> usize {
        (self.0 & 0xf) as usize
    }

    /// Top-left grid coordinate of this screen.
    pub const fn to_grid(self) -> GridCoord {
        GridCoord::screen(self.y(), self.x())
    }

    /// Shift by a signed offset, or `None` if it leaves the 16x16 space.
    pub fn offset(self, dy: i32, dx: i32) -> Option<Pos> {
        let y = self.y() as i32 + dy;
        let x = self.x() as i32 + dx;
        if (0..16).contains(&y) && (0..16).contains(&x) {
            Some(Pos::new(y as usize, x as usize))
        } else {
            None
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}

/// A point on the doubled-resolution grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GridCoord(pub i32);

impl GridCoord {
    /// Top-left corner of screen `(y, x)`.
    pub const fn screen(y: usize, x: usize) -> GridCoord {
        GridCoord(((y as i32) << 12) | ((x as i32) << 4))
    }

    /// Center of screen `(y, x)`.
    pub const fn center_of(y: usize, x: usize) -> GridCoord {
        GridCoord(Self::screen(y, x).0 | CENTER)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    pub const fn offset(self, delta: i32) -> GridCoord {
        GridCoord(self.0 + delta)
    }

    pub const fn step(self, dir: Dir) -> GridCoord {
        self.offset(dir.grid_delta())
    }

    pub const fn step_by(self, dir: Dir, n: i32) -> GridCoord {
        self.offset(dir.grid_delta() * n)
    }

    pub const fn n(self) -> GridCoord {
        self.step(Dir::Up)
    }

    pub const fn s(self) -> GridCoord {
        self.step(Dir::Down)
    }

    pub const fn w(self) -> GridCoord {
        self.step(Dir::Left)
    }

    pub const fn e(self) -> GridCoord {
        self.step(Dir::Right)
    }

    /// Center of the screen whose top-left corner this is.
    pub const fn center(self) -> GridCoord {
        GridCoord(self.0 | CENTER)
    }

    /// Top-left corner of the screen containing this center.
    pub const fn corner(self) -> GridCoord {
        GridCoord(self.0 & !CENTER)
    }

    pub const fn is_center(self) -> bool {
        self.0 & CENTER == CENTER
    }

    pub const fn is_edge(self) -> bool {
        (self.0 ^ (self.0 >> 8)) & 8 != 0
    }

    pub const fn is_corner(self) -> bool {
        self.0 & CENTER == 0
    }

    /// Whole-screen row.
    pub const fn y(self) -> usize {
        (self.0 >> 12) as usize
    }

    /// Whole-screen column.
    pub const fn x(self) -> usize {
        ((self.0 >> 4) & 0xf) as usize
    }

    /// Row in half steps.
    pub const fn y2(self) -> i32 {
        self.0 >> 11
    }

    /// Column in half steps.
    pub const fn x2(self) -> i32 {
        (self.0 & 0xf8) >> 3
    }

    /// True when no stray bits sit outside the encoded fields.
    pub const fn is_canonical(self) -> bool {
        self.0 >= 0 && self.0 & 0x707 == 0
    }

    /// Screen position of a center or corner.
    pub const fn pos(self) -> Pos {
        Pos((((self.0 >> 4) & 0xf) | ((self.0 >> 8) & 0xf0)) as u8)
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_kinds() {
        let c = GridCoord::center_of(1, 2);
        assert_eq!(c.raw(), 0x1828);
        assert!(c.is_center());
        assert!(!c.is_edge());
        assert!(c.n().is_edge());
        assert!(c.e().is_edge());
        assert!(c.n().e().is_corner());
    }

    #[test]
    fn test_dir_tables() {
        for d in Dir::ALL {
            assert_eq!(d.opposite().opposite(), d);
            assert_eq!(d.grid_delta(), -d.opposite().grid_delta());
        }
        assert_eq!(Dir::Right.bit(), 8);
        assert_eq!(Dir::Down.tile_index(), 7);
        assert!(Dir::Left.is_horizontal());
    }

    #[test]
    fn test_pos_roundtrip() {
        let p = Pos::new(3, 5);
        assert_eq!(p.0, 0x35);
        assert_eq!(p.to_grid().center().pos(), p);
        assert_eq!(p.offset(-4, 0), None);
        assert_eq!(p.offset(1, -1), Some(Pos::new(4, 4)));
    }

    proptest! {
        #[test]
        fn center_halves_are_odd(y in 0usize..16, x in 0usize..8) {
            let c = GridCoord::center_of(y, x);
            prop_assert_eq!(c.y2(), 2 * y as i32 + 1);
            prop_assert_eq!(c.x2(), 2 * x as i32 + 1);
            prop_assert_eq!(c.corner(), GridCoord::screen(y, x));
            prop_assert!(c.is_canonical());
        }

        #[test]
        fn steps_are_reversible(y in 1usize..15, x in 1usize..7, d in 0usize..4) {
            let dir = Dir::from_index(d);
            let c = GridCoord::center_of(y, x);
            prop_assert_eq!(c.step(dir).step(dir.opposite()), c);
            prop_assert!(c.step(dir).is_edge());
            prop_assert!(c.step_by(dir, 2).is_center());
        }
    }
}
