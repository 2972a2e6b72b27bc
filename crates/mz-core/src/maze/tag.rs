//! Grid cell tags and 3x3 tiles

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

#[cfg(not(feature = "std"))]
use crate::compat::*;

/// What occupies a grid point.
///
/// Centers, edges and corners share one tag space; on an edge the tag
/// describes the connection between the two neighboring centers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
    Display, EnumIter,
)]
#[repr(u8)]
pub enum Tag {
    #[default]
    Empty = 0,
    Cave,
    Wide,
    Narrow,
    River,
    Bridge,
    Spikes,
    Arena,
    Ramp,
    Pit,
    StairUp,
    StairDown,
}

impl Tag {
    pub const fn as_char(self) -> char {
        match self {
            Tag::Empty => ' ',
            Tag::Cave => 'c',
            Tag::Wide => 'w',
            Tag::Narrow => 'n',
            Tag::River => 'r',
            Tag::Bridge => 'b',
            Tag::Spikes => 's',
            Tag::Arena => 'a',
            Tag::Ramp => '/',
            Tag::Pit => 'p',
            Tag::StairUp => '<',
            Tag::StairDown => '>',
        }
    }

    pub const fn from_char(c: char) -> Option<Tag> {
        Some(match c {
            ' ' => Tag::Empty,
            'c' => Tag::Cave,
            'w' => Tag::Wide,
            'n' => Tag::Narrow,
            'r' => Tag::River,
            'b' => Tag::Bridge,
            's' => Tag::Spikes,
            'a' => Tag::Arena,
            '/' => Tag::Ramp,
            'p' => Tag::Pit,
            '<' => Tag::StairUp,
            '>' => Tag::StairDown,
            _ => return None,
        })
    }

    pub const fn is_empty(self) -> bool {
        matches!(self, Tag::Empty)
    }

    pub const fn is_stair(self) -> bool {
        matches!(self, Tag::StairUp | Tag::StairDown)
    }
}

/// A 3x3 neighborhood in row-major order; index 4 is the center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Tile(pub [Tag; 9]);

impl Tile {
    pub const CENTER: usize = 4;

    pub const fn center(&self) -> Tag {
        self.0[Self::CENTER]
    }

    /// Copy with one slot replaced.
    pub const fn with(mut self, index: usize, tag: Tag) -> Tile {
        self.0[index] = tag;
        self
    }

    pub const fn with_center(self, tag: Tag) -> Tile {
        self.with(Self::CENTER, tag)
    }

    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|t| t.is_empty())
    }

    /// Edge tags in direction order (up, left, down, right).
    pub const fn edges(&self) -> [Tag; 4] {
        [self.0[1], self.0[3], self.0[7], self.0[5]]
    }

    /// Number of non-empty edges.
    pub fn degree(&self) -> usize {
        self.edges().iter().filter(|t| !t.is_empty()).count()
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for t in self.0 {
            write!(f, "{}", t.as_char())?;
        }
        Ok(())
    }
}

impl FromStr for Tile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [Tag::Empty; 9];
        let mut n = 0;
        for c in s.chars() {
            if n >= 9 {
                return Err(format!("tile too long: {s:?}"));
            }
            out[n] = Tag::from_char(c).ok_or_else(|| format!("bad tag {c:?} in {s:?}"))?;
            n += 1;
        }
        if n != 9 {
            return Err(format!("tile too short: {s:?}"));
        }
        Ok(Tile(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_char_roundtrip() {
        for tag in Tag::iter() {
            assert_eq!(Tag::from_char(tag.as_char()), Some(tag));
        }
        assert_eq!(Tag::from_char('x'), None);
    }

    #[test]
    fn test_tile_parse_and_show() {
        let tile: Tile = " c  cc   ".parse().unwrap();
        assert_eq!(tile.center(), Tag::Cave);
        assert_eq!(tile.edges(), [Tag::Cave, Tag::Empty, Tag::Empty, Tag::Cave]);
        assert_eq!(tile.degree(), 2);
        assert_eq!(tile.to_string(), " c  cc   ");
        assert_eq!(tile.with_center(Tag::Arena).to_string(), " c  ac   ");
    }

    #[test]
    fn test_tile_parse_errors() {
        assert!("ccc".parse::<Tile>().is_err());
        assert!(" c  cc    ".parse::<Tile>().is_err());
        assert!(" c  xc   ".parse::<Tile>().is_err());
    }

    #[test]
    fn test_blank() {
        assert!(Tile::default().is_blank());
        assert!(!Tile::default().with(1, Tag::Cave).is_blank());
    }
}
