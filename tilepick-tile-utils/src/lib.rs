//! Tile positions, cache keys, pixel geometry and payload helpers shared by the
//! `tilepick` crates.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

mod decoders;
pub use decoders::{Compression, decode_gzip, decode_zlib, decompress, encode_gzip};

pub mod geometry;
pub use geometry::{BBox, Point, Ring, project};

/// Highest zoom level a [`TilePosition`] may carry.
pub const MAX_ZOOM: u8 = 30;

/// Errors produced while parsing a [`TilePosition`].
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TilePositionError {
    #[error("Tile position '{0}' must have exactly three components")]
    InvalidFormat(String),

    #[error("Tile position component '{0}' is not a valid non-negative integer")]
    InvalidNumber(String),

    #[error("Zoom level {0} is greater than the maximum zoom {MAX_ZOOM}")]
    InvalidZoom(u8),

    #[error("Tile {x},{y} does not exist at zoom {z}")]
    OutOfRange { x: u32, y: u32, z: u8 },
}

/// Integer `(x, y, zoom)` triple identifying one grid cell of the map.
///
/// The [`Display`] form `x:y:z` doubles as the cache key of the tile,
/// so every zoom variant of the same cell shares the `x:y:` prefix.
/// The alternate form (`{:#}`) prints the slippy-map path `z/x/y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePosition {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TilePosition {
    #[must_use]
    pub const fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Same grid cell, keyed at a different zoom.
    #[must_use]
    pub const fn with_zoom(self, z: u8) -> Self {
        Self { x: self.x, y: self.y, z }
    }

    /// Key prefix shared by every zoom variant of this cell, e.g. `"3:4:"`.
    #[must_use]
    pub fn key_prefix(&self) -> String {
        format!("{}:{}:", self.x, self.y)
    }

    /// Parses a slippy-map `z/x/y` path.
    pub fn parse_zxy(value: &str) -> Result<Self, TilePositionError> {
        let [z, x, y] = split3(value, '/')?;
        Self::checked(parse_num(x)?, parse_num(y)?, parse_num(z)?)
    }

    fn checked(x: u32, y: u32, z: u32) -> Result<Self, TilePositionError> {
        let z = u8::try_from(z)
            .ok()
            .filter(|z| *z <= MAX_ZOOM)
            .ok_or(TilePositionError::InvalidZoom(z.min(255) as u8))?;
        let size = 1_u64 << z;
        if u64::from(x) >= size || u64::from(y) >= size {
            return Err(TilePositionError::OutOfRange { x, y, z });
        }
        Ok(Self { x, y, z })
    }
}

impl Display for TilePosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            write!(f, "{}/{}/{}", self.z, self.x, self.y)
        } else {
            write!(f, "{}:{}:{}", self.x, self.y, self.z)
        }
    }
}

impl FromStr for TilePosition {
    type Err = TilePositionError;

    /// Parses the `x:y:z` cache key form.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let [x, y, z] = split3(value, ':')?;
        Self::checked(parse_num(x)?, parse_num(y)?, parse_num(z)?)
    }
}

fn split3(value: &str, separator: char) -> Result<[&str; 3], TilePositionError> {
    let mut parts = value.trim().split(separator);
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), Some(c), None) => Ok([a, b, c]),
        _ => Err(TilePositionError::InvalidFormat(value.to_string())),
    }
}

fn parse_num(value: &str) -> Result<u32, TilePositionError> {
    value
        .trim()
        .parse()
        .map_err(|_| TilePositionError::InvalidNumber(value.to_string()))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_key_format() {
        let pos = TilePosition::new(1, 2, 5);
        assert_eq!(pos.to_string(), "1:2:5");
        assert_eq!(format!("{pos:#}"), "5/1/2");
        assert_eq!(pos.key_prefix(), "1:2:");
        assert!(pos.to_string().starts_with(&pos.key_prefix()));
    }

    #[test]
    fn test_prefix_does_not_match_longer_coordinates() {
        let pos = TilePosition::new(1, 2, 5);
        let other = TilePosition::new(1, 23, 5);
        assert!(!other.to_string().starts_with(&pos.key_prefix()));
    }

    #[rstest]
    #[case("1:2:5", TilePosition::new(1, 2, 5))]
    #[case(" 0:0:0 ", TilePosition::new(0, 0, 0))]
    #[case("1023:511:10", TilePosition::new(1023, 511, 10))]
    fn test_parse_key(#[case] input: &str, #[case] expected: TilePosition) {
        assert_eq!(input.parse::<TilePosition>(), Ok(expected));
    }

    #[rstest]
    #[case("1:2", TilePositionError::InvalidFormat("1:2".to_string()))]
    #[case("1:2:3:4", TilePositionError::InvalidFormat("1:2:3:4".to_string()))]
    #[case("a:2:3", TilePositionError::InvalidNumber("a".to_string()))]
    #[case("0:0:31", TilePositionError::InvalidZoom(31))]
    #[case("4:0:2", TilePositionError::OutOfRange { x: 4, y: 0, z: 2 })]
    fn test_parse_key_errors(#[case] input: &str, #[case] expected: TilePositionError) {
        assert_eq!(input.parse::<TilePosition>(), Err(expected));
    }

    #[test]
    fn test_parse_zxy() {
        assert_eq!(
            TilePosition::parse_zxy("14/8190/5447"),
            Ok(TilePosition::new(8190, 5447, 14))
        );
        assert!(TilePosition::parse_zxy("14/8190").is_err());
    }

    #[test]
    fn test_with_zoom_keeps_prefix() {
        let pos = TilePosition::new(3, 4, 5);
        assert_eq!(pos.with_zoom(7), TilePosition::new(3, 4, 7));
        assert_eq!(pos.with_zoom(7).key_prefix(), pos.key_prefix());
    }
}
