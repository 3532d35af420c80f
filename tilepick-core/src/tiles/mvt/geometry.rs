//! Geometry command stream of the vector tile format.
//!
//! Decoding follows the reference `loadGeometry()` behavior: every `MoveTo`
//! parameter starts a new ring, `LineTo` extends it and `ClosePath` repeats
//! the first vertex. Points therefore come out as one single-vertex ring each.

use tilepick_tile_utils::{Point, Ring};

use crate::tiles::GeomKind;

const MOVE_TO: u32 = 1;
const LINE_TO: u32 = 2;
const CLOSE_PATH: u32 = 7;

fn command(id: u32, count: u32) -> u32 {
    (id & 0x7) | (count << 3)
}

fn zigzag(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

fn unzigzag(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Decodes a command stream into rings of tile extent coordinates.
pub fn decode_geometry(commands: &[u32]) -> Result<Vec<Ring>, String> {
    let mut rings: Vec<Ring> = Vec::new();
    let (mut x, mut y) = (0_i64, 0_i64);
    let mut iter = commands.iter().copied();

    while let Some(cmd) = iter.next() {
        let id = cmd & 0x7;
        let count = cmd >> 3;
        match id {
            MOVE_TO | LINE_TO => {
                for _ in 0..count {
                    let (Some(dx), Some(dy)) = (iter.next(), iter.next()) else {
                        return Err(format!("truncated parameters for command {id}"));
                    };
                    x += i64::from(unzigzag(dx));
                    y += i64::from(unzigzag(dy));
                    let point = Point::new(x as f64, y as f64);
                    if id == MOVE_TO {
                        rings.push(vec![point]);
                    } else if let Some(ring) = rings.last_mut() {
                        ring.push(point);
                    } else {
                        return Err("LineTo before the first MoveTo".to_string());
                    }
                }
            }
            CLOSE_PATH => {
                let Some(ring) = rings.last_mut() else {
                    return Err("ClosePath before the first MoveTo".to_string());
                };
                if let Some(first) = ring.first().copied() {
                    ring.push(first);
                }
            }
            other => return Err(format!("unknown command {other}")),
        }
    }

    Ok(rings)
}

/// Encodes rings into a command stream, rounding coordinates to integers.
///
/// Polygon rings are expected closed (first vertex repeated at the end);
/// the closing vertex is replaced by a `ClosePath` command.
#[must_use]
pub fn encode_geometry(kind: GeomKind, rings: &[Ring]) -> Vec<u32> {
    let mut encoder = Encoder::default();
    match kind {
        GeomKind::Point => {
            let points: Vec<Point> = rings.iter().flatten().copied().collect();
            if !points.is_empty() {
                encoder.push(command(MOVE_TO, points.len() as u32), &points);
            }
        }
        GeomKind::LineString => {
            for ring in rings.iter().filter(|r| !r.is_empty()) {
                encoder.push(command(MOVE_TO, 1), &ring[..1]);
                if ring.len() > 1 {
                    encoder.push(command(LINE_TO, ring.len() as u32 - 1), &ring[1..]);
                }
            }
        }
        GeomKind::Polygon => {
            for ring in rings.iter().filter(|r| !r.is_empty()) {
                let open = if ring.len() > 1 && ring.first() == ring.last() {
                    &ring[..ring.len() - 1]
                } else {
                    &ring[..]
                };
                encoder.push(command(MOVE_TO, 1), &open[..1]);
                if open.len() > 1 {
                    encoder.push(command(LINE_TO, open.len() as u32 - 1), &open[1..]);
                }
                encoder.data.push(command(CLOSE_PATH, 1));
            }
        }
    }
    encoder.data
}

#[derive(Default)]
struct Encoder {
    data: Vec<u32>,
    cx: i32,
    cy: i32,
}

impl Encoder {
    fn push(&mut self, cmd: u32, points: &[Point]) {
        self.data.push(cmd);
        for p in points {
            let (x, y) = (p.x.round() as i32, p.y.round() as i32);
            self.data.push(zigzag(x - self.cx));
            self.data.push(zigzag(y - self.cy));
            self.cx = x;
            self.cy = y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[(i32, i32)]) -> Ring {
        points
            .iter()
            .map(|(x, y)| Point::new(f64::from(*x), f64::from(*y)))
            .collect()
    }

    #[test]
    fn test_zigzag() {
        for v in [0, 1, -1, 2, -2, 4095, -4096, i32::MAX, i32::MIN] {
            assert_eq!(unzigzag(zigzag(v)), v);
        }
        assert_eq!(zigzag(-1), 1);
        assert_eq!(zigzag(1), 2);
    }

    #[test]
    fn test_point_encoding() {
        let rings = vec![ring(&[(25, 17)])];
        assert_eq!(encode_geometry(GeomKind::Point, &rings), vec![9, 50, 34]);
        assert_eq!(decode_geometry(&[9, 50, 34]).unwrap(), rings);
    }

    #[test]
    fn test_multipoint_decodes_as_separate_rings() {
        let decoded = decode_geometry(&[17, 10, 14, 3, 9]).unwrap();
        assert_eq!(decoded, vec![ring(&[(5, 7)]), ring(&[(3, 2)])]);
    }

    #[test]
    fn test_linestring_encoding() {
        let rings = vec![ring(&[(2, 2), (2, 10), (10, 10)])];
        let encoded = vec![9, 4, 4, 18, 0, 16, 16, 0];
        assert_eq!(encode_geometry(GeomKind::LineString, &rings), encoded);
        assert_eq!(decode_geometry(&encoded).unwrap(), rings);
    }

    #[test]
    fn test_multilinestring_decoding() {
        let decoded =
            decode_geometry(&[9, 4, 4, 18, 0, 16, 16, 0, 9, 17, 17, 10, 4, 8]).unwrap();
        assert_eq!(
            decoded,
            vec![ring(&[(2, 2), (2, 10), (10, 10)]), ring(&[(1, 1), (3, 5)])]
        );
    }

    #[test]
    fn test_polygon_is_closed_on_decode() {
        let rings = vec![ring(&[(3, 6), (8, 12), (20, 34), (3, 6)])];
        let encoded = vec![9, 6, 12, 18, 10, 12, 24, 44, 15];
        assert_eq!(encode_geometry(GeomKind::Polygon, &rings), encoded);
        assert_eq!(decode_geometry(&encoded).unwrap(), rings);
    }

    #[test]
    fn test_malformed_streams() {
        assert!(decode_geometry(&[9, 50]).is_err());
        assert!(decode_geometry(&[18, 0, 16, 16, 0]).is_err());
        assert!(decode_geometry(&[15]).is_err());
        assert!(decode_geometry(&[4]).is_err());
        assert_eq!(decode_geometry(&[]).unwrap(), Vec::<Ring>::new());
    }
}
