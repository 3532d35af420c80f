//! Geometric hit testing against projected tile features.
//!
//! All coordinates are canvas pixels of a single tile. A feature whose bounding
//! box, grown by the relevant radius, does not contain the point is rejected
//! before any per-vertex work.

use std::sync::Arc;

use tilepick_tile_utils::{Point, Ring};

use crate::tiles::{Feature, GeomKind, ProjectedFeature, ProjectedTile};

/// Distance in pixels within which a point feature counts as clicked.
pub const POINT_RADIUS: f64 = 10.0;

/// Default distance in pixels within which a line counts as clicked.
pub const DEFAULT_TOLERANCE: f64 = 10.0;

/// Whether any vertex of `points` lies within `radius` of `p`.
#[must_use]
pub fn point_near_points(points: &[Ring], p: Point, radius: f64) -> bool {
    let radius_sq = radius * radius;
    points.iter().flatten().any(|v| v.distance_sq(p) <= radius_sq)
}

/// Euclidean distance from `p` to the segment `a`-`b`.
#[must_use]
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let closest = if len_sq <= 0.0 {
        a
    } else {
        let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
        Point::new(a.x + t * dx, a.y + t * dy)
    };
    closest.distance_sq(p).sqrt()
}

/// Whether `p` lies within `tolerance` of a segment of any ring.
///
/// Rings are open: the last vertex is not joined back to the first.
#[must_use]
pub fn point_near_polyline(rings: &[Ring], p: Point, tolerance: f64) -> bool {
    rings.iter().any(|ring| match ring.as_slice() {
        [single] => single.distance_sq(p) <= tolerance * tolerance,
        vertices => vertices
            .windows(2)
            .any(|w| distance_to_segment(p, w[0], w[1]) <= tolerance),
    })
}

/// Even-odd containment of `p` in the polygon formed by all `rings`.
///
/// Interior rings subtract from the exterior regardless of winding.
#[must_use]
pub fn point_in_polygon(rings: &[Ring], p: Point) -> bool {
    let mut inside = false;
    for ring in rings {
        let Some(mut prev) = ring.last().copied() else {
            continue;
        };
        for &cur in ring {
            if (cur.y > p.y) != (prev.y > p.y)
                && p.x < (prev.x - cur.x) * (p.y - cur.y) / (prev.y - cur.y) + cur.x
            {
                inside = !inside;
            }
            prev = cur;
        }
    }
    inside
}

/// Whether `p` hits one projected feature.
#[must_use]
pub fn feature_contains(projected: &ProjectedFeature, p: Point, tolerance: f64) -> bool {
    let Some(bbox) = projected.bbox else {
        return false;
    };
    let geometry = &projected.geometry;
    match projected.feature.kind {
        GeomKind::Point => {
            bbox.expand(POINT_RADIUS).contains(p) && point_near_points(geometry, p, POINT_RADIUS)
        }
        GeomKind::LineString => {
            bbox.expand(tolerance).contains(p) && point_near_polyline(geometry, p, tolerance)
        }
        GeomKind::Polygon => bbox.contains(p) && point_in_polygon(geometry, p),
    }
}

/// Finds the topmost feature under `p`.
///
/// Layers are visited in `layer_order` when given (layers missing from the tile
/// are skipped, unlisted layers are never hit), otherwise in tile order.
/// Within a layer features are visited in encoding order. The first match wins.
#[must_use]
pub fn hit_test<'a>(
    tile: &'a ProjectedTile,
    layer_order: Option<&[String]>,
    p: Point,
    tolerance: f64,
) -> Option<&'a Arc<Feature>> {
    let first_in = |features: &'a [ProjectedFeature]| {
        features
            .iter()
            .find(|f| feature_contains(f, p, tolerance))
            .map(|f| &f.feature)
    };
    match layer_order {
        Some(order) => order
            .iter()
            .filter_map(|name| tile.layer(name))
            .find_map(|layer| first_in(&layer.features)),
        None => tile.layers.iter().find_map(|layer| first_in(&layer.features)),
    }
}
