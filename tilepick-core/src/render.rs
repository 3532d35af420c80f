//! Painting projected features through a drawing backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use tilepick_tile_utils::{Point, Ring};

use crate::tiles::{Feature, GeomKind, ProjectedTile};

/// Paint parameters for one feature.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathStyle {
    /// Whether outlines are stroked.
    pub stroke: bool,
    /// Stroke color, any CSS color.
    pub color: String,
    /// Stroke width in pixels.
    pub weight: f64,
    /// Stroke opacity.
    pub opacity: f64,
    /// Whether polygons and markers are filled. Polylines are never filled.
    pub fill: bool,
    /// Fill color, defaults to `color`.
    pub fill_color: Option<String>,
    /// Fill opacity.
    pub fill_opacity: f64,
    /// Circle marker radius in pixels.
    pub radius: f64,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            stroke: true,
            color: "#3388ff".to_string(),
            weight: 3.0,
            opacity: 1.0,
            fill: true,
            fill_color: None,
            fill_opacity: 0.2,
            radius: 5.0,
        }
    }
}

impl PathStyle {
    /// The color used for fills.
    #[must_use]
    pub fn fill_color(&self) -> &str {
        self.fill_color.as_deref().unwrap_or(&self.color)
    }
}

/// Resolves the style of a feature given the name of the layer it belongs to.
pub type StyleFn = Arc<dyn Fn(&str, &Feature) -> PathStyle + Send + Sync>;

/// A style function returning `default`, or the override of the feature's layer when one exists.
#[must_use]
pub fn layer_styles(default: PathStyle, overrides: BTreeMap<String, PathStyle>) -> StyleFn {
    Arc::new(move |layer, _| overrides.get(layer).unwrap_or(&default).clone())
}

/// Drawing primitives working in already projected pixel coordinates.
pub trait Canvas {
    /// Erases everything drawn so far.
    fn clear(&mut self);
    /// Paints a circle marker centered on `point`.
    fn draw_circle_marker(&mut self, point: Point, style: &PathStyle);
    /// Strokes each ring as an open polyline.
    fn draw_polyline(&mut self, rings: &[Ring], style: &PathStyle);
    /// Fills and strokes rings as one polygon with even-odd holes.
    fn draw_polygon(&mut self, rings: &[Ring], style: &PathStyle);
}

/// Paints every feature of `tile`, layer by layer in feature order.
///
/// The canvas is not cleared first.
pub fn draw(canvas: &mut dyn Canvas, tile: &ProjectedTile, style_fn: &StyleFn) {
    for layer in &tile.layers {
        for projected in &layer.features {
            let style = style_fn(&layer.name, &projected.feature);
            match projected.feature.kind {
                GeomKind::Point => {
                    for point in projected.geometry.iter().flatten() {
                        canvas.draw_circle_marker(*point, &style);
                    }
                }
                GeomKind::LineString => canvas.draw_polyline(&projected.geometry, &style),
                GeomKind::Polygon => canvas.draw_polygon(&projected.geometry, &style),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use insta::assert_snapshot;

    use super::*;
    use crate::tiles::{TileLayer, VectorTile};

    /// Records every primitive call as one line of text.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingCanvas {
        pub(crate) calls: Vec<String>,
    }

    fn fmt_rings(rings: &[Ring]) -> String {
        rings
            .iter()
            .map(|r| {
                r.iter()
                    .map(|p| format!("{},{}", p.x, p.y))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }

    impl Canvas for RecordingCanvas {
        fn clear(&mut self) {
            self.calls.push("clear".to_string());
        }

        fn draw_circle_marker(&mut self, point: Point, style: &PathStyle) {
            self.calls
                .push(format!("circle {},{} r={} {}", point.x, point.y, style.radius, style.color));
        }

        fn draw_polyline(&mut self, rings: &[Ring], style: &PathStyle) {
            self.calls
                .push(format!("polyline {} {}", fmt_rings(rings), style.color));
        }

        fn draw_polygon(&mut self, rings: &[Ring], style: &PathStyle) {
            self.calls
                .push(format!("polygon {} {}", fmt_rings(rings), style.color));
        }
    }

    fn tile() -> ProjectedTile {
        let raw = VectorTile {
            layers: vec![
                TileLayer::new("water", 4096).with_feature(Feature::new(
                    GeomKind::Polygon,
                    vec![vec![
                        Point::new(0.0, 0.0),
                        Point::new(1024.0, 0.0),
                        Point::new(0.0, 1024.0),
                        Point::new(0.0, 0.0),
                    ]],
                )),
                TileLayer::new("roads", 4096)
                    .with_feature(Feature::new(
                        GeomKind::LineString,
                        vec![vec![Point::new(0.0, 2048.0), Point::new(4096.0, 2048.0)]],
                    ))
                    .with_feature(Feature::new(
                        GeomKind::Point,
                        vec![vec![Point::new(16.0, 32.0)], vec![Point::new(64.0, 128.0)]],
                    )),
            ],
        };
        ProjectedTile::build(&raw, 256.0, None)
    }

    #[test]
    fn test_draw_dispatches_by_kind() {
        let mut canvas = RecordingCanvas::default();
        let roads = PathStyle {
            color: "red".to_string(),
            ..PathStyle::default()
        };
        let style = layer_styles(PathStyle::default(), [("roads".to_string(), roads)].into());
        draw(&mut canvas, &tile(), &style);
        assert_snapshot!(canvas.calls.join("\n"), @r"
        polygon 0,0 64,0 0,64 0,0 #3388ff
        polyline 0,128 256,128 red
        circle 1,2 r=5 red
        circle 4,8 r=5 red
        ");
    }

    #[test]
    fn test_draw_empty_tile() {
        let mut canvas = RecordingCanvas::default();
        let style = layer_styles(PathStyle::default(), BTreeMap::new());
        draw(&mut canvas, &ProjectedTile::default(), &style);
        assert!(canvas.calls.is_empty());
    }

    #[test]
    fn test_style_defaults_from_partial_yaml() {
        let style: PathStyle = serde_yaml::from_str("color: '#ff0000'\nweight: 1.5").unwrap();
        assert_eq!(style.color, "#ff0000");
        assert_eq!(style.fill_color(), "#ff0000");
        assert!((style.weight - 1.5).abs() < f64::EPSILON);
        assert!((style.fill_opacity - 0.2).abs() < f64::EPSILON);
        assert!(style.stroke);
    }
}
