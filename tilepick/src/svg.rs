//! A [`Canvas`] that renders one tile as an SVG document.

use std::fmt::Write as _;

use tilepick_core::render::{Canvas, PathStyle};
use tilepick_tile_utils::{Point, Ring};

#[derive(Debug, Clone, PartialEq)]
pub struct SvgCanvas {
    size: f64,
    elements: Vec<String>,
}

impl SvgCanvas {
    /// A blank square canvas of `size` pixels.
    #[must_use]
    pub fn new(size: f64) -> Self {
        Self {
            size,
            elements: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.elements.is_empty()
    }

    /// The complete SVG document.
    #[must_use]
    pub fn to_svg(&self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{0}" height="{0}" viewBox="0 0 {0} {0}">"#,
            self.size
        );
        svg.push('\n');
        for element in &self.elements {
            svg.push_str("  ");
            svg.push_str(element);
            svg.push('\n');
        }
        svg.push_str("</svg>\n");
        svg
    }
}

fn path_data(rings: &[Ring], close: bool) -> String {
    let mut data = String::new();
    for ring in rings {
        for (i, p) in ring.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(data, "{cmd}{} {} ", p.x, p.y);
        }
        if close && !ring.is_empty() {
            data.push_str("Z ");
        }
    }
    data.trim_end().to_string()
}

fn paint(style: &PathStyle, filled: bool) -> String {
    let mut attrs = String::new();
    if style.stroke {
        let _ = write!(
            attrs,
            r#"stroke="{}" stroke-width="{}" stroke-opacity="{}" stroke-linecap="round" stroke-linejoin="round""#,
            escape(&style.color),
            style.weight,
            style.opacity
        );
    } else {
        attrs.push_str(r#"stroke="none""#);
    }
    if filled && style.fill {
        let _ = write!(
            attrs,
            r#" fill="{}" fill-opacity="{}""#,
            escape(style.fill_color()),
            style.fill_opacity
        );
    } else {
        attrs.push_str(r#" fill="none""#);
    }
    attrs
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

impl Canvas for SvgCanvas {
    fn clear(&mut self) {
        self.elements.clear();
    }

    fn draw_circle_marker(&mut self, point: Point, style: &PathStyle) {
        self.elements.push(format!(
            r#"<circle cx="{}" cy="{}" r="{}" {}/>"#,
            point.x,
            point.y,
            style.radius,
            paint(style, true)
        ));
    }

    fn draw_polyline(&mut self, rings: &[Ring], style: &PathStyle) {
        if rings.iter().all(Vec::is_empty) {
            return;
        }
        self.elements.push(format!(
            r#"<path d="{}" {}/>"#,
            path_data(rings, false),
            paint(style, false)
        ));
    }

    fn draw_polygon(&mut self, rings: &[Ring], style: &PathStyle) {
        if rings.iter().all(Vec::is_empty) {
            return;
        }
        self.elements.push(format!(
            r#"<path d="{}" fill-rule="evenodd" {}/>"#,
            path_data(rings, true),
            paint(style, true)
        ));
    }
}
