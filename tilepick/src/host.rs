//! The parts of a map host that tilepick plays itself: tile URLs and the viewed tile.

use std::fmt::{Display, Formatter};

use tilepick_core::TileRequest;
use tilepick_core::config::LayerOptions;
use tilepick_tile_utils::TilePosition;

use crate::{TilepickError, TilepickResult};

/// A tile URL with `{z}`, `{x}` and `{y}` placeholders, e.g. `https://example.com/{z}/{x}/{y}.pbf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> TilepickResult<Self> {
        let template = template.into();
        if ["{z}", "{x}", "{y}"]
            .iter()
            .all(|placeholder| template.contains(placeholder))
        {
            Ok(Self(template))
        } else {
            Err(TilepickError::InvalidUrlTemplate(template))
        }
    }

    #[must_use]
    pub fn render(&self, position: TilePosition) -> String {
        self.0
            .replace("{z}", &position.z.to_string())
            .replace("{x}", &position.x.to_string())
            .replace("{y}", &position.y.to_string())
    }
}

impl Display for UrlTemplate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds the draw request for `source_tile` viewed at `map_zoom`.
///
/// `source_tile` is a tile of the source grid, so `map_zoom` must resolve to its zoom:
/// equal to it, or deeper when the layer overzooms.
pub fn tile_request(
    template: &UrlTemplate,
    options: &LayerOptions,
    source_tile: TilePosition,
    map_zoom: Option<u8>,
) -> TilepickResult<TileRequest> {
    let zoom = map_zoom.unwrap_or(source_tile.z);
    let source_zoom = options.source_zoom(zoom);
    if source_zoom != source_tile.z {
        return Err(TilepickError::ZoomMismatch {
            tile: format!("{source_tile:#}"),
            zoom,
            source_zoom,
        });
    }
    Ok(TileRequest {
        position: source_tile.with_zoom(zoom),
        url: template.render(source_tile),
    })
}
