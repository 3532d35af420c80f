//! Options of a vector tile layer.

use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tilepick_tile_utils::MAX_ZOOM;

use crate::hit::DEFAULT_TOLERANCE;
use crate::render::{PathStyle, StyleFn, layer_styles};
use crate::visibility::{IdFn, id_from_property};

/// Default pixel size of a rendered tile.
pub const DEFAULT_TILE_SIZE: u32 = 256;
/// Default single-click window.
pub const DEFAULT_CLICK_DELAY: Duration = Duration::from_millis(500);
/// Default delay before the visible features are reported.
pub const DEFAULT_VISIBILITY_DELAY: Duration = Duration::from_secs(3);

/// Errors found while resolving a [`LayerConfig`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LayerConfigError {
    /// The tile size is zero.
    #[error("tile_size must be positive, got {0}")]
    InvalidTileSize(u32),

    /// The click tolerance is negative or not a number.
    #[error("click_tolerance must be a non-negative number, got {0}")]
    InvalidTolerance(f64),

    /// The native zoom is beyond the supported range.
    #[error("max_native_zoom must be at most {MAX_ZOOM}, got {0}")]
    InvalidNativeZoom(u8),
}

/// Layer configuration as written in a configuration file. Every field is optional.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Pixel size of a rendered tile [default: 256]
    pub tile_size: Option<u32>,

    /// Highest zoom the tile source provides. Deeper zooms reuse these tiles, scaled up.
    pub max_native_zoom: Option<u8>,

    /// Layers to render and hit test, in hit-test priority order [default: all, tile order]
    pub layers: Option<Vec<String>>,

    /// Pixel distance within which a line counts as clicked [default: 10]
    pub click_tolerance: Option<f64>,

    /// Property holding the feature identifier [default: `id`]
    pub id_property: Option<String>,

    /// Property holding the display name [default: `name`]
    pub name_property: Option<String>,

    /// Time a click waits for a second one before it is handled [default: 500ms]
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "humantime_serde"
    )]
    pub click_delay: Option<Duration>,

    /// Time after a move ends before the visible features are reported [default: 3s]
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "humantime_serde"
    )]
    pub visibility_delay: Option<Duration>,

    /// Maximum number of fetched source tiles kept in the raw tile cache [default: unbounded]
    pub max_cached_tiles: Option<u64>,

    /// Style applied to every feature
    pub style: Option<PathStyle>,

    /// Per-layer style overrides
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub layer_styles: BTreeMap<String, PathStyle>,
}

/// Resolved layer options, with defaults applied.
#[derive(Clone)]
pub struct LayerOptions {
    /// Pixel size of a rendered tile.
    pub tile_size: u32,
    /// Highest zoom the tile source provides.
    pub max_native_zoom: Option<u8>,
    /// Layer filter and hit-test order.
    pub layers: Option<Vec<String>>,
    /// Pixel distance within which a line counts as clicked.
    pub click_tolerance: f64,
    /// Property holding the display name.
    pub name_property: String,
    /// Single-click window.
    pub click_delay: Duration,
    /// Delay before the visible features are reported.
    pub visibility_delay: Duration,
    /// Capacity of the raw tile cache. Projected tiles are released by viewport resets and tile evictions.
    pub max_cached_tiles: Option<u64>,
    /// Feature style.
    pub style_fn: StyleFn,
    /// Feature identifier.
    pub id_fn: IdFn,
}

impl Debug for LayerOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerOptions")
            .field("tile_size", &self.tile_size)
            .field("max_native_zoom", &self.max_native_zoom)
            .field("layers", &self.layers)
            .field("click_tolerance", &self.click_tolerance)
            .field("name_property", &self.name_property)
            .field("click_delay", &self.click_delay)
            .field("visibility_delay", &self.visibility_delay)
            .field("max_cached_tiles", &self.max_cached_tiles)
            .finish_non_exhaustive()
    }
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            max_native_zoom: None,
            layers: None,
            click_tolerance: DEFAULT_TOLERANCE,
            name_property: "name".to_string(),
            click_delay: DEFAULT_CLICK_DELAY,
            visibility_delay: DEFAULT_VISIBILITY_DELAY,
            max_cached_tiles: None,
            style_fn: layer_styles(PathStyle::default(), BTreeMap::new()),
            id_fn: id_from_property("id"),
        }
    }
}

impl LayerOptions {
    /// Applies defaults to `config` and validates it.
    pub fn from_config(config: LayerConfig) -> Result<Self, LayerConfigError> {
        let tile_size = config.tile_size.unwrap_or(DEFAULT_TILE_SIZE);
        if tile_size == 0 {
            return Err(LayerConfigError::InvalidTileSize(tile_size));
        }
        let click_tolerance = config.click_tolerance.unwrap_or(DEFAULT_TOLERANCE);
        if click_tolerance.is_nan() || click_tolerance < 0.0 {
            return Err(LayerConfigError::InvalidTolerance(click_tolerance));
        }
        if let Some(zoom) = config.max_native_zoom.filter(|z| *z > MAX_ZOOM) {
            return Err(LayerConfigError::InvalidNativeZoom(zoom));
        }

        Ok(Self {
            tile_size,
            max_native_zoom: config.max_native_zoom,
            layers: config.layers,
            click_tolerance,
            name_property: config.name_property.unwrap_or_else(|| "name".to_string()),
            click_delay: config.click_delay.unwrap_or(DEFAULT_CLICK_DELAY),
            visibility_delay: config.visibility_delay.unwrap_or(DEFAULT_VISIBILITY_DELAY),
            max_cached_tiles: config.max_cached_tiles,
            style_fn: layer_styles(config.style.unwrap_or_default(), config.layer_styles),
            id_fn: id_from_property(config.id_property.unwrap_or_else(|| "id".to_string())),
        })
    }

    /// Replaces the style function.
    #[must_use]
    pub fn with_style_fn(mut self, style_fn: StyleFn) -> Self {
        self.style_fn = style_fn;
        self
    }

    /// Replaces the identifier function.
    #[must_use]
    pub fn with_id_fn(mut self, id_fn: IdFn) -> Self {
        self.id_fn = id_fn;
        self
    }

    /// Zoom of the tiles fetched for `map_zoom`.
    #[must_use]
    pub fn source_zoom(&self, map_zoom: u8) -> u8 {
        self.max_native_zoom.map_or(map_zoom, |max| map_zoom.min(max))
    }

    /// Pixel size of one source tile when rendered at `map_zoom`.
    #[must_use]
    pub fn rendered_tile_size(&self, map_zoom: u8) -> f64 {
        let overzoom = map_zoom - self.source_zoom(map_zoom);
        f64::from(self.tile_size) * 2_f64.powi(i32::from(overzoom))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use insta::assert_json_snapshot;
    use rstest::rstest;

    use super::*;
    use crate::tiles::{Feature, FeatureId, GeomKind};

    #[test]
    fn test_parse_full_config() {
        let config: LayerConfig = serde_yaml::from_str(
            "
tile_size: 512
max_native_zoom: 14
layers: [buildings, water]
click_tolerance: 4.5
id_property: osm_id
click_delay: 250ms
visibility_delay: 1s
max_cached_tiles: 200
style:
  color: '#222222'
layer_styles:
  water:
    color: blue
    fill_opacity: 0.5
",
        )
        .unwrap();
        let options = LayerOptions::from_config(config).unwrap();
        assert_eq!(options.tile_size, 512);
        assert_eq!(options.click_delay, Duration::from_millis(250));
        assert_eq!(options.visibility_delay, Duration::from_secs(1));
        assert_eq!(options.name_property, "name");
        assert_eq!(
            options.layers.as_deref(),
            Some(&["buildings".to_string(), "water".to_string()][..])
        );

        let feature = Feature::new(GeomKind::Point, vec![]).with_property("osm_id", 9);
        assert_eq!((options.id_fn)(&feature), Some(FeatureId::Int(9)));
        assert_eq!((options.style_fn)("water", &feature).color, "blue");
        assert_eq!((options.style_fn)("roads", &feature).color, "#222222");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let options = LayerOptions::from_config(LayerConfig::default()).unwrap();
        assert_eq!(options.tile_size, 256);
        assert_relative_eq!(options.click_tolerance, 10.0);
        assert_eq!(options.click_delay, Duration::from_millis(500));
        assert_eq!(options.visibility_delay, Duration::from_secs(3));
        assert!(options.layers.is_none());
    }

    #[test]
    fn test_serialize_skips_unset() {
        let config = LayerConfig {
            tile_size: Some(512),
            click_delay: Some(Duration::from_millis(250)),
            ..LayerConfig::default()
        };
        assert_json_snapshot!(config, @r#"
        {
          "tile_size": 512,
          "click_delay": "250ms"
        }
        "#);
    }

    #[rstest]
    #[case(LayerConfig { tile_size: Some(0), ..LayerConfig::default() }, LayerConfigError::InvalidTileSize(0))]
    #[case(LayerConfig { click_tolerance: Some(-1.0), ..LayerConfig::default() }, LayerConfigError::InvalidTolerance(-1.0))]
    #[case(LayerConfig { max_native_zoom: Some(31), ..LayerConfig::default() }, LayerConfigError::InvalidNativeZoom(31))]
    fn test_invalid_config(#[case] config: LayerConfig, #[case] expected: LayerConfigError) {
        assert_eq!(LayerOptions::from_config(config).unwrap_err(), expected);
    }

    #[rstest]
    #[case(None, 12, 12, 256.0)]
    #[case(Some(14), 12, 12, 256.0)]
    #[case(Some(14), 14, 14, 256.0)]
    #[case(Some(14), 16, 14, 1024.0)]
    fn test_overzoom(
        #[case] max_native_zoom: Option<u8>,
        #[case] map_zoom: u8,
        #[case] source_zoom: u8,
        #[case] size: f64,
    ) {
        let options = LayerOptions {
            max_native_zoom,
            ..LayerOptions::default()
        };
        assert_eq!(options.source_zoom(map_zoom), source_zoom);
        assert_relative_eq!(options.rendered_tile_size(map_zoom), size);
    }
}
