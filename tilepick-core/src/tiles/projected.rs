use std::sync::Arc;

use tilepick_tile_utils::{BBox, Ring, project};

use crate::tiles::{Feature, VectorTile};

/// A feature together with its geometry in canvas pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedFeature {
    /// The raw feature, shared with the raw tile cache.
    pub feature: Arc<Feature>,
    /// Rings in pixel coordinates of the rendered tile.
    pub geometry: Vec<Ring>,
    /// Pixel bounds of `geometry`, `None` for empty geometry.
    pub bbox: Option<BBox>,
}

/// Projected features of one layer, in encoding order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedLayer {
    /// Layer name.
    pub name: String,
    /// Projected features.
    pub features: Vec<ProjectedFeature>,
}

/// All projected layers of one tile at one rendered zoom.
///
/// Always derivable from the raw [`VectorTile`], never the source of truth.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedTile {
    /// Layers in raw tile order.
    pub layers: Vec<ProjectedLayer>,
}

impl ProjectedTile {
    /// Projects every feature of `raw` onto a square tile of `tile_size` pixels.
    ///
    /// Each layer uses its own ratio `extent / tile_size`. When `layer_filter`
    /// is given, layers whose name is not listed are left out.
    #[must_use]
    pub fn build(raw: &VectorTile, tile_size: f64, layer_filter: Option<&[String]>) -> Self {
        let layers = raw
            .layers
            .iter()
            .filter(|layer| layer_filter.is_none_or(|names| names.contains(&layer.name)))
            .map(|layer| {
                let ratio = f64::from(layer.extent) / tile_size;
                let features = layer
                    .features
                    .iter()
                    .map(|feature| {
                        let geometry = project(&feature.geometry, ratio);
                        ProjectedFeature {
                            bbox: BBox::from_rings(&geometry),
                            feature: Arc::clone(feature),
                            geometry,
                        }
                    })
                    .collect();
                ProjectedLayer {
                    name: layer.name.clone(),
                    features,
                }
            })
            .collect();
        Self { layers }
    }

    /// Finds a layer by name.
    #[must_use]
    pub fn layer(&self, name: &str) -> Option<&ProjectedLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Iterates over every projected feature, layer by layer.
    pub fn features(&self) -> impl Iterator<Item = &ProjectedFeature> {
        self.layers.iter().flat_map(|l| &l.features)
    }
}
