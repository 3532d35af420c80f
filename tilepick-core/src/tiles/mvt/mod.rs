//! [Mapbox Vector Tile](https://github.com/mapbox/vector-tile-spec/tree/master/2.1) decoding and encoding.

mod geometry;
pub mod proto;

use std::sync::Arc;

pub use geometry::{decode_geometry, encode_geometry};
use prost::Message as _;
use tilepick_tile_utils::decompress;
use tracing::trace;

use crate::tiles::{
    DEFAULT_EXTENT, Feature, GeomKind, Properties, PropertyValue, TileDecoder, TileError,
    TileLayer, TileResult, VectorTile,
};

/// Decodes plain, gzip or zlib compressed MVT payloads.
///
/// Features with a geometry type other than Point, `LineString` or Polygon are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct MvtDecoder;

impl TileDecoder for MvtDecoder {
    fn decode(&self, data: &[u8]) -> TileResult<VectorTile> {
        let data = decompress(data).map_err(TileError::DecompressError)?;
        let tile = proto::Tile::decode(data.as_ref())?;
        let layers = tile
            .layers
            .into_iter()
            .map(decode_layer)
            .collect::<TileResult<Vec<_>>>()?;
        Ok(VectorTile { layers })
    }
}

fn decode_layer(layer: proto::Layer) -> TileResult<TileLayer> {
    let extent = layer.extent.unwrap_or(DEFAULT_EXTENT);
    if extent == 0 {
        return Err(TileError::InvalidGeometry {
            layer: layer.name,
            reason: "extent must be positive".to_string(),
        });
    }

    let values: Vec<Option<PropertyValue>> =
        layer.values.into_iter().map(property_value).collect();
    let invalid_tag = |index: u32| TileError::InvalidTag {
        layer: layer.name.clone(),
        index,
    };

    let mut features = Vec::with_capacity(layer.features.len());
    for feature in layer.features {
        let Some(kind) = feature.r#type.and_then(|t| GeomKind::try_from(t).ok()) else {
            trace!(
                "Skipping feature {:?} with geometry type {:?} in layer {}",
                feature.id, feature.r#type, layer.name
            );
            continue;
        };

        let pairs = feature.tags.chunks_exact(2);
        if let [index] = pairs.remainder() {
            return Err(invalid_tag(*index));
        }
        let mut properties = Properties::new();
        for pair in pairs {
            let key = layer
                .keys
                .get(pair[0] as usize)
                .ok_or_else(|| invalid_tag(pair[0]))?;
            let value = values
                .get(pair[1] as usize)
                .ok_or_else(|| invalid_tag(pair[1]))?;
            if let Some(value) = value {
                properties.insert(key.clone(), value.clone());
            }
        }

        let geometry =
            decode_geometry(&feature.geometry).map_err(|reason| TileError::InvalidGeometry {
                layer: layer.name.clone(),
                reason,
            })?;

        features.push(Arc::new(Feature {
            id: feature.id,
            kind,
            properties,
            geometry,
        }));
    }

    Ok(TileLayer {
        name: layer.name,
        extent,
        features,
    })
}

fn property_value(value: proto::Value) -> Option<PropertyValue> {
    if let Some(v) = value.string_value {
        Some(PropertyValue::String(v))
    } else if let Some(v) = value.float_value {
        Some(PropertyValue::Double(f64::from(v)))
    } else if let Some(v) = value.double_value {
        Some(PropertyValue::Double(v))
    } else if let Some(v) = value.int_value.or(value.sint_value) {
        Some(PropertyValue::Int(v))
    } else if let Some(v) = value.uint_value {
        Some(PropertyValue::from(v))
    } else {
        value.bool_value.map(PropertyValue::Bool)
    }
}

/// Encodes a decoded tile back into an uncompressed MVT payload.
#[must_use]
pub fn encode_tile(tile: &VectorTile) -> Vec<u8> {
    let layers = tile
        .layers
        .iter()
        .map(|layer| {
            let mut builder = LayerBuilder::new(layer.name.clone(), layer.extent);
            for feature in &layer.features {
                builder.add_feature(feature);
            }
            builder.build()
        })
        .collect();
    proto::Tile { layers }.encode_to_vec()
}

struct LayerBuilder {
    name: String,
    extent: u32,
    keys: Vec<String>,
    values: Vec<PropertyValue>,
    features: Vec<proto::Feature>,
}

impl LayerBuilder {
    fn new(name: String, extent: u32) -> Self {
        Self {
            name,
            extent,
            keys: Vec::new(),
            values: Vec::new(),
            features: Vec::new(),
        }
    }

    fn add_feature(&mut self, feature: &Feature) {
        let mut tags = Vec::with_capacity(feature.properties.len() * 2);
        for (key, value) in &feature.properties {
            tags.push(index_of(&mut self.keys, key));
            tags.push(index_of(&mut self.values, value));
        }
        self.features.push(proto::Feature {
            id: feature.id,
            tags,
            r#type: Some(feature.kind.into()),
            geometry: encode_geometry(feature.kind, &feature.geometry),
        });
    }

    fn build(self) -> proto::Layer {
        proto::Layer {
            version: 2,
            name: self.name,
            features: self.features,
            keys: self.keys,
            values: self.values.into_iter().map(proto_value).collect(),
            extent: Some(self.extent),
        }
    }
}

fn index_of<T, Q>(table: &mut Vec<T>, item: &Q) -> u32
where
    T: PartialEq<Q>,
    Q: ToOwned<Owned = T> + ?Sized,
{
    let index = table.iter().position(|v| v == item).unwrap_or_else(|| {
        table.push(item.to_owned());
        table.len() - 1
    });
    index as u32
}

fn proto_value(value: PropertyValue) -> proto::Value {
    let mut v = proto::Value::default();
    match value {
        PropertyValue::Bool(b) => v.bool_value = Some(b),
        PropertyValue::Int(i) => v.int_value = Some(i),
        PropertyValue::UInt(u) => v.uint_value = Some(u),
        PropertyValue::Double(d) => v.double_value = Some(d),
        PropertyValue::String(s) => v.string_value = Some(s),
    }
    v
}
