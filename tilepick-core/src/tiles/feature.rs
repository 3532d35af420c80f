use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tilepick_tile_utils::Ring;

/// Extent used by most vector tile producers.
pub const DEFAULT_EXTENT: u32 = 4096;

/// Geometry kind of a feature.
///
/// Serialized as the vector tile `type` tag: 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum GeomKind {
    /// One or more points.
    Point = 1,
    /// One or more polylines.
    LineString = 2,
    /// Exterior and interior rings.
    Polygon = 3,
}

impl From<GeomKind> for i32 {
    fn from(kind: GeomKind) -> Self {
        kind as Self
    }
}

/// A geometry type tag other than Point, `LineString` or Polygon.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Unknown geometry type {0}")]
pub struct UnknownGeomKind(pub i32);

impl TryFrom<i32> for GeomKind {
    type Error = UnknownGeomKind;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Point),
            2 => Ok(Self::LineString),
            3 => Ok(Self::Polygon),
            v => Err(UnknownGeomKind(v)),
        }
    }
}

/// A single feature attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Unsigned integer value that does not fit an `i64`.
    UInt(u64),
    /// Floating point value.
    Double(f64),
    /// String value.
    String(String),
}

impl PropertyValue {
    /// The string content, if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Interprets the value as a feature identifier. Booleans are not identifiers.
    #[must_use]
    pub fn to_feature_id(&self) -> Option<FeatureId> {
        match self {
            Self::Bool(_) => None,
            Self::Int(v) => Some(FeatureId::Int(*v)),
            Self::UInt(v) => Some(
                i64::try_from(*v).map_or_else(|_| FeatureId::Text(v.to_string()), FeatureId::Int),
            ),
            #[allow(clippy::float_cmp)]
            Self::Double(v) => Some(if v.is_finite() && v.trunc() == *v && v.abs() < 9e15 {
                FeatureId::Int(*v as i64)
            } else {
                FeatureId::Text(v.to_string())
            }),
            Self::String(v) => Some(FeatureId::Text(v.clone())),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u64> for PropertyValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::UInt(value), Self::Int)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Attribute mapping of a feature.
pub type Properties = BTreeMap<String, PropertyValue>;

/// Identifier used to deduplicate features that span several tiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    /// Numeric identifier.
    Int(i64),
    /// Any other identifier.
    Text(String),
}

impl Display for FeatureId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// A decoded, unprojected vector tile feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Optional numeric id carried by the tile encoding itself.
    pub id: Option<u64>,
    /// Geometry kind.
    pub kind: GeomKind,
    /// Attributes.
    pub properties: Properties,
    /// Rings in tile extent units.
    pub geometry: Vec<Ring>,
}

impl Feature {
    /// Creates a feature without id or properties.
    #[must_use]
    pub fn new(kind: GeomKind, geometry: Vec<Ring>) -> Self {
        Self {
            id: None,
            kind,
            properties: Properties::new(),
            geometry,
        }
    }

    /// Sets the encoding-level id.
    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Adds or replaces one property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Looks up a property by key.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

/// One named layer of a decoded tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    /// Layer name.
    pub name: String,
    /// Size of the coordinate space the geometry is encoded in.
    pub extent: u32,
    /// Features in encoding order.
    pub features: Vec<Arc<Feature>>,
}

impl TileLayer {
    /// Creates an empty layer.
    #[must_use]
    pub fn new(name: impl Into<String>, extent: u32) -> Self {
        Self {
            name: name.into(),
            extent,
            features: Vec::new(),
        }
    }

    /// Appends a feature.
    #[must_use]
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(Arc::new(feature));
        self
    }
}

/// Decoded per-layer feature set of one tile at its source zoom. Immutable once fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorTile {
    /// Layers in encoding order.
    pub layers: Vec<TileLayer>,
}

impl VectorTile {
    /// Total number of features over all layers.
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.layers.iter().map(|l| l.features.len()).sum()
    }
}
