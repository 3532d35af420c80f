//! Protobuf messages of the [vector tile specification](https://github.com/mapbox/vector-tile-spec/tree/master/2.1).
//!
//! The `type` field is kept as a raw `int32` so that unknown geometry kinds
//! survive decoding and can be skipped by the caller.

use prost::Message;

/// Top-level tile message.
#[derive(Clone, PartialEq, Message)]
pub struct Tile {
    /// Layers in encoding order.
    #[prost(message, repeated, tag = "3")]
    pub layers: Vec<Layer>,
}

/// A named layer with its own key/value tables.
#[derive(Clone, PartialEq, Message)]
pub struct Layer {
    /// Specification version.
    #[prost(uint32, required, tag = "15", default = "1")]
    pub version: u32,
    /// Layer name.
    #[prost(string, required, tag = "1")]
    pub name: String,
    /// Features.
    #[prost(message, repeated, tag = "2")]
    pub features: Vec<Feature>,
    /// Attribute key table.
    #[prost(string, repeated, tag = "3")]
    pub keys: Vec<String>,
    /// Attribute value table.
    #[prost(message, repeated, tag = "4")]
    pub values: Vec<Value>,
    /// Coordinate space size.
    #[prost(uint32, optional, tag = "5", default = "4096")]
    pub extent: Option<u32>,
}

/// An encoded feature: tag indices plus a geometry command stream.
#[derive(Clone, PartialEq, Message)]
pub struct Feature {
    /// Optional numeric id.
    #[prost(uint64, optional, tag = "1")]
    pub id: Option<u64>,
    /// Pairs of key and value indices.
    #[prost(uint32, repeated, packed = "true", tag = "2")]
    pub tags: Vec<u32>,
    /// Geometry type tag (0 unknown, 1 point, 2 linestring, 3 polygon).
    #[prost(int32, optional, tag = "3")]
    pub r#type: Option<i32>,
    /// Command integers and zig-zag encoded parameters.
    #[prost(uint32, repeated, packed = "true", tag = "4")]
    pub geometry: Vec<u32>,
}

/// A typed attribute value. Exactly one field is set.
#[derive(Clone, PartialEq, Message)]
pub struct Value {
    /// String value.
    #[prost(string, optional, tag = "1")]
    pub string_value: Option<String>,
    /// Single precision value.
    #[prost(float, optional, tag = "2")]
    pub float_value: Option<f32>,
    /// Double precision value.
    #[prost(double, optional, tag = "3")]
    pub double_value: Option<f64>,
    /// Signed value.
    #[prost(int64, optional, tag = "4")]
    pub int_value: Option<i64>,
    /// Unsigned value.
    #[prost(uint64, optional, tag = "5")]
    pub uint_value: Option<u64>,
    /// Zig-zag signed value.
    #[prost(sint64, optional, tag = "6")]
    pub sint_value: Option<i64>,
    /// Boolean value.
    #[prost(bool, optional, tag = "7")]
    pub bool_value: Option<bool>,
}
