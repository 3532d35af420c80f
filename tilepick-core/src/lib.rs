#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod click;
pub mod config;
pub mod hit;
pub mod layer;
pub mod render;
pub mod runtime;
pub mod tiles;
pub mod visibility;

pub use layer::{LayerEvent, TileRequest, VectorTileLayer};
pub use runtime::{LayerCommand, LayerRuntime};
