//! Tile data: decoded features, fetching, decoding and the per-layer caches.

mod cache;
mod error;
mod feature;
pub mod mvt;
mod projected;
mod source;

pub use cache::{ProjectedCache, RawTileCache, TileCache};
pub use error::{TileError, TileResult};
pub use feature::{
    DEFAULT_EXTENT, Feature, FeatureId, GeomKind, Properties, PropertyValue, TileLayer,
    UnknownGeomKind, VectorTile,
};
pub use projected::{ProjectedFeature, ProjectedLayer, ProjectedTile};
pub use source::{BoxedDecoder, BoxedFetcher, HttpTileFetcher, TileDecoder, TileFetcher};
