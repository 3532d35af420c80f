use std::sync::Arc;

/// Errors that can occur while fetching or decoding a tile.
///
/// All of them are scoped to a single tile: the layer logs them and leaves that
/// tile blank while other tiles keep rendering.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum TileError {
    /// The HTTP request could not be completed.
    #[error("Unable to fetch tile {1}: {0}")]
    FetchError(#[source] reqwest::Error, String),

    /// The server answered with a non-success status.
    #[error("Tile request {1} failed with HTTP status {0}")]
    HttpStatusError(u16, String),

    /// A fetcher other than the HTTP one failed.
    #[error("Tile source unavailable for {1}: {0}")]
    SourceError(String, String),

    /// The compressed payload could not be inflated.
    #[error("Unable to decompress tile payload: {0}")]
    DecompressError(#[source] std::io::Error),

    /// The payload is not a valid vector tile protobuf message.
    #[error("Unable to decode vector tile: {0}")]
    DecodeError(#[from] prost::DecodeError),

    /// A geometry command stream is malformed.
    #[error("Invalid geometry in layer '{layer}': {reason}")]
    InvalidGeometry {
        /// Layer holding the feature.
        layer: String,
        /// What is wrong with the command stream.
        reason: String,
    },

    /// A tag refers to a key or value that the layer does not define.
    #[error("Invalid tag index {index} in layer '{layer}'")]
    InvalidTag {
        /// Layer holding the feature.
        layer: String,
        /// Offending key or value index.
        index: u32,
    },

    /// Failure of a fetch this request was waiting on (the fetch was shared with another request).
    #[error(transparent)]
    SharedError(#[from] Arc<TileError>),
}

impl TileError {
    /// The underlying error, looking through [`TileError::SharedError`] wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::SharedError(inner) => inner.root(),
            other => other,
        }
    }
}

/// A convenience [`Result`] for tile fetching and decoding.
pub type TileResult<T> = Result<T, TileError>;
