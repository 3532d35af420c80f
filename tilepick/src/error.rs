use std::io;
use std::path::PathBuf;

use tilepick_core::config::LayerConfigError;
use tilepick_core::tiles::TileError;

/// A convenience [`Result`] for the tilepick crate.
pub type TilepickResult<T> = Result<T, TilepickError>;

#[derive(thiserror::Error, Debug)]
pub enum TilepickError {
    #[error("Unable to load config file {1}: {0}")]
    ConfigLoadError(#[source] io::Error, PathBuf),

    #[error("Unable to parse config file {1}: {0}")]
    ConfigParseError(#[source] subst::yaml::Error, PathBuf),

    #[error("Unable to serialize config: {0}")]
    ConfigSerializeError(#[source] serde_yaml::Error),

    #[error("Unable to write config file {1}: {0}")]
    ConfigWriteError(#[source] io::Error, PathBuf),

    #[error("No tile URL configured. Set source.url in the config file or pass --url")]
    NoTileUrl,

    #[error("Tile URL template '{0}' must contain {{z}}, {{x}} and {{y}}")]
    InvalidUrlTemplate(String),

    #[error("Tile {tile} cannot be drawn at zoom {zoom}, the source zoom for it is {source_zoom}")]
    ZoomMismatch {
        tile: String,
        zoom: u8,
        source_zoom: u8,
    },

    #[error("Invalid layer configuration: {0}")]
    LayerConfigError(#[from] LayerConfigError),

    #[error("Unable to create HTTP client: {0}")]
    HttpClientError(#[source] reqwest::Error),

    #[error(transparent)]
    TileError(#[from] TileError),

    #[error("The layer stopped before all commands were delivered")]
    LayerStopped,

    #[error("The layer task failed: {0}")]
    LayerTaskError(#[source] tokio::task::JoinError),

    #[error("Unable to serialize event: {0}")]
    EventSerializeError(#[from] serde_json::Error),

    #[error(transparent)]
    IoError(#[from] io::Error),
}
