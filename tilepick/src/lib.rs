//! Command line host for a `tilepick` vector tile layer.
//!
//! Fetches and draws one tile as SVG, optionally clicks on it, and reports the
//! layer events as JSON lines.

pub mod args;
pub mod config;
pub mod host;
pub mod logging;
pub mod pick;
pub mod svg;

mod error;
pub use error::{TilepickError, TilepickResult};
