//! One draw, click and report session against a single tile.

use std::sync::Arc;

use tilepick_core::click::ClickEvent;
use tilepick_core::config::LayerOptions;
use tilepick_core::tiles::BoxedFetcher;
use tilepick_core::tiles::mvt::MvtDecoder;
use tilepick_core::{LayerCommand, LayerEvent, LayerRuntime, VectorTileLayer};
use tokio::sync::mpsc::unbounded_channel;
use tracing::{debug, info};

use crate::args::ViewArgs;
use crate::config::Config;
use crate::host::tile_request;
use crate::svg::SvgCanvas;
use crate::{TilepickError, TilepickResult};

/// Outcome of [`pick`].
#[derive(Debug)]
pub struct Picked {
    /// The drawn tile.
    pub canvas: SvgCanvas,
    /// Every event the layer emitted, in order.
    pub events: Vec<LayerEvent>,
}

/// Draws the tile of `view`, delivers its click, and waits for the layer to settle.
///
/// The layer runs until its click and visibility timers have fired, so this takes
/// at least the configured visibility delay.
pub async fn pick(
    config: &Config,
    view: &ViewArgs,
    fetcher: BoxedFetcher,
) -> TilepickResult<Picked> {
    let template = config.source.url_template()?;
    let options = LayerOptions::from_config(config.layer.clone())?;
    let request = tile_request(&template, &options, view.tile, view.zoom)?;
    debug!("Using {options:?}");

    let mut canvas = SvgCanvas::new(options.rendered_tile_size(request.position.z));
    let (events_tx, mut events_rx) = unbounded_channel();
    let mut layer = VectorTileLayer::new(options, fetcher, Arc::new(MvtDecoder), events_tx);
    layer.draw_tile(&request, &mut canvas).await?;
    info!("Drew tile {:#} from {}", request.position, request.url);

    let (commands, commands_rx) = unbounded_channel();
    let runtime = tokio::spawn(LayerRuntime::new(layer).run(commands_rx));
    if let Some(point) = view.click {
        let click = ClickEvent {
            tile: request.position,
            point,
        };
        commands
            .send(LayerCommand::Click(click))
            .map_err(|_| TilepickError::LayerStopped)?;
    }
    drop(commands);

    let layer = runtime.await.map_err(TilepickError::LayerTaskError)?;
    debug!(
        "Layer settled with {} projected tiles",
        layer.cache().projected().len()
    );
    drop(layer);

    let mut events = Vec::new();
    while let Some(event) = events_rx.recv().await {
        events.push(event);
    }
    Ok(Picked { canvas, events })
}
