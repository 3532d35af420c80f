//! Single event loop driving one [`VectorTileLayer`].

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt as _};
use futures::stream::{FuturesUnordered, StreamExt as _};
use tilepick_tile_utils::TilePosition;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, trace};

use crate::click::ClickEvent;
use crate::layer::{TileRequest, VectorTileLayer};
use crate::render::Canvas;
use crate::tiles::{TileResult, VectorTile};

/// A canvas that can be handed to the event loop and back.
pub type BoxedCanvas = Box<dyn Canvas + Send>;

/// Input from the host.
pub enum LayerCommand {
    /// Paint a tile; the canvas comes back through `reply` once painted.
    DrawTile {
        /// The tile to paint.
        request: TileRequest,
        /// Canvas to paint on.
        canvas: BoxedCanvas,
        /// Receives the painted canvas.
        reply: oneshot::Sender<DrawnTile>,
    },
    /// A pointer click.
    Click(ClickEvent),
    /// The viewport stopped moving.
    MoveEnd,
    /// The map switched to a new zoom.
    ViewportReset {
        /// The new map zoom.
        map_zoom: u8,
    },
    /// The host dropped a grid cell.
    TileEvicted(TilePosition),
    /// Stop right away, abandoning in-flight draws and pending timers.
    Shutdown,
}

impl std::fmt::Debug for LayerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DrawTile { request, .. } => f.debug_tuple("DrawTile").field(request).finish(),
            Self::Click(click) => f.debug_tuple("Click").field(click).finish(),
            Self::MoveEnd => f.write_str("MoveEnd"),
            Self::ViewportReset { map_zoom } => {
                f.debug_struct("ViewportReset").field("map_zoom", map_zoom).finish()
            }
            Self::TileEvicted(position) => f.debug_tuple("TileEvicted").field(position).finish(),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Reply to [`LayerCommand::DrawTile`].
pub struct DrawnTile {
    /// The canvas, painted or left blank.
    pub canvas: BoxedCanvas,
    /// Whether the tile could be loaded.
    pub result: TileResult<()>,
}

impl std::fmt::Debug for DrawnTile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawnTile")
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

type PendingDraw = (
    TileRequest,
    BoxedCanvas,
    oneshot::Sender<DrawnTile>,
    TileResult<Arc<VectorTile>>,
);

/// Owns a layer and serializes every mutation of it on one task.
///
/// Fetches run concurrently with clicks and timers; their projection and painting
/// happen on the loop once the data is there.
#[derive(Debug)]
pub struct LayerRuntime {
    layer: VectorTileLayer,
}

impl LayerRuntime {
    /// Wraps a layer.
    #[must_use]
    pub fn new(layer: VectorTileLayer) -> Self {
        Self { layer }
    }

    /// Processes `commands` until [`LayerCommand::Shutdown`] arrives, or until the
    /// channel is closed and every in-flight draw and pending timer is done.
    ///
    /// The layer is considered added when the loop starts. Returns the layer.
    pub async fn run(self, mut commands: UnboundedReceiver<LayerCommand>) -> VectorTileLayer {
        let mut layer = self.layer;
        let mut draws: FuturesUnordered<BoxFuture<'static, PendingDraw>> = FuturesUnordered::new();
        let mut closed = false;
        layer.on_add(Instant::now());

        loop {
            let deadline = layer.next_deadline();
            if closed && draws.is_empty() && deadline.is_none() {
                debug!("Command channel closed and layer idle, stopping");
                break;
            }

            tokio::select! {
                command = commands.recv(), if !closed => {
                    let Some(command) = command else {
                        closed = true;
                        continue;
                    };
                    trace!("Layer command {command:?}");
                    match command {
                        LayerCommand::DrawTile { request, mut canvas, reply } => {
                            canvas.clear();
                            let fetch = layer.fetch_task(&request);
                            draws.push(
                                async move {
                                    let fetched = fetch.await;
                                    (request, canvas, reply, fetched)
                                }
                                .boxed(),
                            );
                        }
                        LayerCommand::Click(click) => layer.on_click(click, Instant::now()).await,
                        LayerCommand::MoveEnd => layer.on_move_end(Instant::now()),
                        LayerCommand::ViewportReset { map_zoom } => layer.on_viewport_reset(map_zoom),
                        LayerCommand::TileEvicted(position) => layer.on_tile_evicted(position),
                        LayerCommand::Shutdown => {
                            debug!("Layer shutdown requested");
                            break;
                        }
                    }
                }
                Some((request, mut canvas, reply, fetched)) = draws.next(), if !draws.is_empty() => {
                    let result = layer.finish_draw(&request, fetched, canvas.as_mut());
                    if reply.send(DrawnTile { canvas, result }).is_err() {
                        trace!("Draw of {:#} finished after the host stopped waiting", request.position);
                    }
                }
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    layer.fire_due_timers(Instant::now()).await;
                }
            }
        }

        layer
    }
}
