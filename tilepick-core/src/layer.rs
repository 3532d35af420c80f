//! The vector tile layer and the events it reports to its host.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tilepick_tile_utils::TilePosition;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::click::{ClickDisambiguator, ClickEvent};
use crate::config::LayerOptions;
use crate::hit::hit_test;
use crate::render::{Canvas, draw};
use crate::tiles::{BoxedDecoder, BoxedFetcher, Properties, TileCache, TileResult, VectorTile};
use crate::visibility::{Debouncer, VisibleFeature, compute_visible};

/// A request from the host to paint one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRequest {
    /// Grid cell to paint; `z` is the current map zoom.
    pub position: TilePosition,
    /// Where the tile at [`VectorTileLayer::source_position`] can be fetched.
    pub url: String,
}

/// Events emitted by a layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum LayerEvent {
    /// A single click hit a feature.
    Click {
        /// Properties of the clicked feature.
        properties: Properties,
    },
    /// Named features held by the layer after the viewport settled.
    MoveEnd {
        /// One entry per feature identifier.
        visible: Vec<VisibleFeature>,
    },
}

/// A vector tile map layer: draws tiles, answers clicks and reports visible features.
///
/// The host drives it through `draw_tile` and the `on_*` callbacks and wakes it up at
/// [`next_deadline`](Self::next_deadline) by calling [`fire_due_timers`](Self::fire_due_timers).
#[derive(Debug)]
pub struct VectorTileLayer {
    options: LayerOptions,
    fetcher: BoxedFetcher,
    decoder: BoxedDecoder,
    cache: TileCache,
    clicks: ClickDisambiguator,
    visibility: Debouncer,
    events: UnboundedSender<LayerEvent>,
}

impl VectorTileLayer {
    /// Creates a layer with empty caches and no pending timers.
    #[must_use]
    pub fn new(
        options: LayerOptions,
        fetcher: BoxedFetcher,
        decoder: BoxedDecoder,
        events: UnboundedSender<LayerEvent>,
    ) -> Self {
        Self {
            cache: TileCache::new(options.max_cached_tiles),
            clicks: ClickDisambiguator::new(options.click_delay),
            visibility: Debouncer::new(options.visibility_delay),
            options,
            fetcher,
            decoder,
            events,
        }
    }

    /// The resolved options.
    #[must_use]
    pub fn options(&self) -> &LayerOptions {
        &self.options
    }

    /// The tile caches.
    #[must_use]
    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    /// Position of the source tile painted for `position`.
    #[must_use]
    pub fn source_position(&self, position: TilePosition) -> TilePosition {
        position.with_zoom(self.options.source_zoom(position.z))
    }

    /// Fetches and decodes the raw tile of `request`, sharing the result with the raw cache.
    ///
    /// The returned future does not borrow the layer, so draws can proceed while
    /// the layer keeps handling other input.
    pub fn fetch_task(
        &self,
        request: &TileRequest,
    ) -> impl Future<Output = TileResult<Arc<VectorTile>>> + Send + 'static {
        let raw = self.cache.raw().clone();
        let fetcher = Arc::clone(&self.fetcher);
        let decoder = Arc::clone(&self.decoder);
        let key = self.source_position(request.position);
        let url = request.url.clone();
        async move {
            raw.get_or_fetch(key, &url, fetcher.as_ref(), decoder.as_ref())
                .await
        }
    }

    /// Paints the tile of `request` onto `canvas`.
    ///
    /// The canvas is cleared first and stays blank when the tile cannot be loaded.
    pub async fn draw_tile(
        &mut self,
        request: &TileRequest,
        canvas: &mut dyn Canvas,
    ) -> TileResult<()> {
        canvas.clear();
        let fetched = self.fetch_task(request).await;
        self.finish_draw(request, fetched, canvas)
    }

    /// Completes a draw started with [`fetch_task`](Self::fetch_task) on an already cleared canvas.
    pub fn finish_draw(
        &mut self,
        request: &TileRequest,
        fetched: TileResult<Arc<VectorTile>>,
        canvas: &mut dyn Canvas,
    ) -> TileResult<()> {
        let raw = fetched.inspect_err(|e| {
            warn!("Unable to load tile {:#} from {}: {e}", request.position, request.url);
        })?;
        let size = self.options.rendered_tile_size(request.position.z);
        let tile = self.cache.get_or_build_projected(
            request.position,
            size,
            &raw,
            self.options.layers.as_deref(),
        );
        draw(canvas, tile, &self.options.style_fn);
        trace!("Drew tile {:#}", request.position);
        Ok(())
    }

    /// The map now shows `map_zoom`: tiles of any other zoom are dropped.
    pub fn on_viewport_reset(&mut self, map_zoom: u8) {
        debug!("Viewport reset to zoom {map_zoom}");
        self.cache
            .purge_raw_not_matching_zoom(self.options.source_zoom(map_zoom));
        self.cache.purge_projected_not_matching_zoom(map_zoom);
    }

    /// The host no longer shows the grid cell of `position`: every zoom variant of it is dropped.
    pub fn on_tile_evicted(&mut self, position: TilePosition) {
        self.cache.purge_by_tile_prefix(&position.key_prefix());
    }

    /// The layer was added to the map.
    pub fn on_add(&mut self, now: Instant) {
        self.visibility.arm(now);
    }

    /// The viewport stopped moving.
    pub fn on_move_end(&mut self, now: Instant) {
        self.visibility.arm(now);
    }

    /// A pointer click landed on the layer.
    pub async fn on_click(&mut self, click: ClickEvent, now: Instant) {
        self.fire_due_timers(now).await;
        self.clicks.on_click(click, now);
    }

    /// The earliest pending timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.clicks.deadline(), self.visibility.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Runs every timer that is due at `now`.
    pub async fn fire_due_timers(&mut self, now: Instant) {
        if let Some(click) = self.clicks.poll(now) {
            debug!("Handling click at {:?} on tile {}", click.point, click.tile);
            self.handle_click(click).await;
        }
        if self.visibility.poll(now) {
            let visible = compute_visible(
                self.cache.projected().iter().map(|(_, tile)| tile),
                &self.options.id_fn,
                &self.options.name_property,
            );
            debug!("Reporting {} visible features", visible.len());
            self.emit(LayerEvent::MoveEnd { visible });
        }
    }

    async fn handle_click(&mut self, click: ClickEvent) {
        if self.cache.projected().get(&click.tile).is_none() {
            let source = self.source_position(click.tile);
            let Some(raw) = self.cache.raw().get(&source).await else {
                trace!("Click on tile {} which has no data", click.tile);
                return;
            };
            let size = self.options.rendered_tile_size(click.tile.z);
            self.cache
                .get_or_build_projected(click.tile, size, &raw, self.options.layers.as_deref());
        }
        let Some(tile) = self.cache.projected().get(&click.tile) else {
            return;
        };
        let hit = hit_test(
            tile,
            self.options.layers.as_deref(),
            click.point,
            self.options.click_tolerance,
        );
        if let Some(feature) = hit {
            let properties = feature.properties.clone();
            self.emit(LayerEvent::Click { properties });
        }
    }

    fn emit(&self, event: LayerEvent) {
        if self.events.send(event).is_err() {
            debug!("Layer event dropped, no receiver");
        }
    }
}
