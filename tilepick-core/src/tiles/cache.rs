use std::collections::HashMap;
use std::sync::Arc;

use moka::future::Cache;
use tilepick_tile_utils::TilePosition;
use tracing::{debug, trace};

use crate::tiles::{ProjectedTile, TileDecoder, TileError, TileFetcher, TileResult, VectorTile};

/// Decoded tiles keyed by position at their source zoom.
///
/// Concurrent requests for the same key share a single fetch. Cloning is cheap
/// and every clone sees the same entries.
#[derive(Clone, Debug)]
pub struct RawTileCache(Cache<TilePosition, Arc<VectorTile>>);

impl RawTileCache {
    /// Creates an empty cache, optionally bounded to `max_tiles` entries.
    #[must_use]
    pub fn new(max_tiles: Option<u64>) -> Self {
        let mut builder = Cache::builder()
            .name("raw_tile_cache")
            .support_invalidation_closures();
        if let Some(max_tiles) = max_tiles {
            builder = builder.max_capacity(max_tiles);
            trace!("Raw tile cache limited to {max_tiles} tiles");
        }
        Self(builder.build())
    }

    /// Retrieves a tile if present.
    pub async fn get(&self, key: &TilePosition) -> Option<Arc<VectorTile>> {
        let result = self.0.get(key).await;
        if result.is_some() {
            trace!(
                "Raw tile cache HIT for {key} (entries={entries})",
                entries = self.0.entry_count()
            );
        } else {
            trace!("Raw tile cache MISS for {key}");
        }
        result
    }

    /// Returns the cached tile, or fetches `url` and decodes it.
    ///
    /// A failed fetch is not cached; the next call for the same key tries again.
    pub async fn get_or_fetch(
        &self,
        key: TilePosition,
        url: &str,
        fetcher: &dyn TileFetcher,
        decoder: &dyn TileDecoder,
    ) -> TileResult<Arc<VectorTile>> {
        if let Some(tile) = self.get(&key).await {
            return Ok(tile);
        }

        self.0
            .try_get_with(key, async {
                let data = fetcher.fetch(url).await?;
                let tile = decoder.decode(&data)?;
                debug!(
                    "Decoded tile {key} from {url}: {} layers, {} features",
                    tile.layers.len(),
                    tile.feature_count()
                );
                Ok::<_, TileError>(Arc::new(tile))
            })
            .await
            .map_err(TileError::SharedError)
    }

    /// Stores a decoded tile, replacing any previous entry.
    pub async fn insert(&self, key: TilePosition, tile: Arc<VectorTile>) {
        self.0.insert(key, tile).await;
    }

    /// Removes every entry whose key matches `predicate`.
    ///
    /// Matching entries stop being returned immediately; their memory is reclaimed
    /// by the cache's housekeeping.
    pub fn invalidate_if<F>(&self, predicate: F)
    where
        F: Fn(&TilePosition) -> bool + Send + Sync + 'static,
    {
        self.0
            .invalidate_entries_if(move |key, _| predicate(key))
            .expect("invalidation closures are enabled for the raw tile cache");
    }
}

/// Projected tiles keyed by position at the rendered zoom, iterated in insertion order.
#[derive(Debug, Default)]
pub struct ProjectedCache {
    entries: HashMap<TilePosition, ProjectedTile>,
    order: Vec<TilePosition>,
}

impl ProjectedCache {
    /// Retrieves a projected tile if present.
    #[must_use]
    pub fn get(&self, key: &TilePosition) -> Option<&ProjectedTile> {
        self.entries.get(key)
    }

    /// Returns the projected tile for `key`, building it from `raw` when absent.
    pub fn get_or_build(
        &mut self,
        key: TilePosition,
        tile_size: f64,
        raw: &VectorTile,
        layer_filter: Option<&[String]>,
    ) -> &ProjectedTile {
        let order = &mut self.order;
        self.entries.entry(key).or_insert_with(|| {
            trace!("Projecting tile {key} at {tile_size}px");
            order.push(key);
            ProjectedTile::build(raw, tile_size, layer_filter)
        })
    }

    /// Keeps only the entries for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&TilePosition) -> bool) {
        self.order.retain(|key| keep(key));
        self.entries.retain(|key, _| self.order.contains(key));
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&TilePosition, &ProjectedTile)> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key).map(|tile| (key, tile)))
    }

    /// Number of projected tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no tile is projected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Owned tile state of one layer: raw tiles at source zoom and projected tiles per rendered zoom.
#[derive(Debug)]
pub struct TileCache {
    raw: RawTileCache,
    projected: ProjectedCache,
}

impl TileCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(max_raw_tiles: Option<u64>) -> Self {
        Self {
            raw: RawTileCache::new(max_raw_tiles),
            projected: ProjectedCache::default(),
        }
    }

    /// The raw tile cache.
    #[must_use]
    pub fn raw(&self) -> &RawTileCache {
        &self.raw
    }

    /// The projected tile cache.
    #[must_use]
    pub fn projected(&self) -> &ProjectedCache {
        &self.projected
    }

    /// See [`RawTileCache::get_or_fetch`].
    pub async fn get_or_fetch(
        &self,
        key: TilePosition,
        url: &str,
        fetcher: &dyn TileFetcher,
        decoder: &dyn TileDecoder,
    ) -> TileResult<Arc<VectorTile>> {
        self.raw.get_or_fetch(key, url, fetcher, decoder).await
    }

    /// See [`ProjectedCache::get_or_build`].
    pub fn get_or_build_projected(
        &mut self,
        key: TilePosition,
        tile_size: f64,
        raw: &VectorTile,
        layer_filter: Option<&[String]>,
    ) -> &ProjectedTile {
        self.projected.get_or_build(key, tile_size, raw, layer_filter)
    }

    /// Removes every raw and projected entry whose zoom differs from `zoom`.
    pub fn purge_not_matching_zoom(&mut self, zoom: u8) {
        self.purge_raw_not_matching_zoom(zoom);
        self.purge_projected_not_matching_zoom(zoom);
    }

    /// Removes every raw entry whose zoom differs from `zoom`.
    pub fn purge_raw_not_matching_zoom(&self, zoom: u8) {
        debug!("Purging raw tiles not at zoom {zoom}");
        self.raw.invalidate_if(move |key| key.z != zoom);
    }

    /// Removes every projected entry whose zoom differs from `zoom`.
    pub fn purge_projected_not_matching_zoom(&mut self, zoom: u8) {
        let before = self.projected.len();
        self.projected.retain(|key| key.z == zoom);
        debug!(
            "Purged {} projected tiles not at zoom {zoom}",
            before - self.projected.len()
        );
    }

    /// Removes every raw and projected entry whose `x:y:z` key starts with `prefix`.
    pub fn purge_by_tile_prefix(&mut self, prefix: &str) {
        let owned = prefix.to_string();
        self.raw
            .invalidate_if(move |key| key.to_string().starts_with(&owned));
        let before = self.projected.len();
        self.projected
            .retain(|key| !key.to_string().starts_with(prefix));
        debug!(
            "Purged tile prefix {prefix}: {} projected tiles removed",
            before - self.projected.len()
        );
    }
}
