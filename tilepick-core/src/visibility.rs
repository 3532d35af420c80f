//! Reporting the named features currently held in the projected cache.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::trace;

use crate::tiles::{Feature, FeatureId, GeomKind, ProjectedTile};

/// Extracts the identifier used to deduplicate features across tiles.
pub type IdFn = Arc<dyn Fn(&Feature) -> Option<FeatureId> + Send + Sync>;

/// An [`IdFn`] reading the property `key`.
#[must_use]
pub fn id_from_property(key: impl Into<String>) -> IdFn {
    let key = key.into();
    Arc::new(move |feature| feature.property(&key)?.to_feature_id())
}

/// One entry of the `moveend` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleFeature {
    /// Feature identifier.
    pub osm_id: FeatureId,
    /// Display name, never empty.
    pub name: String,
    /// Geometry kind, serialized as 1, 2 or 3.
    #[serde(rename = "type")]
    pub kind: GeomKind,
}

/// Lists every named feature of `tiles`, one entry per identifier.
///
/// Tiles are scanned in the given order, then layers, then features, and the
/// first occurrence of an identifier wins. Features without an identifier or
/// without a non-empty string name are left out and do not claim their identifier.
pub fn compute_visible<'a>(
    tiles: impl IntoIterator<Item = &'a ProjectedTile>,
    id_fn: &IdFn,
    name_property: &str,
) -> Vec<VisibleFeature> {
    let mut seen = HashSet::new();
    let mut visible = Vec::new();
    for tile in tiles {
        for projected in tile.features() {
            let feature = &projected.feature;
            let Some(name) = feature
                .property(name_property)
                .and_then(|v| v.as_str())
                .filter(|n| !n.is_empty())
            else {
                continue;
            };
            let Some(id) = id_fn(feature) else {
                continue;
            };
            if seen.insert(id.clone()) {
                visible.push(VisibleFeature {
                    osm_id: id,
                    name: name.to_string(),
                    kind: feature.kind,
                });
            }
        }
    }
    trace!("{} visible features", visible.len());
    visible
}

/// A single pending deadline that moves forward every time it is re-armed.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    /// Creates an idle debouncer.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Schedules the deadline `delay` after `now`, replacing any pending one.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// The pending deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` exactly once when the pending deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
