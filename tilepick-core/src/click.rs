//! Telling single clicks apart from double clicks.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tilepick_tile_utils::{Point, TilePosition};
use tokio::time::Instant;
use tracing::debug;

/// A pointer click inside one rendered tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    /// The clicked tile, keyed at the rendered map zoom.
    pub tile: TilePosition,
    /// Pixel position inside the tile.
    pub point: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    PendingSingle { click: ClickEvent, deadline: Instant },
}

/// Delays clicks by a short window and drops both clicks of a double click.
#[derive(Debug, Clone)]
pub struct ClickDisambiguator {
    delay: Duration,
    state: State,
}

impl ClickDisambiguator {
    /// Creates an idle disambiguator with the given window.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: State::Idle,
        }
    }

    /// Feeds a click received at `now`.
    ///
    /// A click while idle becomes pending. A click while another one is pending
    /// cancels it and is itself discarded.
    pub fn on_click(&mut self, click: ClickEvent, now: Instant) {
        self.state = match self.state {
            State::Idle => State::PendingSingle {
                click,
                deadline: now + self.delay,
            },
            State::PendingSingle { .. } => {
                debug!("Double click at {:?} on tile {}, ignoring both", click.point, click.tile);
                State::Idle
            }
        };
    }

    /// Returns the pending click once its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<ClickEvent> {
        match self.state {
            State::PendingSingle { click, deadline } if deadline <= now => {
                self.state = State::Idle;
                Some(click)
            }
            _ => None,
        }
    }

    /// When the pending click, if any, is due.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            State::Idle => None,
            State::PendingSingle { deadline, .. } => Some(deadline),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    fn click(x: f64) -> ClickEvent {
        ClickEvent {
            tile: TilePosition::new(1, 2, 3),
            point: Point::new(x, 10.0),
        }
    }

    fn ms(start: Instant, millis: u64) -> Instant {
        start + Duration::from_millis(millis)
    }

    #[test]
    fn test_single_click_fires_after_window() {
        let t0 = Instant::now();
        let mut clicks = ClickDisambiguator::new(DELAY);
        clicks.on_click(click(1.0), t0);
        assert_eq!(clicks.deadline(), Some(ms(t0, 500)));
        assert_eq!(clicks.poll(ms(t0, 499)), None);
        assert_eq!(clicks.poll(ms(t0, 500)), Some(click(1.0)));
        assert_eq!(clicks.deadline(), None);
        assert_eq!(clicks.poll(ms(t0, 1000)), None);
    }

    #[test]
    fn test_double_click_fires_nothing() {
        let t0 = Instant::now();
        let mut clicks = ClickDisambiguator::new(DELAY);
        clicks.on_click(click(1.0), t0);
        clicks.on_click(click(2.0), ms(t0, 100));
        assert_eq!(clicks.deadline(), None);
        assert_eq!(clicks.poll(ms(t0, 600)), None);
        assert_eq!(clicks.poll(ms(t0, 2000)), None);
    }

    #[test]
    fn test_click_after_double_click_starts_over() {
        let t0 = Instant::now();
        let mut clicks = ClickDisambiguator::new(DELAY);
        clicks.on_click(click(1.0), t0);
        clicks.on_click(click(2.0), ms(t0, 100));
        clicks.on_click(click(3.0), ms(t0, 200));
        assert_eq!(clicks.poll(ms(t0, 700)), Some(click(3.0)));
    }
}
