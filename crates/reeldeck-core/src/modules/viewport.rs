// crates/reeldeck-core/src/modules/viewport.rs
//
// §4.7 "Viewport": `{zoomLevel, scrollOffset}` plus the derived bounds that
// depend on timeline content length and the host's track-area width. The
// host supplies those two numbers per call rather than this module holding
// a reference to TimelineModule, keeping the dependency one-directional.

use crate::broadcaster::{Broadcaster, SubscriptionId};

const MAX_ZOOM: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    pub zoom_level: f64,
    pub scroll_offset: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self { zoom_level: MAX_ZOOM, scroll_offset: 0.0 }
    }
}

pub struct ViewportModule {
    state: ViewportState,
    broadcaster: Broadcaster<ViewportState>,
}

impl ViewportModule {
    pub fn new() -> Self {
        Self { state: ViewportState::default(), broadcaster: Broadcaster::new() }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    /// The zoom at which the full timeline content exactly fills
    /// `track_width_px`, given `base_px_per_frame` at `zoomLevel == 100`.
    pub fn min_zoom_level(content_duration_frames: i64, track_width_px: f64, base_px_per_frame: f64) -> f64 {
        if content_duration_frames <= 0 || base_px_per_frame <= 0.0 {
            return MAX_ZOOM;
        }
        let full_width_at_100 = content_duration_frames as f64 * base_px_per_frame;
        if full_width_at_100 <= track_width_px {
            return MAX_ZOOM;
        }
        (track_width_px / full_width_at_100 * MAX_ZOOM).clamp(0.0, MAX_ZOOM)
    }

    pub fn set_zoom_level(&mut self, zoom: f64, min_zoom: f64) {
        self.state.zoom_level = zoom.clamp(min_zoom, MAX_ZOOM);
        self.notify();
    }

    /// `content_duration_frames * base_px_per_frame * zoom/100 - track_width_px`,
    /// floored at 0.
    pub fn max_scroll_offset(content_duration_frames: i64, track_width_px: f64, zoom_level: f64, base_px_per_frame: f64) -> f64 {
        let content_width = content_duration_frames as f64 * base_px_per_frame * (zoom_level / MAX_ZOOM);
        (content_width - track_width_px).max(0.0)
    }

    pub fn set_scroll_offset(&mut self, offset: f64, max_offset: f64) {
        self.state.scroll_offset = offset.clamp(0.0, max_offset);
        self.notify();
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ViewportState)>) -> SubscriptionId {
        self.broadcaster.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.broadcaster.unsubscribe(id);
    }

    fn notify(&self) {
        self.broadcaster.notify(&self.state);
    }
}

impl Default for ViewportModule {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_clamps_to_derived_minimum() {
        let mut viewport = ViewportModule::new();
        let min = ViewportModule::min_zoom_level(3000, 500.0, 1.0);
        viewport.set_zoom_level(1.0, min);
        assert_eq!(viewport.state().zoom_level, min);
        assert!(min < 100.0);
    }

    #[test]
    fn scroll_offset_clamps_to_derived_maximum() {
        let mut viewport = ViewportModule::new();
        let max = ViewportModule::max_scroll_offset(3000, 500.0, 100.0, 1.0);
        viewport.set_scroll_offset(100_000.0, max);
        assert_eq!(viewport.state().scroll_offset, max);
        viewport.set_scroll_offset(-5.0, max);
        assert_eq!(viewport.state().scroll_offset, 0.0);
    }

    #[test]
    fn content_shorter_than_track_width_has_no_minimum_zoom_restriction() {
        let min = ViewportModule::min_zoom_level(10, 5000.0, 1.0);
        assert_eq!(min, 100.0);
    }
}
