// crates/reeldeck-core/src/modules/playback.rs
//
// §4.7 "Playback": frame-based currency. Phase-1 leaf module — the canvas
// adapter and the timeline module both read its current frame, but it
// depends on neither.

use crate::broadcaster::{Broadcaster, SubscriptionId};

const MIN_RATE: f64 = 0.1;
const MAX_RATE: f64 = 10.0;
/// ±0.001 tolerance on the displayed rate so "1.00x" doesn't flicker (§4.7).
pub const RATE_DISPLAY_TOLERANCE: f64 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackState {
    pub current_frame: i64,
    pub is_playing: bool,
    pub playback_rate: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self { current_frame: 0, is_playing: false, playback_rate: 1.0 }
    }
}

pub struct PlaybackModule {
    state: PlaybackState,
    broadcaster: Broadcaster<PlaybackState>,
}

impl PlaybackModule {
    pub fn new() -> Self {
        Self { state: PlaybackState::default(), broadcaster: Broadcaster::new() }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Clamps to `>= 0`; frames are already integral (§4.7).
    pub fn set_current_frame(&mut self, frame: i64) {
        self.state.current_frame = frame.max(0);
        self.notify();
    }

    pub fn set_playback_rate(&mut self, rate: f64) {
        self.state.playback_rate = rate.clamp(MIN_RATE, MAX_RATE);
        self.notify();
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.state.is_playing = playing;
        self.notify();
    }

    /// `stop` = pause + seek 0 (§4.7).
    pub fn stop(&mut self) {
        self.state.is_playing = false;
        self.state.current_frame = 0;
        self.notify();
    }

    /// True if `rate` displays the same as the current rate within the
    /// glitch-avoidance tolerance (§4.7).
    pub fn rate_displays_as(&self, rate: f64) -> bool {
        (self.state.playback_rate - rate).abs() < RATE_DISPLAY_TOLERANCE
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&PlaybackState)>) -> SubscriptionId {
        self.broadcaster.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.broadcaster.unsubscribe(id);
    }

    fn notify(&self) {
        self.broadcaster.notify(&self.state);
    }
}

impl Default for PlaybackModule {
    fn default() -> Self {
        Self::new()
    }
}
