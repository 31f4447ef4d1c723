// crates/reeldeck-core/src/canvas.rs
//
// The canvas-engine adapter (§4.4, §6). `CanvasEngine` is the trait the
// core *requires*; the concrete compositor/decoder is an external
// collaborator out of scope (§1). `CanvasEngineAdapter` wraps any
// `Arc<dyn CanvasEngine>` and owns the single piece of state the spec calls
// out as subtle: the `seekTo` reentrancy lock that breaks the
// `UI -> model -> engine -> timeupdate -> model` cycle (§4.4, §5, §9).
//
// Grounded on `velocut-media/src/worker.rs`'s latest-wins request slot —
// same idea (a guard that makes a feedback loop one-directional), adapted
// from a cross-thread queue into the boolean-guard-plus-timer the spec
// specifies for a single-threaded cooperative scheduler (§5).

use crate::geometry::Rect;
use crate::time::frames_to_micros;
use crate::timeline_item::TimeRange;
use std::cell::{Cell, RefCell};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClipHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpriteHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasOptions {
    pub width: u32,
    pub height: u32,
    pub bg_color: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayOptions {
    pub start_frames: i64,
    pub end_frames: Option<i64>,
    pub playback_rate: f64,
}

/// A partial sprite-rect update, as carried by a `propsChange` event (§6).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RectPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub w: Option<f64>,
    pub h: Option<f64>,
    pub angle: Option<f64>,
}

/// Events the engine emits (§4.4, §6). Modeled as a drainable queue
/// (`CanvasEngine::poll_events`) rather than callbacks, mirroring the
/// teacher's `MediaWorker::rx.try_recv()` poll loop in `app.rs::poll_media` —
/// the natural shape for a single-threaded cooperative core that ticks once
/// per host frame (§5).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CanvasEvent {
    Playing,
    Paused,
    TimeUpdate { micros: i64 },
    PropsChange { sprite: SpriteHandle, rect: RectPatch, z_index: Option<i32>, opacity: Option<f64> },
}

/// The interface the core requires from the external compositor/decoder
/// (§6). A real implementation lives outside this crate (e.g.
/// `reeldeck-engine::null_canvas` for tests, or a browser-hosted WebCodecs
/// adapter in production).
pub trait CanvasEngine: Send + Sync {
    fn initialize_canvas(&self, opts: CanvasOptions);
    fn destroy_canvas(&self);
    fn is_ready(&self) -> bool;
    fn last_error(&self) -> Option<String>;

    fn create_mp4_clip(&self, bytes: &[u8]) -> Result<ClipHandle, String>;
    fn create_img_clip(&self, bytes: &[u8]) -> Result<ClipHandle, String>;
    fn create_audio_clip(&self, bytes: &[u8]) -> Result<ClipHandle, String>;
    fn clone_clip(&self, clip: ClipHandle) -> Result<ClipHandle, String>;
    fn destroy_clip(&self, clip: ClipHandle);
    /// `{width, height, duration}` once the clip's decode promise resolves —
    /// duration in microseconds (§4.1 step 4, §6).
    fn clip_metadata(&self, clip: ClipHandle) -> Option<(u32, u32, i64)>;

    fn create_sprite(&self, clip: ClipHandle) -> Result<SpriteHandle, String>;
    fn destroy_sprite(&self, sprite: SpriteHandle);
    fn add_sprite(&self, sprite: SpriteHandle) -> bool;
    fn remove_sprite(&self, sprite: SpriteHandle) -> bool;
    fn set_sprite_rect(&self, sprite: SpriteHandle, rect: Rect);
    fn set_sprite_z_index(&self, sprite: SpriteHandle, z_index: i32);
    fn set_sprite_opacity(&self, sprite: SpriteHandle, opacity: f64);
    fn set_sprite_visible(&self, sprite: SpriteHandle, visible: bool);
    fn set_sprite_time_range(&self, sprite: SpriteHandle, range: TimeRange);
    fn sprite_time_range(&self, sprite: SpriteHandle) -> Option<TimeRange>;

    fn play(&self, opts: PlayOptions);
    fn pause(&self);
    fn preview_frame(&self, micros: i64);

    /// Drain pending events (§4.4 "The engine's `timeupdate` event is the
    /// only input path from engine->model").
    fn poll_events(&self) -> Vec<CanvasEvent>;
}

const SEEK_UNLOCK: Duration = Duration::from_millis(10);

/// Owns the `seekTo` reentrancy lock and the readiness/availability checks
/// (§4.4). `seekTo` is the *only* path by which UI code changes the
/// playhead; this type enforces that by being the only place that calls
/// `CanvasEngine::preview_frame`.
pub struct CanvasEngineAdapter {
    engine: Arc<dyn CanvasEngine>,
    is_updating_time: Cell<bool>,
    unlock_at: Cell<Option<Instant>>,
    initialized: Cell<bool>,
    stored_error: RefCell<Option<String>>,
}

impl CanvasEngineAdapter {
    pub fn new(engine: Arc<dyn CanvasEngine>) -> Self {
        Self {
            engine,
            is_updating_time: Cell::new(false),
            unlock_at: Cell::new(None),
            initialized: Cell::new(false),
            stored_error: RefCell::new(None),
        }
    }

    pub fn initialize_canvas(&self, opts: CanvasOptions) {
        self.engine.initialize_canvas(opts);
        self.initialized.set(true);
    }

    pub fn is_web_av_ready(&self) -> bool {
        self.engine.is_ready()
    }

    /// §4.4 "`isAvailable()` requires canvas present, ready, and no stored error."
    pub fn is_available(&self) -> bool {
        self.initialized.get() && self.engine.is_ready() && self.stored_error.borrow().is_none()
    }

    pub fn stored_error(&self) -> Option<String> {
        self.stored_error.borrow().clone()
    }

    pub fn record_error(&self, message: impl Into<String>) {
        *self.stored_error.borrow_mut() = Some(message.into());
    }

    pub fn clear_error(&self) {
        *self.stored_error.borrow_mut() = None;
    }

    fn release_lock_if_elapsed(&self, now: Instant) {
        if let Some(deadline) = self.unlock_at.get() {
            if now >= deadline {
                self.is_updating_time.set(false);
                self.unlock_at.set(None);
            }
        }
    }

    /// The only path by which UI code may change the playhead (§4.4).
    /// Returns the frame the engine was asked to preview, or `None` when
    /// the engine is unavailable (§7 "Canvas-engine unavailable … become
    /// no-ops returning false").
    pub fn seek_to(&self, frames: i64, frame_rate: f64, now: Instant) -> bool {
        self.release_lock_if_elapsed(now);
        if !self.is_available() {
            tracing::warn!(frames, "seek_to: canvas engine unavailable, no-op");
            return false;
        }
        self.is_updating_time.set(true);
        self.unlock_at.set(Some(now + SEEK_UNLOCK));
        self.engine.preview_frame(frames_to_micros(frames, frame_rate));
        true
    }

    /// Process one `TimeUpdate` event. Returns `None` while the reentrancy
    /// lock from a same-origin `seek_to` is held, which is how the cycle in
    /// §9 is broken.
    pub fn on_time_update(&self, micros: i64, frame_rate: f64, now: Instant) -> Option<i64> {
        self.release_lock_if_elapsed(now);
        if self.is_updating_time.get() {
            return None;
        }
        Some(crate::time::micros_to_frames(micros, frame_rate))
    }

    pub fn play(&self, opts: PlayOptions) -> bool {
        if !self.is_available() {
            tracing::warn!("play: canvas engine unavailable, no-op");
            return false;
        }
        self.engine.play(opts);
        true
    }

    pub fn pause(&self) -> bool {
        if !self.is_available() {
            tracing::warn!("pause: canvas engine unavailable, no-op");
            return false;
        }
        self.engine.pause();
        true
    }

    pub fn add_sprite(&self, sprite: SpriteHandle) -> bool {
        if !self.is_available() {
            tracing::warn!("add_sprite: canvas engine unavailable, no-op");
            return false;
        }
        self.engine.add_sprite(sprite)
    }

    pub fn remove_sprite(&self, sprite: SpriteHandle) -> bool {
        self.engine.remove_sprite(sprite)
    }

    pub fn poll_events(&self) -> Vec<CanvasEvent> {
        self.engine.poll_events()
    }

    pub fn engine(&self) -> &Arc<dyn CanvasEngine> {
        &self.engine
    }

    /// §4.4 destroy/recreate: destroying drops the engine's own sprite/clip
    /// state. `TimelineModule::all()` is already the item snapshot a caller
    /// needs — items, not sprites, are canonical — and
    /// `TimelineModule::clear_sprite_wiring` drops this side's now-stale
    /// sprite handles. Re-wiring is not automatic: the caller must re-run
    /// acquisition for each previously-ready item and call `update_sprite`
    /// again once `initialize_canvas` runs on the replacement engine.
    pub fn destroy_canvas(&self) {
        self.engine.destroy_canvas();
        self.initialized.set(false);
    }
}
