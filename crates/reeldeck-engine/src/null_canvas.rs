// crates/reeldeck-engine/src/null_canvas.rs
//
// `NullCanvasEngine`: a reference `CanvasEngine` (§4.4, §6) sufficient for
// integration tests and for embedders that want a working default before
// wiring a real browser-side compositor. Every clip is "ready" immediately
// with a synthetic thumbnail and fixed dimensions — real decode is out of
// scope (§1 Non-goals: rendering/encoding).
//
// Thumbnail generation is grounded on `velocut-media/src/probe.rs`'s
// thumbnail-scaling shape (fixed 320px-wide RGBA frame), swapped to the
// `image` crate's encoder since there's no real decoder to pull frames
// from here.

use image::{ImageBuffer, Rgba};
use parking_lot::Mutex;
use reeldeck_core::canvas::{
    CanvasEngine, CanvasEvent, CanvasOptions, ClipHandle, PlayOptions, SpriteHandle,
};
use reeldeck_core::geometry::Rect;
use reeldeck_core::timeline_item::TimeRange;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const THUMBNAIL_WIDTH: u32 = 320;
const THUMBNAIL_HEIGHT: u32 = 180;
/// Synthetic clip duration handed back by [`NullCanvasEngine::clip_metadata`]
/// when the caller didn't probe a real duration first — five seconds.
const DEFAULT_CLIP_DURATION_MICROS: i64 = 5_000_000;

struct ClipInfo {
    width: u32,
    height: u32,
    duration_micros: i64,
}

struct SpriteState {
    rect: Rect,
    z_index: i32,
    opacity: f64,
    visible: bool,
    time_range: Option<TimeRange>,
}

/// Thumbnail generation is pluggable rather than part of `CanvasEngine`
/// itself — real compositors (e.g. a browser WebCodecs adapter) may grab a
/// frame through an entirely different path than `reeldeck-engine`'s
/// reference implementation does. `worker::MediaWorker` holds one of these
/// alongside its `Arc<dyn CanvasEngine>`.
pub trait ThumbnailGenerator: Send + Sync {
    fn generate(&self, clip: ClipHandle) -> Result<Vec<u8>, String>;
}

impl ThumbnailGenerator for NullCanvasEngine {
    fn generate(&self, clip: ClipHandle) -> Result<Vec<u8>, String> {
        self.render_thumbnail(clip)
    }
}

/// A synchronous, in-memory stand-in for a real compositor/decoder. Safe to
/// construct more than once; each instance tracks its own clip/sprite
/// tables so tests can run in parallel without sharing state.
pub struct NullCanvasEngine {
    next_handle: AtomicU64,
    clips: Mutex<HashMap<u64, ClipInfo>>,
    sprites: Mutex<HashMap<u64, SpriteState>>,
    events: Mutex<Vec<CanvasEvent>>,
    ready: Mutex<bool>,
}

impl NullCanvasEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_handle: AtomicU64::new(1),
            clips: Mutex::new(HashMap::new()),
            sprites: Mutex::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
            ready: Mutex::new(false),
        })
    }

    fn next_id(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }

    fn create_clip(&self, width: u32, height: u32) -> Result<ClipHandle, String> {
        let id = self.next_id();
        self.clips.lock().insert(
            id,
            ClipInfo { width, height, duration_micros: DEFAULT_CLIP_DURATION_MICROS },
        );
        Ok(ClipHandle(id))
    }

    /// Renders a flat-colour `320x180` RGBA thumbnail and JPEG-encodes it —
    /// the synthetic-thumbnail half of §4.1 step 4's `{width, height,
    /// thumbnailUrl}` triple. The colour is derived from the clip handle so
    /// repeated calls in a test are visibly distinct.
    pub fn render_thumbnail(&self, clip: ClipHandle) -> Result<Vec<u8>, String> {
        let seed = (clip.0 % 256) as u8;
        let buffer = ImageBuffer::from_fn(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, |_x, _y| {
            Rgba([seed, 128u8.wrapping_sub(seed), 200u8, 255])
        });
        let mut bytes: Vec<u8> = Vec::new();
        image::DynamicImage::ImageRgba8(buffer)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
            .map_err(|e| format!("thumbnail encode failed: {e}"))?;
        Ok(bytes)
    }
}

impl Default for NullCanvasEngine {
    fn default() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            clips: Mutex::new(HashMap::new()),
            sprites: Mutex::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
            ready: Mutex::new(false),
        }
    }
}

impl CanvasEngine for NullCanvasEngine {
    fn initialize_canvas(&self, _opts: CanvasOptions) {
        *self.ready.lock() = true;
    }

    fn destroy_canvas(&self) {
        *self.ready.lock() = false;
        self.clips.lock().clear();
        self.sprites.lock().clear();
    }

    fn is_ready(&self) -> bool {
        *self.ready.lock()
    }

    fn last_error(&self) -> Option<String> {
        None
    }

    fn create_mp4_clip(&self, _bytes: &[u8]) -> Result<ClipHandle, String> {
        self.create_clip(1920, 1080)
    }

    fn create_img_clip(&self, _bytes: &[u8]) -> Result<ClipHandle, String> {
        self.create_clip(1920, 1080)
    }

    fn create_audio_clip(&self, _bytes: &[u8]) -> Result<ClipHandle, String> {
        // Audio clips have no visual dimensions; 0x0 signals "non-visual"
        // to callers that inspect clip_metadata for layout purposes.
        self.create_clip(0, 0)
    }

    fn clone_clip(&self, clip: ClipHandle) -> Result<ClipHandle, String> {
        let info = self
            .clips
            .lock()
            .get(&clip.0)
            .map(|c| (c.width, c.height))
            .ok_or_else(|| format!("unknown clip {}", clip.0))?;
        self.create_clip(info.0, info.1)
    }

    fn destroy_clip(&self, clip: ClipHandle) {
        self.clips.lock().remove(&clip.0);
    }

    fn clip_metadata(&self, clip: ClipHandle) -> Option<(u32, u32, i64)> {
        self.clips.lock().get(&clip.0).map(|c| (c.width, c.height, c.duration_micros))
    }

    fn create_sprite(&self, clip: ClipHandle) -> Result<SpriteHandle, String> {
        if !self.clips.lock().contains_key(&clip.0) {
            return Err(format!("unknown clip {}", clip.0));
        }
        let id = self.next_id();
        self.sprites.lock().insert(
            id,
            SpriteState {
                rect: Rect { x: 0.0, y: 0.0, width: 0.0, height: 0.0, rotation: 0.0 },
                z_index: 0,
                opacity: 1.0,
                visible: true,
                time_range: None,
            },
        );
        Ok(SpriteHandle(id))
    }

    fn destroy_sprite(&self, sprite: SpriteHandle) {
        self.sprites.lock().remove(&sprite.0);
    }

    fn add_sprite(&self, sprite: SpriteHandle) -> bool {
        self.sprites.lock().contains_key(&sprite.0)
    }

    fn remove_sprite(&self, sprite: SpriteHandle) -> bool {
        self.sprites.lock().contains_key(&sprite.0)
    }

    fn set_sprite_rect(&self, sprite: SpriteHandle, rect: Rect) {
        if let Some(s) = self.sprites.lock().get_mut(&sprite.0) {
            s.rect = rect;
        }
    }

    fn set_sprite_z_index(&self, sprite: SpriteHandle, z_index: i32) {
        if let Some(s) = self.sprites.lock().get_mut(&sprite.0) {
            s.z_index = z_index;
        }
    }

    fn set_sprite_opacity(&self, sprite: SpriteHandle, opacity: f64) {
        if let Some(s) = self.sprites.lock().get_mut(&sprite.0) {
            s.opacity = opacity;
        }
    }

    fn set_sprite_visible(&self, sprite: SpriteHandle, visible: bool) {
        if let Some(s) = self.sprites.lock().get_mut(&sprite.0) {
            s.visible = visible;
        }
    }

    fn set_sprite_time_range(&self, sprite: SpriteHandle, range: TimeRange) {
        if let Some(s) = self.sprites.lock().get_mut(&sprite.0) {
            s.time_range = Some(range);
        }
    }

    fn sprite_time_range(&self, sprite: SpriteHandle) -> Option<TimeRange> {
        self.sprites.lock().get(&sprite.0).and_then(|s| s.time_range.clone())
    }

    fn play(&self, _opts: PlayOptions) {
        self.events.lock().push(CanvasEvent::Playing);
    }

    fn pause(&self) {
        self.events.lock().push(CanvasEvent::Paused);
    }

    fn preview_frame(&self, micros: i64) {
        self.events.lock().push(CanvasEvent::TimeUpdate { micros });
    }

    fn poll_events(&self) -> Vec<CanvasEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clips_are_ready_immediately_with_fixed_dimensions() {
        let engine = NullCanvasEngine::new();
        engine.initialize_canvas(CanvasOptions { width: 1920, height: 1080, bg_color: 0 });
        let clip = engine.create_mp4_clip(b"fake bytes").unwrap();
        let (w, h, dur) = engine.clip_metadata(clip).unwrap();
        assert_eq!((w, h), (1920, 1080));
        assert!(dur > 0);
    }

    #[test]
    fn render_thumbnail_produces_a_decodable_jpeg() {
        let engine = NullCanvasEngine::new();
        let clip = engine.create_mp4_clip(b"fake bytes").unwrap();
        let jpeg = engine.render_thumbnail(clip).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), THUMBNAIL_WIDTH);
        assert_eq!(decoded.height(), THUMBNAIL_HEIGHT);
    }

    #[test]
    fn sprite_add_remove_round_trips() {
        let engine = NullCanvasEngine::new();
        engine.initialize_canvas(CanvasOptions { width: 1920, height: 1080, bg_color: 0 });
        let clip = engine.create_mp4_clip(b"fake bytes").unwrap();
        let sprite = engine.create_sprite(clip).unwrap();
        assert!(engine.add_sprite(sprite));
        engine.destroy_sprite(sprite);
        assert!(!engine.add_sprite(sprite));
    }
}
