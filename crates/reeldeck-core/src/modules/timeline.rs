// crates/reeldeck-core/src/modules/timeline.rs
//
// §4.2 Timeline Module — the canonical bidirectional sprite<->item sync
// contract (§9 "model as an explicit mediator in the timeline module").
// Phase-2: constructed with a reference to the phase-1 canvas adapter.
//
// Sprite wiring is split into its own operation (`update_sprite`, named in
// §4.2's public-operations list) rather than folded into `add`, because the
// sprite for a `ready` item is created by the media-acquisition pipeline
// (`reeldeck-engine::worker`) which runs after the item may already have
// been added in `loading` state.

use crate::broadcaster::{Broadcaster, SubscriptionId};
use crate::canvas::{CanvasEngineAdapter, RectPatch, SpriteHandle};
use crate::error::{CoreError, CoreResult};
use crate::geometry::{canvas_to_project, project_to_canvas, resize_centered, Rect};
use crate::ids::{TimelineItemId, TrackId};
use crate::timeline_item::{AudioConfig, ItemConfig, Keyframe, TextStyle, TimeRange, TimelineItem, TimelineStatus, VisualConfigPatch};
use std::collections::HashMap;
use std::sync::Arc;

/// §9 Open Question "timelineDurationFrames auto-expansion": how far past
/// the furthest item's end the persisted duration grows, so a drop at the
/// very end of the timeline never needs a length check to succeed.
pub const TIMELINE_DURATION_BUFFER_FRAMES: i64 = 300;

#[derive(Clone, Debug, PartialEq)]
pub enum TimelineEvent {
    Added(TimelineItemId),
    Removed(TimelineItemId),
    Updated(TimelineItemId),
}

pub struct TimelineModule {
    canvas: Arc<CanvasEngineAdapter>,
    items: Vec<TimelineItem>,
    sprite_by_item: HashMap<TimelineItemId, SpriteHandle>,
    item_by_sprite: HashMap<SpriteHandle, TimelineItemId>,
    broadcaster: Broadcaster<TimelineEvent>,
}

impl TimelineModule {
    pub fn new(canvas: Arc<CanvasEngineAdapter>) -> Self {
        Self {
            canvas,
            items: Vec::new(),
            sprite_by_item: HashMap::new(),
            item_by_sprite: HashMap::new(),
            broadcaster: Broadcaster::new(),
        }
    }

    pub fn all(&self) -> &[TimelineItem] {
        &self.items
    }

    pub fn get(&self, id: TimelineItemId) -> Option<&TimelineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Returns the item only when it is actually `ready` (§4.2 `getReady`).
    pub fn get_ready(&self, id: TimelineItemId) -> Option<&TimelineItem> {
        self.get(id).filter(|i| i.status == TimelineStatus::Ready)
    }

    fn get_mut(&mut self, id: TimelineItemId) -> CoreResult<&mut TimelineItem> {
        self.items.iter_mut().find(|i| i.id == id).ok_or(CoreError::TimelineItemNotFound(id))
    }

    /// Push an item. Sprite wiring (for items constructed already `ready`)
    /// is a separate call to [`Self::update_sprite`] (§4.2).
    pub fn add(&mut self, item: TimelineItem) -> TimelineItemId {
        let id = item.id;
        self.items.push(item);
        self.broadcaster.notify(&TimelineEvent::Added(id));
        id
    }

    /// Wire (or rewire) the sprite backing a `ready` item: mirrors the
    /// owning track's visibility/mute state onto the sprite, and registers
    /// the bidirectional sync mapping (§4.2 add-semantics b/c).
    pub fn update_sprite(
        &mut self,
        id: TimelineItemId,
        sprite: SpriteHandle,
        track_visible: bool,
    ) -> CoreResult<()> {
        let item = self.get_mut(id)?;
        item.has_sprite = true;
        item.status = TimelineStatus::Ready;
        let time_range = item.time_range;
        self.sprite_by_item.insert(id, sprite);
        self.item_by_sprite.insert(sprite, id);
        self.canvas.add_sprite(sprite);
        self.canvas.engine().set_sprite_visible(sprite, track_visible);
        self.canvas.engine().set_sprite_time_range(sprite, time_range);
        self.broadcaster.notify(&TimelineEvent::Updated(id));
        Ok(())
    }

    /// Negative positions clamp to 0; duration is preserved (§4.2).
    pub fn update_position(&mut self, id: TimelineItemId, new_frame: i64, new_track_id: Option<TrackId>) -> CoreResult<()> {
        let sprite = self.sprite_by_item.get(&id).copied();
        let item = self.get_mut(id)?;
        item.time_range = item.time_range.moved_to(new_frame);
        if let Some(track_id) = new_track_id {
            item.track_id = track_id;
        }
        let time_range = item.time_range;
        if let Some(sprite) = sprite {
            self.canvas.engine().set_sprite_time_range(sprite, time_range);
        }
        self.broadcaster.notify(&TimelineEvent::Updated(id));
        Ok(())
    }

    /// Programmatic transform edit: writes the sprite rect directly
    /// (applying centre-preserving resize when width/height change) and
    /// mirrors into `item.config`, matching §4.2's "the same event-flow
    /// then updates the item" without requiring a separate event tick for
    /// a programmatic (non-drag) write.
    pub fn update_transform(
        &mut self,
        id: TimelineItemId,
        patch: VisualConfigPatch,
        canvas_width: f64,
        canvas_height: f64,
    ) -> CoreResult<()> {
        let sprite = self.sprite_by_item.get(&id).copied();
        let item = self.get_mut(id)?;
        let visual = item.config.visual_mut().ok_or_else(|| CoreError::Validation {
            message: "item has no visual config".into(),
        })?;
        let resizing = patch.width.is_some() || patch.height.is_some();
        let mut updated = patch.apply(*visual);
        if resizing {
            let current = Rect { x: visual.x, y: visual.y, width: visual.width, height: visual.height, rotation: visual.rotation };
            let resized = resize_centered(current, updated.width, updated.height);
            updated.x = resized.x;
            updated.y = resized.y;
        }
        *visual = updated;
        let visual = *visual;

        if let Some(sprite) = sprite {
            let project_rect = Rect { x: visual.x, y: visual.y, width: visual.width, height: visual.height, rotation: visual.rotation };
            let canvas_rect = project_to_canvas(project_rect, canvas_width, canvas_height);
            self.canvas.engine().set_sprite_rect(sprite, canvas_rect);
            if patch.z_index.is_some() {
                self.canvas.engine().set_sprite_z_index(sprite, visual.z_index);
            }
            if patch.opacity.is_some() {
                self.canvas.engine().set_sprite_opacity(sprite, visual.opacity);
            }
        }
        self.broadcaster.notify(&TimelineEvent::Updated(id));
        Ok(())
    }

    /// Audio properties bypass the sprite event loop entirely (§4.2).
    pub fn set_audio_config(&mut self, id: TimelineItemId, audio: AudioConfig) -> CoreResult<()> {
        let item = self.get_mut(id)?;
        match &mut item.config {
            ItemConfig::Audio(a) => *a = audio,
            ItemConfig::VideoAndAudio { audio: a, .. } => *a = audio,
            _ => return Err(CoreError::Validation { message: "item has no audio config".into() }),
        }
        self.broadcaster.notify(&TimelineEvent::Updated(id));
        Ok(())
    }

    /// Apply a `propsChange` event from the canvas engine (§4.2 "UI ->
    /// sprite -> item"). `opacity` is mirrored explicitly per §4.2's note
    /// that the engine historically does not fire for opacity alone.
    pub fn apply_props_change(
        &mut self,
        sprite: SpriteHandle,
        rect_patch: RectPatch,
        z_index: Option<i32>,
        opacity: Option<f64>,
        canvas_width: f64,
        canvas_height: f64,
    ) -> CoreResult<()> {
        let id = *self.item_by_sprite.get(&sprite).ok_or(CoreError::Validation {
            message: "propsChange for unregistered sprite".into(),
        })?;
        let item = self.get_mut(id)?;
        let visual = item.config.visual_mut().ok_or_else(|| CoreError::Validation {
            message: "item has no visual config".into(),
        })?;
        let canvas_rect = Rect { x: visual.x, y: visual.y, width: visual.width, height: visual.height, rotation: visual.rotation };
        let canvas_rect = project_to_canvas(canvas_rect, canvas_width, canvas_height);
        let canvas_rect = Rect {
            x: rect_patch.x.unwrap_or(canvas_rect.x),
            y: rect_patch.y.unwrap_or(canvas_rect.y),
            width: rect_patch.w.unwrap_or(canvas_rect.width),
            height: rect_patch.h.unwrap_or(canvas_rect.height),
            rotation: rect_patch.angle.unwrap_or(canvas_rect.rotation),
        };
        let project_rect = canvas_to_project(canvas_rect, canvas_width, canvas_height);
        visual.x = project_rect.x;
        visual.y = project_rect.y;
        visual.width = project_rect.width;
        visual.height = project_rect.height;
        visual.rotation = project_rect.rotation;
        if let Some(z) = z_index {
            visual.z_index = z;
        }
        if let Some(o) = opacity {
            visual.opacity = o;
        }
        self.broadcaster.notify(&TimelineEvent::Updated(id));
        Ok(())
    }

    /// §4.2 remove semantics: detach (even defensively for non-ready items
    /// with a sprite), destroy, deregister, splice out. Sprite failures are
    /// logged but never block removal.
    pub fn remove(&mut self, id: TimelineItemId) -> CoreResult<()> {
        let position = self.items.iter().position(|i| i.id == id).ok_or(CoreError::TimelineItemNotFound(id))?;
        if let Some(sprite) = self.sprite_by_item.remove(&id) {
            self.item_by_sprite.remove(&sprite);
            if !self.canvas.remove_sprite(sprite) {
                tracing::warn!(timeline_item_id = %id, "sprite removal reported failure; proceeding with item removal");
            }
            self.canvas.engine().destroy_sprite(sprite);
        }
        self.items.remove(position);
        self.broadcaster.notify(&TimelineEvent::Removed(id));
        Ok(())
    }

    /// Cascade hook for `TracksModule::remove` / `MediaModule::remove`
    /// (§4.1 removal cascade, §9 registry wiring): drop every item
    /// referencing the given track or media id.
    pub fn remove_all_on_track(&mut self, track_id: TrackId) {
        let ids: Vec<_> = self.items.iter().filter(|i| i.track_id == track_id).map(|i| i.id).collect();
        for id in ids {
            let _ = self.remove(id);
        }
    }

    pub fn remove_all_for_media(&mut self, media_id: crate::ids::MediaId) {
        let ids: Vec<_> = self.items.iter().filter(|i| i.media_id == Some(media_id)).map(|i| i.id).collect();
        for id in ids {
            let _ = self.remove(id);
        }
    }

    /// Set `timelineStatus = error` for items referencing media that never
    /// became ready (§4.5 step 5, §8 scenario S5).
    pub fn mark_error_for_media(&mut self, media_id: crate::ids::MediaId) {
        for item in self.items.iter_mut().filter(|i| i.media_id == Some(media_id)) {
            item.status = TimelineStatus::Error;
        }
    }

    /// Replace an item's time range wholesale, validating it first — the
    /// primitive `resizeTimelineItemWithHistory` builds on (§4.3).
    pub fn set_time_range(&mut self, id: TimelineItemId, new_range: TimeRange) -> CoreResult<()> {
        new_range.validate()?;
        let sprite = self.sprite_by_item.get(&id).copied();
        let item = self.get_mut(id)?;
        item.time_range = new_range;
        if let Some(sprite) = sprite {
            self.canvas.engine().set_sprite_time_range(sprite, new_range);
        }
        self.broadcaster.notify(&TimelineEvent::Updated(id));
        Ok(())
    }

    /// Apply a playback-rate change, rescaling duration and keyframes
    /// (§8 S3).
    pub fn set_playback_rate(&mut self, id: TimelineItemId, new_rate: f64) -> CoreResult<()> {
        let sprite = self.sprite_by_item.get(&id).copied();
        let item = self.get_mut(id)?;
        let (new_range, scale) = item.time_range.with_playback_rate(new_rate)?;
        item.time_range = new_range;
        item.animation = item.animation.rescaled(scale);
        if let Some(sprite) = sprite {
            self.canvas.engine().set_sprite_time_range(sprite, new_range);
        }
        self.broadcaster.notify(&TimelineEvent::Updated(id));
        Ok(())
    }

    pub fn sprite_for(&self, id: TimelineItemId) -> Option<SpriteHandle> {
        self.sprite_by_item.get(&id).copied()
    }

    pub fn time_range(&self, time_range: TimeRange) -> TimeRange {
        time_range
    }

    pub fn keyframes(&self, id: TimelineItemId) -> CoreResult<&[Keyframe]> {
        Ok(&self.get(id).ok_or(CoreError::TimelineItemNotFound(id))?.animation.keyframes)
    }

    /// Replace an item's keyframe list wholesale — the primitive the
    /// keyframe-editing `*WithHistory` wrappers build on (§4.3).
    pub fn set_keyframes(&mut self, id: TimelineItemId, keyframes: Vec<Keyframe>) -> CoreResult<()> {
        let item = self.get_mut(id)?;
        item.animation.keyframes = keyframes;
        self.broadcaster.notify(&TimelineEvent::Updated(id));
        Ok(())
    }

    /// Mutate a text item's style in place; errors for any other item kind.
    pub fn set_text_style(&mut self, id: TimelineItemId, style: TextStyle) -> CoreResult<()> {
        let item = self.get_mut(id)?;
        match &mut item.config {
            ItemConfig::Text { style: s, .. } => *s = style,
            _ => return Err(CoreError::Validation { message: "item has no text style".into() }),
        }
        self.broadcaster.notify(&TimelineEvent::Updated(id));
        Ok(())
    }

    /// §9 Open Question: the persisted `timelineDurationFrames` never
    /// shrinks below the furthest item's end plus a fixed buffer, so a drop
    /// at the tail of the timeline is never rejected for insufficient
    /// length. Callers combine this with the previously-saved value (see
    /// `modules::project::save_current_project`) so the setting is
    /// monotonically non-decreasing across saves.
    pub fn required_timeline_duration_frames(&self) -> i64 {
        let content_end = self.items.iter().map(|i| i.time_range.timeline_end()).max().unwrap_or(0);
        content_end + TIMELINE_DURATION_BUFFER_FRAMES
    }

    /// §4.4 destroy/recreate: drop sprite handles the just-destroyed engine
    /// no longer owns. Items are untouched — `all()` is already the
    /// snapshot a caller needs — but a previously-`ready` item loses its
    /// sprite wiring and reverts to `loading` until the caller re-runs
    /// acquisition and calls `update_sprite` again on the replacement
    /// engine. This module has no stored clip bytes to rebuild sprites
    /// from on its own.
    pub fn clear_sprite_wiring(&mut self) {
        for item in self.items.iter_mut() {
            if item.has_sprite {
                item.has_sprite = false;
                if item.status == TimelineStatus::Ready {
                    item.status = TimelineStatus::Loading;
                }
            }
        }
        self.sprite_by_item.clear();
        self.item_by_sprite.clear();
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&TimelineEvent)>) -> SubscriptionId {
        self.broadcaster.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.broadcaster.unsubscribe(id);
    }
}
