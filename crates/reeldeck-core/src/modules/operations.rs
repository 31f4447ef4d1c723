// crates/reeldeck-core/src/modules/operations.rs
//
// §4.3 "Operations wrappers": the high-level `*WithHistory` entry points
// that read current state, apply a change-tolerance threshold, build a
// concrete [`Command`], and execute it through [`HistoryModule`]. No
// directly retrievable teacher implementation exists for this layer
// either; grounded on the same `app.rs::process_command` dispatch idiom
// as `history.rs`, generalized to the tolerance table in §4.3.
//
// Commands close over `Rc<RefCell<_>>` handles to the modules they mutate
// rather than holding `&mut` references, since a `Command` must be able to
// re-run its `execute`/`undo` on demand, long after the call that
// constructed it returned.

use super::history::{Command, HistoryModule};
use super::notifications::NotificationsModule;
use super::selection::{SelectionMode, SelectionModule};
use super::timeline::TimelineModule;
use super::tracks::TracksModule;
use crate::error::{CoreError, CoreResult};
use crate::ids::{CommandId, TimelineItemId, TrackId};
use crate::timeline_item::{Keyframe, TextStyle, TimeRange, TimelineItem, VisualConfig, VisualConfigPatch};
use crate::track::{Track, TrackKind};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// §4.3 tolerance table.
pub mod tolerance {
    pub const POSITION_FRAMES: i64 = 1;
    pub const GEOMETRY_PX: f64 = 0.1;
    pub const ANGLE_OR_OPACITY: f64 = 0.001;
    pub const VOLUME: f64 = 0.01;
    pub const GAIN_DB: f64 = 0.1;
}

const SELECTION_DEDUP_WINDOW: Duration = Duration::from_millis(100);

// ---- Timeline item commands -------------------------------------------

struct AddTimelineItemCommand {
    timeline: Rc<RefCell<TimelineModule>>,
    item: TimelineItem,
}

impl fmt::Debug for AddTimelineItemCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AddTimelineItemCommand({})", self.item.id)
    }
}

impl Command for AddTimelineItemCommand {
    fn description(&self) -> String {
        format!("add timeline item {}", self.item.id)
    }
    fn execute(&mut self) -> CoreResult<()> {
        self.timeline.borrow_mut().add(self.item.clone());
        Ok(())
    }
    fn undo(&mut self) -> CoreResult<()> {
        self.timeline.borrow_mut().remove(self.item.id)
    }
}

struct MoveTimelineItemCommand {
    timeline: Rc<RefCell<TimelineModule>>,
    id: TimelineItemId,
    before_frame: i64,
    before_track: TrackId,
    after_frame: i64,
    after_track: TrackId,
}

impl fmt::Debug for MoveTimelineItemCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MoveTimelineItemCommand({})", self.id)
    }
}

impl Command for MoveTimelineItemCommand {
    fn description(&self) -> String {
        format!("move timeline item {}", self.id)
    }
    fn execute(&mut self) -> CoreResult<()> {
        self.timeline.borrow_mut().update_position(self.id, self.after_frame, Some(self.after_track))
    }
    fn undo(&mut self) -> CoreResult<()> {
        self.timeline.borrow_mut().update_position(self.id, self.before_frame, Some(self.before_track))
    }
}

struct ResizeTimelineItemCommand {
    timeline: Rc<RefCell<TimelineModule>>,
    id: TimelineItemId,
    before: TimeRange,
    after: TimeRange,
}

impl fmt::Debug for ResizeTimelineItemCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResizeTimelineItemCommand({})", self.id)
    }
}

impl Command for ResizeTimelineItemCommand {
    fn description(&self) -> String {
        format!("resize timeline item {}", self.id)
    }
    fn execute(&mut self) -> CoreResult<()> {
        self.timeline.borrow_mut().set_time_range(self.id, self.after)
    }
    fn undo(&mut self) -> CoreResult<()> {
        self.timeline.borrow_mut().set_time_range(self.id, self.before)
    }
}

struct UpdateTransformCommand {
    timeline: Rc<RefCell<TimelineModule>>,
    id: TimelineItemId,
    before: VisualConfig,
    after_patch: VisualConfigPatch,
    canvas_width: f64,
    canvas_height: f64,
}

impl fmt::Debug for UpdateTransformCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UpdateTransformCommand({})", self.id)
    }
}

impl Command for UpdateTransformCommand {
    fn description(&self) -> String {
        format!("update transform {}", self.id)
    }
    fn execute(&mut self) -> CoreResult<()> {
        self.timeline.borrow_mut().update_transform(self.id, self.after_patch, self.canvas_width, self.canvas_height)
    }
    fn undo(&mut self) -> CoreResult<()> {
        let revert = VisualConfigPatch {
            x: Some(self.before.x),
            y: Some(self.before.y),
            width: Some(self.before.width),
            height: Some(self.before.height),
            rotation: Some(self.before.rotation),
            opacity: Some(self.before.opacity),
            z_index: Some(self.before.z_index),
        };
        self.timeline.borrow_mut().update_transform(self.id, revert, self.canvas_width, self.canvas_height)
    }
}

// ---- Track commands -----------------------------------------------------

struct RenameTrackCommand {
    tracks: Rc<RefCell<TracksModule>>,
    id: TrackId,
    before: String,
    after: String,
}

impl fmt::Debug for RenameTrackCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RenameTrackCommand({})", self.id)
    }
}

impl Command for RenameTrackCommand {
    fn description(&self) -> String {
        format!("rename track {}", self.id)
    }
    fn execute(&mut self) -> CoreResult<()> {
        self.tracks.borrow_mut().set_name(self.id, self.after.clone())
    }
    fn undo(&mut self) -> CoreResult<()> {
        self.tracks.borrow_mut().set_name(self.id, self.before.clone())
    }
}

struct SetTrackVisibilityCommand {
    tracks: Rc<RefCell<TracksModule>>,
    id: TrackId,
    before: bool,
    after: bool,
}

impl fmt::Debug for SetTrackVisibilityCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SetTrackVisibilityCommand({})", self.id)
    }
}

impl Command for SetTrackVisibilityCommand {
    fn description(&self) -> String {
        format!("set track {} visibility", self.id)
    }
    fn execute(&mut self) -> CoreResult<()> {
        self.tracks.borrow_mut().set_visible(self.id, self.after)
    }
    fn undo(&mut self) -> CoreResult<()> {
        self.tracks.borrow_mut().set_visible(self.id, self.before)
    }
}

struct AddTrackCommand {
    tracks: Rc<RefCell<TracksModule>>,
    track: Track,
}

impl fmt::Debug for AddTrackCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AddTrackCommand({})", self.track.id)
    }
}

impl Command for AddTrackCommand {
    fn description(&self) -> String {
        format!("add track {}", self.track.id)
    }
    fn execute(&mut self) -> CoreResult<()> {
        self.tracks.borrow_mut().add_with_id(self.track.clone());
        Ok(())
    }
    fn undo(&mut self) -> CoreResult<()> {
        self.tracks.borrow_mut().remove(self.track.id)
    }
}

/// Removing a track cascades to every timeline item on it (§4.1 removal
/// cascade); undo restores both the track and those items under their
/// original ids.
struct RemoveTrackCommand {
    tracks: Rc<RefCell<TracksModule>>,
    timeline: Rc<RefCell<TimelineModule>>,
    track: Track,
    items: Vec<TimelineItem>,
}

impl fmt::Debug for RemoveTrackCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RemoveTrackCommand({})", self.track.id)
    }
}

impl Command for RemoveTrackCommand {
    fn description(&self) -> String {
        format!("remove track {}", self.track.id)
    }
    fn execute(&mut self) -> CoreResult<()> {
        self.tracks.borrow_mut().remove(self.track.id)?;
        self.timeline.borrow_mut().remove_all_on_track(self.track.id);
        Ok(())
    }
    fn undo(&mut self) -> CoreResult<()> {
        self.tracks.borrow_mut().add_with_id(self.track.clone());
        for item in &self.items {
            self.timeline.borrow_mut().add(item.clone());
        }
        Ok(())
    }
}

struct SetSelectionCommand {
    selection: Rc<RefCell<SelectionModule>>,
    before: Vec<TimelineItemId>,
    after: Vec<TimelineItemId>,
}

impl fmt::Debug for SetSelectionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SetSelectionCommand({} ids)", self.after.len())
    }
}

impl Command for SetSelectionCommand {
    fn description(&self) -> String {
        "change selection".to_string()
    }
    fn execute(&mut self) -> CoreResult<()> {
        self.selection.borrow_mut().apply(&self.after, SelectionMode::Replace);
        Ok(())
    }
    fn undo(&mut self) -> CoreResult<()> {
        self.selection.borrow_mut().apply(&self.before, SelectionMode::Replace);
        Ok(())
    }
}

struct SetKeyframesCommand {
    timeline: Rc<RefCell<TimelineModule>>,
    id: TimelineItemId,
    before: Vec<Keyframe>,
    after: Vec<Keyframe>,
}

impl fmt::Debug for SetKeyframesCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SetKeyframesCommand({})", self.id)
    }
}

impl Command for SetKeyframesCommand {
    fn description(&self) -> String {
        format!("edit keyframes for {}", self.id)
    }
    fn execute(&mut self) -> CoreResult<()> {
        self.timeline.borrow_mut().set_keyframes(self.id, self.after.clone())
    }
    fn undo(&mut self) -> CoreResult<()> {
        self.timeline.borrow_mut().set_keyframes(self.id, self.before.clone())
    }
}

struct UpdateTextStyleCommand {
    timeline: Rc<RefCell<TimelineModule>>,
    id: TimelineItemId,
    before: TextStyle,
    after: TextStyle,
}

impl fmt::Debug for UpdateTextStyleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UpdateTextStyleCommand({})", self.id)
    }
}

impl Command for UpdateTextStyleCommand {
    fn description(&self) -> String {
        format!("update text style {}", self.id)
    }
    fn execute(&mut self) -> CoreResult<()> {
        self.timeline.borrow_mut().set_text_style(self.id, self.after.clone())
    }
    fn undo(&mut self) -> CoreResult<()> {
        self.timeline.borrow_mut().set_text_style(self.id, self.before.clone())
    }
}

/// Pure simulation of [`SelectionModule::apply`]'s mode logic, used by
/// `set_selection_with_history` to compute the resulting set *before*
/// constructing the command (§9: `HistoryModule::execute` runs
/// `Command::execute` itself, so the wrapper must only read state).
fn simulate_selection(current: &HashSet<TimelineItemId>, ids: &[TimelineItemId], mode: SelectionMode) -> Vec<TimelineItemId> {
    match mode {
        SelectionMode::Replace => ids.to_vec(),
        SelectionMode::Toggle => {
            let mut result: HashSet<TimelineItemId> = current.clone();
            for id in ids {
                if !result.remove(id) {
                    result.insert(*id);
                }
            }
            result.into_iter().collect()
        }
    }
}

// ---- Wrapper entry points ------------------------------------------------

pub struct OperationsModule {
    last_selection_at: Option<Instant>,
}

impl OperationsModule {
    pub fn new() -> Self {
        Self { last_selection_at: None }
    }

    pub fn add_timeline_item_with_history(
        &self,
        timeline: &Rc<RefCell<TimelineModule>>,
        history: &mut HistoryModule,
        notifications: &mut NotificationsModule,
        item: TimelineItem,
    ) -> CoreResult<CommandId> {
        let command = AddTimelineItemCommand { timeline: timeline.clone(), item };
        history.execute(Box::new(command), notifications)
    }

    /// Swallows the call quietly (no history entry) if the move is within
    /// tolerance of a no-op (§4.3, §7 "quiet" no-real-change policy).
    pub fn move_timeline_item_with_history(
        &self,
        timeline: &Rc<RefCell<TimelineModule>>,
        history: &mut HistoryModule,
        notifications: &mut NotificationsModule,
        id: TimelineItemId,
        new_frame: i64,
        new_track_id: Option<TrackId>,
    ) -> CoreResult<Option<CommandId>> {
        let (before_frame, before_track) = {
            let timeline_ref = timeline.borrow();
            let item = timeline_ref.get(id).ok_or(crate::error::CoreError::TimelineItemNotFound(id))?;
            (item.time_range.timeline_start(), item.track_id)
        };
        let after_track = new_track_id.unwrap_or(before_track);
        let frame_delta = (new_frame.max(0) - before_frame).abs();
        if frame_delta < tolerance::POSITION_FRAMES && after_track == before_track {
            return Ok(None);
        }
        let command = MoveTimelineItemCommand {
            timeline: timeline.clone(),
            id,
            before_frame,
            before_track,
            after_frame: new_frame,
            after_track,
        };
        history.execute(Box::new(command), notifications).map(Some)
    }

    pub fn resize_timeline_item_with_history(
        &self,
        timeline: &Rc<RefCell<TimelineModule>>,
        history: &mut HistoryModule,
        notifications: &mut NotificationsModule,
        id: TimelineItemId,
        new_range: TimeRange,
    ) -> CoreResult<Option<CommandId>> {
        let before = {
            let timeline_ref = timeline.borrow();
            timeline_ref.get(id).ok_or(crate::error::CoreError::TimelineItemNotFound(id))?.time_range
        };
        let start_delta = (new_range.timeline_start() - before.timeline_start()).abs();
        let end_delta = (new_range.timeline_end() - before.timeline_end()).abs();
        if start_delta < tolerance::POSITION_FRAMES && end_delta < tolerance::POSITION_FRAMES {
            return Ok(None);
        }
        let command = ResizeTimelineItemCommand { timeline: timeline.clone(), id, before, after: new_range };
        history.execute(Box::new(command), notifications).map(Some)
    }

    pub fn update_timeline_item_transform_with_history(
        &self,
        timeline: &Rc<RefCell<TimelineModule>>,
        history: &mut HistoryModule,
        notifications: &mut NotificationsModule,
        id: TimelineItemId,
        patch: VisualConfigPatch,
        canvas_width: f64,
        canvas_height: f64,
    ) -> CoreResult<Option<CommandId>> {
        let before = {
            let timeline_ref = timeline.borrow();
            let item = timeline_ref.get(id).ok_or(crate::error::CoreError::TimelineItemNotFound(id))?;
            *item.config.visual().ok_or(crate::error::CoreError::Validation { message: "item has no visual config".into() })?
        };
        if !Self::transform_patch_exceeds_tolerance(&before, &patch) {
            return Ok(None);
        }
        let command = UpdateTransformCommand { timeline: timeline.clone(), id, before, after_patch: patch, canvas_width, canvas_height };
        history.execute(Box::new(command), notifications).map(Some)
    }

    fn transform_patch_exceeds_tolerance(before: &VisualConfig, patch: &VisualConfigPatch) -> bool {
        let geometry_changed = |field: Option<f64>, current: f64| field.is_some_and(|v| (v - current).abs() >= tolerance::GEOMETRY_PX);
        let angle_changed = |field: Option<f64>, current: f64| field.is_some_and(|v| (v - current).abs() >= tolerance::ANGLE_OR_OPACITY);
        geometry_changed(patch.x, before.x)
            || geometry_changed(patch.y, before.y)
            || geometry_changed(patch.width, before.width)
            || geometry_changed(patch.height, before.height)
            || angle_changed(patch.rotation, before.rotation)
            || angle_changed(patch.opacity, before.opacity)
            || patch.z_index.is_some_and(|z| z != before.z_index)
    }

    pub fn rename_track_with_history(
        &self,
        tracks: &Rc<RefCell<TracksModule>>,
        history: &mut HistoryModule,
        notifications: &mut NotificationsModule,
        id: TrackId,
        new_name: impl Into<String>,
    ) -> CoreResult<Option<CommandId>> {
        let new_name = new_name.into();
        let before = {
            let tracks_ref = tracks.borrow();
            tracks_ref.get(id).ok_or(crate::error::CoreError::TrackNotFound(id))?.name.clone()
        };
        if before == new_name {
            return Ok(None);
        }
        let command = RenameTrackCommand { tracks: tracks.clone(), id, before, after: new_name };
        history.execute(Box::new(command), notifications).map(Some)
    }

    pub fn set_track_visibility_with_history(
        &self,
        tracks: &Rc<RefCell<TracksModule>>,
        history: &mut HistoryModule,
        notifications: &mut NotificationsModule,
        id: TrackId,
        visible: bool,
    ) -> CoreResult<Option<CommandId>> {
        let before = {
            let tracks_ref = tracks.borrow();
            tracks_ref.get(id).ok_or(crate::error::CoreError::TrackNotFound(id))?.is_visible
        };
        if before == visible {
            return Ok(None);
        }
        let command = SetTrackVisibilityCommand { tracks: tracks.clone(), id, before, after: visible };
        history.execute(Box::new(command), notifications).map(Some)
    }

    /// §4.3 "A debounced de-duplication window of 100 ms suppresses repeat
    /// selection commands." Returns `true` when the caller should actually
    /// push a history/notification side effect for this selection change.
    pub fn should_record_selection_change(&mut self, now: Instant) -> bool {
        let should_record = self.last_selection_at.is_none_or(|last| now.duration_since(last) >= SELECTION_DEDUP_WINDOW);
        if should_record {
            self.last_selection_at = Some(now);
        }
        should_record
    }

    pub fn add_track_with_history(
        &self,
        tracks: &Rc<RefCell<TracksModule>>,
        history: &mut HistoryModule,
        notifications: &mut NotificationsModule,
        name: impl Into<String>,
        kind: TrackKind,
    ) -> CoreResult<CommandId> {
        let track = Track::new(name, kind);
        let command = AddTrackCommand { tracks: tracks.clone(), track };
        history.execute(Box::new(command), notifications)
    }

    pub fn remove_track_with_history(
        &self,
        tracks: &Rc<RefCell<TracksModule>>,
        timeline: &Rc<RefCell<TimelineModule>>,
        history: &mut HistoryModule,
        notifications: &mut NotificationsModule,
        id: TrackId,
    ) -> CoreResult<CommandId> {
        let track = tracks.borrow().get(id).ok_or(CoreError::TrackNotFound(id))?.clone();
        let items = timeline.borrow().all().iter().filter(|item| item.track_id == id).cloned().collect();
        let command = RemoveTrackCommand { tracks: tracks.clone(), timeline: timeline.clone(), track, items };
        history.execute(Box::new(command), notifications)
    }

    /// §4.3 selection-with-history. Mode is normalized to `Replace` inside
    /// the command (the resulting set, not the gesture, is what's undone),
    /// so `ids`/`mode` here only describe how the *new* set is computed.
    pub fn set_selection_with_history(
        &self,
        selection: &Rc<RefCell<SelectionModule>>,
        history: &mut HistoryModule,
        notifications: &mut NotificationsModule,
        ids: &[TimelineItemId],
        mode: SelectionMode,
    ) -> CoreResult<Option<CommandId>> {
        let before: Vec<TimelineItemId> = selection.borrow().selected().iter().copied().collect();
        let after = simulate_selection(selection.borrow().selected(), ids, mode);
        let mut before_sorted = before.clone();
        let mut after_sorted = after.clone();
        before_sorted.sort();
        after_sorted.sort();
        if before_sorted == after_sorted {
            return Ok(None);
        }
        let command = SetSelectionCommand { selection: selection.clone(), before, after };
        history.execute(Box::new(command), notifications).map(Some)
    }

    pub fn set_keyframes_with_history(
        &self,
        timeline: &Rc<RefCell<TimelineModule>>,
        history: &mut HistoryModule,
        notifications: &mut NotificationsModule,
        id: TimelineItemId,
        keyframes: Vec<Keyframe>,
    ) -> CoreResult<Option<CommandId>> {
        let before = {
            let timeline_ref = timeline.borrow();
            timeline_ref.keyframes(id)?.to_vec()
        };
        if before == keyframes {
            return Ok(None);
        }
        let command = SetKeyframesCommand { timeline: timeline.clone(), id, before, after: keyframes };
        history.execute(Box::new(command), notifications).map(Some)
    }

    pub fn add_keyframe_with_history(
        &self,
        timeline: &Rc<RefCell<TimelineModule>>,
        history: &mut HistoryModule,
        notifications: &mut NotificationsModule,
        id: TimelineItemId,
        keyframe: Keyframe,
    ) -> CoreResult<Option<CommandId>> {
        let mut keyframes = timeline.borrow().keyframes(id)?.to_vec();
        keyframes.push(keyframe);
        self.set_keyframes_with_history(timeline, history, notifications, id, keyframes)
    }

    pub fn remove_keyframe_with_history(
        &self,
        timeline: &Rc<RefCell<TimelineModule>>,
        history: &mut HistoryModule,
        notifications: &mut NotificationsModule,
        id: TimelineItemId,
        relative_frame: i64,
    ) -> CoreResult<Option<CommandId>> {
        let mut keyframes = timeline.borrow().keyframes(id)?.to_vec();
        keyframes.retain(|k| k.relative_frame != relative_frame);
        self.set_keyframes_with_history(timeline, history, notifications, id, keyframes)
    }

    pub fn update_text_style_with_history(
        &self,
        timeline: &Rc<RefCell<TimelineModule>>,
        history: &mut HistoryModule,
        notifications: &mut NotificationsModule,
        id: TimelineItemId,
        style: TextStyle,
    ) -> CoreResult<Option<CommandId>> {
        let before = {
            let timeline_ref = timeline.borrow();
            let item = timeline_ref.get(id).ok_or(CoreError::TimelineItemNotFound(id))?;
            match &item.config {
                crate::timeline_item::ItemConfig::Text { style, .. } => style.clone(),
                _ => return Err(CoreError::Validation { message: "item has no text style".into() }),
            }
        };
        if before == style {
            return Ok(None);
        }
        let command = UpdateTextStyleCommand { timeline: timeline.clone(), id, before, after: style };
        history.execute(Box::new(command), notifications).map(Some)
    }
}

impl Default for OperationsModule {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{CanvasEngine, CanvasEngineAdapter, CanvasOptions, ClipHandle, PlayOptions, SpriteHandle};
    use crate::ids::{MediaId, TimelineItemId as ItemId};
    use crate::media_item::MediaType;
    use crate::timeline_item::{Animation, AudioConfig, ItemConfig, TimelineStatus};
    use std::sync::Arc;

    struct NullEngine;
    impl CanvasEngine for NullEngine {
        fn initialize_canvas(&self, _opts: CanvasOptions) {}
        fn destroy_canvas(&self) {}
        fn is_ready(&self) -> bool { true }
        fn last_error(&self) -> Option<String> { None }
        fn create_mp4_clip(&self, _b: &[u8]) -> Result<ClipHandle, String> { Ok(ClipHandle(1)) }
        fn create_img_clip(&self, _b: &[u8]) -> Result<ClipHandle, String> { Ok(ClipHandle(1)) }
        fn create_audio_clip(&self, _b: &[u8]) -> Result<ClipHandle, String> { Ok(ClipHandle(1)) }
        fn clone_clip(&self, clip: ClipHandle) -> Result<ClipHandle, String> { Ok(clip) }
        fn destroy_clip(&self, _clip: ClipHandle) {}
        fn clip_metadata(&self, _clip: ClipHandle) -> Option<(u32, u32, i64)> { Some((1920, 1080, 5_000_000)) }
        fn create_sprite(&self, _clip: ClipHandle) -> Result<SpriteHandle, String> { Ok(SpriteHandle(1)) }
        fn destroy_sprite(&self, _sprite: SpriteHandle) {}
        fn add_sprite(&self, _sprite: SpriteHandle) -> bool { true }
        fn remove_sprite(&self, _sprite: SpriteHandle) -> bool { true }
        fn set_sprite_rect(&self, _sprite: SpriteHandle, _rect: crate::geometry::Rect) {}
        fn set_sprite_z_index(&self, _sprite: SpriteHandle, _z: i32) {}
        fn set_sprite_opacity(&self, _sprite: SpriteHandle, _o: f64) {}
        fn set_sprite_visible(&self, _sprite: SpriteHandle, _v: bool) {}
        fn set_sprite_time_range(&self, _sprite: SpriteHandle, _r: TimeRange) {}
        fn sprite_time_range(&self, _sprite: SpriteHandle) -> Option<TimeRange> { None }
        fn play(&self, _opts: PlayOptions) {}
        fn pause(&self) {}
        fn preview_frame(&self, _micros: i64) {}
        fn poll_events(&self) -> Vec<crate::canvas::CanvasEvent> { Vec::new() }
    }

    fn new_timeline() -> Rc<RefCell<TimelineModule>> {
        let engine: Arc<dyn CanvasEngine> = Arc::new(NullEngine);
        let canvas = Arc::new(CanvasEngineAdapter::new(engine));
        canvas.initialize_canvas(CanvasOptions { width: 1920, height: 1080, bg_color: 0 });
        Rc::new(RefCell::new(TimelineModule::new(canvas)))
    }

    fn new_item(id: ItemId, track_id: TrackId) -> TimelineItem {
        TimelineItem {
            id,
            media_id: Some(MediaId::new()),
            track_id,
            media_type: MediaType::Video,
            status: TimelineStatus::Loading,
            time_range: TimeRange::ClipBacked { timeline_start: 0, timeline_end: 150, clip_start: 0, clip_end: 150, playback_rate: 1.0 },
            config: ItemConfig::VideoAndAudio { visual: VisualConfig::default(), audio: AudioConfig::default() },
            animation: Animation::default(),
            has_sprite: false,
        }
    }

    #[test]
    fn move_within_tolerance_is_swallowed_quietly() {
        let timeline = new_timeline();
        let track_id = TrackId::new();
        let id = ItemId::new();
        timeline.borrow_mut().add(new_item(id, track_id));

        let ops = OperationsModule::new();
        let mut history = HistoryModule::new();
        let mut notifications = NotificationsModule::new();
        let result = ops.move_timeline_item_with_history(&timeline, &mut history, &mut notifications, id, 0, None).unwrap();
        assert_eq!(result, None);
        assert!(!history.can_undo());
    }

    #[test]
    fn move_beyond_tolerance_is_undoable() {
        let timeline = new_timeline();
        let track_id = TrackId::new();
        let id = ItemId::new();
        timeline.borrow_mut().add(new_item(id, track_id));

        let ops = OperationsModule::new();
        let mut history = HistoryModule::new();
        let mut notifications = NotificationsModule::new();
        ops.move_timeline_item_with_history(&timeline, &mut history, &mut notifications, id, 60, None).unwrap();
        assert_eq!(timeline.borrow().get(id).unwrap().time_range.timeline_start(), 60);

        history.undo(&mut notifications).unwrap();
        assert_eq!(timeline.borrow().get(id).unwrap().time_range.timeline_start(), 0);
    }

    #[test]
    fn selection_dedup_window_suppresses_rapid_repeats() {
        let mut ops = OperationsModule::new();
        let t0 = Instant::now();
        assert!(ops.should_record_selection_change(t0));
        assert!(!ops.should_record_selection_change(t0 + Duration::from_millis(50)));
        assert!(ops.should_record_selection_change(t0 + Duration::from_millis(150)));
    }

    #[test]
    fn add_track_with_history_is_undoable() {
        let tracks = Rc::new(RefCell::new(TracksModule::new()));
        let before_count = tracks.borrow().all().len();

        let ops = OperationsModule::new();
        let mut history = HistoryModule::new();
        let mut notifications = NotificationsModule::new();
        ops.add_track_with_history(&tracks, &mut history, &mut notifications, "voiceover", TrackKind::Audio).unwrap();
        assert_eq!(tracks.borrow().all().len(), before_count + 1);

        history.undo(&mut notifications).unwrap();
        assert_eq!(tracks.borrow().all().len(), before_count);
    }

    #[test]
    fn remove_track_with_history_restores_its_items_on_undo() {
        let tracks = Rc::new(RefCell::new(TracksModule::new()));
        let timeline = new_timeline();
        let added = tracks.borrow_mut().add("b-roll", TrackKind::Video);
        let item_id = ItemId::new();
        timeline.borrow_mut().add(new_item(item_id, added.id));

        let ops = OperationsModule::new();
        let mut history = HistoryModule::new();
        let mut notifications = NotificationsModule::new();
        ops.remove_track_with_history(&tracks, &timeline, &mut history, &mut notifications, added.id).unwrap();
        assert!(tracks.borrow().get(added.id).is_none());
        assert!(timeline.borrow().get(item_id).is_none());

        history.undo(&mut notifications).unwrap();
        assert!(tracks.borrow().get(added.id).is_some());
        assert!(timeline.borrow().get(item_id).is_some());
    }

    #[test]
    fn set_selection_with_history_round_trips_through_undo() {
        let selection = Rc::new(RefCell::new(SelectionModule::new()));
        let id = ItemId::new();

        let ops = OperationsModule::new();
        let mut history = HistoryModule::new();
        let mut notifications = NotificationsModule::new();
        ops.set_selection_with_history(&selection, &mut history, &mut notifications, &[id], SelectionMode::Replace).unwrap();
        assert!(selection.borrow().selected().contains(&id));

        history.undo(&mut notifications).unwrap();
        assert!(selection.borrow().selected().is_empty());
    }

    #[test]
    fn set_keyframes_with_history_is_undoable() {
        let timeline = new_timeline();
        let track_id = TrackId::new();
        let id = ItemId::new();
        timeline.borrow_mut().add(new_item(id, track_id));

        let ops = OperationsModule::new();
        let mut history = HistoryModule::new();
        let mut notifications = NotificationsModule::new();
        let keyframes = vec![Keyframe { relative_frame: 0, value: 0.0 }, Keyframe { relative_frame: 30, value: 1.0 }];
        ops.set_keyframes_with_history(&timeline, &mut history, &mut notifications, id, keyframes.clone()).unwrap();
        assert_eq!(timeline.borrow().keyframes(id).unwrap(), keyframes.as_slice());

        history.undo(&mut notifications).unwrap();
        assert!(timeline.borrow().keyframes(id).unwrap().is_empty());
    }

    #[test]
    fn update_text_style_with_history_is_undoable() {
        let timeline = new_timeline();
        let track_id = TrackId::new();
        let id = ItemId::new();
        let mut item = new_item(id, track_id);
        item.config = ItemConfig::Text { visual: VisualConfig::default(), style: TextStyle::default() };
        timeline.borrow_mut().add(item);

        let ops = OperationsModule::new();
        let mut history = HistoryModule::new();
        let mut notifications = NotificationsModule::new();
        let style = TextStyle { content: "hello".into(), font_family: "Inter".into(), font_size: 32.0, color: "#ffffff".into() };
        ops.update_text_style_with_history(&timeline, &mut history, &mut notifications, id, style.clone()).unwrap();
        match &timeline.borrow().get(id).unwrap().config {
            ItemConfig::Text { style: s, .. } => assert_eq!(*s, style),
            _ => panic!("expected a text item"),
        }

        history.undo(&mut notifications).unwrap();
        match &timeline.borrow().get(id).unwrap().config {
            ItemConfig::Text { style: s, .. } => assert_eq!(*s, TextStyle::default()),
            _ => panic!("expected a text item"),
        }
    }
}
