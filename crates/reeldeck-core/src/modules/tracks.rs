// crates/reeldeck-core/src/modules/tracks.rs
//
// §3 Track CRUD. Phase-1 leaf module. Track removal must cascade to the
// timeline ("removing a track removes all timeline items on it") but
// TimelineModule is phase-2 and depends on this module, not the other way
// around — so removal only guarantees the track-model invariant here and
// emits a `TrackEvent::Removed` that `TimelineModule` (constructed with a
// reference to this module, per the registry wiring in §9) subscribes to
// and reacts to by splicing out its own items.

use crate::broadcaster::{Broadcaster, SubscriptionId};
use crate::error::{CoreError, CoreResult};
use crate::ids::TrackId;
use crate::track::{Track, TrackKind};

#[derive(Clone, Debug, PartialEq)]
pub enum TrackEvent {
    Added(Track),
    Removed(TrackId),
    Updated(Track),
}

pub struct TracksModule {
    tracks: Vec<Track>,
    broadcaster: Broadcaster<TrackEvent>,
}

impl TracksModule {
    pub fn new() -> Self {
        Self { tracks: Track::default_set(), broadcaster: Broadcaster::new() }
    }

    /// Used by project load (§4.5 step 4) to discard the default set before
    /// restoring saved tracks.
    pub fn clear_all(&mut self, replacement: Vec<Track>) {
        self.tracks = replacement;
    }

    pub fn all(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn first_id(&self) -> Option<TrackId> {
        self.tracks.first().map(|t| t.id)
    }

    pub fn add(&mut self, name: impl Into<String>, kind: TrackKind) -> Track {
        let track = Track::new(name, kind);
        self.tracks.push(track.clone());
        self.broadcaster.notify(&TrackEvent::Added(track.clone()));
        track
    }

    /// Used by `addTrackWithHistory`'s undo/redo (§4.3) to restore a track
    /// under its original id rather than minting a fresh one, mirroring
    /// `MediaModule::add_with_id`.
    pub fn add_with_id(&mut self, track: Track) {
        self.tracks.push(track.clone());
        self.broadcaster.notify(&TrackEvent::Added(track));
    }

    /// §3 invariant: at least one track exists at all times.
    pub fn remove(&mut self, id: TrackId) -> CoreResult<()> {
        if self.tracks.len() <= 1 {
            return Err(CoreError::Validation { message: "cannot remove the last remaining track".into() });
        }
        let position = self.tracks.iter().position(|t| t.id == id).ok_or(CoreError::TrackNotFound(id))?;
        self.tracks.remove(position);
        self.broadcaster.notify(&TrackEvent::Removed(id));
        Ok(())
    }

    pub fn set_name(&mut self, id: TrackId, name: impl Into<String>) -> CoreResult<()> {
        let track = self.tracks.iter_mut().find(|t| t.id == id).ok_or(CoreError::TrackNotFound(id))?;
        track.name = name.into();
        let updated = track.clone();
        self.broadcaster.notify(&TrackEvent::Updated(updated));
        Ok(())
    }

    pub fn set_visible(&mut self, id: TrackId, visible: bool) -> CoreResult<()> {
        let track = self.tracks.iter_mut().find(|t| t.id == id).ok_or(CoreError::TrackNotFound(id))?;
        track.is_visible = visible;
        let updated = track.clone();
        self.broadcaster.notify(&TrackEvent::Updated(updated));
        Ok(())
    }

    pub fn set_muted(&mut self, id: TrackId, muted: bool) -> CoreResult<()> {
        let track = self.tracks.iter_mut().find(|t| t.id == id).ok_or(CoreError::TrackNotFound(id))?;
        track.is_muted = muted;
        let updated = track.clone();
        self.broadcaster.notify(&TrackEvent::Updated(updated));
        Ok(())
    }

    pub fn set_row_height(&mut self, id: TrackId, height_px: u32) -> CoreResult<()> {
        if height_px == 0 {
            return Err(CoreError::Validation { message: "row height must be > 0".into() });
        }
        let track = self.tracks.iter_mut().find(|t| t.id == id).ok_or(CoreError::TrackNotFound(id))?;
        track.row_height_px = height_px;
        let updated = track.clone();
        self.broadcaster.notify(&TrackEvent::Updated(updated));
        Ok(())
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&TrackEvent)>) -> SubscriptionId {
        self.broadcaster.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.broadcaster.unsubscribe(id);
    }
}

impl Default for TracksModule {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cannot_remove_the_last_track_of_the_default_set() {
        let mut tracks = TracksModule::new();
        let video_id = tracks.all().iter().find(|t| t.kind == TrackKind::Video).unwrap().id;
        let audio_id = tracks.all().iter().find(|t| t.kind == TrackKind::Audio).unwrap().id;
        let text_id = tracks.all().iter().find(|t| t.kind == TrackKind::Text).unwrap().id;
        tracks.remove(video_id).unwrap();
        tracks.remove(audio_id).unwrap();
        assert!(tracks.remove(text_id).is_err());
    }

    #[test]
    fn invalid_row_height_is_rejected() {
        let mut tracks = TracksModule::new();
        let id = tracks.first_id().unwrap();
        assert!(tracks.set_row_height(id, 0).is_err());
    }
}
