// crates/reeldeck-core/src/modules/media.rs
//
// §4.1 Media-Ingestion State Machine. Phase-1 leaf module.
//
// The state machine only owns the *transitions*; the actual acquisition
// (reading a local file, fetching a URL) and decode (invoking the canvas
// engine) are driven by a caller outside this crate — `reeldeck-engine`'s
// `MediaWorker` in production, a test harness in unit tests — which calls
// `apply_source_status` as the source layer progresses and `finish_decode`/
// `fail` once the canvas engine resolves. This keeps the module
// synchronous and thread-free per §5 while still modeling the exact
// status graph in §4.1.

use crate::broadcaster::{Broadcaster, SubscriptionId};
use crate::error::{CoreError, CoreResult};
use crate::ids::MediaId;
use crate::media_item::{DataSource, DecodedMedia, MediaItem, MediaStatus, MediaType};

/// The source layer's own status, mapped onto [`MediaStatus`] per §4.1's
/// table ("pending→pending, acquiring→asyncprocessing, …").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceStatus {
    Pending,
    Acquiring,
    Acquired,
    Error,
    Cancelled,
    Missing,
}

impl SourceStatus {
    fn to_media_status(self) -> MediaStatus {
        match self {
            SourceStatus::Pending => MediaStatus::Pending,
            SourceStatus::Acquiring => MediaStatus::AsyncProcessing,
            SourceStatus::Acquired => MediaStatus::WebAvDecoding,
            SourceStatus::Error => MediaStatus::Error,
            SourceStatus::Cancelled => MediaStatus::Cancelled,
            SourceStatus::Missing => MediaStatus::Missing,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MediaEvent {
    Added(MediaId),
    StatusChanged(MediaId, MediaStatus),
    Ready(MediaId),
    Removed(MediaId),
}

pub struct MediaModule {
    items: Vec<MediaItem>,
    broadcaster: Broadcaster<MediaEvent>,
}

impl MediaModule {
    pub fn new() -> Self {
        Self { items: Vec::new(), broadcaster: Broadcaster::new() }
    }

    pub fn all(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn get(&self, id: MediaId) -> Option<&MediaItem> {
        self.items.iter().find(|m| m.id == id)
    }

    fn get_mut(&mut self, id: MediaId) -> CoreResult<&mut MediaItem> {
        self.items.iter_mut().find(|m| m.id == id).ok_or(CoreError::MediaNotFound(id))
    }

    pub fn add(&mut self, name: impl Into<String>, created_at: i64, media_type: MediaType, source: DataSource) -> MediaId {
        let item = MediaItem::new(MediaId::new(), name.into(), created_at, media_type, source);
        let id = item.id;
        self.items.push(item);
        self.broadcaster.notify(&MediaEvent::Added(id));
        id
    }

    /// Used by project reload (§4.5 step 3) to preserve id/name/createdAt
    /// across a save/load round trip instead of minting a fresh id.
    pub fn add_with_id(
        &mut self,
        id: MediaId,
        name: impl Into<String>,
        created_at: i64,
        media_type: MediaType,
        source: DataSource,
    ) {
        let item = MediaItem::new(id, name.into(), created_at, media_type, source);
        self.items.push(item);
        self.broadcaster.notify(&MediaEvent::Added(id));
    }

    /// Drive the source-status → media-status mapping (§4.1). On reaching a
    /// terminal status the caller is expected to stop feeding updates for
    /// this item (§4.1 "the subscription is released").
    pub fn apply_source_status(&mut self, id: MediaId, source_status: SourceStatus) -> CoreResult<()> {
        let media_type = self.get(id).map(|m| m.media_type);
        let item = self.get_mut(id)?;
        let new_status = source_status.to_media_status();
        item.status = new_status;
        if new_status == MediaStatus::Error {
            tracing::warn!(
                media_id = %id,
                media_type = ?media_type,
                source_status = ?source_status,
                message = "source acquisition entered error status",
            );
        }
        self.broadcaster.notify(&MediaEvent::StatusChanged(id, new_status));
        Ok(())
    }

    /// §4.1 steps 1–5: the canvas engine resolved `createClip`. Records
    /// decoded metadata, duration (already converted to frames by the
    /// caller), and the persisted `mediaReferenceId`, then transitions to
    /// `ready`.
    pub fn finish_decode(
        &mut self,
        id: MediaId,
        width: u32,
        height: u32,
        thumbnail_url: String,
        duration_frames: i64,
        media_reference_id: String,
    ) -> CoreResult<()> {
        let item = self.get_mut(id)?;
        item.decoded = Some(DecodedMedia { width, height, thumbnail_url });
        item.duration = duration_frames;
        item.source.set_media_reference_id(media_reference_id);
        item.status = MediaStatus::Ready;
        self.broadcaster.notify(&MediaEvent::StatusChanged(id, MediaStatus::Ready));
        self.broadcaster.notify(&MediaEvent::Ready(id));
        Ok(())
    }

    /// §4.1 "Failure: a caught error transitions to error … The item is
    /// left intact so the user can retry."
    pub fn fail(&mut self, id: MediaId, message: impl Into<String>) -> CoreResult<()> {
        let message = message.into();
        let media_type = self.get(id).map(|m| m.media_type);
        let item = self.get_mut(id)?;
        item.status = MediaStatus::Error;
        tracing::error!(media_id = %id, media_type = ?media_type, message = %message, "media decode failed");
        self.broadcaster.notify(&MediaEvent::StatusChanged(id, MediaStatus::Error));
        Ok(())
    }

    /// `retry` returns the item to `pending` and re-invokes acquisition —
    /// re-invocation is the caller's responsibility (§4.1).
    pub fn retry(&mut self, id: MediaId) -> CoreResult<()> {
        let item = self.get_mut(id)?;
        item.status = MediaStatus::Pending;
        self.broadcaster.notify(&MediaEvent::StatusChanged(id, MediaStatus::Pending));
        Ok(())
    }

    pub fn cancel(&mut self, id: MediaId) -> CoreResult<()> {
        let item = self.get_mut(id)?;
        item.status = MediaStatus::Cancelled;
        self.broadcaster.notify(&MediaEvent::StatusChanged(id, MediaStatus::Cancelled));
        Ok(())
    }

    /// §4.1 "Removal cascades": splices the item out and emits
    /// `MediaEvent::Removed` for dependent modules (timeline) to react to.
    pub fn remove(&mut self, id: MediaId) -> CoreResult<()> {
        let position = self.items.iter().position(|m| m.id == id).ok_or(CoreError::MediaNotFound(id))?;
        self.items.remove(position);
        self.broadcaster.notify(&MediaEvent::Removed(id));
        Ok(())
    }

    pub fn by_type(&self, media_type: MediaType) -> Vec<&MediaItem> {
        self.items.iter().filter(|m| m.media_type == media_type).collect()
    }

    pub fn by_status(&self, status: MediaStatus) -> Vec<&MediaItem> {
        self.items.iter().filter(|m| m.status == status).collect()
    }

    pub fn by_media_reference_id(&self, media_reference_id: &str) -> Option<&MediaItem> {
        self.items.iter().find(|m| m.source.media_reference_id() == Some(media_reference_id))
    }

    pub fn stats(&self) -> MediaStats {
        MediaStats {
            total: self.items.len(),
            ready: self.items.iter().filter(|m| m.status == MediaStatus::Ready).count(),
            processing: self
                .items
                .iter()
                .filter(|m| matches!(m.status, MediaStatus::AsyncProcessing | MediaStatus::WebAvDecoding))
                .count(),
            error: self.items.iter().filter(|m| m.status == MediaStatus::Error).count(),
            pending: self.items.iter().filter(|m| m.status == MediaStatus::Pending).count(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&MediaEvent)>) -> SubscriptionId {
        self.broadcaster.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.broadcaster.unsubscribe(id);
    }
}

impl Default for MediaModule {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MediaStats {
    pub total: usize,
    pub ready: usize,
    pub processing: usize,
    pub error: usize,
    pub pending: usize,
}
