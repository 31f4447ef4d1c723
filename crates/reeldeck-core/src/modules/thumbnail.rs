// crates/reeldeck-core/src/modules/thumbnail.rs
//
// §9 "thumbnail workers" (external collaborator) coordination. Per the
// open question in §9 ("thumbnail generation policy … varies between
// source drafts"), this implementation picks: one outstanding request per
// video MediaItem, cancellable, no shared worker pool — the simplest
// policy that satisfies the spec's fixed requirement ("thumbnails are
// per-video, decoded via the engine, produced as JPEG blob URLs, and may
// be cancelled").

use crate::broadcaster::{Broadcaster, SubscriptionId};
use crate::ids::MediaId;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
pub enum ThumbnailEvent {
    Ready(MediaId, String),
    Failed(MediaId, String),
}

pub struct ThumbnailModule {
    /// In-flight media ids; a request is removed on completion, failure, or
    /// cancellation.
    pending: HashMap<MediaId, ()>,
    broadcaster: Broadcaster<ThumbnailEvent>,
}

impl ThumbnailModule {
    pub fn new() -> Self {
        Self { pending: HashMap::new(), broadcaster: Broadcaster::new() }
    }

    pub fn is_pending(&self, media_id: MediaId) -> bool {
        self.pending.contains_key(&media_id)
    }

    /// Request a thumbnail for a video media item. A second request for the
    /// same id while one is outstanding is a no-op (single request per
    /// item, per the policy above).
    pub fn request(&mut self, media_id: MediaId) -> bool {
        if self.pending.contains_key(&media_id) {
            return false;
        }
        self.pending.insert(media_id, ());
        true
    }

    pub fn cancel(&mut self, media_id: MediaId) {
        self.pending.remove(&media_id);
    }

    /// Called by the engine-side worker once the decode-one-frame-and-scale
    /// step produces a blob URL (§4.1 step 2).
    pub fn complete(&mut self, media_id: MediaId, thumbnail_url: impl Into<String>) {
        if self.pending.remove(&media_id).is_none() {
            return;
        }
        self.broadcaster.notify(&ThumbnailEvent::Ready(media_id, thumbnail_url.into()));
    }

    pub fn fail(&mut self, media_id: MediaId, message: impl Into<String>) {
        if self.pending.remove(&media_id).is_none() {
            return;
        }
        self.broadcaster.notify(&ThumbnailEvent::Failed(media_id, message.into()));
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ThumbnailEvent)>) -> SubscriptionId {
        self.broadcaster.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.broadcaster.unsubscribe(id);
    }
}

impl Default for ThumbnailModule {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_second_request_for_the_same_item_is_a_no_op_while_pending() {
        let mut thumbnails = ThumbnailModule::new();
        let id = MediaId::new();
        assert!(thumbnails.request(id));
        assert!(!thumbnails.request(id));
    }

    #[test]
    fn cancel_allows_a_fresh_request_afterward() {
        let mut thumbnails = ThumbnailModule::new();
        let id = MediaId::new();
        thumbnails.request(id);
        thumbnails.cancel(id);
        assert!(thumbnails.request(id));
    }

    #[test]
    fn completing_an_unknown_request_does_not_notify() {
        let mut thumbnails = ThumbnailModule::new();
        let seen = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let seen2 = seen.clone();
        thumbnails.subscribe(Box::new(move |_| seen2.store(true, std::sync::atomic::Ordering::SeqCst)));
        thumbnails.complete(MediaId::new(), "blob:x");
        assert!(!seen.load(std::sync::atomic::Ordering::SeqCst));
    }
}
