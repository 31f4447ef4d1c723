// crates/reeldeck-core/src/error.rs
//
// One error kind per §7. Variants carry just enough context for a caller
// to decide whether to retry, notify, or ignore — detailed diagnostics
// belong in the tracing event that accompanies the error, not in the
// error value itself.

use crate::ids::{MediaId, TimelineItemId, TrackId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("source acquisition failed for media {media_id}: {message}")]
    SourceAcquisition { media_id: MediaId, message: String },

    #[error("decode failed for media {media_id}: {message}")]
    Decode { media_id: MediaId, message: String },

    #[error("persistence failed: {message}")]
    Persistence { message: String },

    #[error("command {description:?} failed: {message}")]
    CommandExecution { description: String, message: String },

    #[error("undo failed: {message}")]
    Undo { message: String },

    #[error("redo failed: {message}")]
    Redo { message: String },

    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("track {0} not found")]
    TrackNotFound(TrackId),

    #[error("media item {0} not found")]
    MediaNotFound(MediaId),

    #[error("timeline item {0} not found")]
    TimelineItemNotFound(TimelineItemId),
}

pub type CoreResult<T> = Result<T, CoreError>;
