// crates/reeldeck-core/src/track.rs
//
// A horizontal lane (§3). The teacher's `ProjectState` keeps rows implicit
// (`track_row: usize`, parity decides video-vs-audio); the data model here
// promotes tracks to first-class entities since the spec's track types are
// richer than "even/odd row".

use crate::ids::TrackId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Video,
    Audio,
    Text,
    Subtitle,
    Effect,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub kind: TrackKind,
    pub is_visible: bool,
    pub is_muted: bool,
    pub row_height_px: u32,
}

pub const DEFAULT_ROW_HEIGHT_PX: u32 = 64;

impl Track {
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: TrackId::new(),
            name: name.into(),
            kind,
            is_visible: true,
            is_muted: false,
            row_height_px: DEFAULT_ROW_HEIGHT_PX,
        }
    }

    /// A new project starts with one video, one audio, one text track (§3).
    pub fn default_set() -> Vec<Track> {
        vec![
            Track::new("Video 1", TrackKind::Video),
            Track::new("Audio 1", TrackKind::Audio),
            Track::new("Text 1", TrackKind::Text),
        ]
    }
}
