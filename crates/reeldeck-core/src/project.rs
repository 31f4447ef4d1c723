// crates/reeldeck-core/src/project.rs
//
// Project metadata, settings, and the persisted-config DTOs (§6
// "Project on disk"). Runtime tracks/timeline items/media items live in
// their owning modules; this module only defines the serialization
// boundary `UnifiedProjectConfig` that `modules::project` assembles and
// disassembles.

use crate::ids::{ProjectId, TimelineItemId, TrackId};
use crate::media_item::{MediaType, PersistedDataSource};
use crate::timeline_item::{Animation, ItemConfig, TimeRange};
use crate::track::TrackKind;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoResolution {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
}

impl VideoResolution {
    pub fn hd_1080p() -> Self {
        Self { name: "1080p".into(), width: 1920, height: 1080, aspect_ratio: 16.0 / 9.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    pub video_resolution: VideoResolution,
    pub frame_rate: f64,
    pub timeline_duration_frames: i64,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self { video_resolution: VideoResolution::hd_1080p(), frame_rate: 30.0, timeline_duration_frames: 0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub duration: i64,
}

impl ProjectMeta {
    pub fn new(name: impl Into<String>, now: i64) -> Self {
        Self {
            id: ProjectId::new(),
            name: name.into(),
            description: String::new(),
            created_at: now,
            updated_at: now,
            version: 1,
            thumbnail: None,
            duration: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedTrack {
    pub id: TrackId,
    pub name: String,
    pub kind: TrackKind,
    pub is_visible: bool,
    pub is_muted: bool,
    pub row_height_px: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedTimelineItem {
    pub id: TimelineItemId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_id: Option<crate::ids::MediaId>,
    pub track_id: TrackId,
    pub media_type: MediaType,
    pub time_range: TimeRange,
    pub config: ItemConfig,
    #[serde(default)]
    pub animation: Animation,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedMediaItem {
    pub id: crate::ids::MediaId,
    pub name: String,
    pub created_at: i64,
    pub media_type: MediaType,
    pub duration: i64,
    pub source: PersistedDataSource,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedTimeline {
    pub tracks: Vec<PersistedTrack>,
    pub timeline_items: Vec<PersistedTimelineItem>,
    pub media_items: Vec<PersistedMediaItem>,
}

/// The `project.json` root shape (§6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnifiedProjectConfig {
    #[serde(flatten)]
    pub meta: ProjectMeta,
    pub settings: ProjectSettings,
    pub timeline: PersistedTimeline,
}
