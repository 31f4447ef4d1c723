// crates/reeldeck-core/src/media_item.rs
//
// MediaItem and its DataSource — §3. Status transitions live in
// modules::media; this module only owns the data shape and the
// serialization boundary (§6 "DataSource persistence shape").

use crate::ids::MediaId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Video,
    Image,
    Audio,
    Text,
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaStatus {
    Pending,
    AsyncProcessing,
    WebAvDecoding,
    Ready,
    Error,
    Cancelled,
    Missing,
}

impl MediaStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, MediaStatus::Ready | MediaStatus::Error | MediaStatus::Cancelled | MediaStatus::Missing)
    }
}

/// How a MediaItem's bytes are obtained (§3 DataSource).
///
/// Only the fields named in §6 ("DataSourcePersistence shape") survive a
/// round trip through [`DataSource::to_persisted`]/[`PersistedDataSource`];
/// everything else (acquisition progress, the acquired blob, the object
/// URL) is session-only.
#[derive(Clone, Debug, PartialEq)]
pub enum DataSource {
    UserSelected(UserSelectedSource),
    Remote(RemoteSource),
    ProjectReference(ProjectReferenceSource),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserSelectedSource {
    pub progress: u8,
    pub local_path: Option<std::path::PathBuf>,
    pub media_reference_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemoteSource {
    pub progress: u8,
    pub url: String,
    pub media_reference_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectReferenceSource {
    pub media_reference_id: String,
}

impl DataSource {
    pub fn media_reference_id(&self) -> Option<&str> {
        match self {
            DataSource::UserSelected(s) => s.media_reference_id.as_deref(),
            DataSource::Remote(s) => s.media_reference_id.as_deref(),
            DataSource::ProjectReference(s) => Some(&s.media_reference_id),
        }
    }

    pub fn set_media_reference_id(&mut self, id: String) {
        match self {
            DataSource::UserSelected(s) => s.media_reference_id = Some(id),
            DataSource::Remote(s) => s.media_reference_id = Some(id),
            DataSource::ProjectReference(s) => s.media_reference_id = id,
        }
    }

    /// The persistable projection (§6 "DataSource persistence shape") —
    /// transient fields (`file`, `url` acquisition progress, acquired
    /// flags) are dropped; `type` + `mediaReferenceId` survive.
    pub fn to_persisted(&self) -> PersistedDataSource {
        match self {
            DataSource::UserSelected(s) => PersistedDataSource {
                kind: PersistedSourceKind::UserSelected,
                media_reference_id: s.media_reference_id.clone(),
                url: None,
            },
            DataSource::Remote(s) => PersistedDataSource {
                kind: PersistedSourceKind::Remote,
                media_reference_id: s.media_reference_id.clone(),
                url: Some(s.url.clone()),
            },
            DataSource::ProjectReference(s) => PersistedDataSource {
                kind: PersistedSourceKind::ProjectReference,
                media_reference_id: Some(s.media_reference_id.clone()),
                url: None,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersistedSourceKind {
    UserSelected,
    Remote,
    ProjectReference,
}

/// The on-disk shape of a [`DataSource`] (§6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedDataSource {
    #[serde(rename = "type")]
    pub kind: PersistedSourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl PersistedDataSource {
    /// Reconstruct a runtime [`DataSource`] from a saved project — used by
    /// `modules::project::load_project_content` (§4.5 step 3). A saved
    /// `user-selected` source has no `file`/`local_path` until re-acquired;
    /// the media item enters `missing` status if the referenced file is
    /// absent from the project media directory.
    pub fn to_runtime(&self) -> DataSource {
        match self.kind {
            PersistedSourceKind::UserSelected => DataSource::UserSelected(UserSelectedSource {
                progress: 0,
                local_path: None,
                media_reference_id: self.media_reference_id.clone(),
            }),
            PersistedSourceKind::Remote => DataSource::Remote(RemoteSource {
                progress: 0,
                url: self.url.clone().unwrap_or_default(),
                media_reference_id: self.media_reference_id.clone(),
            }),
            PersistedSourceKind::ProjectReference => {
                DataSource::ProjectReference(ProjectReferenceSource {
                    media_reference_id: self.media_reference_id.clone().unwrap_or_default(),
                })
            }
        }
    }
}

/// Decoded handles, present iff `status == Ready` (§3).
#[derive(Clone, Debug)]
pub struct DecodedMedia {
    pub width: u32,
    pub height: u32,
    pub thumbnail_url: String,
}

#[derive(Clone, Debug)]
pub struct MediaItem {
    pub id: MediaId,
    pub name: String,
    pub created_at: i64,
    pub media_type: MediaType,
    pub status: MediaStatus,
    /// Duration in frames; set at decode time (§3, §4.1 step 4).
    pub duration: i64,
    pub source: DataSource,
    pub decoded: Option<DecodedMedia>,
}

impl MediaItem {
    pub fn new(id: MediaId, name: String, created_at: i64, media_type: MediaType, source: DataSource) -> Self {
        Self {
            id,
            name,
            created_at,
            media_type,
            status: MediaStatus::Pending,
            duration: 0,
            source,
            decoded: None,
        }
    }

    /// §8 invariant 1: a `ready` item always has decoded handles and a
    /// positive duration.
    pub fn satisfies_ready_invariant(&self) -> bool {
        if self.status != MediaStatus::Ready {
            return true;
        }
        self.decoded.is_some() && self.duration > 0
    }
}
