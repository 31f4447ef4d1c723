// crates/reeldeck-core/src/fs.rs
//
// The persistence boundary (§4.5, §6). `modules::project` depends on this
// trait, never on `std::fs` directly, so the core stays IO-free;
// `reeldeck-engine::local_fs::LocalProjectFilesystem` is the concrete
// implementation against a real directory tree.
//
// Grounded on `velocut-ui/src/paths.rs` (project-directory layout helpers)
// and `helpers/reset.rs` (the save/load round trip `app.rs` drives).

use crate::error::CoreResult;
use crate::project::UnifiedProjectConfig;

/// On-disk shape is `project.json` plus a `media/<mediaReferenceId>` file
/// per acquired asset with a `.meta.json` sidecar (§6).
pub trait ProjectFilesystem: Send + Sync {
    /// Read and parse `project.json`.
    fn load_config(&self) -> CoreResult<UnifiedProjectConfig>;

    /// Serialize and write `project.json`, replacing any existing file.
    fn save_config(&self, config: &UnifiedProjectConfig) -> CoreResult<()>;

    /// Read the bytes of a previously acquired media asset by its
    /// mediaReferenceId.
    fn read_media(&self, media_reference_id: &str) -> CoreResult<Vec<u8>>;

    /// Persist a media asset's bytes under its mediaReferenceId, returning
    /// the same id for chaining (§4.1 step 3 "user-selected sources are
    /// copied into the project media directory").
    fn write_media(&self, media_reference_id: &str, bytes: &[u8]) -> CoreResult<()>;

    /// True if the referenced asset file exists, without reading it — used
    /// by `load_project_content` (§4.5 step 3) to decide `missing` status
    /// without paying the read cost for every item on load.
    fn media_exists(&self, media_reference_id: &str) -> bool;

    /// Sidecar metadata path readback, used to avoid re-probing duration or
    /// type for assets already persisted once.
    fn read_media_meta(&self, media_reference_id: &str) -> CoreResult<Option<MediaSidecar>>;
    fn write_media_meta(&self, media_reference_id: &str, meta: &MediaSidecar) -> CoreResult<()>;

    /// §6 `initializeForProject`: scan the project's media directory and
    /// return every mediaReferenceId currently stored there, independent of
    /// what the in-memory project model references.
    fn list_media_references(&self) -> CoreResult<Vec<String>>;

    /// §6 "cleanup unused media files": delete every stored media file (and
    /// its sidecar) whose id is not in `in_use`, returning the ids removed.
    fn cleanup_unused_media_files(&self, in_use: &std::collections::HashSet<String>) -> CoreResult<Vec<String>>;
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MediaSidecar {
    pub media_type: crate::media_item::MediaType,
    pub duration: i64,
    pub width: u32,
    pub height: u32,
}
