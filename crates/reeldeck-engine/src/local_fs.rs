// crates/reeldeck-engine/src/local_fs.rs
//
// `LocalProjectFilesystem`: the concrete `ProjectFilesystem` (§6) against a
// real directory tree — `project.json`, `media/<mediaReferenceId>`, and a
// `media/<mediaReferenceId>.meta.json` sidecar.
//
// Grounded on `velocut-ui/src/paths.rs` (single-source-of-truth path
// helper) — the same idea, generalized from one fixed app-data directory
// into a per-project root the caller supplies.

use reeldeck_core::error::{CoreError, CoreResult};
use reeldeck_core::fs::{MediaSidecar, ProjectFilesystem};
use reeldeck_core::project::UnifiedProjectConfig;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const PROJECT_FILE: &str = "project.json";
const MEDIA_DIR: &str = "media";

pub struct LocalProjectFilesystem {
    root: PathBuf,
}

impl LocalProjectFilesystem {
    /// `root` is the project directory; it is created (along with its
    /// `media/` subdirectory) if it doesn't already exist.
    pub fn new(root: impl Into<PathBuf>) -> CoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(MEDIA_DIR)).map_err(|e| CoreError::Persistence {
            message: format!("failed to create project directory {}: {e}", root.display()),
        })?;
        Ok(Self { root })
    }

    fn project_file_path(&self) -> PathBuf {
        self.root.join(PROJECT_FILE)
    }

    fn media_path(&self, media_reference_id: &str) -> PathBuf {
        self.root.join(MEDIA_DIR).join(media_reference_id)
    }

    fn media_meta_path(&self, media_reference_id: &str) -> PathBuf {
        self.root.join(MEDIA_DIR).join(format!("{media_reference_id}.meta.json"))
    }
}

impl ProjectFilesystem for LocalProjectFilesystem {
    fn load_config(&self) -> CoreResult<UnifiedProjectConfig> {
        let path = self.project_file_path();
        let bytes = fs::read(&path).map_err(|e| CoreError::Persistence {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| CoreError::Persistence {
            message: format!("failed to parse {}: {e}", path.display()),
        })
    }

    fn save_config(&self, config: &UnifiedProjectConfig) -> CoreResult<()> {
        let path = self.project_file_path();
        let json = serde_json::to_vec_pretty(config).map_err(|e| CoreError::Persistence {
            message: format!("failed to serialize project config: {e}"),
        })?;
        write_atomically(&path, &json)
    }

    fn read_media(&self, media_reference_id: &str) -> CoreResult<Vec<u8>> {
        let path = self.media_path(media_reference_id);
        fs::read(&path).map_err(|e| CoreError::Persistence {
            message: format!("failed to read media {}: {e}", path.display()),
        })
    }

    fn write_media(&self, media_reference_id: &str, bytes: &[u8]) -> CoreResult<()> {
        write_atomically(&self.media_path(media_reference_id), bytes)
    }

    fn media_exists(&self, media_reference_id: &str) -> bool {
        self.media_path(media_reference_id).is_file()
    }

    fn read_media_meta(&self, media_reference_id: &str) -> CoreResult<Option<MediaSidecar>> {
        let path = self.media_meta_path(media_reference_id);
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|e| CoreError::Persistence {
            message: format!("failed to read sidecar {}: {e}", path.display()),
        })?;
        let sidecar = serde_json::from_slice(&bytes).map_err(|e| CoreError::Persistence {
            message: format!("failed to parse sidecar {}: {e}", path.display()),
        })?;
        Ok(Some(sidecar))
    }

    fn write_media_meta(&self, media_reference_id: &str, meta: &MediaSidecar) -> CoreResult<()> {
        let json = serde_json::to_vec_pretty(meta).map_err(|e| CoreError::Persistence {
            message: format!("failed to serialize sidecar for {media_reference_id}: {e}"),
        })?;
        write_atomically(&self.media_meta_path(media_reference_id), &json)
    }

    fn list_media_references(&self) -> CoreResult<Vec<String>> {
        let dir = self.root.join(MEDIA_DIR);
        let entries = fs::read_dir(&dir).map_err(|e| CoreError::Persistence {
            message: format!("failed to scan {}: {e}", dir.display()),
        })?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CoreError::Persistence {
                message: format!("failed to read directory entry in {}: {e}", dir.display()),
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".meta.json") || name.ends_with(".tmp") {
                continue;
            }
            ids.push(name);
        }
        Ok(ids)
    }

    fn cleanup_unused_media_files(&self, in_use: &HashSet<String>) -> CoreResult<Vec<String>> {
        let mut removed = Vec::new();
        for id in self.list_media_references()? {
            if in_use.contains(&id) {
                continue;
            }
            fs::remove_file(self.media_path(&id)).map_err(|e| CoreError::Persistence {
                message: format!("failed to remove orphaned media {id}: {e}"),
            })?;
            let meta_path = self.media_meta_path(&id);
            if meta_path.is_file() {
                let _ = fs::remove_file(&meta_path);
            }
            removed.push(id);
        }
        Ok(removed)
    }
}

/// Write via a `.tmp` sibling then rename, so a crash mid-write never leaves
/// a truncated `project.json` behind.
fn write_atomically(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    let tmp_path = path.with_extension(match path.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    });
    fs::write(&tmp_path, bytes).map_err(|e| CoreError::Persistence {
        message: format!("failed to write {}: {e}", tmp_path.display()),
    })?;
    fs::rename(&tmp_path, path).map_err(|e| CoreError::Persistence {
        message: format!("failed to replace {}: {e}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reeldeck_core::project::ProjectMeta;

    fn new_config() -> UnifiedProjectConfig {
        UnifiedProjectConfig {
            meta: ProjectMeta::new("untitled", 0),
            settings: Default::default(),
            timeline: reeldeck_core::project::PersistedTimeline {
                tracks: Vec::new(),
                timeline_items: Vec::new(),
                media_items: Vec::new(),
            },
        }
    }

    #[test]
    fn save_then_load_round_trips_project_config() {
        let dir = tempfile::tempdir().unwrap();
        let fsys = LocalProjectFilesystem::new(dir.path()).unwrap();
        let config = new_config();

        fsys.save_config(&config).unwrap();
        let loaded = fsys.load_config().unwrap();

        assert_eq!(loaded.meta.id, config.meta.id);
        assert_eq!(loaded.settings.frame_rate, config.settings.frame_rate);
    }

    #[test]
    fn media_round_trips_bytes_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let fsys = LocalProjectFilesystem::new(dir.path()).unwrap();

        assert!(!fsys.media_exists("ref-1"));
        fsys.write_media("ref-1", b"fake mp4 bytes").unwrap();
        assert!(fsys.media_exists("ref-1"));
        assert_eq!(fsys.read_media("ref-1").unwrap(), b"fake mp4 bytes");

        assert!(fsys.read_media_meta("ref-1").unwrap().is_none());
        let meta = MediaSidecar { media_type: reeldeck_core::media_item::MediaType::Video, duration: 150, width: 1920, height: 1080 };
        fsys.write_media_meta("ref-1", &meta).unwrap();
        assert_eq!(fsys.read_media_meta("ref-1").unwrap(), Some(meta));
    }

    #[test]
    fn load_config_on_empty_project_dir_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let fsys = LocalProjectFilesystem::new(dir.path()).unwrap();
        assert!(matches!(fsys.load_config(), Err(CoreError::Persistence { .. })));
    }
}
