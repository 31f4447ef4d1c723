// crates/reeldeck-engine/src/acquisition.rs
//
// Per-`DataSource` byte acquisition (§4.1 step 2: "acquiring … user-selected
// reads the local file, remote fetches over the network, project-reference
// reads back out of the project media directory"). One function per
// concern, mirroring `velocut-media/src/probe.rs`'s "one function per
// concern, `Sender<Result>` reporting" shape — here the concern is getting
// bytes, not decoding them, since decode is the injected `CanvasEngine`'s
// job.

use crate::EngineError;
use reeldeck_core::fs::ProjectFilesystem;
use reeldeck_core::media_item::DataSource;
use std::io::Read;
use std::path::Path;

/// Acquire the raw bytes for `source`, dispatching on which `DataSource`
/// variant it is. `filesystem` is only consulted for `ProjectReference`
/// sources (§4.1: re-opening a saved project re-reads already-acquired
/// media rather than re-fetching it).
pub fn acquire(source: &DataSource, filesystem: &dyn ProjectFilesystem) -> Result<Vec<u8>, EngineError> {
    match source {
        DataSource::UserSelected(s) => {
            let path = s.local_path.as_deref().ok_or_else(|| {
                EngineError::Acquisition("user-selected source has no local path".into())
            })?;
            read_local_file(path)
        }
        DataSource::Remote(s) => fetch_remote(&s.url),
        DataSource::ProjectReference(s) => filesystem
            .read_media(&s.media_reference_id)
            .map_err(|e| EngineError::Acquisition(e.to_string())),
    }
}

fn read_local_file(path: &Path) -> Result<Vec<u8>, EngineError> {
    std::fs::read(path)
        .map_err(|e| EngineError::Acquisition(format!("failed to read {}: {e}", path.display())))
}

/// Blocking GET via `ureq` — acceptable here because each acquisition
/// already runs on its own worker thread (§4.1 step 2, `worker::MediaWorker`).
fn fetch_remote(url: &str) -> Result<Vec<u8>, EngineError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| EngineError::Acquisition(format!("GET {url} failed: {e}")))?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| EngineError::Acquisition(format!("failed to read response body from {url}: {e}")))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reeldeck_core::media_item::UserSelectedSource;
    use std::sync::Arc;

    struct NoopFs;
    impl ProjectFilesystem for NoopFs {
        fn load_config(&self) -> reeldeck_core::error::CoreResult<reeldeck_core::project::UnifiedProjectConfig> {
            unimplemented!()
        }
        fn save_config(&self, _c: &reeldeck_core::project::UnifiedProjectConfig) -> reeldeck_core::error::CoreResult<()> {
            unimplemented!()
        }
        fn read_media(&self, _id: &str) -> reeldeck_core::error::CoreResult<Vec<u8>> {
            Ok(b"project media bytes".to_vec())
        }
        fn write_media(&self, _id: &str, _b: &[u8]) -> reeldeck_core::error::CoreResult<()> {
            unimplemented!()
        }
        fn media_exists(&self, _id: &str) -> bool {
            true
        }
        fn read_media_meta(&self, _id: &str) -> reeldeck_core::error::CoreResult<Option<reeldeck_core::fs::MediaSidecar>> {
            Ok(None)
        }
        fn write_media_meta(&self, _id: &str, _m: &reeldeck_core::fs::MediaSidecar) -> reeldeck_core::error::CoreResult<()> {
            unimplemented!()
        }
        fn list_media_references(&self) -> reeldeck_core::error::CoreResult<Vec<String>> {
            unimplemented!()
        }
        fn cleanup_unused_media_files(&self, _in_use: &std::collections::HashSet<String>) -> reeldeck_core::error::CoreResult<Vec<String>> {
            unimplemented!()
        }
    }

    #[test]
    fn user_selected_without_a_path_is_an_acquisition_error() {
        let source = DataSource::UserSelected(UserSelectedSource::default());
        let fsys: Arc<dyn ProjectFilesystem> = Arc::new(NoopFs);
        let err = acquire(&source, fsys.as_ref()).unwrap_err();
        assert!(matches!(err, EngineError::Acquisition(_)));
    }

    #[test]
    fn user_selected_reads_bytes_from_its_local_path() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("clip.bin");
        std::fs::write(&file_path, b"hello clip").unwrap();

        let source = DataSource::UserSelected(UserSelectedSource {
            progress: 0,
            local_path: Some(file_path),
            media_reference_id: None,
        });
        let fsys: Arc<dyn ProjectFilesystem> = Arc::new(NoopFs);
        let bytes = acquire(&source, fsys.as_ref()).unwrap();
        assert_eq!(bytes, b"hello clip");
    }

    #[test]
    fn project_reference_reads_through_the_filesystem_trait() {
        let source = DataSource::ProjectReference(reeldeck_core::media_item::ProjectReferenceSource {
            media_reference_id: "ref-1".into(),
        });
        let fsys: Arc<dyn ProjectFilesystem> = Arc::new(NoopFs);
        let bytes = acquire(&source, fsys.as_ref()).unwrap();
        assert_eq!(bytes, b"project media bytes");
    }
}
