// crates/reeldeck-engine/src/worker.rs
//
// `MediaWorker`: the concrete threaded implementation of the acquisition
// stage `modules::media`'s state machine watches (§4.1). A bounded
// `crossbeam_channel` result queue, a semaphore-gated thread-per-job model
// capped at a concurrency constant, one acquisition path per `DataSource`
// variant, handing the acquired bytes to the injected `CanvasEngine` and
// forwarding the decode-stage result back over the same channel.
//
// Grounded on `velocut-media/src/worker.rs`'s `probe_clip` — the
// "gatekeeper thread acquires the semaphore before spawning the real work"
// pattern, so at most `MEDIA_CONCURRENCY + 1` threads exist at once rather
// than one parked thread per queued job.

use crate::acquisition;
use crate::null_canvas::ThumbnailGenerator;
use crate::EngineError;
use base64::Engine as _;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use reeldeck_core::canvas::CanvasEngine;
use reeldeck_core::error::CoreError;
use reeldeck_core::fs::ProjectFilesystem;
use reeldeck_core::ids::MediaId;
use reeldeck_core::media_item::{DataSource, MediaType};
use reeldeck_core::time::micros_to_frames;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Mirrors `PROBE_CONCURRENCY` in the teacher's `worker.rs` — at most this
/// many acquisition jobs run in parallel; the rest queue behind the
/// semaphore.
const MEDIA_CONCURRENCY: u32 = 4;

/// A unit of acquisition work submitted to the worker (§4.1 step 2).
pub struct AcquisitionJob {
    pub media_id: MediaId,
    pub source: DataSource,
    pub media_type: MediaType,
}

/// What comes back over [`MediaWorker::rx`]. The state machine in
/// `modules::media` only understands `apply_source_status`/`finish_decode`/
/// `fail` — callers translate these into those calls.
#[derive(Debug)]
pub enum AcquisitionResult {
    /// Acquisition is in flight (§4.1 "acquiring").
    Started { media_id: MediaId },
    /// The canvas engine resolved `create_*_clip` and returned metadata
    /// (§4.1 step 4: `{width, height, thumbnailUrl}`).
    Ready {
        media_id: MediaId,
        media_reference_id: String,
        width: u32,
        height: u32,
        duration_frames: i64,
        thumbnail_url: String,
    },
    /// Acquisition or decode failed (§4.1 "Failure").
    Failed { media_id: MediaId, message: String },
}

pub struct MediaWorker {
    pub rx: Receiver<AcquisitionResult>,
    tx: Sender<AcquisitionResult>,
    canvas: Arc<dyn CanvasEngine>,
    thumbnails: Arc<dyn ThumbnailGenerator>,
    filesystem: Arc<dyn ProjectFilesystem>,
    frame_rate: f64,
    shutdown: Arc<AtomicBool>,
    semaphore: Arc<(Mutex<u32>, Condvar)>,
}

impl MediaWorker {
    pub fn new(
        canvas: Arc<dyn CanvasEngine>,
        thumbnails: Arc<dyn ThumbnailGenerator>,
        filesystem: Arc<dyn ProjectFilesystem>,
        frame_rate: f64,
    ) -> Self {
        let (tx, rx) = bounded(512);
        Self {
            rx,
            tx,
            canvas,
            thumbnails,
            filesystem,
            frame_rate,
            shutdown: Arc::new(AtomicBool::new(false)),
            semaphore: Arc::new((Mutex::new(0), Condvar::new())),
        }
    }

    /// Stop accepting new acquisition results. In-flight jobs finish but
    /// their results are dropped rather than sent (§5: the core never sees
    /// state changes after it has released this worker).
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Spawn the gatekeeper thread for one acquisition job. Returns
    /// immediately; results arrive asynchronously over [`Self::rx`].
    pub fn submit(&self, job: AcquisitionJob) {
        let tx = self.tx.clone();
        let canvas = self.canvas.clone();
        let thumbnails = self.thumbnails.clone();
        let filesystem = self.filesystem.clone();
        let frame_rate = self.frame_rate;
        let shutdown = self.shutdown.clone();
        let semaphore = self.semaphore.clone();

        std::thread::spawn(move || {
            {
                let (lock, cvar) = &*semaphore;
                let mut count = lock.lock();
                while *count >= MEDIA_CONCURRENCY {
                    cvar.wait(&mut count);
                }
                *count += 1;
            }
            struct SemGuard(Arc<(Mutex<u32>, Condvar)>);
            impl Drop for SemGuard {
                fn drop(&mut self) {
                    let (lock, cvar) = &*self.0;
                    *lock.lock() -= 1;
                    cvar.notify_one();
                }
            }
            let _guard = SemGuard(semaphore);

            if shutdown.load(Ordering::Relaxed) {
                return;
            }

            let _ = tx.send(AcquisitionResult::Started { media_id: job.media_id });

            let result = run_job(&job, canvas.as_ref(), thumbnails.as_ref(), filesystem.as_ref(), frame_rate);
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            let _ = tx.send(result);
        });
    }
}

fn run_job(
    job: &AcquisitionJob,
    canvas: &dyn CanvasEngine,
    thumbnails: &dyn ThumbnailGenerator,
    filesystem: &dyn ProjectFilesystem,
    frame_rate: f64,
) -> AcquisitionResult {
    let media_id = job.media_id;

    let bytes = match acquisition::acquire(&job.source, filesystem) {
        Ok(bytes) => bytes,
        Err(e) => {
            let error = CoreError::SourceAcquisition { media_id, message: e.to_string() };
            tracing::warn!(media_id = %media_id, message = %error, "media acquisition failed");
            return AcquisitionResult::Failed { media_id, message: error.to_string() };
        }
    };

    let media_reference_id = match persist_if_needed(&job.source, &bytes, filesystem) {
        Ok(id) => id,
        Err(e) => return AcquisitionResult::Failed { media_id, message: e.to_string() },
    };

    let clip = match job.media_type {
        MediaType::Video => canvas.create_mp4_clip(&bytes),
        MediaType::Image => canvas.create_img_clip(&bytes),
        MediaType::Audio => canvas.create_audio_clip(&bytes),
        MediaType::Text | MediaType::Unknown => {
            return AcquisitionResult::Failed {
                media_id,
                message: format!("{:?} media does not go through clip acquisition", job.media_type),
            }
        }
    };

    let clip = match clip {
        Ok(clip) => clip,
        Err(e) => {
            let error = CoreError::Decode { media_id, message: e };
            tracing::error!(media_id = %media_id, message = %error, "canvas engine rejected clip creation");
            return AcquisitionResult::Failed { media_id, message: error.to_string() };
        }
    };

    let Some((width, height, duration_micros)) = canvas.clip_metadata(clip) else {
        let error = CoreError::Decode {
            media_id,
            message: "canvas engine returned no metadata for the created clip".into(),
        };
        return AcquisitionResult::Failed { media_id, message: error.to_string() };
    };

    let thumbnail_url = match thumbnails.generate(clip) {
        Ok(jpeg_bytes) => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(jpeg_bytes);
            format!("data:image/jpeg;base64,{encoded}")
        }
        Err(e) => {
            tracing::warn!(media_id = %media_id, message = %e, "thumbnail generation failed, continuing without one");
            String::new()
        }
    };

    AcquisitionResult::Ready {
        media_id,
        media_reference_id,
        width,
        height,
        duration_frames: micros_to_frames(duration_micros, frame_rate),
        thumbnail_url,
    }
}

/// User-selected and remote sources get copied into the project media
/// directory on first acquisition (§4.1 step 3); project-reference sources
/// are already there. Returns the id the caller should persist on the
/// `DataSource`.
fn persist_if_needed(
    source: &DataSource,
    bytes: &[u8],
    filesystem: &dyn ProjectFilesystem,
) -> Result<String, EngineError> {
    if let Some(existing) = source.media_reference_id() {
        if !existing.is_empty() {
            return Ok(existing.to_string());
        }
    }
    let media_reference_id = uuid::Uuid::new_v4().to_string();
    filesystem
        .write_media(&media_reference_id, bytes)
        .map_err(|e| EngineError::Acquisition(format!("failed to persist media: {e}")))?;
    Ok(media_reference_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_fs::LocalProjectFilesystem;
    use crate::null_canvas::NullCanvasEngine;
    use reeldeck_core::media_item::UserSelectedSource;
    use std::time::{Duration, Instant};

    fn recv_with_timeout(rx: &Receiver<AcquisitionResult>) -> AcquisitionResult {
        rx.recv_timeout(Duration::from_secs(5)).expect("worker result")
    }

    #[test]
    fn acquiring_a_user_selected_video_reaches_ready() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("clip.mp4");
        std::fs::write(&file_path, b"not really an mp4").unwrap();

        let project_dir = dir.path().join("project");
        let filesystem: Arc<dyn ProjectFilesystem> = Arc::new(LocalProjectFilesystem::new(&project_dir).unwrap());
        let engine = NullCanvasEngine::new();
        let canvas: Arc<dyn CanvasEngine> = engine.clone();
        let thumbnails: Arc<dyn ThumbnailGenerator> = engine;

        let worker = MediaWorker::new(canvas.clone(), thumbnails, filesystem, 30.0);
        canvas.initialize_canvas(reeldeck_core::canvas::CanvasOptions { width: 1920, height: 1080, bg_color: 0 });

        let media_id = MediaId::new();
        worker.submit(AcquisitionJob {
            media_id,
            source: DataSource::UserSelected(UserSelectedSource {
                progress: 100,
                local_path: Some(file_path),
                media_reference_id: None,
            }),
            media_type: MediaType::Video,
        });

        let started = recv_with_timeout(&worker.rx);
        assert!(matches!(started, AcquisitionResult::Started { media_id: id } if id == media_id));

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match recv_with_timeout(&worker.rx) {
                AcquisitionResult::Ready { media_id: id, width, height, duration_frames, media_reference_id, .. } => {
                    assert_eq!(id, media_id);
                    assert_eq!((width, height), (1920, 1080));
                    assert!(duration_frames > 0);
                    assert!(!media_reference_id.is_empty());
                    break;
                }
                AcquisitionResult::Failed { message, .. } => panic!("acquisition failed: {message}"),
                AcquisitionResult::Started { .. } => {
                    if Instant::now() > deadline {
                        panic!("timed out waiting for a terminal result");
                    }
                    continue;
                }
            }
        }
    }

    #[test]
    fn missing_local_path_reports_failure_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let filesystem: Arc<dyn ProjectFilesystem> = Arc::new(LocalProjectFilesystem::new(dir.path()).unwrap());
        let engine = NullCanvasEngine::new();
        let canvas: Arc<dyn CanvasEngine> = engine.clone();
        let thumbnails: Arc<dyn ThumbnailGenerator> = engine;
        let worker = MediaWorker::new(canvas, thumbnails, filesystem, 30.0);

        let media_id = MediaId::new();
        worker.submit(AcquisitionJob {
            media_id,
            source: DataSource::UserSelected(UserSelectedSource::default()),
            media_type: MediaType::Video,
        });

        assert!(matches!(recv_with_timeout(&worker.rx), AcquisitionResult::Started { .. }));
        assert!(matches!(recv_with_timeout(&worker.rx), AcquisitionResult::Failed { .. }));
    }
}
