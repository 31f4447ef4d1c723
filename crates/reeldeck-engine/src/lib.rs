// crates/reeldeck-engine/src/lib.rs
//
// The concrete adapters `reeldeck-core` requires but does not implement
// itself (§6): a threaded media-acquisition worker pool, a local-filesystem
// `ProjectFilesystem`, and a reference `CanvasEngine`. `reeldeck-core`
// never depends on this crate — the dependency runs the other way, same as
// the teacher's `velocut-media` depending on `velocut-core`, not vice versa.

#![forbid(unsafe_code)]

pub mod acquisition;
pub mod local_fs;
pub mod null_canvas;
pub mod worker;

use thiserror::Error;

/// IO/thread-boundary failures specific to this crate's adapters.
///
/// `reeldeck-core` never sees this type directly: `ProjectFilesystem`
/// methods already return `CoreResult` (see `local_fs`), and
/// `worker::MediaWorker`'s result channel carries the `media_id` the
/// caller needs to build `CoreError::SourceAcquisition` itself — a
/// mechanical `From` impl here would have to invent that id, so the
/// conversion is left to the call site that actually has it.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("acquisition failed: {0}")]
    Acquisition(String),
}
