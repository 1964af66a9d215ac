//! Fatal error conditions for a join run.
//!
//! Recoverable conditions (malformed lines, unmatched records) never surface
//! here; they are logged and counted instead.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a join before any output is written.
#[derive(Debug, Error)]
pub enum JoinError {
    /// The transcript annotation file does not exist.
    #[error("Annotation file not found: {}", path.display())]
    AnnotationNotFound { path: PathBuf },

    /// The audio root directory does not exist.
    #[error("Audio root not found: {}", path.display())]
    AudioRootNotFound { path: PathBuf },

    /// Traversal finished without a single matched row.
    #[error(
        "No usable rows from {audio_files} audio files; \
         check that annotation filenames match the audio tree"
    )]
    NoRows { audio_files: usize },

    /// A required path was neither configured nor passed on the command line.
    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),
}
