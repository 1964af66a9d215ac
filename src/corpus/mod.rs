//! Readers for the two corpus side files: transcripts and speaker metadata.

pub mod annotation;
pub mod speaker;

pub use annotation::{load_transcripts, TranscriptMap};
pub use speaker::{load_speaker_meta, SpeakerMap, SpeakerMeta};
