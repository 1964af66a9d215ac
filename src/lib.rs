//! # corpus-joiner - speech corpus to training CSV
//!
//! Joins an AISHELL-3 style Mandarin speech corpus into a single CSV with
//! the columns `audio, transcription, speaker_id, gender, accent, utt_id`.
//!
//! ## Inputs
//!
//! 1. **Transcripts** ([`corpus::annotation`]): `content.txt`, one line per
//!    utterance with characters interleaved with pinyin. Pinyin tokens are
//!    dropped.
//! 2. **Speaker metadata** ([`corpus::speaker`]): `spk-info.txt`, one line per
//!    speaker with age group, gender and accent. Optional.
//! 3. **Audio tree**: `wav/<speaker_id>/<utt_id>.wav`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use corpus_joiner::{run_join, CorpusConfig, JoinOptions};
//!
//! let mut config = CorpusConfig::from_dataset_root("datasets/train");
//! config.output_path = "train.csv".into();
//! let summary = run_join(&config, JoinOptions::default()).unwrap();
//! println!("{summary}");
//! ```
//!
//! ## Configuration
//!
//! Runs can also be described in YAML and loaded with [`load_config`]. See
//! [`CorpusConfig`] for the fields.

pub mod config;
pub mod corpus;
pub mod error;
pub mod join;
pub mod perf;

pub use config::{load_config, CorpusConfig};
pub use corpus::annotation::{is_pronunciation_token, parse_annotation_line, AnnotationLine};
pub use error::JoinError;
pub use join::{run_join, JoinOptions, JoinStats, JoinSummary, OutputRow};
