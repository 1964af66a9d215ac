//! Corpus join: walk the audio tree and emit one CSV row per matched file.
//!
//! Each audio file is matched to its transcript by exact filename and to its
//! speaker by the name of its parent directory:
//!
//! ```text
//! wav/SSB0005/SSB00050001.wav
//!     ^^^^^^^ speaker_id  ^^^^^^^^^^^ utt_id
//! ```
//!
//! Files with no transcript are skipped and counted. Files whose speaker has
//! no metadata still produce a row, with empty gender and accent.

use crate::config::CorpusConfig;
use crate::corpus::{load_speaker_meta, load_transcripts, SpeakerMap, TranscriptMap};
use crate::error::JoinError;
use crate::perf::{self, Metric};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Column order of the output CSV.
pub const CSV_HEADER: [&str; 6] = [
    "audio",
    "transcription",
    "speaker_id",
    "gender",
    "accent",
    "utt_id",
];

/// One output CSV record. Field order matches [`CSV_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    /// Absolute path to the audio file.
    pub audio: String,
    /// Transcript with pinyin stripped; never empty.
    pub transcription: String,
    /// Parent directory name of the audio file.
    pub speaker_id: String,
    pub gender: String,
    pub accent: String,
    /// Audio filename without extension.
    pub utt_id: String,
}

/// Counters accumulated while building rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    /// Audio files visited.
    pub audio_files: usize,
    /// Files skipped because no (non-empty) transcript was found.
    pub missing_transcript: usize,
    /// Rows emitted without speaker metadata.
    pub missing_speaker_meta: usize,
}

/// Per-run switches that are not part of the on-disk configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinOptions {
    /// Match everything and report counts, but write nothing.
    pub dry_run: bool,
}

/// Result of a completed join.
#[derive(Debug, Clone)]
pub struct JoinSummary {
    pub rows_written: usize,
    pub stats: JoinStats,
    pub output_path: PathBuf,
    pub dry_run: bool,
}

impl fmt::Display for JoinSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            writeln!(
                f,
                "Dry run: {} rows matched, nothing written to {}",
                self.rows_written,
                self.output_path.display()
            )?;
        } else {
            writeln!(
                f,
                "Wrote {} rows to {}",
                self.rows_written,
                self.output_path.display()
            )?;
        }
        writeln!(
            f,
            "Audio files without transcript: {}",
            self.stats.missing_transcript
        )?;
        write!(
            f,
            "Rows without speaker metadata: {}",
            self.stats.missing_speaker_meta
        )
    }
}

/// Recursively collect files under `root` whose extension equals `extension`.
///
/// Order is filesystem traversal order. Directory symlinks are not
/// descended, so each physical file is visited once. Symlinked files are
/// kept, dangling ones included. Unreadable entries are logged and skipped.
pub fn find_audio_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let _span = perf::span(Metric::AudioScan);
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
        };
        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }
        if file_type.is_symlink() && fs::metadata(entry.path()).is_ok_and(|m| m.is_dir()) {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == extension);
        if matches {
            files.push(entry.into_path());
        }
    }
    perf::add_count(Metric::AudioFiles, files.len() as u64);
    log::info!("Found {} audio files under {}", files.len(), root.display());
    Ok(files)
}

fn lossy_name(name: Option<&std::ffi::OsStr>) -> String {
    name.map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Build the row for a single audio file, updating `stats`.
///
/// Returns `Ok(None)` when the file has no usable transcript.
pub fn build_row(
    audio_path: &Path,
    transcripts: &TranscriptMap,
    speakers: &SpeakerMap,
    stats: &mut JoinStats,
) -> Result<Option<OutputRow>> {
    stats.audio_files += 1;

    let filename = lossy_name(audio_path.file_name());
    let text = match transcripts.get(&filename) {
        Some(text) if !text.is_empty() => text,
        _ => {
            stats.missing_transcript += 1;
            log::debug!("No transcript for {filename}");
            return Ok(None);
        }
    };

    let utt_id = lossy_name(audio_path.file_stem());
    let speaker_id = lossy_name(audio_path.parent().and_then(Path::file_name));
    let (gender, accent) = match speakers.get(&speaker_id) {
        Some(meta) => (meta.gender.clone(), meta.accent.clone()),
        None => {
            stats.missing_speaker_meta += 1;
            (String::new(), String::new())
        }
    };

    let audio = match fs::canonicalize(audio_path) {
        Ok(audio) => audio,
        Err(e) => {
            log::warn!("Could not resolve {}: {e}", audio_path.display());
            std::path::absolute(audio_path)
                .with_context(|| format!("Failed to absolutize {}", audio_path.display()))?
        }
    };

    Ok(Some(OutputRow {
        audio: audio.to_string_lossy().into_owned(),
        transcription: text.clone(),
        speaker_id,
        gender,
        accent,
        utt_id,
    }))
}

/// Build rows for every audio file, in the given order.
pub fn build_rows(
    audio_files: &[PathBuf],
    transcripts: &TranscriptMap,
    speakers: &SpeakerMap,
) -> Result<(Vec<OutputRow>, JoinStats)> {
    let mut stats = JoinStats::default();
    let mut rows = Vec::with_capacity(audio_files.len());
    for path in audio_files {
        if let Some(row) = build_row(path, transcripts, speakers, &mut stats)? {
            rows.push(row);
        }
    }
    Ok((rows, stats))
}

/// Sort rows by utterance id, then by audio path.
pub fn sort_rows(rows: &mut [OutputRow]) {
    rows.sort_by(|a, b| a.utt_id.cmp(&b.utt_id).then_with(|| a.audio.cmp(&b.audio)));
}

/// Serialize `rows` as CSV (header first, CRLF terminators) into `writer`.
///
/// Returns the writer once everything has been flushed into it.
pub fn write_csv<W: Write>(writer: W, rows: &[OutputRow]) -> Result<W> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))
}

/// Write `rows` to `path`.
///
/// The CSV is written to a temporary file in the same directory and
/// persisted over `path`. On failure the temporary file is removed and
/// `path` is left untouched.
pub fn write_rows(path: &Path, rows: &[OutputRow]) -> Result<()> {
    let _span = perf::span(Metric::CsvWrite);
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
    write_csv(&mut temp, rows)?;
    temp.as_file().sync_all()?;
    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to move CSV into place at {}", path.display()))?;
    perf::add_count(Metric::RowsWritten, rows.len() as u64);
    Ok(())
}

/// Run the full join described by `config`.
///
/// # Errors
///
/// - [`JoinError::AudioRootNotFound`] if the audio root is missing
/// - [`JoinError::AnnotationNotFound`] if the annotation file is missing
/// - [`JoinError::NoRows`] if no audio file matched a transcript; nothing is
///   written in that case
pub fn run_join(config: &CorpusConfig, options: JoinOptions) -> Result<JoinSummary> {
    if !config.audio_root.exists() {
        return Err(JoinError::AudioRootNotFound {
            path: config.audio_root.clone(),
        }
        .into());
    }

    let transcripts = load_transcripts(&config.annotation_path)?;
    let speakers = load_speaker_meta(&config.speaker_info_path)?;

    let audio_files = find_audio_files(&config.audio_root, &config.audio_extension)?;
    let (mut rows, stats) = build_rows(&audio_files, &transcripts, &speakers)?;
    if rows.is_empty() {
        return Err(JoinError::NoRows {
            audio_files: stats.audio_files,
        }
        .into());
    }
    if config.sort_rows {
        sort_rows(&mut rows);
    }

    if !options.dry_run {
        write_rows(&config.output_path, &rows)?;
    }

    if stats.missing_transcript > 0 {
        log::warn!(
            "{} audio files have no transcript in {}",
            stats.missing_transcript,
            config.annotation_path.display()
        );
    }
    if stats.missing_speaker_meta > 0 {
        log::warn!(
            "{} rows have no gender/accent in {}",
            stats.missing_speaker_meta,
            config.speaker_info_path.display()
        );
    }

    Ok(JoinSummary {
        rows_written: rows.len(),
        stats,
        output_path: config.output_path.clone(),
        dry_run: options.dry_run,
    })
}
