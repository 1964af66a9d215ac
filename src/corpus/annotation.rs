//! Transcript annotation parsing.
//!
//! Each line of an annotation file pairs an audio filename with the
//! utterance written as interleaved characters and pinyin:
//!
//! ```text
//! SSB00050001.wav	广 guang3 州 zhou1 女 nv3 大 da4 学 xue2 生 sheng1
//! ```
//!
//! Parsing keeps the characters and drops the pinyin, yielding
//! `SSB00050001.wav -> 广州女大学生`.

use crate::error::JoinError;
use crate::perf::{self, Metric};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Audio filename to cleaned transcript text.
pub type TranscriptMap = HashMap<String, String>;

/// Outcome of parsing a single annotation line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationLine {
    /// Empty or `#` comment line.
    Blank,
    /// No filename/content split could be found.
    Malformed,
    /// A filename with its stripped transcript (possibly empty).
    Entry { filename: String, text: String },
}

/// Return true when `token` is a pinyin annotation rather than text.
///
/// A token is annotation iff it is non-empty, pure ASCII, and made only of
/// letters and digits (`guang3`, `nv3`, `A1`). Anything with non-ASCII
/// characters or ASCII punctuation (`广`, `。`, `A-1`) is text.
pub fn is_pronunciation_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Concatenate the text tokens of `content`, dropping pinyin annotations.
pub fn strip_pronunciation(content: &str) -> String {
    content
        .split_whitespace()
        .filter(|token| !is_pronunciation_token(token))
        .collect()
}

/// Parse one annotation line.
///
/// A tab takes precedence: the filename is exactly the text before the first
/// tab. Without a tab the line is split once on whitespace.
pub fn parse_annotation_line(line: &str) -> AnnotationLine {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return AnnotationLine::Blank;
    }

    let (filename, content) = match line.split_once('\t') {
        Some(split) => split,
        None => match line.split_once(char::is_whitespace) {
            Some((name, rest)) if !rest.trim().is_empty() => (name, rest),
            _ => return AnnotationLine::Malformed,
        },
    };

    AnnotationLine::Entry {
        filename: filename.to_string(),
        text: strip_pronunciation(content),
    }
}

/// Parse every line from `reader` into a transcript map.
///
/// Malformed lines are skipped with a warning. Repeated filenames keep the
/// last occurrence.
pub fn parse_transcripts<R: BufRead>(reader: R) -> Result<TranscriptMap> {
    let mut transcripts = TranscriptMap::new();
    let mut skipped = 0u64;
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read annotation line {}", idx + 1))?;
        perf::add_count(Metric::AnnotationLines, 1);
        match parse_annotation_line(&line) {
            AnnotationLine::Blank => {}
            AnnotationLine::Malformed => {
                skipped += 1;
                log::warn!("Skipping unparseable annotation line {}: {}", idx + 1, line.trim());
            }
            AnnotationLine::Entry { filename, text } => {
                transcripts.insert(filename, text);
            }
        }
    }
    perf::add_count(Metric::AnnotationSkipped, skipped);
    Ok(transcripts)
}

/// Load an annotation file from disk.
///
/// # Errors
///
/// Returns [`JoinError::AnnotationNotFound`] if the file does not exist, or an
/// I/O error if it cannot be read as UTF-8 text.
pub fn load_transcripts(path: impl AsRef<Path>) -> Result<TranscriptMap> {
    let _span = perf::span(Metric::AnnotationLoad);
    let path = path.as_ref();
    if !path.exists() {
        return Err(JoinError::AnnotationNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open annotation file {}", path.display()))?;
    let transcripts = parse_transcripts(BufReader::new(file))?;
    log::info!(
        "Parsed {} transcripts from {}",
        transcripts.len(),
        path.display()
    );
    Ok(transcripts)
}
