//! Speaker metadata parsing (`spk-info.txt`).
//!
//! ```text
//! SSB0005  A  female  north
//! ```
//!
//! Columns are speaker id, age group, gender and accent. Extra columns are
//! ignored and shorter lines are dropped.

use crate::perf::{self, Metric};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Descriptive attributes for one speaker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeakerMeta {
    pub age_group: String,
    pub gender: String,
    pub accent: String,
}

/// Speaker id to metadata.
pub type SpeakerMap = HashMap<String, SpeakerMeta>;

/// Parse a metadata line into `(speaker_id, meta)`.
///
/// Returns `None` for blank, comment, or short lines.
pub fn parse_speaker_line(line: &str) -> Option<(String, SpeakerMeta)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut fields = line.split_whitespace();
    let (Some(speaker_id), Some(age_group), Some(gender), Some(accent)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return None;
    };
    Some((
        speaker_id.to_string(),
        SpeakerMeta {
            age_group: age_group.to_string(),
            gender: gender.to_string(),
            accent: accent.to_string(),
        },
    ))
}

/// Parse every line from `reader` into a speaker map.
pub fn parse_speaker_meta<R: BufRead>(reader: R) -> Result<SpeakerMap> {
    let mut speakers = SpeakerMap::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read speaker line {}", idx + 1))?;
        match parse_speaker_line(&line) {
            Some((speaker_id, meta)) => {
                speakers.insert(speaker_id, meta);
            }
            None => log::debug!("Ignoring speaker line {}: {:?}", idx + 1, line),
        }
    }
    Ok(speakers)
}

/// Load speaker metadata from disk.
///
/// A missing file is not an error: a warning is logged and an empty map is
/// returned, so every row ends up with empty gender and accent.
pub fn load_speaker_meta(path: impl AsRef<Path>) -> Result<SpeakerMap> {
    let _span = perf::span(Metric::SpeakerLoad);
    let path = path.as_ref();
    if !path.exists() {
        log::warn!(
            "Speaker metadata not found at {}; gender/accent will be empty",
            path.display()
        );
        return Ok(SpeakerMap::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open speaker metadata {}", path.display()))?;
    let speakers = parse_speaker_meta(BufReader::new(file))?;
    log::info!("Parsed {} speakers from {}", speakers.len(), path.display());
    Ok(speakers)
}
