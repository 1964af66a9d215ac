//! Shared test utilities for building corpus trees and reading CSV output.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const FIXTURE_DIR: &str = "tests/fixtures";

/// Audio files created under `wav/`, relative to the audio root.
///
/// `SSB00050003` has no transcript and `SSB0999` has no speaker metadata.
pub const AUDIO_FILES: &[&str] = &[
    "SSB0005/SSB00050001.wav",
    "SSB0005/SSB00050002.wav",
    "SSB0005/SSB00050003.wav",
    "SSB0005/notes.txt",
    "SSB0012/SSB00120001.wav",
    "SSB0999/SSB09990001.wav",
];

/// Path to a file in `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join(FIXTURE_DIR)
        .join(name)
}

/// A temporary AISHELL-3 style corpus:
///
/// ```text
/// <tmp>/datasets/spk-info.txt
/// <tmp>/datasets/train/content.txt
/// <tmp>/datasets/train/wav/<speaker>/<utt>.wav
/// ```
pub struct Corpus {
    pub dir: TempDir,
    pub dataset_root: PathBuf,
    pub annotation: PathBuf,
    pub speaker_info: PathBuf,
    pub audio_root: PathBuf,
    pub output: PathBuf,
}

/// Create the fixture corpus in a fresh temporary directory.
pub fn build_corpus() -> Corpus {
    let dir = tempfile::tempdir().expect("tempdir");
    let datasets = dir.path().join("datasets");
    let dataset_root = datasets.join("train");
    let audio_root = dataset_root.join("wav");

    for rel in AUDIO_FILES {
        let path = audio_root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).expect("create speaker dir");
        fs::write(&path, b"RIFF\0\0\0\0WAVE").expect("write audio stub");
    }

    let annotation = dataset_root.join("content.txt");
    fs::copy(fixture_path("content.txt"), &annotation).expect("copy content.txt");
    let speaker_info = datasets.join("spk-info.txt");
    fs::copy(fixture_path("spk-info.txt"), &speaker_info).expect("copy spk-info.txt");

    let output = dir.path().join("out.csv");
    Corpus {
        dir,
        dataset_root,
        annotation,
        speaker_info,
        audio_root,
        output,
    }
}

/// Read a CSV file into its header and records.
pub fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path)
        .unwrap_or_else(|e| panic!("failed to open csv {}: {e}", path.display()));
    let header = reader
        .headers()
        .expect("csv header")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|record| {
            record
                .expect("csv record")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect();
    (header, rows)
}

/// Find the record with the given `utt_id` (last column).
pub fn row_for<'a>(rows: &'a [Vec<String>], utt_id: &str) -> &'a [String] {
    rows.iter()
        .find(|row| row.last().map(String::as_str) == Some(utt_id))
        .unwrap_or_else(|| panic!("no row for {utt_id}"))
}
