mod common;

use common::{build_corpus, read_csv, row_for};
use corpus_joiner::{run_join, CorpusConfig, JoinError, JoinOptions};
use std::fs;

fn corpus_config(corpus: &common::Corpus) -> CorpusConfig {
    let mut config = CorpusConfig::new(
        &corpus.annotation,
        &corpus.speaker_info,
        &corpus.audio_root,
    );
    config.output_path = corpus.output.clone();
    config
}

#[test]
fn joins_fixture_corpus() {
    let corpus = build_corpus();
    let summary = run_join(&corpus_config(&corpus), JoinOptions::default()).expect("join");

    assert_eq!(summary.rows_written, 4);
    assert_eq!(summary.stats.audio_files, 5);
    assert_eq!(summary.stats.missing_transcript, 1);
    assert_eq!(summary.stats.missing_speaker_meta, 1);

    let (header, rows) = read_csv(&corpus.output);
    assert_eq!(
        header,
        ["audio", "transcription", "speaker_id", "gender", "accent", "utt_id"]
    );
    assert_eq!(rows.len(), 4);

    let expected_audio = fs::canonicalize(corpus.audio_root.join("SSB0005/SSB00050001.wav"))
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert_eq!(
        row_for(&rows, "SSB00050001"),
        [
            expected_audio.as_str(),
            "广州女大学生",
            "SSB0005",
            "female",
            "north",
            "SSB00050001"
        ]
    );

    let space_separated = row_for(&rows, "SSB00120001");
    assert_eq!(space_separated[1], "警方找到");
    assert_eq!(space_separated[3], "male");
    assert_eq!(space_separated[4], "south");
}

#[test]
fn speaker_without_metadata_gets_empty_fields() {
    let corpus = build_corpus();
    run_join(&corpus_config(&corpus), JoinOptions::default()).expect("join");

    let (_, rows) = read_csv(&corpus.output);
    let row = row_for(&rows, "SSB09990001");
    assert_eq!(row[1], "你好,世界");
    assert_eq!(row[2], "SSB0999");
    assert_eq!(row[3], "");
    assert_eq!(row[4], "");
}

#[test]
fn missing_speaker_file_is_tolerated() {
    let corpus = build_corpus();
    fs::remove_file(&corpus.speaker_info).unwrap();

    let summary = run_join(&corpus_config(&corpus), JoinOptions::default()).expect("join");
    assert_eq!(summary.rows_written, 4);
    assert_eq!(summary.stats.missing_speaker_meta, 4);
}

#[test]
fn sorted_output_is_byte_identical_across_runs() {
    let corpus = build_corpus();
    let config = corpus_config(&corpus);

    run_join(&config, JoinOptions::default()).expect("first join");
    let first = fs::read(&corpus.output).unwrap();
    run_join(&config, JoinOptions::default()).expect("second join");
    let second = fs::read(&corpus.output).unwrap();
    assert_eq!(first, second);

    let (_, rows) = read_csv(&corpus.output);
    let ids: Vec<&str> = rows.iter().map(|r| r[5].as_str()).collect();
    assert_eq!(
        ids,
        ["SSB00050001", "SSB00050002", "SSB00120001", "SSB09990001"]
    );
}

#[test]
fn traversal_order_keeps_same_rows() {
    let corpus = build_corpus();
    let mut config = corpus_config(&corpus);
    config.sort_rows = false;

    let summary = run_join(&config, JoinOptions::default()).expect("join");
    assert_eq!(summary.rows_written, 4);
    let (_, rows) = read_csv(&corpus.output);
    let mut ids: Vec<&str> = rows.iter().map(|r| r[5].as_str()).collect();
    ids.sort();
    assert_eq!(
        ids,
        ["SSB00050001", "SSB00050002", "SSB00120001", "SSB09990001"]
    );
}

#[test]
fn missing_annotation_is_fatal() {
    let corpus = build_corpus();
    fs::remove_file(&corpus.annotation).unwrap();

    let err = run_join(&corpus_config(&corpus), JoinOptions::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<JoinError>(),
        Some(JoinError::AnnotationNotFound { .. })
    ));
    assert!(!corpus.output.exists());
}

#[test]
fn zero_matches_is_fatal_and_writes_nothing() {
    let corpus = build_corpus();
    fs::write(&corpus.annotation, "OTHER0001.wav\t你 ni3\n").unwrap();

    let err = run_join(&corpus_config(&corpus), JoinOptions::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<JoinError>(),
        Some(JoinError::NoRows { audio_files: 5 })
    ));
    assert!(!corpus.output.exists());
}

#[test]
fn dry_run_reports_without_writing() {
    let corpus = build_corpus();
    let summary = run_join(&corpus_config(&corpus), JoinOptions { dry_run: true }).expect("join");
    assert!(summary.dry_run);
    assert_eq!(summary.rows_written, 4);
    assert!(!corpus.output.exists());
    assert!(summary.to_string().starts_with("Dry run: 4 rows matched"));
}

#[test]
fn custom_extension_selects_other_files() {
    let corpus = build_corpus();
    fs::write(
        &corpus.annotation,
        "SSB00050001.flac\t广 guang3 州 zhou1\n",
    )
    .unwrap();
    fs::write(corpus.audio_root.join("SSB0005/SSB00050001.flac"), b"fLaC").unwrap();

    let mut config = corpus_config(&corpus);
    config.audio_extension = "flac".to_string();
    let summary = run_join(&config, JoinOptions::default()).expect("join");
    assert_eq!(summary.rows_written, 1);
    assert_eq!(summary.stats.audio_files, 1);
}

#[cfg(unix)]
mod unix {
    use super::corpus_config;
    use crate::common::{build_corpus, read_csv, row_for};
    use corpus_joiner::{run_join, JoinOptions};
    use std::fs::{self, OpenOptions};
    use std::io::Write;
    use std::os::unix::fs::symlink;

    #[test]
    fn dangling_audio_symlink_does_not_abort() {
        let corpus = build_corpus();
        let dangling = corpus.audio_root.join("SSB0005/SSB00050009.wav");
        symlink("/nonexistent/x.wav", &dangling).unwrap();
        symlink("/nonexistent/y.wav", corpus.audio_root.join("SSB0005/SSB00050010.wav")).unwrap();
        let mut annotation = OpenOptions::new()
            .append(true)
            .open(&corpus.annotation)
            .unwrap();
        writeln!(annotation, "SSB00050009.wav\t新 xin1").unwrap();

        let summary = run_join(&corpus_config(&corpus), JoinOptions::default()).expect("join");
        assert_eq!(summary.stats.audio_files, 7);
        assert_eq!(summary.stats.missing_transcript, 2);
        assert_eq!(summary.rows_written, 5);

        let (_, rows) = read_csv(&corpus.output);
        let row = row_for(&rows, "SSB00050009");
        assert!(row[0].ends_with("SSB0005/SSB00050009.wav"), "audio: {}", row[0]);
        assert_eq!(row[1], "新");
        assert_eq!(row[2], "SSB0005");
    }

    #[test]
    fn symlinked_speaker_dir_is_not_descended() {
        let corpus = build_corpus();
        symlink(
            corpus.audio_root.join("SSB0005"),
            corpus.audio_root.join("SSB0005_alias"),
        )
        .unwrap();

        let summary = run_join(&corpus_config(&corpus), JoinOptions::default()).expect("join");
        assert_eq!(summary.rows_written, 4);
        assert_eq!(summary.stats.audio_files, 5);

        let (_, rows) = read_csv(&corpus.output);
        assert!(rows.iter().all(|row| row[2] != "SSB0005_alias"));
        assert_eq!(
            rows.iter().filter(|row| row[5] == "SSB00050001").count(),
            1
        );
    }

    #[test]
    fn symlinked_audio_file_is_kept() {
        let corpus = build_corpus();
        let elsewhere = corpus.dir.path().join("SSB00050003.wav");
        fs::rename(corpus.audio_root.join("SSB0005/SSB00050003.wav"), &elsewhere).unwrap();
        symlink(&elsewhere, corpus.audio_root.join("SSB0005/SSB00050003.wav")).unwrap();

        let summary = run_join(&corpus_config(&corpus), JoinOptions::default()).expect("join");
        assert_eq!(summary.stats.audio_files, 5);
    }
}
