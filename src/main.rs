//! Command-line interface for the corpus joiner.
//!
//! `join` builds the training CSV; `strip` shows how a single annotation
//! line is parsed.

use anyhow::Result;
use clap::{Parser, Subcommand};
use corpus_joiner::config::{load_config, CorpusConfig};
use corpus_joiner::corpus::annotation::{parse_annotation_line, AnnotationLine};
use corpus_joiner::error::JoinError;
use corpus_joiner::join::{run_join, JoinOptions};
use corpus_joiner::perf;
use std::path::PathBuf;

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "corpus-joiner")]
#[command(about = "Join speech corpus transcripts, speaker metadata and audio into a CSV", long_about = None)]
struct Cli {
    /// Print performance summary at the end of the run.
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Build the CSV from transcripts, speaker metadata and the audio tree.
    Join {
        /// Run configuration YAML.
        #[arg(long, conflicts_with = "dataset_root")]
        config: Option<PathBuf>,
        /// AISHELL-3 split directory (with content.txt and wav/).
        #[arg(long)]
        dataset_root: Option<PathBuf>,
        /// Transcript annotation file.
        #[arg(long)]
        annotation: Option<PathBuf>,
        /// Speaker metadata file.
        #[arg(long)]
        speaker_info: Option<PathBuf>,
        /// Root of the audio tree.
        #[arg(long)]
        audio_root: Option<PathBuf>,
        /// Output CSV path.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Audio file extension, without the dot.
        #[arg(long)]
        extension: Option<String>,
        /// Keep directory traversal order instead of sorting by utterance id.
        #[arg(long)]
        keep_traversal_order: bool,
        /// Match and count, but do not write the CSV.
        #[arg(long)]
        dry_run: bool,
    },
    /// Parse one annotation line and print `filename<TAB>text`.
    Strip {
        /// Annotation line, e.g. "SSB00050001.wav\t广 guang3 州 zhou1".
        line: String,
    },
}

#[derive(Debug, Clone, Default)]
struct JoinArgs {
    config: Option<PathBuf>,
    dataset_root: Option<PathBuf>,
    annotation: Option<PathBuf>,
    speaker_info: Option<PathBuf>,
    audio_root: Option<PathBuf>,
    output: Option<PathBuf>,
    extension: Option<String>,
    keep_traversal_order: bool,
    dry_run: bool,
}

/// Entry point for the CLI.
fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Join {
            config,
            dataset_root,
            annotation,
            speaker_info,
            audio_root,
            output,
            extension,
            keep_traversal_order,
            dry_run,
        } => {
            let args = JoinArgs {
                config,
                dataset_root,
                annotation,
                speaker_info,
                audio_root,
                output,
                extension,
                keep_traversal_order,
                dry_run,
            };
            run_join_command(args)?;
        }
        Commands::Strip { line } => match parse_annotation_line(&line) {
            AnnotationLine::Entry { filename, text } => println!("{filename}\t{text}"),
            AnnotationLine::Blank => anyhow::bail!("Line is blank or a comment"),
            AnnotationLine::Malformed => anyhow::bail!("Could not split filename from text"),
        },
    }

    if cli.verbose {
        eprintln!("{}", perf::report());
    }

    Ok(())
}

fn run_join_command(args: JoinArgs) -> Result<()> {
    let dry_run = args.dry_run;
    let config = resolve_corpus_config(args)?;
    let summary = run_join(&config, JoinOptions { dry_run })?;
    println!("{summary}");
    Ok(())
}

/// Build the run configuration from a config file or dataset root, then
/// apply command-line overrides.
fn resolve_corpus_config(args: JoinArgs) -> Result<CorpusConfig> {
    let base = match (&args.config, &args.dataset_root) {
        (Some(path), _) => Some(load_config(path)?),
        (None, Some(root)) => Some(CorpusConfig::from_dataset_root(root)),
        (None, None) => None,
    };

    let mut config = match base {
        Some(config) => config,
        None => CorpusConfig::new(
            args.annotation
                .clone()
                .ok_or(JoinError::MissingSetting("--annotation"))?,
            args.speaker_info
                .clone()
                .ok_or(JoinError::MissingSetting("--speaker-info"))?,
            args.audio_root
                .clone()
                .ok_or(JoinError::MissingSetting("--audio-root"))?,
        ),
    };

    if let Some(path) = args.annotation {
        config.annotation_path = path;
    }
    if let Some(path) = args.speaker_info {
        config.speaker_info_path = path;
    }
    if let Some(path) = args.audio_root {
        config.audio_root = path;
    }
    if let Some(path) = args.output {
        config.output_path = path;
    }
    if let Some(extension) = args.extension {
        config.audio_extension = extension.trim_start_matches('.').to_string();
    }
    if args.keep_traversal_order {
        config.sort_rows = false;
    }
    Ok(config)
}
