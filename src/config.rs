//! Run configuration: where the corpus inputs live and where the CSV goes.
//!
//! Configurations are typically loaded from YAML files using [`load_config`],
//! or derived from an AISHELL-3 style dataset directory with
//! [`CorpusConfig::from_dataset_root`].

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Annotation filename inside a dataset split directory.
pub const ANNOTATION_FILENAME: &str = "content.txt";
/// Speaker metadata filename, stored next to the split directories.
pub const SPEAKER_INFO_FILENAME: &str = "spk-info.txt";
/// Audio directory inside a dataset split directory.
pub const AUDIO_DIRNAME: &str = "wav";
/// Output CSV name used when none is configured.
pub const DEFAULT_OUTPUT: &str = "aishell3_for_parler.csv";

/// Paths and options for one join run.
///
/// # Example YAML
///
/// ```yaml
/// annotation_path: train/content.txt
/// speaker_info_path: spk-info.txt
/// audio_root: train/wav
/// output_path: aishell3_for_parler.csv
/// audio_extension: wav
/// sort_rows: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorpusConfig {
    /// Transcript annotation file (`content.txt`).
    pub annotation_path: PathBuf,
    /// Speaker metadata file (`spk-info.txt`); may be absent on disk.
    pub speaker_info_path: PathBuf,
    /// Root of the audio tree, one subdirectory per speaker.
    pub audio_root: PathBuf,
    /// Destination CSV.
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// Extension (without the dot) of files treated as audio.
    #[serde(default = "default_audio_extension")]
    pub audio_extension: String,
    /// Sort rows by utterance id for reproducible output.
    #[serde(default = "default_sort_rows")]
    pub sort_rows: bool,
}

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

fn default_audio_extension() -> String {
    "wav".to_string()
}

fn default_sort_rows() -> bool {
    true
}

impl CorpusConfig {
    /// Build a config with default output and options.
    pub fn new(
        annotation_path: impl Into<PathBuf>,
        speaker_info_path: impl Into<PathBuf>,
        audio_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            annotation_path: annotation_path.into(),
            speaker_info_path: speaker_info_path.into(),
            audio_root: audio_root.into(),
            output_path: default_output_path(),
            audio_extension: default_audio_extension(),
            sort_rows: default_sort_rows(),
        }
    }

    /// Conventional AISHELL-3 layout rooted at a split directory such as
    /// `datasets/train`:
    ///
    /// - `train/content.txt`
    /// - `train/wav/<speaker>/<utt>.wav`
    /// - `spk-info.txt` in the parent of `train`
    pub fn from_dataset_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let parent = root
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::new(
            root.join(ANNOTATION_FILENAME),
            parent.join(SPEAKER_INFO_FILENAME),
            root.join(AUDIO_DIRNAME),
        )
    }

    /// Resolve every relative path against the directory of `config_path`.
    fn resolve_against(mut self, config_path: &Path) -> Self {
        self.annotation_path = resolve_relative_path(config_path, &self.annotation_path);
        self.speaker_info_path = resolve_relative_path(config_path, &self.speaker_info_path);
        self.audio_root = resolve_relative_path(config_path, &self.audio_root);
        self.output_path = resolve_relative_path(config_path, &self.output_path);
        self
    }
}

/// Load a run configuration from a YAML file.
///
/// Relative paths in the file are resolved against the file's directory.
///
/// # Errors
///
/// Returns an error if the file doesn't exist or contains invalid YAML.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<CorpusConfig> {
    let path = path.as_ref();
    if !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }

    let data = fs::read_to_string(path)?;
    let config: CorpusConfig = serde_yaml::from_str(&data)?;
    Ok(config.resolve_against(path))
}

/// Resolve a possibly relative path against a config file location.
pub fn resolve_relative_path(config_path: &Path, maybe_relative: &Path) -> PathBuf {
    if maybe_relative.is_absolute() {
        return maybe_relative.to_path_buf();
    }
    config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(maybe_relative)
}
