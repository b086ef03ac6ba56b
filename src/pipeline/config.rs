use std::{fs::File, io::BufReader, path::Path, path::PathBuf};

use anyhow::Context as _;

use crate::{
    dataset::writer::FrameFormat,
    foundation::core::Canvas,
    foundation::error::{MmnistError, MmnistResult},
    generate::subset::SubsetParams,
    motion::digit::DigitConfig,
};

/// Sequence-level parallelism.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GenerateThreading {
    /// Render and write sequences on a dedicated rayon pool.
    pub parallel: bool,
    /// Override the number of worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
}

/// Full dataset generation settings.
///
/// Every field has a default, so a JSON config only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub seed: u64,
    /// Directory holding `train-images`, `train-labels`, `test-images`, `test-labels`.
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Number of train sequences.
    pub train_size: usize,
    /// Number of test sequences.
    pub test_size: usize,
    pub n_frames: u32,
    pub min_digits: usize,
    pub max_digits: usize,
    pub canvas: Canvas,
    pub digit: DigitConfig,
    pub frame_format: FrameFormat,
    pub threading: GenerateThreading,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 13,
            data_dir: PathBuf::from("mnist"),
            output_dir: PathBuf::from("dataset"),
            train_size: 2500,
            test_size: 600,
            n_frames: 10,
            min_digits: 2,
            max_digits: 4,
            canvas: Canvas {
                width: 128,
                height: 128,
            },
            digit: DigitConfig::default(),
            frame_format: FrameFormat::default(),
            threading: GenerateThreading::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_json_file(path: &Path) -> MmnistResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse config '{}'", path.display()))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> MmnistResult<()> {
        if let Some(n) = self.threading.threads
            && n == 0
        {
            return Err(MmnistError::validation(
                "threading 'threads' must be >= 1 when set",
            ));
        }
        self.subset_params(self.train_size).validate()
    }

    /// Sequence parameters for a split of `n_sequences`.
    pub fn subset_params(&self, n_sequences: usize) -> SubsetParams {
        SubsetParams {
            n_sequences,
            n_frames: self.n_frames,
            min_digits: self.min_digits,
            max_digits: self.max_digits,
            canvas: self.canvas,
            digit: self.digit.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/config.rs"]
mod tests;
