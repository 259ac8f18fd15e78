use std::path::PathBuf;

use ndarray::{Array2, ArrayView1};
use serde::Deserialize;

/// Sample rate every buffer is normalised to before separation.
pub const TARGET_SAMPLE_RATE: u32 = 44_100;

/// Raw decoder output: interleaved samples at the source rate and layout.
#[derive(Clone, Debug)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Stereo samples laid out as `(frames, 2)`.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    pub samples: Array2<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn from_frames(frames: &[[f32; 2]], sample_rate: u32) -> Self {
        let mut samples = Array2::<f32>::zeros((frames.len(), 2));
        for (i, frame) in frames.iter().enumerate() {
            samples[(i, 0)] = frame[0];
            samples[(i, 1)] = frame[1];
        }
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn from_planar(left: &[f32], right: &[f32], sample_rate: u32) -> Self {
        let n = left.len().min(right.len());
        let mut samples = Array2::<f32>::zeros((n, 2));
        for i in 0..n {
            samples[(i, 0)] = left[i];
            samples[(i, 1)] = right[i];
        }
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn frames(&self) -> usize {
        self.samples.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    pub fn channel(&self, ch: usize) -> ArrayView1<'_, f32> {
        self.samples.column(ch)
    }
}

/// The two signals produced for one input file.
#[derive(Clone, Debug)]
pub struct SeparationResult {
    pub vocal: AudioBuffer,
    pub accompaniment: AudioBuffer,
}

/// One input file scheduled for processing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileTask {
    pub path: PathBuf,
    /// Source folder the file was grouped under.
    pub folder: PathBuf,
    pub dest_folder: PathBuf,
}

/// What happened to a single file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileOutcome {
    Separated { tracks: usize },
    DecodeFailure(String),
    SeparationFailure(String),
    WriteFailure(String),
}

impl FileOutcome {
    pub fn tracks(&self) -> usize {
        match self {
            FileOutcome::Separated { tracks } => *tracks,
            _ => 0,
        }
    }
}

/// Counters for one traversal pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_processed: usize,
    pub tracks_written: usize,
    pub decode_failures: usize,
    pub separation_failures: usize,
    pub write_failures: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &FileOutcome) {
        self.files_processed += 1;
        self.tracks_written += outcome.tracks();
        match outcome {
            FileOutcome::Separated { .. } => {}
            FileOutcome::DecodeFailure(_) => self.decode_failures += 1,
            FileOutcome::SeparationFailure(_) => self.separation_failures += 1,
            FileOutcome::WriteFailure(_) => self.write_failures += 1,
        }
    }

    pub fn failures(&self) -> usize {
        self.decode_failures + self.separation_failures + self.write_failures
    }
}

/// What to do with an already written vocal file when the music file fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PartialWritePolicy {
    #[default]
    Rollback,
    Keep,
}

#[derive(Clone, Debug, Default)]
pub struct BatchOptions {
    pub partial_writes: PartialWritePolicy,
}

#[derive(Clone, Debug)]
pub struct SplitOptions {
    pub model_name: String,
    pub manifest_url_override: Option<String>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            model_name: "htdemucs_ort_v1".into(),
            manifest_url_override: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    pub file: String,
    pub url: String,
    pub sha256: String,
    #[serde(default)]
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelManifest {
    pub name: String,
    pub version: String,
    pub backend: String,
    pub sample_rate: u32,
    pub window: usize,
    pub hop: usize,
    pub stems: Vec<String>,
    #[serde(default)]
    pub input_layout: String,
    #[serde(default)]
    pub output_layout: String,
    #[serde(default)]
    pub artifacts: Vec<ModelArtifact>,
}

impl ModelManifest {
    /// First artifact with a usable url and checksum.
    pub fn resolve_primary_artifact(&self) -> std::result::Result<&ModelArtifact, String> {
        self.artifacts
            .iter()
            .find(|a| !a.url.is_empty() && a.sha256.len() >= 8)
            .ok_or_else(|| format!("manifest `{}` lists no downloadable artifact", self.name))
    }
}
