use std::collections::HashMap;

use tracing::{debug, info};

use crate::{
    core::engine::Engine,
    error::{Result, SplitError},
    io::progress::{emit_split_progress, SplitProgress},
    model::model_manager::{ensure_model, ModelHandle},
    types::{AudioBuffer, SeparationResult, SplitOptions, TARGET_SAMPLE_RATE},
};

/// Splits a stereo buffer into a vocal and an accompaniment signal of the
/// same shape.
pub trait Separator {
    fn separate(&mut self, input: &AudioBuffer) -> Result<SeparationResult>;
}

impl<S: Separator + ?Sized> Separator for Box<S> {
    fn separate(&mut self, input: &AudioBuffer) -> Result<SeparationResult> {
        (**self).separate(input)
    }
}

/// Where each output signal comes from among the model's stems.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StemMapping {
    pub vocals: usize,
    /// Indices summed into the accompaniment.
    pub accompaniment: Vec<usize>,
}

impl StemMapping {
    /// `vocals` is required (index 0 when the manifest lists no names). A stem
    /// named `accompaniment` is used directly, otherwise every other stem is
    /// mixed.
    pub fn from_stem_names(names: &[String], stems_count: usize) -> Result<Self> {
        if stems_count < 2 {
            return Err(SplitError::Manifest(format!(
                "model must produce at least 2 stems, got {stems_count}"
            )));
        }

        let idx: HashMap<String, usize> = names
            .iter()
            .enumerate()
            .filter(|(i, _)| *i < stems_count)
            .map(|(i, n)| (n.to_lowercase(), i))
            .collect();

        let vocals = match idx.get("vocals").or_else(|| idx.get("vocal")) {
            Some(&i) => i,
            None if names.is_empty() => 0,
            None => {
                return Err(SplitError::Manifest(format!(
                    "model stems {names:?} have no `vocals` entry"
                )))
            }
        };

        let accompaniment = match idx.get("accompaniment") {
            Some(&i) => vec![i],
            None => (0..stems_count).filter(|&i| i != vocals).collect(),
        };

        Ok(Self {
            vocals,
            accompaniment,
        })
    }
}

/// ONNX-backed separator, loaded once and reused for every file.
pub struct OnnxSeparator {
    engine: Engine,
}

impl OnnxSeparator {
    /// Resolves, downloads and verifies the model, then opens the session.
    /// Every failure surfaces as [`SplitError::ModelLoad`].
    pub fn load(opts: &SplitOptions) -> Result<Self> {
        let handle = ensure_model(&opts.model_name, opts.manifest_url_override.as_deref())
            .map_err(|e| SplitError::ModelLoad(e.to_string()))?;
        Self::from_handle(&handle)
    }

    pub fn from_handle(handle: &ModelHandle) -> Result<Self> {
        let mf = &handle.manifest;
        if mf.sample_rate != TARGET_SAMPLE_RATE {
            return Err(SplitError::ModelLoad(format!(
                "model `{}` runs at {} Hz, expected {}",
                mf.name, mf.sample_rate, TARGET_SAMPLE_RATE
            )));
        }
        if !(mf.window > 0 && mf.hop > 0 && mf.hop <= mf.window) {
            return Err(SplitError::ModelLoad("Bad win/hop in manifest".into()));
        }

        let engine = Engine::load(handle).map_err(|e| SplitError::ModelLoad(e.to_string()))?;
        info!(model = %mf.name, version = %mf.version, "separation model loaded");
        Ok(Self { engine })
    }
}

impl Separator for OnnxSeparator {
    fn separate(&mut self, input: &AudioBuffer) -> Result<SeparationResult> {
        let n = input.frames();
        if n == 0 {
            return Err(SplitError::Separation("Empty audio".into()));
        }

        let win = self.engine.manifest().window;
        let hop = self.engine.manifest().hop;
        let stem_names = self.engine.manifest().stems.clone();

        let left = input.channel(0);
        let right = input.channel(1);

        let mut left_raw = vec![0f32; win];
        let mut right_raw = vec![0f32; win];

        let total_chunks = n.div_ceil(hop).max(1);

        // Per-stem accumulator; later windows overwrite the overlap of earlier ones.
        let mut acc: Vec<Vec<[f32; 2]>> = Vec::new();
        let mut pos = 0usize;
        let mut done = 0usize;

        while pos < n {
            for i in 0..win {
                let idx = pos + i;
                if idx < n {
                    left_raw[i] = left[idx];
                    right_raw[i] = right[idx];
                } else {
                    left_raw[i] = 0.0;
                    right_raw[i] = 0.0;
                }
            }

            let out = self
                .engine
                .run_window(&left_raw, &right_raw)
                .map_err(|e| SplitError::Separation(e.to_string()))?;
            let (s_count, _, t_out) = out.dim();

            if acc.is_empty() {
                acc = vec![vec![[0f32; 2]; n]; s_count];
            }

            let copy_len = t_out.min(win).min(n - pos);
            for (st, stem) in acc.iter_mut().enumerate().take(s_count) {
                for i in 0..copy_len {
                    stem[pos + i] = [out[(st, 0, i)], out[(st, 1, i)]];
                }
            }

            done += 1;
            emit_split_progress(SplitProgress::Chunks {
                done,
                total: total_chunks,
                percent: done as f32 / total_chunks as f32 * 100.0,
            });

            if pos + hop >= n {
                break;
            }
            pos += hop;
        }

        let mapping = StemMapping::from_stem_names(&stem_names, acc.len())?;
        debug!(?mapping, chunks = done, "mixing stems");

        let vocal = AudioBuffer::from_frames(&acc[mapping.vocals], TARGET_SAMPLE_RATE);

        let mut mix = vec![[0f32; 2]; n];
        for &st in &mapping.accompaniment {
            for (m, s) in mix.iter_mut().zip(acc[st].iter()) {
                m[0] += s[0];
                m[1] += s[1];
            }
        }
        let accompaniment = AudioBuffer::from_frames(&mix, TARGET_SAMPLE_RATE);

        Ok(SeparationResult {
            vocal,
            accompaniment,
        })
    }
}
