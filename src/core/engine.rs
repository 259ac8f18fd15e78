use crate::{
    error::Result,
    model::model_manager::ModelHandle,
    types::ModelManifest,
};

use anyhow::anyhow;
use ndarray::Array3;

#[cfg(not(feature = "engine-mock"))]
use crate::{core::dsp::stft_cac_stereo_centered, error::SplitError};
#[cfg(not(feature = "engine-mock"))]
use anyhow::Context;
#[cfg(not(feature = "engine-mock"))]
use once_cell::sync::OnceCell;
#[cfg(not(feature = "engine-mock"))]
use ort::{
    session::{
        builder::{GraphOptimizationLevel, SessionBuilder},
        Session,
    },
    value::{Tensor, Value},
};

#[cfg(not(feature = "engine-mock"))]
static ORT_INIT: OnceCell<()> = OnceCell::new();

/// Window length the exported htdemucs graph was traced with.
pub const DEMUCS_T: usize = 343_980;
#[cfg(not(feature = "engine-mock"))]
const DEMUCS_F: usize = 2048;
#[cfg(not(feature = "engine-mock"))]
const DEMUCS_FRAMES: usize = 336;
#[cfg(not(feature = "engine-mock"))]
const DEMUCS_NFFT: usize = 4096;
#[cfg(not(feature = "engine-mock"))]
const DEMUCS_HOP: usize = 1024;

/// One loaded model. Runs a single fixed-size stereo window per call and
/// returns every model stem as `[stems, 2, T]`.
pub struct Engine {
    #[cfg(not(feature = "engine-mock"))]
    session: Session,
    manifest: ModelManifest,
}

impl Engine {
    #[cfg(not(feature = "engine-mock"))]
    pub fn load(h: &ModelHandle) -> Result<Self> {
        // Pin error type so `?` is unambiguous.
        ORT_INIT.get_or_try_init::<_, SplitError>(|| {
            ort::init().commit().map_err(SplitError::from)?;
            Ok(())
        })?;

        let session = SessionBuilder::new()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(&h.local_path)?;

        tracing::debug!(model = %h.manifest.name, path = %h.local_path.display(), "onnx session ready");

        Ok(Self {
            session,
            manifest: h.manifest.clone(),
        })
    }

    #[cfg(feature = "engine-mock")]
    pub fn load(h: &ModelHandle) -> Result<Self> {
        Ok(Self {
            manifest: h.manifest.clone(),
        })
    }

    pub fn manifest(&self) -> &ModelManifest {
        &self.manifest
    }

    #[cfg(not(feature = "engine-mock"))]
    pub fn run_window(&mut self, left: &[f32], right: &[f32]) -> Result<Array3<f32>> {
        if left.len() != right.len() {
            return Err(anyhow!("L/R length mismatch").into());
        }
        let t = left.len();
        if t != DEMUCS_T {
            return Err(anyhow!("Bad window length {} (expected {})", t, DEMUCS_T).into());
        }

        // Build time branch [1,2,T], planar
        let mut planar = Vec::with_capacity(2 * t);
        planar.extend_from_slice(left);
        planar.extend_from_slice(right);
        let time_value: Value = Tensor::from_array((vec![1, 2, t], planar))?.into_dyn();

        // Build spec branch [1,4,F,Frames] with center padding, Hann, 4096/1024
        let (spec_cac, f_bins, frames) =
            stft_cac_stereo_centered(left, right, DEMUCS_NFFT, DEMUCS_HOP);
        if f_bins != DEMUCS_F || frames != DEMUCS_FRAMES {
            return Err(anyhow!(
                "Spec dims mismatch: got F={},Frames={}, expected F={},Frames={}",
                f_bins,
                frames,
                DEMUCS_F,
                DEMUCS_FRAMES
            )
            .into());
        }
        let spec_value: Value = Tensor::from_array((vec![1, 4, f_bins, frames], spec_cac))
            .context("spec tensor")?
            .into_dyn();

        let in_time = self.input_name("input")?;
        let in_spec = self.input_name("x")?;

        let outputs = self
            .session
            .run(vec![(in_time, time_value), (in_spec, spec_value)])?;

        // Time-domain stems: "add_67", shape [1,S,2,T]
        let out_td: Value = outputs
            .into_iter()
            .find_map(|(name, v)| if name == "add_67" { Some(v) } else { None })
            .ok_or_else(|| anyhow!("Model did not return 'add_67' output"))?;

        let (_shape, data) = out_td.try_extract_tensor::<f32>()?;
        let stems = data.len() / (2 * t);
        if stems == 0 || data.len() != stems * 2 * t {
            return Err(anyhow!(
                "Unexpected add_67 length {} for window {}",
                data.len(),
                t
            )
            .into());
        }
        let out = Array3::from_shape_vec((stems, 2, t), data.to_vec())?;
        Ok(out)
    }

    /// Identity model: every manifest stem is a copy of the input window.
    #[cfg(feature = "engine-mock")]
    pub fn run_window(&mut self, left: &[f32], right: &[f32]) -> Result<Array3<f32>> {
        if left.len() != right.len() {
            return Err(anyhow!("L/R length mismatch").into());
        }
        let t = left.len();
        let stems = self.manifest.stems.len().max(1);
        let mut out = Array3::<f32>::zeros((stems, 2, t));
        for s in 0..stems {
            for i in 0..t {
                out[(s, 0, i)] = left[i];
                out[(s, 1, i)] = right[i];
            }
        }
        Ok(out)
    }

    #[cfg(not(feature = "engine-mock"))]
    fn input_name(&self, wanted: &str) -> Result<String> {
        self.session
            .inputs
            .iter()
            .find(|i| i.name == wanted)
            .map(|i| i.name.clone())
            .ok_or_else(|| anyhow!("Model missing input '{wanted}'").into())
    }
}
