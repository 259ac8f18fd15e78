use num_complex::Complex32;
use once_cell::sync::Lazy;
use rubato::{InterpolationParameters, InterpolationType, Resampler, SincFixedIn, WindowFunction};
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::sync::Arc;

use crate::error::{Result, SplitError};

struct FftCache {
    fft_forward: Arc<dyn Fft<f32>>,
    hann_window: Vec<f32>,
    n_fft: usize,
}

static FFT_CACHE_4096: Lazy<FftCache> = Lazy::new(|| plan_fft(4096));

fn plan_fft(n_fft: usize) -> FftCache {
    let mut planner = FftPlanner::new();
    FftCache {
        fft_forward: planner.plan_fft_forward(n_fft),
        hann_window: compute_hann(n_fft),
        n_fft,
    }
}

fn compute_hann(n_fft: usize) -> Vec<f32> {
    if n_fft <= 1 {
        return vec![1.0];
    }
    let denom = (n_fft - 1) as f32;
    (0..n_fft)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * (i as f32) / denom).cos())
        .collect()
}

/// Interleaved samples to stereo frames. Mono is duplicated into both
/// channels; layouts wider than stereo keep their first two channels.
pub fn to_planar_stereo(interleaved: &[f32], channels: u16) -> Vec<[f32; 2]> {
    match channels {
        0 => Vec::new(),
        1 => interleaved.iter().map(|&x| [x, x]).collect(),
        n => interleaved
            .chunks_exact(n as usize)
            .map(|frame| [frame[0], frame[1]])
            .collect(),
    }
}

const SINC_LEN: usize = 256;

/// Resamples stereo frames to `to_rate` in a single pass. The result holds
/// exactly `round(len * to_rate / from_rate)` frames.
pub fn resample_stereo(frames: &[[f32; 2]], from_rate: u32, to_rate: u32) -> Result<Vec<[f32; 2]>> {
    if from_rate == to_rate || frames.is_empty() {
        return Ok(frames.to_vec());
    }
    if from_rate == 0 {
        return Err(anyhow::anyhow!("source sample rate is zero").into());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let expected = (frames.len() as f64 * ratio).round() as usize;

    // the sinc filter holds back its last half-length of input; zero padding
    // pushes the real tail through
    let padded = frames.len() + SINC_LEN;
    let mut left: Vec<f32> = frames.iter().map(|f| f[0]).collect();
    let mut right: Vec<f32> = frames.iter().map(|f| f[1]).collect();
    left.resize(padded, 0.0);
    right.resize(padded, 0.0);

    let params = InterpolationParameters {
        sinc_len: SINC_LEN,
        f_cutoff: 0.95,
        interpolation: InterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, padded, 2)
        .map_err(|e| SplitError::Anyhow(anyhow::anyhow!("failed to create resampler: {e}")))?;

    let out = resampler
        .process(&[left, right], None)
        .map_err(|e| SplitError::Anyhow(anyhow::anyhow!("resampling failed: {e}")))?;

    let mut resampled: Vec<[f32; 2]> = out[0]
        .iter()
        .zip(out[1].iter())
        .map(|(&l, &r)| [l, r])
        .collect();
    resampled.resize(expected, [0.0, 0.0]);
    Ok(resampled)
}

/// Compute complex-as-channels spectrogram for stereo with center padding.
/// Returns (buffer, F=n_fft/2, Frames=1+T/hop).
/// Layout is [1, 4, F, Frames] flattened => channels order: L.re, L.im, R.re, R.im.
pub fn stft_cac_stereo_centered(
    left: &[f32],
    right: &[f32],
    n_fft: usize,
    hop: usize,
) -> (Vec<f32>, usize, usize) {
    assert_eq!(left.len(), right.len());

    let local;
    let cache: &FftCache = if n_fft == FFT_CACHE_4096.n_fft {
        &*FFT_CACHE_4096
    } else {
        local = plan_fft(n_fft);
        &local
    };

    let t = left.len();
    let pad = n_fft / 2;

    let padded_len = pad + t + pad;
    let mut l_sig = vec![0.0f32; padded_len];
    let mut r_sig = vec![0.0f32; padded_len];

    l_sig[pad..pad + t].copy_from_slice(left);
    r_sig[pad..pad + t].copy_from_slice(right);

    let frames = 1 + (t / hop);
    let f_bins = n_fft / 2;

    let fft = &cache.fft_forward;
    let window = &cache.hann_window;

    let plane = f_bins * frames;
    let mut out = vec![0.0f32; 4 * plane];

    let mut buf_l = vec![Complex32::zero(); n_fft];
    let mut buf_r = vec![Complex32::zero(); n_fft];

    for fr in 0..frames {
        let start = fr * hop;
        let li = &l_sig[start..start + n_fft];
        let ri = &r_sig[start..start + n_fft];

        for i in 0..n_fft {
            let w = window[i];
            buf_l[i] = Complex32::new(li[i] * w, 0.0);
            buf_r[i] = Complex32::new(ri[i] * w, 0.0);
        }

        fft.process(&mut buf_l);
        fft.process(&mut buf_r);

        for fi in 0..f_bins {
            let base_fr = fi * frames + fr;
            out[base_fr] = buf_l[fi].re;
            out[plane + base_fr] = buf_l[fi].im;
            out[2 * plane + base_fr] = buf_r[fi].re;
            out[3 * plane + base_fr] = buf_r[fi].im;
        }
    }

    (out, f_bins, frames)
}
