use approx::assert_abs_diff_eq;
use voice_splitter::core::dsp::{resample_stereo, stft_cac_stereo_centered, to_planar_stereo};

#[test]
fn to_planar_stereo_mono_duplicates_channel() {
    let mono = vec![0.1, -0.2, 0.3, -0.4];
    let planar = to_planar_stereo(&mono, 1);
    assert_eq!(planar.len(), mono.len());
    for (frame, &m) in planar.iter().zip(mono.iter()) {
        assert_abs_diff_eq!(frame[0], m, epsilon = 1e-7);
        assert_abs_diff_eq!(frame[1], m, epsilon = 1e-7);
    }
}

#[test]
fn to_planar_stereo_keeps_front_pair_of_surround() {
    // 3 frames of 6 channels
    let surround: Vec<f32> = (0..18).map(|i| i as f32).collect();
    let planar = to_planar_stereo(&surround, 6);
    assert_eq!(planar, vec![[0.0, 1.0], [6.0, 7.0], [12.0, 13.0]]);
}

#[test]
fn resample_is_a_noop_at_target_rate() {
    let frames = vec![[0.1, 0.2], [0.3, 0.4]];
    assert_eq!(resample_stereo(&frames, 44_100, 44_100).unwrap(), frames);
}

#[test]
fn resample_doubles_length_for_half_rate_input() {
    let frames: Vec<[f32; 2]> = (0..8_000)
        .map(|i| {
            let s = (i as f32 * 0.05).sin() * 0.5;
            [s, -s]
        })
        .collect();
    let out = resample_stereo(&frames, 22_050, 44_100).unwrap();
    assert_eq!(out.len(), 16_000);
}

fn peak_index(frames: &[[f32; 2]]) -> usize {
    frames
        .iter()
        .enumerate()
        .max_by(|a, b| a.1[0].abs().total_cmp(&b.1[0].abs()))
        .map(|(i, _)| i)
        .unwrap()
}

#[test]
fn resample_keeps_impulses_in_place_including_the_tail() {
    let mut head = vec![[0.0f32; 2]; 8_000];
    head[1_000] = [1.0, 1.0];
    let out = resample_stereo(&head, 22_050, 44_100).unwrap();
    let peak = peak_index(&out);
    assert!((1_997..=2_003).contains(&peak), "peak at {peak}");

    // an impulse close to the end must survive the filter delay
    let mut tail = vec![[0.0f32; 2]; 8_000];
    tail[7_990] = [1.0, 1.0];
    let out = resample_stereo(&tail, 22_050, 44_100).unwrap();
    let peak = peak_index(&out);
    assert!((15_977..=15_983).contains(&peak), "peak at {peak}");
    assert!(out[peak][0] > 0.3);
}

#[test]
fn stft_demucs_dims_reference() {
    let n_fft = 4096usize;
    let hop = 1024usize;
    let t = 343_980usize;
    let left = vec![0.0f32; t];
    let right = vec![0.0f32; t];
    let (spec, f_bins, frames) = stft_cac_stereo_centered(&left, &right, n_fft, hop);
    assert_eq!(f_bins, 2048);
    assert_eq!(frames, 336);
    assert_eq!(spec.len(), 4 * f_bins * frames);
}

#[test]
fn stft_of_dc_lands_in_bin_zero() {
    let n_fft = 1024usize;
    let hop = 256usize;
    let t = 4096usize;
    let left = vec![1.0f32; t];
    let right = vec![0.0f32; t];
    let (spec, f_bins, frames) = stft_cac_stereo_centered(&left, &right, n_fft, hop);

    // middle frame is fully inside the signal
    let fr = frames / 2;
    let plane = f_bins * frames;
    let dc = spec[fr];
    let hann_sum = (n_fft as f32 - 1.0) / 2.0;
    assert_abs_diff_eq!(dc, hann_sum, epsilon = 1.0);
    // right channel real plane is silent
    assert_abs_diff_eq!(spec[2 * plane + fr], 0.0, epsilon = 1e-6);
    // energy far from DC is negligible
    assert!(spec[100 * frames + fr].abs() < 1e-2);
}
