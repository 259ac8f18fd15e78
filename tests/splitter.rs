#![cfg(feature = "engine-mock")]

use httpmock::prelude::*;
use sha2::{Digest, Sha256};
use std::f32::consts::PI;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tempfile::{tempdir, TempDir};

use voice_splitter::{
    split_directory, write_audio, AudioBuffer, BatchOptions, OnnxSeparator, Separator,
    SplitOptions,
};

/// One cache directory for the whole test binary, so parallel tests never
/// see the variable change under them.
fn shared_cache_dir() -> &'static Path {
    static CACHE: OnceLock<TempDir> = OnceLock::new();
    CACHE
        .get_or_init(|| {
            let dir = tempdir().unwrap();
            std::env::set_var("VOICE_SPLITTER_CACHE_DIR", dir.path());
            dir
        })
        .path()
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

fn manifest_json(name: &str, model_url: &str, sha_hex: &str) -> String {
    format!(
        r#"{{
  "name": "{name}",
  "version": "1.0.0",
  "backend": "onnx",
  "sample_rate": 44100,
  "window": 4096,
  "hop": 2048,
  "stems": ["drums","bass","other","vocals"],
  "input_layout": "BCT",
  "output_layout": "BSCT",
  "artifacts": [
    {{
      "file": "mock.onnx",
      "url": "{url}",
      "sha256": "{sha}",
      "size_bytes": 0
    }}
  ]
}}"#,
        name = name,
        url = model_url,
        sha = sha_hex
    )
}

/// Each caller passes its own model name so cached files never collide.
fn serve_mock_model(server: &MockServer, name: &str) -> String {
    let model_body = b"this is the mock onnx payload";
    let model_sha = sha256_hex(model_body);

    server.mock(|when, then| {
        when.method(GET).path("/mock.onnx");
        then.status(200).body(model_body.as_slice());
    });

    let manifest = manifest_json(name, &format!("{}/mock.onnx", server.base_url()), &model_sha);
    server.mock(|when, then| {
        when.method(GET).path("/m.json");
        then.status(200)
            .header("Content-Type", "application/json")
            .body(manifest);
    });

    format!("{}/m.json", server.base_url())
}

fn sine(frames: usize) -> AudioBuffer {
    let sr = 44_100f32;
    let left: Vec<f32> = (0..frames)
        .map(|i| (2.0 * PI * 440.0 * i as f32 / sr).sin() * 0.2)
        .collect();
    let right: Vec<f32> = (0..frames)
        .map(|i| (2.0 * PI * 660.0 * i as f32 / sr).sin() * 0.2)
        .collect();
    AudioBuffer::from_planar(&left, &right, 44_100)
}

#[test]
fn identity_model_gives_vocals_and_summed_accompaniment() {
    shared_cache_dir();
    let server = MockServer::start();

    let opts = SplitOptions {
        model_name: "ignored".into(),
        manifest_url_override: Some(serve_mock_model(&server, "mock_identity")),
    };
    let mut sep = OnnxSeparator::load(&opts).expect("mock model load");

    // spans several windows with a ragged tail
    let input = sine(10_000);
    let res = sep.separate(&input).unwrap();

    assert_eq!(res.vocal.frames(), input.frames());
    assert_eq!(res.accompaniment.frames(), input.frames());
    assert_eq!(res.vocal, input);
    for i in [0, 4095, 4096, 9_999] {
        let expected = input.samples[(i, 0)] * 3.0;
        assert!((res.accompaniment.samples[(i, 0)] - expected).abs() < 1e-6);
    }
}

#[test]
fn directory_split_end_to_end() {
    shared_cache_dir();
    let tmp = tempdir().unwrap();
    let server = MockServer::start();

    let root = tmp.path().join("music");
    let nested = root.join("album");
    fs::create_dir_all(&nested).unwrap();
    write_audio(nested.join("track.wav"), &sine(8000)).unwrap();

    let opts = SplitOptions {
        model_name: "ignored".into(),
        manifest_url_override: Some(serve_mock_model(&server, "mock_end_to_end")),
    };
    let mut sep = OnnxSeparator::load(&opts).unwrap();

    let out = tmp.path().join("music (output)");
    let summary = split_directory(&root, &out, &mut sep, &BatchOptions::default()).unwrap();
    assert_eq!(summary.files_processed, 1);
    assert_eq!(summary.tracks_written, 2);

    for name in ["track (vocal).wav", "track (music).wav"] {
        let p = out.join("album").join(name);
        let r = hound::WavReader::open(&p).unwrap();
        assert_eq!(r.spec().channels, 2);
        assert_eq!(r.spec().sample_rate, 44_100);
        assert_eq!(r.len(), 16_000);
    }
}
