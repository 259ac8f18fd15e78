use voice_splitter::{core::engine::Engine, types::ModelManifest, ModelHandle};

fn handle(stems: &[&str]) -> ModelHandle {
    let manifest: ModelManifest = serde_json::from_value(serde_json::json!({
        "name": "mock",
        "version": "0",
        "backend": "onnx",
        "sample_rate": 44100,
        "window": 1024,
        "hop": 512,
        "stems": stems,
        "artifacts": []
    }))
    .unwrap();
    ModelHandle {
        manifest,
        local_path: "/nonexistent/model.onnx".into(),
    }
}

#[cfg(not(feature = "engine-mock"))]
#[test]
fn load_fails_without_a_model_file() {
    assert!(Engine::load(&handle(&["vocals", "accompaniment"])).is_err());
}

#[cfg(feature = "engine-mock")]
#[test]
fn engine_mock_accepts_any_t_and_returns_identity_stems() {
    let mut engine = Engine::load(&handle(&["drums", "bass", "other", "vocals"])).unwrap();
    let t = 1024;
    let left = vec![1.0f32; t];
    let right = vec![0.5f32; t];
    let out = engine.run_window(&left, &right).unwrap();
    assert_eq!(out.shape(), &[4, 2, t]);

    for s in 0..4 {
        assert_eq!(out[(s, 0, 0)], 1.0);
        assert_eq!(out[(s, 1, 0)], 0.5);
    }
}

#[cfg(feature = "engine-mock")]
#[test]
fn engine_mock_rejects_len_mismatch() {
    let mut engine = Engine::load(&handle(&["vocals", "accompaniment"])).unwrap();
    assert!(engine.run_window(&[0.0; 10], &[0.0; 9]).is_err());
}
