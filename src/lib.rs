//! # voice-splitter
//!
//! Walks a directory tree, separates every audio file into a vocal and an
//! instrumental track with a pretrained model, and writes the results into
//! a mirrored `<input> (output)` tree.

pub mod core;
pub mod error;
pub mod io;
pub mod model;
pub mod types;

pub use crate::{
    core::{
        audio::{load_stereo, read_audio, write_audio},
        batch::{format_summary, process_file, run_batch, split_directory, STARTUP_FATAL_MESSAGE},
        scanner::{
            default_output_root, find_audio_files, output_root_under, plan_tasks,
            SUPPORTED_EXTENSIONS,
        },
        separator::{OnnxSeparator, Separator},
        writer::write_pair,
    },
    error::{Result, SplitError},
    io::progress::{set_download_progress_callback, set_split_progress_callback, SplitProgress},
    model::model_manager::{ensure_model, ModelHandle},
    types::{
        AudioBuffer, AudioData, BatchOptions, FileOutcome, FileTask, PartialWritePolicy,
        RunSummary, SeparationResult, SplitOptions, TARGET_SAMPLE_RATE,
    },
};

/// Downloads and verifies a model without opening a session.
pub fn prepare_model(model_name: &str, manifest_url_override: Option<&str>) -> Result<ModelHandle> {
    ensure_model(model_name, manifest_url_override)
}
