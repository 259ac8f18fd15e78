use std::{fmt::Write as _, path::Path};

use tracing::{debug, info, warn};

use crate::{
    core::{
        audio::load_stereo,
        scanner::plan_tasks,
        separator::Separator,
        writer::write_pair,
    },
    error::Result,
    io::progress::{emit_split_progress, SplitProgress},
    types::{BatchOptions, FileOutcome, FileTask, RunSummary},
};

pub const RULE: &str = "------------------------------------";

/// Printed once when the separator cannot be constructed.
pub const STARTUP_FATAL_MESSAGE: &str = "Separation model not available or dependencies missing\n\
Please install the model with: voice-splitter prepare";

/// Loads, separates and writes one file. Every failure is folded into the
/// returned outcome.
pub fn process_file<S: Separator + ?Sized>(
    task: &FileTask,
    separator: &mut S,
    options: &BatchOptions,
) -> FileOutcome {
    let buffer = match load_stereo(&task.path) {
        Ok(buffer) => buffer,
        Err(e) => {
            warn!(path = %task.path.display(), "decode failed: {e}");
            return FileOutcome::DecodeFailure(e.to_string());
        }
    };
    debug!(path = %task.path.display(), frames = buffer.frames(), "loaded");

    let separated = match separator.separate(&buffer) {
        Ok(result) => result,
        Err(e) => {
            warn!(path = %task.path.display(), "separation failed: {e}");
            return FileOutcome::SeparationFailure(e.to_string());
        }
    };
    drop(buffer);

    let stem = task
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());

    match write_pair(
        &stem,
        &separated.vocal,
        &separated.accompaniment,
        &task.dest_folder,
        options.partial_writes,
    ) {
        Ok(tracks) => FileOutcome::Separated { tracks },
        Err(e) => {
            warn!(path = %task.path.display(), "write failed: {e}");
            FileOutcome::WriteFailure(e.to_string())
        }
    }
}

/// Runs every task in order and tallies the outcomes.
pub fn run_batch<S: Separator + ?Sized>(
    tasks: &[FileTask],
    separator: &mut S,
    options: &BatchOptions,
) -> RunSummary {
    let mut summary = RunSummary::default();
    let mut current_folder = None;

    for task in tasks {
        if current_folder != Some(&task.folder) {
            debug!(
                folder = %task.folder.display(),
                dest = %task.dest_folder.display(),
                "entering folder"
            );
            current_folder = Some(&task.folder);
        }

        let name = task
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        emit_split_progress(SplitProgress::FileStarted { name: name.clone() });
        let outcome = process_file(task, separator, options);
        summary.record(&outcome);
        emit_split_progress(SplitProgress::FileFinished { name, outcome });
    }

    info!(
        files = summary.files_processed,
        tracks = summary.tracks_written,
        failures = summary.failures(),
        "batch finished"
    );
    summary
}

/// Scans `input_root` and separates everything found into `output_root`.
pub fn split_directory<S: Separator + ?Sized>(
    input_root: &Path,
    output_root: &Path,
    separator: &mut S,
    options: &BatchOptions,
) -> Result<RunSummary> {
    let tasks = plan_tasks(input_root, output_root)?;
    info!(
        input = %input_root.display(),
        output = %output_root.display(),
        files = tasks.len(),
        "starting batch"
    );
    Ok(run_batch(&tasks, separator, options))
}

/// The per-file status line printed under `Processing: <name>`.
pub fn outcome_line(outcome: &FileOutcome) -> &'static str {
    match outcome {
        FileOutcome::Separated { .. } => "  ✓ Separated into vocal and music tracks",
        FileOutcome::WriteFailure(_) => "  ✗ Error saving separated tracks",
        FileOutcome::DecodeFailure(_) | FileOutcome::SeparationFailure(_) => {
            "  ✗ Error processing audio"
        }
    }
}

/// Closing report for one pass.
pub fn format_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    if summary.files_processed > 0 {
        let _ = writeln!(out, "Processed files: {}", summary.files_processed);
        if summary.tracks_written > 0 {
            let _ = writeln!(out, "Generated tracks: {}", summary.tracks_written);
        } else {
            let _ = writeln!(out, "No tracks generated");
        }
    } else {
        let _ = writeln!(out, "No audio files found");
    }
    let _ = writeln!(out, "{RULE}");
    out
}
