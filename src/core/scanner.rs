use std::{
    collections::BTreeMap,
    env,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{
    error::{Result, SplitError},
    types::FileTask,
};

/// Extensions picked up by the scan, compared exactly as stored on disk.
pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["mp3", "wav", "flac", "m4a", "aac", "ogg", "wma"];

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
}

/// Every supported audio file under `root`, recursively, sorted by path.
pub fn find_audio_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(SplitError::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_supported(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            Err(e) => {
                // unreadable entries are skipped, the scan continues
                warn!("Error accessing entry: {}", e);
            }
        }
    }
    files.sort();

    debug!(root = %root.display(), count = files.len(), "scan complete");
    Ok(files)
}

/// `<input-name> (output)` in the current working directory.
pub fn default_output_root(input_root: &Path) -> Result<PathBuf> {
    output_root_under(&env::current_dir()?, input_root)
}

/// `<base>/<input-name> (output)`. The name is taken from the canonical
/// input path so `.` and trailing separators resolve to the real folder.
pub fn output_root_under(base: &Path, input_root: &Path) -> Result<PathBuf> {
    let abs = input_root.canonicalize()?;
    let name = abs
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| SplitError::NotADirectory(abs.clone()))?;
    Ok(base.join(format!("{name} (output)")))
}

/// Groups the scan by containing folder and mirrors each folder under
/// `output_root`. The destination is computed once per folder.
pub fn plan_tasks(input_root: &Path, output_root: &Path) -> Result<Vec<FileTask>> {
    let files = find_audio_files(input_root)?;

    // output written inside the input tree is never fed back in
    let root_abs = input_root.canonicalize()?;
    let out_abs = output_root.canonicalize().ok();
    let is_output = |file: &Path| match (&out_abs, file.strip_prefix(input_root)) {
        (Some(out), Ok(rel)) => root_abs.join(rel).starts_with(out),
        _ => false,
    };

    let mut by_folder: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        if is_output(&file) {
            continue;
        }
        let folder = file.parent().unwrap_or(input_root).to_path_buf();
        by_folder.entry(folder).or_default().push(file);
    }

    let mut tasks = Vec::new();
    for (folder, files) in by_folder {
        let relative = folder.strip_prefix(input_root).unwrap_or(Path::new(""));
        let dest_folder = output_root.join(relative);
        tasks.extend(files.into_iter().map(|path| FileTask {
            path,
            folder: folder.clone(),
            dest_folder: dest_folder.clone(),
        }));
    }
    Ok(tasks)
}
