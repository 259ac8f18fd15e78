use crate::error::{Result, SplitError};
use directories::ProjectDirs;
use std::{env, path::PathBuf};

/// `VOICE_SPLITTER_CACHE_DIR` wins over the platform cache directory.
pub fn models_cache_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("VOICE_SPLITTER_CACHE_DIR").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir).join("models"));
    }
    let proj = ProjectDirs::from("dev", "VoiceSplitter", "voice-splitter")
        .ok_or(SplitError::CacheDirUnavailable)?;
    Ok(proj.cache_dir().join("models"))
}
