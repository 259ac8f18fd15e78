use std::{
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::{
    core::audio::encode_wav,
    error::{Result, SplitError},
    types::{AudioBuffer, PartialWritePolicy},
};

pub const VOCAL_SUFFIX: &str = " (vocal)";
pub const MUSIC_SUFFIX: &str = " (music)";

/// `<stem> (vocal).wav`
pub fn vocal_file_name(stem: &str) -> String {
    format!("{stem}{VOCAL_SUFFIX}.wav")
}

/// `<stem> (music).wav`
pub fn music_file_name(stem: &str) -> String {
    format!("{stem}{MUSIC_SUFFIX}.wav")
}

/// Writes `audio` next to `dest` under a temporary name and renames it into
/// place, so `dest` either holds a complete WAV or is untouched.
fn write_wav_atomic(dest: &Path, audio: &AudioBuffer) -> Result<()> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SplitError::write(dest, e))?;

    encode_wav(BufWriter::new(tmp.as_file_mut()), audio)
        .map_err(|e| SplitError::write(dest, e))?;

    tmp.persist(dest)
        .map_err(|e| SplitError::write(dest, e.error))?;
    Ok(())
}

/// Writes the vocal and music files for one source into `dest_folder`
/// (created with parents if missing). Returns the number of files written,
/// which is always 2 on success.
///
/// If the music file fails after the vocal file was written, `policy`
/// decides whether the vocal file is removed again or left on disk. The
/// pair counts as failed either way.
pub fn write_pair(
    stem: &str,
    vocal: &AudioBuffer,
    accompaniment: &AudioBuffer,
    dest_folder: &Path,
    policy: PartialWritePolicy,
) -> Result<usize> {
    fs::create_dir_all(dest_folder).map_err(|e| SplitError::write(dest_folder, e))?;

    let vocal_path: PathBuf = dest_folder.join(vocal_file_name(stem));
    let music_path: PathBuf = dest_folder.join(music_file_name(stem));

    write_wav_atomic(&vocal_path, vocal)?;
    debug!(path = %vocal_path.display(), "wrote vocal track");

    if let Err(e) = write_wav_atomic(&music_path, accompaniment) {
        match policy {
            PartialWritePolicy::Rollback => {
                if let Err(rm) = fs::remove_file(&vocal_path) {
                    warn!(path = %vocal_path.display(), "rollback failed: {rm}");
                }
            }
            PartialWritePolicy::Keep => {
                warn!(path = %vocal_path.display(), "leaving partial output on disk");
            }
        }
        return Err(e);
    }
    debug!(path = %music_path.display(), "wrote music track");

    Ok(2)
}
