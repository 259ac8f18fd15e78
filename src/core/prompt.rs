use std::{
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::error::Result;

pub const PROMPT: &str = "Enter directory: ";
pub const WRONG_DIRECTORY: &str = "Wrong directory";

/// Strips whitespace and any surrounding single or double quotes, as left
/// by drag-and-drop into a terminal.
pub fn clean_path_input(line: &str) -> &str {
    line.trim().trim_matches(|c| c == '"' || c == '\'')
}

/// Prompts until an existing directory is entered. `Ok(None)` on end of
/// input. Lines that are not valid UTF-8 are rejected like any other wrong
/// entry.
pub fn read_directory<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Option<PathBuf>> {
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let mut raw = Vec::new();
        if input.read_until(b'\n', &mut raw)? == 0 {
            return Ok(None);
        }

        match std::str::from_utf8(&raw) {
            Ok(line) => {
                let candidate = PathBuf::from(clean_path_input(line));
                if !candidate.as_os_str().is_empty() && candidate.is_dir() {
                    return Ok(Some(candidate));
                }
            }
            Err(e) => debug!("rejected input line: {e}"),
        }
        writeln!(output, "{WRONG_DIRECTORY}\n")?;
    }
}

/// Runs the prompt loop until end of input. A failure while handling one
/// directory is reported on `output` and the loop carries on; only errors
/// writing to `output` or reading `input` end the session.
pub fn run_session<R, W, F>(input: &mut R, output: &mut W, mut handle: F) -> Result<()>
where
    R: BufRead,
    W: Write,
    F: FnMut(&Path, &mut W) -> Result<()>,
{
    loop {
        let Some(dir) = read_directory(input, output)? else {
            return Ok(());
        };

        if let Err(e) = handle(&dir, output) {
            debug!(dir = %dir.display(), "directory failed: {e}");
            writeln!(output, "Error: {e}\n")?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SplitError;
    use std::io::Cursor;

    #[test]
    fn strips_quotes_and_newline() {
        assert_eq!(clean_path_input("\"C:\\Music\"\n"), "C:\\Music");
        assert_eq!(clean_path_input("'/tmp/a b'\r\n"), "/tmp/a b");
        assert_eq!(clean_path_input("/plain"), "/plain");
    }

    #[test]
    fn reprompts_until_path_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().display().to_string();
        let mut input = Cursor::new(format!("/definitely/not/here\n\n'{good}'\n"));
        let mut output = Vec::new();

        let got = read_directory(&mut input, &mut output).unwrap();
        assert_eq!(got, Some(PathBuf::from(&good)));

        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.matches(PROMPT).count(), 3);
        assert_eq!(text.matches(WRONG_DIRECTORY).count(), 2);
    }

    #[test]
    fn regular_file_is_a_wrong_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("song.mp3");
        std::fs::write(&file, b"x").unwrap();
        let mut input = Cursor::new(format!("{}\n{}\n", file.display(), tmp.path().display()));
        let mut output = Vec::new();

        let got = read_directory(&mut input, &mut output).unwrap();
        assert_eq!(got.as_deref(), Some(tmp.path()));
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.matches(WRONG_DIRECTORY).count(), 1);
    }

    #[test]
    fn invalid_utf8_line_reprompts() {
        let tmp = tempfile::tempdir().unwrap();
        let mut bytes = vec![0xff, 0xfe, b'\n'];
        bytes.extend_from_slice(format!("{}\n", tmp.path().display()).as_bytes());
        let mut input = Cursor::new(bytes);
        let mut output = Vec::new();

        let got = read_directory(&mut input, &mut output).unwrap();
        assert_eq!(got.as_deref(), Some(tmp.path()));
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.matches(WRONG_DIRECTORY).count(), 1);
    }

    #[test]
    fn end_of_input_returns_none() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();
        assert_eq!(read_directory(&mut input, &mut output).unwrap(), None);
    }

    #[test]
    fn session_survives_a_failing_directory() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let mut input = Cursor::new(format!("{}\n{}\n", a.path().display(), b.path().display()));
        let mut output = Vec::new();
        let mut seen = Vec::new();

        run_session(&mut input, &mut output, |dir, out| {
            seen.push(dir.to_path_buf());
            if seen.len() == 1 {
                return Err(SplitError::NotADirectory(dir.to_path_buf()));
            }
            writeln!(out, "done")?;
            Ok(())
        })
        .unwrap();

        assert_eq!(seen, vec![a.path().to_path_buf(), b.path().to_path_buf()]);
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Error: Not a directory"));
        assert!(text.contains("done"));
        assert_eq!(text.matches(PROMPT).count(), 3);
    }

    #[test]
    fn session_reports_the_filesystem_root_and_continues() {
        let mut input = Cursor::new("/\n");
        let mut output = Vec::new();

        run_session(&mut input, &mut output, |dir, _| {
            crate::core::scanner::default_output_root(dir).map(|_| ())
        })
        .unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Error: "));
        assert_eq!(text.matches(PROMPT).count(), 2);
    }
}
