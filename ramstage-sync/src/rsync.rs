//! Typed wrapper around the `rsync` binary.
//!
//! Argument vectors are built here and nowhere else; paths are passed as
//! separate argv entries (never through a shell). Sources always carry a
//! trailing slash so rsync copies the directory's *contents*.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::error::{io_err, SyncError};

/// Number of trailing output lines kept for diagnostics.
pub const OUTPUT_TAIL_LINES: usize = 200;

/// `rsync -a --progress <source>/ <destination>`
pub fn copy_in_args(source: &Path, destination: &Path) -> Vec<OsString> {
    vec![
        OsString::from("-a"),
        OsString::from("--progress"),
        with_trailing_slash(source),
        destination.as_os_str().to_owned(),
    ]
}

/// `rsync -a --delete [--exclude <p>]… <staged>/ <original>`
pub fn sync_back_args(staged: &Path, original: &Path, excludes: &[String]) -> Vec<OsString> {
    let mut args = vec![OsString::from("-a"), OsString::from("--delete")];
    for pattern in excludes.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
        args.push(OsString::from("--exclude"));
        args.push(OsString::from(pattern));
    }
    args.push(with_trailing_slash(staged));
    args.push(original.as_os_str().to_owned());
    args
}

fn with_trailing_slash(path: &Path) -> OsString {
    let mut arg = path.as_os_str().to_owned();
    if !arg.as_bytes().ends_with(b"/") {
        arg.push("/");
    }
    arg
}

/// Exit status and trailing output of one rsync invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub tail: VecDeque<String>,
}

impl ToolOutput {
    pub fn tail_text(&self) -> String {
        self.tail.iter().cloned().collect::<Vec<_>>().join("\n")
    }
}

/// Human-readable exit status (`exit code 23`, `terminated by signal`).
pub fn describe_status(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Run `program` with `args`, handing every stdout/stderr line to `on_line`
/// from this single reading loop, and wait for it to exit.
pub async fn run_streaming<F>(
    program: &Path,
    args: &[OsString],
    mut on_line: F,
) -> Result<ToolOutput, SyncError>
where
    F: FnMut(&str),
{
    tracing::debug!(
        program = %program.display(),
        args = ?args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>(),
        "spawning rsync",
    );

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| SyncError::Spawn {
            tool: program.to_path_buf(),
            source,
        })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io_err(program, std::io::Error::other("stdout not captured")))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io_err(program, std::io::Error::other("stderr not captured")))?;

    let mut out_segments = BufReader::new(stdout).split(b'\n');
    let mut err_segments = BufReader::new(stderr).split(b'\n');
    let mut tail = VecDeque::<String>::with_capacity(OUTPUT_TAIL_LINES);
    let (mut out_done, mut err_done) = (false, false);

    while !(out_done && err_done) {
        let segment = tokio::select! {
            seg = out_segments.next_segment(), if !out_done => {
                let seg = seg.map_err(|e| io_err(program, e))?;
                out_done = seg.is_none();
                seg
            }
            seg = err_segments.next_segment(), if !err_done => {
                let seg = seg.map_err(|e| io_err(program, e))?;
                err_done = seg.is_none();
                seg
            }
        };
        let Some(bytes) = segment else { continue };

        for line in split_updates(&bytes) {
            on_line(&line);
            if tail.len() == OUTPUT_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
    }

    let status = child.wait().await.map_err(|e| io_err(program, e))?;
    Ok(ToolOutput { status, tail })
}

/// Split one `\n`-terminated segment into lines.
///
/// `--progress` rewrites the current file's status in place: each update
/// starts with `\r` and only the last one is followed by `\n`. Every update
/// is its own line.
fn split_updates(bytes: &[u8]) -> Vec<String> {
    bytes
        .split(|b| *b == b'\r')
        .filter(|piece| !piece.is_empty())
        .map(|piece| String::from_utf8_lossy(piece).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn copy_in_copies_contents_of_source() {
        let args = copy_in_args(Path::new("/p/profile"), Path::new("/Volumes/R/profile"));
        assert_eq!(
            strings(&args),
            vec!["-a", "--progress", "/p/profile/", "/Volumes/R/profile"]
        );
    }

    #[test]
    fn existing_trailing_slash_is_not_doubled() {
        let args = copy_in_args(Path::new("/p/profile/"), Path::new("/d"));
        assert_eq!(strings(&args)[2], "/p/profile/");
    }

    #[test]
    fn sync_back_deletes_and_excludes() {
        let excludes = vec![
            "user.js".to_string(),
            "  ".to_string(),
            "saved-telemetry-pings".to_string(),
        ];
        let args = sync_back_args(Path::new("/Volumes/R/x"), Path::new("/home/x"), &excludes);
        assert_eq!(
            strings(&args),
            vec![
                "-a",
                "--delete",
                "--exclude",
                "user.js",
                "--exclude",
                "saved-telemetry-pings",
                "/Volumes/R/x/",
                "/home/x",
            ]
        );
    }

    #[test]
    fn carriage_returns_are_trimmed() {
        assert_eq!(split_updates(b"  1024 100%\r"), vec!["  1024 100%"]);
    }

    #[test]
    fn in_place_updates_become_separate_lines() {
        let segment = b"\r          0   0%    0.00kB/s    0:00:00\
\r     500000  50%   10.00MB/s    0:00:00\
\r    1000000 100%   10.00MB/s    0:00:00 (xfr#1, to-chk=0/1)";
        let lines = split_updates(segment);
        assert_eq!(lines.len(), 3, "{lines:?}");
        assert!(lines[0].trim_start().starts_with("0 "));
        assert!(lines[1].trim_start().starts_with("500000 "));
        assert!(lines[2].trim_start().starts_with("1000000 "));
    }

    #[test]
    fn blank_segment_yields_nothing() {
        assert!(split_updates(b"").is_empty());
        assert!(split_updates(b"\r\r").is_empty());
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let err = run_streaming(Path::new("/nonexistent/rsync"), &[], |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Spawn { .. }), "got: {err}");
    }
}
