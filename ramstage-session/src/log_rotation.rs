//! Size-based rotation of the run log.
//!
//! `ramstage.log` is rotated when the subscriber opens it, once it reaches
//! [`MAX_LOG_BYTES`]. Backups shift up one slot per rotation and the oldest
//! is dropped: `ramstage.log` → `ramstage.log.1` → … → `ramstage.log.5`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 10 MiB.
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

pub const MAX_ROTATED_FILES: usize = 5;

/// Rotate `log_path` when it is at least `max_bytes` long.
///
/// Returns `true` when a rotation happened. A missing log is not an error.
pub fn rotate_if_needed(log_path: &Path, max_bytes: u64, max_files: usize) -> io::Result<bool> {
    let len = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if len < max_bytes || max_files == 0 {
        return Ok(false);
    }

    match fs::remove_file(backup_path(log_path, max_files)) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    for slot in (1..max_files).rev() {
        let from = backup_path(log_path, slot);
        if from.exists() {
            fs::rename(&from, backup_path(log_path, slot + 1))?;
        }
    }
    fs::rename(log_path, backup_path(log_path, 1))?;
    Ok(true)
}

/// `<log>.<slot>`, e.g. `ramstage.log.2`.
pub fn backup_path(log_path: &Path, slot: usize) -> PathBuf {
    let mut name = log_path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{slot}"));
    log_path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn small_log_is_left_alone() {
        let dir = TempDir::new().expect("tempdir");
        let log = dir.path().join("ramstage.log");
        fs::write(&log, "one line\n").expect("write");
        assert!(!rotate_if_needed(&log, 1024, 5).expect("rotate"));
        assert!(log.exists());
        assert!(!backup_path(&log, 1).exists());
    }

    #[test]
    fn missing_log_is_not_an_error() {
        let dir = TempDir::new().expect("tempdir");
        assert!(!rotate_if_needed(&dir.path().join("ramstage.log"), 1, 5).expect("rotate"));
    }

    #[test]
    fn oversized_log_moves_to_first_backup() {
        let dir = TempDir::new().expect("tempdir");
        let log = dir.path().join("ramstage.log");
        fs::write(&log, vec![b'x'; 2048]).expect("write");

        assert!(rotate_if_needed(&log, 1024, 5).expect("rotate"));
        assert!(!log.exists(), "live log is recreated by the next writer");
        assert_eq!(fs::metadata(backup_path(&log, 1)).expect("backup").len(), 2048);
    }

    #[test]
    fn backups_shift_and_oldest_is_dropped() {
        let dir = TempDir::new().expect("tempdir");
        let log = dir.path().join("ramstage.log");
        for slot in 1..=3 {
            fs::write(backup_path(&log, slot), format!("backup-{slot}")).expect("backup");
        }
        fs::write(&log, vec![b'n'; 64]).expect("write");

        assert!(rotate_if_needed(&log, 16, 3).expect("rotate"));
        assert_eq!(fs::read_to_string(backup_path(&log, 2)).expect("2"), "backup-1");
        assert_eq!(fs::read_to_string(backup_path(&log, 3)).expect("3"), "backup-2");
        assert!(!backup_path(&log, 4).exists(), "cap exceeded");
    }

    #[test]
    fn backup_names_append_the_slot() {
        assert_eq!(
            backup_path(Path::new("/x/logs/ramstage.log"), 4),
            PathBuf::from("/x/logs/ramstage.log.4")
        );
    }
}
