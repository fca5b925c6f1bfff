//! Default-profile discovery from `profiles.ini`.
//!
//! # File shape
//!
//! ```text
//! [General]
//! StartWithLastProfile=1
//!
//! [Profile0]
//! Name=default-release
//! IsRelative=1
//! Path=Profiles/abcd1234.default-release
//! Default=1
//! ```
//!
//! Only `[Profile*]` sections are scanned. A section is eligible when it has
//! `Default=1`, a declared `IsRelative` flag and a non-empty `Path`. Sections
//! are evaluated as soon as the next header is seen (and once more at end of
//! input); the first eligible section wins.
//!
//! `IsRelative=0` is accepted on purpose, not only `IsRelative=1`: Firefox
//! writes it for profiles created outside the profiles directory, and their
//! `Path` is then used as an absolute path. A missing or malformed flag still
//! makes the section ineligible.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{io_err, StageError};

pub const PROFILES_INI: &str = "profiles.ini";
const PROFILE_SECTION_PREFIX: &str = "Profile";

/// One `[Profile*]` section as read from `profiles.ini`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileRecord {
    pub section: String,
    pub name: Option<String>,
    pub path: Option<String>,
    /// `None` when `IsRelative` is absent or not `0`/`1`.
    pub is_relative: Option<bool>,
    pub is_default: bool,
}

impl ProfileRecord {
    fn new(section: &str) -> Self {
        Self {
            section: section.to_owned(),
            ..Self::default()
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.is_default
            && self.is_relative.is_some()
            && self.path.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Absolute location of the profile, joining relative paths onto `root`.
    pub fn resolve(&self, root: &Path) -> Option<PathBuf> {
        let path = self.path.as_deref().filter(|p| !p.is_empty())?;
        match self.is_relative? {
            true => Some(root.join(path)),
            false => Some(PathBuf::from(path)),
        }
    }

    fn apply(&mut self, key: &str, value: &str) {
        match key {
            "Name" => self.name = Some(value.to_owned()),
            "Path" => self.path = Some(value.to_owned()),
            "IsRelative" => {
                self.is_relative = match value {
                    "1" => Some(true),
                    "0" => Some(false),
                    _ => None,
                }
            }
            "Default" => self.is_default = value == "1",
            _ => {}
        }
    }
}

/// Return the first eligible `[Profile*]` section of `contents`, if any.
pub fn find_default_profile(contents: &str) -> Option<ProfileRecord> {
    // `None` while inside a non-profile section (or before the first header).
    let mut current: Option<ProfileRecord> = None;

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            if let Some(done) = current.take() {
                if done.is_eligible() {
                    return Some(done);
                }
            }
            let header = header.trim();
            if header.starts_with(PROFILE_SECTION_PREFIX) {
                current = Some(ProfileRecord::new(header));
            }
            continue;
        }

        let Some(record) = current.as_mut() else {
            continue;
        };
        if let Some((key, value)) = line.split_once('=') {
            record.apply(key.trim(), value.trim());
        }
    }

    current.filter(ProfileRecord::is_eligible)
}

/// A located profile directory and its size on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedProfile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Resolve the default profile listed in `<root>/profiles.ini`.
///
/// Returns `StageError::ProfileNotFound` when the file is missing or
/// unreadable, has no eligible section, or points at a missing directory.
pub fn resolve_at(root: &Path) -> Result<ResolvedProfile, StageError> {
    let ini = root.join(PROFILES_INI);
    let contents = std::fs::read_to_string(&ini).map_err(|e| {
        StageError::not_found(format!("cannot read {}: {e}", ini.display()))
    })?;

    let record = find_default_profile(&contents).ok_or_else(|| {
        StageError::not_found(format!("no default profile listed in {}", ini.display()))
    })?;
    let path = record.resolve(root).ok_or_else(|| {
        StageError::not_found(format!("section [{}] has no usable path", record.section))
    })?;

    resolve_explicit(path)
}

/// Size an explicitly chosen profile directory.
pub fn resolve_explicit(path: PathBuf) -> Result<ResolvedProfile, StageError> {
    if !path.is_dir() {
        return Err(StageError::not_found(format!(
            "profile directory does not exist: {}",
            path.display()
        )));
    }
    let size_bytes = directory_size(&path)?;
    Ok(ResolvedProfile { path, size_bytes })
}

/// Sum of regular-file lengths under `root`. Symlinks are not followed.
pub fn directory_size(root: &Path) -> Result<u64, StageError> {
    let mut total = 0u64;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("walk failed"));
                return Err(io_err(root, source));
            }
            Err(_) => continue,
        };
        if entry.file_type().is_file() {
            if let Ok(meta) = entry.metadata() {
                total = total.saturating_add(meta.len());
            }
        }
    }
    Ok(total)
}
