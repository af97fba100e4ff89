//! Path string helpers and directory creation.
//!
//! The string helpers accept both `/` and `\` as separators so that batch
//! scripts written on either platform decompose the same way.

use std::path::{Path, PathBuf};

use crate::error::Result;

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

fn last_separator(s: &str) -> Option<usize> {
    s.rfind(is_separator)
}

/// Final component of a path string: `"a/b/c.obj"` gives `"c.obj"`.
#[must_use]
pub fn file_name(s: &str) -> &str {
    last_separator(s).map_or(s, |i| &s[i + 1..])
}

/// Everything before the last `.`: `"a/b/c.obj"` gives `"a/b/c"`.
///
/// Returns an empty string when there is no dot.
#[must_use]
pub fn base_name(s: &str) -> &str {
    s.rfind('.').map_or("", |i| &s[..i])
}

/// Everything after the last `.`, or an empty string.
#[must_use]
pub fn extension(s: &str) -> &str {
    s.rfind('.').map_or("", |i| &s[i + 1..])
}

/// Directory part including the trailing separator: `"a/b/c.obj"` gives `"a/b/"`.
///
/// Returns an empty string when there is no separator.
#[must_use]
pub fn directory(s: &str) -> &str {
    last_separator(s).map_or("", |i| &s[..=i])
}

/// Left-pads `num` with zeros to `width` digits.
#[must_use]
pub fn zero_pad_number(num: usize, width: usize) -> String {
    format!("{num:0width$}")
}

/// Whether `path` exists and is a directory.
#[must_use]
pub fn is_directory(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_dir()
}

/// Creates `path` and every missing ancestor, parents before children.
///
/// Walks upward collecting missing directories until an existing ancestor (or
/// the root) is reached, then creates them root to leaf. Calling it on an
/// existing directory does nothing.
pub fn create_directories(path: impl AsRef<Path>) -> Result<()> {
    let mut missing: Vec<PathBuf> = Vec::new();
    let mut current = Some(path.as_ref());

    while let Some(dir) = current {
        if dir.as_os_str().is_empty() || is_directory(dir) {
            break;
        }
        missing.push(dir.to_path_buf());
        current = dir.parent();
    }

    while let Some(dir) = missing.pop() {
        log::debug!("creating directory {}", dir.display());
        match std::fs::create_dir(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && dir.is_dir() => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
