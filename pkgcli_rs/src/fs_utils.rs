//! Filesystem helpers for local feeds and cache folders.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Package archive extension, compared case-insensitively.
pub const PACKAGE_EXTENSION: &str = "nupkg";

pub fn is_package_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PACKAGE_EXTENSION))
}

/// All package archives below `dir`, sorted case-insensitively by path.
///
/// Symbolic links are not followed, so a link back into the tree is
/// listed at most once and never walked.
pub fn find_packages(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut packages = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() && is_package_file(entry.path()) {
            packages.push(entry.into_path());
        }
    }
    packages.sort_by_key(|path| path.to_string_lossy().to_lowercase());
    Ok(packages)
}

/// Split `Some.Package.1.2.3` into `("some.package", "1.2.3")`.
///
/// The version starts at the first dot-separated segment that begins with a
/// digit. Returns `None` when there is no such segment or no id before it.
pub fn split_package_file_name(stem: &str) -> Option<(String, String)> {
    let segments: Vec<&str> = stem.split('.').collect();
    let version_start = segments
        .iter()
        .position(|segment| segment.starts_with(|c: char| c.is_ascii_digit()))?;
    if version_start == 0 {
        return None;
    }
    let id = segments[..version_start].join(".").to_lowercase();
    let version = segments[version_start..].join(".").to_lowercase();
    Some((id, version))
}

/// Copy `source` into `destination_dir`, keeping its file name.
///
/// Returns `Ok(false)` without touching anything if the target exists.
pub fn copy_into(source: &Path, destination_dir: &Path) -> io::Result<bool> {
    let file_name = source.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' has no file name", source.display()),
        )
    })?;
    let target = destination_dir.join(file_name);
    if target.exists() {
        return Ok(false);
    }
    fs::create_dir_all(destination_dir)?;
    fs::copy(source, &target)?;
    Ok(true)
}

/// Delete everything inside `dir` but keep `dir` itself.
///
/// A missing directory counts as already clear. Every entry is attempted;
/// the paths that could not be removed are returned.
pub fn clear_directory(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut failed = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let removed = if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        if let Err(err) = removed {
            tracing::warn!(path = %path.display(), error = %err, "failed to remove");
            failed.push(path);
        }
    }
    Ok(failed)
}
