use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{ManifestError, ManifestResult};

/// Renders `path` relative to `cwd` with `/` separators, the form used for
/// every path stored in a manifest.
pub fn project_relative(cwd: &Path, path: &Path) -> String {
    let relative = pathdiff::diff_paths(path, cwd).unwrap_or_else(|| path.to_path_buf());
    posixify(&relative)
}

pub fn posixify(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::CurDir => None,
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Joins `path` onto `base` unless it is already absolute.
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Directory entries sorted by file name, so results never depend on the
/// order the OS happens to return them in.
pub fn read_dir_sorted(dir: &Path) -> ManifestResult<Vec<fs::DirEntry>> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| ManifestError::io(dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ManifestError::io(dir, e))?;

    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries)
}
