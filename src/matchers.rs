use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

use crate::config::ManifestConfig;
use crate::error::{ManifestError, ManifestResult};
use crate::segment::is_word;
use crate::utils::read_dir_sorted;

/// Matcher name → file, relative to the project root.
pub type MatcherMap = BTreeMap<String, PathBuf>;

/// Collects parameter matchers from the params directory.
///
/// Only files directly inside the directory with a module extension count.
/// The matcher implementations themselves are loaded by whoever consumes the
/// manifest.
pub fn create_matchers(config: &ManifestConfig) -> ManifestResult<MatcherMap> {
    let params_dir = config.params_dir();
    let params_base =
        pathdiff::diff_paths(&params_dir, &config.cwd).unwrap_or_else(|| params_dir.clone());

    let mut matchers = MatcherMap::new();

    if !params_dir.is_dir() {
        debug!("No matchers directory at {}", params_dir.display());
        return Ok(matchers);
    }

    for entry in read_dir_sorted(&params_dir)? {
        let file = entry.file_name().to_string_lossy().into_owned();
        if !entry.path().is_file() {
            continue;
        }

        let Some(ext) = config
            .module_extensions
            .iter()
            .find(|ext| file.ends_with(ext.as_str()) && file.len() > ext.len())
        else {
            continue;
        };

        let name = &file[..file.len() - ext.len()];
        if !is_word(name) {
            return Err(ManifestError::InvalidMatcherName(file));
        }

        let matcher_file = params_base.join(&file);
        if let Some(existing) = matchers.get(name) {
            return Err(ManifestError::DuplicateMatcher(matcher_file, existing.clone()));
        }

        debug!("Registered matcher '{}' from {}", name, matcher_file.display());
        matchers.insert(name.to_string(), matcher_file);
    }

    Ok(matchers)
}
