use serde::Serialize;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::ManifestResult;
use crate::utils::posixify;

/// A static file copied to the output unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    /// Path relative to the assets root
    pub file: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
}

/// Lists every file under the assets root, sorted by path.
pub fn list_assets(assets_dir: &Path) -> ManifestResult<Vec<Asset>> {
    if !assets_dir.is_dir() {
        debug!("No assets directory at {}", assets_dir.display());
        return Ok(Vec::new());
    }

    let mut assets = Vec::new();

    for entry in WalkDir::new(assets_dir).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(assets_dir).unwrap_or(entry.path());
        let metadata = entry.metadata()?;

        assets.push(Asset {
            file: posixify(relative),
            size: metadata.len(),
            mime_type: mime_guess::from_path(entry.path())
                .first()
                .map(|mime| mime.essence_str().to_string()),
        });
    }

    assets.sort_by(|a, b| a.file.cmp(&b.file));
    debug!("Found {} assets", assets.len());

    Ok(assets)
}
