use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ManifestError, ManifestResult};
use crate::utils::resolve_against;

/// Everything the manifest compiler needs to know about a project.
///
/// Relative paths are resolved against `cwd`. Paths written into the manifest
/// are relative to `cwd` as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManifestConfig {
    pub cwd: PathBuf,
    /// Root of the route tree
    pub routes: PathBuf,
    /// Static files served as-is
    pub assets: PathBuf,
    /// Parameter matchers
    pub params: PathBuf,
    /// Component file extensions
    pub extensions: Vec<String>,
    /// Script module file extensions
    pub module_extensions: Vec<String>,
    /// Directory holding the default `layout.svelte` and `error.svelte`
    pub fallback: PathBuf,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            cwd: PathBuf::from("."),
            routes: PathBuf::from("src/routes"),
            assets: PathBuf::from("static"),
            params: PathBuf::from("src/params"),
            extensions: vec![".svelte".to_string()],
            module_extensions: vec![".js".to_string(), ".ts".to_string()],
            fallback: PathBuf::from("."),
        }
    }
}

impl ManifestConfig {
    pub fn new<P: Into<PathBuf>>(cwd: P) -> Self {
        Self {
            cwd: cwd.into(),
            ..Self::default()
        }
    }

    /// Loads a JSON config file. Missing keys take their defaults and a
    /// relative `cwd` is taken relative to the file itself.
    pub fn from_json_file(path: &Path) -> ManifestResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ManifestError::io(path, e))?;
        let mut config: ManifestConfig = serde_json::from_str(&content)?;

        if let Some(dir) = path.parent() {
            config.cwd = resolve_against(dir, &config.cwd);
        }

        Ok(config)
    }

    pub fn validate(&self) -> ManifestResult<()> {
        for ext in self.extensions.iter().chain(&self.module_extensions) {
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(ManifestError::invalid_config(format!(
                    "Each member of extensions and moduleExtensions must start with '.' — saw '{}'",
                    ext
                )));
            }
        }

        if self.extensions.is_empty() {
            return Err(ManifestError::invalid_config(
                "At least one component extension is required",
            ));
        }

        Ok(())
    }

    pub fn routes_dir(&self) -> PathBuf {
        resolve_against(&self.cwd, &self.routes)
    }

    pub fn assets_dir(&self) -> PathBuf {
        resolve_against(&self.cwd, &self.assets)
    }

    pub fn params_dir(&self) -> PathBuf {
        resolve_against(&self.cwd, &self.params)
    }

    pub fn fallback_dir(&self) -> PathBuf {
        resolve_against(&self.cwd, &self.fallback)
    }

    /// The component extension `file_name` ends with, if any.
    pub fn component_extension(&self, file_name: &str) -> Option<&str> {
        self.extensions
            .iter()
            .map(String::as_str)
            .find(|ext| file_name.ends_with(ext))
    }

    /// The module extension `file_name` ends with, if any.
    pub fn module_extension(&self, file_name: &str) -> Option<&str> {
        self.module_extensions
            .iter()
            .map(String::as_str)
            .find(|ext| file_name.ends_with(ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = ManifestConfig::new("/app");
        assert_eq!(config.routes_dir(), PathBuf::from("/app/src/routes"));
        assert_eq!(config.assets_dir(), PathBuf::from("/app/static"));
        assert_eq!(config.params_dir(), PathBuf::from("/app/src/params"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_extension_lookup() {
        let config = ManifestConfig::default();
        assert_eq!(config.component_extension("+page.svelte"), Some(".svelte"));
        assert_eq!(config.module_extension("+page.server.ts"), Some(".ts"));
        assert_eq!(config.component_extension("+page.js"), None);
    }

    #[test]
    fn test_rejects_extension_without_dot() {
        let config = ManifestConfig {
            extensions: vec!["svelte".to_string()],
            ..ManifestConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must start with '.'"));
    }

    #[test]
    fn test_from_json_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("routes.config.json");
        fs::write(
            &path,
            r#"{ "routes": "app/routes", "moduleExtensions": [".js"] }"#,
        )
        .unwrap();

        let config = ManifestConfig::from_json_file(&path).unwrap();
        assert_eq!(config.cwd, temp_dir.path().join("."));
        assert_eq!(config.routes_dir(), temp_dir.path().join(".").join("app/routes"));
        assert_eq!(config.module_extensions, vec![".js"]);
        assert_eq!(config.extensions, vec![".svelte"]);
    }

    #[test]
    fn test_from_json_file_rejects_bad_json() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{ routes: ").unwrap();

        let err = ManifestConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ManifestError::Json(_)));
    }
}
