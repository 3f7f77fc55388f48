use clap::Parser;
use std::path::PathBuf;

use route_manifest::ManifestConfig;

#[derive(Parser, Debug)]
#[command(name = "route_manifest")]
#[command(about = "Compiles a filesystem route tree into a route manifest")]
pub struct Args {
    /// Project root. Relative paths are resolved against it
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// JSON config file, overridden by any flags given here
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Routes directory
    #[arg(long)]
    pub routes: Option<PathBuf>,

    /// Static assets directory
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Parameter matchers directory
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Component extensions, comma separated
    #[arg(long, value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Module extensions, comma separated
    #[arg(long, value_delimiter = ',')]
    pub module_extensions: Option<Vec<String>>,

    /// Directory with the default layout.svelte and error.svelte
    #[arg(long)]
    pub fallback: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "json")]
    #[arg(value_parser = ["json", "text"])]
    pub output: String,

    /// Print the route a pathname resolves to instead of the manifest
    #[arg(long = "match", value_name = "PATHNAME")]
    pub match_path: Option<String>,

    /// Keep running and rebuild on changes
    #[arg(long)]
    pub watch: bool,

    /// Log level
    #[arg(long, default_value = "warn")]
    #[arg(value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,
}

impl Args {
    /// Layers flags over `base`, which holds defaults or a loaded config file.
    pub fn apply(&self, mut base: ManifestConfig) -> ManifestConfig {
        if let Some(cwd) = &self.cwd {
            base.cwd = cwd.clone();
        }
        if let Some(routes) = &self.routes {
            base.routes = routes.clone();
        }
        if let Some(assets) = &self.assets {
            base.assets = assets.clone();
        }
        if let Some(params) = &self.params {
            base.params = params.clone();
        }
        if let Some(extensions) = &self.extensions {
            base.extensions = extensions.clone();
        }
        if let Some(module_extensions) = &self.module_extensions {
            base.module_extensions = module_extensions.clone();
        }
        if let Some(fallback) = &self.fallback {
            base.fallback = fallback.clone();
        }
        base
    }
}
