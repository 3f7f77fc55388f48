use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    // Segment syntax errors
    #[error("Invalid param: {0}. Params and matcher names can only have underscores and alphanumeric characters.")]
    InvalidParam(String),

    #[error("Invalid route {0} — parameters must be separated")]
    UnseparatedParams(String),

    #[error("Invalid route {0} — a segment can only contain one rest parameter")]
    MultipleRestParams(String),

    #[error("Invalid route {0} — unterminated parameter")]
    UnterminatedParam(String),

    #[error("Invalid route pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("No matcher found for parameter '{matcher}' in route {route}")]
    UnknownMatcher { matcher: String, route: String },

    // Matcher registry errors
    #[error("Matcher names can only have underscores and alphanumeric characters — \"{0}\" is invalid")]
    InvalidMatcherName(String),

    #[error("Duplicate matchers: {} and {}", .0.display(), .1.display())]
    DuplicateMatcher(PathBuf, PathBuf),

    // Route tree errors
    #[error("{0} and {1} occupy the same route")]
    RouteConflict(String, String),

    #[error("{0} has both a page and a +server endpoint")]
    PageEndpointConflict(String),

    #[error("Multiple {role} files in {dir}: {first} and {second}")]
    DuplicateRouteFile {
        role: &'static str,
        dir: String,
        first: String,
        second: String,
    },

    #[error("{file} references missing segment \"{segment}\"")]
    MissingLayoutSegment { file: String, segment: String },

    #[error("Only Svelte files can reference named layouts. Remove '{reference}' from {name} (at {file})")]
    NamedLayoutInModule {
        reference: String,
        name: String,
        file: String,
    },

    #[error("{0} should be reimplemented with layout groups: https://kit.svelte.dev/docs/advanced-routing#advanced-layouts")]
    DeprecatedLayout(String),

    #[error("Files prefixed with + are reserved (saw {0})")]
    ReservedFile(String),

    #[error("Files and directories prefixed with + are reserved (saw {0})")]
    ReservedDirectory(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // File system errors
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Manifest build task failed: {0}")]
    BuildTask(#[from] tokio::task::JoinError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

// Helper functions for creating common errors
impl ManifestError {
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        ManifestError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        ManifestError::InvalidConfig(msg.into())
    }
}

pub type ManifestResult<T> = Result<T, ManifestError>;
