//! Compiles a filesystem route tree into a route manifest.
//!
//! Directories under the routes root become routes, `+page`, `+layout`,
//! `+error` and `+server` files become the nodes and endpoints attached to
//! them, and the result is sorted so the first matching route wins.

pub mod assets;
pub mod config;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod matchers;
pub mod pattern;
pub mod router;
pub mod segment;
pub mod sort;
pub mod utils;
pub mod walker;
pub mod watch;

pub use config::ManifestConfig;
pub use error::{ManifestError, ManifestResult};
pub use manifest::{create_manifest, Endpoint, Manifest, PageIndexes, PageNode, Route};
pub use router::{ParamMatcher, RouteMatch};
pub use watch::ManifestWatcher;
