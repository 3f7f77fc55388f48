use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

use crate::assets::{list_assets, Asset};
use crate::config::ManifestConfig;
use crate::error::{ManifestError, ManifestResult};
use crate::layout::{LayoutResolver, NodeTable};
use crate::matchers::{create_matchers, MatcherMap};
use crate::pattern::{compile_route_id, CompiledRouteId, RoutePattern};
use crate::segment::Param;
use crate::sort::sort_routes;
use crate::walker::{walk_routes, RouteTree};

/// A layout, error boundary or page, as files relative to the project root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Universal load module (`+page.js`, `+layout.js`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared: Option<String>,
    /// Server-only load module (`+page.server.js`, `+layout.server.js`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    /// Named layout this node breaks out to, from `@name` in the file name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Indexes into [`Manifest::nodes`]. `layouts` and `errors` run root first
/// and always have the same length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageIndexes {
    pub layouts: Vec<Option<usize>>,
    pub errors: Vec<Option<usize>>,
    pub leaf: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub id: String,
    pub pattern: RoutePattern,
    pub names: Vec<String>,
    pub types: Vec<Option<String>>,
    #[serde(skip)]
    pub params: Vec<Param>,
    pub page: Option<PageIndexes>,
    pub endpoint: Option<Endpoint>,
}

impl Route {
    fn new(id: String, compiled: CompiledRouteId) -> Self {
        Self {
            id,
            names: compiled.names(),
            types: compiled.types(),
            pattern: compiled.pattern,
            params: compiled.params,
            page: None,
            endpoint: None,
        }
    }

    /// Whether a request can end up here. Layout-only directories are part of
    /// the route list without being routable.
    pub fn is_routable(&self) -> bool {
        self.page.is_some() || self.endpoint.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub assets: Vec<Asset>,
    pub matchers: MatcherMap,
    pub nodes: Vec<PageNode>,
    /// In match precedence order
    pub routes: Vec<Route>,
}

impl Manifest {
    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.id == id)
    }

    pub fn to_json(&self) -> ManifestResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for route in &self.routes {
            let kind = match (&route.page, &route.endpoint) {
                (Some(_), _) => "page",
                (None, Some(_)) => "endpoint",
                (None, None) => "-",
            };
            let id = if route.id.is_empty() { "/" } else { &route.id };
            writeln!(f, "{:<8} {:<40} {}", kind, id, route.pattern.as_str())?;
        }

        write!(
            f,
            "{} routes, {} nodes, {} matchers, {} assets",
            self.routes.len(),
            self.nodes.len(),
            self.matchers.len(),
            self.assets.len()
        )
    }
}

/// Builds a manifest from the project described by `config`.
///
/// Nothing is cached between calls. Any error aborts the whole build.
pub fn create_manifest(config: &ManifestConfig) -> ManifestResult<Manifest> {
    config.validate()?;

    let assets = list_assets(&config.assets_dir())?;
    let matchers = create_matchers(config)?;
    let tree = walk_routes(config)?;

    let table = NodeTable::build(&tree);
    let routes = compile_routes(&tree, &table, &matchers)?;
    let routes = sort_routes(routes)?;

    info!(
        "Built manifest: {} routes, {} nodes, {} matchers, {} assets",
        routes.len(),
        table.nodes.len(),
        matchers.len(),
        assets.len()
    );

    Ok(Manifest {
        assets,
        matchers,
        nodes: table.nodes,
        routes,
    })
}

fn compile_routes(
    tree: &RouteTree,
    table: &NodeTable,
    matchers: &MatcherMap,
) -> ManifestResult<Vec<Route>> {
    let resolver = LayoutResolver::new(tree, table);
    let mut routes = Vec::with_capacity(tree.dirs.len());

    for (index, dir) in tree.dirs.iter().enumerate() {
        let compiled = if tree.exists {
            compile_route_id(&dir.id, dir.endpoint.is_some())?
        } else {
            // nothing on disk can match
            CompiledRouteId {
                pattern: RoutePattern::from_ops(Vec::new())?,
                params: Vec::new(),
            }
        };

        for param in &compiled.params {
            if let Some(matcher) = &param.matcher {
                if !matchers.contains_key(matcher) {
                    return Err(ManifestError::UnknownMatcher {
                        matcher: matcher.clone(),
                        route: dir.id.clone(),
                    });
                }
            }
        }

        let mut route = Route::new(dir.id.clone(), compiled);
        route.page = resolver.resolve_layouts(index)?;
        route.endpoint = dir.endpoint.clone().map(|file| Endpoint { file });

        debug!("Compiled route '{}' as {}", route.id, route.pattern.as_str());
        routes.push(route);
    }

    Ok(routes)
}
