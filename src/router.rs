use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

use crate::manifest::{Manifest, Route};

/// Host-supplied implementation of a `[name=type]` matcher.
pub trait ParamMatcher {
    fn matches(&self, param: &str) -> bool;
}

impl<F> ParamMatcher for F
where
    F: Fn(&str) -> bool,
{
    fn matches(&self, param: &str) -> bool {
        self(param)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: BTreeMap<String, String>,
}

impl Route {
    /// Matches `pathname` against this route and extracts its parameters.
    ///
    /// A typed parameter without an implementation in `matchers` never
    /// matches. Optional parameters that matched nothing are left out, while
    /// rest parameters are always present.
    pub fn exec<M: ParamMatcher>(
        &self,
        pathname: &str,
        matchers: &HashMap<String, M>,
    ) -> Option<BTreeMap<String, String>> {
        let captures = self.pattern.captures(pathname)?;
        let mut params = BTreeMap::new();

        for (param, value) in self.params.iter().zip(captures) {
            let value = match value {
                Some(value) if !value.is_empty() || param.rest => decode_param(value),
                _ if param.rest => String::new(),
                _ => continue,
            };

            if let Some(matcher) = &param.matcher {
                let Some(implementation) = matchers.get(matcher) else {
                    trace!("No implementation for matcher '{}'", matcher);
                    return None;
                };
                if !implementation.matches(&value) {
                    return None;
                }
            }

            params.insert(param.name.clone(), value);
        }

        Some(params)
    }
}

impl Manifest {
    /// Finds the route that handles `pathname`, trying routes in precedence
    /// order.
    pub fn match_path<M: ParamMatcher>(
        &self,
        pathname: &str,
        matchers: &HashMap<String, M>,
    ) -> Option<RouteMatch<'_>> {
        self.routes
            .iter()
            .filter(|route| route.is_routable())
            .find_map(|route| {
                route
                    .exec(pathname, matchers)
                    .map(|params| RouteMatch { route, params })
            })
    }
}

fn decode_param(value: String) -> String {
    match urlencoding::decode(&value) {
        Ok(Cow::Owned(decoded)) => decoded,
        _ => value,
    }
}
