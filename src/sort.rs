//! Orders routes by match precedence.
//!
//! Every route gets a precomputed key, so the order is total and does not
//! depend on the order routes were discovered in. The key is a list of
//! per-segment rank lists. Within a segment each part is ranked, and the
//! segment is closed with [`SEGMENT_END`]:
//!
//! | part                     | rank |
//! |--------------------------|------|
//! | static text              | 0    |
//! | end of segment           | 1    |
//! | `[x=type]`               | 2    |
//! | `[[x=type]]`             | 3    |
//! | `[x]`                    | 4    |
//! | `[[x]]`                  | 5    |
//! | `[...x=type]`            | 6    |
//! | `[...x]`                 | 7    |
//!
//! After the last segment comes a terminator: empty for ordinary routes, so
//! `/x` sorts before `/x/y`, and [`u8::MAX`] for routes with a rest parameter,
//! so `/[...r]/y` sorts before `/[...r]`.

use crate::error::ManifestResult;
use crate::manifest::Route;
use crate::segment::{affects_path, Part, Segment};

const STATIC: u8 = 0;
const SEGMENT_END: u8 = 1;
const DYNAMIC: u8 = 2;

type SortKey = (Vec<Vec<u8>>, bool, String);

fn part_rank(part: &Part) -> u8 {
    match part {
        Part::Static(_) => STATIC,
        Part::Param(param) => {
            DYNAMIC
                + (param.rest as u8) * 4
                + (param.matcher.is_none() as u8) * 2
                + (param.optional as u8)
        }
    }
}

fn sort_key(route: &Route) -> ManifestResult<SortKey> {
    let mut segments = Vec::new();
    let mut has_rest = false;

    for raw in route.id.split('/').filter(|s| !s.is_empty() && affects_path(s)) {
        let segment = Segment::parse(raw).map_err(|e| e.in_route(&route.id))?;
        has_rest |= segment.has_rest();

        let mut ranks: Vec<u8> = segment.parts.iter().map(part_rank).collect();
        ranks.push(SEGMENT_END);
        segments.push(ranks);
    }

    segments.push(if has_rest { vec![u8::MAX] } else { Vec::new() });

    // endpoint-only routes win ties, then the id decides
    let not_endpoint = route.endpoint.is_none();
    Ok((segments, not_endpoint, route.id.clone()))
}

/// Sorts routes so the first route matching a pathname is the one that
/// should handle it.
pub fn sort_routes(routes: Vec<Route>) -> ManifestResult<Vec<Route>> {
    let mut keyed = routes
        .into_iter()
        .map(|route| sort_key(&route).map(|key| (key, route)))
        .collect::<ManifestResult<Vec<_>>>()?;

    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(keyed.into_iter().map(|(_, route)| route).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Endpoint, PageIndexes};
    use crate::pattern::compile_route_id;

    fn route(id: &str, endpoint: bool) -> Route {
        let compiled = compile_route_id(id, endpoint).unwrap();
        Route {
            id: id.to_string(),
            names: compiled.names(),
            types: compiled.types(),
            pattern: compiled.pattern,
            params: compiled.params,
            page: (!endpoint).then(|| PageIndexes {
                layouts: vec![Some(0)],
                errors: vec![Some(1)],
                leaf: 2,
            }),
            endpoint: endpoint.then(|| Endpoint {
                file: format!("src/routes/{}/+server.js", id),
            }),
        }
    }

    fn sorted(routes: Vec<Route>) -> Vec<String> {
        sort_routes(routes)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect()
    }

    #[test]
    fn test_sorts_routes() {
        let expected = vec![
            "",
            "(foo)",
            "(foo)/(bar)",
            "about",
            "foo",
            "post",
            "post/bar",
            "post/foo",
            "post/f[yy].json",
            "post/f[zz]",
            "post/f[xx]",
            "post/f[yy]",
            "foo/[bar]",
            "post/[id]",
            "[endpoint]",
            "[wildcard]",
            "[...rest]/deep/[...deep_rest]/xyz",
            "[...rest]/deep/[...deep_rest]",
            "[...rest]/abc",
            "[...rest]/deep",
            "(foo)/(bar)/[...all]",
            "[...anotherrest]",
            "[...rest]",
        ];

        let endpoints = ["post/f[zz]", "[endpoint]", "[...rest]/deep/[...deep_rest]/xyz"];

        // feed them in reverse so nothing depends on input order
        let routes = expected
            .iter()
            .rev()
            .map(|id| route(id, endpoints.contains(id)))
            .collect();

        assert_eq!(sorted(routes), expected);
    }

    #[test]
    fn test_static_before_dynamic() {
        let routes = vec![route("post/[id]", false), route("post/bar", false)];
        assert_eq!(sorted(routes), vec!["post/bar", "post/[id]"]);
    }

    #[test]
    fn test_typed_before_untyped_before_optional() {
        let routes = vec![
            route("[[lang]]", false),
            route("[slug]", false),
            route("[id=integer]", false),
        ];
        assert_eq!(sorted(routes), vec!["[id=integer]", "[slug]", "[[lang]]"]);
    }

    #[test]
    fn test_segment_end_between_static_and_dynamic() {
        let routes = vec![route("x[y]", false), route("xy", false)];
        assert_eq!(sorted(routes), vec!["xy", "x[y]"]);

        let routes = vec![route("[x]", false), route("[x].json", false)];
        assert_eq!(sorted(routes), vec!["[x].json", "[x]"]);
    }

    #[test]
    fn test_endpoint_wins_tie() {
        let routes = vec![route("(a)/[x]", false), route("(b)/[y]", true)];
        assert_eq!(sorted(routes), vec!["(b)/[y]", "(a)/[x]"]);
    }
}
