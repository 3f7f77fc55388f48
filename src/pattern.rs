//! Compiles route ids into URL patterns.
//!
//! Compilation happens in two steps. A route id is first turned into a list of
//! [`PatternOp`]s, which is then lowered to a [`regex::Regex`]. Keeping the op
//! list separate makes escaping and capture shapes easy to test without going
//! through regex source text.

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::{ManifestError, ManifestResult};
use crate::segment::{affects_path, decode_literal, Param, Part, Segment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternOp {
    /// Decoded text, matched verbatim
    Literal(String),
    /// `([^/]+?)`
    Param,
    /// `([^/]*)?`
    OptionalParam,
    /// `(.*?)`
    Rest,
    /// `(?:/(.*))?`, a whole segment that may match zero URL segments
    RestSegment,
    /// `(?:/([^/]+))?`, a whole segment that may be absent
    OptionalSegment,
    /// `/?`
    TrailingSlash,
}

impl PatternOp {
    fn lower(&self, out: &mut String) {
        match self {
            PatternOp::Literal(text) => out.push_str(&regex::escape(text)),
            PatternOp::Param => out.push_str("([^/]+?)"),
            PatternOp::OptionalParam => out.push_str("([^/]*)?"),
            PatternOp::Rest => out.push_str("(.*?)"),
            PatternOp::RestSegment => out.push_str("(?:/(.*))?"),
            PatternOp::OptionalSegment => out.push_str("(?:/([^/]+))?"),
            PatternOp::TrailingSlash => out.push_str("/?"),
        }
    }
}

/// An anchored pattern matching URL pathnames.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    ops: Vec<PatternOp>,
    regex: Regex,
}

impl RoutePattern {
    pub fn from_ops(ops: Vec<PatternOp>) -> ManifestResult<Self> {
        let mut source = String::from("^");
        for op in &ops {
            op.lower(&mut source);
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|source_err| ManifestError::Pattern {
            pattern: source.clone(),
            source: source_err,
        })?;

        Ok(Self { ops, regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, pathname: &str) -> bool {
        self.regex.is_match(pathname)
    }

    /// One entry per capture group, `None` where the group did not take part.
    pub fn captures(&self, pathname: &str) -> Option<Vec<Option<String>>> {
        let captures = self.regex.captures(pathname)?;
        Some(
            captures
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect(),
        )
    }
}

impl PartialEq for RoutePattern {
    fn eq(&self, other: &Self) -> bool {
        self.ops == other.ops
    }
}

impl Eq for RoutePattern {}

impl Serialize for RoutePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The result of compiling one route id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRouteId {
    pub pattern: RoutePattern,
    pub params: Vec<Param>,
}

impl CompiledRouteId {
    pub fn names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name.clone()).collect()
    }

    pub fn types(&self) -> Vec<Option<String>> {
        self.params.iter().map(|p| p.matcher.clone()).collect()
    }
}

/// Builds the op list for a route id.
///
/// `exact` routes (endpoints) never get the optional trailing slash. Neither
/// do routes whose last segment looks like a file name, such as `blog.json`.
pub fn route_id_ops(id: &str, exact: bool) -> ManifestResult<(Vec<PatternOp>, Vec<Param>)> {
    let mut ops = Vec::new();
    let mut params = Vec::new();

    if id.is_empty() {
        ops.push(PatternOp::Literal("/".to_string()));
        return Ok((ops, params));
    }

    let segments: Vec<&str> = id.split('/').filter(|s| affects_path(s)).collect();
    let mut trailing_slash = !exact;

    for (i, raw) in segments.iter().enumerate() {
        let segment = Segment::parse(raw).map_err(|e| e.in_route(id))?;

        if let Some(param) = segment.sole_param() {
            if param.rest || param.optional {
                ops.push(if param.rest {
                    PatternOp::RestSegment
                } else {
                    PatternOp::OptionalSegment
                });
                params.push(param.clone());
                continue;
            }
        }

        let is_last = i == segments.len() - 1;
        push_literal(&mut ops, "/");

        for part in segment.parts {
            match part {
                Part::Static(text) => {
                    if is_last && text.contains('.') {
                        trailing_slash = false;
                    }
                    push_literal(&mut ops, &decode_literal(&text));
                }
                Part::Param(param) => {
                    ops.push(if param.rest {
                        PatternOp::Rest
                    } else if param.optional {
                        PatternOp::OptionalParam
                    } else {
                        PatternOp::Param
                    });
                    params.push(param);
                }
            }
        }
    }

    if trailing_slash {
        ops.push(PatternOp::TrailingSlash);
    }

    Ok((ops, params))
}

fn push_literal(ops: &mut Vec<PatternOp>, text: &str) {
    if let Some(PatternOp::Literal(existing)) = ops.last_mut() {
        existing.push_str(text);
    } else {
        ops.push(PatternOp::Literal(text.to_string()));
    }
}

pub fn compile_route_id(id: &str, exact: bool) -> ManifestResult<CompiledRouteId> {
    let (ops, params) = route_id_ops(id, exact)?;
    Ok(CompiledRouteId {
        pattern: RoutePattern::from_ops(ops)?,
        params,
    })
}
