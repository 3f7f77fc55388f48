//! Parsing of a single route directory name.
//!
//! A segment is split into alternating static text and bracketed parameters:
//!
//! - `[slug]` is a required parameter
//! - `[[lang]]` is an optional parameter
//! - `[...path]` is a rest parameter and may span several URL segments
//! - `[id=uuid]` ties a parameter to the `uuid` matcher
//!
//! Segments wrapped in parentheses, such as `(marketing)`, are route groups.
//! They organize layouts and never appear in the URL.

use serde::Serialize;
use std::borrow::Cow;

use crate::error::ManifestError;

/// A parameter declared inside brackets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    /// Matcher name from `[name=matcher]`
    pub matcher: Option<String>,
    pub rest: bool,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Raw text as written on disk, still percent-encoded
    Static(String),
    Param(Param),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub parts: Vec<Part>,
}

/// Syntax problems found in one segment. The route compiler attaches the
/// route id when turning these into a [`ManifestError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    InvalidParam(String),
    Unseparated,
    MultipleRest,
    Unterminated,
}

impl SegmentError {
    pub fn in_route(self, route_id: &str) -> ManifestError {
        match self {
            SegmentError::InvalidParam(content) => ManifestError::InvalidParam(content),
            SegmentError::Unseparated => ManifestError::UnseparatedParams(route_id.to_string()),
            SegmentError::MultipleRest => ManifestError::MultipleRestParams(route_id.to_string()),
            SegmentError::Unterminated => ManifestError::UnterminatedParam(route_id.to_string()),
        }
    }
}

impl Segment {
    pub fn parse(raw: &str) -> Result<Self, SegmentError> {
        let mut parts = Vec::new();
        let mut remaining = raw;

        while let Some(start) = remaining.find('[') {
            if start > 0 {
                parts.push(Part::Static(remaining[..start].to_string()));
            }

            let bracketed = &remaining[start..];
            let (optional, open, close) = if bracketed.starts_with("[[") {
                (true, 2, "]]")
            } else {
                (false, 1, "]")
            };

            let end = bracketed[open..]
                .find(close)
                .map(|i| i + open)
                .ok_or(SegmentError::Unterminated)?;

            let param = parse_param(&bracketed[open..end], optional)?;

            if matches!(parts.last(), Some(Part::Param(_))) {
                return Err(SegmentError::Unseparated);
            }

            parts.push(Part::Param(param));
            remaining = &bracketed[end + close.len()..];
        }

        if !remaining.is_empty() {
            parts.push(Part::Static(remaining.to_string()));
        }

        let rest_count = parts
            .iter()
            .filter(|part| matches!(part, Part::Param(p) if p.rest))
            .count();
        if rest_count > 1 {
            return Err(SegmentError::MultipleRest);
        }

        Ok(Self { parts })
    }

    pub fn params(&self) -> impl Iterator<Item = &Param> {
        self.parts.iter().filter_map(|part| match part {
            Part::Param(param) => Some(param),
            Part::Static(_) => None,
        })
    }

    /// The parameter, when the whole segment is a single parameter.
    pub fn sole_param(&self) -> Option<&Param> {
        match self.parts.as_slice() {
            [Part::Param(param)] => Some(param),
            _ => None,
        }
    }

    pub fn has_rest(&self) -> bool {
        self.params().any(|param| param.rest)
    }
}

fn parse_param(content: &str, optional: bool) -> Result<Param, SegmentError> {
    let invalid = || SegmentError::InvalidParam(content.to_string());

    let (rest, declaration) = match content.strip_prefix("...") {
        Some(declaration) => (true, declaration),
        None => (false, content),
    };

    // `[[...path]]` would be an optional rest parameter, which rest already is
    if rest && optional {
        return Err(invalid());
    }

    let (name, matcher) = match declaration.split_once('=') {
        Some((name, matcher)) => (name, Some(matcher)),
        None => (declaration, None),
    };

    if !is_word(name) || matcher.is_some_and(|m| !is_word(m)) {
        return Err(invalid());
    }

    Ok(Param {
        name: name.to_string(),
        matcher: matcher.map(str::to_string),
        rest,
        optional,
    })
}

/// `^\w+$` with ASCII word characters.
pub fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `(name)` segments organize layouts without affecting the URL.
pub fn is_group(segment: &str) -> bool {
    segment.len() > 2
        && segment.starts_with('(')
        && segment.ends_with(')')
        && !segment[1..segment.len() - 1].contains(')')
}

pub fn affects_path(segment: &str) -> bool {
    !is_group(segment)
}

/// Decodes static text the way it will appear in a request path.
///
/// Characters the filesystem cannot hold (or that are route syntax) are
/// written percent-encoded on disk. `%`, `/`, `#` and `?` only reach a
/// request path encoded, so they are encoded again after decoding.
pub fn decode_literal(raw: &str) -> String {
    let decoded = urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw));
    decoded
        .replace('%', "%25")
        .replace('/', "%2F")
        .replace('#', "%23")
        .replace('?', "%3F")
}
