use std::collections::HashMap;

/// Join a controller prefix and a route path into a dispatch path.
///
/// The result always starts with `/`, never contains an empty segment at the join, and has
/// a single trailing `/` removed unless it is the root path.
///
/// # Example
/// ```
/// use talon::router::normalize_path;
///
/// assert_eq!(normalize_path("/dino", "/"), "/dino");
/// assert_eq!(normalize_path("/dino", "/all/"), "/dino/all");
/// assert_eq!(normalize_path("", "/"), "/");
/// ```
pub fn normalize_path(prefix: &str, path: &str) -> String {
    let mut joined = String::with_capacity(prefix.len() + path.len() + 2);
    for part in [prefix.trim_matches('/'), path.trim_start_matches('/')] {
        if !part.is_empty() {
            joined.push('/');
            joined.push_str(part);
        }
    }
    if joined.is_empty() {
        joined.push('/');
    }

    trim_trailing_slash(joined)
}

/// Normalize an inbound request path the same way route paths are normalized.
pub fn normalize_request_path(path: &str) -> String {
    normalize_path("", path)
}

fn trim_trailing_slash(mut path: String) -> String {
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    path
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A dispatch path split into literal and parameter segments.
///
/// Parameters are written `{name}` or `:name` and match exactly one non-empty segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(path: &str) -> Self {
        let segments = split(path)
            .map(|segment| {
                if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Segment::Param(name.to_string())
                } else if let Some(name) = segment.strip_prefix(':') {
                    Segment::Param(name.to_string())
                } else {
                    Segment::Literal(segment.to_string())
                }
            })
            .collect();

        Self {
            raw: path.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when the pattern has no parameter segments.
    pub fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|segment| matches!(segment, Segment::Literal(_)))
    }

    /// Match a normalized path, returning captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let mut params = HashMap::new();
        let mut parts = split(path);

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }

        match parts.next() {
            Some(_) => None,
            None => Some(params),
        }
    }

    /// Two patterns overlap structurally when they differ only in parameter names.
    pub(crate) fn same_shape(&self, other: &PathPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Param(_), Segment::Param(_)) => true,
                    _ => false,
                })
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}
