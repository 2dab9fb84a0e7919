//! Dotted path parsing.

use std::fmt;

/// Literal segment meaning "all direct navigations of the current type".
pub const WILDCARD: &str = "*";

/// One segment of a dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    /// Segment text, trimmed.
    pub name: String,
    /// Whether the segment is the `*` wildcard.
    pub is_wildcard: bool,
}

impl PathSegment {
    /// Create a named segment.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let is_wildcard = name == WILDCARD;
        Self { name, is_wildcard }
    }

    /// Create a wildcard segment.
    pub fn wildcard() -> Self {
        Self {
            name: WILDCARD.to_string(),
            is_wildcard: true,
        }
    }
}

/// An ordered sequence of path segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ParsedPath {
    segments: Vec<PathSegment>,
}

impl ParsedPath {
    /// Build a path from segments.
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// The segments in order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The final segment.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Check if the final segment is a wildcard.
    pub fn ends_with_wildcard(&self) -> bool {
        self.last().map(|s| s.is_wildcard).unwrap_or(false)
    }

    /// The path without its final segment, `None` for single-segment paths.
    pub fn parent(&self) -> Option<ParsedPath> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// The path extended by one segment.
    pub fn child(&self, segment: PathSegment) -> ParsedPath {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Check if `self` is a proper prefix of `other` (case-insensitive).
    pub fn is_proper_prefix_of(&self, other: &ParsedPath) -> bool {
        self.segments.len() < other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.name.eq_ignore_ascii_case(&b.name))
    }

    /// Case-insensitive equality.
    pub fn eq_ignore_case(&self, other: &ParsedPath) -> bool {
        self.segments.len() == other.segments.len() && self.is_prefix_or_equal(other)
    }

    fn is_prefix_or_equal(&self, other: &ParsedPath) -> bool {
        self.segments
            .iter()
            .zip(&other.segments)
            .all(|(a, b)| a.name.eq_ignore_ascii_case(&b.name))
    }

    /// Lower-cased dotted form, used as a dedup key.
    pub fn normalized(&self) -> String {
        self.to_string().to_ascii_lowercase()
    }
}

impl fmt::Display for ParsedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&segment.name)?;
        }
        Ok(())
    }
}

/// Parse a dotted path.
///
/// Whitespace around the path and around each segment is trimmed. Blank input
/// yields an empty path.
pub fn parse(raw: &str) -> ParsedPath {
    let raw = raw.trim();
    if raw.is_empty() {
        return ParsedPath::default();
    }
    ParsedPath {
        segments: raw
            .split('.')
            .map(|segment| PathSegment::named(segment.trim()))
            .collect(),
    }
}
