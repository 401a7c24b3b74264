//! Positions in query text

use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte range `start..end` of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Where a span begins, as a 1-based line and column, with its byte extent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    /// Counted in characters
    pub column: usize,
    pub offset: usize,
    pub length: usize,
}

impl SourceLocation {
    pub const fn new(line: usize, column: usize, offset: usize, length: usize) -> Self {
        Self {
            line,
            column,
            offset,
            length,
        }
    }

    /// Locate `span` within `source`
    pub fn from_span(span: Span, source: &str) -> Self {
        let before = source.get(..span.start).unwrap_or(source);
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Self {
            line: before.matches('\n').count() + 1,
            column: before[line_start..].chars().count() + 1,
            offset: span.start,
            length: span.end.saturating_sub(span.start),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_on_later_line() {
        let source = "LAST {CD4 COUNT}\nAND {WEIGHT}";
        let loc = SourceLocation::from_span(Span::new(21, 29), source);
        assert_eq!((loc.line, loc.column), (2, 5));
        assert_eq!(loc.length, 8);
        assert_eq!(loc.to_string(), "2:5");
    }

    #[test]
    fn test_location_counts_characters() {
        let source = "{GRÖSSE} > x";
        let loc = SourceLocation::from_span(Span::new(12, 13), source);
        assert_eq!((loc.line, loc.column), (1, 12));
    }

    #[test]
    fn test_location_at_start() {
        let loc = SourceLocation::from_span(Span::new(0, 0), "{A}");
        assert_eq!(loc, SourceLocation::new(1, 1, 0, 0));
    }
}
