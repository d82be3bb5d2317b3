//! Source locations attached to every AST node

use std::fmt;

/// Identifier of a source file known to the front-end
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// A line/column position (both 1-based; 0 means "unknown")
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

/// A source range: file plus start/end positions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub file: FileId,
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub const fn new(file: FileId, start: Position, end: Position) -> Self {
        Span { file, start, end }
    }

    /// Span for nodes that have no source counterpart (tests, synthesized nodes)
    pub const fn dummy() -> Self {
        Span {
            file: FileId(0),
            start: Position::new(0, 0),
            end: Position::new(0, 0),
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.start.line == 0 && self.end.line == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dummy() {
            return write!(f, "<unknown>");
        }
        write!(
            f,
            "file#{}:{}:{}-{}:{}",
            self.file.0, self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_display() {
        let span = Span::new(FileId(2), Position::new(3, 5), Position::new(3, 9));
        assert_eq!(span.to_string(), "file#2:3:5-3:9");
        assert_eq!(Span::dummy().to_string(), "<unknown>");
    }
}
