//! file: core/src/location.rs
//! description: source positions attached to syntax nodes and IR elements.

#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct Location {
    /// The file in which the location is found.
    pub file: String,
    /// The 1-based line number.
    pub line: usize,
    /// The 1-based column number.
    pub column: usize,
}

impl Location {
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Build a location from a pest position inside `file`.
    pub fn from_position(file: &str, position: pest::Position<'_>) -> Self {
        let (line, column) = position.line_col();
        Self::new(file, line, column)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct Span {
    /// The starting location of the span.
    pub start: Location,
    /// The ending location of the span.
    pub end: Location,
}

impl Span {
    pub fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }

    pub fn from_pest(file: &str, span: pest::Span<'_>) -> Self {
        Self {
            start: Location::from_position(file, span.start_pos()),
            end: Location::from_position(file, span.end_pos()),
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// Position metadata carried from a syntax node onto the IR elements built
/// from it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct Origin {
    pub location: Option<Location>,
    pub span: Option<Span>,
}

impl Origin {
    pub fn new(location: Option<Location>, span: Option<Span>) -> Self {
        Self { location, span }
    }

    /// Origin for elements synthesized by a pass with no source counterpart.
    pub fn synthetic() -> Self {
        Self::default()
    }
}
