use crate::error::{Level, TrellisErrorExt};
use crate::location::{Location, Span};

#[derive(Debug, Clone)]
pub struct EmptySourceError {
    level: Level,
    message: String,
    issuer: String,
    location: Option<Location>,
}

impl EmptySourceError {
    pub fn new(issuer: String, location: Option<Location>) -> Self {
        EmptySourceError {
            level: Level::Error,
            message: "The provided source file is empty.".to_string(),
            issuer,
            location,
        }
    }
}

impl std::fmt::Display for EmptySourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{} (at {})", self.message, loc)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for EmptySourceError {}

impl TrellisErrorExt for EmptySourceError {
    fn level(&self) -> Level {
        self.level
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn issuer(&self) -> String {
        self.issuer.clone()
    }

    fn span(&self) -> Option<Span> {
        None
    }

    fn location(&self) -> Option<Location> {
        self.location.clone()
    }
}

#[derive(Debug, Clone)]
pub struct SyntaxError {
    level: Level,
    message: String,
    issuer: String,
    location: Option<Location>,
    span: Option<Span>,
}

impl SyntaxError {
    pub fn with(
        level: Level,
        message: String,
        issuer: String,
        location: Option<Location>,
        span: Option<Span>,
    ) -> Self {
        SyntaxError {
            level,
            message,
            issuer,
            location,
            span,
        }
    }

    /// Wrap a pest parse failure, keeping the line/column it reports.
    pub fn from_pest(file: &str, error: pest::error::Error<super::Rule>) -> Self {
        let location = match error.line_col {
            pest::error::LineColLocation::Pos((line, column))
            | pest::error::LineColLocation::Span((line, column), _) => {
                Some(Location::new(file, line, column))
            }
        };
        SyntaxError {
            level: Level::Error,
            message: error.variant.message().to_string(),
            issuer: "trellis.syntax.parse_source".to_string(),
            location,
            span: None,
        }
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{} (at {})", self.message, loc)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for SyntaxError {}

impl TrellisErrorExt for SyntaxError {
    fn level(&self) -> Level {
        self.level
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn issuer(&self) -> String {
        self.issuer.clone()
    }

    fn span(&self) -> Option<Span> {
        self.span.clone()
    }

    fn location(&self) -> Option<Location> {
        self.location.clone()
    }
}
