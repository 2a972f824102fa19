use crate::error::{Level, TrellisErrorExt};
use crate::location::{Location, Origin, Span};

/// A user-facing problem found by a pass. Passes collect these and keep
/// going; the pipeline decides what to do with them afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    level: Level,
    message: String,
    issuer: String,
    location: Option<Location>,
    span: Option<Span>,
}

impl Diagnostic {
    pub fn with(
        level: Level,
        message: String,
        issuer: String,
        location: Option<Location>,
        span: Option<Span>,
    ) -> Self {
        Diagnostic {
            level,
            message,
            issuer,
            location,
            span,
        }
    }

    pub fn error(message: String, issuer: &str, origin: &Origin) -> Self {
        Self::with(
            Level::Error,
            message,
            issuer.to_string(),
            origin.location.clone(),
            origin.span.clone(),
        )
    }

    pub fn warning(message: String, issuer: &str, origin: &Origin) -> Self {
        Self::with(
            Level::Warning,
            message,
            issuer.to_string(),
            origin.location.clone(),
            origin.span.clone(),
        )
    }

    pub fn is_error(&self) -> bool {
        self.level >= Level::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{} at {}", self.message, loc)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for Diagnostic {}

impl TrellisErrorExt for Diagnostic {
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
