use std::path::PathBuf;

use crate::TrellisErrorExt;

/// A source file handed to the parser.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub path: PathBuf,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: PathBuf) -> Result<Self, Box<dyn TrellisErrorExt>> {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Box::new(MissingSourceError {
                path: path.clone(),
                reason: e.to_string(),
            }) as Box<dyn TrellisErrorExt>
        })?;
        Ok(SourceFile {
            name,
            path,
            content,
        })
    }

    /// In-memory source, used by tests and tooling that never touch disk.
    pub fn from_string(name: &str, content: &str) -> Self {
        SourceFile {
            name: name.to_string(),
            path: PathBuf::from(name),
            content: content.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

impl std::fmt::Display for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Source: {} at {:?}", self.name, self.path)
    }
}

#[derive(Debug, Clone)]
pub struct MissingSourceError {
    pub path: PathBuf,
    pub reason: String,
}

impl std::fmt::Display for MissingSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Missing source at {:?}: {}", self.path, self.reason)
    }
}

impl std::error::Error for MissingSourceError {}

impl TrellisErrorExt for MissingSourceError {
    fn level(&self) -> crate::Level {
        crate::Level::Error
    }

    fn message(&self) -> String {
        self.to_string()
    }

    fn issuer(&self) -> String {
        "trellis.source".to_string()
    }

    fn span(&self) -> Option<crate::location::Span> {
        None
    }

    fn location(&self) -> Option<crate::location::Location> {
        None
    }
}
