//! file: core/src/config.rs
//! description: compile options loaded from JSON.
//!
//! `CompileOptions` selects which passes run. Every field defaults to `true`,
//! so an empty `{}` file (or no file at all) runs the whole pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Level, TrellisErrorExt};
use crate::location::{Location, Span};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Rewrite `x = match` / `return match` into case statements.
    #[serde(default = "default_true")]
    pub expand_matches: bool,
    /// Rewrite case statements into nested conditionals.
    #[serde(default = "default_true")]
    pub expand_cases: bool,
    #[serde(default = "default_true")]
    pub capture_closures: bool,
    #[serde(default = "default_true")]
    pub resolve_locals: bool,
    #[serde(default = "default_true")]
    pub emit_bytecode: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            expand_matches: true,
            expand_cases: true,
            capture_closures: true,
            resolve_locals: true,
            emit_bytecode: true,
        }
    }
}

impl CompileOptions {
    /// Load options from a JSON file path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<CompileOptions, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::new(path, format!("read config: {}", e)))?;
        let options: CompileOptions =
            serde_json::from_str(&raw).map_err(|e| ConfigError::new(path, format!("parse config: {}", e)))?;
        options.validate().map_err(|e| ConfigError::new(path, e))?;
        Ok(options)
    }

    /// Reject combinations whose later stages depend on a disabled one.
    pub fn validate(&self) -> Result<(), String> {
        if self.resolve_locals && !self.capture_closures {
            return Err("resolve_locals requires capture_closures".to_string());
        }
        if self.emit_bytecode && !self.resolve_locals {
            return Err("emit_bytecode requires resolve_locals".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigError {
    file: String,
    message: String,
}

impl ConfigError {
    pub fn new(path: &Path, message: String) -> Self {
        ConfigError {
            file: path.display().to_string(),
            message,
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl TrellisErrorExt for ConfigError {
    fn level(&self) -> Level {
        Level::Error
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn issuer(&self) -> String {
        "trellis.config".to_string()
    }

    fn span(&self) -> Option<Span> {
        None
    }

    fn location(&self) -> Option<Location> {
        Some(Location::new(&self.file, 1, 1))
    }
}
