use std::collections::HashSet;
use std::io::{self, Write};
use std::path::Path;

use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use console::Style;
use trellis_core::ir::{ElementId, IrTree};
use trellis_core::location::{Location, Span};
use trellis_core::{Level, TrellisErrorExt};

/// Styles for the different report lines.
pub struct FormatStyle {
    pub info: Style,
    pub warning: Style,
    pub error: Style,
    pub success: Style,
    pub dim: Style,
}

impl Default for FormatStyle {
    fn default() -> Self {
        FormatStyle {
            info: Style::new().cyan(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            success: Style::new().green().bold(),
            dim: Style::new().dim(),
        }
    }
}

/// Writes diagnostics and status lines into any `Write`.
pub struct Reporter<T: Write> {
    out: T,
    formatting: FormatStyle,
}

impl<T: Write> Reporter<T> {
    pub fn new(out: T) -> Self {
        Reporter {
            out,
            formatting: FormatStyle::default(),
        }
    }

    fn level_style(&self, level: Level) -> &Style {
        match level {
            Level::Info => &self.formatting.info,
            Level::Warning => &self.formatting.warning,
            Level::Error | Level::Critical => &self.formatting.error,
        }
    }

    /// `LEVEL file:line:col: message`, with the issuer dimmed underneath.
    pub fn diagnostic(&mut self, diagnostic: &dyn TrellisErrorExt) -> io::Result<()> {
        let level = diagnostic.level();
        let location = diagnostic
            .location()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "unknown location".to_string());
        let label = self.level_style(level).apply_to(level.to_string());
        writeln!(self.out, "{} {}: {}", label, location, diagnostic.message())?;
        writeln!(
            self.out,
            "  {}",
            self.formatting.dim.apply_to(format!("raised by {}", diagnostic.issuer()))
        )
    }

    pub fn success(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", self.formatting.success.apply_to(text))
    }
}

/// One row per arena element: handle, kind, parent, source position and
/// whether the element is still reachable from the root.
pub fn ir_table(tree: &IrTree) -> Table {
    let reachable: HashSet<ElementId> = tree.reachable_from_root().into_iter().collect();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["id", "kind", "parent", "location", "reachable"]);

    for id in tree.ids() {
        let Some(element) = tree.element(id) else {
            continue;
        };
        let parent = element.parent().map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
        let location = element
            .location()
            .map(|l| format!("{}:{}", l.line, l.column))
            .unwrap_or_else(|| "synthetic".to_string());
        let live = reachable.contains(&id);
        let live_cell = if live {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(id.to_string()),
            Cell::new(element.kind().name()),
            Cell::new(parent),
            Cell::new(location),
            live_cell,
        ]);
    }
    table
}

/// Failure in the CLI itself (writing output files).
#[derive(Debug, Clone)]
pub struct CliError {
    message: String,
    file: String,
}

impl CliError {
    pub fn boxed(path: &Path, message: String) -> Box<dyn TrellisErrorExt> {
        Box::new(CliError {
            message,
            file: path.display().to_string(),
        })
    }
}

impl TrellisErrorExt for CliError {
    fn level(&self) -> Level {
        Level::Error
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn issuer(&self) -> String {
        "trellis.cli".to_string()
    }

    fn span(&self) -> Option<Span> {
        None
    }

    fn location(&self) -> Option<Location> {
        Some(Location::new(&self.file, 1, 1))
    }
}
