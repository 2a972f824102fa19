pub mod codegen;
pub mod config;
pub mod error;
pub mod ir;
pub mod location;
pub mod passes;
pub mod source;
pub mod syntax;

pub use codegen::{BytecodeGenerator, Program};
pub use config::CompileOptions;
pub use error::{Level, TrellisErrorExt};
pub use ir::{IrTree, build_ir};
pub use location::{Location, Span};
pub use passes::{Diagnostic, run_passes};
pub use source::SourceFile;
pub use syntax::{CompilationUnit, parse_source};

pub fn generate_error_report<E: TrellisErrorExt + ?Sized>(error: &E) -> String {
    let level = error.level();
    let location = match error.location() {
        Some(loc) => loc.to_string(),
        None => "unknown location".to_string(),
    };
    let message = error.message();

    format!("TRELLIS | {} | {} | {}", level, location, message)
}

/// Result of running the pipeline over one source file.
#[derive(Debug)]
pub struct Compilation {
    pub tree: IrTree,
    pub diagnostics: Vec<Diagnostic>,
    /// Present when bytecode was requested and no pass reported an error.
    pub program: Option<Program>,
}

impl Compilation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }
}

/// Parse, build the IR, run the enabled passes and generate bytecode.
///
/// Syntax, build and contract errors abort and are returned as `Err`; pass
/// diagnostics are collected in the returned `Compilation`.
pub fn compile_source(
    source: &SourceFile,
    options: &CompileOptions,
) -> Result<Compilation, Box<dyn TrellisErrorExt>> {
    options.validate().map_err(|e| {
        Box::new(config::ConfigError::new(std::path::Path::new("<options>"), e)) as Box<dyn TrellisErrorExt>
    })?;

    let unit = syntax::parse_source(source)?;
    let mut tree = ir::build_ir(&unit).map_err(|e| Box::new(e) as Box<dyn TrellisErrorExt>)?;
    drop(unit);

    let diagnostics = passes::run_passes(&mut tree, options).map_err(|e| Box::new(e) as Box<dyn TrellisErrorExt>)?;
    tree.validate().map_err(|e| Box::new(e) as Box<dyn TrellisErrorExt>)?;

    let mut compilation = Compilation {
        tree,
        diagnostics,
        program: None,
    };
    if options.emit_bytecode && !compilation.has_errors() {
        let program = codegen::generate(&compilation.tree).map_err(|e| Box::new(e) as Box<dyn TrellisErrorExt>)?;
        compilation.program = Some(program);
    }
    log::debug!(
        "compiled {} with {} diagnostic(s)",
        source.name,
        compilation.diagnostics.len()
    );
    Ok(compilation)
}
