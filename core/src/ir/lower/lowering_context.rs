//! file: core/src/ir/lower/lowering_context.rs
//! description: naming state shared while lowering one compilation unit.
//!
//! Closures are lifted into named `Function` elements. The name is derived
//! from the enclosing top-level or closure function and a per-function
//! counter, so `main`'s second closure is `main$closure$1` and a closure
//! nested in it is `main$closure$1$closure$0`.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct LoweringContext {
    /// Functions being lowered, innermost last.
    functions: Vec<String>,
    closure_counters: HashMap<String, usize>,
}

impl LoweringContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_function(&mut self, name: &str) {
        self.functions.push(name.to_string());
    }

    pub fn exit_function(&mut self) {
        self.functions.pop();
    }

    pub fn current_function(&self) -> Option<&str> {
        self.functions.last().map(|s| s.as_str())
    }

    /// Fresh name for a closure declared in the current function.
    pub fn next_closure_name(&mut self) -> String {
        let outer = self.current_function().unwrap_or("<module>").to_string();
        let counter = self.closure_counters.entry(outer.clone()).or_insert(0);
        let name = format!("{}$closure${}", outer, counter);
        *counter += 1;
        name
    }
}
