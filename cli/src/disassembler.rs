use std::collections::BTreeSet;
use std::fmt::Write;

use trellis_core::Program;
use trellis_core::codegen::{FunctionCode, Op};

/// Render a program as text, one function after another. Branch targets
/// are shown as `L<index>` labels placed before the op they point at.
pub fn disassemble(program: &Program) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Module: {}", program.module);
    let _ = writeln!(out, "Functions: {}\n", program.functions.len());
    for function in &program.functions {
        disassemble_function(&mut out, function);
        out.push('\n');
    }
    out
}

fn disassemble_function(out: &mut String, function: &FunctionCode) {
    let _ = writeln!(
        out,
        "function {} (arity {}, captures {}, frame {})",
        function.name, function.arity, function.captures, function.locals
    );

    // first pass: every op index some branch lands on
    let labels: BTreeSet<usize> = function.code.iter().filter_map(Op::branch_target).collect();

    for (i, op) in function.code.iter().enumerate() {
        if labels.contains(&i) {
            let _ = writeln!(out, "L{}:", i);
        }
        let rendered = match op {
            Op::Jump { target } => format!("Jump L{}", target),
            Op::BrTrue { target } => format!("BrTrue L{}", target),
            Op::BrFalse { target } => format!("BrFalse L{}", target),
            other => other.to_string(),
        };
        let _ = writeln!(out, "{:04}  {}", i, rendered);
    }
    // a branch to the end of the code has no op to sit in front of
    if labels.contains(&function.code.len()) {
        let _ = writeln!(out, "L{}:", function.code.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::ir::Value;

    #[test]
    fn labels_precede_branch_targets() {
        let program = Program {
            module: "demo".to_string(),
            functions: vec![FunctionCode {
                name: "main".to_string(),
                arity: 0,
                captures: 0,
                locals: 0,
                code: vec![
                    Op::Const { value: Value::Bool(true) },
                    Op::BrFalse { target: 3 },
                    Op::Jump { target: 0 },
                    Op::Ret,
                ],
            }],
        };
        let text = disassemble(&program);
        assert!(text.contains("L0:\n0000"), "{}", text);
        assert!(text.contains("0001  BrFalse L3"), "{}", text);
        assert!(text.contains("L3:\n0003"), "{}", text);
    }
}
