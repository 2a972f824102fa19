use super::op::Op;
use super::program::FunctionCode;

/// Forward-referenceable position in a function's op list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

/// Per-function emission buffer. Branches to labels not yet marked are
/// emitted with a placeholder target and patched in `finish`.
#[derive(Debug)]
pub struct FunctionBuilder {
    name: String,
    arity: usize,
    captures: usize,
    frame_size: usize,
    code: Vec<Op>,
    labels: Vec<Option<usize>>,
    fixups: Vec<(usize, Label)>,
}

impl FunctionBuilder {
    pub fn new(name: &str, arity: usize, captures: usize) -> Self {
        FunctionBuilder {
            name: name.to_string(),
            arity,
            captures,
            frame_size: arity + captures,
            code: Vec::new(),
            labels: Vec::new(),
            fixups: Vec::new(),
        }
    }

    pub fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Bind `label` to the next op to be emitted.
    pub fn mark(&mut self, label: Label) {
        if let Some(slot) = self.labels.get_mut(label.0) {
            *slot = Some(self.code.len());
        }
    }

    pub fn emit(&mut self, op: Op) {
        if let Op::Load { slot } | Op::Store { slot } | Op::CallClosure { slot, .. } = &op {
            self.frame_size = self.frame_size.max(*slot as usize + 1);
        }
        self.code.push(op);
    }

    pub fn jump(&mut self, label: Label) {
        self.emit_branch(Op::Jump { target: usize::MAX }, label);
    }

    pub fn br_false(&mut self, label: Label) {
        self.emit_branch(Op::BrFalse { target: usize::MAX }, label);
    }

    pub fn br_true(&mut self, label: Label) {
        self.emit_branch(Op::BrTrue { target: usize::MAX }, label);
    }

    fn emit_branch(&mut self, op: Op, label: Label) {
        self.fixups.push((self.code.len(), label));
        self.code.push(op);
    }

    /// Patch every branch and hand back the finished code. Fails with the
    /// index of the first branch whose label was never marked.
    pub fn finish(mut self) -> Result<FunctionCode, usize> {
        for (index, label) in &self.fixups {
            let target = self.labels.get(label.0).copied().flatten().ok_or(*index)?;
            match &mut self.code[*index] {
                Op::Jump { target: t } | Op::BrTrue { target: t } | Op::BrFalse { target: t } => *t = target,
                _ => return Err(*index),
            }
        }
        Ok(FunctionCode {
            name: self.name,
            arity: self.arity,
            captures: self.captures,
            locals: self.frame_size,
            code: self.code,
        })
    }
}
