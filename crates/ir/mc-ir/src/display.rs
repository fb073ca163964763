//! LLVM-style textual form
//!
//! ```text
//! declare i32 @print(i32)
//!
//! define i32 @main() {
//! entry:
//!   %0 = add i32 2, 3
//!   ret i32 %0
//! }
//! ```

use crate::{Function, InstKind, Instruction, Module, Terminator, Type, Value};
use std::fmt;

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(value) => write!(formatter, "{value}"),
            Self::Inst(id) => write!(formatter, "%{}", u32::from(id.into_raw())),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, &arity) in &self.externs {
            let params = vec![Type::Int.to_string(); arity].join(", ");
            writeln!(formatter, "declare i32 @{name}({params})")?;
        }
        let mut separate = !self.externs.is_empty();
        for func in &self.functions {
            if separate {
                writeln!(formatter)?;
            }
            write!(formatter, "{func}")?;
            separate = true;
        }
        Ok(())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(formatter, "define {} @{}() {{", self.ret_ty, self.name)?;
        for (idx, (_, block)) in self.blocks_in_order().enumerate() {
            if idx > 0 {
                writeln!(formatter)?;
            }
            writeln!(formatter, "{}:", block.label)?;
            for (id, inst) in self.block_insts(block) {
                write!(formatter, "  {} = ", Value::Inst(id))?;
                write_inst(formatter, self, inst)?;
                writeln!(formatter)?;
            }
            if let Some(terminator) = &block.terminator {
                write!(formatter, "  ")?;
                write_terminator(formatter, self, terminator)?;
                writeln!(formatter)?;
            }
        }
        writeln!(formatter, "}}")
    }
}

fn write_inst(
    formatter: &mut fmt::Formatter<'_>,
    func: &Function,
    inst: &Instruction,
) -> fmt::Result {
    match &inst.kind {
        InstKind::Binary { op, lhs, rhs } => {
            write!(formatter, "{op} {} {lhs}, {rhs}", inst.ty)
        }
        InstKind::Icmp { pred, lhs, rhs } => {
            write!(formatter, "icmp {pred} {} {lhs}, {rhs}", Type::Int)
        }
        InstKind::Zext { value } => {
            write!(formatter, "zext {} {value} to {}", Type::Bool, inst.ty)
        }
        InstKind::Call { callee, args } => {
            let args = args
                .iter()
                .map(|arg| format!("{} {arg}", func.value_type(*arg)))
                .collect::<Vec<_>>()
                .join(", ");
            write!(formatter, "call {} @{callee}({args})", inst.ty)
        }
        InstKind::Phi { incoming } => {
            let edges = incoming
                .iter()
                .map(|(value, pred)| format!("[ {value}, %{} ]", func.blocks[*pred].label))
                .collect::<Vec<_>>()
                .join(", ");
            write!(formatter, "phi {} {edges}", inst.ty)
        }
    }
}

fn write_terminator(
    formatter: &mut fmt::Formatter<'_>,
    func: &Function,
    terminator: &Terminator,
) -> fmt::Result {
    match *terminator {
        Terminator::Ret { value } => {
            write!(formatter, "ret {} {value}", func.value_type(value))
        }
        Terminator::Br { target } => {
            write!(formatter, "br label %{}", func.blocks[target].label)
        }
        Terminator::CondBr {
            cond,
            then_block,
            else_block,
        } => write!(
            formatter,
            "br {} {cond}, label %{}, label %{}",
            func.value_type(cond),
            func.blocks[then_block].label,
            func.blocks[else_block].label
        ),
    }
}
