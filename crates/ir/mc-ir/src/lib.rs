//! SSA intermediate representation
//!
//! A [`Module`] holds functions made of basic blocks. Each block is a list of
//! instructions followed by exactly one [`Terminator`]. Instructions and
//! blocks live in per-function arenas and are referred to by index.
//!
//! Functions are only constructed through [`FunctionBuilder`], which rejects
//! ill-typed operands and instructions placed after a terminator.

pub mod builder;
pub mod display;
pub mod error;

pub use builder::FunctionBuilder;
pub use error::BuildError;

use derive_more::Display;
use indexmap::IndexMap;
use la_arena::{Arena, Idx};
use rustc_hash::FxBuildHasher;

/// Instruction index within a [`Function`]
pub type InstId = Idx<Instruction>;

/// Block index within a [`Function`]
pub type BlockId = Idx<BasicBlock>;

/// First-class value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Type {
    /// 32-bit signed integer
    #[display("i32")]
    Int,
    /// Comparison result
    #[display("i1")]
    Bool,
}

/// An SSA value: a constant or the result of an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// `i32` constant
    Const(i32),
    /// Result of an instruction
    Inst(InstId),
}

/// Integer arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ArithOp {
    /// Wrapping addition
    #[display("add")]
    Add,
    /// Wrapping subtraction
    #[display("sub")]
    Sub,
    /// Wrapping multiplication
    #[display("mul")]
    Mul,
    /// Signed division
    #[display("sdiv")]
    SDiv,
}

/// Integer comparison predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum IcmpPred {
    /// Equal
    #[display("eq")]
    Eq,
    /// Not equal
    #[display("ne")]
    Ne,
    /// Signed less than
    #[display("slt")]
    Slt,
    /// Signed greater than
    #[display("sgt")]
    Sgt,
    /// Signed less or equal
    #[display("sle")]
    Sle,
    /// Signed greater or equal
    #[display("sge")]
    Sge,
}

/// Instruction payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstKind {
    /// Arithmetic on two `i32`s
    Binary {
        /// Operator
        op: ArithOp,
        /// Left operand
        lhs: Value,
        /// Right operand
        rhs: Value,
    },
    /// Comparison of two `i32`s, producing `i1`
    Icmp {
        /// Predicate
        pred: IcmpPred,
        /// Left operand
        lhs: Value,
        /// Right operand
        rhs: Value,
    },
    /// Zero-extend an `i1` to `i32`
    Zext {
        /// Widened value
        value: Value,
    },
    /// Call to a module-level function
    Call {
        /// Function name
        callee: String,
        /// Arguments in order
        args: Vec<Value>,
    },
    /// Merge of values by predecessor block
    Phi {
        /// `(value, predecessor)` pairs
        incoming: Vec<(Value, BlockId)>,
    },
}

/// A typed instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Payload
    pub kind: InstKind,
    /// Result type
    pub ty: Type,
}

/// Block exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// Return from the function
    Ret {
        /// Returned value
        value: Value,
    },
    /// Unconditional jump
    Br {
        /// Successor
        target: BlockId,
    },
    /// Two-way branch on an `i1`
    CondBr {
        /// Condition
        cond: Value,
        /// Successor when true
        then_block: BlockId,
        /// Successor when false
        else_block: BlockId,
    },
}

impl Terminator {
    /// Successor blocks, in branch order
    pub fn successors(&self) -> Vec<BlockId> {
        match *self {
            Self::Ret { .. } => Vec::new(),
            Self::Br { target } => vec![target],
            Self::CondBr {
                then_block,
                else_block,
                ..
            } => vec![then_block, else_block],
        }
    }
}

/// Straight-line instruction sequence with a single exit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    /// Unique label within the function
    pub label: String,
    /// Instructions in execution order, phis first
    pub insts: Vec<InstId>,
    /// Exit; always present once the function is finished
    pub terminator: Option<Terminator>,
}

/// A function in SSA form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    /// Symbol name
    pub name: String,
    /// Return type
    pub ret_ty: Type,
    /// Block storage
    pub blocks: Arena<BasicBlock>,
    /// Instruction storage
    pub insts: Arena<Instruction>,
    /// Entry block
    pub entry: BlockId,
    /// Emission order; the entry block comes first
    pub layout: Vec<BlockId>,
}

impl Function {
    /// Type of `value`
    pub fn value_type(&self, value: Value) -> Type {
        match value {
            Value::Const(_) => Type::Int,
            Value::Inst(id) => self.insts[id].ty,
        }
    }

    /// Blocks in emission order
    pub fn blocks_in_order(&self) -> impl Iterator<Item = (BlockId, &BasicBlock)> {
        self.layout.iter().map(|&id| (id, &self.blocks[id]))
    }

    /// Block with the given label
    pub fn block_by_label(&self, label: &str) -> Option<&BasicBlock> {
        self.blocks
            .iter()
            .find(|(_, block)| block.label == label)
            .map(|(_, block)| block)
    }

    /// Instructions of `block`, in order
    pub fn block_insts(&self, block: &BasicBlock) -> impl Iterator<Item = (InstId, &Instruction)> {
        block.insts.iter().map(|&id| (id, &self.insts[id]))
    }

    /// Number of phi instructions in the function
    pub fn phi_count(&self) -> usize {
        self.insts
            .iter()
            .filter(|(_, inst)| matches!(inst.kind, InstKind::Phi { .. }))
            .count()
    }
}

/// Compilation unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Module name, usually the source file name
    pub name: String,
    /// External functions referenced by the module, with their arity
    pub externs: IndexMap<String, usize, FxBuildHasher>,
    /// Defined functions
    pub functions: Vec<Function>,
}

impl Module {
    /// Create an empty module
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            externs: IndexMap::default(),
            functions: Vec::new(),
        }
    }

    /// Record an external function; the first arity recorded wins
    pub fn declare_extern(&mut self, name: &str, arity: usize) {
        if !self.externs.contains_key(name) {
            self.externs.insert(name.to_owned(), arity);
        }
    }

    /// Defined function by name
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|func| func.name == name)
    }
}
