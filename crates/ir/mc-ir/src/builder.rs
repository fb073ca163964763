//! Incremental function construction
//!
//! The builder keeps an insertion point. Instructions are appended to the
//! current block until a terminator closes it; after that every append fails
//! with [`BuildError::MisplacedTerminator`] until the builder is repositioned.

use crate::{
    ArithOp, BasicBlock, BlockId, BuildError, Function, IcmpPred, InstId, InstKind, Instruction,
    Terminator, Type, Value,
};
use la_arena::Arena;

/// Builder for a single [`Function`]
#[derive(Debug)]
pub struct FunctionBuilder {
    function: Function,
    current: BlockId,
}

impl FunctionBuilder {
    /// Start a function with an empty `entry` block as insertion point
    #[must_use]
    pub fn new(name: impl Into<String>, ret_ty: Type) -> Self {
        let mut blocks = Arena::new();
        let entry = blocks.alloc(BasicBlock {
            label: "entry".to_owned(),
            insts: Vec::new(),
            terminator: None,
        });
        Self {
            function: Function {
                name: name.into(),
                ret_ty,
                blocks,
                insts: Arena::new(),
                entry,
                layout: vec![entry],
            },
            current: entry,
        }
    }

    /// Create a detached block labelled `{hint}.{n}`
    pub fn new_block(&mut self, hint: &str) -> BlockId {
        let label = format!("{hint}.{}", self.function.blocks.len());
        self.function.blocks.alloc(BasicBlock {
            label,
            insts: Vec::new(),
            terminator: None,
        })
    }

    /// Move the insertion point to the end of `block`
    ///
    /// The first time a block is positioned it is appended to the layout.
    pub fn position_at_end(&mut self, block: BlockId) {
        if !self.function.layout.contains(&block) {
            self.function.layout.push(block);
        }
        self.current = block;
    }

    /// The `entry` block
    pub fn entry_block(&self) -> BlockId {
        self.function.entry
    }

    /// Block receiving new instructions
    pub fn current_block(&self) -> BlockId {
        self.current
    }

    /// Whether the current block already has its terminator
    pub fn is_terminated(&self) -> bool {
        self.function.blocks[self.current].terminator.is_some()
    }

    /// Type of `value`
    pub fn value_type(&self, value: Value) -> Type {
        self.function.value_type(value)
    }

    /// Function built so far
    pub fn function(&self) -> &Function {
        &self.function
    }

    /// Label of `block`
    pub fn label(&self, block: BlockId) -> &str {
        &self.function.blocks[block].label
    }

    /// `add`/`sub`/`mul`/`sdiv` on two `i32`s
    ///
    /// # Errors
    ///
    /// Fails on a terminated block or a non-`i32` operand.
    pub fn build_binary(&mut self, op: ArithOp, lhs: Value, rhs: Value) -> Result<Value, BuildError> {
        self.expect_type(lhs, Type::Int)?;
        self.expect_type(rhs, Type::Int)?;
        self.append(InstKind::Binary { op, lhs, rhs }, Type::Int)
    }

    /// `icmp` on two `i32`s, producing an `i1`
    ///
    /// # Errors
    ///
    /// Fails on a terminated block or a non-`i32` operand.
    pub fn build_icmp(&mut self, pred: IcmpPred, lhs: Value, rhs: Value) -> Result<Value, BuildError> {
        self.expect_type(lhs, Type::Int)?;
        self.expect_type(rhs, Type::Int)?;
        self.append(InstKind::Icmp { pred, lhs, rhs }, Type::Bool)
    }

    /// Widen an `i1` to `i32`
    ///
    /// # Errors
    ///
    /// Fails on a terminated block or a non-`i1` operand.
    pub fn build_zext(&mut self, value: Value) -> Result<Value, BuildError> {
        self.expect_type(value, Type::Bool)?;
        self.append(InstKind::Zext { value }, Type::Int)
    }

    /// Call `callee` with `i32` arguments, producing an `i32`
    ///
    /// # Errors
    ///
    /// Fails on a terminated block or a non-`i32` argument.
    pub fn build_call(&mut self, callee: &str, args: Vec<Value>) -> Result<Value, BuildError> {
        for &arg in &args {
            self.expect_type(arg, Type::Int)?;
        }
        self.append(
            InstKind::Call {
                callee: callee.to_owned(),
                args,
            },
            Type::Int,
        )
    }

    /// Empty phi of type `ty`, placed after any phis already in the block
    ///
    /// # Errors
    ///
    /// Fails on a terminated block.
    pub fn build_phi(&mut self, ty: Type) -> Result<InstId, BuildError> {
        self.ensure_open()?;
        let id = self.function.insts.alloc(Instruction {
            kind: InstKind::Phi {
                incoming: Vec::new(),
            },
            ty,
        });
        let insts = &self.function.insts;
        let block = &mut self.function.blocks[self.current];
        let slot = block
            .insts
            .iter()
            .take_while(|&&existing| matches!(insts[existing].kind, InstKind::Phi { .. }))
            .count();
        block.insts.insert(slot, id);
        Ok(id)
    }

    /// Add an incoming `(value, pred)` edge to `phi`
    ///
    /// # Errors
    ///
    /// Fails when `phi` is not a phi or `value` has a different type.
    pub fn add_incoming(&mut self, phi: InstId, value: Value, pred: BlockId) -> Result<(), BuildError> {
        let found = self.value_type(value);
        let inst = &mut self.function.insts[phi];
        let InstKind::Phi { incoming } = &mut inst.kind else {
            return Err(BuildError::NotAPhi {
                inst: u32::from(phi.into_raw()),
            });
        };
        if found != inst.ty {
            return Err(BuildError::TypeMismatch {
                expected: inst.ty,
                found,
            });
        }
        incoming.push((value, pred));
        Ok(())
    }

    /// Return `value`
    ///
    /// # Errors
    ///
    /// Fails on a terminated block or when `value` does not match the
    /// function's return type.
    pub fn build_ret(&mut self, value: Value) -> Result<(), BuildError> {
        self.expect_type(value, self.function.ret_ty)?;
        self.terminate(Terminator::Ret { value })
    }

    /// Jump to `target`
    ///
    /// # Errors
    ///
    /// Fails on a terminated block.
    pub fn build_br(&mut self, target: BlockId) -> Result<(), BuildError> {
        self.terminate(Terminator::Br { target })
    }

    /// Branch on an `i1`
    ///
    /// # Errors
    ///
    /// Fails on a terminated block or a non-`i1` condition.
    pub fn build_cond_br(
        &mut self,
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    ) -> Result<(), BuildError> {
        self.expect_type(cond, Type::Bool)?;
        self.terminate(Terminator::CondBr {
            cond,
            then_block,
            else_block,
        })
    }

    /// Finish building
    ///
    /// # Errors
    ///
    /// Returns `BuildError::UnterminatedBlock` for the first block, in
    /// creation order, that has no terminator.
    pub fn finish(self) -> Result<Function, BuildError> {
        if let Some((_, open)) = self
            .function
            .blocks
            .iter()
            .find(|(_, block)| block.terminator.is_none())
        {
            return Err(BuildError::UnterminatedBlock {
                block: open.label.clone(),
            });
        }
        Ok(self.function)
    }

    fn ensure_open(&self) -> Result<(), BuildError> {
        if self.is_terminated() {
            return Err(BuildError::MisplacedTerminator {
                block: self.label(self.current).to_owned(),
            });
        }
        Ok(())
    }

    fn expect_type(&self, value: Value, expected: Type) -> Result<(), BuildError> {
        let found = self.value_type(value);
        if found == expected {
            Ok(())
        } else {
            Err(BuildError::TypeMismatch { expected, found })
        }
    }

    fn append(&mut self, kind: InstKind, ty: Type) -> Result<Value, BuildError> {
        self.ensure_open()?;
        let id = self.function.insts.alloc(Instruction { kind, ty });
        self.function.blocks[self.current].insts.push(id);
        Ok(Value::Inst(id))
    }

    fn terminate(&mut self, terminator: Terminator) -> Result<(), BuildError> {
        self.ensure_open()?;
        self.function.blocks[self.current].terminator = Some(terminator);
        Ok(())
    }
}
