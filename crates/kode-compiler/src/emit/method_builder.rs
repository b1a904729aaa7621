//! Method bodies: blocks, locals, labels and instructions.

use kode_core::{BuildError, JvmType};
use tracing::debug;

use super::class_builder::ClassBuilder;
use super::decl::MethodDecl;
use super::{Instruction, Label};
use crate::scope::ScopeId;
use crate::vars::{Variable, VariableTable};

const DEFAULT_LABEL_HINT: &str = "label";

/// Handle of a lexical block within one [`MethodBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(u32);

impl BlockId {
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// A block is one scope in the variable table and one in the class's name
/// allocator, opened and closed together.
#[derive(Debug, Clone)]
struct Block {
    vars: ScopeId,
    names: ScopeId,
    start: Label,
    end: Label,
}

/// Debug record of a named variable: where it lives and where it is visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariableRecord {
    pub name: String,
    pub ty: JvmType,
    pub start: Label,
    pub end: Label,
    pub slot: u32,
}

/// A finished method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledMethod {
    pub decl: MethodDecl,
    pub code: Vec<Instruction>,
    pub max_locals: u32,
    pub local_variables: Vec<LocalVariableRecord>,
}

/// Builds one method of a class.
///
/// The builder borrows its [`ClassBuilder`] until [`finish`](Self::finish).
/// A builder dropped without finishing leaves its name scope open, and the
/// class then refuses further names.
#[derive(Debug)]
pub struct MethodBuilder<'c> {
    class: &'c mut ClassBuilder,
    decl: MethodDecl,
    /// This method's node in the class name allocator.
    names: ScopeId,
    vars: VariableTable,
    blocks: Vec<Block>,
    body: Option<BlockId>,
    /// Whether each label has been placed, by label id.
    placed: Vec<bool>,
    code: Vec<Instruction>,
    /// Every declared variable with the block it was declared in.
    declared: Vec<(BlockId, Variable)>,
}

impl<'c> MethodBuilder<'c> {
    pub(super) fn new(class: &'c mut ClassBuilder, decl: MethodDecl) -> Result<Self, BuildError> {
        let root = class.names.root();
        let names = class.names.create_child(root, Some(decl.name.as_str()))?;
        let vars = VariableTable::new(Some(decl.name.as_str()));

        Ok(Self {
            class,
            decl,
            names,
            vars,
            blocks: Vec::new(),
            body: None,
            placed: Vec::new(),
            code: Vec::new(),
            declared: Vec::new(),
        })
    }

    pub fn decl(&self) -> &MethodDecl {
        &self.decl
    }

    /// The outermost block, once [`begin_code`](Self::begin_code) has run.
    pub fn body(&self) -> Option<BlockId> {
        self.body
    }

    pub fn code(&self) -> &[Instruction] {
        &self.code
    }

    /// Slots needed by the frame so far.
    pub fn max_locals(&self) -> u32 {
        self.vars.max_slots()
    }

    // ==========================================================================
    // Blocks
    // ==========================================================================

    /// Start the method body.
    ///
    /// Declares the receiver for instance methods and then every parameter,
    /// in order. Named parameters are reserved in the name allocator.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn begin_code(&mut self) -> Result<BlockId, BuildError> {
        if self.body.is_some() {
            return Err(BuildError::BodyAlreadyStarted {
                method: self.decl.name.clone(),
            });
        }

        let start = self.mint_label(self.names, Some("start"))?;
        let end = self.mint_label(self.names, Some("end"))?;
        let body = self.push_block(Block {
            vars: self.vars.root(),
            names: self.names,
            start: start.clone(),
            end,
        });
        self.body = Some(body);
        self.mark(start);

        let scope = self.vars.root();
        if self.decl.is_instance() {
            let this = JvmType::Class(self.class.decl().class.clone());
            let var = self.vars.add_receiver(scope, this)?;
            self.declared.push((body, var));
        }
        for param in &self.decl.params {
            let var = self
                .vars
                .add_argument(scope, param.ty.clone(), param.name.as_deref())?;
            if let Some(name) = &param.name {
                self.class.names.put(self.names, name)?;
            }
            self.declared.push((body, var));
        }

        debug!(method = %self.decl.name, slots = self.vars.next_offset(scope), "began method body");
        Ok(body)
    }

    /// Open a block nested in `parent`. Its start label is placed immediately.
    pub fn open_block(&mut self, parent: BlockId, label: Option<&str>) -> Result<BlockId, BuildError> {
        let outer = self.block(parent)?.clone();
        self.vars.check_usable(outer.vars)?;

        let start = self.mint_label(outer.names, Some("start"))?;
        let end = self.mint_label(outer.names, Some("end"))?;
        let vars = self.vars.create_child(outer.vars, label)?;
        let names = self.class.names.create_child(outer.names, label)?;

        let block = self.push_block(Block {
            vars,
            names,
            start: start.clone(),
            end,
        });
        self.mark(start);
        Ok(block)
    }

    /// Close a block in both trees and place its end label.
    ///
    /// Returns `Ok(false)` if the block was already closed.
    pub fn close_block(&mut self, block: BlockId) -> Result<bool, BuildError> {
        let Block { vars, names, end, .. } = self.block(block)?.clone();
        if self.vars.is_closed(vars) {
            return Ok(false);
        }
        self.vars.check_usable(vars)?;

        self.mark(end);
        self.vars.close(vars)?;
        self.class.names.close(names)?;
        Ok(true)
    }

    pub fn is_closed(&self, block: BlockId) -> Result<bool, BuildError> {
        let vars = self.block(block)?.vars;
        Ok(self.vars.is_closed(vars))
    }

    fn push_block(&mut self, block: Block) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(block);
        id
    }

    fn block(&self, block: BlockId) -> Result<&Block, BuildError> {
        self.blocks
            .get(block.0 as usize)
            .ok_or(BuildError::UnknownBlock { block: block.0 })
    }

    // ==========================================================================
    // Variables and names
    // ==========================================================================

    /// Declare a local variable in `block`. A named local is also reserved in
    /// the block's name scope.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn declare_local(
        &mut self,
        block: BlockId,
        ty: JvmType,
        name: Option<&str>,
    ) -> Result<Variable, BuildError> {
        let (vars, names) = {
            let b = self.block(block)?;
            (b.vars, b.names)
        };
        let var = self.vars.add_local(vars, ty, name)?;
        if let Some(name) = name {
            self.class.names.put(names, name)?;
        }
        self.declared.push((block, var.clone()));
        Ok(var)
    }

    /// Declare a local under a fresh name derived from `hint`.
    pub fn declare_temp(
        &mut self,
        block: BlockId,
        ty: JvmType,
        hint: Option<&str>,
    ) -> Result<Variable, BuildError> {
        let name = self.fresh_name(block, hint)?;
        self.declare_local(block, ty, Some(&name))
    }

    /// Look up a variable visible from `block`.
    pub fn variable(&self, block: BlockId, name: &str) -> Result<&Variable, BuildError> {
        let vars = self.block(block)?.vars;
        Ok(self.vars.lookup_by_name(vars, name)?)
    }

    /// The `this` reference, for instance methods whose body has begun.
    pub fn receiver(&self) -> Option<&Variable> {
        self.vars.receiver(self.vars.root())
    }

    pub fn fresh_name(&mut self, block: BlockId, hint: Option<&str>) -> Result<String, BuildError> {
        let names = self.block(block)?.names;
        Ok(self.class.names.get(names, hint)?)
    }

    /// Reserve a name so the block and its descendants never issue it.
    pub fn reserve_name(&mut self, block: BlockId, name: &str) -> Result<(), BuildError> {
        let names = self.block(block)?.names;
        Ok(self.class.names.put(names, name)?)
    }

    // ==========================================================================
    // Labels and instructions
    // ==========================================================================

    /// Create an unplaced label named after `hint`.
    pub fn new_label(&mut self, block: BlockId, hint: Option<&str>) -> Result<Label, BuildError> {
        let names = self.block(block)?.names;
        self.mint_label(names, Some(hint.unwrap_or(DEFAULT_LABEL_HINT)))
    }

    /// Place `label` at the current position. A label is placed at most once.
    pub fn place_label(&mut self, block: BlockId, label: &Label) -> Result<(), BuildError> {
        let vars = self.block(block)?.vars;
        self.vars.check_usable(vars)?;
        if self.is_placed(label) {
            return Err(BuildError::LabelAlreadyPlaced {
                label: label.name().to_string(),
            });
        }
        self.mark(label.clone());
        Ok(())
    }

    /// Append an instruction to the code of `block`.
    pub fn emit(&mut self, block: BlockId, instruction: Instruction) -> Result<(), BuildError> {
        if let Instruction::Mark(label) = &instruction {
            return self.place_label(block, label);
        }
        let vars = self.block(block)?.vars;
        self.vars.check_usable(vars)?;
        self.code.push(instruction);
        Ok(())
    }

    fn mint_label(&mut self, names: ScopeId, hint: Option<&str>) -> Result<Label, BuildError> {
        let name = self.class.names.get(names, hint)?;
        let label = Label::new(self.placed.len() as u32, name);
        self.placed.push(false);
        Ok(label)
    }

    fn is_placed(&self, label: &Label) -> bool {
        self.placed
            .get(label.id().index() as usize)
            .copied()
            .unwrap_or(false)
    }

    fn mark(&mut self, label: Label) {
        if let Some(placed) = self.placed.get_mut(label.id().index() as usize) {
            *placed = true;
        }
        self.code.push(Instruction::Mark(label));
    }

    // ==========================================================================
    // Completion
    // ==========================================================================

    /// Finish the method and add it to the class.
    ///
    /// The body, if begun, must be closed.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn finish(self) -> Result<(), BuildError> {
        if let Some(body) = self.body
            && !self.is_closed(body)?
        {
            return Err(BuildError::OpenBody {
                method: self.decl.name.clone(),
            });
        }
        self.class.names.close(self.names)?;

        let local_variables = if self.class.options().emit_local_variable_table {
            self.local_variable_records()
        } else {
            Vec::new()
        };
        let method = CompiledMethod {
            max_locals: self.vars.max_slots(),
            decl: self.decl,
            code: self.code,
            local_variables,
        };

        debug!(
            method = %method.decl.name,
            max_locals = method.max_locals,
            instructions = method.code.len(),
            "finished method"
        );
        self.class.push_method(method);
        Ok(())
    }

    fn local_variable_records(&self) -> Vec<LocalVariableRecord> {
        self.declared
            .iter()
            .filter_map(|(block, var)| {
                let name = var.name.clone()?;
                let block = self.blocks.get(block.0 as usize)?;
                Some(LocalVariableRecord {
                    name,
                    ty: var.ty.clone(),
                    start: block.start.clone(),
                    end: block.end.clone(),
                    slot: var.offset,
                })
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
