//! Code emission for classes and methods.
//!
//! The builders here drive the scoping subsystem: a [`ClassBuilder`] owns the
//! class-level [`NameAllocator`](crate::names::NameAllocator), and every
//! [`MethodBuilder`] opens a child allocator scope plus its own
//! [`VariableTable`](crate::vars::VariableTable). Each lexical block of a
//! method body is a scope in both, opened and closed in lockstep.
//!
//! Instructions are kept as a symbolic list; encoding them into a class file
//! is left to a class-file writer.
//!
//! # Example
//!
//! ```ignore
//! use kode_compiler::emit::{ClassBuilder, ClassDecl, MethodDecl, Param};
//!
//! let mut class = ClassBuilder::new(ClassDecl::new(ClassRef::from_java_name("demo.Main")), BuildOptions::default());
//! let mut method = class.method(MethodDecl::new("run").with_param(Param::named("n", JvmType::Int)))?;
//! let body = method.begin_code()?;
//! let tmp = method.declare_temp(body, JvmType::Long, Some("tmp"))?;
//! method.emit(body, Instruction::Var { opcode: 0x37, slot: tmp.offset })?;
//! method.close_block(body)?;
//! method.finish()?;
//! let compiled = class.build()?;
//! ```

mod class_builder;
mod decl;
mod method_builder;

use std::fmt;

pub use class_builder::{ClassBuilder, CompiledClass};
pub use decl::{ClassDecl, FieldDecl, MethodDecl, Param};
pub use method_builder::{BlockId, CompiledMethod, LocalVariableRecord, MethodBuilder};

// ============================================================================
// Labels
// ============================================================================

/// Identity of a label within one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelId(u32);

impl LabelId {
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// A position in a method body that jumps and debug records can refer to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    id: LabelId,
    /// Fresh name, unique within the method's lexical chain.
    name: String,
}

impl Label {
    pub(crate) fn new(id: u32, name: String) -> Self {
        Self {
            id: LabelId(id),
            name,
        }
    }

    pub fn id(&self) -> LabelId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// ============================================================================
// Instructions
// ============================================================================

/// A symbolic instruction.
///
/// Opcodes are raw class-file opcode values; they are not validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// An instruction without operands.
    Op(u8),
    /// An instruction on a local-variable slot (`iload`, `astore`, `iinc`, ...).
    Var { opcode: u8, slot: u32 },
    /// A branch to a label.
    Jump { opcode: u8, target: Label },
    /// Marks the position of a label.
    Mark(Label),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Op(opcode) => write!(f, "op {opcode:#04x}"),
            Instruction::Var { opcode, slot } => write!(f, "op {opcode:#04x} @{slot}"),
            Instruction::Jump { opcode, target } => write!(f, "op {opcode:#04x} -> {target}"),
            Instruction::Mark(label) => write!(f, "{label}:"),
        }
    }
}
