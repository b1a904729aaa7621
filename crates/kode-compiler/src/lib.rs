//! kode compiler back end.
//!
//! Lexical scoping for JVM code generation, and the builders that drive it:
//!
//! - [`scope`]: scope trees with open/closed lifecycle
//! - [`vars`]: local-variable slot assignment per scope
//! - [`names`]: collision-free fresh names per scope
//! - [`emit`]: class and method builders
//! - [`options`]: build configuration
//!
//! # Example
//!
//! ```
//! use kode_compiler::vars::VariableTable;
//! use kode_core::JvmType;
//!
//! let mut table: VariableTable = VariableTable::new(Some("main"));
//! let root = table.root();
//! table.add_argument(root, JvmType::Long, Some("n")).unwrap();
//!
//! let block = table.create_child(root, Some("loop")).unwrap();
//! let i = table.add_local(block, JvmType::Int, Some("i")).unwrap();
//! assert_eq!(i.offset, 2);
//! ```

pub mod emit;
pub mod names;
pub mod options;
pub mod scope;
pub mod vars;

pub use emit::{
    BlockId, ClassBuilder, ClassDecl, CompiledClass, CompiledMethod, FieldDecl, Instruction,
    Label, LabelId, LocalVariableRecord, MethodBuilder, MethodDecl, Param,
};
pub use names::NameAllocator;
pub use options::BuildOptions;
pub use scope::{ScopeId, ScopeTree};
pub use vars::{DeclPhase, VarKind, Variable, VariableTable};
