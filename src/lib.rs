//! kode: lexical scoping for JVM code generation.
//!
//! This crate re-exports the workspace crates:
//!
//! - [`core`]: JVM types, modifiers, class versions and errors (`kode-core`)
//! - [`compiler`]: scope trees, variable tables, name allocation and the
//!   class/method builders (`kode-compiler`)
//!
//! # Example
//!
//! ```
//! use kode::prelude::*;
//!
//! let mut class = ClassBuilder::new(
//!     ClassDecl::new(ClassRef::from_java_name("demo.Counter")),
//!     BuildOptions::default(),
//! );
//! let mut method = class
//!     .method(MethodDecl::new("next").with_param(Param::named("step", JvmType::Int)))
//!     .unwrap();
//! let body = method.begin_code().unwrap();
//! let total = method.declare_local(body, JvmType::Long, Some("total")).unwrap();
//! assert_eq!(total.offset, 2);
//! method.close_block(body).unwrap();
//! method.finish().unwrap();
//!
//! let compiled = class.build().unwrap();
//! assert_eq!(compiled.methods[0].max_locals, 4);
//! ```

pub use kode_compiler as compiler;
pub use kode_core as core;

pub use kode_core::{BuildError, KodeError, ScopeError};

/// Result type for fallible kode operations.
pub type KodeResult<T> = Result<T, KodeError>;

pub mod prelude {
    pub use kode_compiler::{
        BlockId, BuildOptions, ClassBuilder, ClassDecl, CompiledClass, CompiledMethod, FieldDecl,
        Instruction, Label, LocalVariableRecord, MethodBuilder, MethodDecl, NameAllocator, Param,
        ScopeId, ScopeTree, VarKind, Variable, VariableTable,
    };
    pub use kode_core::{
        BuildError, ClassModifiers, ClassRef, ClassVersion, FieldModifiers, JvmType, KodeError,
        MethodModifiers, ScopeError, SlotWidth, TypeKind,
    };

    pub use crate::KodeResult;
}
