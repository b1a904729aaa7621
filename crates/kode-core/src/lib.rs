//! kode core types.
//!
//! Shared vocabulary for the kode crates:
//!
//! - [`error`]: error hierarchy for scoping and building
//! - [`types`]: JVM value types and their slot widths
//! - [`modifiers`]: access and property flags for classes, fields and methods
//! - [`class_version`]: class-file format versions

pub mod class_version;
pub mod error;
pub mod modifiers;
pub mod types;

pub use class_version::ClassVersion;
pub use error::{BuildError, KodeError, ScopeError};
pub use modifiers::{ClassModifiers, FieldModifiers, MethodModifiers};
pub use types::{ClassRef, JvmType, SlotWidth, TypeKind};
