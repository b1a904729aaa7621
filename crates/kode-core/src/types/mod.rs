//! JVM value types.
//!
//! - [`TypeKind`] - How a value is held on the operand stack
//! - [`JvmType`] and [`ClassRef`] - Types of declared variables, fields and parameters
//! - [`SlotWidth`] - Number of local-variable slots a value occupies

mod jvm_type;
mod type_kind;

pub use jvm_type::{ClassRef, JvmType};
pub use type_kind::TypeKind;

/// Number of local-variable slots taken by a value of this type.
///
/// This is the only thing a variable table needs to know about a type:
/// 1 for ordinary values, 2 for the double-wide categories (`long`, `double`).
pub trait SlotWidth {
    /// The width in slots, either 1 or 2.
    fn slot_width(&self) -> u32;
}

impl SlotWidth for TypeKind {
    fn slot_width(&self) -> u32 {
        // Void never occupies a slot of its own; count it as one.
        self.category().max(1)
    }
}

impl SlotWidth for JvmType {
    fn slot_width(&self) -> u32 {
        self.kind().slot_width()
    }
}
