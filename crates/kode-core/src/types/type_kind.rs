//! Stack kinds of JVM values.

use std::fmt;

/// The kind of a JVM type, as seen by the operand stack.
///
/// `boolean`, `byte`, `char` and `short` are all held as `Int`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Void,
    Int,
    Long,
    Float,
    Double,
    Reference,
}

impl TypeKind {
    /// The computational category: the number of stack slots a value takes.
    ///
    /// `Void` is never on the stack and has category 0.
    pub const fn category(self) -> u32 {
        match self {
            TypeKind::Void => 0,
            TypeKind::Int | TypeKind::Float | TypeKind::Reference => 1,
            TypeKind::Long | TypeKind::Double => 2,
        }
    }

    /// Whether values of this kind take two slots.
    pub const fn is_wide(self) -> bool {
        self.category() == 2
    }

    pub const fn name(self) -> &'static str {
        match self {
            TypeKind::Void => "void",
            TypeKind::Int => "int",
            TypeKind::Long => "long",
            TypeKind::Float => "float",
            TypeKind::Double => "double",
            TypeKind::Reference => "reference",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
