//! JVM types of variables, fields and parameters.

use std::fmt;

use super::TypeKind;

/// A reference to a class or interface by its qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassRef {
    /// Dotted package name, empty for the default package.
    package: String,
    /// Simple name, with `$` separating nested classes.
    name: String,
}

impl ClassRef {
    /// Create a class reference from a dotted package and a simple name.
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Create a class reference from a fully qualified Java name (`java.lang.String`).
    pub fn from_java_name(java_name: &str) -> Self {
        match java_name.rsplit_once('.') {
            Some((package, name)) => Self::new(package, name),
            None => Self::new("", java_name),
        }
    }

    /// `java.lang.Object`
    pub fn object() -> Self {
        Self::new("java.lang", "Object")
    }

    /// `java.lang.String`
    pub fn string() -> Self {
        Self::new("java.lang", "String")
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully qualified Java name, e.g. `java.lang.String`.
    pub fn java_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    /// Internal (slash-separated) name, e.g. `java/lang/String`.
    pub fn internal_name(&self) -> String {
        self.java_name().replace('.', "/")
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.java_name())
    }
}

/// A JVM type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JvmType {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// A class or interface type.
    Class(ClassRef),
    /// An array with the given component type.
    Array(Box<JvmType>),
}

impl JvmType {
    /// Create an array type of this component type.
    pub fn array_of(component: JvmType) -> Self {
        JvmType::Array(Box::new(component))
    }

    /// Create a class type from a fully qualified Java name.
    pub fn class(java_name: &str) -> Self {
        JvmType::Class(ClassRef::from_java_name(java_name))
    }

    /// The stack kind of this type.
    pub fn kind(&self) -> TypeKind {
        match self {
            JvmType::Void => TypeKind::Void,
            JvmType::Boolean | JvmType::Byte | JvmType::Char | JvmType::Short | JvmType::Int => {
                TypeKind::Int
            }
            JvmType::Long => TypeKind::Long,
            JvmType::Float => TypeKind::Float,
            JvmType::Double => TypeKind::Double,
            JvmType::Class(_) | JvmType::Array(_) => TypeKind::Reference,
        }
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, JvmType::Class(_) | JvmType::Array(_))
    }

    pub fn is_reference(&self) -> bool {
        !self.is_primitive()
    }
}

impl From<ClassRef> for JvmType {
    fn from(class: ClassRef) -> Self {
        JvmType::Class(class)
    }
}

impl fmt::Display for JvmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JvmType::Void => write!(f, "void"),
            JvmType::Boolean => write!(f, "boolean"),
            JvmType::Byte => write!(f, "byte"),
            JvmType::Char => write!(f, "char"),
            JvmType::Short => write!(f, "short"),
            JvmType::Int => write!(f, "int"),
            JvmType::Long => write!(f, "long"),
            JvmType::Float => write!(f, "float"),
            JvmType::Double => write!(f, "double"),
            JvmType::Class(class) => write!(f, "{class}"),
            JvmType::Array(component) => write!(f, "{component}[]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SlotWidth;

    #[test]
    fn slot_widths() {
        assert_eq!(JvmType::Int.slot_width(), 1);
        assert_eq!(JvmType::Boolean.slot_width(), 1);
        assert_eq!(JvmType::Long.slot_width(), 2);
        assert_eq!(JvmType::Double.slot_width(), 2);
        assert_eq!(JvmType::class("java.lang.String").slot_width(), 1);
        assert_eq!(JvmType::array_of(JvmType::Long).slot_width(), 1);
    }

    #[test]
    fn class_names() {
        let string = ClassRef::from_java_name("java.lang.String");
        assert_eq!(string, ClassRef::string());
        assert_eq!(string.internal_name(), "java/lang/String");

        let local = ClassRef::from_java_name("Main");
        assert_eq!(local.package(), "");
        assert_eq!(local.java_name(), "Main");
    }

    #[test]
    fn display() {
        assert_eq!(JvmType::array_of(JvmType::Int).to_string(), "int[]");
        assert_eq!(JvmType::from(ClassRef::object()).to_string(), "java.lang.Object");
    }
}
