//! Declarations of classes and their members.

use kode_core::{ClassModifiers, ClassRef, FieldModifiers, JvmType, MethodModifiers};

/// Declaration of the class being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub class: ClassRef,
    pub modifiers: ClassModifiers,
    pub super_class: ClassRef,
    pub interfaces: Vec<ClassRef>,
}

impl ClassDecl {
    /// A public class extending `java.lang.Object`.
    pub fn new(class: ClassRef) -> Self {
        Self {
            class,
            modifiers: ClassModifiers::PUBLIC | ClassModifiers::SUPER,
            super_class: ClassRef::object(),
            interfaces: Vec::new(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: ClassModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_super_class(mut self, super_class: ClassRef) -> Self {
        self.super_class = super_class;
        self
    }

    pub fn with_interface(mut self, interface: ClassRef) -> Self {
        self.interfaces.push(interface);
        self
    }
}

/// A field of the class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: JvmType,
    pub modifiers: FieldModifiers,
}

/// A formal parameter of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// `None` for parameters without a source name.
    pub name: Option<String>,
    pub ty: JvmType,
}

impl Param {
    pub fn named(name: impl Into<String>, ty: JvmType) -> Self {
        Self {
            name: Some(name.into()),
            ty,
        }
    }

    pub fn unnamed(ty: JvmType) -> Self {
        Self { name: None, ty }
    }
}

/// Signature and modifiers of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    pub modifiers: MethodModifiers,
    pub params: Vec<Param>,
    pub return_type: JvmType,
}

impl MethodDecl {
    /// A public instance method returning `void` with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: MethodModifiers::PUBLIC,
            params: Vec::new(),
            return_type: JvmType::Void,
        }
    }

    pub fn with_modifiers(mut self, modifiers: MethodModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn returning(mut self, return_type: JvmType) -> Self {
        self.return_type = return_type;
        self
    }

    /// Whether the method has a `this` receiver.
    pub fn is_instance(&self) -> bool {
        self.modifiers.is_instance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_defaults() {
        let decl = MethodDecl::new("run");
        assert!(decl.is_instance());
        assert_eq!(decl.return_type, JvmType::Void);

        let decl = decl
            .with_modifiers(MethodModifiers::PUBLIC | MethodModifiers::STATIC)
            .with_param(Param::named("args", JvmType::array_of(JvmType::from(ClassRef::string()))));
        assert!(!decl.is_instance());
        assert_eq!(decl.params.len(), 1);
    }

    #[test]
    fn class_defaults() {
        let decl = ClassDecl::new(ClassRef::from_java_name("demo.Main"))
            .with_interface(ClassRef::from_java_name("java.lang.Runnable"));
        assert_eq!(decl.super_class, ClassRef::object());
        assert!(decl.modifiers.contains(ClassModifiers::SUPER));
        assert_eq!(decl.interfaces.len(), 1);
    }
}
