//! Classes: fields, methods and the class-wide name scope.

use kode_core::{BuildError, ClassVersion, FieldModifiers, JvmType, MethodModifiers};
use tracing::debug;

use super::decl::{ClassDecl, FieldDecl, MethodDecl, Param};
use super::method_builder::{CompiledMethod, MethodBuilder};
use crate::names::NameAllocator;
use crate::options::BuildOptions;

/// A finished class, ready for a class-file writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledClass {
    pub decl: ClassDecl,
    pub version: ClassVersion,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<CompiledMethod>,
}

/// Builds one class.
///
/// Field names, method names and every name issued inside method bodies come
/// from a single [`NameAllocator`] rooted at the class, so synthetic members
/// never collide with declared ones.
#[derive(Debug)]
pub struct ClassBuilder {
    decl: ClassDecl,
    options: BuildOptions,
    pub(super) names: NameAllocator,
    fields: Vec<FieldDecl>,
    methods: Vec<CompiledMethod>,
}

impl ClassBuilder {
    pub fn new(decl: ClassDecl, options: BuildOptions) -> Self {
        let names = NameAllocator::new(Some(decl.class.name()));
        Self {
            decl,
            options,
            names,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn decl(&self) -> &ClassDecl {
        &self.decl
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// Methods finished so far.
    pub fn methods(&self) -> &[CompiledMethod] {
        &self.methods
    }

    /// Declare a field. Its name is reserved class-wide.
    pub fn add_field(
        &mut self,
        name: &str,
        ty: JvmType,
        modifiers: FieldModifiers,
    ) -> Result<&FieldDecl, BuildError> {
        if self.fields.iter().any(|f| f.name == name) {
            return Err(BuildError::DuplicateMember {
                class: self.decl.class.java_name(),
                name: name.to_string(),
            });
        }
        self.names.put(self.names.root(), name)?;

        let index = self.fields.len();
        self.fields.push(FieldDecl {
            name: name.to_string(),
            ty,
            modifiers,
        });
        Ok(&self.fields[index])
    }

    /// Start a method. Methods may be overloaded, so the name is only reserved.
    pub fn method(&mut self, decl: MethodDecl) -> Result<MethodBuilder<'_>, BuildError> {
        self.names.put(self.names.root(), &decl.name)?;
        MethodBuilder::new(self, decl)
    }

    /// Start a synthetic method under a fresh name derived from `hint`,
    /// such as `lambda$` or `access$`.
    pub fn synthetic_method(
        &mut self,
        hint: &str,
        modifiers: MethodModifiers,
        params: Vec<Param>,
        return_type: JvmType,
    ) -> Result<MethodBuilder<'_>, BuildError> {
        let name = self.fresh_name(Some(hint))?;
        let decl = MethodDecl {
            name,
            modifiers: modifiers | MethodModifiers::SYNTHETIC,
            params,
            return_type,
        };
        MethodBuilder::new(self, decl)
    }

    /// A fresh class-wide name.
    pub fn fresh_name(&mut self, hint: Option<&str>) -> Result<String, BuildError> {
        Ok(self.names.get(self.names.root(), hint)?)
    }

    pub(super) fn push_method(&mut self, method: CompiledMethod) {
        self.methods.push(method);
    }

    /// Finish the class. Fails while a method builder was dropped unfinished.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(mut self) -> Result<CompiledClass, BuildError> {
        self.names.close(self.names.root())?;

        debug!(
            class = %self.decl.class,
            fields = self.fields.len(),
            methods = self.methods.len(),
            "built class"
        );
        Ok(CompiledClass {
            decl: self.decl,
            version: self.options.class_version,
            fields: self.fields,
            methods: self.methods,
        })
    }
}

#[cfg(test)]
mod tests {
    use kode_core::{ClassRef, ScopeError};

    use super::*;

    fn class() -> ClassBuilder {
        ClassBuilder::new(
            ClassDecl::new(ClassRef::from_java_name("demo.Main")),
            BuildOptions::default(),
        )
    }

    #[test]
    fn duplicate_field() {
        let mut class = class();
        class
            .add_field("count", JvmType::Int, FieldModifiers::PRIVATE)
            .unwrap();

        assert_eq!(
            class.add_field("count", JvmType::Long, FieldModifiers::PRIVATE),
            Err(BuildError::DuplicateMember {
                class: "demo.Main".into(),
                name: "count".into(),
            })
        );
    }

    #[test]
    fn fresh_names_avoid_members() {
        let mut class = class();
        class
            .add_field("value", JvmType::Int, FieldModifiers::PRIVATE)
            .unwrap();
        class.add_field("value1", JvmType::Int, FieldModifiers::PRIVATE).unwrap();

        assert_eq!(class.fresh_name(Some("value")).unwrap(), "value2");
    }

    #[test]
    fn synthetic_methods_get_fresh_names() {
        let mut class = class();
        class
            .synthetic_method("lambda$", MethodModifiers::PRIVATE, Vec::new(), JvmType::Void)
            .unwrap()
            .finish()
            .unwrap();
        class
            .synthetic_method("lambda$", MethodModifiers::PRIVATE, Vec::new(), JvmType::Void)
            .unwrap()
            .finish()
            .unwrap();

        let names: Vec<&str> = class.methods().iter().map(|m| m.decl.name.as_str()).collect();
        assert_eq!(names, ["lambda$", "lambda$1"]);
        assert!(class.methods()[0]
            .decl
            .modifiers
            .contains(MethodModifiers::SYNTHETIC));
    }

    #[test]
    fn overloads_share_a_name() {
        let mut class = class();
        class.method(MethodDecl::new("run")).unwrap().finish().unwrap();
        class
            .method(MethodDecl::new("run").with_param(Param::named("n", JvmType::Int)))
            .unwrap()
            .finish()
            .unwrap();

        assert_eq!(class.methods().len(), 2);
        assert_eq!(class.fresh_name(Some("run")).unwrap(), "run1");
    }

    #[test]
    fn build_fails_after_unfinished_method() {
        let mut class = class();
        drop(class.method(MethodDecl::new("run")).unwrap());

        assert!(matches!(
            class.build(),
            Err(BuildError::Scope(ScopeError::ScopeHasOpenChildren { .. }))
        ));
    }

    #[test]
    fn build_uses_configured_version() {
        let class = ClassBuilder::new(
            ClassDecl::new(ClassRef::from_java_name("demo.Main")),
            BuildOptions::default().with_class_version(ClassVersion::Java11),
        );
        let compiled = class.build().unwrap();
        assert_eq!(compiled.version, ClassVersion::Java11);
        assert!(compiled.methods.is_empty());
    }
}
