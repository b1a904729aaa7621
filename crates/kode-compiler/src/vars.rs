//! Variable slot management for method bodies.
//!
//! This module provides [`VariableTable`], which assigns local-variable slots
//! to the receiver (`this`), the arguments and the local variables of a method.
//! It handles:
//! - Declaration ordering: receiver, then arguments, then locals
//! - Gap-free slot offsets, with double-wide values taking two slots
//! - Nested lexical blocks that see their ancestors' variables and allocate
//!   their own after the ancestors' high-water mark
//! - Lookup by name and by index across the lexical chain
//!
//! Variables in sibling blocks may share names and slots: they are only
//! required to be unique in the context of their ancestors.

use std::fmt;

use kode_core::{JvmType, ScopeError, SlotWidth};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::scope::{ScopeId, ScopeTree};

// ============================================================================
// Types
// ============================================================================

/// The role of a variable in a method frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    /// The implicit `this` reference.
    Receiver,
    /// A method argument.
    Argument,
    /// A local variable declared in the body.
    Local,
}

impl VarKind {
    fn phase(self) -> DeclPhase {
        match self {
            VarKind::Receiver => DeclPhase::HasReceiver,
            VarKind::Argument => DeclPhase::HasArguments,
            VarKind::Local => DeclPhase::HasLocals,
        }
    }
}

/// How far declarations have progressed. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum DeclPhase {
    #[default]
    Empty,
    HasReceiver,
    HasArguments,
    HasLocals,
}

/// A declared variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable<T = JvmType> {
    /// Variable name, `None` for unnamed variables
    pub name: Option<String>,
    /// Variable type
    pub ty: T,
    /// Scope the variable was declared in
    pub scope: ScopeId,
    /// First slot occupied by the variable.
    ///
    /// This is not the variable's index: double-wide values before it
    /// take two slots each.
    pub offset: u32,
    /// Receiver, argument or local
    pub kind: VarKind,
}

impl<T: fmt::Display> fmt::Display for Variable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} : {}",
            self.name.as_deref().unwrap_or(""),
            self.offset,
            self.ty
        )
    }
}

/// Per-scope state of a [`VariableTable`].
#[derive(Debug)]
struct VarFrame<T> {
    /// Variables declared in this scope, not those of ancestors.
    vars: Vec<Variable<T>>,
    /// Named variables of this scope, by position in `vars`.
    by_name: FxHashMap<String, usize>,
    phase: DeclPhase,
    /// Slot of the first variable of this scope.
    base_offset: u32,
    /// Next free slot.
    next_offset: u32,
    /// Index of the first variable of this scope within the whole chain.
    base_index: u32,
    argument_count: u32,
    local_count: u32,
}

impl<T> VarFrame<T> {
    fn new(base_offset: u32, base_index: u32) -> Self {
        Self {
            vars: Vec::new(),
            by_name: FxHashMap::default(),
            phase: DeclPhase::Empty,
            base_offset,
            next_offset: base_offset,
            base_index,
            argument_count: 0,
            local_count: 0,
        }
    }

    /// Number of variables in this scope and its ancestors.
    fn chain_len(&self) -> u32 {
        self.base_index + self.vars.len() as u32
    }

    fn has_receiver(&self) -> bool {
        self.vars
            .first()
            .is_some_and(|v| v.kind == VarKind::Receiver)
    }
}

// ============================================================================
// VariableTable
// ============================================================================

/// Slot table for the variables of one method, organised by lexical scope.
///
/// Every operation takes the [`ScopeId`] of the scope it acts on. Mutations
/// require the scope to be open and to have no open child scopes; lookups
/// only require it to be open.
#[derive(Debug)]
pub struct VariableTable<T = JvmType> {
    tree: ScopeTree<VarFrame<T>>,
    /// Highest slot count reached by any scope.
    max_slots: u32,
}

impl<T: SlotWidth + Clone> VariableTable<T> {
    /// Create a table with an empty root scope.
    pub fn new(label: Option<&str>) -> Self {
        Self {
            tree: ScopeTree::new(label, VarFrame::new(0, 0)),
            max_slots: 0,
        }
    }

    /// The root scope.
    pub fn root(&self) -> ScopeId {
        self.tree.root()
    }

    // ==========================================================================
    // Scope Management
    // ==========================================================================

    /// Open a nested scope.
    ///
    /// The child allocates its variables from the parent's next free slot
    /// onwards. The parent cannot be used until the child is closed.
    pub fn create_child(
        &mut self,
        scope: ScopeId,
        label: Option<&str>,
    ) -> Result<ScopeId, ScopeError> {
        let parent = self.tree.get(scope);
        let frame = VarFrame::new(parent.next_offset, parent.chain_len());
        self.tree.create_child(scope, label, frame)
    }

    /// Close a scope. See [`ScopeTree::close`].
    pub fn close(&mut self, scope: ScopeId) -> Result<bool, ScopeError> {
        self.tree.close(scope)
    }

    pub fn is_closed(&self, scope: ScopeId) -> bool {
        self.tree.is_closed(scope)
    }

    /// Check that a scope can be written to. See [`ScopeTree::check_usable`].
    pub fn check_usable(&self, scope: ScopeId) -> Result<(), ScopeError> {
        self.tree.check_usable(scope)
    }

    /// Full debug name of a scope.
    pub fn scope_name(&self, scope: ScopeId) -> String {
        self.tree.full_name(scope)
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    /// Add the `this` reference.
    ///
    /// It must be the first variable of the whole chain, so it always lands
    /// in slot 0.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn add_receiver(&mut self, scope: ScopeId, ty: T) -> Result<Variable<T>, ScopeError> {
        self.tree.check_usable(scope)?;
        if self.has_receiver(scope) {
            return Err(self.order_error(scope, "a receiver has already been added"));
        }
        if self.len(scope) > 0 {
            return Err(self.order_error(scope, "other variables have already been added"));
        }
        self.push(scope, ty, None, VarKind::Receiver)
    }

    /// Add an argument after the receiver and any previous arguments.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn add_argument(
        &mut self,
        scope: ScopeId,
        ty: T,
        name: Option<&str>,
    ) -> Result<Variable<T>, ScopeError> {
        self.tree.check_usable(scope)?;
        if self.phase(scope) == DeclPhase::HasLocals {
            return Err(self.order_error(scope, "local variables have already been added"));
        }
        self.push(scope, ty, name, VarKind::Argument)
    }

    /// Add a local variable. After this, no receiver or argument can be added
    /// anywhere in the chain.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn add_local(
        &mut self,
        scope: ScopeId,
        ty: T,
        name: Option<&str>,
    ) -> Result<Variable<T>, ScopeError> {
        self.tree.check_usable(scope)?;
        self.push(scope, ty, name, VarKind::Local)
    }

    fn push(
        &mut self,
        scope: ScopeId,
        ty: T,
        name: Option<&str>,
        kind: VarKind,
    ) -> Result<Variable<T>, ScopeError> {
        if let Some(name) = name
            && self.find_by_name(scope, name).is_some()
        {
            return Err(ScopeError::DuplicateName {
                name: name.to_string(),
                scope: self.tree.full_name(scope),
            });
        }

        let width = ty.slot_width();
        let frame = self.tree.get_mut(scope);
        let offset = frame.next_offset;
        frame.next_offset += width;

        let var = Variable {
            name: name.map(str::to_owned),
            ty,
            scope,
            offset,
            kind,
        };
        if let Some(name) = name {
            frame.by_name.insert(name.to_string(), frame.vars.len());
        }
        frame.vars.push(var.clone());
        frame.phase = frame.phase.max(kind.phase());
        match kind {
            VarKind::Argument => frame.argument_count += 1,
            VarKind::Local => frame.local_count += 1,
            VarKind::Receiver => {}
        }
        self.max_slots = self.max_slots.max(frame.next_offset);

        trace!(?kind, name = name.unwrap_or(""), offset, width, "declared variable");
        Ok(var)
    }

    fn order_error(&self, scope: ScopeId, detail: &str) -> ScopeError {
        ScopeError::InvalidDeclarationOrder {
            scope: self.tree.full_name(scope),
            detail: detail.to_string(),
        }
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Look up a variable by name in this scope and its ancestors.
    pub fn lookup_by_name(&self, scope: ScopeId, name: &str) -> Result<&Variable<T>, ScopeError> {
        self.tree.check_open(scope)?;
        self.find_by_name(scope, name)
            .ok_or_else(|| ScopeError::NameNotFound {
                name: name.to_string(),
                scope: self.tree.full_name(scope),
            })
    }

    /// Look up a variable by its index in the chain.
    ///
    /// Index 0 is the first variable of the root scope (the receiver, if
    /// there is one). Indices count variables, not slots.
    pub fn lookup_by_index(&self, scope: ScopeId, index: u32) -> Result<&Variable<T>, ScopeError> {
        self.tree.check_open(scope)?;
        let out_of_range = ScopeError::IndexOutOfRange {
            index,
            len: self.len(scope),
        };
        if index >= self.len(scope) {
            return Err(out_of_range);
        }
        self.tree
            .chain(scope)
            .map(|s| self.tree.get(s))
            .find(|frame| index >= frame.base_index)
            .and_then(|frame| frame.vars.get((index - frame.base_index) as usize))
            .ok_or(out_of_range)
    }

    fn find_by_name(&self, scope: ScopeId, name: &str) -> Option<&Variable<T>> {
        self.tree.chain(scope).find_map(|s| {
            let frame = self.tree.get(s);
            frame.by_name.get(name).map(|&i| &frame.vars[i])
        })
    }

    /// Whether the chain has a `this` reference.
    pub fn has_receiver(&self, scope: ScopeId) -> bool {
        self.tree
            .chain(scope)
            .any(|s| self.tree.get(s).has_receiver())
    }

    /// Whether the chain has an argument with this name.
    pub fn has_argument(&self, scope: ScopeId, name: &str) -> bool {
        self.find_by_name(scope, name)
            .is_some_and(|v| v.kind == VarKind::Argument)
    }

    /// Whether the chain has a local variable with this name.
    pub fn has_local(&self, scope: ScopeId, name: &str) -> bool {
        self.find_by_name(scope, name)
            .is_some_and(|v| v.kind == VarKind::Local)
    }

    /// The `this` reference, if any.
    pub fn receiver(&self, scope: ScopeId) -> Option<&Variable<T>> {
        self.tree
            .chain(scope)
            .map(|s| self.tree.get(s))
            .find(|frame| frame.has_receiver())
            .and_then(|frame| frame.vars.first())
    }

    /// The argument with this zero-based argument index.
    pub fn argument(&self, scope: ScopeId, index: u32) -> Result<&Variable<T>, ScopeError> {
        self.tree.check_open(scope)?;
        self.chain_variables(scope)
            .filter(|v| v.kind == VarKind::Argument)
            .nth(index as usize)
            .ok_or(ScopeError::IndexOutOfRange {
                index,
                len: self.argument_count(scope),
            })
    }

    /// The local variable with this zero-based local index.
    pub fn local(&self, scope: ScopeId, index: u32) -> Result<&Variable<T>, ScopeError> {
        self.tree.check_open(scope)?;
        self.chain_variables(scope)
            .filter(|v| v.kind == VarKind::Local)
            .nth(index as usize)
            .ok_or(ScopeError::IndexOutOfRange {
                index,
                len: self.local_count(scope),
            })
    }

    /// All variables of the chain, in index order.
    pub fn chain_variables(&self, scope: ScopeId) -> impl Iterator<Item = &Variable<T>> {
        let mut scopes: Vec<ScopeId> = self.tree.chain(scope).collect();
        scopes.reverse();
        scopes
            .into_iter()
            .flat_map(move |s| self.tree.get(s).vars.iter())
    }

    /// Variables declared in this scope only.
    pub fn variables(&self, scope: ScopeId) -> &[Variable<T>] {
        &self.tree.get(scope).vars
    }

    // ==========================================================================
    // Accessors
    // ==========================================================================

    /// Number of variables in this scope and its ancestors.
    pub fn len(&self, scope: ScopeId) -> u32 {
        self.tree.get(scope).chain_len()
    }

    pub fn is_empty(&self, scope: ScopeId) -> bool {
        self.len(scope) == 0
    }

    pub fn argument_count(&self, scope: ScopeId) -> u32 {
        self.tree
            .chain(scope)
            .map(|s| self.tree.get(s).argument_count)
            .sum()
    }

    pub fn local_count(&self, scope: ScopeId) -> u32 {
        self.tree
            .chain(scope)
            .map(|s| self.tree.get(s).local_count)
            .sum()
    }

    /// The furthest declaration phase reached anywhere in the chain.
    pub fn phase(&self, scope: ScopeId) -> DeclPhase {
        self.tree
            .chain(scope)
            .map(|s| self.tree.get(s).phase)
            .max()
            .unwrap_or_default()
    }

    /// Slot of the first variable this scope allocates.
    pub fn base_offset(&self, scope: ScopeId) -> u32 {
        self.tree.get(scope).base_offset
    }

    /// Next free slot in this scope.
    pub fn next_offset(&self, scope: ScopeId) -> u32 {
        self.tree.get(scope).next_offset
    }

    /// Number of slots needed to hold every scope's variables (`max_locals`).
    pub fn max_slots(&self) -> u32 {
        self.max_slots
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kode_core::ClassRef;

    fn table() -> VariableTable {
        VariableTable::new(Some("method"))
    }

    fn string() -> JvmType {
        ClassRef::string().into()
    }

    #[test]
    fn receiver_takes_slot_zero() {
        let mut vars = table();
        let root = vars.root();
        let this = vars.add_receiver(root, string()).unwrap();

        assert_eq!(this.offset, 0);
        assert_eq!(this.kind, VarKind::Receiver);
        assert_eq!(this.scope, root);
        assert!(this.name.is_none());
        assert!(vars.has_receiver(root));
    }

    #[test]
    fn receiver_twice_fails() {
        let mut vars = table();
        let root = vars.root();
        vars.add_receiver(root, string()).unwrap();

        assert!(matches!(
            vars.add_receiver(root, string()),
            Err(ScopeError::InvalidDeclarationOrder { .. })
        ));
    }

    #[test]
    fn receiver_after_argument_fails() {
        let mut vars = table();
        let root = vars.root();
        vars.add_argument(root, JvmType::Int, None).unwrap();

        assert!(matches!(
            vars.add_receiver(root, string()),
            Err(ScopeError::InvalidDeclarationOrder { .. })
        ));
    }

    #[test]
    fn receiver_from_parent_blocks_child_receiver() {
        let mut vars = table();
        let root = vars.root();
        vars.add_receiver(root, string()).unwrap();
        let child = vars.create_child(root, Some("block")).unwrap();

        assert!(matches!(
            vars.add_receiver(child, string()),
            Err(ScopeError::InvalidDeclarationOrder { .. })
        ));
    }

    #[test]
    fn receiver_after_parent_local_fails() {
        let mut vars = table();
        let root = vars.root();
        vars.add_local(root, JvmType::Int, None).unwrap();
        let child = vars.create_child(root, None).unwrap();

        assert!(matches!(
            vars.add_receiver(child, string()),
            Err(ScopeError::InvalidDeclarationOrder { .. })
        ));
    }

    #[test]
    fn arguments_follow_receiver() {
        let mut vars = table();
        let root = vars.root();
        vars.add_receiver(root, string()).unwrap();
        let a = vars.add_argument(root, JvmType::Long, Some("a")).unwrap();
        let b = vars.add_argument(root, JvmType::Int, Some("b")).unwrap();

        assert_eq!(a.offset, 1);
        assert_eq!(b.offset, 3);
        assert_eq!(vars.argument_count(root), 2);
        assert!(vars.has_argument(root, "a"));
        assert!(!vars.has_local(root, "a"));
    }

    #[test]
    fn argument_after_local_fails() {
        let mut vars = table();
        let root = vars.root();
        vars.add_local(root, JvmType::Int, Some("x")).unwrap();

        assert!(matches!(
            vars.add_argument(root, JvmType::Int, Some("y")),
            Err(ScopeError::InvalidDeclarationOrder { .. })
        ));
    }

    #[test]
    fn argument_after_parent_local_fails() {
        let mut vars = table();
        let root = vars.root();
        vars.add_local(root, JvmType::Int, Some("x")).unwrap();
        let child = vars.create_child(root, None).unwrap();

        assert!(matches!(
            vars.add_argument(child, JvmType::Int, Some("y")),
            Err(ScopeError::InvalidDeclarationOrder { .. })
        ));
    }

    #[test]
    fn offsets_have_no_gaps() {
        let mut vars = table();
        let root = vars.root();
        let types = [
            JvmType::Int,
            JvmType::Double,
            string(),
            JvmType::Long,
            JvmType::Boolean,
        ];
        let declared: Vec<_> = types
            .iter()
            .map(|ty| vars.add_local(root, ty.clone(), None).unwrap())
            .collect();

        for pair in declared.windows(2) {
            assert_eq!(pair[0].offset + pair[0].ty.slot_width(), pair[1].offset);
        }
        assert_eq!(vars.next_offset(root), 7);
        assert_eq!(vars.max_slots(), 7);
    }

    #[test]
    fn duplicate_name_fails_across_chain() {
        let mut vars = table();
        let root = vars.root();
        vars.add_argument(root, JvmType::Int, Some("x")).unwrap();
        let child = vars.create_child(root, None).unwrap();

        assert_eq!(
            vars.add_local(child, JvmType::Int, Some("x")),
            Err(ScopeError::DuplicateName {
                name: "x".into(),
                scope: "method/0".into(),
            })
        );
    }

    #[test]
    fn unnamed_variables_never_clash() {
        let mut vars = table();
        let root = vars.root();
        vars.add_local(root, JvmType::Int, None).unwrap();
        assert!(vars.add_local(root, JvmType::Int, None).is_ok());
    }

    #[test]
    fn child_allocates_after_parent() {
        let mut vars = table();
        let root = vars.root();
        vars.add_receiver(root, string()).unwrap();
        vars.add_argument(root, JvmType::Double, Some("d")).unwrap();

        let child = vars.create_child(root, Some("block")).unwrap();
        assert_eq!(vars.base_offset(child), 3);
        let x = vars.add_local(child, JvmType::Int, Some("x")).unwrap();
        assert_eq!(x.offset, 3);
        assert_eq!(x.scope, child);
    }

    #[test]
    fn siblings_reuse_slots() {
        let mut vars = table();
        let root = vars.root();
        vars.add_local(root, JvmType::Int, Some("i")).unwrap();

        let first = vars.create_child(root, None).unwrap();
        let a = vars.add_local(first, JvmType::Long, Some("a")).unwrap();
        vars.close(first).unwrap();

        let second = vars.create_child(root, None).unwrap();
        let b = vars.add_local(second, JvmType::Int, Some("a")).unwrap();
        vars.close(second).unwrap();

        assert_eq!(a.offset, b.offset);
        assert_eq!(vars.max_slots(), 3);
    }

    #[test]
    fn parent_is_frozen_while_child_open() {
        let mut vars = table();
        let root = vars.root();
        let child = vars.create_child(root, None).unwrap();

        assert!(matches!(
            vars.add_local(root, JvmType::Int, None),
            Err(ScopeError::ScopeHasOpenChildren { .. })
        ));
        vars.close(child).unwrap();
        assert!(vars.add_local(root, JvmType::Int, None).is_ok());
    }

    #[test]
    fn lookup_by_name_walks_ancestors() {
        let mut vars = table();
        let root = vars.root();
        let arg = vars.add_argument(root, JvmType::Int, Some("n")).unwrap();
        let child = vars.create_child(root, None).unwrap();

        assert_eq!(vars.lookup_by_name(child, "n"), Ok(&arg));
        assert!(matches!(
            vars.lookup_by_name(child, "missing"),
            Err(ScopeError::NameNotFound { .. })
        ));
    }

    #[test]
    fn lookup_by_index_counts_variables_not_slots() {
        let mut vars = table();
        let root = vars.root();
        vars.add_receiver(root, string()).unwrap();
        vars.add_argument(root, JvmType::Long, Some("l")).unwrap();
        let child = vars.create_child(root, None).unwrap();
        let y = vars.add_local(child, JvmType::Int, Some("y")).unwrap();

        assert_eq!(vars.lookup_by_index(child, 2), Ok(&y));
        assert_eq!(vars.lookup_by_index(child, 1).unwrap().offset, 1);
        assert_eq!(vars.lookup_by_index(child, 0).unwrap().kind, VarKind::Receiver);
        assert_eq!(
            vars.lookup_by_index(child, 3),
            Err(ScopeError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn lookups_on_closed_scope_fail() {
        let mut vars = table();
        let root = vars.root();
        let child = vars.create_child(root, None).unwrap();
        vars.add_local(child, JvmType::Int, Some("x")).unwrap();
        vars.close(child).unwrap();

        assert!(matches!(
            vars.lookup_by_name(child, "x"),
            Err(ScopeError::ScopeClosed { .. })
        ));
        assert!(matches!(
            vars.add_local(child, JvmType::Int, None),
            Err(ScopeError::ScopeClosed { .. })
        ));
    }

    #[test]
    fn argument_and_local_indices() {
        let mut vars = table();
        let root = vars.root();
        vars.add_receiver(root, string()).unwrap();
        vars.add_argument(root, JvmType::Int, Some("a")).unwrap();
        vars.add_argument(root, JvmType::Int, Some("b")).unwrap();
        let child = vars.create_child(root, None).unwrap();
        vars.add_local(child, JvmType::Int, Some("c")).unwrap();

        assert_eq!(vars.argument(child, 1).unwrap().name.as_deref(), Some("b"));
        assert_eq!(vars.local(child, 0).unwrap().name.as_deref(), Some("c"));
        assert_eq!(
            vars.local(child, 1),
            Err(ScopeError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(vars.receiver(child).unwrap().offset, 0);
        assert_eq!(vars.phase(child), DeclPhase::HasLocals);
        assert_eq!(vars.phase(root), DeclPhase::HasArguments);
    }

    #[test]
    fn display() {
        let mut vars = table();
        let root = vars.root();
        let x = vars.add_local(root, JvmType::Long, Some("x")).unwrap();
        assert_eq!(x.to_string(), "x@0 : long");
    }
}
