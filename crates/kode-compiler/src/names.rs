//! Fresh-name allocation.
//!
//! [`NameAllocator`] mints identifiers for synthetic things (lambdas, labels,
//! bridge methods, temporaries) that never collide with names issued before or
//! with names registered through [`NameAllocator::put`].
//!
//! Names are built from a base name and a numeric suffix: `foo`, `foo1`,
//! `foo2`, ... Index 0 has no suffix. Every scope remembers the highest index
//! it issued per base name, and a set of names it knows exist but has not
//! issued itself. Lookups walk the ancestor chain, so a nested scope never
//! reissues a name its ancestors issued or know about. Sibling scopes do not
//! see each other's names.

use kode_core::ScopeError;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::scope::{ScopeId, ScopeTree};

/// Base name used when no usable hint is given.
pub const FALLBACK_BASE_NAME: &str = "x";

/// Per-scope state of a [`NameAllocator`].
#[derive(Debug, Default)]
struct NameFrame {
    /// Highest index issued per base name. Every lower index is taken too.
    indices: FxHashMap<String, u64>,
    /// Full names registered with `put` whose index is ahead of `indices`.
    ///
    /// When `get` reaches such a name, it is skipped and forgotten.
    known: FxHashSet<String>,
}

/// Split a name into its base and its trailing run of ASCII digits.
fn split_suffix(name: &str) -> (&str, &str) {
    let base = name.trim_end_matches(|c: char| c.is_ascii_digit());
    (base, &name[base.len()..])
}

/// The base name of a hint: the hint without its numeric suffix.
///
/// A missing, empty or all-digit hint gives [`FALLBACK_BASE_NAME`].
pub fn base_name_of(hint: Option<&str>) -> &str {
    match hint.map(|h| split_suffix(h).0) {
        Some(base) if !base.is_empty() => base,
        _ => FALLBACK_BASE_NAME,
    }
}

fn compose(base: &str, index: u64) -> String {
    if index > 0 {
        format!("{base}{index}")
    } else {
        base.to_string()
    }
}

/// Issues collision-free names, organised by lexical scope.
#[derive(Debug)]
pub struct NameAllocator {
    tree: ScopeTree<NameFrame>,
}

impl NameAllocator {
    /// Create an allocator with an empty root scope.
    pub fn new(label: Option<&str>) -> Self {
        Self {
            tree: ScopeTree::new(label, NameFrame::default()),
        }
    }

    pub fn root(&self) -> ScopeId {
        self.tree.root()
    }

    /// Open a nested scope. Names issued or registered in it stay invisible
    /// to its parent and siblings.
    pub fn create_child(
        &mut self,
        scope: ScopeId,
        label: Option<&str>,
    ) -> Result<ScopeId, ScopeError> {
        self.tree.create_child(scope, label, NameFrame::default())
    }

    /// Close a scope. See [`ScopeTree::close`].
    pub fn close(&mut self, scope: ScopeId) -> Result<bool, ScopeError> {
        self.tree.close(scope)
    }

    pub fn is_closed(&self, scope: ScopeId) -> bool {
        self.tree.is_closed(scope)
    }

    /// Get a fresh name derived from `hint`.
    ///
    /// Only the base of the hint is used: `foo007` gives `foo`, `foo1`, ...
    /// With no hint the base is [`FALLBACK_BASE_NAME`].
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn get(&mut self, scope: ScopeId, hint: Option<&str>) -> Result<String, ScopeError> {
        self.tree.check_usable(scope)?;
        let base = base_name_of(hint);

        let mut index = self
            .current_index(scope, base)
            .map_or(0, |i| i.saturating_add(1));
        let mut name = compose(base, index);

        while self.is_known(scope, &name) {
            // Ancestors are frozen while this scope is open; only forget it here.
            self.tree.get_mut(scope).known.remove(&name);
            index += 1;
            name = compose(base, index);
        }

        self.tree
            .get_mut(scope)
            .indices
            .insert(base.to_string(), index);
        trace!(scope = %scope, %name, "issued name");
        Ok(name)
    }

    /// Register a name that exists outside this allocator, so it is never issued.
    ///
    /// Names `get` could never produce are ignored: all-digit names, and names
    /// whose suffix has a leading zero (`foo0`, `foo007`).
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn put(&mut self, scope: ScopeId, name: &str) -> Result<(), ScopeError> {
        self.tree.check_usable(scope)?;
        let (base, digits) = split_suffix(name);
        if base.is_empty() || digits.starts_with('0') {
            return Ok(());
        }

        let current = self.current_index(scope, base);
        let index = if digits.is_empty() {
            0
        } else {
            match digits.parse::<u64>() {
                Ok(index) => index,
                Err(_) => {
                    // Beyond any index we will ever reach.
                    self.tree.get_mut(scope).known.insert(name.to_string());
                    return Ok(());
                }
            }
        };

        let next = current.map_or(0, |i| i.saturating_add(1));
        if index == next {
            self.tree
                .get_mut(scope)
                .indices
                .insert(base.to_string(), index);
        } else if current.is_none_or(|c| index > c) {
            self.tree.get_mut(scope).known.insert(name.to_string());
        }
        Ok(())
    }

    /// The highest index issued for `base` in this scope or its closest
    /// ancestor that issued one.
    pub fn current_index(&self, scope: ScopeId, base: &str) -> Option<u64> {
        self.tree
            .chain(scope)
            .find_map(|s| self.tree.get(s).indices.get(base).copied())
    }

    fn is_known(&self, scope: ScopeId, name: &str) -> bool {
        self.tree
            .chain(scope)
            .any(|s| self.tree.get(s).known.contains(name))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn allocator() -> NameAllocator {
        NameAllocator::new(Some("root"))
    }

    fn get_n(names: &mut NameAllocator, scope: ScopeId, hint: Option<&str>, n: usize) -> Vec<String> {
        (0..n).map(|_| names.get(scope, hint).unwrap()).collect()
    }

    #[test]
    fn base_names() {
        assert_eq!(base_name_of(Some("foo")), "foo");
        assert_eq!(base_name_of(Some("foo12")), "foo");
        assert_eq!(base_name_of(Some("f1o2")), "f1o");
        assert_eq!(base_name_of(Some("123")), "x");
        assert_eq!(base_name_of(Some("")), "x");
        assert_eq!(base_name_of(None), "x");
    }

    #[test]
    fn increasing_index() {
        let mut names = allocator();
        let root = names.root();
        assert_eq!(
            get_n(&mut names, root, Some("foo"), 4),
            ["foo", "foo1", "foo2", "foo3"]
        );
    }

    #[test]
    fn no_hint_uses_x() {
        let mut names = allocator();
        let root = names.root();
        assert_eq!(get_n(&mut names, root, None, 3), ["x", "x1", "x2"]);
        assert_eq!(names.get(root, Some("x")).unwrap(), "x3");
    }

    #[test]
    fn skips_known_names() {
        let mut names = allocator();
        let root = names.root();
        names.put(root, "foo2").unwrap();
        names.put(root, "foo4").unwrap();

        assert_eq!(
            get_n(&mut names, root, Some("foo"), 5),
            ["foo", "foo1", "foo3", "foo5", "foo6"]
        );
    }

    #[test]
    fn put_without_suffix_is_taken() {
        let mut names = allocator();
        let root = names.root();
        names.put(root, "foo").unwrap();
        assert_eq!(get_n(&mut names, root, Some("foo"), 2), ["foo1", "foo2"]);
    }

    #[test]
    fn put_next_index_fast_forwards() {
        let mut names = allocator();
        let root = names.root();
        get_n(&mut names, root, Some("foo"), 2);
        names.put(root, "foo2").unwrap();

        assert_eq!(names.current_index(root, "foo"), Some(2));
        assert_eq!(get_n(&mut names, root, Some("foo"), 2), ["foo3", "foo4"]);
    }

    #[test]
    fn put_of_issued_name_is_ignored() {
        let mut names = allocator();
        let root = names.root();
        get_n(&mut names, root, Some("foo"), 2);
        names.put(root, "foo").unwrap();
        names.put(root, "foo1").unwrap();

        assert_eq!(get_n(&mut names, root, Some("foo"), 2), ["foo2", "foo3"]);
    }

    #[test]
    fn leading_zeros_are_ignored() {
        let mut names = allocator();
        let root = names.root();
        names.put(root, "foo007").unwrap();
        names.put(root, "foo0").unwrap();
        names.put(root, "42").unwrap();

        assert_eq!(get_n(&mut names, root, Some("foo"), 2), ["foo", "foo1"]);
        assert_eq!(names.current_index(root, "x"), None);
    }

    #[test]
    fn hint_suffix_is_dropped() {
        let mut names = allocator();
        let root = names.root();
        assert_eq!(
            get_n(&mut names, root, Some("foo007"), 3),
            ["foo", "foo1", "foo2"]
        );
    }

    #[test]
    fn huge_suffix_is_known() {
        let mut names = allocator();
        let root = names.root();
        names.put(root, "foo99999999999999999999999").unwrap();
        assert_eq!(names.get(root, Some("foo")).unwrap(), "foo");
    }

    #[test]
    fn child_continues_parent_indices() {
        let mut names = allocator();
        let root = names.root();
        get_n(&mut names, root, Some("foo"), 2);
        let child = names.create_child(root, Some("child")).unwrap();

        assert_eq!(get_n(&mut names, child, Some("foo"), 2), ["foo2", "foo3"]);
    }

    #[test]
    fn child_skips_parent_known_names() {
        let mut names = allocator();
        let root = names.root();
        names.put(root, "foo2").unwrap();
        names.put(root, "foo4").unwrap();
        let child = names.create_child(root, Some("child")).unwrap();

        assert_eq!(
            get_n(&mut names, child, Some("foo"), 5),
            ["foo", "foo1", "foo3", "foo5", "foo6"]
        );
    }

    #[test]
    fn parent_keeps_known_names_after_child() {
        let mut names = allocator();
        let root = names.root();
        names.put(root, "foo1").unwrap();
        names.put(root, "foo2").unwrap();

        let child = names.create_child(root, None).unwrap();
        assert_eq!(get_n(&mut names, child, Some("foo"), 2), ["foo", "foo3"]);
        names.close(child).unwrap();

        let sibling = names.create_child(root, None).unwrap();
        assert_eq!(get_n(&mut names, sibling, Some("foo"), 2), ["foo", "foo3"]);
    }

    #[test]
    fn child_names_are_invisible_to_parent() {
        let mut names = allocator();
        let root = names.root();
        let child = names.create_child(root, None).unwrap();
        names.put(child, "foo1").unwrap();
        get_n(&mut names, child, Some("bar"), 3);
        names.close(child).unwrap();

        assert_eq!(get_n(&mut names, root, Some("foo"), 2), ["foo", "foo1"]);
        assert_eq!(names.get(root, Some("bar")).unwrap(), "bar");
    }

    #[test]
    fn get_fails_while_child_open() {
        let mut names = allocator();
        let root = names.root();
        let child = names.create_child(root, Some("child")).unwrap();

        assert!(matches!(
            names.get(root, Some("foo")),
            Err(ScopeError::ScopeHasOpenChildren { .. })
        ));
        assert!(matches!(
            names.put(root, "foo"),
            Err(ScopeError::ScopeHasOpenChildren { .. })
        ));

        names.close(child).unwrap();
        assert!(names.get(root, Some("foo")).is_ok());
        assert!(names.put(root, "bar").is_ok());
    }

    #[test]
    fn closed_allocator_is_unusable() {
        let mut names = allocator();
        let root = names.root();
        names.close(root).unwrap();

        assert!(matches!(
            names.get(root, None),
            Err(ScopeError::ScopeClosed { .. })
        ));
    }
}
