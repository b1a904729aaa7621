//! Scope lifecycle management.
//!
//! A [`ScopeTree`] is an arena of scope nodes. Every node is either open or
//! closed, and may own any number of child nodes. The tree enforces two rules:
//! - a node with an open child cannot be used or closed
//! - a closed node is terminal: it is never reopened
//!
//! The variable table and the name allocator each keep their per-scope state
//! as the payload of a `ScopeTree`, and call [`ScopeTree::check_usable`] before
//! every mutation.

use std::collections::VecDeque;
use std::fmt;

use kode_core::ScopeError;
use tracing::debug;

/// Maximum number of open descendants listed in a `ScopeHasOpenChildren` error.
const MAX_LISTED_DESCENDANTS: usize = 10;

// ============================================================================
// ScopeId
// ============================================================================

/// Handle of a node within one [`ScopeTree`].
///
/// Ids are only meaningful for the tree that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The root node of every tree.
    pub const ROOT: ScopeId = ScopeId(0);

    /// Get the underlying index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope_{}", self.0)
    }
}

// ============================================================================
// ScopeTree
// ============================================================================

/// A single node of a [`ScopeTree`].
#[derive(Debug)]
struct ScopeNode<T> {
    /// Debug label, if any.
    label: Option<String>,
    /// Non-owning back-reference to the parent node.
    parent: Option<ScopeId>,
    /// Child nodes, in creation order. Closed children stay listed.
    children: Vec<ScopeId>,
    closed: bool,
    data: T,
}

/// An arena of nested scopes, each carrying a payload of type `T`.
///
/// The tree owns every node; nodes refer to their parent and children by
/// [`ScopeId`].
#[derive(Debug)]
pub struct ScopeTree<T> {
    nodes: Vec<ScopeNode<T>>,
}

impl<T> ScopeTree<T> {
    /// Create a tree holding a single open root node.
    pub fn new(label: Option<&str>, data: T) -> Self {
        Self {
            nodes: vec![ScopeNode {
                label: label.map(str::to_owned),
                parent: None,
                children: Vec::new(),
                closed: false,
                data,
            }],
        }
    }

    /// The root node.
    pub fn root(&self) -> ScopeId {
        ScopeId::ROOT
    }

    /// Number of nodes ever created in this tree, closed ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always has its root node.
    pub fn is_empty(&self) -> bool {
        false
    }

    // ==========================================================================
    // Lifecycle
    // ==========================================================================

    /// Create a child of `parent` carrying `data`.
    ///
    /// Fails with `ScopeClosed` if `parent` is closed.
    pub fn create_child(
        &mut self,
        parent: ScopeId,
        label: Option<&str>,
        data: T,
    ) -> Result<ScopeId, ScopeError> {
        self.check_open(parent)?;

        let id = ScopeId(self.nodes.len() as u32);
        self.nodes.push(ScopeNode {
            label: label.map(str::to_owned),
            parent: Some(parent),
            children: Vec::new(),
            closed: false,
            data,
        });
        self.node_mut(parent).children.push(id);

        debug!(scope = %self.full_name(id), "opened scope");
        Ok(id)
    }

    /// Close a node.
    ///
    /// Returns `Ok(true)` when the node transitioned from open to closed, and
    /// `Ok(false)` when it was already closed. Fails with `ScopeHasOpenChildren`
    /// while any child is still open.
    pub fn close(&mut self, id: ScopeId) -> Result<bool, ScopeError> {
        if self.is_closed(id) {
            return Ok(false);
        }
        self.check_childless(id)?;
        self.node_mut(id).closed = true;

        debug!(scope = %self.full_name(id), "closed scope");
        Ok(true)
    }

    /// Check that a node is not closed.
    pub fn check_open(&self, id: ScopeId) -> Result<(), ScopeError> {
        if self.is_closed(id) {
            return Err(ScopeError::ScopeClosed {
                scope: self.full_name(id),
            });
        }
        Ok(())
    }

    /// Check that a node can be mutated: it is open and has no open children.
    pub fn check_usable(&self, id: ScopeId) -> Result<(), ScopeError> {
        self.check_open(id)?;
        self.check_childless(id)
    }

    fn check_childless(&self, id: ScopeId) -> Result<(), ScopeError> {
        if self.open_children(id).next().is_none() {
            return Ok(());
        }
        Err(ScopeError::ScopeHasOpenChildren {
            scope: self.full_name(id),
            open: self
                .open_descendants(id)
                .take(MAX_LISTED_DESCENDANTS)
                .map(|d| self.full_name(d))
                .collect(),
        })
    }

    // ==========================================================================
    // Structure
    // ==========================================================================

    pub fn is_closed(&self, id: ScopeId) -> bool {
        self.node(id).closed
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.node(id).parent
    }

    /// The ancestors of a node, closest (parent) first.
    pub fn ancestors(&self, id: ScopeId) -> Ancestors<'_, T> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// The node itself followed by its ancestors.
    pub fn chain(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::once(id).chain(self.ancestors(id))
    }

    /// The children of a node that are still open.
    pub fn open_children(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        self.node(id)
            .children
            .iter()
            .copied()
            .filter(|&c| !self.is_closed(c))
    }

    /// Open descendants in breadth-first order.
    fn open_descendants(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        let mut queue: VecDeque<ScopeId> = self.open_children(id).collect();
        std::iter::from_fn(move || {
            let next = queue.pop_front()?;
            queue.extend(self.open_children(next));
            Some(next)
        })
    }

    pub fn label(&self, id: ScopeId) -> Option<&str> {
        self.node(id).label.as_deref()
    }

    /// The label of a node, or its position among its siblings, or `root`.
    pub fn debug_name(&self, id: ScopeId) -> String {
        let node = self.node(id);
        if let Some(label) = &node.label {
            return label.clone();
        }
        match node.parent {
            Some(parent) => self
                .node(parent)
                .children
                .iter()
                .position(|&c| c == id)
                .map(|i| i.to_string())
                .unwrap_or_default(),
            None => "root".to_string(),
        }
    }

    /// Slash-separated debug names from the root down to this node.
    pub fn full_name(&self, id: ScopeId) -> String {
        let mut names: Vec<String> = self.chain(id).map(|s| self.debug_name(s)).collect();
        names.reverse();
        names.join("/")
    }

    // ==========================================================================
    // Payload
    // ==========================================================================

    pub fn get(&self, id: ScopeId) -> &T {
        &self.node(id).data
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut T {
        &mut self.node_mut(id).data
    }

    /// # Panics
    ///
    /// Panics if `id` was not created by this tree.
    fn node(&self, id: ScopeId) -> &ScopeNode<T> {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: ScopeId) -> &mut ScopeNode<T> {
        &mut self.nodes[id.0 as usize]
    }
}

/// Iterator over the ancestors of a scope. See [`ScopeTree::ancestors`].
pub struct Ancestors<'a, T> {
    tree: &'a ScopeTree<T>,
    next: Option<ScopeId>,
}

impl<T> Iterator for Ancestors<'_, T> {
    type Item = ScopeId;

    fn next(&mut self) -> Option<ScopeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

// ============================================================================
// Tests
// ============================================================================
