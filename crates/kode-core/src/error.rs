//! Unified error types for kode.
//!
//! ## Error Hierarchy
//!
//! ```text
//! KodeError (top-level wrapper)
//! ├── ScopeError  - Scope lifecycle, declaration order and lookup errors
//! └── BuildError  - Class/method builder errors (wraps ScopeError)
//! ```
//!
//! Every error here is a usage error made by the code-emission layer. None of
//! them are recoverable: building of the current class is aborted.

use thiserror::Error;

// ============================================================================
// Scope Errors
// ============================================================================

/// Errors raised by scope trees, variable tables and name allocators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// An operation was attempted on a scope that was already closed.
    #[error("scope '{scope}' is closed")]
    ScopeClosed {
        /// Full name of the closed scope.
        scope: String,
    },

    /// A scope was used or closed while some of its children are still open.
    #[error("scope '{scope}' cannot be used, it has open child scopes: {}", .open.join(", "))]
    ScopeHasOpenChildren {
        /// Full name of the scope.
        scope: String,
        /// Full names of (some of) the open descendants.
        open: Vec<String>,
    },

    /// A receiver, argument or local was declared out of order.
    #[error("invalid declaration order in scope '{scope}': {detail}")]
    InvalidDeclarationOrder {
        /// Full name of the scope.
        scope: String,
        /// What was wrong.
        detail: String,
    },

    /// A named variable was declared twice in the same lexical chain.
    #[error("a variable named '{name}' already exists in scope '{scope}'")]
    DuplicateName { name: String, scope: String },

    /// A name lookup exhausted the ancestor chain.
    #[error("no variable named '{name}' in scope '{scope}'")]
    NameNotFound { name: String, scope: String },

    /// An index lookup fell outside the variables of the chain.
    #[error("variable index {index} is out of range (0..{len})")]
    IndexOutOfRange { index: u32, len: u32 },
}

impl ScopeError {
    /// Name of the scope this error was raised for, if it names one.
    pub fn scope(&self) -> Option<&str> {
        match self {
            ScopeError::ScopeClosed { scope } => Some(scope),
            ScopeError::ScopeHasOpenChildren { scope, .. } => Some(scope),
            ScopeError::InvalidDeclarationOrder { scope, .. } => Some(scope),
            ScopeError::DuplicateName { scope, .. } => Some(scope),
            ScopeError::NameNotFound { scope, .. } => Some(scope),
            ScopeError::IndexOutOfRange { .. } => None,
        }
    }
}

// ============================================================================
// Build Errors
// ============================================================================

/// Errors raised by the class and method builders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A scoping error surfaced while building.
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// `begin_code` was called twice on the same method.
    #[error("method '{method}' already has a body")]
    BodyAlreadyStarted { method: String },

    /// A method was finished while its body block is still open.
    #[error("method '{method}' cannot be finished while its body is open")]
    OpenBody { method: String },

    /// A block handle does not belong to this method builder.
    #[error("unknown block #{block}")]
    UnknownBlock { block: u32 },

    /// A field or method was declared twice in the same class.
    #[error("class '{class}' already declares a member named '{name}'")]
    DuplicateMember { class: String, name: String },

    /// A label was placed more than once.
    #[error("label '{label}' has already been placed")]
    LabelAlreadyPlaced { label: String },
}

// ============================================================================
// Top-level Error
// ============================================================================

/// Top-level error for all kode operations.
///
/// ```ignore
/// use kode_core::KodeError;
///
/// fn compile() -> Result<(), KodeError> {
///     let body = method.begin_code()?; // BuildError -> KodeError
///     vars.add_local(scope, ty, None)?; // ScopeError -> KodeError
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KodeError {
    /// A scoping error.
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// A builder error.
    #[error(transparent)]
    Build(#[from] BuildError),
}
