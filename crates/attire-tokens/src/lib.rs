//! Design token registry and single-pass reference resolution.
//!
//! This crate provides the token layer used by the `attire` compiler:
//!
//! - [`TokenRegistry`]: a namespaced tree of literal design values
//! - [`TokenRef`]: the `$namespace.path || fallback` reference syntax
//! - [`resolve_value`]: single-pass substitution over a property tree
//! - [`TokenUsage`]: whole-project usage accounting for the optimizer
//!
//! Resolution is deliberately single-pass: a resolved value that begins
//! with `$` is never re-resolved, so token chains cannot recurse. Aliasing
//! is a non-goal of the token model.
//!
//! # Example
//!
//! ```rust
//! use attire_tokens::{resolve_value, MissingTokenPolicy, TokenRegistry, TokenUsage};
//! use serde_json::json;
//!
//! let registry = TokenRegistry::new()
//!     .add("colors.primary", "#0af")
//!     .add("spacing.md", "1rem");
//!
//! let mut usage = TokenUsage::default();
//! let resolution = resolve_value(
//!     &json!({ "background": "$colors.primary", "padding": "$spacing.md" }),
//!     &registry,
//!     MissingTokenPolicy::WarnRemove,
//!     &mut usage,
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     resolution.value,
//!     Some(json!({ "background": "#0af", "padding": "1rem" }))
//! );
//! assert_eq!(usage.count("colors.primary"), 1);
//! ```

mod reference;
mod registry;
mod resolve;

pub use reference::TokenRef;
pub use registry::TokenRegistry;
pub use resolve::{
    resolve_value, MissingTokenPolicy, Resolution, Substitution, TokenError, TokenUsage,
    TokenWarning,
};
