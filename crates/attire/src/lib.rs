//! Token-driven styling resolution for declarative UI element trees.
//!
//! `attire` compiles an element-description tree plus a project context —
//! hierarchy tiers, a design token registry, a stack of styling systems,
//! a platform profile, and options — into one deterministic attribute set
//! per element: a class list, a style attribute, and the fully resolved
//! properties. The output is consumed by an external platform emitter
//! (markup serializer, CSS writer, or page-builder tree builder).
//!
//! The pipeline per element:
//!
//! 1. [`hierarchy`]: five ordered inheritance tiers deep-merge into the
//!    element's properties, narrow over broad
//! 2. [`attire_tokens`]: `$namespace.path` references resolve to literals
//!    in a single pass
//! 3. [`styling`] and [`css`]: class list and style declarations are
//!    computed from the same resolved properties
//! 4. [`provenance`]: every write is recorded with its source and stage
//! 5. [`optimize`]: one whole-tree pass eliminates dead tokens, merges
//!    identical declaration blocks, and inlines frequent tokens
//!
//! # Example
//!
//! ```rust
//! use attire::{compile, Element, ElementKind, ProjectContext, StylingRegistry, StylingSystem};
//! use attire_tokens::TokenRegistry;
//!
//! let context = ProjectContext::new()
//!     .with_tokens(TokenRegistry::new().add("colors.primary", "#0af"))
//!     .with_styling(
//!         StylingRegistry::new().add(
//!             StylingSystem::new("kit")
//!                 .base("button", "btn")
//!                 .variant("button", "variant", "primary", "btn-primary"),
//!         ),
//!     )
//!     .with_system("kit");
//!
//! let tree = Element::new(ElementKind::Button)
//!     .prop("variant", "primary")
//!     .prop("background", "$colors.primary");
//!
//! let result = compile(&tree, &context).unwrap();
//! assert_eq!(result.root.class.as_deref(), Some("btn btn-primary"));
//! assert_eq!(result.root.style.as_deref(), Some("background:#0af;"));
//! ```
//!
//! Compilation is a pure fold: no I/O, no hidden mutation, and the same
//! inputs always produce the same output. Recoverable conditions degrade
//! to diagnostics reported in one batch; structural violations (unknown
//! styling systems, `extends` cycles) are fatal with full context.

pub mod compiler;
pub mod context;
pub mod css;
pub mod diagnostics;
pub mod element;
pub mod error;
pub mod hierarchy;
pub mod optimize;
pub mod precedence;
pub mod provenance;
pub mod styling;

pub use compiler::{compile, CompileResult, Compiler};
pub use context::{CompileOptions, EffectiveOptions, ProjectContext};
pub use css::{DeclarationMap, PlatformProfile};
pub use diagnostics::{Diagnostic, Diagnostics, Level};
pub use element::{CompiledElement, Element, ElementKind, ElementPath};
pub use error::CompileError;
pub use hierarchy::{HierarchyConfig, Tier};
pub use optimize::{optimize, CssRule, Optimized, OptimizeOptions};
pub use precedence::{PrecedenceContext, PrecedenceOrder, PrecedenceSource};
pub use provenance::{ProvenanceTracker, Stage};
pub use styling::{StylingRegistry, StylingSystem};
