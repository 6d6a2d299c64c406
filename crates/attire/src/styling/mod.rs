//! Styling systems: named bundles of class rules for element scopes.
//!
//! This module provides the styling primitives:
//!
//! - [`StylingSystem`]: base/variant/override class rules, optionally
//!   extending a parent system
//! - [`StylingRegistry`]: the caller-owned collection systems are looked
//!   up in (dependency injection; the compiler never owns a shared cache)
//!
//! Class computation lives in [`apply`](crate::styling::apply).

mod apply;

pub use apply::{compute_class, expand_stack, ClassContribution, ClassOutcome, ClassSource, Overlap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A named bundle of class rules for element scopes.
///
/// Scope keys are element kind keys, full element paths, or `"*"`. Rules:
///
/// - `base`: classes applied to every element matching the scope
/// - `variants`: classes applied when a resolved dimension property
///   (`variant`, `size`, `tone`) holds a given value
/// - `overrides`: classes replacing this system's base classes for a scope
/// - `properties`: design property contributions merged under the
///   hierarchy tiers
/// - `options` / `component_options`: option values consulted by the
///   configuration precedence resolver
///
/// # Example
///
/// ```rust
/// use attire::StylingSystem;
///
/// let system = StylingSystem::new("base-kit")
///     .base("button", "btn")
///     .variant("button", "variant", "primary", "btn-primary")
///     .override_for("link", "plain-link");
/// assert_eq!(system.name, "base-kit");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StylingSystem {
    pub name: String,
    /// Name of the system this one extends, if any.
    #[serde(default)]
    pub extends: Option<String>,
    /// Scope key to space-separated base classes.
    #[serde(default)]
    pub base: HashMap<String, String>,
    /// Scope key to dimension to value to space-separated classes.
    #[serde(default)]
    pub variants: HashMap<String, HashMap<String, HashMap<String, String>>>,
    /// Scope key to classes replacing this system's base for the scope.
    #[serde(default)]
    pub overrides: HashMap<String, String>,
    /// Scope key to design properties contributed by this system.
    #[serde(default)]
    pub properties: HashMap<String, Map<String, Value>>,
    /// System-global option values.
    #[serde(default)]
    pub options: Map<String, Value>,
    /// Scope key to component-specific option values.
    #[serde(default)]
    pub component_options: HashMap<String, Map<String, Value>>,
}

impl StylingSystem {
    /// Creates an empty system with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Declares the parent system this one extends.
    pub fn extends(mut self, parent: &str) -> Self {
        self.extends = Some(parent.to_string());
        self
    }

    /// Sets base classes for a scope.
    pub fn base(mut self, scope: &str, classes: &str) -> Self {
        self.base.insert(scope.to_string(), classes.to_string());
        self
    }

    /// Sets variant classes for a scope, dimension, and value.
    pub fn variant(mut self, scope: &str, dimension: &str, value: &str, classes: &str) -> Self {
        self.variants
            .entry(scope.to_string())
            .or_default()
            .entry(dimension.to_string())
            .or_default()
            .insert(value.to_string(), classes.to_string());
        self
    }

    /// Sets classes that replace this system's base classes for a scope.
    pub fn override_for(mut self, scope: &str, classes: &str) -> Self {
        self.overrides.insert(scope.to_string(), classes.to_string());
        self
    }

    /// Contributes a design property for a scope.
    pub fn property(mut self, scope: &str, key: &str, value: impl Into<Value>) -> Self {
        self.properties
            .entry(scope.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
        self
    }

    /// Sets a system-global option value.
    pub fn option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    /// Sets a component-specific option value for a scope.
    pub fn component_option(mut self, scope: &str, key: &str, value: impl Into<Value>) -> Self {
        self.component_options
            .entry(scope.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
        self
    }

    /// Ordered property contributions for an element, broadest scope first.
    pub fn scoped_properties(
        &self,
        kind_key: &str,
        path: &str,
    ) -> Vec<(&str, &Map<String, Value>)> {
        let mut out = Vec::new();
        for scope in ["*", kind_key, path] {
            if let Some((key, props)) = self.properties.get_key_value(scope) {
                out.push((key.as_str(), props));
            }
        }
        out
    }

    /// Ordered component-option contributions for an element.
    pub fn scoped_component_options(
        &self,
        kind_key: &str,
        path: &str,
    ) -> Vec<&Map<String, Value>> {
        let mut out = Vec::new();
        for scope in ["*", kind_key, path] {
            if let Some(options) = self.component_options.get(scope) {
                out.push(options);
            }
        }
        out
    }
}

/// Caller-owned registry of styling systems.
///
/// The compiler receives the registry by reference and treats it as an
/// immutable snapshot for the duration of one compile pass; invalidation
/// and reloading belong to the external configuration loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StylingRegistry {
    systems: HashMap<String, StylingSystem>,
}

impl StylingRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a system, returning the registry for chaining. Adding a system
    /// with an existing name replaces it.
    pub fn add(mut self, system: StylingSystem) -> Self {
        self.systems.insert(system.name.clone(), system);
        self
    }

    /// Looks up a system by name.
    pub fn get(&self, name: &str) -> Option<&StylingSystem> {
        self.systems.get(name)
    }

    /// Returns true if a system with the name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.systems.contains_key(name)
    }

    /// Number of registered systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns true if no systems are registered.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Iterates over registered system names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.systems.keys().map(|name| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let system = StylingSystem::new("kit")
            .extends("core")
            .base("button", "btn")
            .variant("button", "size", "lg", "btn-lg")
            .override_for("link", "plain")
            .property("button", "background", "$colors.primary")
            .option("dedupe-classes?", true)
            .component_option("button", "apply-base-when-explicit", false);

        assert_eq!(system.extends.as_deref(), Some("core"));
        assert_eq!(system.base.get("button").map(String::as_str), Some("btn"));
        assert_eq!(
            system.variants["button"]["size"]["lg"],
            "btn-lg".to_string()
        );
        assert_eq!(system.overrides.get("link").map(String::as_str), Some("plain"));
        assert_eq!(
            system.properties["button"].get("background"),
            Some(&json!("$colors.primary"))
        );
    }

    #[test]
    fn test_scoped_properties_order() {
        let system = StylingSystem::new("kit")
            .property("*", "color", "#000")
            .property("button", "color", "#111")
            .property("page/button[0]", "color", "#222");

        let scopes: Vec<&str> = system
            .scoped_properties("button", "page/button[0]")
            .iter()
            .map(|(scope, _)| *scope)
            .collect();
        assert_eq!(scopes, vec!["*", "button", "page/button[0]"]);
    }

    #[test]
    fn test_registry_add_and_get() {
        let registry = StylingRegistry::new()
            .add(StylingSystem::new("a"))
            .add(StylingSystem::new("b"));

        assert!(registry.contains("a"));
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_registry_replaces_same_name() {
        let registry = StylingRegistry::new()
            .add(StylingSystem::new("kit").base("button", "old"))
            .add(StylingSystem::new("kit").base("button", "new"));

        assert_eq!(registry.len(), 1);
        let system = registry.get("kit").unwrap();
        assert_eq!(system.base.get("button").map(String::as_str), Some("new"));
    }
}
