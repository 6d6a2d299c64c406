//! Token registry: a namespaced tree of literal design values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// A namespaced registry mapping token paths to literal values.
///
/// The registry is a tree: intermediate segments are namespaces, leaves are
/// literal values. It is loaded once per project context and treated as an
/// immutable snapshot for the duration of one compile pass.
///
/// # Example
///
/// ```rust
/// use attire_tokens::TokenRegistry;
/// use serde_json::json;
///
/// let registry = TokenRegistry::new()
///     .add("colors.primary", "#0af")
///     .add("colors.surface.raised", "#fff")
///     .add("spacing.md", "1rem");
///
/// assert_eq!(registry.lookup("colors.primary"), Some(&json!("#0af")));
/// assert!(registry.lookup("colors.missing").is_none());
/// assert_eq!(registry.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenRegistry {
    root: Map<String, Value>,
}

impl TokenRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from a nested JSON object.
    ///
    /// Returns `None` if the value is not an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(root) => Some(Self { root }),
            _ => None,
        }
    }

    /// Adds a token at a dot-separated path, returning the updated registry
    /// for chaining.
    ///
    /// Intermediate namespaces are created as needed. Adding to an existing
    /// path replaces the previous value.
    pub fn add(mut self, path: &str, value: impl Into<Value>) -> Self {
        let mut current = &mut self.root;
        let segments: Vec<&str> = path.split('.').collect();
        let (last, namespaces) = match segments.split_last() {
            Some(split) => split,
            None => return self,
        };

        for segment in namespaces {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry {
                Value::Object(map) => map,
                _ => return self,
            };
        }

        current.insert(last.to_string(), value.into());
        self
    }

    /// Looks up a token by dot-separated path.
    ///
    /// Returns `None` if any segment is missing or if the path terminates
    /// in a namespace rather than walking through one.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut current: Option<&Value> = None;
        for segment in path.split('.') {
            current = match current {
                None => self.root.get(segment),
                Some(Value::Object(map)) => map.get(segment),
                Some(_) => return None,
            };
            current?;
        }
        current
    }

    /// Returns true if the path resolves to a value.
    pub fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// Returns the dot-separated paths of all leaf values, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut out = BTreeSet::new();
        collect_leaf_paths(&self.root, String::new(), &mut out);
        out.into_iter().collect()
    }

    /// Number of leaf values in the registry.
    pub fn len(&self) -> usize {
        self.paths().len()
    }

    /// Returns true if the registry holds no values.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Builds a new registry containing only the leaves whose path satisfies
    /// the predicate. The source registry is left untouched.
    pub fn retain_paths<F>(&self, mut keep: F) -> TokenRegistry
    where
        F: FnMut(&str) -> bool,
    {
        let mut reduced = TokenRegistry::new();
        for path in self.paths() {
            if keep(&path) {
                if let Some(value) = self.lookup(&path) {
                    reduced = reduced.add(&path, value.clone());
                }
            }
        }
        reduced
    }

    /// Returns the underlying tree.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }
}

fn collect_leaf_paths(map: &Map<String, Value>, prefix: String, out: &mut BTreeSet<String>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(nested) => collect_leaf_paths(nested, path, out),
            _ => {
                out.insert(path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_and_lookup() {
        let registry = TokenRegistry::new()
            .add("colors.primary", "#0af")
            .add("spacing.md", "1rem");

        assert_eq!(registry.lookup("colors.primary"), Some(&json!("#0af")));
        assert_eq!(registry.lookup("spacing.md"), Some(&json!("1rem")));
    }

    #[test]
    fn test_lookup_missing_segment() {
        let registry = TokenRegistry::new().add("colors.primary", "#0af");

        assert!(registry.lookup("colors.secondary").is_none());
        assert!(registry.lookup("typography.body").is_none());
    }

    #[test]
    fn test_lookup_through_leaf_fails() {
        let registry = TokenRegistry::new().add("colors.primary", "#0af");
        assert!(registry.lookup("colors.primary.500").is_none());
    }

    #[test]
    fn test_lookup_namespace_returns_subtree() {
        let registry = TokenRegistry::new()
            .add("colors.surface.raised", "#fff")
            .add("colors.surface.sunken", "#eee");

        let subtree = registry.lookup("colors.surface").unwrap();
        assert!(subtree.is_object());
    }

    #[test]
    fn test_add_replaces_existing() {
        let registry = TokenRegistry::new()
            .add("colors.primary", "#0af")
            .add("colors.primary", "#f00");

        assert_eq!(registry.lookup("colors.primary"), Some(&json!("#f00")));
    }

    #[test]
    fn test_non_string_literals() {
        let registry = TokenRegistry::new()
            .add("layout.columns", 12)
            .add("flags.rounded", true);

        assert_eq!(registry.lookup("layout.columns"), Some(&json!(12)));
        assert_eq!(registry.lookup("flags.rounded"), Some(&json!(true)));
    }

    #[test]
    fn test_paths_sorted_leaves() {
        let registry = TokenRegistry::new()
            .add("spacing.md", "1rem")
            .add("colors.surface.raised", "#fff")
            .add("colors.primary", "#0af");

        assert_eq!(
            registry.paths(),
            vec!["colors.primary", "colors.surface.raised", "spacing.md"]
        );
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_retain_paths_does_not_mutate_source() {
        let registry = TokenRegistry::new()
            .add("colors.primary", "#0af")
            .add("colors.unused", "#000");

        let reduced = registry.retain_paths(|path| path == "colors.primary");

        assert_eq!(reduced.paths(), vec!["colors.primary"]);
        assert_eq!(registry.len(), 2, "source registry must be untouched");
    }

    #[test]
    fn test_from_value() {
        let registry =
            TokenRegistry::from_value(json!({ "colors": { "primary": "#0af" } })).unwrap();
        assert_eq!(registry.lookup("colors.primary"), Some(&json!("#0af")));

        assert!(TokenRegistry::from_value(json!("not a tree")).is_none());
    }

    #[test]
    fn test_empty() {
        let registry = TokenRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }
}
