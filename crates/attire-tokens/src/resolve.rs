//! Single-pass token resolution over property trees.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use crate::reference::TokenRef;
use crate::registry::TokenRegistry;

/// What to do when a reference's primary path is missing from the registry
/// and no `|| fallback` was given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingTokenPolicy {
    /// Drop the property and record a warning.
    #[default]
    WarnRemove,
    /// Keep the literal `$...` string and record a warning.
    WarnPassthrough,
    /// Abort resolution of the enclosing element.
    Error,
}

/// Error from resolving a token reference under [`MissingTokenPolicy::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The referenced path has no value in the registry.
    #[error("missing token '${path}'")]
    Missing { path: String },
}

/// A recoverable condition recorded during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenWarning {
    /// A property was dropped because its token was missing.
    Removed { path: String },
    /// A literal `$...` string was kept because its token was missing.
    PassedThrough { path: String },
}

/// One successful substitution: where in the tree, which token, what value.
///
/// The location is a `/`-joined trail of map keys and array indices from the
/// root of the resolved tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Substitution {
    pub location: String,
    pub token: String,
    pub value: Value,
}

/// Counts how often each token path was resolved across a compile run.
///
/// The optimizer's dead-token elimination and inlining passes both read
/// from this accumulator; it is whole-project, not per-element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TokenUsage {
    counts: HashMap<String, usize>,
}

impl TokenUsage {
    /// Records one resolution of the given token path.
    pub fn record(&mut self, path: &str) {
        *self.counts.entry(path.to_string()).or_insert(0) += 1;
    }

    /// Number of times the path was resolved.
    pub fn count(&self, path: &str) -> usize {
        self.counts.get(path).copied().unwrap_or(0)
    }

    /// Returns true if the path was resolved at least once.
    pub fn is_used(&self, path: &str) -> bool {
        self.count(path) > 0
    }

    /// Iterates over (path, count) pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(path, count)| (path.as_str(), *count))
    }

    /// Total number of resolutions recorded.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Outcome of resolving one value tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The resolved tree, or `None` if the root scalar itself was removed.
    pub value: Option<Value>,
    /// Recoverable conditions encountered, in walk order.
    pub warnings: Vec<TokenWarning>,
    /// Every successful substitution, in walk order.
    pub substitutions: Vec<Substitution>,
}

/// Resolves every token reference in a value tree against the registry.
///
/// Walks maps and arrays; any string scalar that is wholly a reference is
/// replaced by the registry literal at its path. Resolution is single-pass:
/// a substituted value beginning with `$` is never re-resolved. An explicit
/// `|| fallback` always wins over the policy when the primary path is
/// missing.
///
/// # Errors
///
/// Returns [`TokenError::Missing`] for a missing path under
/// [`MissingTokenPolicy::Error`]; the error names the token path.
pub fn resolve_value(
    value: &Value,
    registry: &TokenRegistry,
    policy: MissingTokenPolicy,
    usage: &mut TokenUsage,
) -> Result<Resolution, TokenError> {
    let mut resolution = Resolution {
        value: None,
        warnings: Vec::new(),
        substitutions: Vec::new(),
    };
    resolution.value = walk(
        value,
        registry,
        policy,
        usage,
        String::new(),
        &mut resolution.warnings,
        &mut resolution.substitutions,
    )?;
    Ok(resolution)
}

fn walk(
    value: &Value,
    registry: &TokenRegistry,
    policy: MissingTokenPolicy,
    usage: &mut TokenUsage,
    location: String,
    warnings: &mut Vec<TokenWarning>,
    substitutions: &mut Vec<Substitution>,
) -> Result<Option<Value>, TokenError> {
    match value {
        Value::String(text) => match TokenRef::parse(text) {
            Some(reference) => match registry.lookup(&reference.path) {
                Some(literal) => {
                    usage.record(&reference.path);
                    substitutions.push(Substitution {
                        location,
                        token: reference.path,
                        value: literal.clone(),
                    });
                    Ok(Some(literal.clone()))
                }
                None => match reference.fallback {
                    Some(fallback) => Ok(Some(Value::String(fallback))),
                    None => match policy {
                        MissingTokenPolicy::WarnRemove => {
                            warnings.push(TokenWarning::Removed {
                                path: reference.path,
                            });
                            Ok(None)
                        }
                        MissingTokenPolicy::WarnPassthrough => {
                            warnings.push(TokenWarning::PassedThrough {
                                path: reference.path,
                            });
                            Ok(Some(value.clone()))
                        }
                        MissingTokenPolicy::Error => Err(TokenError::Missing {
                            path: reference.path,
                        }),
                    },
                },
            },
            None => Ok(Some(value.clone())),
        },
        Value::Object(map) => {
            let mut resolved = serde_json::Map::new();
            for (key, entry) in map {
                let child_location = join_location(&location, key);
                if let Some(entry) = walk(
                    entry,
                    registry,
                    policy,
                    usage,
                    child_location,
                    warnings,
                    substitutions,
                )? {
                    resolved.insert(key.clone(), entry);
                }
            }
            Ok(Some(Value::Object(resolved)))
        }
        Value::Array(items) => {
            let mut resolved = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let child_location = join_location(&location, &index.to_string());
                if let Some(item) = walk(
                    item,
                    registry,
                    policy,
                    usage,
                    child_location,
                    warnings,
                    substitutions,
                )? {
                    resolved.push(item);
                }
            }
            Ok(Some(Value::Array(resolved)))
        }
        _ => Ok(Some(value.clone())),
    }
}

fn join_location(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", parent, segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> TokenRegistry {
        TokenRegistry::new()
            .add("colors.primary", "#0af")
            .add("colors.chained", "$colors.primary")
            .add("spacing.md", "1rem")
            .add("layout.columns", 12)
    }

    fn resolve(value: Value, policy: MissingTokenPolicy) -> Result<Resolution, TokenError> {
        let mut usage = TokenUsage::default();
        resolve_value(&value, &registry(), policy, &mut usage)
    }

    #[test]
    fn test_resolves_references_in_maps() {
        let resolution = resolve(
            json!({ "background": "$colors.primary", "padding": "$spacing.md" }),
            MissingTokenPolicy::WarnRemove,
        )
        .unwrap();

        assert_eq!(
            resolution.value,
            Some(json!({ "background": "#0af", "padding": "1rem" }))
        );
        assert!(resolution.warnings.is_empty());
        assert_eq!(resolution.substitutions.len(), 2);
    }

    #[test]
    fn test_resolves_inside_arrays() {
        let resolution = resolve(
            json!({ "palette": ["$colors.primary", "#fff"] }),
            MissingTokenPolicy::WarnRemove,
        )
        .unwrap();

        assert_eq!(resolution.value, Some(json!({ "palette": ["#0af", "#fff"] })));
    }

    #[test]
    fn test_non_string_scalars_untouched() {
        let resolution = resolve(
            json!({ "columns": "$layout.columns", "rows": 3, "wrap": true }),
            MissingTokenPolicy::WarnRemove,
        )
        .unwrap();

        assert_eq!(
            resolution.value,
            Some(json!({ "columns": 12, "rows": 3, "wrap": true }))
        );
    }

    #[test]
    fn test_single_pass_no_chained_resolution() {
        // colors.chained resolves to a literal that looks like another
        // reference; it must be returned verbatim, not re-resolved.
        let resolution = resolve(
            json!({ "background": "$colors.chained" }),
            MissingTokenPolicy::Error,
        )
        .unwrap();

        assert_eq!(
            resolution.value,
            Some(json!({ "background": "$colors.primary" }))
        );
    }

    #[test]
    fn test_fallback_wins_over_every_policy() {
        for policy in [
            MissingTokenPolicy::WarnRemove,
            MissingTokenPolicy::WarnPassthrough,
            MissingTokenPolicy::Error,
        ] {
            let resolution =
                resolve(json!({ "background": "$colors.missing || #fff" }), policy).unwrap();
            assert_eq!(
                resolution.value,
                Some(json!({ "background": "#fff" })),
                "fallback must win under {:?}",
                policy
            );
            assert!(resolution.warnings.is_empty());
        }
    }

    #[test]
    fn test_warn_remove_drops_property() {
        let resolution = resolve(
            json!({ "background": "$colors.missing", "color": "#000" }),
            MissingTokenPolicy::WarnRemove,
        )
        .unwrap();

        assert_eq!(resolution.value, Some(json!({ "color": "#000" })));
        assert_eq!(
            resolution.warnings,
            vec![TokenWarning::Removed {
                path: "colors.missing".to_string()
            }]
        );
    }

    #[test]
    fn test_warn_remove_drops_array_slot() {
        let resolution = resolve(
            json!({ "palette": ["$colors.missing", "#fff"] }),
            MissingTokenPolicy::WarnRemove,
        )
        .unwrap();

        assert_eq!(resolution.value, Some(json!({ "palette": ["#fff"] })));
    }

    #[test]
    fn test_warn_passthrough_keeps_literal() {
        let resolution = resolve(
            json!({ "background": "$colors.missing" }),
            MissingTokenPolicy::WarnPassthrough,
        )
        .unwrap();

        assert_eq!(
            resolution.value,
            Some(json!({ "background": "$colors.missing" }))
        );
        assert_eq!(
            resolution.warnings,
            vec![TokenWarning::PassedThrough {
                path: "colors.missing".to_string()
            }]
        );
    }

    #[test]
    fn test_error_policy_names_path() {
        let result = resolve(
            json!({ "background": "$colors.missing" }),
            MissingTokenPolicy::Error,
        );

        assert_eq!(
            result,
            Err(TokenError::Missing {
                path: "colors.missing".to_string()
            })
        );
        let message = result.unwrap_err().to_string();
        assert!(message.contains("$colors.missing"));
    }

    #[test]
    fn test_usage_accounting() {
        let mut usage = TokenUsage::default();
        let value = json!({
            "background": "$colors.primary",
            "border": "$colors.primary",
            "padding": "$spacing.md"
        });
        resolve_value(&value, &registry(), MissingTokenPolicy::WarnRemove, &mut usage).unwrap();

        assert_eq!(usage.count("colors.primary"), 2);
        assert_eq!(usage.count("spacing.md"), 1);
        assert_eq!(usage.count("colors.missing"), 0);
        assert_eq!(usage.total(), 3);
        assert!(usage.is_used("colors.primary"));
    }

    #[test]
    fn test_substitution_locations() {
        let resolution = resolve(
            json!({ "nested": { "background": "$colors.primary" }, "palette": ["$spacing.md"] }),
            MissingTokenPolicy::WarnRemove,
        )
        .unwrap();

        let locations: Vec<&str> = resolution
            .substitutions
            .iter()
            .map(|s| s.location.as_str())
            .collect();
        assert!(locations.contains(&"nested/background"));
        assert!(locations.contains(&"palette/0"));
    }

    #[test]
    fn test_plain_strings_untouched() {
        let resolution = resolve(
            json!({ "label": "Buy now", "class": "btn primary" }),
            MissingTokenPolicy::Error,
        )
        .unwrap();

        assert_eq!(
            resolution.value,
            Some(json!({ "label": "Buy now", "class": "btn primary" }))
        );
    }

    #[test]
    fn test_root_scalar_removed() {
        let resolution = resolve(json!("$colors.missing"), MissingTokenPolicy::WarnRemove).unwrap();
        assert_eq!(resolution.value, None);
    }

    #[test]
    fn test_determinism() {
        let value = json!({
            "background": "$colors.primary",
            "padding": "$spacing.md",
            "missing": "$colors.nope || inherit"
        });
        let first = resolve(value.clone(), MissingTokenPolicy::WarnRemove).unwrap();
        let second = resolve(value, MissingTokenPolicy::WarnRemove).unwrap();
        assert_eq!(first, second);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        #[test]
        fn plain_strings_round_trip(text in "[a-z #.:;0-9-]{0,40}") {
            // Strings that do not begin with '$' are never altered.
            prop_assume!(!text.starts_with('$'));
            let registry = TokenRegistry::new();
            let mut usage = TokenUsage::default();
            let resolution = resolve_value(
                &json!({ "value": text }),
                &registry,
                MissingTokenPolicy::Error,
                &mut usage,
            )
            .unwrap();
            prop_assert_eq!(resolution.value, Some(json!({ "value": text })));
        }

        #[test]
        fn fallback_always_selected_for_missing(path in "[a-z]{1,8}\\.[a-z]{1,8}", fallback in "[a-z0-9#]{1,12}") {
            let registry = TokenRegistry::new();
            let mut usage = TokenUsage::default();
            let input = json!({ "value": format!("${} || {}", path, fallback) });
            for policy in [
                MissingTokenPolicy::WarnRemove,
                MissingTokenPolicy::WarnPassthrough,
                MissingTokenPolicy::Error,
            ] {
                let resolution =
                    resolve_value(&input, &registry, policy, &mut usage).unwrap();
                prop_assert_eq!(
                    resolution.value,
                    Some(json!({ "value": fallback.clone() }))
                );
            }
        }
    }
}
