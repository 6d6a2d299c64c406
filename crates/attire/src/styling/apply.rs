//! Class computation: stack expansion, cycle detection, class collection.

use serde_json::{Map, Value};
use std::collections::HashSet;

use super::{StylingRegistry, StylingSystem};
use crate::context::EffectiveOptions;
use crate::error::CompileError;

/// Dimensions whose resolved values select variant classes.
const VARIANT_DIMENSIONS: [&str; 3] = ["variant", "size", "tone"];

/// A system re-applied through an `extends` chain after already appearing
/// earlier in the stack. Recoverable; reported as a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    /// The stack entry whose chain re-introduced the system.
    pub extending: String,
    /// The system that had already been applied.
    pub ancestor: String,
}

/// Expands a stack of system names into application order.
///
/// Each stacked system is expanded through its `extends` chain, ancestors
/// first. Cycle detection is recursive descent carrying a per-call visited
/// list; a repeated name is fatal and the error names the full cycle. When
/// `dedupe_extensions` is set, a system already applied earlier in the
/// stack is not re-applied through a later chain (identity match on system
/// name); the overlap is reported either way.
///
/// # Errors
///
/// [`CompileError::Configuration`] for an unknown system or parent name;
/// [`CompileError::StylingCycle`] for a cyclic `extends` chain.
pub fn expand_stack<'a>(
    registry: &'a StylingRegistry,
    stack: &[String],
    dedupe_extensions: bool,
) -> Result<(Vec<&'a StylingSystem>, Vec<Overlap>), CompileError> {
    let mut applied: Vec<&StylingSystem> = Vec::new();
    let mut applied_names: HashSet<String> = HashSet::new();
    let mut overlaps = Vec::new();

    for name in stack {
        let system = registry
            .get(name)
            .ok_or_else(|| CompileError::Configuration {
                context: "styling stack".to_string(),
                message: format!("unknown styling system '{}'", name),
            })?;

        for member in chain_of(registry, system)? {
            if applied_names.contains(&member.name) {
                overlaps.push(Overlap {
                    extending: name.clone(),
                    ancestor: member.name.clone(),
                });
                if dedupe_extensions {
                    continue;
                }
            }
            applied_names.insert(member.name.clone());
            applied.push(member);
        }
    }

    Ok((applied, overlaps))
}

/// Walks a system's `extends` chain, returning ancestors first.
fn chain_of<'a>(
    registry: &'a StylingRegistry,
    system: &'a StylingSystem,
) -> Result<Vec<&'a StylingSystem>, CompileError> {
    let mut chain: Vec<&StylingSystem> = Vec::new();
    let mut visited: Vec<String> = Vec::new();
    let mut current = system;

    loop {
        if let Some(start) = visited.iter().position(|name| name == &current.name) {
            let mut cycle = visited[start..].to_vec();
            cycle.push(current.name.clone());
            return Err(CompileError::StylingCycle { cycle });
        }
        visited.push(current.name.clone());
        chain.push(current);

        match &current.extends {
            Some(parent) => {
                current = registry
                    .get(parent)
                    .ok_or_else(|| CompileError::Configuration {
                        context: format!("styling system '{}'", current.name),
                        message: format!("extends unknown styling system '{}'", parent),
                    })?;
            }
            None => break,
        }
    }

    chain.reverse();
    Ok(chain)
}

/// Where a class contribution came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassSource {
    /// A styling system rule: base classes, a scope override, or a
    /// variant selection such as `size=lg`.
    System { name: String, rule: String },
    /// The author's explicit class string.
    Explicit,
}

/// One ordered contribution to the class list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassContribution {
    pub source: ClassSource,
    pub classes: Vec<String>,
}

/// The computed class attribute plus its ordered contributions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassOutcome {
    /// Space-joined class list, or `None` when nothing applies.
    pub class: Option<String>,
    pub contributions: Vec<ClassContribution>,
}

/// Computes an element's class attribute from the expanded system stack
/// plus the author's explicit classes.
///
/// An explicit class string consisting solely of whitespace is treated
/// identically to an absent one. When `apply_base_when_explicit` is false
/// and the explicit string is non-blank, the explicit classes are used
/// alone. When `dedupe_classes` is set, repeats are removed preserving
/// first occurrence and order.
pub fn compute_class(
    resolved: &Map<String, Value>,
    kind_key: &str,
    path: &str,
    systems: &[&StylingSystem],
    opts: &EffectiveOptions,
) -> ClassOutcome {
    let explicit_raw = resolved.get("class").and_then(Value::as_str).unwrap_or("");
    let explicit: Vec<String> = explicit_raw.split_whitespace().map(String::from).collect();
    let explicit_blank = explicit.is_empty();

    let mut contributions: Vec<ClassContribution> = Vec::new();

    if !opts.apply_base_when_explicit && !explicit_blank {
        contributions.push(ClassContribution {
            source: ClassSource::Explicit,
            classes: explicit,
        });
    } else {
        for system in systems {
            collect_system(system, resolved, kind_key, path, &mut contributions);
        }
        if !explicit_blank {
            contributions.push(ClassContribution {
                source: ClassSource::Explicit,
                classes: explicit,
            });
        }
    }

    let mut classes: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for contribution in &contributions {
        for class in &contribution.classes {
            if opts.dedupe_classes && !seen.insert(class) {
                continue;
            }
            classes.push(class.clone());
        }
    }

    let class = if !classes.is_empty() {
        Some(classes.join(" "))
    } else if resolved.contains_key("class") && !opts.blank_class_to_none {
        Some(String::new())
    } else {
        None
    };

    ClassOutcome {
        class,
        contributions,
    }
}

fn collect_system(
    system: &StylingSystem,
    resolved: &Map<String, Value>,
    kind_key: &str,
    path: &str,
    contributions: &mut Vec<ClassContribution>,
) {
    // An override entry replaces this system's base classes for the scope;
    // the narrowest matching override wins.
    let mut base: Vec<String> = Vec::new();
    let mut rule = "base";
    for scope in [path, kind_key] {
        if let Some(classes) = system.overrides.get(scope) {
            base = split_classes(classes);
            rule = "override";
            break;
        }
    }
    if rule == "base" {
        for scope in ["*", kind_key, path] {
            if let Some(classes) = system.base.get(scope) {
                base.extend(split_classes(classes));
            }
        }
    }
    if !base.is_empty() {
        contributions.push(ClassContribution {
            source: ClassSource::System {
                name: system.name.clone(),
                rule: rule.to_string(),
            },
            classes: base,
        });
    }

    for dimension in VARIANT_DIMENSIONS {
        let value = match resolved.get(dimension).and_then(Value::as_str) {
            Some(value) => value,
            None => continue,
        };
        for scope in ["*", kind_key, path] {
            let classes = system
                .variants
                .get(scope)
                .and_then(|dims| dims.get(dimension))
                .and_then(|values| values.get(value));
            if let Some(classes) = classes {
                contributions.push(ClassContribution {
                    source: ClassSource::System {
                        name: system.name.clone(),
                        rule: format!("{}={}", dimension, value),
                    },
                    classes: split_classes(classes),
                });
            }
        }
    }
}

fn split_classes(classes: &str) -> Vec<String> {
    classes.split_whitespace().map(String::from).collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        #[test]
        fn deduped_class_lists_have_no_repeats(classes in proptest::collection::vec("[a-d]{1,3}", 0..12)) {
            let resolved = match json!({ "class": classes.join(" ") }) {
                serde_json::Value::Object(map) => map,
                _ => unreachable!(),
            };
            let outcome = compute_class(
                &resolved,
                "button",
                "page/button[0]",
                &[],
                &EffectiveOptions::default(),
            );
            if let Some(class) = outcome.class {
                let tokens: Vec<&str> = class.split_whitespace().collect();
                let mut seen = std::collections::HashSet::new();
                for token in &tokens {
                    prop_assert!(seen.insert(*token), "duplicate class {}", token);
                }
                // first-occurrence order is preserved
                let mut expected = Vec::new();
                let mut dedupe = std::collections::HashSet::new();
                for class in &classes {
                    if dedupe.insert(class.clone()) {
                        expected.push(class.as_str());
                    }
                }
                prop_assert_eq!(tokens, expected);
            }
        }
    }
}
