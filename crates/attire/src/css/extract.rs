//! CSS extraction and the explicit/extracted merge.

use attire_tokens::Substitution;
use serde_json::{Map, Value};

use super::{Declaration, DeclarationMap, DeclarationOrigin, PlatformProfile};
use crate::context::EffectiveOptions;

/// The computed style attribute plus its backing declaration maps.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleOutcome {
    /// Serialized style attribute, absent when the merged map is empty.
    pub style: Option<String>,
    /// The merged declarations backing [`StyleOutcome::style`].
    pub declarations: DeclarationMap,
    /// The extracted declarations before merging, for provenance.
    pub extracted: DeclarationMap,
    /// True when a malformed explicit style string was recovered as one
    /// opaque declaration.
    pub recovered: bool,
}

/// Computes an element's style attribute.
///
/// Extraction walks the platform profile's recognized keys in declared
/// order. By default (`only_extract_explicit`) a property is extracted
/// only when it was present on the element's authored input — values
/// inherited purely from broader hierarchy tiers never leak into
/// per-instance inline style. The author's explicit style string is then
/// parsed and merged, explicit values winning on conflict; with
/// `merge_explicit_style` disabled a non-empty explicit string is used
/// alone.
pub fn compute_style(
    resolved: &Map<String, Value>,
    authored: &Map<String, Value>,
    substitutions: &[Substitution],
    profile: &PlatformProfile,
    opts: &EffectiveOptions,
) -> StyleOutcome {
    let mut extracted = DeclarationMap::new();
    for key in profile.keys() {
        if opts.only_extract_explicit && !authored.contains_key(key) {
            continue;
        }
        let value = match resolved.get(key) {
            Some(value) => value,
            None => continue,
        };
        let text = match css_value_text(value) {
            Some(text) => text,
            None => continue,
        };
        let mut declaration = Declaration::new(key, &text, DeclarationOrigin::Extracted);
        if let Some(substitution) = substitutions.iter().find(|s| s.location == key) {
            declaration = declaration.with_token(&substitution.token);
        }
        extracted.insert(declaration);
    }

    let (explicit, recovered) = match resolved.get("style").and_then(Value::as_str) {
        Some(text) => DeclarationMap::parse(text),
        None => (DeclarationMap::new(), false),
    };

    let declarations = if !opts.merge_explicit_style && !explicit.is_empty() {
        explicit
    } else {
        DeclarationMap::merge(&explicit, &extracted)
    };

    let style = if declarations.is_empty() {
        None
    } else {
        Some(declarations.serialize())
    };

    StyleOutcome {
        style,
        declarations,
        extracted,
        recovered,
    }
}

/// Renders a resolved property value as CSS text. Maps and arrays are not
/// CSS-bearing and yield `None`.
fn css_value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
