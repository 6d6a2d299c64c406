//! Style declarations: parsing, merging, serialization.
//!
//! This module provides the CSS primitives:
//!
//! - [`DeclarationMap`]: ordered property→value pairs, deduplicated by
//!   normalized property name
//! - [`PlatformProfile`]: the per-platform list of CSS-bearing property
//!   keys recognized for extraction
//!
//! Extraction and the explicit/extracted merge live in
//! [`extract`](crate::css::extract).

mod extract;

pub use extract::{compute_style, StyleOutcome};

use serde::{Deserialize, Serialize};

/// Whether a declaration was authored in the explicit style string or
/// extracted from design properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationOrigin {
    Explicit,
    Extracted,
}

/// One `property: value` declaration.
///
/// A declaration with an empty value is *opaque*: the property field holds
/// raw text recovered from a malformed style string, serialized as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub origin: DeclarationOrigin,
    /// Token path the value was resolved from, when it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Declaration {
    /// Creates a declaration.
    pub fn new(property: &str, value: &str, origin: DeclarationOrigin) -> Self {
        Self {
            property: property.to_string(),
            value: value.to_string(),
            origin,
            token: None,
        }
    }

    /// Attaches the token path the value came from.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Returns true for an opaque recovered declaration.
    pub fn is_opaque(&self) -> bool {
        self.value.is_empty()
    }
}

/// Normalizes a property name for deduplication.
pub fn normalize_property(property: &str) -> String {
    property.trim().to_ascii_lowercase()
}

/// Ordered, deduplicated style declarations.
///
/// Inserting a declaration whose normalized property already exists
/// replaces the value in place — the later declaration in merge order wins
/// while the first position is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeclarationMap {
    entries: Vec<Declaration>,
}

impl DeclarationMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a declaration; a duplicate normalized property replaces the
    /// existing value in place.
    pub fn insert(&mut self, declaration: Declaration) {
        let key = normalize_property(&declaration.property);
        match self
            .entries
            .iter_mut()
            .find(|existing| normalize_property(&existing.property) == key)
        {
            Some(existing) => *existing = declaration,
            None => self.entries.push(declaration),
        }
    }

    /// Looks up a declaration by normalized property name.
    pub fn get(&self, property: &str) -> Option<&Declaration> {
        let key = normalize_property(property);
        self.entries
            .iter()
            .find(|d| normalize_property(&d.property) == key)
    }

    /// Returns true if the normalized property is present.
    pub fn contains(&self, property: &str) -> bool {
        self.get(property).is_some()
    }

    /// Iterates declarations in order.
    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.entries.iter()
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map holds no declarations.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges explicit and extracted declarations.
    ///
    /// Explicit values win on normalized-property conflict; non-conflicting
    /// entries from both sides are kept. Order is explicit-first presence,
    /// then extracted order.
    pub fn merge(explicit: &DeclarationMap, extracted: &DeclarationMap) -> DeclarationMap {
        let mut merged = explicit.clone();
        for declaration in extracted.iter() {
            if !merged.contains(&declaration.property) {
                merged.entries.push(declaration.clone());
            }
        }
        merged
    }

    /// Parses an author style string into a map.
    ///
    /// Tolerates repeated separators, arbitrary whitespace around
    /// separators, and a trailing separator; the resulting entries are
    /// tagged [`DeclarationOrigin::Explicit`]. A malformed declaration
    /// (no `:`, or an empty property or value) makes the whole string one
    /// opaque declaration rather than discarding it; the second tuple
    /// field reports that recovery.
    pub fn parse(input: &str) -> (DeclarationMap, bool) {
        let trimmed = input.trim();
        let mut map = DeclarationMap::new();
        if trimmed.is_empty() {
            return (map, false);
        }

        for segment in trimmed.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            match segment.split_once(':') {
                Some((property, value))
                    if !property.trim().is_empty() && !value.trim().is_empty() =>
                {
                    map.insert(Declaration::new(
                        property.trim(),
                        value.trim(),
                        DeclarationOrigin::Explicit,
                    ));
                }
                _ => {
                    let mut opaque = DeclarationMap::new();
                    opaque.insert(Declaration::new(trimmed, "", DeclarationOrigin::Explicit));
                    return (opaque, true);
                }
            }
        }

        (map, false)
    }

    /// Serializes to `property:value;` per entry — exactly one separator
    /// between declarations and exactly one trailing separator. Entries
    /// with a blank property are filtered, not merely trimmed, so naive
    /// concatenation can never produce doubled separators.
    pub fn serialize(&self) -> String {
        self.entries
            .iter()
            .filter(|d| !d.property.trim().is_empty())
            .map(|d| {
                if d.is_opaque() {
                    format!("{};", d.property)
                } else {
                    format!("{}:{};", d.property, d.value)
                }
            })
            .collect()
    }

    /// Canonical order-insensitive signature of the property set, for
    /// grouping identical declaration blocks into shared rules.
    pub fn signature(&self) -> String {
        let mut pairs: Vec<String> = self
            .entries
            .iter()
            .map(|d| format!("{}:{}", normalize_property(&d.property), d.value))
            .collect();
        pairs.sort();
        pairs.join("|")
    }
}

/// The per-platform list of CSS-bearing property keys recognized for
/// extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformProfile {
    pub name: String,
    css_keys: Vec<String>,
}

impl Default for PlatformProfile {
    fn default() -> Self {
        PlatformProfile::html()
    }
}

impl PlatformProfile {
    /// Creates a profile with the given recognized keys.
    pub fn new(name: &str, keys: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            css_keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// The HTML/CSS profile with the common inline-style properties.
    pub fn html() -> Self {
        Self::new(
            "html",
            &[
                "background",
                "color",
                "padding",
                "padding-top",
                "padding-bottom",
                "margin",
                "margin-top",
                "margin-bottom",
                "font-size",
                "font-family",
                "font-weight",
                "line-height",
                "letter-spacing",
                "text-align",
                "width",
                "max-width",
                "min-width",
                "height",
                "max-height",
                "min-height",
                "display",
                "gap",
                "border",
                "border-radius",
                "box-shadow",
                "opacity",
            ],
        )
    }

    /// A deliberately small profile for page-builder targets that accept
    /// only a handful of inline properties.
    pub fn minimal() -> Self {
        Self::new(
            "minimal",
            &["background", "color", "padding", "margin", "width", "height"],
        )
    }

    /// Adds a recognized key, returning the profile for chaining.
    pub fn with_key(mut self, key: &str) -> Self {
        self.css_keys.push(key.to_string());
        self
    }

    /// Iterates recognized keys in declared order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.css_keys.iter().map(|k| k.as_str())
    }

    /// Returns true if the key is recognized for extraction.
    pub fn recognizes(&self, key: &str) -> bool {
        let normalized = normalize_property(key);
        self.css_keys
            .iter()
            .any(|k| normalize_property(k) == normalized)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn serialized_maps_have_no_doubled_separators(
            pairs in proptest::collection::vec(("[a-z-]{1,8}", "[a-z0-9%.#]{1,8}"), 0..8)
        ) {
            let mut map = DeclarationMap::new();
            for (property, value) in &pairs {
                map.insert(Declaration::new(property, value, DeclarationOrigin::Explicit));
            }
            let serialized = map.serialize();
            prop_assert!(!serialized.contains(";;"));
            if !map.is_empty() {
                prop_assert!(serialized.ends_with(';'));
                prop_assert!(!serialized.starts_with(';'));
            } else {
                prop_assert!(serialized.is_empty());
            }
        }

        #[test]
        fn parse_then_serialize_round_trips_well_formed(
            pairs in proptest::collection::vec(("[a-z][a-z-]{0,6}", "[a-z0-9%.#]{1,8}"), 1..6)
        ) {
            let input: String = pairs
                .iter()
                .map(|(p, v)| format!("{}:{};", p, v))
                .collect();
            let (map, recovered) = DeclarationMap::parse(&input);
            prop_assert!(!recovered);
            let (again, recovered_again) = DeclarationMap::parse(&map.serialize());
            prop_assert!(!recovered_again);
            prop_assert_eq!(map.serialize(), again.serialize());
        }
    }
}
