//! Project context: registries, stack, platform profile, and options.

use attire_tokens::{MissingTokenPolicy, TokenRegistry};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::css::PlatformProfile;
use crate::hierarchy::HierarchyConfig;
use crate::precedence::{PrecedenceContext, PrecedenceOrder};
use crate::styling::StylingRegistry;

/// Recognized compile options, under their external kebab spellings.
///
/// Most options are also resolvable per element through the configuration
/// precedence resolver: an element's authored props, the project options,
/// a styling system's `options`, and its `component_options` may each
/// define a key, consulted in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Generate base/variant classes even when the author supplied
    /// explicit classes.
    #[serde(rename = "apply-base-when-explicit")]
    pub apply_base_when_explicit: bool,
    /// Remove repeated class tokens, preserving first occurrence.
    #[serde(rename = "dedupe-classes?")]
    pub dedupe_classes: bool,
    /// Omit the class attribute entirely when it would be blank.
    #[serde(rename = "blank-class->nil?")]
    pub blank_class_to_none: bool,
    /// Merge the author's explicit style string with extracted
    /// declarations; when false a non-empty explicit string is used alone.
    #[serde(rename = "merge-explicit-style?")]
    pub merge_explicit_style: bool,
    /// Extract only properties present on the element's authored input.
    #[serde(rename = "only-extract-explicit?")]
    pub only_extract_explicit: bool,
    #[serde(rename = "on-missing-token")]
    pub on_missing_token: MissingTokenPolicy,
    /// Skip re-applying a styling system reached twice through `extends`.
    #[serde(rename = "dedupe-extensions?")]
    pub dedupe_extensions: bool,
    /// Usage count at which the optimizer inlines a token's literal value;
    /// 0 disables inlining.
    #[serde(rename = "inline-threshold")]
    pub inline_threshold: usize,
    /// Inline every used token as soon as any token meets the threshold.
    #[serde(rename = "inline-all-or-nothing?")]
    pub inline_all_or_nothing: bool,
    /// Abort the whole compile on the first element-scoped failure.
    #[serde(rename = "strict?")]
    pub strict: bool,
    /// Regex allow-list of token paths exempt from dead-token elimination.
    #[serde(rename = "keep-patterns")]
    pub keep_patterns: Vec<String>,
    /// Per-key overrides for the middle precedence ordering.
    #[serde(rename = "precedence-orders")]
    pub precedence_orders: HashMap<String, PrecedenceOrder>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            apply_base_when_explicit: true,
            dedupe_classes: true,
            blank_class_to_none: true,
            merge_explicit_style: true,
            only_extract_explicit: true,
            on_missing_token: MissingTokenPolicy::WarnRemove,
            dedupe_extensions: true,
            inline_threshold: 0,
            inline_all_or_nothing: false,
            strict: false,
            keep_patterns: Vec::new(),
            precedence_orders: HashMap::new(),
        }
    }
}

impl CompileOptions {
    /// The options as a key→value map under their external spellings,
    /// usable as a precedence source.
    pub fn as_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

static DEFAULT_OPTIONS: Lazy<Map<String, Value>> =
    Lazy::new(|| CompileOptions::default().as_map());

/// The built-in defaults as a precedence source.
pub fn default_options() -> &'static Map<String, Value> {
    &DEFAULT_OPTIONS
}

/// The per-element option values after precedence resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveOptions {
    pub apply_base_when_explicit: bool,
    pub dedupe_classes: bool,
    pub blank_class_to_none: bool,
    pub merge_explicit_style: bool,
    pub only_extract_explicit: bool,
    pub on_missing_token: MissingTokenPolicy,
}

impl Default for EffectiveOptions {
    fn default() -> Self {
        let defaults = CompileOptions::default();
        Self {
            apply_base_when_explicit: defaults.apply_base_when_explicit,
            dedupe_classes: defaults.dedupe_classes,
            blank_class_to_none: defaults.blank_class_to_none,
            merge_explicit_style: defaults.merge_explicit_style,
            only_extract_explicit: defaults.only_extract_explicit,
            on_missing_token: defaults.on_missing_token,
        }
    }
}

impl EffectiveOptions {
    /// Resolves the per-element options from the five precedence sources.
    ///
    /// A value of the wrong type counts as absent for that source's key,
    /// falling through to the built-in default.
    pub fn resolve(
        ctx: &PrecedenceContext<'_>,
        orders: &HashMap<String, PrecedenceOrder>,
    ) -> Self {
        let defaults = Self::default();
        let flag = |key: &str, fallback: bool| -> bool {
            let order = orders.get(key).copied().unwrap_or_default();
            ctx.resolve_with_order(key, order)
                .and_then(|(value, _)| value.as_bool())
                .unwrap_or(fallback)
        };
        let policy = {
            let key = "on-missing-token";
            let order = orders.get(key).copied().unwrap_or_default();
            ctx.resolve_with_order(key, order)
                .and_then(|(value, _)| {
                    serde_json::from_value::<MissingTokenPolicy>(value.clone()).ok()
                })
                .unwrap_or(defaults.on_missing_token)
        };

        Self {
            apply_base_when_explicit: flag(
                "apply-base-when-explicit",
                defaults.apply_base_when_explicit,
            ),
            dedupe_classes: flag("dedupe-classes?", defaults.dedupe_classes),
            blank_class_to_none: flag("blank-class->nil?", defaults.blank_class_to_none),
            merge_explicit_style: flag("merge-explicit-style?", defaults.merge_explicit_style),
            only_extract_explicit: flag(
                "only-extract-explicit?",
                defaults.only_extract_explicit,
            ),
            on_missing_token: policy,
        }
    }
}

/// Everything a compile needs besides the element tree.
///
/// The context is caller-owned and passed by reference; the compiler
/// treats every registry in it as an immutable snapshot for the duration
/// of one compile pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectContext {
    pub hierarchy: HierarchyConfig,
    pub tokens: TokenRegistry,
    pub styling: StylingRegistry,
    /// Styling system names to apply, in author order.
    pub stack: Vec<String>,
    pub platform: PlatformProfile,
    pub options: CompileOptions,
}

impl ProjectContext {
    /// Creates a context with empty registries, the HTML platform profile,
    /// and default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hierarchy configuration.
    pub fn with_hierarchy(mut self, hierarchy: HierarchyConfig) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    /// Sets the token registry.
    pub fn with_tokens(mut self, tokens: TokenRegistry) -> Self {
        self.tokens = tokens;
        self
    }

    /// Sets the styling registry.
    pub fn with_styling(mut self, styling: StylingRegistry) -> Self {
        self.styling = styling;
        self
    }

    /// Appends a styling system name to the stack.
    pub fn with_system(mut self, name: &str) -> Self {
        self.stack.push(name.to_string());
        self
    }

    /// Sets the platform profile.
    pub fn with_platform(mut self, platform: PlatformProfile) -> Self {
        self.platform = platform;
        self
    }

    /// Sets the compile options.
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_defaults() {
        let options = CompileOptions::default();
        assert!(options.apply_base_when_explicit);
        assert!(options.dedupe_classes);
        assert!(options.blank_class_to_none);
        assert!(options.merge_explicit_style);
        assert!(options.only_extract_explicit);
        assert_eq!(options.on_missing_token, MissingTokenPolicy::WarnRemove);
        assert!(options.dedupe_extensions);
        assert_eq!(options.inline_threshold, 0);
        assert!(!options.inline_all_or_nothing);
        assert!(!options.strict);
    }

    #[test]
    fn test_options_external_spellings() {
        let options: CompileOptions = serde_json::from_value(json!({
            "dedupe-classes?": false,
            "on-missing-token": "warn-passthrough",
            "inline-threshold": 3
        }))
        .unwrap();

        assert!(!options.dedupe_classes);
        assert_eq!(options.on_missing_token, MissingTokenPolicy::WarnPassthrough);
        assert_eq!(options.inline_threshold, 3);
        // unspecified keys keep their defaults
        assert!(options.apply_base_when_explicit);
    }

    #[test]
    fn test_options_as_map_round_trips() {
        let map = CompileOptions::default().as_map();
        assert_eq!(map.get("dedupe-classes?"), Some(&json!(true)));
        assert_eq!(map.get("on-missing-token"), Some(&json!("warn-remove")));
        assert_eq!(map.get("strict?"), Some(&json!(false)));
    }

    #[test]
    fn test_effective_options_from_element_override() {
        let element = match json!({ "dedupe-classes?": false }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let ctx = PrecedenceContext {
            element_override: Some(&element),
            defaults: Some(default_options()),
            ..Default::default()
        };

        let effective = EffectiveOptions::resolve(&ctx, &HashMap::new());
        assert!(!effective.dedupe_classes);
        assert!(effective.apply_base_when_explicit);
    }

    #[test]
    fn test_effective_options_policy_from_system() {
        let system = match json!({ "on-missing-token": "error" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let ctx = PrecedenceContext {
            styling_system_global: Some(&system),
            defaults: Some(default_options()),
            ..Default::default()
        };

        let effective = EffectiveOptions::resolve(&ctx, &HashMap::new());
        assert_eq!(effective.on_missing_token, MissingTokenPolicy::Error);
    }

    #[test]
    fn test_effective_options_wrong_type_falls_through() {
        let element = match json!({ "dedupe-classes?": "yes" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let ctx = PrecedenceContext {
            element_override: Some(&element),
            ..Default::default()
        };

        let effective = EffectiveOptions::resolve(&ctx, &HashMap::new());
        assert!(effective.dedupe_classes);
    }

    #[test]
    fn test_context_builder() {
        let context = ProjectContext::new()
            .with_tokens(TokenRegistry::new().add("colors.primary", "#0af"))
            .with_system("base-kit")
            .with_platform(PlatformProfile::minimal());

        assert_eq!(context.stack, vec!["base-kit".to_string()]);
        assert_eq!(context.platform.name, "minimal");
        assert!(context.tokens.contains("colors.primary"));
    }
}
