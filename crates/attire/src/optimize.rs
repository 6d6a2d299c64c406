//! Whole-tree optimization: dead-token elimination, CSS rule
//! deduplication, and token inlining.
//!
//! The pass runs once over the compiled tree plus the token registry. It
//! is a whole-project reachability analysis, not per-element: a token is
//! dead only when nothing anywhere in the tree resolved it.

use attire_tokens::{TokenRegistry, TokenUsage};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::context::CompileOptions;
use crate::css::{Declaration, DeclarationMap};
use crate::element::CompiledElement;
use crate::error::CompileError;

/// Options for the optimization pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizeOptions {
    /// Regex allow-list of token paths kept even when unreferenced.
    pub keep_patterns: Vec<String>,
    /// Usage count at which a token's references are inlined as literals;
    /// 0 disables inlining.
    pub inline_threshold: usize,
    /// Inline every used token as soon as any token meets the threshold.
    pub inline_all_or_nothing: bool,
}

impl From<&CompileOptions> for OptimizeOptions {
    fn from(options: &CompileOptions) -> Self {
        Self {
            keep_patterns: options.keep_patterns.clone(),
            inline_threshold: options.inline_threshold,
            inline_all_or_nothing: options.inline_all_or_nothing,
        }
    }
}

/// One emitted rule: elements with identical declaration blocks merged
/// under a shared selector list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CssRule {
    /// Element paths sharing this rule, in tree order.
    pub selectors: Vec<String>,
    pub declarations: DeclarationMap,
}

/// The optimizer's output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Optimized {
    /// The reduced registry for emission. The source registry is never
    /// mutated.
    pub registry: TokenRegistry,
    /// Selector-merged rules in first-seen tree order.
    pub rules: Vec<CssRule>,
    /// Token paths whose emission sites were inlined.
    pub inlined: BTreeSet<String>,
}

impl Optimized {
    /// The emitted registry as CSS custom property declarations
    /// (`--colors-primary: #0af`), for a `:root` rule.
    pub fn custom_properties(&self) -> DeclarationMap {
        let mut out = DeclarationMap::new();
        for path in self.registry.paths() {
            let text = match self.registry.lookup(&path) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Number(n)) => n.to_string(),
                Some(serde_json::Value::Bool(b)) => b.to_string(),
                _ => continue,
            };
            out.insert(Declaration::new(
                &format!("--{}", css_ident(&path)),
                &text,
                crate::css::DeclarationOrigin::Extracted,
            ));
        }
        out
    }
}

/// Runs the optimization pass.
///
/// Dead-token elimination keeps only tokens the compile actually resolved,
/// plus any matching a keep-pattern. Token-derived declaration values are
/// emitted as `var(--path)` references unless the token was inlined; the
/// registry definition remains for tokens below the threshold.
///
/// # Errors
///
/// Returns [`CompileError::Configuration`] for an invalid keep-pattern.
pub fn optimize(
    root: &CompiledElement,
    tokens: &TokenRegistry,
    usage: &TokenUsage,
    options: &OptimizeOptions,
) -> Result<Optimized, CompileError> {
    let keep: Vec<Regex> = options
        .keep_patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|err| CompileError::Configuration {
                context: "keep-patterns".to_string(),
                message: format!("invalid pattern '{}': {}", pattern, err),
            })
        })
        .collect::<Result<_, _>>()?;

    let mut inlined: BTreeSet<String> = BTreeSet::new();
    if options.inline_threshold > 0 {
        let qualifying: Vec<String> = usage
            .iter()
            .filter(|(_, count)| *count >= options.inline_threshold)
            .map(|(path, _)| path.to_string())
            .collect();
        if options.inline_all_or_nothing {
            if !qualifying.is_empty() {
                inlined.extend(usage.iter().map(|(path, _)| path.to_string()));
            }
        } else {
            inlined.extend(qualifying);
        }
    }

    let registry = tokens.retain_paths(|path| {
        let survives_use = usage.is_used(path) && !inlined.contains(path);
        survives_use || keep.iter().any(|re| re.is_match(path))
    });

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, CssRule> = HashMap::new();
    collect_rules(root, &inlined, &mut order, &mut groups);
    let rules = order
        .into_iter()
        .filter_map(|signature| groups.remove(&signature))
        .collect();

    Ok(Optimized {
        registry,
        rules,
        inlined,
    })
}

fn collect_rules(
    element: &CompiledElement,
    inlined: &BTreeSet<String>,
    order: &mut Vec<String>,
    groups: &mut HashMap<String, CssRule>,
) {
    if !element.declarations.is_empty() {
        let rendered = render_declarations(&element.declarations, inlined);
        let signature = rendered.signature();
        match groups.get_mut(&signature) {
            Some(rule) => rule.selectors.push(element.path.to_string()),
            None => {
                order.push(signature.clone());
                groups.insert(
                    signature,
                    CssRule {
                        selectors: vec![element.path.to_string()],
                        declarations: rendered,
                    },
                );
            }
        }
    }
    for child in &element.children {
        collect_rules(child, inlined, order, groups);
    }
}

/// Re-renders a declaration block for sheet emission: token-derived values
/// become `var()` references unless inlined. Inserting through the map
/// removes duplicate properties keeping the last occurrence.
fn render_declarations(map: &DeclarationMap, inlined: &BTreeSet<String>) -> DeclarationMap {
    let mut out = DeclarationMap::new();
    for declaration in map.iter() {
        let value = match &declaration.token {
            Some(token) if !inlined.contains(token) => {
                format!("var(--{})", css_ident(token))
            }
            _ => declaration.value.clone(),
        };
        let mut rendered = Declaration::new(&declaration.property, &value, declaration.origin);
        rendered.token = declaration.token.clone();
        out.insert(rendered);
    }
    out
}

fn css_ident(path: &str) -> String {
    path.replace('.', "-")
}
