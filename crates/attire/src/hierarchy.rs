//! Five-tier hierarchy configuration and deep merging.
//!
//! Properties inherit through five ordered tiers — global, components,
//! sections, templates, pages — merged narrow over broad, with the
//! element's explicit properties applied last. Nested maps merge key-wise;
//! scalars and arrays replace wholly. A missing tier or scope is an empty
//! map, never an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::element::ElementPath;
use crate::error::CompileError;

/// One inheritance tier, broadest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Global,
    Components,
    Sections,
    Templates,
    Pages,
}

impl Tier {
    /// All tiers in merge order (broad to narrow).
    pub const ORDER: [Tier; 5] = [
        Tier::Global,
        Tier::Components,
        Tier::Sections,
        Tier::Templates,
        Tier::Pages,
    ];

    /// The tier's configuration key.
    pub fn key(&self) -> &'static str {
        match self {
            Tier::Global => "global",
            Tier::Components => "components",
            Tier::Sections => "sections",
            Tier::Templates => "templates",
            Tier::Pages => "pages",
        }
    }
}

type ScopeMap = HashMap<String, Map<String, Value>>;

/// The five-tier inheritance configuration for a project.
///
/// Each tier maps a scope key — an element kind key, a full element path,
/// or `"*"` — to a partial property map. Within a tier, `"*"` applies
/// first, then the kind, then the exact path, so narrower scopes win inside
/// a tier just as narrower tiers win across tiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    #[serde(default)]
    global: ScopeMap,
    #[serde(default)]
    components: ScopeMap,
    #[serde(default)]
    sections: ScopeMap,
    #[serde(default)]
    templates: ScopeMap,
    #[serde(default)]
    pages: ScopeMap,
}

impl HierarchyConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a scope's partial properties to a tier, returning the updated
    /// configuration for chaining. Non-object payloads are ignored.
    pub fn with(mut self, tier: Tier, scope: &str, props: Value) -> Self {
        if let Value::Object(map) = props {
            self.tier_mut(tier).insert(scope.to_string(), map);
        }
        self
    }

    fn tier_map(&self, tier: Tier) -> &ScopeMap {
        match tier {
            Tier::Global => &self.global,
            Tier::Components => &self.components,
            Tier::Sections => &self.sections,
            Tier::Templates => &self.templates,
            Tier::Pages => &self.pages,
        }
    }

    fn tier_mut(&mut self, tier: Tier) -> &mut ScopeMap {
        match tier {
            Tier::Global => &mut self.global,
            Tier::Components => &mut self.components,
            Tier::Sections => &mut self.sections,
            Tier::Templates => &mut self.templates,
            Tier::Pages => &mut self.pages,
        }
    }

    /// Checks structural invariants: scope keys must be non-empty.
    pub fn validate(&self) -> Result<(), CompileError> {
        for tier in Tier::ORDER {
            if self.tier_map(tier).keys().any(|scope| scope.is_empty()) {
                return Err(CompileError::Configuration {
                    context: format!("hierarchy tier '{}'", tier.key()),
                    message: "scope keys must be non-empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// The ordered layer contributions for an element, broadest first.
    ///
    /// Each entry is `(source label, partial property map)`; labels have the
    /// form `tier:scope` and feed provenance.
    pub fn layers(&self, path: &str, kind_key: &str) -> Vec<(String, &Map<String, Value>)> {
        let mut out = Vec::new();
        for tier in Tier::ORDER {
            let scopes = self.tier_map(tier);
            for scope in ["*", kind_key, path] {
                if let Some(map) = scopes.get(scope) {
                    out.push((format!("{}:{}", tier.key(), scope), map));
                }
            }
        }
        out
    }

    /// Resolves an element's properties without caching.
    ///
    /// Equivalent to folding [`deep_merge`] over [`HierarchyConfig::layers`]
    /// and then the explicit properties.
    pub fn resolve(
        &self,
        path: &str,
        kind_key: &str,
        explicit: &Map<String, Value>,
    ) -> Map<String, Value> {
        let mut merged = Map::new();
        for (_, layer) in self.layers(path, kind_key) {
            deep_merge(&mut merged, layer);
        }
        deep_merge(&mut merged, explicit);
        merged
    }
}

/// Merges `overlay` into `base`, narrow over broad.
///
/// Nested maps merge key-wise recursively; any other pairing replaces the
/// base value wholly.
pub fn deep_merge(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// One top-level key contribution recorded while merging, in application
/// order. Feeds the provenance tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceStep {
    pub key: String,
    pub source: String,
    /// The contributing layer's value for the key.
    pub value: Value,
}

/// Per-run memo for the tier portion of hierarchy resolution.
///
/// The five-tier merge depends only on the element path, so it is computed
/// once per path per compile run. Reads tolerate concurrent lookup; the
/// cache is dropped with the run state and never persists across runs or
/// projects.
#[derive(Debug, Default)]
pub struct MergeCache {
    inner: RwLock<HashMap<String, (Map<String, Value>, Vec<TraceStep>)>>,
}

impl MergeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves an element's properties: `base` (broadest, e.g. styling
    /// system contributions), then the memoized tier merge, then the
    /// explicit properties. Returns the merged map and the full trace.
    pub fn resolve(
        &self,
        config: &HierarchyConfig,
        path: &ElementPath,
        kind_key: &str,
        base: &Map<String, Value>,
        explicit: &Map<String, Value>,
    ) -> (Map<String, Value>, Vec<TraceStep>) {
        let cache_key = path.to_string();

        let cached = self
            .inner
            .read()
            .unwrap()
            .get(&cache_key)
            .cloned();

        let (tier_map, tier_trace) = match cached {
            Some(entry) => entry,
            None => {
                let mut merged = Map::new();
                let mut trace = Vec::new();
                for (label, layer) in config.layers(&cache_key, kind_key) {
                    deep_merge(&mut merged, layer);
                    trace.extend(layer.iter().map(|(key, value)| TraceStep {
                        key: key.clone(),
                        source: label.clone(),
                        value: value.clone(),
                    }));
                }
                let entry = (merged, trace);
                self.inner
                    .write()
                    .unwrap()
                    .insert(cache_key, entry.clone());
                entry
            }
        };

        let mut merged = base.clone();
        deep_merge(&mut merged, &tier_map);
        deep_merge(&mut merged, explicit);

        let mut trace = tier_trace;
        trace.extend(explicit.iter().map(|(key, value)| TraceStep {
            key: key.clone(),
            source: "explicit".to_string(),
            value: value.clone(),
        }));

        (merged, trace)
    }

    /// Number of memoized paths.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    /// Returns true if nothing has been memoized yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
