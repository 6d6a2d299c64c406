//! Option resolution across prioritized configuration sources.
//!
//! An option key may be defined by up to five sources. Resolution picks the
//! first source where the key is *present* — existence, not truthiness — so
//! a legitimate `false` or `null` is never mistaken for "absent".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Where a resolved option value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrecedenceSource {
    ElementOverride,
    ProjectConfig,
    StylingSystemGlobal,
    ComponentSpecific,
    Default,
}

impl PrecedenceSource {
    /// Stable name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            PrecedenceSource::ElementOverride => "element-override",
            PrecedenceSource::ProjectConfig => "project-config",
            PrecedenceSource::StylingSystemGlobal => "styling-system-global",
            PrecedenceSource::ComponentSpecific => "component-specific",
            PrecedenceSource::Default => "default",
        }
    }
}

/// Relative priority of the two middle sources.
///
/// Whether component-specific configuration outranks a styling system's
/// global options is configurable per option key; the default matches the
/// listed source order (system before component).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrecedenceOrder {
    #[default]
    SystemThenComponent,
    ComponentThenSystem,
}

/// The five prioritized sources for one resolution, each optionally
/// defining any given key.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecedenceContext<'a> {
    pub element_override: Option<&'a Map<String, Value>>,
    pub project_config: Option<&'a Map<String, Value>>,
    pub styling_system_global: Option<&'a Map<String, Value>>,
    pub component_specific: Option<&'a Map<String, Value>>,
    pub defaults: Option<&'a Map<String, Value>>,
}

impl<'a> PrecedenceContext<'a> {
    /// Resolves one key under the default ordering.
    pub fn resolve(&self, key: &str) -> Option<(&'a Value, PrecedenceSource)> {
        self.resolve_with_order(key, PrecedenceOrder::default())
    }

    /// Resolves one key with an explicit middle-source ordering.
    pub fn resolve_with_order(
        &self,
        key: &str,
        order: PrecedenceOrder,
    ) -> Option<(&'a Value, PrecedenceSource)> {
        for (map, source) in self.sources(order) {
            if let Some(found) = map.and_then(|m| m.get(key)) {
                return Some((found, source));
            }
        }
        None
    }

    /// Resolves a batch of keys in one call, returning value plus source
    /// per key for diagnostics. `orders` supplies per-key ordering
    /// overrides; absent keys use the default ordering.
    pub fn resolve_batch(
        &self,
        keys: &[&str],
        orders: &HashMap<String, PrecedenceOrder>,
    ) -> BTreeMap<String, (Value, PrecedenceSource)> {
        let mut out = BTreeMap::new();
        for key in keys {
            let order = orders.get(*key).copied().unwrap_or_default();
            if let Some((value, source)) = self.resolve_with_order(key, order) {
                out.insert(key.to_string(), (value.clone(), source));
            }
        }
        out
    }

    fn sources(
        &self,
        order: PrecedenceOrder,
    ) -> [(Option<&'a Map<String, Value>>, PrecedenceSource); 5] {
        let (third, fourth) = match order {
            PrecedenceOrder::SystemThenComponent => (
                (self.styling_system_global, PrecedenceSource::StylingSystemGlobal),
                (self.component_specific, PrecedenceSource::ComponentSpecific),
            ),
            PrecedenceOrder::ComponentThenSystem => (
                (self.component_specific, PrecedenceSource::ComponentSpecific),
                (self.styling_system_global, PrecedenceSource::StylingSystemGlobal),
            ),
        };
        [
            (self.element_override, PrecedenceSource::ElementOverride),
            (self.project_config, PrecedenceSource::ProjectConfig),
            third,
            fourth,
            (self.defaults, PrecedenceSource::Default),
        ]
    }
}
