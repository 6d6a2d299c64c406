//! Provenance: where every emitted value came from.
//!
//! The tracker is an explicit accumulator threaded through the compile —
//! never a global log — keeping the resolution core pure and independently
//! testable. Entries live for one compile pass.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// The pipeline stage that recorded an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Hierarchy,
    Tokens,
    Styling,
    Css,
    Optimize,
}

/// The kind of source a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Tier,
    Explicit,
    TokenRegistry,
    StylingSystem,
    Extraction,
}

/// A named source: kind plus the specific tier, token, or system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvSource {
    pub kind: SourceKind,
    pub name: String,
}

impl ProvSource {
    /// A hierarchy tier layer, e.g. `components:button`.
    pub fn tier(label: &str) -> Self {
        Self {
            kind: SourceKind::Tier,
            name: label.to_string(),
        }
    }

    /// The element's authored input.
    pub fn explicit() -> Self {
        Self {
            kind: SourceKind::Explicit,
            name: "author".to_string(),
        }
    }

    /// A token registry lookup.
    pub fn token(path: &str) -> Self {
        Self {
            kind: SourceKind::TokenRegistry,
            name: path.to_string(),
        }
    }

    /// A styling system contribution.
    pub fn system(name: &str) -> Self {
        Self {
            kind: SourceKind::StylingSystem,
            name: name.to_string(),
        }
    }

    /// The CSS extraction pass.
    pub fn extraction() -> Self {
        Self {
            kind: SourceKind::Extraction,
            name: "design-properties".to_string(),
        }
    }
}

/// One recorded write: property, value, source, stage, and replacement
/// links to the entries it replaced or was replaced by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvenanceEntry {
    pub id: usize,
    pub path: String,
    pub property: String,
    pub value: Value,
    pub source: ProvSource,
    pub stage: Stage,
    pub replaces: Option<usize>,
    pub replaced_by: Option<usize>,
}

/// A (path, property) group with more than one distinct currently-active
/// value, e.g. two styling systems both contributing `background`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub path: String,
    pub property: String,
    pub values: Vec<(Value, ProvSource)>,
}

/// How a (path, property) differs between two compiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Change {
    Added { to: Value },
    Removed { from: Value },
    Changed { from: Value, to: Value },
}

/// One entry of a provenance diff.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvenanceDiff {
    pub path: String,
    pub property: String,
    pub change: Change,
}

/// Accumulator of provenance entries for one compile pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProvenanceTracker {
    entries: Vec<ProvenanceEntry>,
    #[serde(skip)]
    active: HashMap<(String, String), Vec<usize>>,
}

impl ProvenanceTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a superseding write: every currently-active entry for the
    /// (path, property) is retained, marked replaced, and linked to this
    /// successor. Returns the new entry's id.
    pub fn record(
        &mut self,
        path: &str,
        property: &str,
        value: Value,
        source: ProvSource,
        stage: Stage,
    ) -> usize {
        self.push(path, property, value, source, stage, true)
    }

    /// Records a parallel write that does not supersede prior entries —
    /// independent contributions from unordered sources, visible to
    /// [`ProvenanceTracker::conflicts`].
    pub fn record_parallel(
        &mut self,
        path: &str,
        property: &str,
        value: Value,
        source: ProvSource,
        stage: Stage,
    ) -> usize {
        self.push(path, property, value, source, stage, false)
    }

    fn push(
        &mut self,
        path: &str,
        property: &str,
        value: Value,
        source: ProvSource,
        stage: Stage,
        supersedes: bool,
    ) -> usize {
        let id = self.entries.len();
        let key = (path.to_string(), property.to_string());
        let active = self.active.entry(key).or_default();

        let mut replaces = None;
        if supersedes {
            for &prior in active.iter() {
                self.entries[prior].replaced_by = Some(id);
                replaces = Some(prior);
            }
            active.clear();
        }
        active.push(id);

        self.entries.push(ProvenanceEntry {
            id,
            path: path.to_string(),
            property: property.to_string(),
            value,
            source,
            stage,
            replaces,
            replaced_by: None,
        });
        id
    }

    /// All entries in record order.
    pub fn entries(&self) -> &[ProvenanceEntry] {
        &self.entries
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The currently-active entries for a (path, property).
    pub fn active(&self, path: &str, property: &str) -> Vec<&ProvenanceEntry> {
        self.active
            .get(&(path.to_string(), property.to_string()))
            .map(|ids| ids.iter().map(|&id| &self.entries[id]).collect())
            .unwrap_or_default()
    }

    /// The most recent active entry for a (path, property).
    pub fn latest(&self, path: &str, property: &str) -> Option<&ProvenanceEntry> {
        self.active(path, property).into_iter().last()
    }

    /// Every entry ever recorded for a (path, property), in record order.
    pub fn history(&self, path: &str, property: &str) -> Vec<&ProvenanceEntry> {
        self.entries
            .iter()
            .filter(|e| e.path == path && e.property == property)
            .collect()
    }

    /// Groups active entries by (path, property) and returns the groups
    /// with more than one distinct value, sorted for determinism.
    pub fn conflicts(&self) -> Vec<Conflict> {
        let mut keys: Vec<&(String, String)> = self
            .active
            .iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(key, _)| key)
            .collect();
        keys.sort();

        let mut out = Vec::new();
        for key in keys {
            let entries = self.active(&key.0, &key.1);
            let mut distinct: Vec<&Value> = Vec::new();
            for entry in &entries {
                if !distinct.contains(&&entry.value) {
                    distinct.push(&entry.value);
                }
            }
            if distinct.len() > 1 {
                out.push(Conflict {
                    path: key.0.clone(),
                    property: key.1.clone(),
                    values: entries
                        .iter()
                        .map(|e| (e.value.clone(), e.source.clone()))
                        .collect(),
                });
            }
        }
        out
    }

    /// Diffs this compile's final values against an earlier compile of the
    /// same project, sorted by (path, property).
    pub fn diff(&self, earlier: &ProvenanceTracker) -> Vec<ProvenanceDiff> {
        let mut keys: Vec<&(String, String)> = self
            .active
            .keys()
            .chain(earlier.active.keys())
            .collect();
        keys.sort();
        keys.dedup();

        let mut out = Vec::new();
        for key in keys {
            let now = self.latest(&key.0, &key.1).map(|e| &e.value);
            let was = earlier.latest(&key.0, &key.1).map(|e| &e.value);
            let change = match (was, now) {
                (None, Some(to)) => Some(Change::Added { to: to.clone() }),
                (Some(from), None) => Some(Change::Removed {
                    from: from.clone(),
                }),
                (Some(from), Some(to)) if from != to => Some(Change::Changed {
                    from: from.clone(),
                    to: to.clone(),
                }),
                _ => None,
            };
            if let Some(change) = change {
                out.push(ProvenanceDiff {
                    path: key.0.clone(),
                    property: key.1.clone(),
                    change,
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_replacement_links() {
        let mut tracker = ProvenanceTracker::new();
        let first = tracker.record(
            "page/button[0]",
            "background",
            json!("#000"),
            ProvSource::tier("global:*"),
            Stage::Hierarchy,
        );
        let second = tracker.record(
            "page/button[0]",
            "background",
            json!("#0af"),
            ProvSource::explicit(),
            Stage::Hierarchy,
        );

        let entries = tracker.entries();
        assert_eq!(entries[first].replaced_by, Some(second));
        assert_eq!(entries[second].replaces, Some(first));
        assert_eq!(
            tracker.latest("page/button[0]", "background").map(|e| &e.value),
            Some(&json!("#0af"))
        );
    }

    #[test]
    fn test_history_in_record_order() {
        let mut tracker = ProvenanceTracker::new();
        tracker.record(
            "page",
            "width",
            json!("50%"),
            ProvSource::tier("global:*"),
            Stage::Hierarchy,
        );
        tracker.record(
            "page",
            "width",
            json!("100%"),
            ProvSource::explicit(),
            Stage::Hierarchy,
        );

        let history = tracker.history("page", "width");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].value, json!("50%"));
        assert_eq!(history[1].value, json!("100%"));
    }

    #[test]
    fn test_parallel_writes_flag_conflicts() {
        let mut tracker = ProvenanceTracker::new();
        tracker.record_parallel(
            "page/button[0]",
            "background",
            json!("#0af"),
            ProvSource::system("kit-a"),
            Stage::Hierarchy,
        );
        tracker.record_parallel(
            "page/button[0]",
            "background",
            json!("#f00"),
            ProvSource::system("kit-b"),
            Stage::Hierarchy,
        );

        let conflicts = tracker.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].property, "background");
        assert_eq!(conflicts[0].values.len(), 2);
    }

    #[test]
    fn test_identical_parallel_values_not_conflicting() {
        let mut tracker = ProvenanceTracker::new();
        for system in ["kit-a", "kit-b"] {
            tracker.record_parallel(
                "page",
                "background",
                json!("#0af"),
                ProvSource::system(system),
                Stage::Hierarchy,
            );
        }
        assert!(tracker.conflicts().is_empty());
    }

    #[test]
    fn test_superseding_clears_conflicts() {
        let mut tracker = ProvenanceTracker::new();
        tracker.record_parallel(
            "page",
            "background",
            json!("#0af"),
            ProvSource::system("kit-a"),
            Stage::Hierarchy,
        );
        tracker.record_parallel(
            "page",
            "background",
            json!("#f00"),
            ProvSource::system("kit-b"),
            Stage::Hierarchy,
        );
        tracker.record(
            "page",
            "background",
            json!("#fff"),
            ProvSource::explicit(),
            Stage::Hierarchy,
        );

        assert!(tracker.conflicts().is_empty());
        assert_eq!(tracker.active("page", "background").len(), 1);
    }

    #[test]
    fn test_diff_between_compiles() {
        let mut earlier = ProvenanceTracker::new();
        earlier.record("page", "width", json!("50%"), ProvSource::explicit(), Stage::Hierarchy);
        earlier.record("page", "gone", json!(1), ProvSource::explicit(), Stage::Hierarchy);

        let mut later = ProvenanceTracker::new();
        later.record("page", "width", json!("100%"), ProvSource::explicit(), Stage::Hierarchy);
        later.record("page", "new", json!(2), ProvSource::explicit(), Stage::Hierarchy);

        let diff = later.diff(&earlier);
        assert_eq!(diff.len(), 3);
        assert!(diff.iter().any(|d| d.property == "gone"
            && matches!(d.change, Change::Removed { .. })));
        assert!(diff.iter().any(|d| d.property == "new"
            && matches!(d.change, Change::Added { .. })));
        assert!(diff.iter().any(|d| d.property == "width"
            && d.change
                == Change::Changed {
                    from: json!("50%"),
                    to: json!("100%"),
                }));
    }

    #[test]
    fn test_diff_identical_compiles_empty() {
        let mut a = ProvenanceTracker::new();
        a.record("page", "width", json!("100%"), ProvSource::explicit(), Stage::Hierarchy);
        let b = a.clone();
        assert!(a.diff(&b).is_empty());
    }
}
