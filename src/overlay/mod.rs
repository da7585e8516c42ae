//! Hand-authored documentation overlays.
//!
//! An overlay is the persisted, human-edited half of a declaration: type
//! overrides, doc lines and the unknown-type policy, keyed by member
//! identity. The store is the source of truth for those edits and survives
//! regeneration untouched apart from newly synthesized defaults.

pub mod template;

use crate::error::Diagnostic;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocLines {
    #[serde(default)]
    pub lines: Vec<String>,
}

/// One persisted overlay record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocOverlay {
    #[serde(default)]
    pub doc: DocLines,
    /// Overridden type expressions, order-significant.
    #[serde(default)]
    pub types: Vec<String>,
    /// Fall back to the wildcard type instead of failing on unresolved types.
    #[serde(default = "default_apply_unknown_type")]
    pub apply_unknown_type: bool,
}

fn default_apply_unknown_type() -> bool {
    true
}

impl Default for DocOverlay {
    fn default() -> Self {
        DocOverlay {
            doc: DocLines::default(),
            types: Vec::new(),
            apply_unknown_type: true,
        }
    }
}

/// Identity → overlay, plus bookkeeping for what this run added.
#[derive(Debug, Default)]
pub struct OverlayStore {
    records: BTreeMap<String, DocOverlay>,
    /// Raw JSON of records that failed to decode; written back unchanged.
    corrupt: BTreeMap<String, Value>,
    /// Identities whose overlay was synthesized during this run.
    created: Vec<String>,
}

impl OverlayStore {
    /// Decode a store from JSON text.
    ///
    /// Each record is decoded on its own so one bad record cannot take the
    /// rest of the store with it. Bad records come back as diagnostics.
    pub fn from_json(content: &str) -> Result<(Self, Vec<Diagnostic>)> {
        let root: Value = serde_json::from_str(content).context("overlay store is not valid JSON")?;
        let Value::Object(entries) = root else {
            bail!("overlay store must be a JSON object keyed by member identity");
        };

        let mut store = OverlayStore::default();
        let mut diagnostics = Vec::new();
        for (key, raw) in entries {
            match serde_json::from_value::<DocOverlay>(raw.clone()) {
                Ok(overlay) => {
                    store.records.insert(key, overlay);
                }
                Err(e) => {
                    diagnostics.push(Diagnostic::OverlayCorrupt {
                        member: key.clone(),
                        reason: e.to_string(),
                    });
                    store.corrupt.insert(key, raw);
                }
            }
        }
        Ok((store, diagnostics))
    }

    /// Load the store from disk. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<(Self, Vec<Diagnostic>)> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no overlay store yet, starting empty");
            return Ok((OverlayStore::default(), Vec::new()));
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read overlay store: {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Serialize every record, sorted by identity.
    ///
    /// Corrupt records keep their original raw value, even if a default
    /// was synthesized for the same identity during the run.
    pub fn to_json(&self) -> Result<String> {
        let mut out: BTreeMap<&str, Value> = BTreeMap::new();
        for (key, overlay) in &self.records {
            out.insert(key, serde_json::to_value(overlay)?);
        }
        for (key, raw) in &self.corrupt {
            out.insert(key, raw.clone());
        }
        let mut json = serde_json::to_string_pretty(&out)?;
        json.push('\n');
        Ok(json)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)
            .with_context(|| format!("failed to write overlay store: {}", path.display()))
    }

    pub fn get(&self, identity: &str) -> Option<&DocOverlay> {
        self.records.get(identity)
    }

    #[cfg(test)]
    pub fn insert(&mut self, identity: String, overlay: DocOverlay) {
        self.records.insert(identity, overlay);
    }

    /// Associate a synthesized default with `identity` for the rest of the run.
    pub fn adopt(&mut self, identity: String, overlay: DocOverlay) {
        if self.records.contains_key(&identity) {
            return;
        }
        self.created.push(identity.clone());
        self.records.insert(identity, overlay);
    }

    /// Identities synthesized during this run, in creation order.
    pub fn created(&self) -> &[String] {
        &self.created
    }

    pub fn reset_created(&mut self) {
        self.created.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Records whose identity is not in `live`. Kept, never pruned.
    pub fn orphans<'a>(&'a self, live: &'a BTreeSet<String>) -> impl Iterator<Item = &'a str> {
        self.records
            .keys()
            .chain(self.corrupt.keys())
            .filter(move |k| !live.contains(k.as_str()))
            .map(String::as_str)
    }
}
