// src/build/changes.rs

//! Accumulated module changes for a target.

use crate::types::ChangeKind;

/// One changed module.
///
/// `seq` is a process-wide, monotonically increasing event number; it decides
/// which entry wins when two change sets are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedModule {
    pub name: String,
    pub kind: ChangeKind,
    pub seq: u64,
}

/// Ordered set of changed modules, unique by name.
///
/// Recording a module that is already present replaces the old entry and
/// moves it to the end, so iteration order is "least recently changed first".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedModules {
    entries: Vec<ChangedModule>,
}

impl ChangedModules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: impl Into<String>, kind: ChangeKind, seq: u64) {
        let name = name.into();
        self.entries.retain(|m| m.name != name);
        self.entries.push(ChangedModule { name, kind, seq });
    }

    /// Union with `other`; for a name present in both, the newer event wins.
    pub fn merge_newest(&mut self, other: &[ChangedModule]) {
        for incoming in other {
            match self.entries.iter().position(|m| m.name == incoming.name) {
                Some(idx) if self.entries[idx].seq >= incoming.seq => {}
                Some(idx) => {
                    self.entries.remove(idx);
                    self.entries.push(incoming.clone());
                }
                None => self.entries.push(incoming.clone()),
            }
        }
        self.entries.sort_by_key(|m| m.seq);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<&ChangedModule> {
        self.entries.iter().find(|m| m.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangedModule> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<ChangedModule> {
        self.entries.clone()
    }

    /// Human summary, e.g. `"1 file created, 2 files modified"`.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        for kind in [ChangeKind::Created, ChangeKind::Deleted, ChangeKind::Modified] {
            let count = self.entries.iter().filter(|m| m.kind == kind).count();
            if count > 0 {
                let noun = if count == 1 { "file" } else { "files" };
                parts.push(format!("{count} {noun} {kind}"));
            }
        }
        if parts.is_empty() {
            "no changes".to_string()
        } else {
            parts.join(", ")
        }
    }
}
