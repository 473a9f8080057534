//! System schedules: which systems run in which category, in what order.
//!
//! A [`SystemSchedule`] is configuration. It is edited before a pipeline is
//! initialized and is never touched while a tick is in progress.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::registry::TypeRegistry;
use crate::system::SystemCategory;

// ---------------------------------------------------------------------------
// SystemEntry
// ---------------------------------------------------------------------------

fn yes() -> bool {
    true
}

/// One scheduled system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemEntry {
    /// Registered system name.
    pub name: String,
    /// Inactive entries keep their slot but never tick.
    #[serde(default = "yes")]
    pub active: bool,
    /// Non-pausable entries keep ticking while their pipeline is paused.
    #[serde(default)]
    pub non_pausable: bool,
}

impl SystemEntry {
    /// An active, pausable entry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            non_pausable: false,
        }
    }

    pub fn non_pausable(mut self) -> Self {
        self.non_pausable = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Direction for [`SystemSchedule::move_entry`]. `Up` is earlier in tick order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveDirection {
    Up,
    Down,
}

// -- list editing shared by schedules and features ---------------------------

fn push_unique(list: &mut Vec<SystemEntry>, entry: SystemEntry) -> bool {
    if list.iter().any(|e| e.name == entry.name) {
        return false;
    }
    list.push(entry);
    true
}

fn move_within(list: &mut [SystemEntry], idx: usize, direction: MoveDirection) -> bool {
    let target = match direction {
        MoveDirection::Up => idx.checked_sub(1),
        MoveDirection::Down => idx.checked_add(1),
    };
    match target {
        Some(target) if idx < list.len() && target < list.len() => {
            list.swap(idx, target);
            true
        }
        _ => false,
    }
}

fn remove_within(list: &mut Vec<SystemEntry>, idx: usize) -> Option<SystemEntry> {
    (idx < list.len()).then(|| list.remove(idx))
}

// ---------------------------------------------------------------------------
// SystemSchedule
// ---------------------------------------------------------------------------

/// Ordered system entries per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemSchedule {
    categories: BTreeMap<SystemCategory, Vec<SystemEntry>>,
}

impl SystemSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an active, pausable entry for `name`. Duplicates within a
    /// category are rejected.
    pub fn add_system(&mut self, category: SystemCategory, name: &str) -> bool {
        self.push_entry(category, SystemEntry::new(name))
    }

    /// Append `entry`. Duplicates within a category are rejected.
    pub fn push_entry(&mut self, category: SystemCategory, entry: SystemEntry) -> bool {
        push_unique(self.categories.entry(category).or_default(), entry)
    }

    /// Builder-style [`push_entry`](Self::push_entry).
    pub fn with(mut self, category: SystemCategory, entry: SystemEntry) -> Self {
        self.push_entry(category, entry);
        self
    }

    pub fn remove_at(&mut self, category: SystemCategory, idx: usize) -> Option<SystemEntry> {
        remove_within(self.categories.get_mut(&category)?, idx)
    }

    /// Swap the entry at `idx` with its neighbour. Returns `false` when the
    /// move would leave the list.
    pub fn move_entry(&mut self, category: SystemCategory, idx: usize, direction: MoveDirection) -> bool {
        self.categories
            .get_mut(&category)
            .is_some_and(|list| move_within(list, idx, direction))
    }

    pub fn set_active(&mut self, category: SystemCategory, idx: usize, active: bool) -> bool {
        self.entry_mut(category, idx)
            .map(|e| e.active = active)
            .is_some()
    }

    pub fn set_non_pausable(&mut self, category: SystemCategory, idx: usize, non_pausable: bool) -> bool {
        self.entry_mut(category, idx)
            .map(|e| e.non_pausable = non_pausable)
            .is_some()
    }

    fn entry_mut(&mut self, category: SystemCategory, idx: usize) -> Option<&mut SystemEntry> {
        self.categories.get_mut(&category)?.get_mut(idx)
    }

    /// Entries of `category` in tick order.
    pub fn entries(&self, category: SystemCategory) -> &[SystemEntry] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Position of `name` in `category`.
    pub fn position(&self, category: SystemCategory, name: &str) -> Option<usize> {
        self.entries(category).iter().position(|e| e.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.values().all(Vec::is_empty)
    }

    /// Merge a feature's entries into its category. Returns how many were
    /// added; names already scheduled there are skipped.
    pub fn add_feature(&mut self, feature: &SystemFeature) -> usize {
        feature
            .entries
            .iter()
            .filter(|entry| self.push_entry(feature.category, (*entry).clone()))
            .count()
    }

    /// Check every entry against `registry`.
    ///
    /// An unregistered name is an error. An entry placed in a category its
    /// type does not declare is logged and accepted.
    pub fn validate(&self, registry: &TypeRegistry) -> Result<(), ConfigError> {
        for (&category, entries) in &self.categories {
            for entry in entries {
                let registration = registry.system(&entry.name).ok_or_else(|| {
                    ConfigError::UnknownSystem {
                        name: entry.name.clone(),
                        category,
                    }
                })?;
                if !registration.categories.includes(category) {
                    tracing::warn!(
                        system = %entry.name,
                        %category,
                        declared = ?registration.categories,
                        "system scheduled outside its declared categories"
                    );
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SystemFeature
// ---------------------------------------------------------------------------

/// A named, reusable group of systems for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemFeature {
    pub name: String,
    pub category: SystemCategory,
    #[serde(default)]
    pub entries: Vec<SystemEntry>,
}

impl SystemFeature {
    pub fn new(name: impl Into<String>, category: SystemCategory) -> Self {
        Self {
            name: name.into(),
            category,
            entries: Vec::new(),
        }
    }

    pub fn add_system(&mut self, name: &str) -> bool {
        push_unique(&mut self.entries, SystemEntry::new(name))
    }

    pub fn remove_at(&mut self, idx: usize) -> Option<SystemEntry> {
        remove_within(&mut self.entries, idx)
    }

    pub fn move_entry(&mut self, idx: usize, direction: MoveDirection) -> bool {
        move_within(&mut self.entries, idx, direction)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
