//! Ordered key/value rows shared by a tab's parameters, headers and variables
//!
//! The list maintains itself: it is never empty, and a blank scratch row is
//! kept at the boundary before any trailing locked rows so there is always
//! somewhere to type the next entry.

use serde::{Deserialize, Serialize};

use crate::ids::EntryId;

/// One key/value row
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub enabled: bool,
    /// Protocol-reserved row: value is editable, key/position/existence are not
    pub locked: bool,
}

impl Entry {
    /// Blank, enabled, unlocked row
    pub fn blank() -> Self {
        Entry {
            id: EntryId::new(),
            key: String::new(),
            value: String::new(),
            description: None,
            enabled: true,
            locked: false,
        }
    }

    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Entry {
            key: key.into(),
            value: value.into(),
            ..Entry::blank()
        }
    }

    pub fn locked(key: impl Into<String>, value: impl Into<String>) -> Self {
        Entry {
            locked: true,
            ..Entry::new(key, value)
        }
    }

    pub fn is_blank(&self) -> bool {
        self.key.is_empty()
    }
}

/// A single-field edit
#[derive(Clone, Debug, PartialEq)]
pub enum EntryField {
    Key(String),
    Value(String),
    Description(Option<String>),
}

/// Which of a tab's lists an edit targets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryListKind {
    Parameters,
    Headers,
    Variables,
}

impl EntryListKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntryListKind::Parameters => "Params",
            EntryListKind::Headers => "Headers",
            EntryListKind::Variables => "Variables",
        }
    }
}

/// Self-growing, reorderable list of entries
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntryList {
    entries: Vec<Entry>,
}

impl Default for EntryList {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryList {
    /// A list holding one scratch row
    pub fn new() -> Self {
        EntryList {
            entries: vec![Entry::blank()],
        }
    }

    /// Scratch row followed by the given pinned rows
    pub fn with_locked(locked: Vec<Entry>) -> Self {
        Self::from_entries(
            locked
                .into_iter()
                .map(|entry| Entry {
                    locked: true,
                    ..entry
                })
                .collect(),
        )
    }

    /// Builds a list from existing rows and restores the scratch row if needed
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        let mut list = EntryList { entries };
        list.ensure_scratch();
        list
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Enabled rows with a non-empty key, in list order
    pub fn active_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter(|e| e.enabled && !e.key.is_empty())
            .map(|e| (e.key.as_str(), e.value.as_str()))
    }

    /// Appends a blank row (before any locked tail) and returns its id
    pub fn add(&mut self) -> EntryId {
        let entry = Entry::blank();
        let id = entry.id;
        let at = self.boundary();
        self.entries.insert(at, entry);
        id
    }

    /// Applies one field edit. Returns false for unknown ids and refused edits.
    ///
    /// A scratch row is appended only when the last editable row gains a key.
    /// Clearing the key of another row leaves that row blank in place, so
    /// several blank rows may coexist; only the boundary one is the scratch row.
    pub fn update(&mut self, id: EntryId, field: EntryField) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return false;
        };

        match field {
            EntryField::Key(key) => {
                if entry.locked || entry.key == key {
                    return false;
                }
                entry.key = key;
            }
            EntryField::Value(value) => {
                if entry.value == value {
                    return false;
                }
                entry.value = value;
            }
            EntryField::Description(description) => {
                if entry.description == description {
                    return false;
                }
                entry.description = description;
            }
        }

        self.ensure_scratch();
        true
    }

    /// Deletes an unlocked row unless it is the only row left
    pub fn remove(&mut self, id: EntryId) -> bool {
        if self.entries.len() <= 1 {
            return false;
        }
        let Some(pos) = self.position(id) else {
            return false;
        };
        if self.entries[pos].locked {
            return false;
        }

        self.entries.remove(pos);
        self.ensure_scratch();
        true
    }

    pub fn set_enabled(&mut self, id: EntryId, enabled: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) if entry.enabled != enabled => {
                entry.enabled = enabled;
                true
            }
            _ => false,
        }
    }

    /// Moves a row within the reorderable rows.
    ///
    /// Indices address the unlocked rows in front of the scratch row; locked
    /// rows and the scratch row keep their absolute positions. Out-of-range
    /// indices are ignored.
    pub fn reorder(&mut self, old_index: usize, new_index: usize) -> bool {
        let slots = self.movable_slots();

        if old_index >= slots.len() || new_index >= slots.len() || old_index == new_index {
            return false;
        }

        let mut movable: Vec<Entry> = slots.iter().map(|&i| self.entries[i].clone()).collect();
        let moved = movable.remove(old_index);
        movable.insert(new_index, moved);

        for (slot, entry) in slots.into_iter().zip(movable) {
            self.entries[slot] = entry;
        }
        true
    }

    /// Number of rows `reorder` can address
    pub fn movable_len(&self) -> usize {
        self.movable_slots().len()
    }

    /// Reorder index of a row, if it can be moved
    pub fn movable_index(&self, id: EntryId) -> Option<usize> {
        let pos = self.position(id)?;
        self.movable_slots().iter().position(|&slot| slot == pos)
    }

    /// Drops every unlocked row and leaves a single scratch row before the locked rows
    pub fn clear(&mut self) {
        self.entries.retain(|e| e.locked);
        self.entries.insert(0, Entry::blank());
    }

    /// Index of the first row of the trailing locked run
    fn boundary(&self) -> usize {
        self.entries
            .iter()
            .rposition(|e| !e.locked)
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// Absolute indices of unlocked rows, minus the scratch row at the boundary
    fn movable_slots(&self) -> Vec<usize> {
        let mut slots: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.locked)
            .map(|(i, _)| i)
            .collect();
        if slots.last().is_some_and(|&i| self.entries[i].is_blank()) {
            slots.pop();
        }
        slots
    }

    fn ensure_scratch(&mut self) {
        let needs_scratch = match self.entries.iter().rev().find(|e| !e.locked) {
            Some(last_editable) => !last_editable.is_blank(),
            None => true,
        };
        if needs_scratch {
            let at = self.boundary();
            self.entries.insert(at, Entry::blank());
        }
    }
}
