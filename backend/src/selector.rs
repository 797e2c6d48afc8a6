//! Object selection by classification label.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::SelectionError;
use crate::models::ObjectClassEntry;

/// Crossmatch entries partitioned by label, each class ordered by object id.
///
/// Ordering within a class is stable: entries with equal ids keep the order
/// they were supplied in.
#[derive(Debug, Clone, Default)]
pub struct ObjectSelector {
    classes: BTreeMap<String, Vec<ObjectClassEntry>>,
}

impl ObjectSelector {
    pub fn new(entries: impl IntoIterator<Item = ObjectClassEntry>) -> Self {
        let mut classes: BTreeMap<String, Vec<ObjectClassEntry>> = BTreeMap::new();
        for entry in entries {
            classes.entry(entry.label.clone()).or_default().push(entry);
        }
        for members in classes.values_mut() {
            members.sort_by(|a, b| a.id.cmp(&b.id));
        }
        Self { classes }
    }

    /// Distinct classification labels.
    pub fn keys(&self) -> BTreeSet<&str> {
        self.classes.keys().map(String::as_str).collect()
    }

    /// The `index`-th (0-based) object of class `label`.
    pub fn select(&self, label: &str, index: usize) -> Result<&ObjectClassEntry, SelectionError> {
        let members = self
            .classes
            .get(label)
            .ok_or_else(|| SelectionError::unknown_label(label))?;
        members
            .get(index)
            .ok_or_else(|| SelectionError::index_out_of_range(label, index))
    }

    /// Number of objects in class `label`, zero when the label is unknown.
    pub fn count(&self, label: &str) -> usize {
        self.classes.get(label).map_or(0, Vec::len)
    }

    pub fn total(&self) -> usize {
        self.classes.values().map(Vec::len).sum()
    }

    /// All objects of class `label` in selection order.
    pub fn entries(&self, label: &str) -> Result<&[ObjectClassEntry], SelectionError> {
        self.classes
            .get(label)
            .map(Vec::as_slice)
            .ok_or_else(|| SelectionError::unknown_label(label))
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<ObjectClassEntry> for ObjectSelector {
    fn from_iter<I: IntoIterator<Item = ObjectClassEntry>>(iter: I) -> Self {
        ObjectSelector::new(iter)
    }
}
