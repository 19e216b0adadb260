//! Tag-diff reconciliation between a note's current and desired tag sets.
//!
//! Only the delta is applied: ids present in both sets keep their existing
//! association rows.

use crate::model::note::TagId;
use std::collections::BTreeSet;

/// Minimal association delta for one note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    /// `desired - current`
    pub to_add: BTreeSet<TagId>,
    /// `current - desired`
    pub to_remove: BTreeSet<TagId>,
}

impl TagDiff {
    /// Computes the delta that turns `current` into `desired`.
    pub fn between(current: &BTreeSet<TagId>, desired: &BTreeSet<TagId>) -> Self {
        Self {
            to_add: desired.difference(current).copied().collect(),
            to_remove: current.difference(desired).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}
