//! Immutable family index snapshot (made by FontLab https://www.fontlab.com/)

use serde::{Deserialize, Serialize};

use crate::family::{aggregate, locale_cmp, sort_families, FamilyEntry};
use crate::names::FontNameRecord;
use crate::query::{resolve, SearchQuery, SearchResult};
use crate::reconcile::reconcile;

/// A built index: sorted family entries plus any alternate-name entries
/// appended by reconciliation.
///
/// Snapshots are never edited after construction; rescanning builds a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FontIndex {
    families: Vec<FamilyEntry>,
}

impl FontIndex {
    /// Aggregate records in order, sort by family, then add alternate families.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a FontNameRecord>,
    {
        let mut families: Vec<FamilyEntry> = aggregate(records).into_values().collect();
        sort_families(&mut families);
        reconcile(&mut families);
        Self { families }
    }

    /// Wrap already-built entries without re-aggregating them.
    pub fn from_entries(families: Vec<FamilyEntry>) -> Self {
        Self { families }
    }

    pub fn families(&self) -> &[FamilyEntry] {
        &self.families
    }

    /// First entry whose family name is exactly `family`.
    pub fn get(&self, family: &str) -> Option<&FamilyEntry> {
        self.families.iter().find(|entry| entry.family == family)
    }

    /// Unique family names, sorted.
    pub fn family_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.families.iter().map(|e| e.family.clone()).collect();
        names.sort_by(|a, b| locale_cmp(a, b));
        names.dedup();
        names
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Resolve a batch of family/style requests against this snapshot.
    pub fn search(&self, queries: &[SearchQuery]) -> SearchResult {
        resolve(&self.families, queries)
    }
}
