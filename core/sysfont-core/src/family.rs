//! Folding per-face records into per-family entries (made by FontLab https://www.fontlab.com/)

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::OnceLock;

use icu_collator::options::CollatorOptions;
use icu_collator::{Collator, CollatorBorrowed};
use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::names::FontNameRecord;

/// Everything the index knows about one family name.
///
/// `sub_families` keeps every style in the order it was added, duplicates
/// included; the keyed maps hold the last value written for each style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyEntry {
    pub family: String,
    pub is_system_font: bool,
    pub sub_families: Vec<String>,
    pub files: IndexMap<String, PathBuf>,
    pub postscript_names: IndexMap<String, Option<String>>,
    pub alternative_families: IndexMap<String, Vec<String>>,
    pub alternative_sub_families: IndexMap<String, Vec<String>>,
}

impl FamilyEntry {
    /// Seed an entry from its first record.
    pub fn from_record(record: &FontNameRecord) -> Self {
        let mut entry = Self::bare(&record.family, record.is_system_font);
        entry.push_record(record);
        entry
    }

    /// An entry with no styles yet.
    pub(crate) fn bare(family: &str, is_system_font: bool) -> Self {
        Self {
            family: family.to_string(),
            is_system_font,
            sub_families: Vec::new(),
            files: IndexMap::new(),
            postscript_names: IndexMap::new(),
            alternative_families: IndexMap::new(),
            alternative_sub_families: IndexMap::new(),
        }
    }

    /// Merge another record of the same family into this entry.
    pub fn merge(&mut self, record: &FontNameRecord) {
        debug_assert_eq!(self.family, record.family);
        self.is_system_font = self.is_system_font && record.is_system_font;
        self.push_record(record);
    }

    fn push_record(&mut self, record: &FontNameRecord) {
        let style = &record.sub_family;
        self.sub_families.push(style.clone());
        self.files.insert(style.clone(), record.file.clone());
        self.postscript_names
            .insert(style.clone(), record.postscript_name.clone());
        self.alternative_families
            .insert(style.clone(), record.alternative_families.clone());
        self.alternative_sub_families
            .insert(style.clone(), record.alternative_sub_families.clone());
    }

    /// Whether `style` was ever added to this family.
    pub fn has_style(&self, style: &str) -> bool {
        self.sub_families.iter().any(|s| s == style)
    }

    /// File implementing `style`, if any.
    pub fn file(&self, style: &str) -> Option<&PathBuf> {
        self.files.get(style)
    }
}

/// Left-fold records, in order, into a map keyed by family name.
pub fn aggregate<'a, I>(records: I) -> IndexMap<String, FamilyEntry>
where
    I: IntoIterator<Item = &'a FontNameRecord>,
{
    records
        .into_iter()
        .fold(IndexMap::new(), |mut families, record| {
            match families.get_mut(&record.family) {
                Some(entry) => entry.merge(record),
                None => {
                    families.insert(record.family.clone(), FamilyEntry::from_record(record));
                }
            }
            families
        })
}

/// Sort entries by family name for presentation; equal names keep their order.
pub fn sort_families(entries: &mut [FamilyEntry]) {
    entries.sort_by(|a, b| locale_cmp(&a.family, &b.family));
}

/// Root-locale Unicode collation at the default (tertiary) strength.
///
/// Accents and case only break ties between otherwise equal letters, so
/// `Éclair` sorts next to `Eclair` and `arial` comes just before `Arial`.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    match collator() {
        Some(collator) => collator.compare(a, b),
        None => a.cmp(b),
    }
}

fn collator() -> Option<&'static CollatorBorrowed<'static>> {
    static COLLATOR: OnceLock<Option<CollatorBorrowed<'static>>> = OnceLock::new();
    COLLATOR
        .get_or_init(|| match Collator::try_new(Default::default(), CollatorOptions::default()) {
            Ok(collator) => Some(collator),
            Err(err) => {
                warn!("root collation data unavailable, sorting by code point: {err}");
                None
            }
        })
        .as_ref()
}
