//! Name-table records and their normalization (made by FontLab https://www.fontlab.com/)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// OpenType `name` table ids the normalizer looks at.
pub mod name_id {
    pub const FAMILY: u16 = 1;
    pub const SUBFAMILY: u16 = 2;
    pub const POSTSCRIPT: u16 = 6;
    pub const TYPOGRAPHIC_FAMILY: u16 = 16;
    pub const TYPOGRAPHIC_SUBFAMILY: u16 = 17;
}

/// A name table as the parser saw it, before any field selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawNameTable {
    /// One string per name id; no preferred/legacy distinction is kept.
    Flat(FlatNameTable),
    /// Legacy names plus every localized typographic (preferred) name record.
    Localized(LocalizedNameTable),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatNameTable {
    pub entries: BTreeMap<u16, String>,
}

impl FlatNameTable {
    pub fn with(mut self, id: u16, value: impl Into<String>) -> Self {
        self.entries.insert(id, value.into());
        self
    }

    pub fn get(&self, id: u16) -> Option<&str> {
        self.entries
            .get(&id)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedNameTable {
    pub family: String,
    pub sub_family: String,
    pub postscript_name: Option<String>,
    pub preferred_family: Option<String>,
    pub preferred_sub_family: Option<String>,
    /// Every localized typographic family string, in table order.
    pub preferred_families: Vec<String>,
    /// Every localized typographic subfamily string, in table order.
    pub preferred_sub_families: Vec<String>,
}

/// Canonical per-face record fed to the family aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontNameRecord {
    pub family: String,
    pub sub_family: String,
    pub postscript_name: Option<String>,
    pub alternative_families: Vec<String>,
    pub alternative_sub_families: Vec<String>,
    pub file: PathBuf,
    pub is_system_font: bool,
}

impl FontNameRecord {
    /// A record with no postscript name and no alternates.
    pub fn new(
        family: impl Into<String>,
        sub_family: impl Into<String>,
        file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            family: family.into(),
            sub_family: sub_family.into(),
            postscript_name: None,
            alternative_families: Vec::new(),
            alternative_sub_families: Vec::new(),
            file: file.into(),
            is_system_font: true,
        }
    }

    pub fn with_postscript_name(mut self, name: impl Into<String>) -> Self {
        self.postscript_name = Some(name.into());
        self
    }

    /// Add one alternate `(family, subfamily)` identity.
    pub fn with_alternative(
        mut self,
        family: impl Into<String>,
        sub_family: impl Into<String>,
    ) -> Self {
        self.alternative_families.push(family.into());
        self.alternative_sub_families.push(sub_family.into());
        self
    }

    pub fn system(mut self, yes: bool) -> Self {
        self.is_system_font = yes;
        self
    }
}

/// Select family, subfamily and alternates from a raw table.
///
/// Preferred (typographic) names win over legacy ones. Alternate lists are
/// padded so that every alternate family has a subfamily at the same index.
pub fn normalize(raw: &RawNameTable, file: &Path, is_system_font: bool) -> FontNameRecord {
    match raw {
        RawNameTable::Flat(table) => FontNameRecord {
            family: pick(
                table.get(name_id::TYPOGRAPHIC_FAMILY),
                table.get(name_id::FAMILY),
            ),
            sub_family: pick(
                table.get(name_id::TYPOGRAPHIC_SUBFAMILY),
                table.get(name_id::SUBFAMILY),
            ),
            postscript_name: table.get(name_id::POSTSCRIPT).map(str::to_string),
            alternative_families: Vec::new(),
            alternative_sub_families: Vec::new(),
            file: file.to_path_buf(),
            is_system_font,
        },
        RawNameTable::Localized(table) => {
            let alternative_families = table.preferred_families.clone();
            let alternative_sub_families = (0..alternative_families.len())
                .map(|idx| {
                    table
                        .preferred_sub_families
                        .get(idx)
                        .cloned()
                        .unwrap_or_default()
                })
                .collect();

            FontNameRecord {
                family: pick(table.preferred_family.as_deref(), Some(table.family.as_str())),
                sub_family: pick(
                    table.preferred_sub_family.as_deref(),
                    Some(table.sub_family.as_str()),
                ),
                postscript_name: table.postscript_name.clone(),
                alternative_families,
                alternative_sub_families,
                file: file.to_path_buf(),
                is_system_font,
            }
        }
    }
}

fn pick(preferred: Option<&str>, legacy: Option<&str>) -> String {
    preferred
        .filter(|s| !s.is_empty())
        .or(legacy)
        .unwrap_or_default()
        .to_string()
}
