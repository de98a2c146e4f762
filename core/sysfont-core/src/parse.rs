//! Name-table extraction with read-fonts and skrifa (made by FontLab https://www.fontlab.com/)

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use read_fonts::tables::name::{Name, NameRecord};
use read_fonts::{FontRef, TableProvider};
use skrifa::string::StringId;
use skrifa::{FontRef as SkrifaFontRef, MetadataProvider};

use crate::names::{name_id, normalize, FlatNameTable, FontNameRecord, LocalizedNameTable, RawNameTable};

/// Something that can pull name tables out of font bytes.
pub trait FontParser: Send + Sync {
    /// Short label used in log lines.
    fn label(&self) -> &'static str;

    /// Parse every face in `data`. An empty `Ok` means "nothing to index".
    fn parse_data(&self, data: &[u8]) -> Result<Vec<RawNameTable>>;

    fn parse(&self, path: &Path) -> Result<Vec<RawNameTable>> {
        let data = fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
        self.parse_data(&data)
            .with_context(|| format!("parsing {} with {}", path.display(), self.label()))
    }
}

/// Reads the `name` table of a single (non-collection) font.
#[derive(Debug, Default, Clone, Copy)]
pub struct NameTableParser;

impl FontParser for NameTableParser {
    fn label(&self) -> &'static str {
        "name-table"
    }

    fn parse_data(&self, data: &[u8]) -> Result<Vec<RawNameTable>> {
        let font = FontRef::new(data)?;
        let name = font.name()?;

        let mut table = FlatNameTable::default();
        for id in [
            name_id::FAMILY,
            name_id::SUBFAMILY,
            name_id::POSTSCRIPT,
            name_id::TYPOGRAPHIC_FAMILY,
            name_id::TYPOGRAPHIC_SUBFAMILY,
        ] {
            if let Some(value) = best_record(&name, id) {
                table.entries.insert(id, value);
            }
        }

        if table.get(name_id::TYPOGRAPHIC_FAMILY).is_none() && table.get(name_id::FAMILY).is_none() {
            bail!("name table has no family name");
        }
        if table.get(name_id::TYPOGRAPHIC_SUBFAMILY).is_none()
            && table.get(name_id::SUBFAMILY).is_none()
        {
            bail!("name table has no subfamily name");
        }

        Ok(vec![RawNameTable::Flat(table)])
    }
}

// English Windows records first, then Unicode-platform ones, then any other
// Unicode-encoded record.
fn best_record(name: &Name, id: u16) -> Option<String> {
    let data = name.string_data();
    name.name_record()
        .iter()
        .filter(|record| record.name_id().to_u16() == id && record.is_unicode())
        .filter_map(|record| {
            let value = record.string(data).ok()?.to_string();
            let value = value.trim().to_string();
            (!value.is_empty()).then(|| (record_rank(record), value))
        })
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, value)| value)
}

fn record_rank(record: &NameRecord) -> u8 {
    match (record.platform_id(), record.language_id()) {
        (3, 0x0409) => 0,
        (0, _) => 1,
        _ => 2,
    }
}

/// Reads every face of a font or font collection, keeping all localized
/// typographic names.
#[derive(Debug, Default, Clone, Copy)]
pub struct CollectionParser;

impl FontParser for CollectionParser {
    fn label(&self) -> &'static str {
        "collection"
    }

    fn parse_data(&self, data: &[u8]) -> Result<Vec<RawNameTable>> {
        let mut tables = Vec::new();

        for (idx, face) in SkrifaFontRef::fonts(data).enumerate() {
            let face = match face {
                Ok(face) => face,
                Err(err) => {
                    debug!("skipping unreadable face #{idx}: {err}");
                    continue;
                }
            };
            if let Some(table) = localized_names(&face) {
                tables.push(RawNameTable::Localized(table));
            }
        }

        if tables.is_empty() {
            return Err(anyhow!("no readable faces"));
        }
        Ok(tables)
    }
}

fn localized_names(font: &SkrifaFontRef) -> Option<LocalizedNameTable> {
    let first = |id: StringId| {
        font.localized_strings(id)
            .english_or_first()
            .map(|s| s.to_string().trim().to_string())
            .filter(|s| !s.is_empty())
    };
    let all = |id: StringId| -> Vec<String> {
        font.localized_strings(id)
            .map(|s| s.to_string().trim().to_string())
            .collect()
    };

    let table = LocalizedNameTable {
        family: first(StringId::FAMILY_NAME).unwrap_or_default(),
        sub_family: first(StringId::SUBFAMILY_NAME).unwrap_or_default(),
        postscript_name: first(StringId::POSTSCRIPT_NAME),
        preferred_family: first(StringId::TYPOGRAPHIC_FAMILY_NAME),
        preferred_sub_family: first(StringId::TYPOGRAPHIC_SUBFAMILY_NAME),
        preferred_families: all(StringId::TYPOGRAPHIC_FAMILY_NAME),
        preferred_sub_families: all(StringId::TYPOGRAPHIC_SUBFAMILY_NAME),
    };

    let has_family = !table.family.is_empty() || table.preferred_family.is_some();
    let has_sub_family = !table.sub_family.is_empty() || table.preferred_sub_family.is_some();
    (has_family && has_sub_family).then_some(table)
}

/// Ordered list of parsers; the first one to succeed wins.
pub struct ParserChain {
    parsers: Vec<Box<dyn FontParser>>,
}

impl ParserChain {
    pub fn new(parsers: Vec<Box<dyn FontParser>>) -> Self {
        Self { parsers }
    }
}

impl Default for ParserChain {
    fn default() -> Self {
        Self::new(vec![Box::new(NameTableParser), Box::new(CollectionParser)])
    }
}

impl std::fmt::Debug for ParserChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.parsers.iter().map(|p| p.label()))
            .finish()
    }
}

impl FontParser for ParserChain {
    fn label(&self) -> &'static str {
        "chain"
    }

    fn parse_data(&self, data: &[u8]) -> Result<Vec<RawNameTable>> {
        let mut last_err = None;
        for parser in &self.parsers {
            match parser.parse_data(data) {
                Ok(tables) => return Ok(tables),
                Err(err) => {
                    debug!("{} parser failed: {err:#}", parser.label());
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow!("no font parsers configured")))
    }
}

/// Parse `path` and normalize every face into a [`FontNameRecord`].
pub fn read_font_records(
    parser: &dyn FontParser,
    path: &Path,
    is_system_font: bool,
) -> Result<Vec<FontNameRecord>> {
    let tables = parser.parse(path)?;
    Ok(tables
        .iter()
        .map(|raw| normalize(raw, path, is_system_font))
        .collect())
}
