//! Font file classification by extension or sniffed signature (made by FontLab https://www.fontlab.com/)

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Bytes read from an extension-less file when sniffing its signature.
pub const SNIFF_LEN: usize = 12;

/// Kind of font container a candidate file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontKind {
    Ttf,
    Otf,
    Ttc,
    Dfont,
}

impl FontKind {
    /// Whether the name-table parsers can read this kind.
    ///
    /// Mac resource-fork suitcases (`.dfont`) are discoverable but never parsed.
    pub fn is_parseable(self) -> bool {
        !matches!(self, FontKind::Dfont)
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ttf" => Some(FontKind::Ttf),
            "otf" => Some(FontKind::Otf),
            "ttc" => Some(FontKind::Ttc),
            "dfont" => Some(FontKind::Dfont),
            _ => None,
        }
    }
}

/// Classify a path as a font file.
///
/// Files with an extension are judged by suffix alone. Files without one are
/// opened and their leading bytes matched against sfnt signatures; read
/// failures mean "not a font".
pub fn classify(path: &Path) -> Option<FontKind> {
    match path.extension() {
        Some(ext) => FontKind::from_extension(&ext.to_string_lossy()),
        None => read_prefix(path).and_then(|prefix| sniff(&prefix)),
    }
}

/// Match a byte prefix against the TrueType, OpenType/CFF and collection signatures.
pub fn sniff(prefix: &[u8]) -> Option<FontKind> {
    if prefix.starts_with(&[0x00, 0x01, 0x00, 0x00, 0x00]) || prefix.starts_with(b"true") {
        Some(FontKind::Ttf)
    } else if prefix.starts_with(b"OTTO") {
        Some(FontKind::Otf)
    } else if prefix.starts_with(b"ttcf") {
        Some(FontKind::Ttc)
    } else {
        None
    }
}

fn read_prefix(path: &Path) -> Option<Vec<u8>> {
    let file = File::open(path).ok()?;
    let mut buf = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut buf).ok()?;
    Some(buf)
}
