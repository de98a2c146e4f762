//! Minimal sfnt / TTC byte builders for tests that need real name tables.
#![allow(dead_code)]

pub const EN_US: u16 = 0x0409;
pub const FR_FR: u16 = 0x040C;

/// One Windows/Unicode BMP name record.
#[derive(Clone, Copy)]
pub struct Name<'a> {
    pub id: u16,
    pub language: u16,
    pub value: &'a str,
}

pub fn en(id: u16, value: &str) -> Name<'_> {
    Name {
        id,
        language: EN_US,
        value,
    }
}

pub fn fr(id: u16, value: &str) -> Name<'_> {
    Name {
        id,
        language: FR_FR,
        value,
    }
}

/// A single-font file containing only a `name` table.
pub fn sfnt(names: &[Name]) -> Vec<u8> {
    sfnt_at(0, names)
}

/// A TrueType collection holding one face per entry.
pub fn collection(faces: &[Vec<Name>]) -> Vec<u8> {
    let header_len = 12 + 4 * faces.len();
    let mut offsets = Vec::new();
    let mut body = Vec::new();
    for face in faces {
        let base = header_len + body.len();
        offsets.push(base as u32);
        body.extend(sfnt_at(base, face));
    }

    let mut out = Vec::new();
    out.extend(b"ttcf");
    out.extend(1u16.to_be_bytes());
    out.extend(0u16.to_be_bytes());
    out.extend((faces.len() as u32).to_be_bytes());
    for offset in offsets {
        out.extend(offset.to_be_bytes());
    }
    out.extend(body);
    out
}

// Table offsets in a collection are relative to the start of the file, so each
// face is built knowing where it will land.
fn sfnt_at(base: usize, names: &[Name]) -> Vec<u8> {
    let name_table = name_table(names);
    let table_offset = base + 12 + 16;

    let mut out = Vec::new();
    out.extend(0x0001_0000u32.to_be_bytes());
    out.extend(1u16.to_be_bytes());
    out.extend(16u16.to_be_bytes());
    out.extend(0u16.to_be_bytes());
    out.extend(0u16.to_be_bytes());
    out.extend(b"name");
    out.extend(0u32.to_be_bytes());
    out.extend((table_offset as u32).to_be_bytes());
    out.extend((name_table.len() as u32).to_be_bytes());
    out.extend(name_table);
    out
}

fn name_table(names: &[Name]) -> Vec<u8> {
    let mut sorted = names.to_vec();
    sorted.sort_by_key(|n| (n.language, n.id));

    let mut storage = Vec::new();
    let mut records = Vec::new();
    for name in &sorted {
        let encoded: Vec<u8> = name
            .value
            .encode_utf16()
            .flat_map(|unit| unit.to_be_bytes())
            .collect();
        for field in [
            3u16,
            1,
            name.language,
            name.id,
            encoded.len() as u16,
            storage.len() as u16,
        ] {
            records.extend(field.to_be_bytes());
        }
        storage.extend(encoded);
    }

    let mut out = Vec::new();
    out.extend(0u16.to_be_bytes());
    out.extend((sorted.len() as u16).to_be_bytes());
    out.extend((6 + 12 * sorted.len() as u16).to_be_bytes());
    out.extend(records);
    out.extend(storage);
    out
}
