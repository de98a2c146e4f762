//! Indexing fonts under the alternate family names they declare (made by FontLab https://www.fontlab.com/)

use std::collections::HashMap;
use std::path::PathBuf;

use log::trace;

use crate::family::FamilyEntry;

/// One claimed identity, copied out of the entry that declared it.
struct Claim {
    family: String,
    sub_family: String,
    file: Option<PathBuf>,
    postscript_name: Option<String>,
    is_system_font: bool,
}

/// Register every alternate `(family, subfamily)` pair under its own family.
///
/// Only entries present when the pass starts are scanned; entries created here
/// carry no alternates of their own, so there is no transitive expansion. When
/// the target family already lists the subfamily, the first registration is
/// kept.
pub fn reconcile(entries: &mut Vec<FamilyEntry>) {
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (idx, entry) in entries.iter().enumerate() {
        positions.entry(entry.family.clone()).or_insert(idx);
    }

    let original_len = entries.len();
    for idx in 0..original_len {
        for claim in claims(&entries[idx]) {
            match positions.get(&claim.family) {
                Some(&target) => {
                    let existing = &mut entries[target];
                    if existing.has_style(&claim.sub_family) {
                        continue;
                    }
                    trace!(
                        "adding {}/{} as alternate style",
                        claim.family,
                        claim.sub_family
                    );
                    existing.sub_families.push(claim.sub_family.clone());
                    set_style(existing, &claim);
                }
                None => {
                    trace!("creating alternate family {}", claim.family);
                    let mut created = FamilyEntry::bare(&claim.family, claim.is_system_font);
                    created.sub_families.push(claim.sub_family.clone());
                    set_style(&mut created, &claim);
                    positions.insert(claim.family.clone(), entries.len());
                    entries.push(created);
                }
            }
        }
    }
}

fn claims(entry: &FamilyEntry) -> Vec<Claim> {
    let mut claims = Vec::new();

    for (style, alt_families) in &entry.alternative_families {
        let alt_sub_families = entry.alternative_sub_families.get(style);
        for (idx, alt_family) in alt_families.iter().enumerate() {
            if alt_family.is_empty() || *alt_family == entry.family {
                continue;
            }
            claims.push(Claim {
                family: alt_family.clone(),
                sub_family: alt_sub_families
                    .and_then(|subs| subs.get(idx))
                    .cloned()
                    .unwrap_or_default(),
                file: entry.files.get(style).cloned(),
                postscript_name: entry.postscript_names.get(style).cloned().flatten(),
                is_system_font: entry.is_system_font,
            });
        }
    }

    claims
}

fn set_style(entry: &mut FamilyEntry, claim: &Claim) {
    if let Some(file) = &claim.file {
        entry.files.insert(claim.sub_family.clone(), file.clone());
    }
    entry
        .postscript_names
        .insert(claim.sub_family.clone(), claim.postscript_name.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::aggregate;
    use crate::names::FontNameRecord;

    fn build(records: &[FontNameRecord]) -> Vec<FamilyEntry> {
        let mut entries: Vec<FamilyEntry> = aggregate(records).into_values().collect();
        reconcile(&mut entries);
        entries
    }

    fn find<'a>(entries: &'a [FamilyEntry], family: &str) -> &'a FamilyEntry {
        entries
            .iter()
            .find(|e| e.family == family)
            .unwrap_or_else(|| panic!("{family} not indexed"))
    }

    #[test]
    fn creates_independent_alternate_entry() {
        let entries = build(&[FontNameRecord::new("Foo Bold", "Regular", "/foo-bold.ttf")
            .with_postscript_name("Foo-Bold")
            .with_alternative("Foo", "Bold")]);

        assert_eq!(entries.len(), 2);
        let original = find(&entries, "Foo Bold");
        assert_eq!(original.sub_families, vec!["Regular"]);

        let alternate = find(&entries, "Foo");
        assert_eq!(alternate.sub_families, vec!["Bold"]);
        assert_eq!(alternate.files["Bold"], PathBuf::from("/foo-bold.ttf"));
        assert_eq!(alternate.postscript_names["Bold"].as_deref(), Some("Foo-Bold"));
        assert!(alternate.alternative_families.is_empty());
    }

    #[test]
    fn extends_existing_family_without_overwriting() {
        let entries = build(&[
            FontNameRecord::new("Foo", "Regular", "/foo.ttf"),
            FontNameRecord::new("Foo", "Bold", "/foo-real-bold.ttf"),
            FontNameRecord::new("Foo Black", "Regular", "/foo-black.ttf")
                .with_alternative("Foo", "Black")
                .with_alternative("Foo", "Bold"),
        ]);

        assert_eq!(entries.len(), 2);
        let foo = find(&entries, "Foo");
        assert_eq!(foo.sub_families, vec!["Regular", "Bold", "Black"]);
        assert_eq!(foo.files["Black"], PathBuf::from("/foo-black.ttf"));
        assert_eq!(foo.files["Bold"], PathBuf::from("/foo-real-bold.ttf"));
    }

    #[test]
    fn skips_empty_and_self_referencing_alternates() {
        let entries = build(&[FontNameRecord::new("Foo", "Regular", "/foo.ttf")
            .with_alternative("", "Bold")
            .with_alternative("Foo", "Italic")]);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sub_families, vec!["Regular"]);
    }

    #[test]
    fn two_sources_claiming_same_alternate_first_wins() {
        let entries = build(&[
            FontNameRecord::new("Foo Bold", "Regular", "/a.ttf").with_alternative("Foo", "Bold"),
            FontNameRecord::new("Foo Heavy", "Regular", "/b.ttf").with_alternative("Foo", "Bold"),
        ]);

        let foo = find(&entries, "Foo");
        assert_eq!(foo.sub_families, vec!["Bold"]);
        assert_eq!(foo.files["Bold"], PathBuf::from("/a.ttf"));
    }

    #[test]
    fn created_entries_copy_system_flag() {
        let entries = build(&[FontNameRecord::new("Foo Bold", "Regular", "/a.ttf")
            .with_alternative("Foo", "Bold")
            .system(false)]);

        assert!(!find(&entries, "Foo").is_system_font);
    }

    #[test]
    fn missing_subfamily_counterpart_becomes_empty_style() {
        let mut record = FontNameRecord::new("Foo Bold", "Regular", "/a.ttf");
        record.alternative_families = vec!["Foo".into()];
        let entries = build(&[record]);

        assert_eq!(find(&entries, "Foo").sub_families, vec![""]);
    }
}
