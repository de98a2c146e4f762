use std::path::PathBuf;

use proptest::prelude::*;

use sysfont_core::family::aggregate;
use sysfont_core::index::FontIndex;
use sysfont_core::names::FontNameRecord;
use sysfont_core::query::{MissingFont, ResolvedFont, SearchQuery};

fn rec(family: &str, style: &str, file: &str) -> FontNameRecord {
    FontNameRecord::new(family, style, file)
}

fn found(family: &str, style: &str, file: &str) -> ResolvedFont {
    ResolvedFont {
        family: family.into(),
        style: style.into(),
        file: PathBuf::from(file),
    }
}

fn missing(family: &str, style: Option<&str>) -> MissingFont {
    MissingFont {
        family: family.into(),
        style: style.map(str::to_string),
    }
}

fn sample_index() -> FontIndex {
    FontIndex::from_records(&[
        rec("X", "Regular", "/x-regular.ttf"),
        rec("X", "Bold", "/x-bold.ttf"),
        rec("X", "Italic", "/x-italic.ttf"),
        rec("Arial", "Regular", "/arial.ttf"),
    ])
}

#[test]
fn re_aggregation_is_idempotent() {
    let records = vec![
        rec("A", "Regular", "/a.ttf"),
        rec("B", "Bold", "/b.ttf").system(false),
        rec("A", "Bold", "/ab.ttf").with_alternative("A Bold", "Regular"),
    ];

    assert_eq!(aggregate(&records), aggregate(&records));
    assert_eq!(FontIndex::from_records(&records), FontIndex::from_records(&records));
}

#[test]
fn style_order_follows_input_but_files_do_not_depend_on_it() {
    let forward = aggregate(&[rec("A", "Regular", "/f1"), rec("A", "Bold", "/f2")]);
    let reverse = aggregate(&[rec("A", "Bold", "/f2"), rec("A", "Regular", "/f1")]);

    assert_eq!(forward["A"].sub_families, vec!["Regular", "Bold"]);
    assert_eq!(reverse["A"].sub_families, vec!["Bold", "Regular"]);
    assert_eq!(forward["A"].files["Regular"], reverse["A"].files["Regular"]);
    assert_eq!(forward["A"].files["Bold"], reverse["A"].files["Bold"]);
}

#[test]
fn non_system_flag_dominates_in_either_order() {
    let a = aggregate(&[rec("A", "Regular", "/1"), rec("A", "Bold", "/2").system(false)]);
    let b = aggregate(&[rec("A", "Bold", "/2").system(false), rec("A", "Regular", "/1")]);

    assert!(!a["A"].is_system_font);
    assert!(!b["A"].is_system_font);
}

#[test]
fn alternate_family_is_searchable_on_its_own() {
    let index = FontIndex::from_records(&[rec("Foo Bold", "Regular", "/foo-bold.ttf")
        .with_alternative("Foo", "Bold")]);

    assert_eq!(index.len(), 2);
    let result = index.search(&[
        SearchQuery::new("Foo Bold").with_style("Regular"),
        SearchQuery::new("Foo").with_style("Bold"),
    ]);
    assert_eq!(
        result.found,
        vec![
            found("Foo Bold", "Regular", "/foo-bold.ttf"),
            found("Foo", "Bold", "/foo-bold.ttf"),
        ]
    );
    assert!(result.missing.is_empty());
}

#[test]
fn repeated_scalar_styles_equal_one_list_request() {
    let index = sample_index();
    let batched = index.search(&[
        SearchQuery::new("X").with_style("Bold"),
        SearchQuery::new("X").with_style("Italic"),
    ]);
    let listed = index.search(&[SearchQuery::new("X").with_styles(["Bold", "Italic"])]);

    assert_eq!(batched, listed);
    assert_eq!(
        listed.found,
        vec![
            found("X", "Bold", "/x-bold.ttf"),
            found("X", "Italic", "/x-italic.ttf"),
        ]
    );
}

#[test]
fn later_all_styles_request_overrides_narrower_one() {
    let index = sample_index();
    let batched = index.search(&[SearchQuery::new("X").with_style("Bold"), SearchQuery::new("X")]);
    let all = index.search(&[SearchQuery::new("X")]);

    assert_eq!(batched, all);
    assert_eq!(all.found.len(), 3);
    assert_eq!(all.found[0], found("X", "Regular", "/x-regular.ttf"));
}

#[test]
fn unknown_family_reports_every_requested_style() {
    let result = sample_index().search(&[SearchQuery::new("Unknown").with_styles(["Regular", "Bold"])]);

    assert!(result.found.is_empty());
    assert_eq!(
        result.missing,
        vec![
            missing("Unknown", Some("Regular")),
            missing("Unknown", Some("Bold")),
        ]
    );
}

#[test]
fn unknown_family_without_style_is_one_missing_entry() {
    let result = sample_index().search(&[SearchQuery::new("Unknown")]);
    assert_eq!(result.missing, vec![missing("Unknown", None)]);
}

#[test]
fn missing_style_on_known_family() {
    let index = FontIndex::from_records(&[rec("X", "Regular", "/x.ttf")]);
    let result = index.search(&[SearchQuery::new("X").with_style("Bold")]);

    assert!(result.found.is_empty());
    assert_eq!(result.missing, vec![missing("X", Some("Bold"))]);
}

#[test]
fn family_lookup_is_case_sensitive() {
    let result = sample_index().search(&[SearchQuery::new("arial")]);

    assert!(result.found.is_empty());
    assert_eq!(result.missing, vec![missing("arial", None)]);
}

#[test]
fn results_follow_normalized_query_order() {
    let result = sample_index().search(&[
        SearchQuery::new("Arial").with_style("Bold"),
        SearchQuery::new("X").with_style("Regular"),
        SearchQuery::new("Arial").with_style("Regular"),
    ]);

    assert_eq!(
        result.found,
        vec![
            found("Arial", "Regular", "/arial.ttf"),
            found("X", "Regular", "/x-regular.ttf"),
        ]
    );
    assert_eq!(result.missing, vec![missing("Arial", Some("Bold"))]);
}

fn record_strategy() -> impl Strategy<Value = FontNameRecord> {
    (
        prop::sample::select(vec!["A", "B", "C"]),
        prop::sample::select(vec!["Regular", "Bold", "Italic"]),
        0u8..8,
        any::<bool>(),
    )
        .prop_map(|(family, style, file, system)| {
            rec(family, style, &format!("/{file}.ttf")).system(system)
        })
}

proptest! {
    #[test]
    fn aggregation_keeps_every_style_and_last_file(records in prop::collection::vec(record_strategy(), 0..24)) {
        let families = aggregate(&records);

        for (family, entry) in &families {
            let contributing: Vec<&FontNameRecord> =
                records.iter().filter(|r| &r.family == family).collect();
            prop_assert_eq!(entry.sub_families.len(), contributing.len());
            prop_assert_eq!(
                entry.is_system_font,
                contributing.iter().all(|r| r.is_system_font)
            );
            for (style, file) in &entry.files {
                let last = contributing
                    .iter()
                    .rev()
                    .find(|r| &r.sub_family == style)
                    .map(|r| &r.file);
                prop_assert_eq!(Some(file), last);
            }
        }
    }

    #[test]
    fn every_requested_style_is_found_or_missing(styles in prop::collection::vec(
        prop::sample::select(vec!["Regular", "Bold", "Italic", "Black"]), 1..6)
    ) {
        let index = sample_index();
        let queries: Vec<SearchQuery> = styles
            .iter()
            .map(|style| SearchQuery::new("X").with_style(*style))
            .collect();
        let result = index.search(&queries);

        let mut unique: Vec<&str> = Vec::new();
        for style in &styles {
            if !unique.contains(style) {
                unique.push(*style);
            }
        }
        prop_assert_eq!(result.found.len() + result.missing.len(), unique.len());
        prop_assert!(result.missing.iter().all(|m| m.style.as_deref() == Some("Black")));
    }
}
