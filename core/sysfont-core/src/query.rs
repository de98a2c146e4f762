//! Family/style request batching and resolution (made by FontLab https://www.fontlab.com/)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::family::FamilyEntry;

/// Style part of a request: one style name or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleSelector {
    One(String),
    Many(Vec<String>),
}

impl StyleSelector {
    /// Fold into a list; `None` stands for "every style".
    ///
    /// An empty scalar counts as no style at all, whereas an empty list is an
    /// explicit request for nothing.
    fn into_list(self) -> Option<Vec<String>> {
        match self {
            StyleSelector::One(style) if style.is_empty() => None,
            StyleSelector::One(style) => Some(vec![style]),
            StyleSelector::Many(styles) => Some(styles),
        }
    }
}

/// One lookup request as a caller phrases it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleSelector>,
}

impl SearchQuery {
    /// Request every style of `family`.
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(StyleSelector::One(style.into()));
        self
    }

    pub fn with_styles<I, S>(mut self, styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.style = Some(StyleSelector::Many(
            styles.into_iter().map(Into::into).collect(),
        ));
        self
    }
}

/// A request after batching: one per family, styles folded into a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    pub family: String,
    /// `None` means every style the family has.
    pub styles: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFont {
    pub family: String,
    pub style: String,
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingFont {
    pub family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub found: Vec<ResolvedFont>,
    pub missing: Vec<MissingFont>,
}

/// Coalesce a batch so each family appears once, in first-seen order.
///
/// A later request without a style widens the family to every style; style
/// lists merge without duplicates. Once a family is widened, later style
/// lists for it are ignored.
pub fn normalize_queries(requests: &[SearchQuery]) -> Vec<NormalizedQuery> {
    let mut batch: Vec<NormalizedQuery> = Vec::new();

    for request in requests {
        let styles = request.style.clone().and_then(StyleSelector::into_list);

        match batch.iter_mut().find(|q| q.family == request.family) {
            Some(existing) => match styles {
                None => existing.styles = None,
                Some(new_styles) => {
                    if let Some(current) = existing.styles.as_mut() {
                        for style in new_styles {
                            if !current.contains(&style) {
                                current.push(style);
                            }
                        }
                    }
                }
            },
            None => batch.push(NormalizedQuery {
                family: request.family.clone(),
                styles,
            }),
        }
    }

    batch
}

/// Resolve a batch against index entries.
///
/// Family names must match exactly (no case folding). Results from every
/// normalized query are concatenated in query order.
pub fn resolve(entries: &[FamilyEntry], requests: &[SearchQuery]) -> SearchResult {
    let mut result = SearchResult::default();

    for query in normalize_queries(requests) {
        let entry = entries.iter().find(|entry| entry.family == query.family);

        match (entry, query.styles) {
            (Some(entry), Some(styles)) => {
                for style in styles {
                    match entry.files.get(&style) {
                        Some(file) => result.found.push(ResolvedFont {
                            family: query.family.clone(),
                            style,
                            file: file.clone(),
                        }),
                        None => result.missing.push(MissingFont {
                            family: query.family.clone(),
                            style: Some(style),
                        }),
                    }
                }
            }
            (Some(entry), None) => {
                result
                    .found
                    .extend(entry.files.iter().map(|(style, file)| ResolvedFont {
                        family: query.family.clone(),
                        style: style.clone(),
                        file: file.clone(),
                    }));
            }
            (None, Some(styles)) => {
                result
                    .missing
                    .extend(styles.into_iter().map(|style| MissingFont {
                        family: query.family.clone(),
                        style: Some(style),
                    }));
            }
            (None, None) => result.missing.push(MissingFont {
                family: query.family,
                style: None,
            }),
        }
    }

    result
}
