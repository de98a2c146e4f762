//! Scanning installed fonts into an index snapshot (made by FontLab https://www.fontlab.com/)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use log::{debug, info};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::discovery::{system_font_dirs, FontDiscovery, FontSourceRef, PathDiscovery};
use crate::index::FontIndex;
use crate::names::FontNameRecord;
use crate::parse::{read_font_records, FontParser, ParserChain};
use crate::query::{SearchQuery, SearchResult};

#[derive(Debug, Default, Clone)]
pub struct SystemFontsOptions {
    /// Extra directories scanned before the platform ones; their fonts are
    /// reported as non-system.
    pub custom_dirs: Vec<PathBuf>,
    /// Only index fonts found under `custom_dirs`.
    pub ignore_system_fonts: bool,
    pub follow_symlinks: bool,
    /// Worker threads for parsing; `None` uses the global rayon pool.
    pub jobs: Option<usize>,
}

impl SystemFontsOptions {
    fn validate(&self) -> Result<()> {
        for dir in &self.custom_dirs {
            if dir.as_os_str().is_empty() {
                bail!("custom font directories must be non-empty paths");
            }
            if dir.is_file() {
                bail!(
                    "custom font directory {} is a file, expected a folder",
                    dir.display()
                );
            }
        }
        if matches!(self.jobs, Some(0)) {
            bail!("jobs must be at least 1 when provided");
        }
        Ok(())
    }
}

/// Installed fonts of this machine plus any custom directories.
///
/// Holds the discovered file list; every index built from it is a fresh,
/// immutable [`FontIndex`].
pub struct SystemFonts {
    options: SystemFontsOptions,
    directories: Vec<PathBuf>,
    parser: Arc<dyn FontParser>,
    all_files: Vec<FontSourceRef>,
}

impl SystemFonts {
    /// Validate options and discover font files in custom and platform directories.
    pub fn new(options: SystemFontsOptions) -> Result<Self> {
        let mut directories = options.custom_dirs.clone();
        directories.extend(system_font_dirs());
        Self::with_directories(options, directories)
    }

    /// Like [`SystemFonts::new`] but scanning exactly `directories`.
    ///
    /// Directories listed in `options.custom_dirs` keep their non-system flag.
    pub fn with_directories(options: SystemFontsOptions, directories: Vec<PathBuf>) -> Result<Self> {
        options.validate()?;
        let mut fonts = Self {
            options,
            directories,
            parser: Arc::new(ParserChain::default()),
            all_files: Vec::new(),
        };
        fonts.refresh()?;
        Ok(fonts)
    }

    /// Replace the name-table parser used for indexing.
    pub fn with_parser(mut self, parser: Arc<dyn FontParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Re-run discovery, e.g. after fonts were installed.
    pub fn refresh(&mut self) -> Result<()> {
        let discovery = PathDiscovery::new(self.directories.iter().cloned())
            .custom_roots(self.options.custom_dirs.iter().cloned())
            .follow_symlinks(self.options.follow_symlinks);
        self.all_files = discovery.discover()?;
        debug!(
            "discovered {} font files in {} directories",
            self.all_files.len(),
            self.directories.len()
        );
        Ok(())
    }

    /// Every discovered font file, including formats that are not parsed.
    pub fn all_font_files(&self) -> Vec<PathBuf> {
        self.all_files.iter().map(|f| f.path.clone()).collect()
    }

    /// Discovered files the parsers can read.
    pub fn font_files(&self) -> Vec<PathBuf> {
        self.readable().map(|f| f.path.clone()).collect()
    }

    fn readable(&self) -> impl Iterator<Item = &FontSourceRef> {
        self.all_files.iter().filter(|f| f.kind.is_parseable())
    }

    fn is_custom(&self, path: &Path) -> bool {
        self.all_files.iter().any(|f| f.custom && f.path == path)
    }

    /// Normalized records for one file, flagged against the custom file set.
    pub fn font_info(&self, path: &Path) -> Result<Vec<FontNameRecord>> {
        read_font_records(self.parser.as_ref(), path, !self.is_custom(path))
    }

    /// Parse every readable file and build a new index snapshot.
    ///
    /// Files are parsed in parallel but folded in discovery order. Files that
    /// fail to parse are left out.
    pub fn build_index(&self) -> Result<FontIndex> {
        let sources: Vec<&FontSourceRef> = self
            .readable()
            .filter(|f| !self.options.ignore_system_fonts || f.custom)
            .collect();
        let parser = self.parser.as_ref();

        let run_parse = || -> Vec<Vec<FontNameRecord>> {
            sources
                .par_iter()
                .map(|source| {
                    read_font_records(parser, &source.path, !source.custom).unwrap_or_else(|err| {
                        debug!("skipping {}: {err:#}", source.path.display());
                        Vec::new()
                    })
                })
                .collect()
        };

        let parsed = if let Some(jobs) = self.options.jobs {
            let pool = ThreadPoolBuilder::new().num_threads(jobs).build()?;
            pool.install(run_parse)
        } else {
            run_parse()
        };

        let records: Vec<FontNameRecord> = parsed.into_iter().flatten().collect();
        let index = FontIndex::from_records(&records);
        info!(
            "indexed {} faces from {} files into {} families",
            records.len(),
            sources.len(),
            index.len()
        );
        Ok(index)
    }

    /// Sorted, unique family names.
    pub fn font_families(&self) -> Result<Vec<String>> {
        Ok(self.build_index()?.family_names())
    }

    /// Build a fresh index and resolve `queries` against it.
    pub fn find_fonts(&self, queries: &[SearchQuery]) -> Result<SearchResult> {
        Ok(self.build_index()?.search(queries))
    }

    pub(crate) fn first_record(&self, path: &Path) -> Option<FontNameRecord> {
        match self.font_info(path) {
            Ok(records) => records.into_iter().next(),
            Err(err) => {
                debug!("cannot read {} before install: {err:#}", path.display());
                None
            }
        }
    }
}

impl std::fmt::Debug for SystemFonts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemFonts")
            .field("options", &self.options)
            .field("directories", &self.directories)
            .field("files", &self.all_files.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::{name_id, FlatNameTable, RawNameTable};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn rejects_file_as_custom_dir() {
        let tmp = tempdir().expect("tempdir");
        let file = tmp.path().join("fonts.txt");
        fs::write(&file, b"").expect("touch");

        let options = SystemFontsOptions {
            custom_dirs: vec![file],
            ..Default::default()
        };
        let err = SystemFonts::with_directories(options, Vec::new()).unwrap_err();
        assert!(err.to_string().contains("is a file"));
    }

    #[test]
    fn rejects_empty_custom_dir_and_zero_jobs() {
        let options = SystemFontsOptions {
            custom_dirs: vec![PathBuf::new()],
            ..Default::default()
        };
        assert!(SystemFonts::with_directories(options, Vec::new()).is_err());

        let options = SystemFontsOptions {
            jobs: Some(0),
            ..Default::default()
        };
        assert!(SystemFonts::with_directories(options, Vec::new()).is_err());
    }

    #[test]
    fn missing_custom_dir_is_accepted() {
        let options = SystemFontsOptions {
            custom_dirs: vec![PathBuf::from("/nonexistent/sysfont")],
            ..Default::default()
        };
        let fonts = SystemFonts::with_directories(options, vec![PathBuf::from("/nonexistent/sysfont")])
            .expect("construct");
        assert!(fonts.all_font_files().is_empty());
        assert!(fonts.build_index().expect("index").is_empty());
    }

    struct FixedNames;

    impl FontParser for FixedNames {
        fn label(&self) -> &'static str {
            "fixed"
        }

        fn parse_data(&self, data: &[u8]) -> Result<Vec<RawNameTable>> {
            let style = String::from_utf8_lossy(data).to_string();
            Ok(vec![RawNameTable::Flat(
                FlatNameTable::default()
                    .with(name_id::FAMILY, "Fixed")
                    .with(name_id::SUBFAMILY, style),
            )])
        }
    }

    #[test]
    fn custom_parser_feeds_the_index() {
        let tmp = tempdir().expect("tempdir");
        fs::write(tmp.path().join("a.ttf"), b"Regular").expect("write");
        fs::write(tmp.path().join("b.ttf"), b"Bold").expect("write");

        let fonts = SystemFonts::with_directories(
            SystemFontsOptions::default(),
            vec![tmp.path().to_path_buf()],
        )
        .expect("construct")
        .with_parser(Arc::new(FixedNames));

        assert_eq!(fonts.directories(), [tmp.path().to_path_buf()]);
        let index = fonts.build_index().expect("index");
        let fixed = index.get("Fixed").expect("family");
        assert_eq!(fixed.sub_families, vec!["Regular", "Bold"]);
        assert_eq!(fixed.file("Bold"), Some(&tmp.path().join("b.ttf")));
    }

    #[test]
    fn dfont_is_listed_but_not_readable() {
        let tmp = tempdir().expect("tempdir");
        fs::write(tmp.path().join("Old.dfont"), b"").expect("touch");
        fs::write(tmp.path().join("New.ttf"), b"").expect("touch");

        let fonts = SystemFonts::with_directories(
            SystemFontsOptions::default(),
            vec![tmp.path().to_path_buf()],
        )
        .expect("construct");

        assert_eq!(fonts.all_font_files().len(), 2);
        assert_eq!(fonts.font_files(), vec![tmp.path().join("New.ttf")]);
    }
}
