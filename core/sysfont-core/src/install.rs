//! Installing missing fonts into a user font directory (made by FontLab https://www.fontlab.com/)

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::discovery::user_font_dir;
use crate::query::{ResolvedFont, SearchQuery};
use crate::system::SystemFonts;

/// How long a registration helper may run before it is killed.
pub const DEFAULT_HELPER_TIMEOUT: Duration = Duration::from_secs(20);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Performs OS-level installation of font files.
pub trait FontInstaller {
    /// Install `files`, returning how many were actually added.
    fn install(&self, files: &[PathBuf]) -> Result<usize>;
}

/// External program run after files are copied (e.g. `fc-cache -f`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl HelperCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_HELPER_TIMEOUT,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the helper, killing it once the timeout elapses.
    ///
    /// A timeout, a non-zero exit status or anything written to stderr is an
    /// error.
    pub fn run(&self) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawning {}", self.program))?;

        // Read stderr while the helper runs so a chatty helper never fills the pipe.
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut text = String::new();
                pipe.read_to_string(&mut text).ok();
                text
            })
        });

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                warn!(
                    "killing {} after {:.1}s timeout",
                    self.program,
                    self.timeout.as_secs_f32()
                );
                child.kill().ok();
                child.wait().ok();
                bail!("{} timed out after {:?}", self.program, self.timeout);
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stderr = stderr_reader
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();

        if !status.success() {
            bail!("{} exited with {status}: {}", self.program, stderr.trim());
        }
        if !stderr.trim().is_empty() {
            bail!("{} reported: {}", self.program, stderr.trim());
        }
        Ok(())
    }
}

/// Copies fonts into a directory the OS scans, then runs an optional helper.
#[derive(Debug, Clone)]
pub struct CopyInstaller {
    target_dir: PathBuf,
    helper: Option<HelperCommand>,
}

impl CopyInstaller {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            helper: None,
        }
    }

    /// Install into the current user's font directory.
    pub fn for_user() -> Result<Self> {
        user_font_dir()
            .map(Self::new)
            .ok_or_else(|| anyhow!("cannot determine the user font directory"))
    }

    pub fn with_helper(mut self, helper: HelperCommand) -> Self {
        self.helper = Some(helper);
        self
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    // `Name.ttf` also counts as present when the OS renamed it to `Name_0.ttf`.
    fn already_present(&self, file_name: &Path) -> bool {
        if self.target_dir.join(file_name).exists() {
            return true;
        }
        let (Some(stem), Some(ext)) = (file_name.file_stem(), file_name.extension()) else {
            return false;
        };
        let mut renamed = stem.to_os_string();
        renamed.push("_0.");
        renamed.push(ext);
        self.target_dir.join(renamed).exists()
    }
}

impl FontInstaller for CopyInstaller {
    fn install(&self, files: &[PathBuf]) -> Result<usize> {
        fs::create_dir_all(&self.target_dir)
            .with_context(|| format!("creating {}", self.target_dir.display()))?;

        let mut copied = 0;
        for file in files {
            let file_name = file
                .file_name()
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("not a file path: {}", file.display()))?;
            if self.already_present(&file_name) {
                debug!("{} already present in {}", file_name.display(), self.target_dir.display());
                continue;
            }
            let dest = self.target_dir.join(&file_name);
            fs::copy(file, &dest)
                .with_context(|| format!("copying {} to {}", file.display(), dest.display()))?;
            copied += 1;
        }

        if let Some(helper) = &self.helper {
            helper.run()?;
        }
        Ok(copied)
    }
}

/// A font the caller asked to install, identified by its own name table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFont {
    pub family: String,
    pub style: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledFont {
    pub family: String,
    pub style: String,
    /// Where the index now finds the font.
    pub file: PathBuf,
    /// The file that was handed to the installer.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallOutcome {
    /// True when nothing requested is still missing.
    pub success: bool,
    /// Fonts that were already installed before this call.
    pub found: Vec<ResolvedFont>,
    /// Fonts still not resolvable after installation.
    pub missing: Vec<PendingFont>,
    pub installed: Vec<InstalledFont>,
    /// Files whose name table could not be read; they are not installed.
    pub unreadable: Vec<PathBuf>,
    /// Number of files the installer reported as added.
    pub copied: usize,
}

impl SystemFonts {
    /// Install any of `files` that the current index cannot resolve.
    ///
    /// On installer failure the error is returned and the discovered file list
    /// is left as it was. After a successful run the file list is refreshed
    /// and a fresh index decides which fonts are now installed.
    pub fn install_fonts(
        &mut self,
        installer: &dyn FontInstaller,
        files: &[PathBuf],
    ) -> Result<InstallOutcome> {
        let before = self.build_index()?;
        let mut outcome = InstallOutcome::default();
        let mut pending = Vec::new();

        for file in files {
            let path = fs::canonicalize(file).unwrap_or_else(|_| file.clone());
            let Some(record) = self.first_record(&path) else {
                outcome.unreadable.push(path);
                continue;
            };
            let query = SearchQuery::new(&record.family).with_style(&record.sub_family);
            match before.search(&[query]).found.into_iter().next() {
                Some(found) => outcome.found.push(found),
                None => pending.push(PendingFont {
                    family: record.family,
                    style: record.sub_family,
                    path,
                }),
            }
        }

        if pending.is_empty() {
            outcome.success = true;
            return Ok(outcome);
        }

        let paths: Vec<PathBuf> = pending.iter().map(|p| p.path.clone()).collect();
        outcome.copied = installer.install(&paths)?;
        info!("installer added {} of {} fonts", outcome.copied, paths.len());

        self.refresh()?;
        let after = self.build_index()?;
        for font in pending {
            let query = SearchQuery::new(&font.family).with_style(&font.style);
            match after.search(&[query]).found.into_iter().next() {
                Some(found) => outcome.installed.push(InstalledFont {
                    family: found.family,
                    style: found.style,
                    file: found.file,
                    path: font.path,
                }),
                None => outcome.missing.push(font),
            }
        }

        outcome.success = outcome.missing.is_empty();
        Ok(outcome)
    }
}
