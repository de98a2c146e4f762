//! sysfont CLI (made by FontLab https://www.fontlab.com/)

pub mod server;

use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use log::{debug, info};
use serde::Serialize;

use sysfont_core::discovery::system_font_dirs;
use sysfont_core::install::{CopyInstaller, HelperCommand, InstallOutcome, DEFAULT_HELPER_TIMEOUT};
use sysfont_core::names::FontNameRecord;
use sysfont_core::output::{write_json_pretty, write_ndjson};
use sysfont_core::query::{MissingFont, ResolvedFont, SearchQuery, SearchResult};
use sysfont_core::system::{SystemFonts, SystemFontsOptions};

/// CLI entrypoint for sysfont.
#[derive(Debug, Parser)]
#[command(
    name = "sysfont",
    about = "Installed font lookup by family and style (made by FontLab https://www.fontlab.com/)"
)]
pub struct Cli {
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,

    #[command(flatten)]
    scan: ScanArgs,

    #[command(subcommand)]
    command: Command,
}

/// Where to look for fonts; shared by every subcommand.
#[derive(Debug, Clone, Args)]
struct ScanArgs {
    /// Extra font directory, scanned before the platform ones (repeatable)
    #[arg(long = "dir", global = true, value_hint = ValueHint::DirPath)]
    dirs: Vec<PathBuf>,

    /// Skip the platform font directories entirely
    #[arg(long = "no-system-fonts", global = true, action = ArgAction::SetTrue)]
    no_system_fonts: bool,

    /// Follow symlinked directories while walking
    #[arg(long = "follow-symlinks", global = true, action = ArgAction::SetTrue)]
    follow_symlinks: bool,

    /// Number of parsing threads (defaults to one per core)
    #[arg(short = 'j', long = "jobs", global = true)]
    jobs: Option<usize>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List installed font families
    List(ListArgs),
    /// List discovered font files
    Files(FilesArgs),
    /// Resolve family/style requests to files
    Find(FindArgs),
    /// Show the names read from font files
    Info(InfoArgs),
    /// Install fonts that are not yet available
    Install(InstallArgs),
    /// Serve lookups over HTTP
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Emit a single JSON document
    #[arg(long = "json", action = ArgAction::SetTrue, conflicts_with = "ndjson")]
    json: bool,

    /// Emit newline-delimited JSON
    #[arg(long = "ndjson", action = ArgAction::SetTrue)]
    ndjson: bool,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Print every style and file of each family
    #[arg(long = "extended", action = ArgAction::SetTrue)]
    extended: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct FilesArgs {
    /// Include formats that are discovered but never parsed (dfont)
    #[arg(long = "all", action = ArgAction::SetTrue)]
    all: bool,

    /// Emit a JSON array
    #[arg(long = "json", action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Debug, Args)]
struct FindArgs {
    /// Font request as "Family" or "Family:Style,Style" (repeatable)
    #[arg(short = 'F', long = "font", value_hint = ValueHint::Other)]
    fonts: Vec<String>,

    /// JSON file with an array of {"family", "style"} requests, or - for STDIN
    #[arg(long = "request", value_hint = ValueHint::FilePath)]
    request: Option<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,

    /// Control colorized output (auto|always|never)
    #[arg(long = "color", default_value_t = ColorChoice::Auto, value_enum)]
    color: ColorChoice,
}

#[derive(Debug, Args)]
struct InfoArgs {
    /// Font files to read
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    files: Vec<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct InstallArgs {
    /// Font files to install
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    files: Vec<PathBuf>,

    /// Copy into this directory instead of the user font directory
    #[arg(long = "target", value_hint = ValueHint::DirPath)]
    target: Option<PathBuf>,

    /// Seconds to wait for the font registration helper
    #[arg(long = "timeout", default_value_t = DEFAULT_HELPER_TIMEOUT.as_secs())]
    timeout: u64,

    /// Emit the outcome as JSON
    #[arg(long = "json", action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long = "bind", default_value = "127.0.0.1:8765")]
    bind: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

/// Everything needed to rediscover the same set of fonts later on.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub options: SystemFontsOptions,
    pub directories: Vec<PathBuf>,
}

impl ScanConfig {
    /// Discover font files; the returned facade can build indexes.
    pub fn open(&self) -> Result<SystemFonts> {
        SystemFonts::with_directories(self.options.clone(), self.directories.clone())
    }
}

impl ScanArgs {
    fn config(&self, extra_dirs: &[PathBuf]) -> ScanConfig {
        let options = SystemFontsOptions {
            custom_dirs: self.dirs.clone(),
            ignore_system_fonts: false,
            follow_symlinks: self.follow_symlinks,
            jobs: self.jobs,
        };
        let mut directories = self.dirs.clone();
        directories.extend(extra_dirs.iter().cloned());
        if !self.no_system_fonts {
            directories.extend(system_font_dirs());
        }
        ScanConfig {
            options,
            directories,
        }
    }
}

/// Parse CLI args and execute the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.verbose);

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match cli.command {
        Command::List(args) => run_list(&cli.scan, args, &mut handle),
        Command::Files(args) => run_files(&cli.scan, args, &mut handle),
        Command::Find(args) => run_find(&cli.scan, args, &mut handle),
        Command::Info(args) => run_info(&cli.scan, args, &mut handle),
        Command::Install(args) => run_install(&cli.scan, args, &mut handle),
        Command::Serve(args) => run_serve(&cli.scan, args),
    }
}

// `-v`/`-q` win over RUST_LOG; without them RUST_LOG refines the warn default.
fn init_logging(verbose: &Verbosity<WarnLevel>) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(verbose.log_level_filter());
    if !verbose.is_present() {
        builder.parse_default_env();
    }
    let _ = builder.try_init();
}

fn run_list(scan: &ScanArgs, args: ListArgs, mut w: impl Write) -> Result<()> {
    let index = scan.config(&[]).open()?.build_index()?;

    if args.extended {
        if args.output.ndjson {
            write_ndjson(index.families(), &mut w)
        } else if args.output.json {
            write_json_pretty(&index, &mut w)
        } else {
            for entry in index.families() {
                for (style, file) in &entry.files {
                    writeln!(w, "{}\t{}\t{}", entry.family, style, file.display())?;
                }
            }
            Ok(())
        }
    } else {
        let names = index.family_names();
        if args.output.ndjson {
            write_ndjson(&names, &mut w)
        } else if args.output.json {
            write_json_pretty(&names, &mut w)
        } else {
            for name in names {
                writeln!(w, "{name}")?;
            }
            Ok(())
        }
    }
}

fn run_files(scan: &ScanArgs, args: FilesArgs, mut w: impl Write) -> Result<()> {
    let fonts = scan.config(&[]).open()?;
    let files = if args.all {
        fonts.all_font_files()
    } else {
        fonts.font_files()
    };

    if args.json {
        return write_json_pretty(&files, &mut w);
    }
    for file in files {
        writeln!(w, "{}", file.display())?;
    }
    Ok(())
}

fn run_find(scan: &ScanArgs, args: FindArgs, mut w: impl Write) -> Result<()> {
    let mut queries = match &args.request {
        Some(path) => read_request(path, io::stdin().lock())?,
        None => Vec::new(),
    };
    for raw in &args.fonts {
        queries.push(parse_font_arg(raw)?);
    }
    if queries.is_empty() {
        return Err(anyhow!("nothing to find: pass --font or --request"));
    }
    debug!("resolving {} requests", queries.len());

    let result = scan.config(&[]).open()?.find_fonts(&queries)?;

    if args.output.ndjson {
        write_ndjson(&find_lines(&result), &mut w)
    } else if args.output.json {
        write_json_pretty(&result, &mut w)
    } else {
        let use_color = match args.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => io::stdout().is_terminal(),
        };
        write_find_plain(&result, &mut w, use_color)
    }
}

fn run_info(scan: &ScanArgs, args: InfoArgs, mut w: impl Write) -> Result<()> {
    let fonts = scan.config(&[]).open()?;
    let mut records: Vec<FontNameRecord> = Vec::new();
    for file in &args.files {
        records.extend(
            fonts
                .font_info(file)
                .with_context(|| format!("reading {}", file.display()))?,
        );
    }

    if args.output.ndjson {
        write_ndjson(&records, &mut w)
    } else if args.output.json {
        write_json_pretty(&records, &mut w)
    } else {
        for record in &records {
            writeln!(
                w,
                "{}\t{}\t{}\t{}",
                record.file.display(),
                record.family,
                record.sub_family,
                record.postscript_name.as_deref().unwrap_or("-")
            )?;
        }
        Ok(())
    }
}

fn run_install(scan: &ScanArgs, args: InstallArgs, mut w: impl Write) -> Result<()> {
    let installer = match &args.target {
        Some(target) => CopyInstaller::new(target),
        None => with_platform_helper(CopyInstaller::for_user()?, args.timeout),
    };
    let target = installer.target_dir().to_path_buf();
    info!("installing into {}", target.display());

    let mut fonts = scan.config(std::slice::from_ref(&target)).open()?;
    let outcome = fonts.install_fonts(&installer, &args.files)?;

    if args.json {
        return write_json_pretty(&outcome, &mut w);
    }
    write_install_plain(&outcome, &mut w)
}

// Linux needs the fontconfig cache rebuilt before new fonts show up elsewhere.
fn with_platform_helper(installer: CopyInstaller, timeout: u64) -> CopyInstaller {
    if cfg!(any(target_os = "macos", target_os = "windows")) {
        return installer;
    }
    let dir = installer.target_dir().display().to_string();
    let helper = HelperCommand::new("fc-cache")
        .with_args(["-f".to_string(), dir])
        .with_timeout(Duration::from_secs(timeout));
    installer.with_helper(helper)
}

fn run_serve(scan: &ScanArgs, args: ServeArgs) -> Result<()> {
    let config = scan.config(&[]);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    runtime.block_on(server::serve(&args.bind, config))
}

/// Parse `Family`, `Family:Style` or `Family:Style,Style` into a request.
fn parse_font_arg(raw: &str) -> Result<SearchQuery> {
    let (family, styles) = match raw.split_once(':') {
        Some((family, styles)) => (family.trim(), Some(styles)),
        None => (raw.trim(), None),
    };
    if family.is_empty() {
        return Err(anyhow!("font request {raw:?} has no family name"));
    }

    let styles: Vec<&str> = styles
        .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    Ok(match styles.len() {
        0 => SearchQuery::new(family),
        1 => SearchQuery::new(family).with_style(styles[0]),
        _ => SearchQuery::new(family).with_styles(styles),
    })
}

fn read_request(path: &Path, mut stdin: impl Read) -> Result<Vec<SearchQuery>> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        stdin
            .read_to_string(&mut buf)
            .context("reading request from STDIN")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    serde_json::from_str(&raw).context("request must be a JSON array of {\"family\", \"style\"} objects")
}

/// One NDJSON line of `find` output.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum FindLine<'a> {
    Found(&'a ResolvedFont),
    Missing(&'a MissingFont),
}

fn find_lines(result: &SearchResult) -> Vec<FindLine<'_>> {
    result
        .found
        .iter()
        .map(FindLine::Found)
        .chain(result.missing.iter().map(FindLine::Missing))
        .collect()
}

fn write_find_plain(result: &SearchResult, mut w: impl Write, color: bool) -> Result<()> {
    for font in &result.found {
        let path = apply_color(&font.file.display().to_string(), color, CYAN);
        writeln!(w, "{}\t{}\t{path}", font.family, font.style)?;
    }
    for font in &result.missing {
        let label = apply_color("missing:", color, YELLOW);
        match &font.style {
            Some(style) => writeln!(w, "{label} {}\t{style}", font.family)?,
            None => writeln!(w, "{label} {}", font.family)?,
        }
    }
    Ok(())
}

fn write_install_plain(outcome: &InstallOutcome, mut w: impl Write) -> Result<()> {
    for font in &outcome.found {
        writeln!(w, "present\t{}\t{}\t{}", font.family, font.style, font.file.display())?;
    }
    for font in &outcome.installed {
        writeln!(w, "installed\t{}\t{}\t{}", font.family, font.style, font.file.display())?;
    }
    for font in &outcome.missing {
        writeln!(w, "missing\t{}\t{}\t{}", font.family, font.style, font.path.display())?;
    }
    for path in &outcome.unreadable {
        writeln!(w, "unreadable\t{}", path.display())?;
    }
    Ok(())
}

const CYAN: &str = "36";
const YELLOW: &str = "33";

fn apply_color(text: &str, color: bool, code: &str) -> String {
    if color {
        format!("\u{1b}[{code}m{text}\u{1b}[0m")
    } else {
        text.to_string()
    }
}
