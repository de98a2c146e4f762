//! sysfont-core: the friendly concierge of installed fonts
//!
//! Ask for "Source Sans Pro, Black" and this library tells you which file on
//! disk answers to that name, without you ever learning where each operating
//! system hides its fonts or how a `name` table is laid out.
//!
//! ## The Journey of a Font
//!
//! **Discovery**: walking the usual font neighbourhoods
//! - Knows the font directories of macOS, Windows and Linux
//! - Recognises TTF, OTF, TTC and DFONT files, and sniffs extension-less ones
//! - Politely steps around unreadable folders and anything in a `deleted` bin
//!
//! **Indexing**: getting every family around one table
//! - Reads family, style and PostScript names with read-fonts and skrifa
//! - Parses files in parallel, then merges them in a fixed order
//! - Lets fonts answer to every alternate family name they claim
//!
//! **Lookup**: answering the question you actually asked
//! - Batches repeated families and merges their style lists
//! - Reports both what was found and what is missing
//!
//! ## A Sample Conversation
//!
//! ```rust,no_run
//! use sysfont_core::query::SearchQuery;
//! use sysfont_core::system::{SystemFonts, SystemFontsOptions};
//!
//! let fonts = SystemFonts::new(SystemFontsOptions::default())?;
//! let index = fonts.build_index()?;
//!
//! let result = index.search(&[
//!     SearchQuery::new("Source Sans Pro").with_styles(["Black", "Semibold Italic"]),
//!     SearchQuery::new("Papyrus").with_style("Regular"),
//! ]);
//!
//! for font in &result.found {
//!     println!("{} {} -> {}", font.family, font.style, font.file.display());
//! }
//! for font in &result.missing {
//!     println!("missing: {} {}", font.family, font.style.as_deref().unwrap_or("*"));
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! The index is a snapshot: build it once, search it as often as you like,
//! and build a new one when the fonts on disk change.
//!
//! ---
//!
//! Crafted with care at FontLab https://www.fontlab.com/

pub mod classify;
pub mod discovery;
pub mod family;
pub mod index;
pub mod install;
pub mod names;
pub mod output;
pub mod parse;
pub mod query;
pub mod reconcile;
pub mod system;
