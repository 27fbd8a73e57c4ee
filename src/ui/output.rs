//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag.
//! Command results that scripts consume (ids, object contents, JSON) are
//! written with [`data`] / [`raw`] and are never suppressed.

use std::fmt::Display;
use std::io::Write;

use crate::core::types::{Oid, RefName};

/// Length of abbreviated ids in human-readable output.
pub const SHORT_OID_LEN: usize = 10;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - results only
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a command result (always shown).
pub fn data(message: impl Display) {
    println!("{}", message);
}

/// Write raw bytes to stdout (always shown).
pub fn raw(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes)?;
    stdout.flush()
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a success message (respects quiet mode).
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Abbreviated id for display.
pub fn format_oid(oid: &Oid) -> &str {
    oid.short(SHORT_OID_LEN)
}

/// Reference annotations as shown next to a log entry, e.g.
/// `(HEAD, master, tag: v1)`.
///
/// Returns an empty string when there are no references.
pub fn format_refs(refs: &[RefName]) -> String {
    if refs.is_empty() {
        return String::new();
    }
    let names: Vec<String> = refs
        .iter()
        .map(|name| {
            if let Some(branch) = name.strip_prefix(RefName::HEADS_PREFIX) {
                branch.to_string()
            } else if let Some(tag) = name.strip_prefix(RefName::TAGS_PREFIX) {
                format!("tag: {tag}")
            } else {
                name.to_string()
            }
        })
        .collect();
    format!("({})", names.join(", "))
}
