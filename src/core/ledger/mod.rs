//! Release ledger
//!
//! Reads `OFFICIAL_ADB_VERSIONS.md`, the markdown document listing official
//! platform-tools archives and their SHA-256 checksums.
//!
//! Each release is a block of the form:
//!
//! ```text
//! #### Platform-Tools 35.0.2 (July 2024)
//! **Windows:**
//! - URL: https://dl.google.com/android/repository/platform-tools_r35.0.2-win.zip
//! - SHA-256: <hex digest>
//! ```

pub mod render;

use crate::core::version::{Platform, normalize_version};
use crate::error::{Error, Result};
use render::{LedgerUpdates, append_releases, apply_updates, section_bounds};
use std::path::Path;

/// Written in place of a checksum that has not been computed yet
pub const PENDING_CHECKSUM: &str = "To be verified by downloading from official source";

/// Written in place of a URL that could not be resolved
pub const MISSING_URL: &str = "(no official URL found)";

/// Written in place of an unknown release date
pub const UNKNOWN_DATE: &str = "Unknown date";

/// SHA-256 field of a ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Checksum {
    Known(String),
    /// Placeholder recorded in the ledger, still to be computed
    Unknown,
}

impl Checksum {
    /// Interpret the text after `- SHA-256:`
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        let lower = value.to_lowercase();
        let pending = value.is_empty()
            || value == "???"
            || lower == "unknown"
            || lower.contains("to be verified");

        if pending {
            Checksum::Unknown
        } else {
            Checksum::Known(value.to_string())
        }
    }

    pub fn known(&self) -> Option<&str> {
        match self {
            Checksum::Known(value) => Some(value),
            Checksum::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        self.known().is_some()
    }
}

/// One release as recorded in the ledger or reported by an upstream source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseEntry {
    pub version: String,
    pub date: Option<String>,
    pub url: Option<String>,
    pub sha256: Option<Checksum>,
}

impl ReleaseEntry {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Default::default()
        }
    }

    /// Known SHA-256 value, if any
    pub fn known_sha256(&self) -> Option<&str> {
        self.sha256.as_ref().and_then(Checksum::known)
    }
}

/// Classified ledger line
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Heading { version: String, date: Option<&'a str> },
    Url(&'a str),
    Sha256(&'a str),
    Other,
}

fn classify(line: &str) -> Line<'_> {
    let line = line.trim();
    if let Some((version, date)) = parse_heading(line) {
        return Line::Heading { version, date };
    }
    if let Some(value) = list_field(line, "URL:") {
        return Line::Url(value);
    }
    if let Some(value) = list_field(line, "SHA-256:") {
        return Line::Sha256(value);
    }
    Line::Other
}

/// Strip an ASCII prefix case-insensitively
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

/// `- <label> <value>`
fn list_field<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let rest = line.strip_prefix('-')?.trim_start();
    strip_prefix_ignore_case(rest, label).map(str::trim)
}

/// `#### Platform-Tools <version> [RC<n>] [(<date>)]`
pub(crate) fn parse_heading(line: &str) -> Option<(String, Option<&str>)> {
    let rest = line.strip_prefix("####")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = strip_prefix_ignore_case(rest.trim_start(), "Platform-Tools")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();

    let numeric_len = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    if numeric_len == 0 {
        return None;
    }
    let mut version = rest[..numeric_len].to_string();
    let mut rest = &rest[numeric_len..];

    // Optional release-candidate suffix
    let trimmed = rest.trim_start();
    if trimmed.len() < rest.len() {
        if let Some(after) = strip_prefix_ignore_case(trimmed, "RC") {
            let digits = after
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after.len());
            if digits > 0 {
                version = normalize_version(&format!("{} RC{}", version, &after[..digits]));
                rest = &after[digits..];
            }
        }
    }

    let date = rest
        .trim_start()
        .strip_prefix('(')
        .and_then(|inner| inner.find(')').map(|end| inner[..end].trim()))
        .filter(|date| !date.is_empty() && !date.eq_ignore_ascii_case(UNKNOWN_DATE));

    Some((version, date))
}

/// Parser state
enum State {
    /// No release heading seen yet
    Seeking,
    /// Inside the block of a release heading
    InEntry {
        version: String,
        date: Option<String>,
        /// URL line awaiting its SHA-256 line; inner `None` is the missing-URL placeholder
        pending_url: Option<Option<String>>,
        emitted: bool,
    },
}

/// Parse ledger markdown into release entries, in document order
pub fn parse_entries(text: &str) -> Vec<ReleaseEntry> {
    let mut entries = Vec::new();
    let mut state = State::Seeking;

    for line in text.lines() {
        match classify(line) {
            Line::Heading { version, date } => {
                finish(&mut entries, state);
                state = State::InEntry {
                    version,
                    date: date.map(str::to_string),
                    pending_url: None,
                    emitted: false,
                };
            }
            Line::Url(value) => {
                if let State::InEntry {
                    version,
                    date,
                    pending_url,
                    emitted,
                } = &mut state
                {
                    // A URL directly after another URL closes the earlier pair
                    if let Some(url) = pending_url.take() {
                        entries.push(ReleaseEntry {
                            version: version.clone(),
                            date: date.clone(),
                            url,
                            sha256: Some(Checksum::Unknown),
                        });
                        *emitted = true;
                    }
                    let url = (!value.is_empty() && value != MISSING_URL).then(|| value.to_string());
                    *pending_url = Some(url);
                }
            }
            Line::Sha256(value) => {
                if let State::InEntry {
                    version,
                    date,
                    pending_url,
                    emitted,
                } = &mut state
                {
                    if let Some(url) = pending_url.take() {
                        entries.push(ReleaseEntry {
                            version: version.clone(),
                            date: date.clone(),
                            url,
                            sha256: Some(Checksum::parse(value)),
                        });
                        *emitted = true;
                    }
                }
            }
            Line::Other => {}
        }
    }

    finish(&mut entries, state);
    entries
}

/// Close the current block: flush a URL without checksum as pending, or
/// report a block with no URL
fn finish(entries: &mut Vec<ReleaseEntry>, state: State) {
    if let State::InEntry {
        version,
        date,
        pending_url,
        emitted,
    } = state
    {
        match pending_url {
            Some(url) => entries.push(ReleaseEntry {
                version,
                date,
                url,
                sha256: Some(Checksum::Unknown),
            }),
            None if !emitted => {
                tracing::warn!("Dropping ledger entry {} without a URL line", version);
            }
            None => {}
        }
    }
}

/// Read and parse a ledger file
pub fn load_entries(path: &Path) -> Result<Vec<ReleaseEntry>> {
    let text = read_ledger(path)?;
    Ok(parse_entries(&text))
}

/// Read a ledger file as text
pub fn read_ledger(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::read(path, e))
}

/// Write a ledger file
pub fn write_ledger(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).map_err(|e| Error::write(path, e))
}

/// Fail unless the ledger at `path` has a version list that can be rewritten
pub fn ensure_section(path: &Path) -> Result<()> {
    let text = read_ledger(path)?;
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    section_bounds(&lines)?;
    Ok(())
}

/// Patch computed checksums and URL corrections for `platform` into a
/// ledger file
///
/// Returns the number of lines changed; the file is left untouched when
/// nothing changes.
pub fn update_file(path: &Path, updates: &LedgerUpdates, platform: Platform) -> Result<usize> {
    let text = read_ledger(path)?;
    let (patched, changed) = apply_updates(&text, updates, platform);
    if changed > 0 {
        write_ledger(path, &patched)?;
    }
    Ok(changed)
}

/// Insert new release blocks into a ledger file
///
/// Returns whether anything was written.
pub fn append_file(path: &Path, entries: &[ReleaseEntry], platform: Platform) -> Result<bool> {
    if entries.is_empty() {
        return Ok(false);
    }
    let text = read_ledger(path)?;
    let appended = append_releases(&text, entries, platform)?;
    write_ledger(path, &appended)?;
    Ok(true)
}
