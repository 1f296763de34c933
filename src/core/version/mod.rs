//! Version management module
//!
//! Release version ordering, target platforms, and archive naming.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Archive name prefixes, tried in order
const ARCHIVE_PREFIXES: &[&str] = &["platform-tools_r", "platform-tools_"];

/// Platform whose archives are tracked
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Windows,
    Linux,
    Macosx,
}

impl Platform {
    /// Name as used by the repository `host-os` element
    pub fn name(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::Macosx => "macosx",
        }
    }

    /// Label used in ledger entries
    pub fn label(self) -> &'static str {
        match self {
            Platform::Windows => "Windows",
            Platform::Linux => "Linux",
            Platform::Macosx => "macOS",
        }
    }

    /// Archive file name suffixes, tried in order
    pub fn url_suffixes(self) -> &'static [&'static str] {
        match self {
            Platform::Windows => &["windows", "win"],
            Platform::Linux => &["linux"],
            Platform::Macosx => &["darwin", "macosx"],
        }
    }

    const ALL: [Platform; 3] = [Platform::Windows, Platform::Linux, Platform::Macosx];

    /// Platform named by a ledger label line such as `**Linux:**`
    pub fn from_label(line: &str) -> Option<Self> {
        let inner = line.trim().strip_prefix("**")?.strip_suffix("**")?;
        let name = inner.trim().strip_suffix(':')?.trim();
        Self::ALL.into_iter().find(|p| {
            name.eq_ignore_ascii_case(p.label()) || name.eq_ignore_ascii_case(p.name())
        })
    }

    /// Platform an archive URL belongs to, judged by its file name suffix
    pub fn from_url(url: &str) -> Option<Self> {
        let file_name = url.rsplit('/').next().unwrap_or(url).to_lowercase();
        Self::ALL.into_iter().find(|p| {
            p.url_suffixes().iter().any(|suffix| {
                file_name.contains(&format!("-{}.", suffix))
                    || file_name.ends_with(&format!("-{}", suffix))
            })
        })
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Sort key for a release version such as `35.0.2` or `33.0.3 RC1`
///
/// Missing or non-numeric components count as zero. A stable release ranks
/// above any release candidate with the same numeric prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionKey {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
    pub rc: Option<u32>,
}

impl VersionKey {
    pub fn parse(version: &str) -> Self {
        let (numeric, rc) = split_rc(version);
        let mut parts = numeric
            .split('.')
            .map(|p| p.trim().parse::<u32>().unwrap_or(0));

        Self {
            major: parts.next().unwrap_or(0),
            minor: parts.next().unwrap_or(0),
            micro: parts.next().unwrap_or(0),
            rc,
        }
    }
}

impl Ord for VersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.micro)
            .cmp(&(other.major, other.minor, other.micro))
            .then_with(|| match (self.rc, other.rc) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(&b),
            })
    }
}

impl PartialOrd for VersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Split `33.0.3 RC1` into (`33.0.3`, Some(1))
fn split_rc(version: &str) -> (&str, Option<u32>) {
    let upper = version.to_ascii_uppercase();
    let marker = upper
        .char_indices()
        .find(|&(i, c)| c.is_whitespace() && upper[i..].trim_start().starts_with("RC"));

    match marker {
        Some((i, _)) => {
            let rest = version[i..].trim_start();
            let number = rest[2..].trim().parse().unwrap_or(0);
            (version[..i].trim(), Some(number))
        }
        None => (version.trim(), None),
    }
}

/// Whether a version carries a release-candidate marker
pub fn is_release_candidate(version: &str) -> bool {
    split_rc(version).1.is_some()
}

/// Canonical spelling of a version: single space before an uppercase `RC`
pub fn normalize_version(version: &str) -> String {
    match split_rc(version) {
        (numeric, Some(rc)) => format!("{} RC{}", numeric, rc),
        (numeric, None) => numeric.to_string(),
    }
}

/// Build candidate download URLs for a version
///
/// Release candidates have no stable naming scheme and yield nothing.
pub fn candidate_urls(base_url: &str, version: &str, platform: Platform) -> Vec<String> {
    let version = version.trim();
    if version.is_empty() || is_release_candidate(version) {
        return Vec::new();
    }

    ARCHIVE_PREFIXES
        .iter()
        .flat_map(|prefix| {
            platform
                .url_suffixes()
                .iter()
                .map(move |suffix| format!("{}{}{}-{}.zip", base_url, prefix, version, suffix))
        })
        .collect()
}
