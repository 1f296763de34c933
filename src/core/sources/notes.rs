//! Release notes
//!
//! Scrapes `version -> date` pairs from the platform-tools release notes.

use crate::util::download::fetch_text;
use regex::Regex;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::LazyLock;

/// `#### 35.0.2 (July 2024)` lines, as served in the markdown rendition
static MARKDOWN_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^####\s+([0-9]+(?:\.[0-9]+){1,2})\s*(?:\(([^)]+)\))?")
        .expect("valid release heading pattern")
});

/// `<h4 id="...">35.0.2 (July 2024)</h4>` headings
static HTML_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<h4[^>]*>\s*([0-9]+(?:\.[0-9]+){1,2})\s*(?:\(([^)]+)\))?\s*</h4>")
        .expect("valid release heading pattern")
});

/// Release dates keyed by version, in page order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseDates {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl ReleaseDates {
    /// Record a date unless the version already has one
    pub fn insert(&mut self, version: impl Into<String>, date: impl Into<String>) {
        let version = version.into();
        if self.index.contains_key(&version) {
            return;
        }
        self.index.insert(version.clone(), self.entries.len());
        self.entries.push((version, date.into()));
    }

    pub fn get(&self, version: &str) -> Option<&str> {
        self.index
            .get(version)
            .map(|&idx| self.entries[idx].1.as_str())
    }

    pub fn contains(&self, version: &str) -> bool {
        self.index.contains_key(version)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(v, d)| (v.as_str(), d.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Extract release dates from the release notes page
pub fn parse_release_dates(html: &str) -> ReleaseDates {
    let mut dates = ReleaseDates::default();

    for pattern in [&*MARKDOWN_HEADING, &*HTML_HEADING] {
        for caps in pattern.captures_iter(html) {
            let version = caps[1].trim();
            let Some(date) = caps.get(2).map(|m| m.as_str().trim()) else {
                continue;
            };
            if !date.is_empty() {
                dates.insert(version, date);
            }
        }
    }

    dates
}

/// Fetch release dates, or nothing when the page is unavailable
pub async fn fetch_release_dates(client: &Client, url: &str) -> ReleaseDates {
    match fetch_text(client, url).await {
        Ok(html) => {
            let dates = parse_release_dates(&html);
            tracing::info!("Found {} release dates in {}", dates.len(), url);
            dates
        }
        Err(e) => {
            tracing::warn!("Unable to fetch release dates from {}: {}", url, e);
            ReleaseDates::default()
        }
    }
}
