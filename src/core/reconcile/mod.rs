//! Ledger reconciliation
//!
//! Combines the ledger with the repository feeds and release notes,
//! resolves download URLs, computes missing checksums, and rebuilds the
//! ledger's version list.

mod table;

pub use table::ReleaseTable;

use crate::config::{Config, SourcesConfig};
use crate::core::ledger::render::{LedgerUpdates, rewrite_section, section_bounds};
use crate::core::ledger::{self, Checksum, ReleaseEntry};
use crate::core::sources::{self, ReleaseDates, RemoteRelease};
use crate::core::version::{Platform, candidate_urls, is_release_candidate};
use crate::error::{Error, LedgerError, Result};
use crate::util::download::{build_client, download_file, url_exists};
use crate::util::hash::sha256_file;
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

const FALLBACK_FILE_NAME: &str = "platform-tools.zip";

/// Merged view of all sources for one run
#[derive(Debug, Clone, Default)]
pub struct Survey {
    /// One entry per known version, in merge order
    pub releases: Vec<ReleaseEntry>,
    /// Releases still lacking a URL or a known checksum
    pub missing: Vec<ReleaseEntry>,
    pub dates: ReleaseDates,
    /// URLs already present in the ledger
    pub known_urls: HashSet<String>,
}

/// Checksums computed by downloading archives
#[derive(Debug, Clone, Default)]
pub struct ComputedChecksums {
    /// (resolved URL, SHA-256) in download order
    pub computed: Vec<(String, String)>,
    pub updates: LedgerUpdates,
}

impl ComputedChecksums {
    pub fn is_empty(&self) -> bool {
        self.computed.is_empty()
    }

    fn record(&mut self, entry: &ReleaseEntry, resolved_url: &str, sha256: String) {
        if let Some(original) = entry.url.as_deref().filter(|u| *u != resolved_url) {
            self.updates
                .url_by_url
                .insert(original.to_string(), resolved_url.to_string());
        }
        self.updates
            .sha_by_url
            .insert(resolved_url.to_string(), sha256.clone());
        if !entry.version.is_empty() {
            self.updates
                .sha_by_version
                .insert(entry.version.clone(), sha256.clone());
            self.updates
                .url_by_version
                .insert(entry.version.clone(), resolved_url.to_string());
        }
        self.computed.push((resolved_url.to_string(), sha256));
    }
}

/// Merge the ledger, repository releases, and release notes
///
/// Sources are applied in that priority order; for each field the first
/// non-empty value wins.
pub fn merge_sources(
    ledger_entries: &[ReleaseEntry],
    remote: &[RemoteRelease],
    dates: &ReleaseDates,
) -> ReleaseTable {
    let mut table: ReleaseTable = ledger_entries.iter().cloned().collect();

    for release in remote {
        table.merge(ReleaseEntry {
            version: release.version.clone(),
            url: Some(release.url.clone()),
            ..Default::default()
        });
    }

    for (version, date) in dates.iter() {
        table.merge_date(version, date);
    }

    table
}

/// Build the sorted entry list for a normalize or sync rewrite
///
/// Normalize keeps the ledger's own releases and only fills missing dates.
/// Sync (`strict`) rebuilds the list from the release notes, carrying over
/// freshly computed checksums.
pub fn plan_rewrite(
    ledger_entries: &[ReleaseEntry],
    dates: &ReleaseDates,
    strict: bool,
    sha_by_version: &HashMap<String, String>,
) -> Result<Vec<ReleaseEntry>, LedgerError> {
    let mut table = ReleaseTable::new();

    if strict {
        if dates.is_empty() {
            return Err(LedgerError::ReleaseListUnavailable);
        }
        for (version, date) in dates.iter() {
            table.merge_date(version, date);
        }
        for entry in table.entries_mut() {
            if let Some(sha) = sha_by_version.get(&entry.version) {
                entry.sha256 = Some(Checksum::Known(sha.clone()));
            }
        }
    } else {
        if ledger_entries.is_empty() {
            return Err(LedgerError::NoEntries);
        }
        table = ledger_entries.iter().cloned().collect();
        for entry in table.entries_mut() {
            if entry.date.is_none() {
                entry.date = dates.get(&entry.version).map(str::to_string);
            }
        }
    }

    Ok(table.into_sorted())
}

/// Releases to add to the ledger: resolved, missing, and not yet listed
pub fn new_releases(survey: &Survey, computed: &ComputedChecksums) -> Vec<ReleaseEntry> {
    survey
        .missing
        .iter()
        .filter(|e| {
            e.url
                .as_ref()
                .is_some_and(|url| !survey.known_urls.contains(url))
        })
        .map(|e| {
            let mut entry = e.clone();
            entry.sha256 = entry
                .url
                .as_ref()
                .and_then(|url| computed.updates.sha_by_url.get(url))
                .map(|sha| Checksum::Known(sha.clone()));
            if entry.date.is_none() {
                entry.date = survey.dates.get(&entry.version).map(str::to_string);
            }
            entry
        })
        .collect()
}

/// File name to download an archive URL to
fn archive_file_name(url: &str) -> String {
    url.rsplit('/')
        .next()
        .map(|name| name.split(['?', '#']).next().unwrap_or_default())
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_FILE_NAME)
        .to_string()
}

/// Reconciles the release ledger against upstream sources
pub struct Reconciler {
    client: Client,
    sources: SourcesConfig,
    platform: Platform,
    chunk_size: usize,
}

impl Reconciler {
    pub fn new(config: &Config, platform: Platform) -> Result<Self> {
        Ok(Self {
            client: build_client(&config.network)?,
            sources: config.sources.clone(),
            platform,
            chunk_size: config.hashing.chunk_size,
        })
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Synthesized download URLs for a version, in the order they are tried
    pub fn candidate_urls(&self, version: &str) -> Vec<String> {
        candidate_urls(&self.sources.download_base_url, version, self.platform)
    }

    pub async fn repository_releases(&self) -> Vec<RemoteRelease> {
        sources::fetch_repository_releases(
            &self.client,
            &self.sources.repository_xml_urls,
            self.platform,
            &self.sources.download_base_url,
        )
        .await
    }

    pub async fn release_dates(&self) -> ReleaseDates {
        sources::fetch_release_dates(&self.client, &self.sources.release_notes_url).await
    }

    pub async fn url_exists(&self, url: &str) -> bool {
        url_exists(&self.client, url).await
    }

    /// First synthesized candidate that exists upstream
    pub async fn first_existing_candidate(&self, version: &str) -> Option<String> {
        for candidate in self.candidate_urls(version) {
            if self.url_exists(&candidate).await {
                return Some(candidate);
            }
        }
        None
    }

    /// Working download URL for an entry: the recorded URL when reachable,
    /// otherwise the first reachable candidate
    pub async fn resolve_url(&self, entry: &ReleaseEntry) -> Option<String> {
        if let Some(url) = &entry.url {
            if self.url_exists(url).await {
                return Some(url.clone());
            }
        }
        if is_release_candidate(&entry.version) {
            return None;
        }
        self.first_existing_candidate(&entry.version).await
    }

    /// Merge every source and work out which releases lack a checksum
    pub async fn survey(&self, ledger_entries: Vec<ReleaseEntry>, sync: bool) -> Survey {
        let mut ledger_sha: HashMap<String, Option<Checksum>> = HashMap::new();
        for entry in &ledger_entries {
            if let Some(url) = &entry.url {
                ledger_sha.insert(url.clone(), entry.sha256.clone());
            }
        }
        let known_urls = ledger_sha.keys().cloned().collect();

        let remote = self.repository_releases().await;
        let dates = self.release_dates().await;
        let mut table = merge_sources(&ledger_entries, &remote, &dates);

        if sync && !dates.is_empty() {
            table.retain(|e| dates.contains(&e.version));
        }

        let mut missing = Vec::new();
        for entry in table.entries_mut() {
            if entry.url.is_none() {
                let candidates = self.candidate_urls(&entry.version);
                let mut found = None;
                for candidate in &candidates {
                    if self.url_exists(candidate).await {
                        found = Some(candidate.clone());
                        break;
                    }
                }
                entry.url = found.or_else(|| candidates.into_iter().next());
            }

            let has_checksum = match &entry.url {
                Some(url) => {
                    let in_ledger = ledger_sha
                        .get(url)
                        .and_then(Option::as_ref)
                        .is_some_and(Checksum::is_known);
                    in_ledger || entry.known_sha256().is_some()
                }
                None => false,
            };
            if !has_checksum {
                missing.push(entry.clone());
            }
        }

        Survey {
            releases: table.entries().to_vec(),
            missing,
            dates,
            known_urls,
        }
    }

    /// Download an entry's archive into `dest_dir`, trying the recorded URL
    /// and then each synthesized candidate
    ///
    /// A 404 or a transport failure moves on to the next candidate; any
    /// other HTTP status stops the search.
    pub async fn download_with_fallback(
        &self,
        entry: &ReleaseEntry,
        dest_dir: &Path,
    ) -> Option<(String, PathBuf)> {
        let mut candidates: Vec<String> = entry.url.iter().cloned().collect();
        for candidate in self.candidate_urls(&entry.version) {
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }

        for candidate in candidates {
            let dest = dest_dir.join(archive_file_name(&candidate));
            match download_file(&self.client, &candidate, &dest).await {
                Ok(()) => return Some((candidate, dest)),
                Err(Error::HttpStatus { status: 404, .. }) => {
                    tracing::debug!("Not found: {}", candidate);
                }
                Err(e @ Error::HttpStatus { .. }) => {
                    tracing::warn!("Error downloading {}: {}", candidate, e);
                    break;
                }
                Err(e) => {
                    tracing::warn!("Error downloading {}: {}", candidate, e);
                }
            }
        }

        None
    }

    /// Download and hash every missing release
    ///
    /// `progress` receives one line per step for display.
    pub async fn compute_checksums<F>(
        &self,
        missing: &[ReleaseEntry],
        mut progress: F,
    ) -> Result<ComputedChecksums>
    where
        F: FnMut(&str),
    {
        let scratch = tempfile::tempdir().map_err(|e| Error::write(std::env::temp_dir(), e))?;
        let mut computed = ComputedChecksums::default();

        for entry in missing {
            let label = entry.url.as_deref().unwrap_or(&entry.version);
            progress(&format!("Downloading: {}", label));

            let Some((resolved, archive)) = self.download_with_fallback(entry, scratch.path()).await
            else {
                progress("Failed to download with available URL patterns.");
                continue;
            };

            if entry.url.as_deref().is_some_and(|u| u != resolved) {
                progress(&format!("Note: Falling back to {} (original URL not found)", resolved));
            }

            let sha256 = sha256_file(&archive, self.chunk_size)?;
            progress(&format!("SHA-256: {}", sha256));
            if let Err(e) = std::fs::remove_file(&archive) {
                tracing::debug!("Could not remove {:?}: {}", archive, e);
            }

            computed.record(entry, &resolved, sha256);
        }

        Ok(computed)
    }

    /// Sort the ledger's version list and normalize its URLs
    ///
    /// With `strict`, the list is rebuilt from the release notes instead.
    /// Returns whether the file changed.
    pub async fn normalize(
        &self,
        path: &Path,
        dates: &ReleaseDates,
        strict: bool,
        sha_by_version: &HashMap<String, String>,
    ) -> Result<bool> {
        let text = ledger::read_ledger(path)?;
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        section_bounds(&lines)?;

        let ledger_entries = if strict {
            Vec::new()
        } else {
            ledger::parse_entries(&text)
        };
        let mut entries = plan_rewrite(&ledger_entries, dates, strict, sha_by_version)?;

        for entry in &mut entries {
            if let Some(url) = self.resolve_url(entry).await {
                entry.url = Some(url);
            }
        }

        let rewritten = rewrite_section(&text, &entries, self.platform)?;
        if rewritten == text {
            return Ok(false);
        }
        ledger::write_ledger(path, &rewritten)?;
        Ok(true)
    }
}
