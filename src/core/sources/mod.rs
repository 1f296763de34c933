//! Upstream release sources
//!
//! Google's package repository feeds list downloadable platform-tools
//! archives; the release notes page supplies release dates. Both lookups
//! fail soft: any error is logged and yields an empty result.

mod notes;

pub use notes::{ReleaseDates, fetch_release_dates, parse_release_dates};

use crate::core::version::Platform;
use crate::util::download::fetch_text;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

const PLATFORM_TOOLS_PATH: &str = "platform-tools";

/// Archive listed by a repository feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRelease {
    pub version: String,
    pub url: String,
}

/// Repository feed root (`sdk-repository`)
#[derive(Debug, Deserialize)]
struct Repository {
    #[serde(rename = "remotePackage", default)]
    packages: Vec<RemotePackage>,
}

#[derive(Debug, Deserialize)]
struct RemotePackage {
    #[serde(rename = "@path")]
    path: String,
    revision: Option<Revision>,
    archives: Option<Archives>,
}

#[derive(Debug, Deserialize)]
struct Revision {
    major: Option<u32>,
    minor: Option<u32>,
    micro: Option<u32>,
    preview: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Archives {
    #[serde(rename = "archive", default)]
    archives: Vec<Archive>,
}

#[derive(Debug, Deserialize)]
struct Archive {
    complete: Option<Complete>,
    #[serde(rename = "host-os")]
    host_os: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Complete {
    url: Option<String>,
}

impl Revision {
    fn version(&self) -> Option<String> {
        let parts: Vec<String> = [self.major, self.minor, self.micro]
            .into_iter()
            .flatten()
            .map(|p| p.to_string())
            .collect();
        if parts.is_empty() {
            return None;
        }

        let version = parts.join(".");
        Some(match self.preview {
            Some(rc) => format!("{} RC{}", version, rc),
            None => version,
        })
    }
}

/// Whether an archive belongs to the target platform
fn archive_matches(archive: &Archive, url: &str, platform: Platform) -> bool {
    match &archive.host_os {
        Some(host_os) => host_os.trim().eq_ignore_ascii_case(platform.name()),
        None => Platform::from_url(url) == Some(platform),
    }
}

/// Extract platform-tools archives for `platform` from a repository feed
///
/// Relative archive URLs are joined to `base_url`.
pub fn parse_repository(
    xml: &str,
    platform: Platform,
    base_url: &str,
) -> Result<Vec<RemoteRelease>, quick_xml::DeError> {
    let repository: Repository = quick_xml::de::from_str(xml)?;

    let mut releases = Vec::new();
    for package in repository.packages {
        if package.path == PLATFORM_TOOLS_PATH {
            collect_package(package, platform, base_url, &mut releases);
        }
    }
    Ok(releases)
}

fn collect_package(
    package: RemotePackage,
    platform: Platform,
    base_url: &str,
    releases: &mut Vec<RemoteRelease>,
) {
    let Some(version) = package.revision.as_ref().and_then(Revision::version) else {
        tracing::debug!("Skipping platform-tools package without revision");
        return;
    };

    let archives = package.archives.map(|a| a.archives).unwrap_or_default();
    for archive in &archives {
        let Some(url) = archive
            .complete
            .as_ref()
            .and_then(|c| c.url.as_deref())
            .map(str::trim)
            .filter(|u| !u.is_empty())
        else {
            continue;
        };
        if !archive_matches(archive, url, platform) {
            continue;
        }

        let url = if url.starts_with("http") {
            url.to_string()
        } else {
            format!("{}{}", base_url, url)
        };
        releases.push(RemoteRelease {
            version: version.clone(),
            url,
        });
    }
}

/// Fetch platform-tools releases from every repository feed, de-duplicated by URL
pub async fn fetch_repository_releases(
    client: &Client,
    feed_urls: &[String],
    platform: Platform,
    base_url: &str,
) -> Vec<RemoteRelease> {
    let mut releases: Vec<RemoteRelease> = Vec::new();
    let mut by_url: HashMap<String, usize> = HashMap::new();

    for feed_url in feed_urls {
        let xml = match fetch_text(client, feed_url).await {
            Ok(xml) => xml,
            Err(e) => {
                tracing::warn!("Error fetching repository metadata from {}: {}", feed_url, e);
                continue;
            }
        };

        let parsed = match parse_repository(&xml, platform, base_url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Error parsing repository metadata from {}: {}", feed_url, e);
                continue;
            }
        };

        tracing::info!("Found {} platform-tools archives in {}", parsed.len(), feed_url);
        for release in parsed {
            match by_url.get(&release.url) {
                Some(&idx) => releases[idx] = release,
                None => {
                    by_url.insert(release.url.clone(), releases.len());
                    releases.push(release);
                }
            }
        }
    }

    releases
}
