//! Configuration schema
//!
//! Defines the structure of the configuration file.

use crate::core::version::Platform;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub hashing: HashingConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Upstream release metadata locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Package repository feeds, queried in order
    #[serde(default = "default_repository_xml_urls")]
    pub repository_xml_urls: Vec<String>,

    /// Platform-tools release notes page
    #[serde(default = "default_release_notes_url")]
    pub release_notes_url: String,

    /// Base for archive downloads and relative repository URLs (ends with '/')
    #[serde(default = "default_download_base_url")]
    pub download_base_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            repository_xml_urls: default_repository_xml_urls(),
            release_notes_url: default_release_notes_url(),
            download_base_url: default_download_base_url(),
        }
    }
}

/// Network settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// File hashing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashingConfig {
    /// Read size in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

/// Ledger maintenance defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Path to OFFICIAL_ADB_VERSIONS.md (empty = current directory)
    #[serde(default)]
    pub path: String,

    /// Platform whose archives are tracked
    #[serde(default)]
    pub platform: Platform,
}

// Default value functions for serde
fn default_repository_xml_urls() -> Vec<String> {
    vec![
        "https://dl.google.com/android/repository/repository2-3.xml".to_string(),
        "https://dl.google.com/android/repository/repository2-2.xml".to_string(),
    ]
}
fn default_release_notes_url() -> String {
    "https://developer.android.com/tools/releases/platform-tools".to_string()
}
fn default_download_base_url() -> String {
    "https://dl.google.com/android/repository/".to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_user_agent() -> String {
    concat!("adb-verify/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_chunk_size() -> usize {
    crate::util::hash::DEFAULT_CHUNK_SIZE
}
