//! CLI module
//!
//! Command-line interface for adb-verify.

mod args;

pub use args::{AlgorithmChoice, Args, Commands, ConfigAction};

use adb_verify::config::{self, Config};
use adb_verify::core::ledger::{self, ReleaseEntry};
use adb_verify::core::reconcile::{Reconciler, new_releases};
use adb_verify::core::version::Platform;
use adb_verify::error::Error;
use adb_verify::util::hash::{digests_match, hash_file};
use adb_verify::util::{default_ledger_path, format_file_size};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Compute and print digests of a file, optionally checking one against
/// an expected value
pub fn verify_file(
    path: &Path,
    algorithm: AlgorithmChoice,
    expected_hash: Option<&str>,
    config: &Config,
) -> Result<()> {
    if !path.is_file() {
        return Err(Error::FileNotFound(path.to_path_buf()).into());
    }
    let size = std::fs::metadata(path)
        .map_err(|e| Error::Read {
            path: path.to_path_buf(),
            source: e,
        })?
        .len();

    println!("Verifying: {}", path.display());
    println!("File size: {}", format_file_size(size));
    println!();

    let mut digests = Vec::new();
    for &algo in algorithm.algorithms() {
        println!("Computing {}...", algo.label());
        let digest = hash_file(path, algo, config.hashing.chunk_size)?;
        println!("{}: {}", algo.label(), digest);
        digests.push((algo, digest));
    }

    if let Some(expected) = expected_hash {
        println!();
        let matched = digests
            .iter()
            .find(|(_, digest)| digests_match(digest, expected));

        match matched {
            Some((algo, _)) => println!("✓ {} hash matches!", algo.label()),
            None => {
                println!("✗ Hash does NOT match!");
                println!("Expected: {}", expected.trim());
                return Err(Error::HashMismatch {
                    expected: expected.trim().to_string(),
                }
                .into());
            }
        }
    }

    println!();
    println!("Verification complete!");
    Ok(())
}

/// Ledger maintenance switches for the fetch-missing flow
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub dry_run: bool,
    pub update: bool,
    pub append: bool,
    pub normalize: bool,
    pub sync: bool,
    pub platform: Option<Platform>,
    pub ledger_path: Option<PathBuf>,
}

impl FetchOptions {
    pub fn from_args(args: &Args) -> Self {
        Self {
            dry_run: args.dry_run,
            update: args.update_official_list,
            append: args.append_new_releases,
            normalize: args.normalize_official_list,
            sync: args.sync_official_list,
            platform: args.platform,
            ledger_path: args.official_list.clone(),
        }
    }
}

fn ledger_path(options: &FetchOptions, config: &Config) -> PathBuf {
    if let Some(path) = &options.ledger_path {
        return path.clone();
    }
    if config.ledger.path.trim().is_empty() {
        default_ledger_path()
    } else {
        PathBuf::from(&config.ledger.path)
    }
}

/// Find ledger releases without a SHA-256, download them, and optionally
/// write the results back into the ledger
pub async fn fetch_missing(options: &FetchOptions, config: &Config) -> Result<()> {
    let path = ledger_path(options, config);
    let platform = options.platform.unwrap_or(config.ledger.platform);
    let reconciler = Reconciler::new(config, platform)?;

    let rewrites = (options.normalize || options.sync) && !options.dry_run;
    if rewrites {
        ledger::ensure_section(&path)
            .with_context(|| format!("Cannot rewrite {}", path.display()))?;
    }

    let ledger_entries: Vec<ReleaseEntry> = if options.sync {
        Vec::new()
    } else if path.exists() {
        ledger::load_entries(&path)?
    } else {
        tracing::warn!("Ledger {:?} not found, using upstream sources only", path);
        Vec::new()
    };

    println!("Platform: {}", platform.label());
    let survey = reconciler.survey(ledger_entries, options.sync).await;
    println!("Available releases: {}", survey.releases.len());
    println!("Missing SHA-256 entries: {}", survey.missing.len());

    if survey.missing.is_empty() {
        println!("No missing SHA-256 values detected.");
    }

    if options.dry_run {
        for entry in &survey.missing {
            println!(
                "- {} | {}",
                entry.version,
                entry.url.as_deref().unwrap_or("(no URL in list)")
            );
        }
        return Ok(());
    }

    let computed = if survey.missing.is_empty() {
        Default::default()
    } else {
        println!();
        reconciler
            .compute_checksums(&survey.missing, |msg| println!("{}", msg))
            .await?
    };

    if !computed.is_empty() {
        println!();
        println!("Computed SHA-256 values:");
        for (url, sha) in &computed.computed {
            println!("- {} | {}", url, sha);
        }
    }

    if options.update && !computed.updates.is_empty() {
        let changed = ledger::update_file(&path, &computed.updates, platform)
            .with_context(|| format!("Failed to update {}", path.display()))?;
        println!("Updated {} line(s) in {}", changed, path.display());
    }

    if options.append {
        let added = new_releases(&survey, &computed);
        if ledger::append_file(&path, &added, platform)
            .with_context(|| format!("Failed to append releases to {}", path.display()))?
        {
            println!("Appended {} release(s) to {}", added.len(), path.display());
        } else {
            println!("No new releases to append.");
        }
    }

    if rewrites {
        let sha_by_version: HashMap<String, String> = if options.sync {
            computed.updates.sha_by_version.clone()
        } else {
            HashMap::new()
        };
        let changed = reconciler
            .normalize(&path, &survey.dates, options.sync, &sha_by_version)
            .await
            .with_context(|| format!("Failed to rewrite {}", path.display()))?;

        let action = if options.sync { "Synchronized" } else { "Normalized" };
        if changed {
            println!("{} version list in {}", action, path.display());
        } else {
            println!("Version list in {} already up to date.", path.display());
        }
    }

    Ok(())
}

/// Handle config subcommands
pub fn handle_config(action: ConfigAction, config_override: Option<&Path>) -> Result<()> {
    let path = config_override
        .map(Path::to_path_buf)
        .unwrap_or_else(config::config_path);

    match action {
        ConfigAction::Show => {
            let config = config::load(Some(&path))?;
            println!("# {}", path.display());
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            config::save(&Config::default(), &path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}
