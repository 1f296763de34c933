//! CLI argument definitions
//!
//! Uses clap derive macros for argument parsing.

use adb_verify::core::version::Platform;
use adb_verify::util::hash::HashAlgorithm;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// adb-verify - Verify ADB platform-tools downloads against official checksums
#[derive(Parser, Debug)]
#[command(name = "adb-verify")]
#[command(author, version, about, long_about = None)]
#[command(subcommand_negates_reqs = true)]
pub struct Args {
    /// File to verify
    #[arg(required_unless_present = "fetch_missing_sha256")]
    pub file_path: Option<PathBuf>,

    /// Expected hash value to compare against
    #[arg(short, long)]
    pub expected_hash: Option<String>,

    /// Hash algorithm to compute
    #[arg(short, long, value_enum, default_value_t = AlgorithmChoice::All)]
    pub algorithm: AlgorithmChoice,

    /// Download archives listed without a SHA-256 and compute it
    #[arg(long)]
    pub fetch_missing_sha256: bool,

    /// List missing entries without downloading
    #[arg(long, requires = "fetch_missing_sha256")]
    pub dry_run: bool,

    /// Write computed checksums back into the ledger
    #[arg(long, requires = "fetch_missing_sha256")]
    pub update_official_list: bool,

    /// Add newly discovered releases to the ledger
    #[arg(long, requires = "fetch_missing_sha256")]
    pub append_new_releases: bool,

    /// Sort and normalize the ledger's version list
    #[arg(long, requires = "fetch_missing_sha256")]
    pub normalize_official_list: bool,

    /// Rebuild the version list from Google's release notes
    #[arg(long, requires = "fetch_missing_sha256")]
    pub sync_official_list: bool,

    /// Platform whose archives are tracked (defaults to the configured one)
    #[arg(long, value_enum, requires = "fetch_missing_sha256")]
    pub platform: Option<Platform>,

    /// Path to OFFICIAL_ADB_VERSIONS.md
    #[arg(long, requires = "fetch_missing_sha256")]
    pub official_list: Option<PathBuf>,

    /// Use an alternate configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Digest selection for verify mode
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmChoice {
    Md5,
    Sha1,
    Sha256,
    All,
}

impl AlgorithmChoice {
    pub fn algorithms(self) -> &'static [HashAlgorithm] {
        match self {
            AlgorithmChoice::Md5 => &[HashAlgorithm::Md5],
            AlgorithmChoice::Sha1 => &[HashAlgorithm::Sha1],
            AlgorithmChoice::Sha256 => &[HashAlgorithm::Sha256],
            AlgorithmChoice::All => &[
                HashAlgorithm::Md5,
                HashAlgorithm::Sha1,
                HashAlgorithm::Sha256,
            ],
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_ledger_flags_require_fetch() {
        assert!(Args::try_parse_from(["adb-verify", "--dry-run"]).is_err());
        assert!(Args::try_parse_from(["adb-verify", "--fetch-missing-sha256", "--dry-run"]).is_ok());
    }

    #[test]
    fn test_file_required_in_verify_mode() {
        assert!(Args::try_parse_from(["adb-verify"]).is_err());

        let args = Args::try_parse_from(["adb-verify", "a.zip", "-a", "sha256"]).unwrap();
        assert_eq!(args.algorithm, AlgorithmChoice::Sha256);
        assert_eq!(args.file_path, Some(PathBuf::from("a.zip")));
    }

    #[test]
    fn test_config_subcommand() {
        let args = Args::try_parse_from(["adb-verify", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Commands::Config {
                action: ConfigAction::Init { force: true }
            })
        ));
    }

    #[test]
    fn test_platform_value() {
        let args = Args::try_parse_from([
            "adb-verify",
            "--fetch-missing-sha256",
            "--platform",
            "macosx",
        ])
        .unwrap();
        assert_eq!(args.platform, Some(Platform::Macosx));
    }
}
