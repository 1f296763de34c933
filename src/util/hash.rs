//! Hash verification utilities
//!
//! Chunked MD5 / SHA-1 / SHA-256 digests for downloaded archives.

use crate::error::{Error, Result};
use md5::Md5;
use sha1::{Digest, Sha1};
use sha2::Sha256;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Default read size when hashing files
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// Label used in console output
    pub fn label(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha256 => "SHA-256",
        }
    }
}

/// Calculate the hex digest of a file, reading `chunk_size` bytes at a time
pub fn hash_file(path: &Path, algorithm: HashAlgorithm, chunk_size: usize) -> Result<String> {
    match algorithm {
        HashAlgorithm::Md5 => digest_file::<Md5>(path, chunk_size),
        HashAlgorithm::Sha1 => digest_file::<Sha1>(path, chunk_size),
        HashAlgorithm::Sha256 => digest_file::<Sha256>(path, chunk_size),
    }
}

/// Calculate SHA-256 hash of a file
pub fn sha256_file(path: &Path, chunk_size: usize) -> Result<String> {
    hash_file(path, HashAlgorithm::Sha256, chunk_size)
}

fn digest_file<D: Digest>(path: &Path, chunk_size: usize) -> Result<String>
where
    sha1::digest::Output<D>: std::fmt::LowerHex,
{
    let mut file = File::open(path).map_err(|e| Error::read(path, e))?;
    let mut hasher = D::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];

    loop {
        let n = file.read(&mut buffer).map_err(|e| Error::read(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Compare a computed digest against a user-supplied one
pub fn digests_match(actual: &str, expected: &str) -> bool {
    actual.trim().eq_ignore_ascii_case(expected.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_digests() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path();

        assert_eq!(
            hash_file(path, HashAlgorithm::Sha256, DEFAULT_CHUNK_SIZE).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hash_file(path, HashAlgorithm::Sha1, DEFAULT_CHUNK_SIZE).unwrap(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(
            hash_file(path, HashAlgorithm::Md5, DEFAULT_CHUNK_SIZE).unwrap(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn test_chunk_size_does_not_change_digest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();

        let expected = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        assert_eq!(sha256_file(file.path(), 1).unwrap(), expected);
        assert_eq!(sha256_file(file.path(), DEFAULT_CHUNK_SIZE).unwrap(), expected);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.zip");

        let err = sha256_file(&missing, DEFAULT_CHUNK_SIZE).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(p) if p == missing));
    }

    #[test]
    fn test_digests_match_ignores_case() {
        assert!(digests_match("abcdef", "ABCDEF"));
        assert!(digests_match("abcdef", " abcdef\n"));
        assert!(!digests_match("abcdef", "abcdee"));
    }
}
