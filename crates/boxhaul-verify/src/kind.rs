use crate::error::ChecksumError;
use crate::hasher::{DigestHasher, Hasher};
use digest::Digest;
use std::fmt;
use std::str::FromStr;

/// Checksum algorithms accepted for box archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl ChecksumKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumKind::Md5 => "md5",
            ChecksumKind::Sha1 => "sha1",
            ChecksumKind::Sha256 => "sha256",
            ChecksumKind::Sha384 => "sha384",
            ChecksumKind::Sha512 => "sha512",
        }
    }

    /// Digest length in bytes.
    pub fn digest_length(&self) -> usize {
        match self {
            ChecksumKind::Md5 => 16,
            ChecksumKind::Sha1 => 20,
            ChecksumKind::Sha256 => 32,
            ChecksumKind::Sha384 => 48,
            ChecksumKind::Sha512 => 64,
        }
    }

    pub fn hasher(&self) -> Box<dyn Hasher> {
        match self {
            ChecksumKind::Md5 => Box::new(DigestHasher::from_digest(md5::Md5::new())),
            ChecksumKind::Sha1 => Box::new(DigestHasher::from_digest(sha1::Sha1::new())),
            ChecksumKind::Sha256 => Box::new(DigestHasher::from_digest(sha2::Sha256::new())),
            ChecksumKind::Sha384 => Box::new(DigestHasher::from_digest(sha2::Sha384::new())),
            ChecksumKind::Sha512 => Box::new(DigestHasher::from_digest(sha2::Sha512::new())),
        }
    }
}

impl FromStr for ChecksumKind {
    type Err = ChecksumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "md5" => Ok(ChecksumKind::Md5),
            "sha1" => Ok(ChecksumKind::Sha1),
            "sha256" => Ok(ChecksumKind::Sha256),
            "sha384" => Ok(ChecksumKind::Sha384),
            "sha512" => Ok(ChecksumKind::Sha512),
            _ => Err(ChecksumError::UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
