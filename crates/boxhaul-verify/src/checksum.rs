use crate::error::{ChecksumError, Result};
use crate::kind::ChecksumKind;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// An expected checksum paired with its algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    kind: ChecksumKind,
    expected: String,
}

impl Checksum {
    /// Build a checksum expectation from a raw declared value.
    ///
    /// Surrounding whitespace is trimmed; a value that trims to the empty
    /// string disables verification and yields `None`.
    pub fn new(kind: ChecksumKind, raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            kind,
            expected: trimmed.to_string(),
        })
    }

    pub fn kind(&self) -> ChecksumKind {
        self.kind
    }

    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// Digest `path` and compare against the expected hex digest,
    /// case-insensitively.
    pub fn verify_file(&self, path: &Path) -> Result<()> {
        let actual = digest_file(self.kind, path)?;
        if actual.eq_ignore_ascii_case(&self.expected) {
            Ok(())
        } else {
            Err(ChecksumError::Mismatch {
                expected: self.expected.clone(),
                actual,
            })
        }
    }
}

/// Stream `path` through the named algorithm and return the lowercase hex
/// digest.
pub fn digest_file(kind: ChecksumKind, path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = kind.hasher();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
