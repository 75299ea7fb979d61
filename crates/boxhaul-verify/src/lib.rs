//! Content verification for downloaded box archives.
//!
//! Provides incremental hashing over the `digest` trait family and the
//! checksum policy used by the add pipeline: algorithm identifiers are
//! matched case-insensitively, hex digests compare case-insensitively, and a
//! checksum that trims to the empty string disables verification.

pub use self::checksum::{digest_file, Checksum};
pub use self::error::{ChecksumError, Result};
pub use self::hasher::{DigestHasher, Hasher};
pub use self::kind::ChecksumKind;

mod checksum;
mod error;
mod hasher;
mod kind;
