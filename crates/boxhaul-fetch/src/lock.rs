use crate::error::{FetchError, Result};
use fs2::FileExt;
use sha1::{Digest, Sha1};
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// Lock file name for a canonicalised URL: `box<sha1(url)>.lock`.
pub fn lock_file_name(url: &Url) -> String {
    format!("box{}.lock", url_digest(url))
}

/// Partial-download destination for a canonicalised URL: `box<sha1(url)>`.
pub fn cache_file_name(url: &Url) -> String {
    format!("box{}", url_digest(url))
}

fn url_digest(url: &Url) -> String {
    hex::encode(Sha1::digest(url.as_str().as_bytes()))
}

/// An exclusive, advisory, non-blocking lock on a logical URL.
///
/// Held for the fetch-and-verify span of one download; contention fails fast
/// instead of waiting. Dropping the guard releases the lock on every exit
/// path.
pub struct UrlLock {
    file: File,
    path: PathBuf,
}

impl UrlLock {
    pub fn acquire(tmp_dir: &Path, url: &Url) -> Result<Self> {
        let path = tmp_dir.join(lock_file_name(url));
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        file.try_lock_exclusive().map_err(|e| {
            if e.kind() == fs2::lock_contended_error().kind() {
                FetchError::AlreadyInProgress {
                    lock_path: path.clone(),
                }
            } else {
                FetchError::Io(e)
            }
        })?;

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UrlLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
