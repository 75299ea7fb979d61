//! Authentication hooks.
//!
//! Hooks let a host application inject credentials without the pipeline
//! knowing how authentication works. Both hooks run before every download.

use boxhaul_fetch::DownloaderOptions;

pub trait AuthHooks: Send + Sync {
    /// Mutate the transport options about to be used for a download, e.g. to
    /// install client certificates.
    fn authenticate_downloader(&self, options: &mut DownloaderOptions) {
        let _ = options;
    }

    /// Rewrite the candidate URL list, e.g. to append signed tokens. The
    /// rewritten URLs are fetched, but artifacts always record the original
    /// user-supplied metadata URL.
    fn authenticate_urls(&self, urls: Vec<String>) -> Vec<String> {
        urls
    }
}

/// Hook implementation that authenticates nothing.
pub struct NullHooks;

impl AuthHooks for NullHooks {}
