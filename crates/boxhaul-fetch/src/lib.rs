//! Download plumbing for the box-add pipeline.
//!
//! Three concerns live here:
//! - [`normalize`] turns raw user input into a URL with an explicit scheme,
//!   synthesising `file://` URLs from bare paths, and [`scrub_credentials`]
//!   masks embedded credentials before anything reaches a log line or the UI;
//! - [`Downloader`] is the transport handle, built from
//!   [`DownloaderOptions`] read out of the environment (TLS trust, client
//!   certificates, redirect trust);
//! - [`UrlLock`] serialises concurrent fetches of the same logical URL across
//!   processes with a non-blocking exclusive file lock.

pub use self::downloader::{Download, Downloader};
pub use self::error::{FetchError, Result};
pub use self::lock::{cache_file_name, lock_file_name, UrlLock};
pub use self::options::{DownloaderOptions, ProgressFn};
pub use self::url::{is_shorthand, normalize, scrub_credentials, REDACTED};

mod downloader;
mod error;
mod lock;
mod options;
mod url;
