use crate::collection::{BoxCollection, CatalogBox};
use crate::hooks::AuthHooks;
use crate::ui::Ui;
use boxhaul_fetch::DownloaderOptions;
use boxhaul_metadata::ArchRequest;
use std::path::PathBuf;

/// Process environment variable consulted for short-hand expansion when no
/// server URL is configured. Read once, at [`AddEnv`] construction.
pub const SERVER_URL_ENV: &str = "VAGRANT_SERVER_URL";

/// The typed environment driving one add invocation.
///
/// The untyped key/value mapping of the CLI boundary is promoted to this
/// record before the pipeline runs. The pipeline treats every field as
/// read-only except `box_added`, which it writes on success.
pub struct AddEnv {
    /// Requested box name. Required for direct archive adds; for metadata
    /// adds it must match the document's name.
    pub name: Option<String>,

    /// Box references: files, URLs, one metadata URL, or one short-hand.
    pub urls: Vec<String>,

    /// Acceptable providers, in preference order. Empty means any.
    pub providers: Vec<String>,

    /// Version constraint, e.g. `">= 1.0, < 2.0"`. Direct adds reject it.
    pub version: Option<String>,

    pub checksum: Option<String>,
    pub checksum_type: Option<String>,

    pub architecture: ArchRequest,

    /// Replace an already-installed box instead of failing.
    pub force: bool,

    /// Server used to expand `owner/name` short-hands.
    pub server_url: Option<String>,

    /// Transport options handed to the downloader factory.
    pub download: DownloaderOptions,

    /// Directory for lock files and partial downloads.
    pub tmp_path: PathBuf,

    pub ui: Box<dyn Ui>,
    pub collection: Box<dyn BoxCollection>,
    pub hooks: Box<dyn AuthHooks>,

    /// Written by the pipeline: the box the collection returned.
    pub box_added: Option<CatalogBox>,
}

impl AddEnv {
    pub fn new(
        tmp_path: impl Into<PathBuf>,
        ui: Box<dyn Ui>,
        collection: Box<dyn BoxCollection>,
        hooks: Box<dyn AuthHooks>,
    ) -> Self {
        Self {
            name: None,
            urls: Vec::new(),
            providers: Vec::new(),
            version: None,
            checksum: None,
            checksum_type: None,
            architecture: ArchRequest::default(),
            force: false,
            server_url: std::env::var(SERVER_URL_ENV)
                .ok()
                .filter(|value| !value.is_empty()),
            download: DownloaderOptions::default(),
            tmp_path: tmp_path.into(),
            ui,
            collection,
            hooks,
            box_added: None,
        }
    }
}
