use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Clone, Debug, Parser)]
#[command(name = "boxhaul", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "a", name = "add", about = "Add a box to the local collection")]
    Add(AddArgs),
}

/// The untyped environment-bag boundary: these flags are mapped onto the
/// typed `AddEnv` before the pipeline runs.
#[derive(Clone, Debug, Args)]
pub struct AddArgs {
    /// Box file, URL, metadata document or owner/name short-hand.
    /// Multiple URLs are tried left to right.
    #[arg(required = true)]
    pub url: Vec<String>,

    /// Name to record the box under (required for direct files and URLs)
    #[arg(long)]
    pub name: Option<String>,

    /// Acceptable provider, repeatable in preference order
    #[arg(long = "provider")]
    pub providers: Vec<String>,

    /// Version constraint for metadata adds, e.g. ">= 1.0, < 2.0"
    #[arg(long = "box-version")]
    pub box_version: Option<String>,

    /// Expected checksum of the box archive
    #[arg(long, requires = "checksum_type")]
    pub checksum: Option<String>,

    /// Checksum algorithm: md5, sha1, sha256, sha384 or sha512
    #[arg(long)]
    pub checksum_type: Option<String>,

    /// CPU architecture to select, or "auto" to match this machine
    #[arg(long)]
    pub architecture: Option<String>,

    /// Replace an already-installed box
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Box server used to expand owner/name short-hands
    /// (defaults to $VAGRANT_SERVER_URL)
    #[arg(long)]
    pub server_url: Option<String>,

    /// Directory holding the box collection
    #[arg(long)]
    pub box_dir: Option<PathBuf>,

    /// CA certificate (PEM) to trust for TLS downloads
    #[arg(long)]
    pub ca_cert: Option<PathBuf>,

    /// Directory of CA certificates to trust for TLS downloads
    #[arg(long)]
    pub ca_path: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,

    /// Client certificate (PEM) for mutual TLS
    #[arg(long)]
    pub client_cert: Option<PathBuf>,

    /// Re-send credentials to redirect targets on other origins
    #[arg(long)]
    pub location_trusted: bool,

    /// Do not treat failed certificate-revocation checks as fatal
    #[arg(long)]
    pub disable_ssl_revoke_best_effort: bool,
}
