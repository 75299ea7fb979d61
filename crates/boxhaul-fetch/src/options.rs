use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Progress callback: bytes downloaded so far and the total when known.
pub type ProgressFn = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Transport options read from the environment.
///
/// Each option, when present, is forwarded verbatim to the transport; absent
/// options take the transport defaults. Authentication hooks may mutate an
/// instance before every download.
#[derive(Clone, Default)]
pub struct DownloaderOptions {
    /// CA certificate file (PEM) to trust.
    pub ca_cert: Option<PathBuf>,

    /// Directory of CA certificate files to trust.
    pub ca_path: Option<PathBuf>,

    /// Skip TLS certificate verification entirely.
    pub insecure: bool,

    /// Client certificate (PEM, certificate + key) for mutual TLS.
    pub client_cert: Option<PathBuf>,

    /// Re-send credentials to redirect targets on other origins.
    pub location_trusted: bool,

    /// Do not treat a failed certificate-revocation check as fatal.
    /// Only meaningful on TLS backends that check revocation.
    pub disable_ssl_revoke_best_effort: bool,

    /// Progress callback invoked after each chunk write.
    pub on_progress: Option<ProgressFn>,
}

impl fmt::Debug for DownloaderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloaderOptions")
            .field("ca_cert", &self.ca_cert)
            .field("ca_path", &self.ca_path)
            .field("insecure", &self.insecure)
            .field("client_cert", &self.client_cert)
            .field("location_trusted", &self.location_trusted)
            .field(
                "disable_ssl_revoke_best_effort",
                &self.disable_ssl_revoke_best_effort,
            )
            .field("on_progress", &self.on_progress.as_ref().map(|_| "{ ... }"))
            .finish()
    }
}

impl DownloaderOptions {
    #[must_use]
    pub fn ca_cert(mut self, ca_cert: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(ca_cert.into());
        self
    }

    #[must_use]
    pub fn ca_path(mut self, ca_path: impl Into<PathBuf>) -> Self {
        self.ca_path = Some(ca_path.into());
        self
    }

    #[must_use]
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    #[must_use]
    pub fn client_cert(mut self, client_cert: impl Into<PathBuf>) -> Self {
        self.client_cert = Some(client_cert.into());
        self
    }

    #[must_use]
    pub fn location_trusted(mut self, location_trusted: bool) -> Self {
        self.location_trusted = location_trusted;
        self
    }

    #[must_use]
    pub fn on_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }
}
