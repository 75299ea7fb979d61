use crate::error::{FetchError, Result};
use crate::options::DownloaderOptions;
use crate::url::scrub_credentials;
use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Certificate, Client, Identity};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

const MAX_REDIRECTS: u32 = 10;

/// A completed download: the destination file plus the media type surfaced
/// by the transport, when any.
#[derive(Debug)]
pub struct Download {
    pub path: PathBuf,
    pub media_type: Option<String>,
}

/// Transport handle for `http(s)` and `file` URLs, wired with the TLS and
/// auth options read from the environment.
pub struct Downloader {
    options: DownloaderOptions,
}

impl Downloader {
    pub fn new(options: DownloaderOptions) -> Self {
        Self { options }
    }

    /// Download `url` to `dest`. The partial file is removed on failure.
    pub async fn download(&self, url: &Url, dest: &Path) -> Result<Download> {
        debug!(url = %scrub_credentials(url.as_str()), dest = %dest.display(), "downloading");
        let result = match url.scheme() {
            "file" => self.download_local(url, dest).await,
            "http" | "https" => self.download_http(url, dest).await,
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        };
        if result.is_err() {
            let _ = tokio::fs::remove_file(dest).await;
        }
        result
    }

    async fn download_local(&self, url: &Url, dest: &Path) -> Result<Download> {
        let source = url
            .to_file_path()
            .map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        if !source.is_file() {
            return Err(FetchError::MissingFile(source));
        }
        let len = tokio::fs::copy(&source, dest).await?;
        if let Some(on_progress) = &self.options.on_progress {
            on_progress(len, Some(len));
        }
        Ok(Download {
            path: dest.to_path_buf(),
            media_type: None,
        })
    }

    async fn download_http(&self, url: &Url, dest: &Path) -> Result<Download> {
        let client = self.build_client()?;
        let credentials = url_credentials(url);

        // Redirects are followed by hand so that embedded credentials are
        // re-sent only to the original origin, unless `location_trusted`
        // extends trust to every redirect target.
        let mut current = url.clone();
        for _ in 0..MAX_REDIRECTS {
            let mut request = client.get(strip_credentials(&current));
            if let Some((user, pass)) = &credentials {
                if self.options.location_trusted || same_origin(&current, url) {
                    request = request.basic_auth(user, pass.as_deref());
                }
            }

            let response = request.send().await?;
            let status = response.status();

            if is_redirect(status.as_u16()) {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| {
                        FetchError::Network(format!(
                            "redirect without a Location header from {}",
                            scrub_credentials(current.as_str())
                        ))
                    })?;
                current = current
                    .join(location)
                    .map_err(|_| FetchError::InvalidUrl(location.to_string()))?;
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::Http {
                    status: status.as_u16(),
                    url: scrub_credentials(url.as_str()),
                });
            }

            let media_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let total = response.content_length();

            let mut file = tokio::fs::File::create(dest).await?;
            let mut stream = response.bytes_stream();
            let mut downloaded = 0u64;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                downloaded += chunk.len() as u64;
                if let Some(on_progress) = &self.options.on_progress {
                    on_progress(downloaded, total);
                }
            }
            file.flush().await?;

            return Ok(Download {
                path: dest.to_path_buf(),
                media_type,
            });
        }

        Err(FetchError::TooManyRedirects {
            count: MAX_REDIRECTS,
            url: scrub_credentials(url.as_str()),
        })
    }

    fn build_client(&self) -> Result<Client> {
        let mut builder = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("boxhaul/", env!("CARGO_PKG_VERSION")));

        if let Some(path) = &self.options.ca_cert {
            builder = builder.add_root_certificate(Certificate::from_pem(&std::fs::read(path)?)?);
        }
        if let Some(dir) = &self.options.ca_path {
            for entry in std::fs::read_dir(dir)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    builder = builder
                        .add_root_certificate(Certificate::from_pem(&std::fs::read(entry.path())?)?);
                }
            }
        }
        if self.options.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(path) = &self.options.client_cert {
            builder = builder.identity(Identity::from_pem(&std::fs::read(path)?)?);
        }
        if self.options.disable_ssl_revoke_best_effort {
            // Revocation checking is a property of the platform TLS backend;
            // backends that do not check simply ignore this.
            debug!("revocation-check failures will not abort the transfer");
        }

        Ok(builder.build()?)
    }
}

fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

fn url_credentials(url: &Url) -> Option<(String, Option<String>)> {
    if url.username().is_empty() {
        return None;
    }
    Some((
        url.username().to_string(),
        url.password().map(str::to_string),
    ))
}

fn strip_credentials(url: &Url) -> Url {
    let mut stripped = url.clone();
    let _ = stripped.set_username("");
    let _ = stripped.set_password(None);
    stripped
}

fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme() && a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
}
