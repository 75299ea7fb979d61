//! The add orchestrator.
//!
//! One invocation classifies the input (direct archive, metadata document,
//! or `owner/name` short-hand), fetches metadata and selects a candidate
//! when needed, downloads the archive under a per-URL lock, verifies the
//! declared checksum, installs the artifact into the collection and invokes
//! the downstream stage.

use crate::collection::{AddOptions, CatalogBox};
use crate::env::AddEnv;
use crate::error::AddError;
use crate::ui::Ui;
use boxhaul_fetch::{
    cache_file_name, is_shorthand, normalize, scrub_credentials, Download, Downloader, FetchError,
    UrlLock,
};
use boxhaul_metadata::{
    is_metadata, select, ArchRequest, BoxMetadata, ProviderMatch, Selection, VersionConstraint,
};
use boxhaul_platform::Arch;
use boxhaul_verify::{Checksum, ChecksumError, ChecksumKind};
use std::path::Path;
use tracing::{debug, info};
use url::Url;

/// A downstream pipeline stage, invoked only after the collection accepted
/// the artifact.
pub trait Stage: Send + Sync {
    fn call(&self, env: &mut AddEnv) -> Result<(), AddError>;
}

/// The box-add middleware stage.
pub struct BoxAdd {
    next: Option<Box<dyn Stage>>,
}

/// A downloaded file together with its URL lock.
///
/// The lock spans the fetch-and-verify window; dropping the guard removes
/// the temporary file and then releases the lock, on every exit path.
struct FetchedFile {
    download: Download,
    url: String,
    _lock: UrlLock,
}

impl Drop for FetchedFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.download.path);
    }
}

impl Default for BoxAdd {
    fn default() -> Self {
        Self::new()
    }
}

impl BoxAdd {
    pub fn new() -> Self {
        Self { next: None }
    }

    pub fn with_next(next: Box<dyn Stage>) -> Self {
        Self { next: Some(next) }
    }

    /// Run the stage: resolve, download, verify, install, then hand off.
    pub async fn call(&self, env: &mut AddEnv) -> Result<(), AddError> {
        let added = self.add(env).await?;
        env.box_added = Some(added);
        if let Some(next) = &self.next {
            next.call(env)?;
        }
        Ok(())
    }

    async fn add(&self, env: &mut AddEnv) -> Result<CatalogBox, AddError> {
        // An unusable checksum declaration fails before any bytes move.
        let env_checksum = declared_checksum(env.checksum_type.as_deref(), env.checksum.as_deref())?;

        let urls = env.urls.clone();
        let Some(first) = urls.first().cloned() else {
            return Err(AddError::Downloader {
                message: "no box URL was provided".to_string(),
            });
        };

        if urls.len() > 1 {
            return self.add_direct(env, &urls, None, env_checksum).await;
        }

        if is_shorthand(&first) {
            return self.add_shorthand(env, &first).await;
        }

        // A single URL may carry either an archive or a metadata document;
        // only the downloaded payload can tell.
        env.hooks.authenticate_downloader(&mut env.download);
        let authed = env.hooks.authenticate_urls(vec![first.clone()]);
        let authed_url = authed.into_iter().next().unwrap_or_else(|| first.clone());

        let fetched = self.fetch(env, &authed_url).await.map_err(AddError::from)?;
        if is_metadata(fetched.download.media_type.as_deref(), &fetched.download.path)? {
            let metadata = BoxMetadata::load(&fetched.download.path).map_err(|e| {
                AddError::MetadataDownload {
                    url: scrub_credentials(&first),
                    message: e.to_string(),
                }
            })?;
            // Temp file and metadata lock go away before the archive fetch.
            drop(fetched);
            return self.add_from_metadata(env, metadata, &first).await;
        }

        self.add_direct(env, &urls, Some(fetched), env_checksum).await
    }

    /// Direct path: the URLs point at archives. `prefetched` carries the
    /// payload when classification already downloaded the single URL.
    async fn add_direct(
        &self,
        env: &mut AddEnv,
        urls: &[String],
        prefetched: Option<FetchedFile>,
        checksum: Option<Checksum>,
    ) -> Result<CatalogBox, AddError> {
        let name = env.name.clone().ok_or(AddError::NameRequired)?;
        if env.version.is_some() {
            return Err(AddError::DirectVersion);
        }
        if looks_like_url(&name) {
            env.ui.warn(&scrub_credentials(&format!(
                "The box name '{name}' looks like a URL. Box names are labels, not \
                 locations; continuing with it as the name."
            )));
        }

        let architecture = requested_architecture(&env.architecture);
        if let Some(existing) =
            env.collection
                .find(&name, &env.providers, "0", architecture.as_deref())?
        {
            if !env.force {
                return Err(AddError::AlreadyExists {
                    name: existing.name,
                    provider: existing.provider,
                    version: existing.version,
                });
            }
        }

        let fetched = match prefetched {
            Some(fetched) => fetched,
            None => {
                env.hooks.authenticate_downloader(&mut env.download);
                let authed = env.hooks.authenticate_urls(urls.to_vec());
                self.fetch_fallback(env, &authed).await?
            }
        };

        if let Some(checksum) = &checksum {
            verify_checksum(checksum, &fetched.download.path, &fetched.url)?;
        }

        let opts = AddOptions {
            architecture,
            metadata_url: None,
            force: env.force,
            providers: env.providers.clone(),
        };
        let added = env.collection.add(&fetched.download.path, &name, "0", &opts)?;
        info!(name = %added.name, provider = %added.provider, "box added");
        Ok(added)
    }

    /// Metadata path: select a version/provider/architecture tuple, then
    /// fetch the provider's archive. Provider URLs are never re-classified
    /// as metadata.
    async fn add_from_metadata(
        &self,
        env: &mut AddEnv,
        metadata: BoxMetadata,
        metadata_url: &str,
    ) -> Result<CatalogBox, AddError> {
        if let Some(requested) = &env.name {
            if *requested != metadata.name {
                return Err(AddError::NameMismatch {
                    requested: requested.clone(),
                    actual: metadata.name.clone(),
                });
            }
        }

        let constraint = match &env.version {
            Some(raw) => VersionConstraint::parse(raw)
                .map_err(|_| AddError::InvalidVersionConstraint(raw.clone()))?,
            None => VersionConstraint::any(),
        };

        let selection = select(
            &metadata,
            &constraint,
            &env.providers,
            &env.architecture,
            Arch::current(),
        )?;
        let version = selection.version.version.clone();
        let chosen = pick_provider(&*env.ui, &env.providers, &selection)?;
        let provider_name = chosen.provider.name.clone();
        let provider_url = chosen.provider.url.clone();
        let architecture = chosen.architecture.clone();
        let checksum = declared_checksum(
            chosen.provider.checksum_type.as_deref(),
            chosen.provider.checksum.as_deref(),
        )?;

        env.ui.detail(&format!(
            "Adding box '{}' (v{}) for provider: {}",
            metadata.name,
            version,
            match &architecture {
                Some(arch) => format!("{provider_name} ({arch})"),
                None => provider_name.clone(),
            }
        ));

        if let Some(existing) = env.collection.find(
            &metadata.name,
            std::slice::from_ref(&provider_name),
            &version,
            architecture.as_deref(),
        )? {
            if !env.force {
                return Err(AddError::AlreadyExists {
                    name: existing.name,
                    provider: existing.provider,
                    version: existing.version,
                });
            }
        }

        env.hooks.authenticate_downloader(&mut env.download);
        let authed = env.hooks.authenticate_urls(vec![provider_url.clone()]);
        let authed_url = authed
            .into_iter()
            .next()
            .unwrap_or_else(|| provider_url.clone());
        let fetched = self.fetch(env, &authed_url).await.map_err(AddError::from)?;

        if let Some(checksum) = &checksum {
            verify_checksum(checksum, &fetched.download.path, &provider_url)?;
        }

        let opts = AddOptions {
            architecture,
            metadata_url: Some(metadata_url.to_string()),
            force: env.force,
            providers: vec![provider_name],
        };
        let added = env
            .collection
            .add(&fetched.download.path, &metadata.name, &version, &opts)?;
        info!(name = %added.name, version = %added.version, provider = %added.provider, "box added");
        Ok(added)
    }

    /// Short-hand path: expand `owner/name` against the configured server,
    /// preferring its API endpoint over the plain URL.
    async fn add_shorthand(&self, env: &mut AddEnv, shorthand: &str) -> Result<CatalogBox, AddError> {
        let Some(server) = env.server_url.clone() else {
            return Err(AddError::ServerNotSet);
        };
        let base = server.trim_end_matches('/');
        let candidates = [
            format!("{base}/api/v2/vagrant/{shorthand}"),
            format!("{base}/{shorthand}"),
        ];

        env.ui
            .detail(&format!("Loading metadata for box '{shorthand}'"));

        for (index, candidate) in candidates.iter().enumerate() {
            let last = index == candidates.len() - 1;

            env.hooks.authenticate_downloader(&mut env.download);
            let authed = env.hooks.authenticate_urls(vec![candidate.clone()]);
            let authed_url = authed.into_iter().next().unwrap_or_else(|| candidate.clone());

            match self.fetch(env, &authed_url).await {
                Ok(fetched) => {
                    let metadata = BoxMetadata::load(&fetched.download.path).map_err(|e| {
                        AddError::MetadataDownload {
                            url: scrub_credentials(candidate),
                            message: e.to_string(),
                        }
                    })?;
                    drop(fetched);
                    return self.add_from_metadata(env, metadata, candidate).await;
                }
                Err(FetchError::AlreadyInProgress { lock_path }) => {
                    return Err(AddError::DownloadAlreadyInProgress { lock_path });
                }
                Err(FetchError::Http { status: 404, .. }) if last => break,
                Err(error) if !last => {
                    debug!(url = %scrub_credentials(candidate), error = %error,
                           "API endpoint miss, falling back to the plain short-hand URL");
                }
                Err(error) => {
                    return Err(AddError::MetadataDownload {
                        url: scrub_credentials(candidate),
                        message: scrub_credentials(&error.to_string()),
                    });
                }
            }
        }

        Err(AddError::ShortNotFound {
            shorthand: shorthand.to_string(),
            server,
        })
    }

    /// Fetch one URL: normalise, lock, announce, download. No network I/O
    /// happens unless the lock was acquired.
    async fn fetch(&self, env: &AddEnv, raw_url: &str) -> Result<FetchedFile, FetchError> {
        let url = normalize(raw_url)?;
        let lock = UrlLock::acquire(&env.tmp_path, &url)?;

        env.ui
            .detail(&format!("Downloading: {}", scrub_credentials(url.as_str())));

        let dest = env.tmp_path.join(cache_file_name(&url));
        let downloader = Downloader::new(env.download.clone());
        let download = downloader.download(&url, &dest).await?;

        Ok(FetchedFile {
            download,
            url: url.to_string(),
            _lock: lock,
        })
    }

    /// Multi-URL fallback: iterate left-to-right, advancing past transport
    /// errors; any member resolving to metadata aborts the add.
    async fn fetch_fallback(
        &self,
        env: &AddEnv,
        urls: &[String],
    ) -> Result<FetchedFile, AddError> {
        let mut last_transport_error = None;
        for raw_url in urls {
            match self.fetch(env, raw_url).await {
                Ok(fetched) => {
                    if is_metadata(fetched.download.media_type.as_deref(), &fetched.download.path)? {
                        return Err(AddError::MetadataMultiUrl {
                            url: scrub_credentials(raw_url),
                        });
                    }
                    return Ok(fetched);
                }
                Err(error) if error.is_transport() => {
                    debug!(url = %scrub_credentials(raw_url), error = %error,
                           "box URL failed, trying the next one");
                    last_transport_error = Some(AddError::from(error));
                }
                Err(other) => return Err(AddError::from(other)),
            }
        }
        Err(last_transport_error.unwrap_or(AddError::Downloader {
            message: "no box URL was provided".to_string(),
        }))
    }
}

fn pick_provider<'s>(
    ui: &dyn Ui,
    requested: &[String],
    selection: &'s Selection<'_>,
) -> Result<&'s ProviderMatch<'s>, AddError> {
    if selection.matches.len() == 1 {
        return Ok(&selection.matches[0]);
    }

    if !requested.is_empty() {
        for want in requested {
            if let Some(found) = selection
                .matches
                .iter()
                .find(|candidate| candidate.provider.name == *want)
            {
                return Ok(found);
            }
        }
        // The selector admits only requested providers, so the scan above
        // cannot have come up empty.
        return Ok(&selection.matches[0]);
    }

    ui.detail(
        "This box can work with multiple providers. The box contents are the same, \
         but the provider determines which hypervisor runs it.",
    );
    for (index, candidate) in selection.matches.iter().enumerate() {
        ui.detail(&format!("{}) {}", index + 1, candidate.provider.name));
    }
    loop {
        let answer = ui.ask("Enter the number of the provider to use: ")?;
        match answer.trim().parse::<usize>() {
            Ok(choice) if (1..=selection.matches.len()).contains(&choice) => {
                return Ok(&selection.matches[choice - 1]);
            }
            _ => ui.warn("Please enter a number from the list."),
        }
    }
}

/// Build the checksum expectation from a declared (type, value) pair.
///
/// A missing value, or a value that trims to the empty string, disables
/// verification. A non-empty value with a missing or unrecognised type is a
/// usage error.
fn declared_checksum(
    kind: Option<&str>,
    value: Option<&str>,
) -> Result<Option<Checksum>, AddError> {
    let Some(raw) = value else { return Ok(None) };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let Some(kind) = kind else {
        return Err(AddError::UnknownChecksumKind("unspecified".to_string()));
    };
    let kind: ChecksumKind = kind
        .parse()
        .map_err(|_| AddError::UnknownChecksumKind(kind.to_string()))?;
    Ok(Checksum::new(kind, raw))
}

fn verify_checksum(checksum: &Checksum, path: &Path, url: &str) -> Result<(), AddError> {
    match checksum.verify_file(path) {
        Ok(()) => Ok(()),
        Err(ChecksumError::Mismatch { expected, actual }) => Err(AddError::ChecksumMismatch {
            url: scrub_credentials(url),
            expected,
            actual,
        }),
        Err(ChecksumError::UnknownKind(kind)) => Err(AddError::UnknownChecksumKind(kind)),
        Err(ChecksumError::Io(e)) => Err(AddError::Io(e)),
    }
}

fn looks_like_url(name: &str) -> bool {
    Url::parse(name)
        .map(|url| matches!(url.scheme(), "http" | "https" | "ftp" | "file"))
        .unwrap_or(false)
}

/// The architecture recorded for a direct add, and used for collection
/// lookups.
fn requested_architecture(request: &ArchRequest) -> Option<String> {
    match request {
        ArchRequest::Explicit(arch) => Some(arch.clone()),
        ArchRequest::Auto => Some(Arch::current().as_str().to_string()),
        ArchRequest::Unspecified => None,
    }
}
