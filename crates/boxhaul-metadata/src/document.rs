use crate::error::MetadataError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A box metadata document: the JSON wire format served by box catalogs.
///
/// `name` and `versions` are required; a document missing either is
/// malformed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoxMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub versions: Vec<MetadataVersion>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataVersion {
    pub version: String,
    #[serde(default)]
    pub providers: Vec<MetadataProvider>,
}

/// A provider entry, matched by the `(name, architecture)` tuple. An absent
/// `architecture` is "unspecified" and participates only through the
/// default-architecture rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataProvider {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(default)]
    pub default_architecture: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl BoxMetadata {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MetadataError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Whether a downloaded payload is a metadata document.
///
/// A media type surfaced by the transport decides alone: the payload is
/// metadata exactly when the type's essence is `application/json`
/// (parameters such as `charset=utf-8` are ignored). Without a media type
/// the payload is sniffed by attempting a JSON parse.
pub fn is_metadata(media_type: Option<&str>, path: &Path) -> std::io::Result<bool> {
    if let Some(media_type) = media_type {
        return Ok(media_essence(media_type) == "application/json");
    }
    let file = File::open(path)?;
    Ok(serde_json::from_reader::<_, serde_json::Value>(BufReader::new(file)).is_ok())
}

fn media_essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
