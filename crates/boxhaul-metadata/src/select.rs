//! Version, provider and architecture selection.
//!
//! Selection walks the document's versions newest-first: versions failing the
//! constraint are dropped, then each surviving version is scanned for
//! providers acceptable under the requested provider names and architecture.
//! A version with no acceptable provider is skipped in favour of the next
//! older one.

use crate::document::{BoxMetadata, MetadataProvider, MetadataVersion};
use crate::error::SelectError;
use crate::version::{BoxVersion, VersionConstraint};
use boxhaul_platform::Arch;
use tracing::warn;

/// The architecture the caller asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ArchRequest {
    /// Match entries naming this exact architecture string.
    Explicit(String),
    /// Match the detected host architecture, falling back to a sole
    /// default-architecture entry whose architecture is unrecognised.
    Auto,
    /// No preference: host architecture if present, else the
    /// default-architecture entry.
    #[default]
    Unspecified,
}

/// A provider entry accepted by the selection policy, together with the
/// architecture to record on the installed box.
#[derive(Debug, Clone)]
pub struct ProviderMatch<'a> {
    pub provider: &'a MetadataProvider,
    pub architecture: Option<String>,
}

/// The chosen version and its acceptable providers, before disambiguation.
#[derive(Debug)]
pub struct Selection<'a> {
    pub version: &'a MetadataVersion,
    pub matches: Vec<ProviderMatch<'a>>,
}

pub fn select<'a>(
    metadata: &'a BoxMetadata,
    constraint: &VersionConstraint,
    providers: &[String],
    arch: &ArchRequest,
    host: Arch,
) -> Result<Selection<'a>, SelectError> {
    let mut versions: Vec<(&MetadataVersion, BoxVersion)> = metadata
        .versions
        .iter()
        .filter_map(|version| match BoxVersion::parse(&version.version) {
            Ok(parsed) => Some((version, parsed)),
            Err(_) => {
                warn!(box_name = %metadata.name, version = %version.version,
                      "skipping unparseable version in metadata");
                None
            }
        })
        .filter(|(_, parsed)| constraint.matches(parsed))
        .collect();

    if versions.is_empty() {
        return Err(SelectError::NoMatchingVersion {
            name: metadata.name.clone(),
            constraint: constraint.to_string(),
        });
    }

    versions.sort_by(|a, b| b.1.cmp(&a.1));

    for (version, _) in &versions {
        let matches = match_providers(version, providers, arch, host);
        if !matches.is_empty() {
            return Ok(Selection { version, matches });
        }
    }

    Err(SelectError::NoMatchingProvider {
        name: metadata.name.clone(),
        requested: if providers.is_empty() {
            "any provider".to_string()
        } else {
            providers.join(", ")
        },
    })
}

fn match_providers<'a>(
    version: &'a MetadataVersion,
    requested: &[String],
    arch: &ArchRequest,
    host: Arch,
) -> Vec<ProviderMatch<'a>> {
    let by_name: Vec<&MetadataProvider> = version
        .providers
        .iter()
        .filter(|p| requested.is_empty() || requested.iter().any(|r| *r == p.name))
        .collect();

    match arch {
        ArchRequest::Explicit(want) => by_name
            .into_iter()
            .filter(|p| p.architecture.as_deref() == Some(want.as_str()))
            .map(|p| ProviderMatch {
                provider: p,
                architecture: Some(want.clone()),
            })
            .collect(),

        ArchRequest::Auto => {
            let host_matches = host_arch_matches(&by_name, host);
            if !host_matches.is_empty() {
                return host_matches;
            }
            let defaults: Vec<&MetadataProvider> = by_name
                .into_iter()
                .filter(|p| p.default_architecture && !recognized_architecture(p))
                .collect();
            match defaults.as_slice() {
                &[sole] => vec![ProviderMatch {
                    provider: sole,
                    architecture: None,
                }],
                _ => Vec::new(),
            }
        }

        ArchRequest::Unspecified => {
            let host_matches = host_arch_matches(&by_name, host);
            if !host_matches.is_empty() {
                return host_matches;
            }
            by_name
                .into_iter()
                .filter(|p| p.default_architecture)
                .map(|p| ProviderMatch {
                    provider: p,
                    architecture: p.architecture.clone(),
                })
                .collect()
        }
    }
}

fn host_arch_matches<'a>(
    providers: &[&'a MetadataProvider],
    host: Arch,
) -> Vec<ProviderMatch<'a>> {
    providers
        .iter()
        .copied()
        .filter(|p| {
            p.architecture
                .as_deref()
                .and_then(|s| s.parse::<Arch>().ok())
                .is_some_and(|a| a == host)
        })
        .map(|p| ProviderMatch {
            provider: p,
            architecture: p.architecture.clone(),
        })
        .collect()
}

fn recognized_architecture(provider: &MetadataProvider) -> bool {
    provider
        .architecture
        .as_deref()
        .is_some_and(Arch::recognizes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BoxMetadata;

    fn doc(json: &str) -> BoxMetadata {
        BoxMetadata::from_slice(json.as_bytes()).unwrap()
    }

    fn two_versions() -> BoxMetadata {
        doc(r#"{
            "name": "foo/bar",
            "versions": [
                {"version": "0.5", "providers": [
                    {"name": "virtualbox", "url": "http://h/0.5.box", "architecture": "amd64"}
                ]},
                {"version": "0.7", "providers": [
                    {"name": "virtualbox", "url": "http://h/0.7.box", "architecture": "amd64"},
                    {"name": "vmware", "url": "http://h/0.7-vmw.box", "architecture": "amd64"}
                ]},
                {"version": "1.5"}
            ]
        }"#)
    }

    #[test]
    fn test_selects_newest_version_with_providers() {
        let metadata = two_versions();
        let selection = select(
            &metadata,
            &VersionConstraint::any(),
            &[],
            &ArchRequest::Unspecified,
            Arch::X86_64,
        )
        .unwrap();
        // 1.5 has no providers and is skipped.
        assert_eq!(selection.version.version, "0.7");
        assert_eq!(selection.matches.len(), 2);
    }

    #[test]
    fn test_provider_filter_skips_versions_without_it() {
        let metadata = two_versions();
        let selection = select(
            &metadata,
            &VersionConstraint::any(),
            &["vmware".to_string()],
            &ArchRequest::Unspecified,
            Arch::X86_64,
        )
        .unwrap();
        assert_eq!(selection.version.version, "0.7");
        assert_eq!(selection.matches.len(), 1);
        assert_eq!(selection.matches[0].provider.name, "vmware");
    }

    #[test]
    fn test_version_constraint_applies() {
        let metadata = two_versions();
        let constraint = VersionConstraint::parse("< 0.7").unwrap();
        let selection = select(
            &metadata,
            &constraint,
            &[],
            &ArchRequest::Unspecified,
            Arch::X86_64,
        )
        .unwrap();
        assert_eq!(selection.version.version, "0.5");
    }

    #[test]
    fn test_no_matching_version() {
        let metadata = two_versions();
        let constraint = VersionConstraint::parse("> 9.0").unwrap();
        let err = select(
            &metadata,
            &constraint,
            &[],
            &ArchRequest::Unspecified,
            Arch::X86_64,
        )
        .unwrap_err();
        assert!(matches!(err, SelectError::NoMatchingVersion { .. }));
    }

    #[test]
    fn test_no_matching_provider() {
        let metadata = two_versions();
        let err = select(
            &metadata,
            &VersionConstraint::any(),
            &["hyperv".to_string()],
            &ArchRequest::Unspecified,
            Arch::X86_64,
        )
        .unwrap_err();
        assert!(matches!(err, SelectError::NoMatchingProvider { .. }));
    }

    #[test]
    fn test_explicit_architecture_is_literal() {
        let metadata = doc(r#"{
            "name": "b",
            "versions": [{"version": "1.0", "providers": [
                {"name": "virtualbox", "url": "http://h/a.box", "architecture": "amd64"},
                {"name": "virtualbox", "url": "http://h/b.box", "architecture": "arm64"}
            ]}]
        }"#);
        let selection = select(
            &metadata,
            &VersionConstraint::any(),
            &[],
            &ArchRequest::Explicit("arm64".to_string()),
            Arch::X86_64,
        )
        .unwrap();
        assert_eq!(selection.matches.len(), 1);
        assert_eq!(selection.matches[0].provider.url, "http://h/b.box");
        assert_eq!(selection.matches[0].architecture.as_deref(), Some("arm64"));
    }

    #[test]
    fn test_auto_matches_host_through_aliases() {
        let metadata = doc(r#"{
            "name": "b",
            "versions": [{"version": "1.0", "providers": [
                {"name": "virtualbox", "url": "http://h/a.box", "architecture": "x86_64"}
            ]}]
        }"#);
        let selection = select(
            &metadata,
            &VersionConstraint::any(),
            &[],
            &ArchRequest::Auto,
            Arch::X86_64,
        )
        .unwrap();
        assert_eq!(selection.matches[0].architecture.as_deref(), Some("x86_64"));
    }

    #[test]
    fn test_auto_falls_back_to_sole_unrecognized_default() {
        let metadata = doc(r#"{
            "name": "b",
            "versions": [{"version": "1.0", "providers": [
                {"name": "virtualbox", "url": "http://h/a.box",
                 "architecture": "unknown", "default_architecture": true}
            ]}]
        }"#);
        let selection = select(
            &metadata,
            &VersionConstraint::any(),
            &[],
            &ArchRequest::Auto,
            Arch::X86_64,
        )
        .unwrap();
        // The sole unrecognised default matches with no recorded architecture.
        assert!(selection.matches[0].architecture.is_none());
    }

    #[test]
    fn test_auto_fallback_requires_exactly_one_default() {
        let metadata = doc(r#"{
            "name": "b",
            "versions": [{"version": "1.0", "providers": [
                {"name": "virtualbox", "url": "http://h/a.box",
                 "architecture": "unknown", "default_architecture": true},
                {"name": "virtualbox", "url": "http://h/b.box",
                 "architecture": "mystery", "default_architecture": true}
            ]}]
        }"#);
        let err = select(
            &metadata,
            &VersionConstraint::any(),
            &[],
            &ArchRequest::Auto,
            Arch::X86_64,
        )
        .unwrap_err();
        assert!(matches!(err, SelectError::NoMatchingProvider { .. }));
    }

    #[test]
    fn test_unspecified_falls_back_to_default_architecture() {
        let metadata = doc(r#"{
            "name": "b",
            "versions": [{"version": "1.0", "providers": [
                {"name": "virtualbox", "url": "http://h/a.box",
                 "architecture": "arm64", "default_architecture": true}
            ]}]
        }"#);
        let selection = select(
            &metadata,
            &VersionConstraint::any(),
            &[],
            &ArchRequest::Unspecified,
            Arch::X86_64,
        )
        .unwrap();
        assert_eq!(selection.matches[0].architecture.as_deref(), Some("arm64"));
    }

    #[test]
    fn test_older_version_wins_when_newer_lacks_architecture() {
        let metadata = doc(r#"{
            "name": "b",
            "versions": [
                {"version": "2.0", "providers": [
                    {"name": "virtualbox", "url": "http://h/2.box", "architecture": "arm64"}
                ]},
                {"version": "1.0", "providers": [
                    {"name": "virtualbox", "url": "http://h/1.box", "architecture": "amd64"}
                ]}
            ]
        }"#);
        let selection = select(
            &metadata,
            &VersionConstraint::any(),
            &[],
            &ArchRequest::Auto,
            Arch::X86_64,
        )
        .unwrap();
        assert_eq!(selection.version.version, "1.0");
    }
}
