//! Box metadata documents.
//!
//! A metadata document is a JSON description of a named box enumerating its
//! versions and, per version, the providers that can serve it. This crate
//! owns the stable wire format, the classification of downloaded payloads
//! (metadata vs. archive), the ordered version model with its constraint
//! language, and the version/provider/architecture selection policy.

pub use self::document::{is_metadata, BoxMetadata, MetadataProvider, MetadataVersion};
pub use self::error::{MetadataError, SelectError};
pub use self::select::{select, ArchRequest, ProviderMatch, Selection};
pub use self::version::{BoxVersion, VersionConstraint};

mod document;
mod error;
mod select;
mod version;
