//! boxhaul — the box-add pipeline of a VM image manager.
//!
//! The pipeline resolves a user-supplied reference (direct file, remote URL,
//! `owner/name` short-hand, or JSON metadata document) into a concrete image
//! archive, downloads it under a per-URL mutex file, verifies its checksum,
//! and hands the verified artifact to the box collection before invoking the
//! next pipeline stage.
//!
//! The heavy lifting lives in the member crates:
//! `boxhaul-fetch` (URL normalisation, transport, URL locks),
//! `boxhaul-metadata` (wire format, versions, candidate selection),
//! `boxhaul-verify` (checksums) and `boxhaul-platform` (host architecture).
//! This crate contributes the typed environment, the external trait seams
//! and the [`BoxAdd`] orchestrator.

pub mod add;
pub mod cli;
pub mod collection;
pub mod env;
pub mod error;
pub mod hooks;
pub mod ui;

pub use add::{BoxAdd, Stage};
pub use collection::{AddOptions, BoxCollection, CatalogBox, CollectionError, DirCollection};
pub use env::AddEnv;
pub use error::AddError;
pub use hooks::{AuthHooks, NullHooks};
pub use ui::{ConsoleUi, Ui};
