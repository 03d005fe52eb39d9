//! dockerlib - Docker official-images library descriptor compiler
//!
//! Reads per-image `manifest.json` files, resolves the version installed
//! in every build directory and emits the `library/<image>` descriptor
//! consumed by the official-images repository.
//!
//! Build files and git are reached only through the [`VersionResolver`],
//! [`RevisionOracle`] and [`DirectoryLister`] traits.

pub mod compiler;
pub mod config;
pub mod discovery;
pub mod error;
pub mod git;
pub mod header;
pub mod incremental;
pub mod manifest;
pub mod output;
pub mod resolve;
pub mod revision;
pub mod version;

pub use compiler::{tags_for, DescriptorCompiler};
pub use config::Config;
pub use discovery::{DirectoryLister, LocalFs};
pub use error::{DockerlibError, Result};
pub use git::{GitCli, RevisionOracle};
pub use header::{write_descriptor, Header};
pub use incremental::IncrementalCompiler;
pub use manifest::{FlatManifest, ImageManifest, Variant, VersionGroup};
pub use output::{sha256_hex, write_if_changed};
pub use resolve::{DockerfileResolver, VersionResolver};
pub use revision::{RefreshOutcome, RevisionMap};
pub use version::{Selection, Version};

pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");
