//! Descriptor compiler for hierarchical manifests.
//!
//! One block per version directory, followed by one block per variant
//! that includes that version. Blocks come out in declaration order.

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;
use crate::header::{write_descriptor, Header};
use crate::manifest::{ImageManifest, Variant};
use crate::resolve::VersionResolver;
use crate::version::Version;

pub const TAGS: &str = "Tags";
pub const ARCHITECTURES: &str = "Architectures";
pub const DIRECTORY: &str = "Directory";
pub const GIT_REPO: &str = "GitRepo";
pub const GIT_COMMIT: &str = "GitCommit";

/// Tags for a directory whose resolved version is `version`.
///
/// `suffix` is the variant tag name, if any. The trailing `latest` tag is
/// the literal `latest` for the main image and the bare suffix for a
/// variant.
pub fn tags_for(version: &Version, suffix: Option<&str>, is_latest: bool) -> Vec<String> {
    let mut tags: Vec<String> = version
        .progressive_prefixes()
        .into_iter()
        .map(|prefix| match suffix {
            Some(s) => format!("{}-{}", prefix, s),
            None => prefix,
        })
        .collect();
    if is_latest {
        tags.push(suffix.unwrap_or("latest").to_string());
    }
    tags
}

pub(crate) fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub struct DescriptorCompiler<'a> {
    resolver: &'a dyn VersionResolver,
}

impl<'a> DescriptorCompiler<'a> {
    pub fn new(resolver: &'a dyn VersionResolver) -> Self {
        Self { resolver }
    }

    /// Build every directory block for `manifest`.
    pub fn compile(&self, manifest: &ImageManifest) -> Result<Vec<Header>> {
        let mut blocks = vec![];
        for group in &manifest.major_versions {
            for version in &group.versions {
                let nominal = version.to_string();
                let dir = version_dir(&manifest.base_dir, version);
                let is_latest = manifest.latest.as_deref() == Some(nominal.as_str());
                blocks.push(self.block(&dir, None, is_latest, &group.architectures)?);

                for variant in group.variants.iter().filter(|v| v.includes(version)) {
                    blocks.push(self.variant_block(&dir, variant, &nominal)?);
                }
            }
        }
        Ok(blocks)
    }

    /// Write `prefix` then every block. Nothing is written if any
    /// directory fails to resolve.
    pub fn write<W: Write>(
        &self,
        w: &mut W,
        manifest: &ImageManifest,
        prefix: Option<&Header>,
    ) -> Result<usize> {
        let blocks = self.compile(manifest)?;
        write_descriptor(w, prefix, &blocks)?;
        Ok(blocks.len())
    }

    fn variant_block(&self, dir: &Path, variant: &Variant, nominal: &str) -> Result<Header> {
        let vardir = dir.join(&variant.name);
        let is_latest = variant.latest.as_deref() == Some(nominal);
        let name = variant.tag_name();
        self.block(&vardir, Some(&name), is_latest, &variant.architectures)
    }

    fn block(
        &self,
        dir: &Path,
        suffix: Option<&str>,
        is_latest: bool,
        architectures: &[String],
    ) -> Result<Header> {
        let version = self.resolver.resolve(dir)?;
        debug!(dir = %dir.display(), %version, "resolved directory");

        let mut header = Header::new();
        for tag in tags_for(&version, suffix, is_latest) {
            header.add(TAGS, tag);
        }
        for arch in architectures {
            header.add(ARCHITECTURES, arch.as_str());
        }
        header.add(DIRECTORY, display_path(dir));
        Ok(header)
    }
}

/// Directory of `version` under `base_dir`.
pub fn version_dir(base_dir: &Path, version: &Version) -> PathBuf {
    base_dir.join(version.to_string())
}
