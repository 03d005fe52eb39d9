//! Incremental compiler for flat manifests.
//!
//! Every block carries its own `GitRepo` and `GitCommit`. The commit is
//! taken from the [`RevisionMap`] after a refresh, so a directory keeps
//! its previous revision until its contents change.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::compiler::{
    display_path, tags_for, ARCHITECTURES, DIRECTORY, GIT_COMMIT, GIT_REPO, TAGS,
};
use crate::discovery::DirectoryLister;
use crate::error::{DockerlibError, Result};
use crate::git::RevisionOracle;
use crate::header::{Header, MAINTAINERS};
use crate::manifest::{FlatManifest, Variant};
use crate::resolve::VersionResolver;
use crate::revision::RevisionMap;
use crate::version::Version;

/// Probed when a manifest declares no architectures.
pub const DEFAULT_ARCHITECTURE: &str = "amd64";

pub struct IncrementalCompiler<'a> {
    resolver: &'a dyn VersionResolver,
    oracle: &'a dyn RevisionOracle,
    fs: &'a dyn DirectoryLister,
    git_repo: String,
}

impl<'a> IncrementalCompiler<'a> {
    pub fn new(
        resolver: &'a dyn VersionResolver,
        oracle: &'a dyn RevisionOracle,
        fs: &'a dyn DirectoryLister,
        git_repo: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            oracle,
            fs,
            git_repo: git_repo.into(),
        }
    }

    /// Maintainers header: the manifest's own, else those recovered from
    /// the previous descriptor, else `fallback`.
    pub fn prefix(manifest: &FlatManifest, revisions: &RevisionMap, fallback: &[String]) -> Header {
        let maintainers = [manifest.maintainers.as_slice(), revisions.maintainers(), fallback]
            .into_iter()
            .find(|m| !m.is_empty())
            .unwrap_or_default();

        let mut header = Header::new();
        for maintainer in maintainers {
            header.add(MAINTAINERS, maintainer.as_str());
        }
        header
    }

    /// Build every block, refreshing `revisions` along the way.
    pub fn compile(
        &self,
        manifest: &FlatManifest,
        revisions: &mut RevisionMap,
    ) -> Result<Vec<Header>> {
        let mut entries: Vec<(PathBuf, &Version)> = manifest
            .group
            .versions
            .iter()
            .map(|v| (manifest.base_dir.join(v.to_string()), v))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut blocks = vec![];
        for (path, nominal) in entries {
            blocks.extend(self.compile_version(manifest, &path, nominal, revisions)?);
        }
        Ok(blocks)
    }

    fn compile_version(
        &self,
        manifest: &FlatManifest,
        path: &Path,
        nominal: &Version,
        revisions: &mut RevisionMap,
    ) -> Result<Vec<Header>> {
        let group = &manifest.group;
        let variants: Vec<&Variant> = group
            .variants
            .iter()
            .filter(|v| v.includes(nominal))
            .collect();
        let version = self.agreed_version(path, &group.architectures, &variants)?;

        let base = nominal.to_string();
        if !version.to_string().starts_with(&base) {
            return Err(DockerlibError::Mismatch {
                dir: path.to_path_buf(),
                expected: format!("a version starting with {}", base),
                actual: version.to_string(),
            });
        }

        let is_latest = manifest.latest.as_deref() == Some(base.as_str());
        let mut header = Header::new();
        for tag in tags_for(&version, None, is_latest) {
            header.add(TAGS, tag);
        }
        for arch in &group.architectures {
            header.add(ARCHITECTURES, arch.as_str());
        }
        self.add_source(&mut header, path, revisions)?;

        for arch in &group.architectures {
            let dir = path.join(arch);
            if self.fs.is_dir(&dir) {
                header.add(&format!("{}-{}", arch, DIRECTORY), display_path(&dir));
            }
        }

        let mut blocks = vec![header];
        for variant in variants {
            let name = variant.tag_name();
            let is_latest = variant.latest.as_deref() == Some(base.as_str());
            let mut header = Header::new();
            for tag in tags_for(&version, Some(&name), is_latest) {
                header.add(TAGS, tag);
            }
            self.add_source(&mut header, &path.join(&variant.name), revisions)?;
            blocks.push(header);
        }
        Ok(blocks)
    }

    /// Resolve every architecture and variant directory; all must agree.
    fn agreed_version(
        &self,
        path: &Path,
        architectures: &[String],
        variants: &[&Variant],
    ) -> Result<Version> {
        let default_arch = [DEFAULT_ARCHITECTURE.to_string()];
        let archs = if architectures.is_empty() {
            &default_arch[..]
        } else {
            architectures
        };

        let mut dirs: Vec<PathBuf> = archs
            .iter()
            .map(|arch| {
                let dir = path.join(arch);
                if self.fs.is_dir(&dir) {
                    dir
                } else {
                    path.to_path_buf()
                }
            })
            .collect();
        dirs.extend(variants.iter().map(|v| path.join(&v.name)));

        let mut agreed: Option<Version> = None;
        for dir in dirs {
            let version = self.resolver.resolve(&dir)?;
            if let Some(expected) = &agreed {
                if *expected != version {
                    return Err(DockerlibError::Mismatch {
                        dir,
                        expected: expected.to_string(),
                        actual: version.to_string(),
                    });
                }
            }
            if agreed.is_none() {
                agreed = Some(version);
            }
        }

        agreed.ok_or_else(|| DockerlibError::Resolution {
            dir: path.to_path_buf(),
            reason: "no directories to resolve".to_string(),
        })
    }

    fn add_source(
        &self,
        header: &mut Header,
        dir: &Path,
        revisions: &mut RevisionMap,
    ) -> Result<()> {
        let current = self.oracle.latest_revision(dir)?;
        let outcome = revisions.refresh(dir, &current, self.oracle)?;
        debug!(dir = %dir.display(), ?outcome, "revision refreshed");

        let key = display_path(dir);
        let commit = revisions.get(&key).unwrap_or(current.as_str()).to_string();
        header.set(GIT_REPO, self.git_repo.as_str());
        header.set(GIT_COMMIT, commit);
        header.set(DIRECTORY, key);
        Ok(())
    }
}
