//! Version resolution - which version a build directory actually installs.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use crate::error::{DockerlibError, Result};
use crate::version::Version;

pub trait VersionResolver {
    fn resolve(&self, dir: &Path) -> Result<Version>;
}

impl<F> VersionResolver for F
where
    F: Fn(&Path) -> Result<Version>,
{
    fn resolve(&self, dir: &Path) -> Result<Version> {
        self(dir)
    }
}

/// Reads the first `ENV <NAME>_VERSION <value>` line of `<dir>/Dockerfile`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerfileResolver;

impl DockerfileResolver {
    pub const FILE_NAME: &'static str = "Dockerfile";
}

impl VersionResolver for DockerfileResolver {
    fn resolve(&self, dir: &Path) -> Result<Version> {
        let path = dir.join(Self::FILE_NAME);
        let file = File::open(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DockerlibError::Resolution {
                dir: dir.to_path_buf(),
                reason: format!("{} not found", Self::FILE_NAME),
            },
            _ => DockerlibError::Io(e),
        })?;

        for line in BufReader::new(file).lines() {
            if let Some(raw) = version_declaration(&line?) {
                return Version::parse(raw);
            }
        }

        Err(DockerlibError::Resolution {
            dir: dir.to_path_buf(),
            reason: "no ENV *_VERSION declaration".to_string(),
        })
    }
}

/// Extract the version part of `ENV FOO_VERSION 1.8.3-c1.8.3`.
fn version_declaration(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("ENV ")?;
    let parts: Vec<&str> = rest.split(' ').collect();
    match parts.as_slice() {
        [name, value] if name.ends_with("_VERSION") => value.split('-').next(),
        _ => None,
    }
}
