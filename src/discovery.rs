//! Manifest discovery over a directory tree.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;

pub const MANIFEST_FILE: &str = "manifest.json";

pub trait DirectoryLister {
    fn is_dir(&self, path: &Path) -> bool;

    /// Every `manifest.json` below `root`, sorted, skipping `.git`.
    fn find_manifests(&self, root: &Path) -> Result<Vec<PathBuf>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl DirectoryLister for LocalFs {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn find_manifests(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut found = vec![];
        walk(root, &mut found)?;
        found.sort();

        // Keep paths relative when walking the current directory.
        if root == Path::new(".") {
            found = found
                .into_iter()
                .map(|p| p.strip_prefix(".").map(Path::to_path_buf).unwrap_or(p))
                .collect();
        }
        Ok(found)
    }
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if entry.file_name() == ".git" {
                continue;
            }
            walk(&path, found)?;
        } else if entry.file_name() == MANIFEST_FILE {
            debug!(path = %path.display(), "found manifest");
            found.push(path);
        }
    }
    Ok(())
}
