//! Run configuration, loaded from `dockerlib.toml`.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DockerlibError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "dockerlib.toml";
pub const DEFAULT_LIBRARY_DIR: &str = "../official-images/library";
pub const DEFAULT_GIT_REPO: &str = "git://github.com/influxdata/influxdata-docker";
pub const DEFAULT_MAINTAINER: &str =
    "Jonathan A. Sternberg <jonathan@influxdata.com> (@jsternberg)";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where manifests are discovered.
    pub search_root: PathBuf,
    /// One descriptor per image is written here.
    pub library_dir: PathBuf,
    pub git_repo: String,
    /// Used when neither the manifest nor a previous descriptor names any.
    pub default_maintainers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_root: PathBuf::from("."),
            library_dir: PathBuf::from(DEFAULT_LIBRARY_DIR),
            git_repo: DEFAULT_GIT_REPO.to_string(),
            default_maintainers: vec![DEFAULT_MAINTAINER.to_string()],
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DockerlibError::Config(e.to_string()))
    }

    /// Load `path`, or defaults when `path` is None and the default file
    /// does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_toml(&fs::read_to_string(path)?),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_toml(&fs::read_to_string(default)?)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn descriptor_path(&self, image: &str) -> PathBuf {
        self.library_dir.join(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.default_maintainers, vec![DEFAULT_MAINTAINER]);
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml(
            r#"
library_dir = "/tmp/library"
default_maintainers = ["A <a@example.com> (@a)", "B <b@example.com> (@b)"]
"#,
        )
        .unwrap();
        assert_eq!(config.library_dir, PathBuf::from("/tmp/library"));
        assert_eq!(config.git_repo, DEFAULT_GIT_REPO);
        assert_eq!(config.default_maintainers.len(), 2);
        assert_eq!(config.descriptor_path("influxdb"), PathBuf::from("/tmp/library/influxdb"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::from_toml("libary_dir = \"x\"").unwrap_err();
        assert!(matches!(err, DockerlibError::Config(_)));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, DockerlibError::Io(_)));
    }
}
