//! Manifest model - image versions, variants and architectures.
//!
//! Two JSON shapes are accepted. Hierarchical manifests group versions
//! under `major-versions`; flat manifests declare a single group at the
//! top level. Derived `latest` values are computed once on load.

use serde::de::{self, value::MapAccessDeserializer, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{DockerlibError, Result};
use crate::version::{Selection, Version};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionGroup {
    #[serde(default)]
    pub versions: Vec<Version>,
    #[serde(default)]
    pub architectures: Vec<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone)]
pub struct Variant {
    pub name: String,
    pub versions: Vec<Version>,
    pub architectures: Vec<String>,
    pub latest: Option<String>,
}

impl Variant {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions: vec![],
            architectures: vec![],
            latest: None,
        }
    }

    pub fn includes(&self, version: &Version) -> bool {
        self.versions.iter().any(|v| v == version)
    }

    /// Variant name as it appears inside tags; `data/alpine` becomes `data-alpine`.
    pub fn tag_name(&self) -> String {
        self.name.replace('/', "-")
    }
}

// Flat manifests list variants as bare names.
impl<'de> Deserialize<'de> for Variant {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Full {
            name: String,
            #[serde(default)]
            versions: Vec<Version>,
            #[serde(default)]
            architectures: Vec<String>,
        }

        struct VariantVisitor;

        impl<'de> Visitor<'de> for VariantVisitor {
            type Value = Variant;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a variant name or a variant object")
            }

            fn visit_str<E: de::Error>(self, name: &str) -> std::result::Result<Variant, E> {
                Ok(Variant::named(name))
            }

            fn visit_map<A>(self, map: A) -> std::result::Result<Variant, A::Error>
            where
                A: MapAccess<'de>,
            {
                let full = Full::deserialize(MapAccessDeserializer::new(map))?;
                Ok(Variant {
                    name: full.name,
                    versions: full.versions,
                    architectures: full.architectures,
                    latest: None,
                })
            }
        }

        deserializer.deserialize_any(VariantVisitor)
    }
}

impl VersionGroup {
    /// Give variants without explicit versions the group's versions and
    /// `latest`; the others compute their own.
    fn propagate(&mut self, latest: Option<&str>, selection: Selection) {
        for variant in &mut self.variants {
            if variant.versions.is_empty() {
                variant.versions = self.versions.clone();
                variant.latest = latest.map(str::to_string);
            } else {
                variant.latest = selection.latest(&variant.versions).map(Version::to_string);
            }
        }
    }
}

/// Hierarchical manifest with `major-versions`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageManifest {
    pub name: String,
    #[serde(default)]
    pub maintainers: Vec<String>,
    #[serde(rename = "major-versions", default)]
    pub major_versions: Vec<VersionGroup>,
    #[serde(skip)]
    pub base_dir: PathBuf,
    #[serde(skip)]
    pub latest: Option<String>,
}

impl ImageManifest {
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut manifest = Self::from_json(&content)?;
        manifest.base_dir = base_dir_of(path);
        Ok(manifest)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let mut manifest: ImageManifest = serde_json::from_str(content)?;
        if manifest.major_versions.is_empty() {
            return Err(DockerlibError::Validation(format!(
                "manifest for {:?} must have at least one major version",
                manifest.name
            )));
        }

        let all = manifest.major_versions.iter().flat_map(|g| g.versions.iter());
        manifest.latest = Selection::LessThan.latest(all).map(Version::to_string);
        debug!(image = %manifest.name, latest = ?manifest.latest, "loaded manifest");

        let latest = manifest.latest.clone();
        for group in &mut manifest.major_versions {
            group.propagate(latest.as_deref(), Selection::LessThan);
        }
        Ok(manifest)
    }
}

/// Flat manifest with a single top-level version group.
#[derive(Debug, Clone, Deserialize)]
pub struct FlatManifest {
    pub name: String,
    #[serde(default)]
    pub maintainers: Vec<String>,
    #[serde(flatten)]
    pub group: VersionGroup,
    #[serde(skip)]
    pub base_dir: PathBuf,
    #[serde(skip)]
    pub latest: Option<String>,
}

impl FlatManifest {
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut manifest = Self::from_json(&content)?;
        manifest.base_dir = base_dir_of(path);
        Ok(manifest)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let mut manifest: FlatManifest = serde_json::from_str(content)?;
        manifest.latest = Selection::GreaterThan
            .latest(&manifest.group.versions)
            .map(Version::to_string);
        debug!(image = %manifest.name, latest = ?manifest.latest, "loaded flat manifest");

        let latest = manifest.latest.clone();
        manifest.group.propagate(latest.as_deref(), Selection::GreaterThan);
        Ok(manifest)
    }
}

fn base_dir_of(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HIERARCHICAL: &str = r#"{
        "name": "influxdb",
        "maintainers": ["Test Maintainer"],
        "major-versions": [
            {
                "versions": ["1.7", "1.8"],
                "architectures": ["amd64"],
                "variants": [
                    { "name": "alpine" },
                    { "name": "meta", "versions": ["1.7"] }
                ]
            },
            { "versions": [] },
            { "versions": ["2.0"], "variants": [{ "name": "alpine" }] }
        ]
    }"#;

    #[test]
    fn test_latest_across_groups() {
        let m = ImageManifest::from_json(HIERARCHICAL).unwrap();
        assert_eq!(m.latest.as_deref(), Some("2.0"));
    }

    #[test]
    fn test_variant_inherits_group_versions() {
        let m = ImageManifest::from_json(HIERARCHICAL).unwrap();
        let alpine = &m.major_versions[0].variants[0];
        assert_eq!(alpine.versions, m.major_versions[0].versions);
        assert_eq!(alpine.latest.as_deref(), Some("2.0"));
    }

    #[test]
    fn test_variant_with_own_versions_has_own_latest() {
        let m = ImageManifest::from_json(HIERARCHICAL).unwrap();
        let meta = &m.major_versions[0].variants[1];
        assert_eq!(meta.versions.len(), 1);
        assert_eq!(meta.latest.as_deref(), Some("1.7"));
    }

    #[test]
    fn test_zero_groups_rejected() {
        let err = ImageManifest::from_json(r#"{"name": "x", "major-versions": []}"#).unwrap_err();
        assert!(matches!(err, DockerlibError::Validation(_)));
        let err = ImageManifest::from_json(r#"{"name": "x"}"#).unwrap_err();
        assert!(matches!(err, DockerlibError::Validation(_)));
    }

    #[test]
    fn test_malformed_version_is_decode_error() {
        let err =
            ImageManifest::from_json(r#"{"name": "x", "major-versions": [{"versions": ["1.x"]}]}"#)
                .unwrap_err();
        assert!(matches!(err, DockerlibError::Decode(_)));
    }

    #[test]
    fn test_malformed_variant_version_names_the_version() {
        let err = ImageManifest::from_json(
            r#"{"name": "x", "major-versions": [{
                "versions": ["1.7"],
                "variants": [{"name": "alpine", "versions": ["1.x"]}]
            }]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DockerlibError::Decode(_)));
        assert!(err.to_string().contains("1.x"), "{}", err);

        let err = FlatManifest::from_json(r#"{"name": "x", "versions": ["1.7"], "variants": [7]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("variant name or a variant object"), "{}", err);
    }

    #[test]
    fn test_flat_manifest() {
        let m = FlatManifest::from_json(
            r#"{"name": "telegraf", "versions": ["1.9", "1.10"],
                "architectures": ["amd64"], "variants": ["alpine"]}"#,
        )
        .unwrap();
        assert_eq!(m.latest.as_deref(), Some("1.10"));
        assert_eq!(m.group.variants[0].name, "alpine");
        assert_eq!(m.group.variants[0].versions.len(), 2);
        assert_eq!(m.group.variants[0].latest.as_deref(), Some("1.10"));
    }

    #[test]
    fn test_flat_without_versions_has_no_latest() {
        let m = FlatManifest::from_json(r#"{"name": "empty"}"#).unwrap();
        assert!(m.latest.is_none());
    }

    #[test]
    fn test_read_sets_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let image_dir = dir.path().join("influxdb");
        std::fs::create_dir(&image_dir).unwrap();
        let path = image_dir.join("manifest.json");
        std::fs::write(&path, HIERARCHICAL).unwrap();

        let m = ImageManifest::read(&path).unwrap();
        assert_eq!(m.base_dir, image_dir);
    }

    #[test]
    fn test_tag_name() {
        assert_eq!(Variant::named("data/alpine").tag_name(), "data-alpine");
    }
}
