//! Dotted numeric versions.
//!
//! Versions have no total order. `less_than` never treats a prefix as
//! smaller than its extension, while `greater_than` treats the longer
//! receiver as greater. The hierarchical and flat manifest paths each
//! pick one of these through [`Selection`], and they must not be merged.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{DockerlibError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Version {
    segments: Vec<u64>,
}

impl Version {
    /// Parse `1.7`, `1.7.10` or `v1.7.10`.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.strip_prefix('v').unwrap_or(s);
        let segments = trimmed
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| DockerlibError::MalformedVersion(trimmed.to_string()))?;
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    pub fn less_than(&self, other: &Version) -> bool {
        for (i, a) in self.segments.iter().enumerate() {
            let Some(b) = other.segments.get(i) else {
                return false;
            };
            if a != b {
                return a < b;
            }
        }
        false
    }

    pub fn greater_than(&self, other: &Version) -> bool {
        for (i, a) in self.segments.iter().enumerate() {
            let Some(b) = other.segments.get(i) else {
                return true;
            };
            if a != b {
                return a > b;
            }
        }
        false
    }

    /// Dotted prefixes of two or more segments, shortest first.
    ///
    /// `1.7.10` yields `1.7` and `1.7.10`. A single-segment version
    /// yields nothing.
    pub fn progressive_prefixes(&self) -> Vec<String> {
        (2..=self.segments.len())
            .map(|i| join_segments(&self.segments[..i]))
            .collect()
    }
}

fn join_segments(segments: &[u64]) -> String {
    segments
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_segments(&self.segments))
    }
}

impl FromStr for Version {
    type Err = DockerlibError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = DockerlibError;

    fn try_from(s: String) -> Result<Self> {
        Version::parse(&s)
    }
}

/// Which comparison a "latest" fold uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Replace the running latest when it is `less_than` the candidate.
    /// Used by hierarchical manifests.
    LessThan,
    /// Replace the running latest when the candidate is `greater_than` it.
    /// Used by flat manifests.
    GreaterThan,
}

impl Selection {
    pub fn latest<'a, I>(self, versions: I) -> Option<&'a Version>
    where
        I: IntoIterator<Item = &'a Version>,
    {
        let mut latest: Option<&Version> = None;
        for v in versions {
            let replace = match (latest, self) {
                (None, _) => true,
                (Some(cur), Selection::LessThan) => cur.less_than(v),
                (Some(cur), Selection::GreaterThan) => v.greater_than(cur),
            };
            if replace {
                latest = Some(v);
            }
        }
        latest
    }
}
