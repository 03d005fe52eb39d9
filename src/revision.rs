//! Revision tracking for incremental descriptor updates.
//!
//! A directory keeps the revision recorded in the previous descriptor
//! until the diff probe reports that its tree actually changed.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;
use tracing::{debug, info};

use crate::compiler::{DIRECTORY, GIT_COMMIT};
use crate::error::Result;
use crate::git::RevisionOracle;
use crate::header::MAINTAINERS;

/// What `refresh` did for a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Directory had no recorded revision.
    Recorded,
    /// Recorded revision already current.
    Current,
    /// Probe found no change; old revision kept.
    Unchanged,
    /// Probe found a change; revision moved forward.
    Updated,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionMap {
    revisions: BTreeMap<String, String>,
    maintainers: Vec<String>,
}

impl RevisionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recover directory revisions and maintainers from an existing
    /// descriptor. Blocks without both `Directory` and `GitCommit` are
    /// ignored.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut map = Self::new();
        let mut block = Block::default();
        let mut last_key: Option<String> = None;

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                block.flush_into(&mut map);
                last_key = None;
                continue;
            }

            // Continuation lines only occur for multiple maintainers.
            if line.starts_with(char::is_whitespace) {
                if last_key.as_deref() == Some(MAINTAINERS) {
                    map.push_maintainers(&line);
                }
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                debug!(%line, "skipping unrecognized descriptor line");
                continue;
            };
            let value = value.trim();
            match key {
                MAINTAINERS => map.push_maintainers(value),
                DIRECTORY => block.directory = Some(value.to_string()),
                GIT_COMMIT => block.commit = Some(value.to_string()),
                _ => {}
            }
            last_key = Some(key.to_string());
        }
        block.flush_into(&mut map);
        Ok(map)
    }

    /// Parse the descriptor at `path`; a missing file yields an empty map.
    pub fn load(path: &Path) -> Result<Self> {
        match File::open(path) {
            Ok(file) => Self::parse(BufReader::new(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no previous descriptor");
                Ok(Self::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn push_maintainers(&mut self, value: &str) {
        self.maintainers.extend(
            value
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
        );
    }

    pub fn maintainers(&self) -> &[String] {
        &self.maintainers
    }

    pub fn get(&self, directory: &str) -> Option<&str> {
        self.revisions.get(directory).map(String::as_str)
    }

    pub fn insert(&mut self, directory: impl Into<String>, revision: impl Into<String>) {
        self.revisions.insert(directory.into(), revision.into());
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    /// Bring `directory`'s recorded revision up to `current` if its tree
    /// changed since the recorded one. A probe failure is returned as is.
    pub fn refresh(
        &mut self,
        directory: &Path,
        current: &str,
        probe: &dyn RevisionOracle,
    ) -> Result<RefreshOutcome> {
        let key = directory.to_string_lossy().into_owned();
        let outcome = match self.revisions.get(&key) {
            None => RefreshOutcome::Recorded,
            Some(recorded) if recorded == current => RefreshOutcome::Current,
            Some(recorded) => {
                if probe.tree_differs(recorded, current, directory)? {
                    RefreshOutcome::Updated
                } else {
                    RefreshOutcome::Unchanged
                }
            }
        };

        match outcome {
            RefreshOutcome::Recorded | RefreshOutcome::Updated => {
                info!(directory = %key, revision = current, ?outcome, "recording revision");
                self.revisions.insert(key, current.to_string());
            }
            RefreshOutcome::Current | RefreshOutcome::Unchanged => {
                debug!(directory = %key, ?outcome, "keeping recorded revision");
            }
        }
        Ok(outcome)
    }
}

#[derive(Default)]
struct Block {
    directory: Option<String>,
    commit: Option<String>,
}

impl Block {
    fn flush_into(&mut self, map: &mut RevisionMap) {
        if let (Some(directory), Some(commit)) = (self.directory.take(), self.commit.take()) {
            map.revisions.insert(directory, commit);
        }
    }
}
