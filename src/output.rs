//! Descriptor output - digest comparison and atomic replacement.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Result;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Replace `path` with `content` unless it already holds exactly that.
///
/// The new content goes to a uniquely named temporary file in the same
/// directory and is renamed over `path`, so readers never observe a
/// partial descriptor. Returns whether the file changed.
pub fn write_if_changed(path: &Path, content: &[u8]) -> Result<bool> {
    let digest = sha256_hex(content);
    match fs::read(path) {
        Ok(existing) if sha256_hex(&existing) == digest => {
            debug!(path = %path.display(), %digest, "descriptor unchanged");
            return Ok(false);
        }
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)?;
    }
    let file_name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    let tmp = dir.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    if let Err(e) = fs::write(&tmp, content).and_then(|_| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    info!(path = %path.display(), %digest, "descriptor written");
    Ok(true)
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_write_then_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library").join("influxdb");

        assert!(write_if_changed(&path, b"Maintainers: A\n").unwrap());
        assert!(!write_if_changed(&path, b"Maintainers: A\n").unwrap());
        assert!(write_if_changed(&path, b"Maintainers: B\n").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "Maintainers: B\n");
    }

    #[test]
    fn test_no_temporary_files_left() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telegraf");
        write_if_changed(&path, b"x\n").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["telegraf"]);
    }
}
