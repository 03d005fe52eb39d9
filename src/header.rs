//! Ordered multi-value headers in the official-images library format.

use std::collections::HashMap;
use std::io::{self, Write};

pub const MAINTAINERS: &str = "Maintainers";

/// Continuation between maintainers, aligned under `"Maintainers: "`.
const MAINTAINERS_SEPARATOR: &str = ",\n             ";

/// Key/value-list pairs kept in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` to `key`, creating the key at the end if absent.
    pub fn add(&mut self, key: &str, value: impl Into<String>) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1.push(value.into()),
            None => self.set(key, value),
        }
    }

    /// Replace every value of `key`. A new key goes at the end.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let values = vec![value.into()];
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 = values,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), values));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.index.get(key).map(|&i| self.entries[i].1.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for (key, values) in &self.entries {
            let separator = if key == MAINTAINERS {
                MAINTAINERS_SEPARATOR
            } else {
                ", "
            };
            writeln!(w, "{}: {}", key, values.join(separator))?;
        }
        Ok(())
    }
}

/// Write the prefix header followed by each block, every block preceded
/// by one blank line.
pub fn write_descriptor<W: Write>(
    w: &mut W,
    prefix: Option<&Header>,
    blocks: &[Header],
) -> io::Result<()> {
    if let Some(prefix) = prefix {
        prefix.write(w)?;
    }
    for block in blocks {
        writeln!(w)?;
        block.write(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(h: &Header) -> String {
        let mut buf = Vec::new();
        h.write(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_add_preserves_key_position() {
        let mut h = Header::new();
        h.add("Tags", "1.7");
        h.add("Directory", "influxdb/1.7");
        h.add("Tags", "1.7.10");
        assert_eq!(render(&h), "Tags: 1.7, 1.7.10\nDirectory: influxdb/1.7\n");
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let mut h = Header::new();
        h.add("GitCommit", "abc");
        h.add("Directory", "x");
        h.add("GitCommit", "def");
        h.set("GitCommit", "123");
        assert_eq!(h.get("GitCommit"), Some(&["123".to_string()][..]));
        assert_eq!(h.keys().collect::<Vec<_>>(), vec!["GitCommit", "Directory"]);
    }

    #[test]
    fn test_maintainers_continuation() {
        let mut h = Header::new();
        h.add(MAINTAINERS, "A <a@example.com> (@a)");
        h.add(MAINTAINERS, "B <b@example.com> (@b)");
        h.add("GitRepo", "git://example.com/repo");
        assert_eq!(
            render(&h),
            "Maintainers: A <a@example.com> (@a),\n             B <b@example.com> (@b)\n\
             GitRepo: git://example.com/repo\n"
        );
    }

    #[test]
    fn test_write_descriptor_separates_blocks() {
        let mut prefix = Header::new();
        prefix.add(MAINTAINERS, "Test Maintainer");
        let mut a = Header::new();
        a.add("Directory", "a");
        let mut b = Header::new();
        b.add("Directory", "b");

        let mut buf = Vec::new();
        write_descriptor(&mut buf, Some(&prefix), &[a, b]).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Maintainers: Test Maintainer\n\nDirectory: a\n\nDirectory: b\n"
        );
    }
}
