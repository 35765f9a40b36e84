//! Host list persistence.
//!
//! The file holds one host URL per line. It is rewritten in full, sorted,
//! after every registry mutation and read once at startup.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::registry::host::Host;

/// Newline-delimited host file.
#[derive(Debug, Clone)]
pub struct HostStore {
    path: PathBuf,
}

impl HostStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the host list. A missing file is an empty list.
    ///
    /// Blank lines are skipped; lines that are not valid hosts are logged and skipped.
    pub fn load(&self) -> std::io::Result<Vec<Host>> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "No hosts file, starting empty");
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let mut hosts = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match Host::parse(line) {
                Ok(host) => hosts.push(host),
                Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "Skipping invalid host line"),
            }
        }

        tracing::info!(path = %self.path.display(), count = hosts.len(), "Loaded hosts file");
        Ok(hosts)
    }

    /// Rewrite the file with the given hosts, sorted.
    pub fn save<'a>(&self, hosts: impl IntoIterator<Item = &'a Host>) -> std::io::Result<()> {
        let mut sorted: Vec<&Host> = hosts.into_iter().collect();
        sorted.sort();

        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        for host in &sorted {
            writeln!(writer, "{}", host)?;
        }
        writer.flush()?;

        tracing::debug!(path = %self.path.display(), count = sorted.len(), "Saved hosts file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HostStore::new(dir.path().join("hosts.txt"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_sorts_and_load_skips_junk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts.txt");
        let store = HostStore::new(&path);

        let b = Host::parse("https://b.example").unwrap();
        let a = Host::parse("http://a.example").unwrap();
        store.save([&b, &a]).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "http://a.example\nhttps://b.example\n"
        );

        fs::write(&path, "  http://a.example  \n\nnot a url\nftp://c\nhttps://b.example\n").unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, vec![a, b]);
    }
}
