//! Environment-file store.
//!
//! Persists configuration as one `KEY=VALUE` line per entry. The file
//! is the durable ledger shared between first-run setup and the
//! containers (compose injects it as process environment). Every
//! mutation is written back immediately with an atomic tmp + rename.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Ordered `KEY=VALUE` store backed by a plain-text file.
///
/// Keys are unique; an upsert of an existing key replaces its value in
/// place so the file keeps first-definition order across rewrites. A
/// missing backing file is treated as an empty store.
#[derive(Debug)]
pub struct EnvFile {
    path: PathBuf,
    entries: Vec<(String, String)>,
}

impl EnvFile {
    /// Load the store from disk. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        let mut entries: Vec<(String, String)> = Vec::new();
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            for line in data.lines() {
                let Some((key, value)) = line.split_once('=') else {
                    continue;
                };
                let key = key.trim();
                if key.is_empty() {
                    continue;
                }
                match entries.iter_mut().find(|(k, _)| k == key) {
                    // Duplicate line: last value wins, position of the
                    // first occurrence is kept.
                    Some(entry) => entry.1 = value.to_string(),
                    None => entries.push((key.to_string(), value.to_string())),
                }
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Upsert a key and persist immediately.
    ///
    /// An existing key keeps its position in the file; a new key is
    /// appended as the last line.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
        self.save()
    }

    /// True when the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in file order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Write the store to disk atomically (write to .tmp, then rename).
    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut data = String::new();
        for (key, value) in &self.entries {
            data.push_str(key);
            data.push('=');
            data.push_str(value);
            data.push('\n');
        }
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, &data)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
