use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;

/// The in-memory form of a persisted cache: file path to fingerprint.
pub type FingerprintMap = BTreeMap<String, Fingerprint>;

/// A durable mapping from audio file path to fingerprint, backed by a
/// single JSON file chosen by the caller.
///
/// The file carries no staleness or schema-version marker: a moved or
/// re-encoded source file is silently compared against its old
/// fingerprint, and a cache built with a different extractor
/// configuration is incomparable in meaning, until the corpus is
/// re-indexed.
#[derive(Debug, Default)]
pub struct FingerprintCache {
    handle: Option<PathBuf>,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record which file backs this cache. Nothing is read or written.
    pub fn set_handle(&mut self, path: impl Into<PathBuf>) {
        self.handle = Some(path.into());
    }

    pub fn handle(&self) -> Option<&Path> {
        self.handle.as_deref()
    }

    /// Load the full mapping from the backing file.
    ///
    /// An unset handle or a missing file yields an empty mapping; that
    /// is defined behavior, not an error. A file that exists but cannot
    /// be read or parsed is an error.
    pub fn load(&self) -> Result<FingerprintMap> {
        let Some(path) = self.handle.as_deref() else {
            return Ok(FingerprintMap::new());
        };
        if !path.exists() {
            log::debug!("cache file {} does not exist yet", path.display());
            return Ok(FingerprintMap::new());
        }
        let file = fs::File::open(path)?;
        let map = serde_json::from_reader(io::BufReader::new(file))?;
        Ok(map)
    }

    /// Serialize the entire mapping, replacing the backing file.
    ///
    /// The write is atomic: the mapping goes to a temporary sibling
    /// first and is renamed over the handle, so a crash mid-save leaves
    /// the previous cache intact.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandleUnset`] if no handle has been set.
    pub fn save(&self, map: &FingerprintMap) -> Result<()> {
        let path = self.handle.as_deref().ok_or(Error::HandleUnset)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        let mut writer = io::BufWriter::new(fs::File::create(&tmp)?);
        serde_json::to_writer(&mut writer, map)?;
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp, path)?;
        log::debug!("saved {} fingerprints to {}", map.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_map() -> FingerprintMap {
        let mut map = FingerprintMap::new();
        map.insert(
            "/music/a.wav".to_string(),
            Fingerprint {
                mfcc: vec![1.5, -2.25, 0.125],
                chroma: vec![0.4, 0.6],
            },
        );
        map.insert(
            "/music/b.mp3".to_string(),
            Fingerprint {
                mfcc: vec![-0.5, 3.0, 9.75],
                chroma: vec![0.9, 0.1],
            },
        );
        map
    }

    #[test]
    fn load_without_handle_is_empty() {
        let cache = FingerprintCache::new();
        assert!(cache.load().unwrap().is_empty());
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut cache = FingerprintCache::new();
        cache.set_handle(dir.path().join("nope.json"));
        assert!(cache.load().unwrap().is_empty());
    }

    #[test]
    fn save_without_handle_is_an_error() {
        let cache = FingerprintCache::new();
        let result = cache.save(&sample_map());
        assert!(matches!(result, Err(Error::HandleUnset)));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut cache = FingerprintCache::new();
        cache.set_handle(dir.path().join("fingerprints.json"));

        let map = sample_map();
        cache.save(&map).unwrap();
        assert_eq!(cache.load().unwrap(), map);
    }

    #[test]
    fn save_overwrites_previous_contents() {
        let dir = TempDir::new().unwrap();
        let mut cache = FingerprintCache::new();
        cache.set_handle(dir.path().join("fingerprints.json"));

        cache.save(&sample_map()).unwrap();
        let smaller = FingerprintMap::new();
        cache.save(&smaller).unwrap();
        assert!(cache.load().unwrap().is_empty());
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let mut cache = FingerprintCache::new();
        cache.set_handle(dir.path().join("deep").join("fingerprints.json"));
        cache.save(&sample_map()).unwrap();
        assert_eq!(cache.load().unwrap(), sample_map());
    }
}
