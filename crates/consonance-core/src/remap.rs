use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Persisted rule translating a path recorded under one corpus root
/// into the equivalent path under another.
///
/// A cache built while the corpus lived under `D:\Music\library` can be
/// reused after the corpus moves to `/mnt/media/library` by mapping the
/// root folder name `library` to the new location. At most one mapping
/// is active at a time; it is loaded at startup and mutated only by
/// explicit user action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMapping {
    pub root_folder_name: String,
    pub new_root_path: String,
}

impl PathMapping {
    pub fn new(root_folder_name: impl Into<String>, new_root_path: impl Into<String>) -> Self {
        Self {
            root_folder_name: root_folder_name.into(),
            new_root_path: new_root_path.into(),
        }
    }

    /// `true` when both fields are filled in and remapping can apply.
    pub fn is_complete(&self) -> bool {
        !self.root_folder_name.is_empty() && !self.new_root_path.is_empty()
    }
}

#[cfg(windows)]
const SEP: char = '\\';
#[cfg(not(windows))]
const SEP: char = '/';

/// Rewrite path separators to the current platform's convention.
pub fn normalize_separators(path: &str) -> String {
    if cfg!(windows) {
        path.replace('/', "\\")
    } else {
        path.replace('\\', "/")
    }
}

/// Translate a recorded path onto a relocated corpus root.
///
/// Separators are normalized for the current platform before matching.
/// The first occurrence of the mapping's root folder name marks the
/// split point; everything after it is joined onto the new root path.
/// A path that does not contain the root folder name, or an incomplete
/// mapping, passes through unchanged: callers must be prepared to
/// receive an unmapped path.
///
/// This is a pure string transform. No filesystem check is made, so a
/// confidently remapped path can still point at nothing.
pub fn remap_path(path: &str, mapping: &PathMapping) -> String {
    if !mapping.is_complete() {
        return path.to_string();
    }

    let normalized = normalize_separators(path);
    let Some(index) = normalized.find(&mapping.root_folder_name) else {
        return path.to_string();
    };

    let tail = normalized[index + mapping.root_folder_name.len()..]
        .trim_start_matches(['/', '\\']);

    let mut remapped = normalize_separators(&mapping.new_root_path);
    if !tail.is_empty() {
        if !remapped.ends_with(SEP) {
            remapped.push(SEP);
        }
        remapped.push_str(tail);
    }
    remapped
}

/// Fixed-location durable store for the active [`PathMapping`].
#[derive(Debug)]
pub struct MappingStore {
    path: PathBuf,
}

impl MappingStore {
    /// The store at its default per-user location
    /// (`~/.config/consonance/path_mapping.json` or the platform
    /// equivalent).
    pub fn default_location() -> Self {
        let path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("consonance")
            .join("path_mapping.json");
        Self { path }
    }

    /// A store backed by an explicit file, mainly for tests.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted mapping; a missing file means none is set.
    pub fn load(&self) -> Result<Option<PathMapping>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = fs::File::open(&self.path)?;
        let mapping = serde_json::from_reader(io::BufReader::new(file))?;
        Ok(Some(mapping))
    }

    pub fn save(&self, mapping: &PathMapping) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut writer = io::BufWriter::new(fs::File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, mapping)?;
        writer.flush()?;
        Ok(())
    }
}
