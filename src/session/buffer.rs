use std::path::Path;

use crate::models::ConfigFile;

/// In-memory copy of one config file.
///
/// `original` is the text last known to be on disk. Whether the buffer is
/// dirty is always derived from the two texts and never stored.
#[derive(Debug, Clone)]
pub struct EditBuffer {
    file: ConfigFile,
    current: String,
    original: String,
}

impl EditBuffer {
    pub fn new(file: ConfigFile, text: String) -> Self {
        Self {
            file,
            current: text.clone(),
            original: text,
        }
    }

    pub fn file(&self) -> &ConfigFile {
        &self.file
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }

    pub fn content(&self) -> &str {
        &self.current
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn is_dirty(&self) -> bool {
        self.current != self.original
    }

    pub fn line_count(&self) -> usize {
        self.current.lines().count()
    }

    pub(crate) fn set_content(&mut self, text: String) {
        self.current = text;
    }

    /// Record `text` as persisted.
    pub(crate) fn mark_saved(&mut self, text: String) {
        self.original = text;
    }

    /// Replace both texts with a fresh read from disk.
    pub(crate) fn reset(&mut self, text: String) {
        self.current = text.clone();
        self.original = text;
    }

    pub(crate) fn set_file(&mut self, file: ConfigFile) {
        self.file = file;
    }
}
