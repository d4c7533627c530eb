//! Multi-file edit session over an SSH config tree.
//!
//! A session owns one [`EditBuffer`] per opened file and a pointer to the
//! active one. All operations take `&mut self`, so there is never more than
//! one save in flight. Closing is all-or-nothing: when anything is dirty the
//! caller gets a [`PendingClose`] and must confirm or cancel.

mod buffer;

pub use buffer::EditBuffer;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::backend::ConfigBackend;
use crate::error::{DiscoveryWarning, SessionError};
use crate::models::{ConfigFile, SshHost};
use crate::ssh_config::parser::count_hosts;
use crate::ssh_config::resolver::absolute;
use crate::ssh_config::{classify, ConfigTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Reloaded,
    /// The buffer had unsaved edits and was left alone.
    KeptDirty,
}

#[derive(Debug)]
pub enum CloseOutcome<B: ConfigBackend> {
    Closed,
    ConfirmationRequired(PendingClose<B>),
}

/// A close request waiting on the caller because some buffers are dirty.
#[derive(Debug)]
pub struct PendingClose<B: ConfigBackend> {
    session: EditSession<B>,
    dirty: Vec<PathBuf>,
}

impl<B: ConfigBackend> PendingClose<B> {
    pub fn dirty_files(&self) -> &[PathBuf] {
        &self.dirty
    }

    /// Read-only view of the session waiting to be closed.
    pub fn session(&self) -> &EditSession<B> {
        &self.session
    }

    /// Discard every buffer, saved or not.
    pub fn confirm(self) {
        tracing::info!(
            "Edit session closed, discarding unsaved changes in {} files",
            self.dirty.len()
        );
    }

    /// Keep editing; the session comes back untouched.
    pub fn cancel(self) -> EditSession<B> {
        tracing::debug!("Close cancelled");
        self.session
    }
}

#[derive(Debug)]
pub struct EditSession<B: ConfigBackend> {
    backend: B,
    files: Vec<ConfigFile>,
    discovery_warnings: Vec<DiscoveryWarning>,
    hosts: Vec<SshHost>,
    buffers: BTreeMap<PathBuf, EditBuffer>,
    active: PathBuf,
}

impl<B: ConfigBackend> EditSession<B> {
    /// Discover the tree and load the root file as the active buffer.
    pub fn open(backend: B) -> Result<Self, SessionError> {
        let tree = backend.list_files()?;
        let root = tree
            .entries
            .first()
            .map(|e| e.file.clone())
            .ok_or_else(|| SessionError::UnknownBuffer(backend.root().to_path_buf()))?;
        let text = backend.read(Some(&root.path))?;

        let mut session = Self {
            files: Vec::new(),
            discovery_warnings: Vec::new(),
            hosts: Vec::new(),
            buffers: BTreeMap::new(),
            active: root.path.clone(),
            backend,
        };
        session.apply_tree(&tree);
        session
            .buffers
            .insert(root.path.clone(), EditBuffer::new(root, text));

        tracing::info!(
            "Edit session opened with {} config files",
            session.files.len()
        );
        Ok(session)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn files(&self) -> &[ConfigFile] {
        &self.files
    }

    pub fn discovery_warnings(&self) -> &[DiscoveryWarning] {
        &self.discovery_warnings
    }

    pub fn hosts(&self) -> &[SshHost] {
        &self.hosts
    }

    pub fn active_path(&self) -> &Path {
        &self.active
    }

    pub fn active_buffer(&self) -> Option<&EditBuffer> {
        self.buffers.get(&self.active)
    }

    pub fn buffer(&self, path: &Path) -> Option<&EditBuffer> {
        self.buffers.get(&absolute(path))
    }

    pub fn buffers(&self) -> impl Iterator<Item = &EditBuffer> {
        self.buffers.values()
    }

    /// True when any buffer has unsaved edits.
    pub fn is_dirty(&self) -> bool {
        self.buffers.values().any(EditBuffer::is_dirty)
    }

    pub fn dirty_paths(&self) -> Vec<PathBuf> {
        self.buffers
            .values()
            .filter(|b| b.is_dirty())
            .map(|b| b.path().to_path_buf())
            .collect()
    }

    /// Make `path` active, loading it on first access. An already open
    /// buffer is never re-read, so pending edits survive switching.
    pub fn select_file(&mut self, path: &Path) -> Result<(), SessionError> {
        let path = absolute(path);
        if !self.buffers.contains_key(&path) {
            let text = self.backend.read(Some(&path))?;
            let file = self.file_record(&path, &text);
            tracing::debug!("Loaded {:?} into a new buffer", path);
            self.buffers.insert(path.clone(), EditBuffer::new(file, text));
        }
        self.active = path;
        Ok(())
    }

    pub fn update_content(
        &mut self,
        path: &Path,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        let path = absolute(path);
        let buffer = self
            .buffers
            .get_mut(&path)
            .ok_or(SessionError::UnknownBuffer(path))?;
        buffer.set_content(text.into());
        Ok(())
    }

    /// Warnings for the buffer's current text (active buffer when `None`).
    pub fn validate(&self, path: Option<&Path>) -> Result<Vec<String>, SessionError> {
        let buffer = self.resolve_buffer(path)?;
        let warnings = self
            .backend
            .validate(buffer.content(), Some(buffer.path()))?;
        Ok(warnings)
    }

    /// Persist a dirty buffer (active buffer when `None`).
    ///
    /// Warnings never block the save. On error the buffer is left exactly as
    /// it was. After a successful save the tree is rediscovered so the file
    /// and host lists match the disk.
    pub fn save(&mut self, path: Option<&Path>) -> Result<Vec<String>, SessionError> {
        let buffer = self.resolve_buffer(path)?;
        let path = buffer.path().to_path_buf();
        if !buffer.is_dirty() {
            return Err(SessionError::NotDirty(path));
        }
        let text = buffer.content().to_string();

        let warnings = self.backend.save(&text, Some(&path)).map_err(|e| {
            tracing::error!("Saving {:?} failed: {}", path, e);
            SessionError::from(e)
        })?;

        if let Some(buffer) = self.buffers.get_mut(&path) {
            buffer.mark_saved(text);
        }

        if let Err(e) = self.refresh() {
            tracing::warn!("Saved {:?} but rediscovery failed: {}", path, e);
        }

        Ok(warnings)
    }

    /// Re-read a buffer from disk unless it has unsaved edits.
    pub fn reload(&mut self, path: Option<&Path>) -> Result<ReloadOutcome, SessionError> {
        let buffer = self.resolve_buffer(path)?;
        let path = buffer.path().to_path_buf();
        if buffer.is_dirty() {
            tracing::info!("Not reloading {:?}: it has unsaved changes", path);
            return Ok(ReloadOutcome::KeptDirty);
        }

        let text = self.backend.read(Some(&path))?;
        if let Some(buffer) = self.buffers.get_mut(&path) {
            buffer.reset(text);
        }
        Ok(ReloadOutcome::Reloaded)
    }

    /// Rediscover files and hosts. Buffers are untouched.
    pub fn refresh(&mut self) -> Result<(), SessionError> {
        let tree = self.backend.list_files()?;
        self.apply_tree(&tree);
        Ok(())
    }

    /// Tear down immediately when clean, otherwise ask for confirmation.
    pub fn close(self) -> CloseOutcome<B> {
        let dirty = self.dirty_paths();
        if dirty.is_empty() {
            tracing::info!("Edit session closed");
            CloseOutcome::Closed
        } else {
            CloseOutcome::ConfirmationRequired(PendingClose {
                session: self,
                dirty,
            })
        }
    }

    fn resolve_buffer(&self, path: Option<&Path>) -> Result<&EditBuffer, SessionError> {
        let path = path.map(absolute).unwrap_or_else(|| self.active.clone());
        self.buffers
            .get(&path)
            .ok_or(SessionError::UnknownBuffer(path))
    }

    fn apply_tree(&mut self, tree: &ConfigTree) {
        self.files = tree.files();
        self.discovery_warnings = tree.warnings.clone();
        self.hosts = classify(tree);

        for buffer in self.buffers.values_mut() {
            if let Some(file) = self.files.iter().find(|f| f.path == buffer.path()) {
                buffer.set_file(file.clone());
            }
        }
    }

    fn file_record(&self, path: &Path, text: &str) -> ConfigFile {
        self.files
            .iter()
            .find(|f| f.path == path)
            .cloned()
            .unwrap_or_else(|| ConfigFile {
                name: path
                    .strip_prefix(crate::ssh_config::ssh_dir_for(self.backend.root()))
                    .unwrap_or(path)
                    .to_string_lossy()
                    .to_string(),
                path: path.to_path_buf(),
                is_main: false,
                host_count: count_hosts(text),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalBackend;
    use std::fs;
    use tempfile::TempDir;

    fn open_tree() -> (TempDir, EditSession<LocalBackend>) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config"), "Include extra\nHost a\n").unwrap();
        fs::write(dir.path().join("extra"), "Host b\n").unwrap();
        let session = EditSession::open(LocalBackend::new(dir.path().join("config"))).unwrap();
        (dir, session)
    }

    #[test]
    fn test_open_loads_root_as_active() {
        let (dir, session) = open_tree();
        assert_eq!(session.active_path(), dir.path().join("config"));
        assert_eq!(session.files().len(), 2);
        assert_eq!(session.hosts().len(), 2);
        assert!(!session.is_dirty());
        assert_eq!(session.buffers().count(), 1);
    }

    #[test]
    fn test_update_unknown_buffer() {
        let (dir, mut session) = open_tree();
        let err = session
            .update_content(&dir.path().join("extra"), "x")
            .unwrap_err();
        assert!(matches!(err, SessionError::UnknownBuffer(_)));
    }

    #[test]
    fn test_save_clean_buffer_is_rejected() {
        let (_dir, mut session) = open_tree();
        assert!(matches!(
            session.save(None).unwrap_err(),
            SessionError::NotDirty(_)
        ));
    }

    #[test]
    fn test_reload_keeps_dirty_buffer() {
        let (dir, mut session) = open_tree();
        let root = dir.path().join("config");
        session.update_content(&root, "Host edited\n").unwrap();
        fs::write(&root, "Host external\n").unwrap();

        assert_eq!(session.reload(None).unwrap(), ReloadOutcome::KeptDirty);
        assert_eq!(session.active_buffer().unwrap().content(), "Host edited\n");
    }

    #[test]
    fn test_reload_clean_buffer_reads_disk() {
        let (dir, mut session) = open_tree();
        let root = dir.path().join("config");
        fs::write(&root, "Host external\n").unwrap();

        assert_eq!(session.reload(None).unwrap(), ReloadOutcome::Reloaded);
        let buf = session.active_buffer().unwrap();
        assert_eq!(buf.content(), "Host external\n");
        assert!(!buf.is_dirty());
    }

    #[test]
    fn test_close_clean_session() {
        let (_dir, session) = open_tree();
        assert!(matches!(session.close(), CloseOutcome::Closed));
    }

    #[test]
    fn test_close_dirty_requires_confirmation_and_cancel_restores() {
        let (dir, mut session) = open_tree();
        let root = dir.path().join("config");
        session.update_content(&root, "Host changed\n").unwrap();

        let pending = match session.close() {
            CloseOutcome::ConfirmationRequired(p) => p,
            CloseOutcome::Closed => panic!("dirty session closed without confirmation"),
        };
        assert_eq!(pending.dirty_files(), &[root.clone()]);

        let session = pending.cancel();
        assert_eq!(session.buffer(&root).unwrap().content(), "Host changed\n");
        assert!(session.is_dirty());
    }

    #[test]
    fn test_save_refreshes_hosts_and_file_counts() {
        let (dir, mut session) = open_tree();
        let extra = dir.path().join("extra");
        session.select_file(&extra).unwrap();
        session
            .update_content(&extra, "Host b\nHost c\n  HostName github.com\n")
            .unwrap();

        session.save(None).unwrap();

        assert_eq!(session.hosts().len(), 3);
        assert_eq!(session.buffer(&extra).unwrap().file().host_count, 2);
        assert_eq!(session.files()[1].host_count, 2);
    }
}
