//! The operations an editing surface drives: discovery, read, validate,
//! save and host listing.
//!
//! [`EditSession`](crate::session::EditSession) talks to a [`ConfigBackend`]
//! rather than the filesystem so tests can substitute failing backends.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DiscoveryError, ReadError, SaveError, ValidationFailure};
use crate::models::SshHost;
use crate::persist;
use crate::ssh_config::resolver::absolute;
use crate::ssh_config::{self, classify, resolve, ConfigTree};
use crate::ssh_service::{self, TerminalProgram};

pub trait ConfigBackend {
    /// Root config file of the tree.
    fn root(&self) -> &Path;

    /// Resolve the tree. The root is always the first entry.
    fn list_files(&self) -> Result<ConfigTree, DiscoveryError>;

    /// Raw body of `path`, or of the root when `None`.
    fn read(&self, path: Option<&Path>) -> Result<String, ReadError>;

    /// Warnings for `content` as the body of `path` (root when `None`).
    /// Never writes anything.
    fn validate(&self, content: &str, path: Option<&Path>)
        -> Result<Vec<String>, ValidationFailure>;

    /// Validate, back up the current file and replace it with `content`.
    fn save(&self, content: &str, path: Option<&Path>) -> Result<Vec<String>, SaveError>;

    /// Hosts of the tree as it is on disk now.
    fn list_hosts(&self) -> Result<Vec<SshHost>, DiscoveryError> {
        Ok(classify(&self.list_files()?))
    }

    /// Force a fresh discovery and classification pass.
    fn refresh(&self) -> Result<Vec<SshHost>, DiscoveryError> {
        tracing::info!("Refreshing SSH config from {:?}", self.root());
        self.list_hosts()
    }

    /// Start `ssh <host>` in the chosen terminal program.
    fn open_terminal(&self, host: &str, program: TerminalProgram) -> anyhow::Result<()> {
        ssh_service::open_terminal(host, program)
    }
}

/// Filesystem backend. Only the root itself and files whose real location is
/// under the root's directory can be read or written.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
    ssh_dir: PathBuf,
}

impl LocalBackend {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = absolute(root.as_ref());
        let ssh_dir = ssh_config::ssh_dir_for(&root);
        Self { root, ssh_dir }
    }

    pub fn ssh_dir(&self) -> &Path {
        &self.ssh_dir
    }

    fn target(&self, path: Option<&Path>) -> PathBuf {
        path.map(absolute).unwrap_or_else(|| self.root.clone())
    }

    fn is_permitted(&self, path: &Path) -> bool {
        // The configured root is trusted wherever its link points
        if path == self.root {
            return true;
        }
        let Ok(ssh_dir) = fs::canonicalize(&self.ssh_dir) else {
            return false;
        };
        match canonical_target(path) {
            Some(real) => real.starts_with(&ssh_dir),
            None => false,
        }
    }
}

/// Real location of `path`. A file that does not exist yet resolves
/// through its parent directory; a dangling link resolves to nothing.
fn canonical_target(path: &Path) -> Option<PathBuf> {
    if let Ok(real) = fs::canonicalize(path) {
        return Some(real);
    }
    if fs::symlink_metadata(path).is_ok() {
        return None;
    }
    let name = path.file_name()?;
    let parent = fs::canonicalize(path.parent()?).ok()?;
    Some(parent.join(name))
}

impl ConfigBackend for LocalBackend {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_files(&self) -> Result<ConfigTree, DiscoveryError> {
        resolve(&self.root)
    }

    fn read(&self, path: Option<&Path>) -> Result<String, ReadError> {
        let path = self.target(path);
        if !self.is_permitted(&path) {
            return Err(ReadError::OutsideSshDir {
                path,
                ssh_dir: self.ssh_dir.clone(),
            });
        }

        let bytes = fs::read(&path).map_err(|source| ReadError::Unreadable {
            path: path.clone(),
            source,
        })?;
        String::from_utf8(bytes).map_err(|_| ReadError::Undecodable(path))
    }

    fn validate(
        &self,
        content: &str,
        path: Option<&Path>,
    ) -> Result<Vec<String>, ValidationFailure> {
        let target = self.target(path);
        let tree = resolve(&self.root)?;
        let known = tree.declared_names_excluding(&target);
        Ok(ssh_config::validate(content, &known))
    }

    fn save(&self, content: &str, path: Option<&Path>) -> Result<Vec<String>, SaveError> {
        let target = self.target(path);
        if !self.is_permitted(&target) {
            return Err(SaveError::OutsideSshDir {
                path: target,
                ssh_dir: self.ssh_dir.clone(),
            });
        }

        let warnings = self.validate(content, Some(&target))?;
        persist::write_with_backup(&target, content)?;
        if !warnings.is_empty() {
            tracing::info!("Saved {:?} with {} warnings", target, warnings.len());
        }
        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, LocalBackend) {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config"),
            "Include conf.d/*\nHost web\n  HostName web.example.com\n",
        )
        .unwrap();
        fs::create_dir(dir.path().join("conf.d")).unwrap();
        fs::write(
            dir.path().join("conf.d/work"),
            "Host bastion\n  HostName 203.0.113.9\nHost db\n  HostName 10.0.0.7\n  ProxyJump bastion\n",
        )
        .unwrap();
        let backend = LocalBackend::new(dir.path().join("config"));
        (dir, backend)
    }

    #[test]
    fn test_read_defaults_to_root() {
        let (_dir, backend) = setup();
        assert!(backend.read(None).unwrap().starts_with("Include conf.d/*"));
    }

    #[test]
    fn test_read_outside_ssh_dir_refused() {
        let (_dir, backend) = setup();
        let other = TempDir::new().unwrap();
        let outside = other.path().join("config");
        fs::write(&outside, "Host x\n").unwrap();

        let err = backend.read(Some(&outside)).unwrap_err();
        assert!(matches!(err, ReadError::OutsideSshDir { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_out_of_ssh_dir_refused() {
        let (dir, backend) = setup();
        let other = TempDir::new().unwrap();
        let secret = other.path().join("secret");
        fs::write(&secret, "TOP SECRET\n").unwrap();
        let link = dir.path().join("escape");
        std::os::unix::fs::symlink(&secret, &link).unwrap();

        assert!(matches!(
            backend.read(Some(&link)).unwrap_err(),
            ReadError::OutsideSshDir { .. }
        ));
        assert!(matches!(
            backend.save("Host pwned\n", Some(&link)).unwrap_err(),
            SaveError::OutsideSshDir { .. }
        ));
        assert_eq!(fs::read_to_string(&secret).unwrap(), "TOP SECRET\n");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_refused() {
        let (dir, backend) = setup();
        let other = TempDir::new().unwrap();
        let link = dir.path().join("dangling");
        std::os::unix::fs::symlink(other.path().join("later"), &link).unwrap();

        assert!(matches!(
            backend.save("Host x\n", Some(&link)).unwrap_err(),
            SaveError::OutsideSshDir { .. }
        ));
        assert!(!other.path().join("later").exists());
    }

    #[test]
    fn test_included_file_outside_ssh_dir_refused() {
        let (dir, _) = setup();
        let other = TempDir::new().unwrap();
        let shared = other.path().join("shared");
        fs::write(&shared, "Host shared\n").unwrap();
        fs::write(
            dir.path().join("config"),
            format!("Include {}\nHost web\n", shared.display()),
        )
        .unwrap();
        let backend = LocalBackend::new(dir.path().join("config"));

        assert_eq!(backend.list_files().unwrap().entries.len(), 2);
        assert!(matches!(
            backend.read(Some(&shared)).unwrap_err(),
            ReadError::OutsideSshDir { .. }
        ));
    }

    #[test]
    fn test_save_new_file_in_ssh_dir() {
        let (dir, backend) = setup();
        let extra = dir.path().join("conf.d/extra");
        backend.save("Host extra\n", Some(&extra)).unwrap();
        assert_eq!(backend.read(Some(&extra)).unwrap(), "Host extra\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_root_is_saved_through() {
        let home = TempDir::new().unwrap();
        let ssh = home.path().join(".ssh");
        let dotfiles = home.path().join("dotfiles");
        fs::create_dir_all(&ssh).unwrap();
        fs::create_dir_all(&dotfiles).unwrap();
        let real = dotfiles.join("ssh_config");
        fs::write(&real, "Host a\n").unwrap();
        std::os::unix::fs::symlink(&real, ssh.join("config")).unwrap();
        let backend = LocalBackend::new(ssh.join("config"));

        assert_eq!(backend.read(None).unwrap(), "Host a\n");
        backend.save("Host b\n", None).unwrap();

        assert!(fs::symlink_metadata(ssh.join("config"))
            .unwrap()
            .file_type()
            .is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "Host b\n");
    }

    #[test]
    fn test_read_undecodable() {
        let (dir, backend) = setup();
        let bin = dir.path().join("binary");
        fs::write(&bin, [0xc3, 0x28]).unwrap();
        assert!(matches!(
            backend.read(Some(&bin)).unwrap_err(),
            ReadError::Undecodable(_)
        ));
    }

    #[test]
    fn test_validate_sees_hosts_in_other_files() {
        let (_dir, backend) = setup();
        let candidate = "Include conf.d/*\nHost web\n  ProxyJump bastion\n";
        assert!(backend.validate(candidate, None).unwrap().is_empty());
    }

    #[test]
    fn test_validate_does_not_count_replaced_file() {
        let (dir, backend) = setup();
        // The candidate replaces conf.d/work, so its old hosts no longer exist
        let candidate = "Host db\n  ProxyJump bastion\n";
        let warnings = backend
            .validate(candidate, Some(&dir.path().join("conf.d/work")))
            .unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("\"bastion\""));
    }

    #[test]
    fn test_save_round_trip_and_backup() {
        let (dir, backend) = setup();
        let text = "Include conf.d/*\nHost web\n  HostName web2.example.com\n";

        let warnings = backend.save(text, None).unwrap();

        assert!(warnings.is_empty());
        assert_eq!(backend.read(None).unwrap(), text);
        assert!(fs::read_to_string(dir.path().join("config.bak"))
            .unwrap()
            .contains("web.example.com"));
    }

    #[test]
    fn test_save_with_warnings_still_writes() {
        let (_dir, backend) = setup();
        let text = "Host lonely\n  ProxyJump nowhere\n";
        let warnings = backend.save(text, None).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(backend.read(None).unwrap(), text);
    }

    #[test]
    fn test_list_hosts_in_tree_order() {
        let (_dir, backend) = setup();
        let hosts = backend.list_hosts().unwrap();
        let names: Vec<&str> = hosts.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["web", "bastion", "db"]);
        assert_eq!(hosts[2].group, crate::models::HostGroup::Proxy);
    }
}
