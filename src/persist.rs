//! Backup-then-replace writes for config files.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::SaveError;

/// `<name>.bak` next to the file.
pub fn backup_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "config".to_string());
    path.with_file_name(format!("{}.bak", name))
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "config".to_string());
    path.with_file_name(format!(".{}.sshm.tmp", name))
}

/// Replace `path` with `content`, keeping the previous content in
/// `<name>.bak`.
///
/// A symlinked target is written through: the temp file, the backup and the
/// rename all happen next to the file the link points at, so the link
/// survives. The new content is staged in a sibling temp file first, the
/// backup is taken from the untouched original, and only then is the temp
/// file renamed over the target. On any failure the temp file is removed and
/// the target still holds its previous content. Returns the backup path when
/// one was written.
pub fn write_with_backup(path: &Path, content: &str) -> Result<Option<PathBuf>, SaveError> {
    let path = &link_target(path);
    let temp = temp_path(path);
    let mode = fs::metadata(path).ok().map(|m| m.permissions());

    if let Err(source) = write_temp(&temp, content, mode.as_ref()) {
        let _ = fs::remove_file(&temp);
        return Err(SaveError::TempWrite { path: temp, source });
    }

    let backup = if path.exists() {
        let backup = backup_path(path);
        if let Err(source) = fs::copy(path, &backup) {
            let _ = fs::remove_file(&temp);
            return Err(SaveError::Backup { path: backup, source });
        }
        tracing::debug!("Backed up {:?} to {:?}", path, backup);
        Some(backup)
    } else {
        None
    };

    if let Err(source) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(SaveError::Commit {
            path: path.to_path_buf(),
            source,
        });
    }

    tracing::info!("Saved {:?} ({} bytes)", path, content.len());
    Ok(backup)
}

fn link_target(path: &Path) -> PathBuf {
    let is_link = fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    if is_link {
        if let Ok(real) = fs::canonicalize(path) {
            return real;
        }
    }
    path.to_path_buf()
}

/// Create the temp file with the target's mode from the start, so the new
/// body is never readable by more users than the old one.
fn write_temp(temp: &Path, content: &str, mode: Option<&fs::Permissions>) -> io::Result<()> {
    // A stale temp from an earlier crash would keep its own mode
    let _ = fs::remove_file(temp);

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(mode.map(|m| m.mode() & 0o777).unwrap_or(0o600));
    }

    let mut file = options.open(temp)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    // umask may have stripped bits the original had
    if let Some(mode) = mode {
        fs::set_permissions(temp, mode.clone())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_backup_of_previous_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, "Host old\n").unwrap();

        let backup = write_with_backup(&path, "Host new\n").unwrap();

        assert_eq!(backup, Some(dir.path().join("config.bak")));
        assert_eq!(fs::read_to_string(&path).unwrap(), "Host new\n");
        assert_eq!(fs::read_to_string(dir.path().join("config.bak")).unwrap(), "Host old\n");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_write_new_file_has_no_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("extra");

        assert_eq!(write_with_backup(&path, "Host x\n").unwrap(), None);
        assert_eq!(fs::read_to_string(&path).unwrap(), "Host x\n");
    }

    #[test]
    fn test_failed_backup_leaves_target_and_no_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, "Host keep\n").unwrap();
        // A directory where the backup should go makes the copy fail
        fs::create_dir(dir.path().join("config.bak")).unwrap();

        let err = write_with_backup(&path, "Host lost\n").unwrap_err();

        assert!(matches!(err, SaveError::Backup { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "Host keep\n");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_missing_directory_fails_without_artifacts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope").join("config");

        let err = write_with_backup(&path, "Host x\n").unwrap_err();

        assert!(matches!(err, SaveError::TempWrite { .. }));
        assert!(!path.exists());
        assert!(!backup_path(&path).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, "Host a\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        write_with_backup(&path, "Host b\n").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_target_is_written_through() {
        let dir = TempDir::new().unwrap();
        let dotfiles = dir.path().join("dotfiles");
        fs::create_dir(&dotfiles).unwrap();
        let real = dotfiles.join("ssh_config");
        fs::write(&real, "Host a\n").unwrap();
        let link = dir.path().join("config");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let backup = write_with_backup(&link, "Host b\n").unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "Host b\n");
        assert_eq!(backup, Some(fs::canonicalize(&dotfiles).unwrap().join("ssh_config.bak")));
        assert_eq!(fs::read_to_string(dotfiles.join("ssh_config.bak")).unwrap(), "Host a\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_temp_file_created_with_target_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, "Host a\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
        let temp = temp_path(&path);

        let mode = fs::metadata(&path).unwrap().permissions();
        write_temp(&temp, "Host b\n", Some(&mode)).unwrap();

        let temp_mode = fs::metadata(&temp).unwrap().permissions().mode() & 0o777;
        assert_eq!(temp_mode, 0o600);
        assert_eq!(fs::read_to_string(&temp).unwrap(), "Host b\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_stale_temp_is_replaced() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, "Host a\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
        fs::write(temp_path(&path), "leftover").unwrap();
        fs::set_permissions(temp_path(&path), fs::Permissions::from_mode(0o644)).unwrap();

        write_with_backup(&path, "Host b\n").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert_eq!(fs::read_to_string(&path).unwrap(), "Host b\n");
    }
}
