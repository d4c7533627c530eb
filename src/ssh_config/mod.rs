//! Reading the SSH config tree: parsing, Include resolution, host
//! classification and validation.

pub mod classifier;
pub mod parser;
pub mod resolver;
pub mod validate;

pub use classifier::{classify, classify_block};
pub use resolver::{resolve, ConfigTree, TreeEntry};
pub use validate::validate;

use std::path::{Path, PathBuf};

/// `~/.ssh/config`, or `.ssh/config` when there is no home directory.
pub fn default_ssh_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".ssh")
        .join("config")
}

/// Directory that relative Include paths resolve against.
pub fn ssh_dir_for(root: &Path) -> PathBuf {
    root.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(value: &str) -> PathBuf {
    if value == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(value));
    }
    if let Some(rest) = value.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/.ssh/id_work");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with(".ssh/id_work"));
        assert_eq!(expand_tilde("/etc/ssh/key"), PathBuf::from("/etc/ssh/key"));
    }

    #[test]
    fn test_ssh_dir_for() {
        assert_eq!(
            ssh_dir_for(Path::new("/home/me/.ssh/config")),
            PathBuf::from("/home/me/.ssh")
        );
    }
}
