//! Include resolution.
//!
//! Walks the tree depth-first from the root config, listing every file once
//! in first-visit order. Visited files are keyed by canonical path so include
//! cycles terminate.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use glob::glob;

use super::parser::{count_hosts, host_blocks, include_patterns};
use super::{expand_tilde, ssh_dir_for};
use crate::error::{DiscoveryError, DiscoveryWarning};
use crate::models::ConfigFile;

/// A listed file and its body. `content` is `None` when the file could not
/// be read; such files are listed but never descended into.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub file: ConfigFile,
    pub content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConfigTree {
    pub root: PathBuf,
    pub ssh_dir: PathBuf,
    pub entries: Vec<TreeEntry>,
    pub warnings: Vec<DiscoveryWarning>,
}

impl ConfigTree {
    pub fn files(&self) -> Vec<ConfigFile> {
        self.entries.iter().map(|e| e.file.clone()).collect()
    }

    /// Literal host names declared in every file except `skip`.
    pub fn declared_names_excluding(&self, skip: &Path) -> HashSet<String> {
        let skip = absolute(skip);
        self.entries
            .iter()
            .filter(|e| e.file.path != skip)
            .filter_map(|e| e.content.as_deref())
            .flat_map(host_blocks)
            .flat_map(|block| {
                block
                    .literal_names()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

/// Resolve the config tree rooted at `root`.
pub fn resolve(root: &Path) -> Result<ConfigTree, DiscoveryError> {
    let root = absolute(root);
    if !root.exists() {
        return Err(DiscoveryError::RootNotFound(root));
    }

    let content = fs::read_to_string(&root).map_err(|source| DiscoveryError::RootUnreadable {
        path: root.clone(),
        source,
    })?;

    let ssh_dir = ssh_dir_for(&root);
    let mut walk = Walk {
        ssh_dir: &ssh_dir,
        visited: HashSet::new(),
        entries: Vec::new(),
        warnings: Vec::new(),
    };

    walk.visited.insert(canonical(&root));
    walk.entries.push(TreeEntry {
        file: ConfigFile {
            name: root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "config".to_string()),
            path: root.clone(),
            is_main: true,
            host_count: count_hosts(&content),
        },
        content: Some(content.clone()),
    });
    walk.descend(&content);

    tracing::debug!(
        "Resolved {} config files from {:?} ({} warnings)",
        walk.entries.len(),
        root,
        walk.warnings.len()
    );

    let Walk {
        entries, warnings, ..
    } = walk;

    Ok(ConfigTree {
        root,
        ssh_dir,
        entries,
        warnings,
    })
}

struct Walk<'a> {
    ssh_dir: &'a Path,
    visited: HashSet<PathBuf>,
    entries: Vec<TreeEntry>,
    warnings: Vec<DiscoveryWarning>,
}

impl Walk<'_> {
    fn descend(&mut self, content: &str) {
        for (_, pattern) in include_patterns(content) {
            for path in self.expand(&pattern) {
                self.visit(path);
            }
        }
    }

    fn visit(&mut self, path: PathBuf) {
        let path = absolute(&path);
        if !self.visited.insert(canonical(&path)) {
            return;
        }

        let name = display_name(&path, self.ssh_dir);
        match fs::read_to_string(&path) {
            Ok(content) => {
                self.entries.push(TreeEntry {
                    file: ConfigFile {
                        name,
                        path,
                        is_main: false,
                        host_count: count_hosts(&content),
                    },
                    content: Some(content.clone()),
                });
                self.descend(&content);
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable included file {:?}: {}", path, e);
                self.warnings.push(DiscoveryWarning::Unreadable {
                    path: path.clone(),
                    reason: e.to_string(),
                });
                self.entries.push(TreeEntry {
                    file: ConfigFile {
                        name,
                        path,
                        is_main: false,
                        host_count: 0,
                    },
                    content: None,
                });
            }
        }
    }

    /// Files an Include pattern names, sorted. Directories are ignored.
    fn expand(&mut self, pattern: &str) -> Vec<PathBuf> {
        let full = if pattern.starts_with('~') {
            expand_tilde(pattern)
        } else if Path::new(pattern).is_absolute() {
            PathBuf::from(pattern)
        } else {
            self.ssh_dir.join(pattern)
        };

        if !pattern.contains(['*', '?', '[']) {
            if full.is_file() {
                return vec![full];
            }
            if !full.exists() {
                self.warnings.push(DiscoveryWarning::Missing { path: full });
            }
            return Vec::new();
        }

        let paths = match glob(&full.to_string_lossy()) {
            Ok(paths) => paths,
            Err(e) => {
                self.warnings.push(DiscoveryWarning::BadPattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                });
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = paths.flatten().filter(|p| p.is_file()).collect();
        files.sort();
        files
    }
}

fn display_name(path: &Path, ssh_dir: &Path) -> String {
    path.strip_prefix(ssh_dir)
        .map(|r| r.to_string_lossy().to_string())
        .unwrap_or_else(|_| path.to_string_lossy().to_string())
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Absolute, lexically normalized path. Symlinks are left alone so a
/// symlinked `~/.ssh/config` keeps its `~/.ssh` location.
pub fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
