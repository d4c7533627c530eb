//! Shared helpers for sshm integration tests.
//!
//! `TestEnv` gives each test its own SSH directory and settings directory so
//! nothing touches the real `~/.ssh` or `~/.config/sshm`.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

pub struct TestEnv {
    pub ssh_dir: TempDir,
    pub config_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            ssh_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Environment with `config` as the root SSH config body.
    pub fn with_config(config: &str) -> Self {
        let env = Self::new();
        env.write("config", config);
        env
    }

    /// Write a file relative to the SSH directory, creating parents.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.ssh_dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.ssh_dir.path().join(relative)).unwrap()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.ssh_dir.path().join(relative)
    }

    pub fn root(&self) -> PathBuf {
        self.path("config")
    }

    pub fn ssh_path(&self) -> &Path {
        self.ssh_dir.path()
    }

    /// The sshm binary pointed at this environment's root config.
    ///
    /// Sets `SSHM_CONFIG_DIR` per command so tests can run in parallel.
    pub fn sshm(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_sshm"));
        cmd.env("SSHM_CONFIG_DIR", self.config_dir.path());
        cmd.arg("--ssh-config").arg(self.root());
        cmd
    }

    /// The sshm binary without a root override, for settings tests.
    pub fn sshm_bare(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_sshm"));
        cmd.env("SSHM_CONFIG_DIR", self.config_dir.path());
        cmd
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
