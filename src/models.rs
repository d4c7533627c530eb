use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_SSH_PORT: u16 = 22;

/// Coarse category used to organize hosts for display and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostGroup {
    Direct,
    Proxy,
    Local,
    Github,
}

impl HostGroup {
    pub const ALL: [HostGroup; 4] = [
        HostGroup::Direct,
        HostGroup::Proxy,
        HostGroup::Local,
        HostGroup::Github,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HostGroup::Direct => "direct",
            HostGroup::Proxy => "proxy",
            HostGroup::Local => "local",
            HostGroup::Github => "github",
        }
    }
}

impl fmt::Display for HostGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A host declared in the resolved SSH config tree.
///
/// Host values are rebuilt on every discovery pass; nothing about a host
/// survives a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshHost {
    pub name: String,
    pub hostname: String,
    pub port: u16,
    pub user: Option<String>,
    pub identity_file: Option<String>,
    pub proxy_jump: Option<String>,
    pub credential_agent: bool,
    pub group: HostGroup,
}

impl SshHost {
    pub fn new(name: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hostname: hostname.into(),
            port: DEFAULT_SSH_PORT,
            user: None,
            identity_file: None,
            proxy_jump: None,
            credential_agent: false,
            group: HostGroup::Direct,
        }
    }

    /// `user@hostname:port` as shown in host lists.
    pub fn connection_string(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}:{}", user, self.hostname, self.port),
            None => format!("{}:{}", self.hostname, self.port),
        }
    }
}

/// One file of the SSH config tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Display name, relative to the SSH config directory when possible
    pub name: String,
    pub path: PathBuf,
    pub is_main: bool,
    /// Host declarations physically present in this file
    pub host_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_serializes_lowercase() {
        let json = serde_json::to_string(&HostGroup::Github).unwrap();
        assert_eq!(json, "\"github\"");
    }

    #[test]
    fn test_connection_string() {
        let mut host = SshHost::new("web", "10.0.0.1");
        assert_eq!(host.connection_string(), "10.0.0.1:22");
        host.user = Some("deploy".to_string());
        host.port = 2222;
        assert_eq!(host.connection_string(), "deploy@10.0.0.1:2222");
    }
}
