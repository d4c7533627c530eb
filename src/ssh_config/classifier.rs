//! Host classification.
//!
//! Each host is classified from its own block only, so the same block text
//! always yields the same group and agent flag.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv6Addr};

use super::expand_tilde;
use super::parser::{host_blocks, HostBlock};
use super::resolver::ConfigTree;
use crate::models::{HostGroup, SshHost, DEFAULT_SSH_PORT};

const CODE_HOSTING_DOMAINS: &[&str] = &[
    "github.com",
    "gitlab.com",
    "bitbucket.org",
    "codeberg.org",
    "git.sr.ht",
    "ssh.dev.azure.com",
];

/// Substrings of IdentityAgent values that point at a password manager's
/// agent socket. Compared lowercased.
const AGENT_SIGNATURES: &[&str] = &["1password", "2bua8c4s2c.com.1password", "bitwarden"];

/// Build the host list for a resolved tree: files in resolver order, hosts in
/// declaration order. A name declared twice keeps its first declaration.
pub fn classify(tree: &ConfigTree) -> Vec<SshHost> {
    let mut hosts = Vec::new();
    let mut seen = HashSet::new();

    for entry in &tree.entries {
        let Some(content) = entry.content.as_deref() else {
            continue;
        };
        for block in host_blocks(content) {
            for host in classify_block(&block) {
                if seen.insert(host.name.clone()) {
                    hosts.push(host);
                } else {
                    tracing::warn!(
                        "Duplicate host '{}' in {:?} ignored, first declaration wins",
                        host.name,
                        entry.file.path
                    );
                }
            }
        }
    }

    tracing::info!("Classified {} hosts from {} files", hosts.len(), tree.entries.len());
    hosts
}

/// One host per literal name on the block's `Host` line.
pub fn classify_block(block: &HostBlock) -> Vec<SshHost> {
    let proxy_jump = block
        .get("proxyjump")
        .filter(|v| !v.eq_ignore_ascii_case("none"))
        .map(str::to_string);
    let port = block
        .get("port")
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_SSH_PORT);
    let user = block.get("user").map(str::to_string);
    let identity_file = block
        .get("identityfile")
        .map(|v| expand_tilde(v).to_string_lossy().to_string());
    let credential_agent = block.get("identityagent").is_some_and(is_password_manager_agent);

    block
        .literal_names()
        .map(|name| {
            let hostname = block.get("hostname").unwrap_or(name).to_string();
            let group = determine_group(&hostname, proxy_jump.is_some());
            SshHost {
                port,
                user: user.clone(),
                identity_file: identity_file.clone(),
                proxy_jump: proxy_jump.clone(),
                credential_agent,
                group,
                ..SshHost::new(name, hostname)
            }
        })
        .collect()
}

pub fn determine_group(hostname: &str, has_proxy_jump: bool) -> HostGroup {
    let host = hostname.to_lowercase();

    if is_code_hosting(&host) {
        HostGroup::Github
    } else if has_proxy_jump {
        HostGroup::Proxy
    } else if is_local_address(&host) {
        HostGroup::Local
    } else {
        HostGroup::Direct
    }
}

fn is_code_hosting(host: &str) -> bool {
    CODE_HOSTING_DOMAINS.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

fn is_local_address(host: &str) -> bool {
    if host == "localhost" || host.ends_with(".localhost") || host.ends_with(".local") {
        return true;
    }

    let literal = host.trim_start_matches('[').trim_end_matches(']');
    match literal.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4.is_loopback() || v4.is_private() || v4.is_link_local(),
        Ok(IpAddr::V6(v6)) => v6.is_loopback() || is_unique_local(&v6) || is_unicast_link_local(&v6),
        Err(_) => false,
    }
}

fn is_unique_local(addr: &Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xfe00) == 0xfc00
}

fn is_unicast_link_local(addr: &Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xffc0) == 0xfe80
}

/// Textual check only; the socket is never probed.
pub fn is_password_manager_agent(value: &str) -> bool {
    let value = value.to_lowercase();
    AGENT_SIGNATURES.iter().any(|sig| value.contains(sig))
}
