//! Advisory validation of a single config body.
//!
//! Every check is independent and produces human-readable warnings ordered
//! by line. Nothing here fails: anything that parses into lines can be
//! validated.

use std::collections::{HashMap, HashSet};

use super::expand_tilde;
use super::parser::{host_blocks, parse_lines, LineKind, Malformation};

const KNOWN_KEYWORDS: &[&str] = &[
    "host",
    "match",
    "include",
    "hostname",
    "user",
    "port",
    "identityfile",
    "identitiesonly",
    "identityagent",
    "forwardagent",
    "forwardx11",
    "forwardx11trusted",
    "forwardx11timeout",
    "proxyjump",
    "proxycommand",
    "proxyusefdpass",
    "localforward",
    "remoteforward",
    "dynamicforward",
    "serveraliveinterval",
    "serveralivecountmax",
    "stricthostkeychecking",
    "userknownhostsfile",
    "globalknownhostsfile",
    "knownhostscommand",
    "loglevel",
    "compression",
    "connecttimeout",
    "connectionattempts",
    "addkeystoagent",
    "pubkeyauthentication",
    "pubkeyacceptedalgorithms",
    "preferredauthentications",
    "passwordauthentication",
    "kbdinteractiveauthentication",
    "hostbasedauthentication",
    "gssapiauthentication",
    "gssapidelegatecredentials",
    "batchmode",
    "checkhostip",
    "ciphers",
    "macs",
    "kexalgorithms",
    "hostkeyalgorithms",
    "hostkeyalias",
    "casignaturealgorithms",
    "certificatefile",
    "controlmaster",
    "controlpath",
    "controlpersist",
    "escapechar",
    "exitonforwardfailure",
    "fingerprinthash",
    "gatewayports",
    "hashknownhosts",
    "ipqos",
    "localcommand",
    "permitlocalcommand",
    "remotecommand",
    "numberofpasswordprompts",
    "pkcs11provider",
    "securitykeyprovider",
    "protocol",
    "rekeylimit",
    "requesttty",
    "sessiontype",
    "stdinnull",
    "forkafterauthentication",
    "sendenv",
    "setenv",
    "tcpkeepalive",
    "tunnel",
    "tunneldevice",
    "updatehostkeys",
    "verifyhostkeydns",
    "visualhostkey",
    "xauthlocation",
    "canonicaldomains",
    "canonicalizefallbacklocal",
    "canonicalizehostname",
    "canonicalizemaxdots",
    "canonicalizepermittedcnames",
    "addressfamily",
    "bindaddress",
    "bindinterface",
    "nohostauthenticationforlocalhost",
    "permitremoteopen",
    "revokedhostkeys",
    "streamlocalbindmask",
    "streamlocalbindunlink",
    "syslogfacility",
    "tag",
    "ignorehostkeys",
    "ignoreunknown",
    "usekeychain",
    "enableescapecommandline",
    "obscurekeystroketiming",
    "requiredrsasize",
    "channeltimeout",
];

const BOOL_KEYWORDS: &[&str] = &[
    "forwardagent",
    "forwardx11",
    "forwardx11trusted",
    "identitiesonly",
    "compression",
    "batchmode",
    "checkhostip",
    "exitonforwardfailure",
    "gatewayports",
    "gssapiauthentication",
    "gssapidelegatecredentials",
    "hashknownhosts",
    "hostbasedauthentication",
    "passwordauthentication",
    "permitlocalcommand",
    "pubkeyauthentication",
    "tcpkeepalive",
    "visualhostkey",
    "canonicalizefallbacklocal",
    "nohostauthenticationforlocalhost",
    "streamlocalbindunlink",
    "usekeychain",
];

const NUMERIC_KEYWORDS: &[&str] = &[
    "serveraliveinterval",
    "serveralivecountmax",
    "connecttimeout",
    "connectionattempts",
    "numberofpasswordprompts",
];

const ENUM_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "loglevel",
        &[
            "quiet", "fatal", "error", "info", "verbose", "debug", "debug1", "debug2", "debug3",
        ],
    ),
    ("stricthostkeychecking", &["yes", "no", "ask", "accept-new", "off"]),
    ("requesttty", &["yes", "no", "force", "auto"]),
    ("controlmaster", &["yes", "no", "ask", "auto", "autoask"]),
];

/// Validate `content` as the body of one file.
///
/// `known_hosts` holds the literal host names declared elsewhere in the
/// resolved tree; names declared in `content` itself are added to it.
pub fn validate(content: &str, known_hosts: &HashSet<String>) -> Vec<String> {
    let local_names: HashSet<String> = host_blocks(content)
        .iter()
        .flat_map(|b| b.literal_names().map(str::to_string).collect::<Vec<_>>())
        .collect();
    let is_declared = |name: &str| local_names.contains(name) || known_hosts.contains(name);

    let mut warnings = Vec::new();
    let mut first_declared: HashMap<String, usize> = HashMap::new();
    let mut host_lines = 0;

    for parsed in parse_lines(content) {
        let line = parsed.number;
        let (key, value) = match parsed.kind {
            LineKind::Blank | LineKind::Comment => continue,
            LineKind::Malformed(m) => {
                warnings.push(format!("line {}: {}", line, describe(&m)));
                continue;
            }
            LineKind::Directive { key, value } => (key, value),
        };
        let lower = key.to_lowercase();

        if !KNOWN_KEYWORDS.contains(&lower.as_str()) {
            warnings.push(format!("line {}: unknown directive \"{}\"", line, key));
            continue;
        }

        match lower.as_str() {
            "host" => {
                host_lines += 1;
                for pattern in value.split_whitespace().map(|p| p.trim_matches('"')) {
                    match first_declared.get(pattern) {
                        Some(first) => warnings.push(format!(
                            "line {}: duplicate Host \"{}\" (first declared on line {})",
                            line, pattern, first
                        )),
                        None => {
                            first_declared.insert(pattern.to_string(), line);
                        }
                    }
                }
            }
            "port" => match value.parse::<u16>() {
                Ok(0) => warnings.push(format!("line {}: Port cannot be 0", line)),
                Err(_) => warnings.push(format!(
                    "line {}: Port \"{}\" is not a valid port number (1-65535)",
                    line, value
                )),
                Ok(_) => {}
            },
            "proxyjump" => {
                for hop in value.split(',').map(str::trim) {
                    if hop.eq_ignore_ascii_case("none") || hop.is_empty() {
                        continue;
                    }
                    let target = jump_target(hop);
                    if !is_declared(target) {
                        warnings.push(format!(
                            "line {}: ProxyJump target \"{}\" is not declared in the config tree",
                            line, target
                        ));
                    }
                }
            }
            "identityfile" => {
                if let Some(missing) = missing_identity_file(value) {
                    warnings.push(format!(
                        "line {}: IdentityFile \"{}\" does not exist",
                        line, missing
                    ));
                }
            }
            "addkeystoagent" => {
                let v = value.to_lowercase();
                if !["yes", "no", "confirm", "ask"].contains(&v.as_str())
                    && value.parse::<u32>().is_err()
                {
                    warnings.push(format!(
                        "line {}: AddKeysToAgent \"{}\" should be yes/no/confirm/ask or a number of seconds",
                        line, value
                    ));
                }
            }
            k if BOOL_KEYWORDS.contains(&k) => {
                if !["yes", "no"].contains(&value.to_lowercase().as_str()) {
                    warnings.push(format!(
                        "line {}: {} \"{}\" should be yes or no",
                        line, key, value
                    ));
                }
            }
            k if NUMERIC_KEYWORDS.contains(&k) => {
                if value.parse::<u32>().is_err() {
                    warnings.push(format!(
                        "line {}: {} \"{}\" should be a non-negative integer",
                        line, key, value
                    ));
                }
            }
            k => {
                if let Some((_, allowed)) = ENUM_KEYWORDS.iter().find(|(name, _)| *name == k) {
                    if !allowed.contains(&value.to_lowercase().as_str()) {
                        warnings.push(format!(
                            "line {}: {} \"{}\" should be one of {}",
                            line,
                            key,
                            value,
                            allowed.join("/")
                        ));
                    }
                }
            }
        }
    }

    if host_lines == 0 {
        warnings.push("no Host declarations in this file".to_string());
    }

    warnings
}

fn describe(malformation: &Malformation) -> String {
    match malformation {
        Malformation::MissingKey => "value without a directive name".to_string(),
        Malformation::MissingValue { key } => format!("\"{}\" is missing a value", key),
        Malformation::InvalidKey { key } => format!("invalid directive name \"{}\"", key),
    }
}

/// Host name of one ProxyJump hop: `[user@]host[:port]` or `ssh://` URI.
fn jump_target(hop: &str) -> &str {
    let hop = hop.strip_prefix("ssh://").unwrap_or(hop);
    let host = hop.rsplit_once('@').map(|(_, h)| h).unwrap_or(hop);

    if let Some(bracketed) = host.strip_prefix('[') {
        return bracketed.split(']').next().unwrap_or(bracketed);
    }
    match host.split_once(':') {
        Some((name, port)) if !port.contains(':') => name,
        _ => host,
    }
}

/// The expanded path when an identity file is definitely absent.
/// Token and environment substitutions are not expanded, so those are
/// skipped rather than reported.
fn missing_identity_file(value: &str) -> Option<String> {
    if value.eq_ignore_ascii_case("none") || value.contains('%') || value.contains("${") {
        return None;
    }

    let mut path = expand_tilde(value);
    if path.is_relative() {
        if let Some(home) = dirs::home_dir() {
            path = home.join(path);
        }
    }

    if path.exists() {
        None
    } else {
        Some(path.to_string_lossy().to_string())
    }
}
