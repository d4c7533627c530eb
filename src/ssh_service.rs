use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::process::{Command, Stdio};

/// Where `ssh <host>` gets run when a host is opened.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TerminalProgram {
    /// Platform default terminal
    #[default]
    Terminal,
    /// iTerm2 (macOS)
    Iterm,
    /// Warp (macOS)
    Warp,
    /// Run ssh in the current terminal and wait for it
    Inline,
}

impl TerminalProgram {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalProgram::Terminal => "terminal",
            TerminalProgram::Iterm => "iterm",
            TerminalProgram::Warp => "warp",
            TerminalProgram::Inline => "inline",
        }
    }
}

/// Host names end up inside scripts and command lines, so only plain
/// host-name characters are accepted.
pub fn check_host_name(host: &str) -> Result<()> {
    let valid = !host.is_empty()
        && !host.starts_with('-')
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '@' | ':'));
    if !valid {
        bail!("Refusing to open unsafe host name: {:?}", host);
    }
    Ok(())
}

pub fn ssh_command(host: &str) -> String {
    format!("ssh {}", host)
}

/// Open `host` with the chosen terminal program. External terminals are
/// spawned and left running; `Inline` blocks until ssh exits.
pub fn open_terminal(host: &str, program: TerminalProgram) -> Result<()> {
    check_host_name(host)?;
    tracing::info!("Opening {} with {}", host, program.as_str());

    if program == TerminalProgram::Inline {
        return connect_inline(host);
    }
    launch_external(host, program)
}

/// Run ssh with inherited stdio so the session is interactive.
pub fn connect_inline(host: &str) -> Result<()> {
    check_host_name(host)?;

    let status = Command::new("ssh")
        .arg(host)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("Failed to execute SSH command for {}", host))?;

    if !status.success() {
        // ssh already printed its own error
        tracing::error!("SSH command finished with a non-zero status: {}", status);
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn launch_external(host: &str, program: TerminalProgram) -> Result<()> {
    if program == TerminalProgram::Warp {
        // Warp has no AppleScript `do script`, so hand it a .command file
        let script_path =
            std::env::temp_dir().join(format!("sshm-connect-{}.command", std::process::id()));
        std::fs::write(&script_path, format!("#!/bin/bash\nexec ssh {}\n", host))
            .context("Failed to create connect script")?;
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755))
                .context("Failed to set script permissions")?;
        }
        return open::with(&script_path, "Warp").context("Failed to open Warp");
    }

    let script = match program {
        TerminalProgram::Iterm => format!(
            r#"tell application "iTerm"
    activate
    create window with default profile command "ssh {}"
end tell"#,
            host
        ),
        _ => format!(
            r#"tell application "Terminal"
    activate
    do script "ssh {}"
end tell"#,
            host
        ),
    };

    Command::new("osascript")
        .arg("-e")
        .arg(&script)
        .spawn()
        .context("Failed to open terminal")?;
    Ok(())
}

#[cfg(all(unix, not(target_os = "macos")))]
fn launch_external(host: &str, program: TerminalProgram) -> Result<()> {
    if program != TerminalProgram::Terminal {
        tracing::debug!(
            "{} is not available here, using the default terminal",
            program.as_str()
        );
    }

    let candidates: [(&str, &[&str]); 4] = [
        ("gnome-terminal", &["--"]),
        ("konsole", &["-e"]),
        ("xterm", &["-e"]),
        ("x-terminal-emulator", &["-e"]),
    ];

    for (terminal, args) in candidates {
        let spawned = Command::new(terminal)
            .args(args)
            .arg("ssh")
            .arg(host)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(_) => {
                tracing::info!("Launched {} for {}", terminal, host);
                return Ok(());
            }
            Err(e) => tracing::debug!("{} unavailable: {}", terminal, e),
        }
    }

    bail!("No terminal emulator found")
}

#[cfg(windows)]
fn launch_external(host: &str, _program: TerminalProgram) -> Result<()> {
    Command::new("cmd")
        .args(["/c", "start", "ssh", host])
        .spawn()
        .context("Failed to open terminal")?;
    Ok(())
}
