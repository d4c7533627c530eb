use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};

use sshm::config::{AppConfig, ConfigManager};
use sshm::models::{ConfigFile, SshHost};
use sshm::persist::backup_path;
use sshm::ssh_service::TerminalProgram;
use sshm::{ConfigBackend, LocalBackend};

#[derive(Parser, Debug)]
#[command(
    name = "sshm",
    version,
    about = "Browse, validate and safely edit your SSH config"
)]
pub struct Cli {
    /// Root SSH config file [default: the saved setting, ~/.ssh/config]
    #[arg(long, global = true, value_name = "PATH")]
    pub ssh_config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every file reachable from the root config
    Files,

    /// List hosts with their group
    Hosts {
        /// Force a fresh discovery pass
        #[arg(long)]
        refresh: bool,
    },

    /// Print a config file (the root when no path is given)
    Read { path: Option<PathBuf> },

    /// Check a config body and print warnings. Nothing is written.
    Validate {
        /// File the body is meant for [default: root config]
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Candidate body, `-` for stdin [default: the file on disk]
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Replace a config file, keeping the previous content in <name>.bak
    Save {
        /// File to replace [default: root config]
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// New body, `-` for stdin
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
    },

    /// Open `ssh <HOST>` in a terminal
    Open {
        host: String,
        #[arg(long, value_enum)]
        terminal: Option<TerminalProgram>,
    },

    /// Show or change saved settings
    Settings {
        #[arg(long, value_enum)]
        terminal: Option<TerminalProgram>,
        /// Root SSH config file to use by default
        #[arg(long, value_name = "PATH")]
        config_path: Option<String>,
        /// Editor command for the TUI
        #[arg(long, value_name = "CMD")]
        editor: Option<String>,
    },
}

impl Cli {
    pub fn root_config(&self, config: &AppConfig) -> PathBuf {
        self.ssh_config
            .clone()
            .unwrap_or_else(|| config.ssh_config_path())
    }
}

#[derive(Serialize)]
struct FilesOutput<'a> {
    files: &'a [ConfigFile],
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct WarningsOutput<'a> {
    path: &'a Path,
    warnings: &'a [String],
}

pub fn run(
    cli: &Cli,
    command: &Command,
    manager: &ConfigManager,
    config: &AppConfig,
) -> Result<()> {
    let backend = LocalBackend::new(cli.root_config(config));

    match command {
        Command::Files => {
            let tree = backend.list_files().context("Failed to load SSH config")?;
            let files = tree.files();
            let warnings: Vec<String> = tree.warnings.iter().map(|w| w.to_string()).collect();
            if cli.json {
                print_json(&FilesOutput {
                    files: &files,
                    warnings,
                })?;
            } else {
                for file in &files {
                    println!(
                        "{}{}\t{} hosts\t{}",
                        file.name,
                        if file.is_main { " (main)" } else { "" },
                        file.host_count,
                        file.path.display()
                    );
                }
                for warning in warnings {
                    eprintln!("warning: {}", warning);
                }
            }
        }
        Command::Hosts { refresh } => {
            let hosts = if *refresh {
                backend.refresh()
            } else {
                backend.list_hosts()
            }
            .context("Failed to load SSH config")?;
            if cli.json {
                print_json(&hosts)?;
            } else {
                print_hosts(&hosts);
            }
        }
        Command::Read { path } => {
            let text = backend
                .read(path.as_deref())
                .context("Failed to read SSH config")?;
            print!("{}", text);
        }
        Command::Validate { file, input } => {
            let content = match input {
                Some(input) => read_input(input)?,
                None => backend
                    .read(file.as_deref())
                    .context("Failed to read SSH config")?,
            };
            let warnings = backend
                .validate(&content, file.as_deref())
                .context("Validation could not run")?;
            let target = file.clone().unwrap_or_else(|| backend.root().to_path_buf());
            report_warnings(cli.json, &target, &warnings)?;
            if !cli.json && warnings.is_empty() {
                println!("No problems found in {}", target.display());
            }
        }
        Command::Save { file, input } => {
            let content = read_input(input)?;
            let warnings = backend
                .save(&content, file.as_deref())
                .context("Save failed")?;
            let target = file.clone().unwrap_or_else(|| backend.root().to_path_buf());
            if !cli.json {
                let backup = backup_path(&target);
                if backup.exists() {
                    println!(
                        "Saved {} (previous content in {})",
                        target.display(),
                        backup.display()
                    );
                } else {
                    println!("Saved {}", target.display());
                }
            }
            report_warnings(cli.json, &target, &warnings)?;
        }
        Command::Open { host, terminal } => {
            let program = terminal.unwrap_or(config.default_terminal);
            backend
                .open_terminal(host, program)
                .with_context(|| format!("Failed to open {}", host))?;
        }
        Command::Settings {
            terminal,
            config_path,
            editor,
        } => {
            let mut updated = config.clone();
            if let Some(terminal) = terminal {
                updated.default_terminal = *terminal;
            }
            if let Some(path) = config_path {
                updated.ssh_config_path = path.clone();
            }
            if let Some(editor) = editor {
                updated.editor = Some(editor.clone()).filter(|e| !e.trim().is_empty());
            }
            if &updated != config {
                manager.save_config(&updated)?;
                tracing::info!("Settings updated");
            }

            if cli.json {
                print_json(&updated)?;
            } else {
                println!("ssh_config_path = {}", updated.ssh_config_path);
                println!("default_terminal = {}", updated.default_terminal.as_str());
                println!("editor = {}", updated.editor_command());
                println!("settings file = {}", manager.config_path().display());
            }
        }
    }

    Ok(())
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        return Ok(buffer);
    }
    if !input.is_file() {
        bail!("Input file not found: {}", input.display());
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))
}

fn report_warnings(json: bool, path: &Path, warnings: &[String]) -> Result<()> {
    if json {
        return print_json(&WarningsOutput { path, warnings });
    }
    for warning in warnings {
        println!("warning: {}", warning);
    }
    Ok(())
}

fn print_hosts(hosts: &[SshHost]) {
    for host in hosts {
        let mut line = format!(
            "{:<24} {:<8} {}",
            host.name,
            host.group.as_str(),
            host.connection_string()
        );
        if let Some(jump) = &host.proxy_jump {
            line.push_str(&format!(" via {}", jump));
        }
        if host.credential_agent {
            line.push_str(" [agent]");
        }
        println!("{}", line);
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
