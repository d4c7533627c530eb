use anyhow::{Context, Result};
use ratatui::{backend::Backend, Terminal};

use sshm::models::HostGroup;
use sshm::ssh_service::{self, TerminalProgram};
use sshm::ConfigBackend;

use crate::app::types::GroupFilter;
use crate::app::App;

impl App {
    /// Rebuild the groups panel: `all` plus every group that has a host.
    pub fn update_groups(&mut self) {
        let current = self.groups.get(self.selected_group).copied();

        let mut groups = vec![GroupFilter::All];
        groups.extend(
            HostGroup::ALL
                .iter()
                .filter(|group| self.hosts.iter().any(|h| h.group == **group))
                .map(|group| GroupFilter::Only(*group)),
        );
        self.groups = groups;

        // Stay on the same group across reloads when it still exists
        self.selected_group = current
            .and_then(|g| self.groups.iter().position(|x| *x == g))
            .unwrap_or(0);
        self.group_list_state.select(Some(self.selected_group));

        self.update_hosts_for_selected_group();
    }

    pub fn load_all_hosts(&mut self) -> Result<()> {
        let hosts = self
            .backend
            .list_hosts()
            .context("Failed to load SSH config")?;
        self.replace_hosts(hosts);
        tracing::info!("Loaded {} hosts", self.hosts.len());
        Ok(())
    }

    pub fn refresh_hosts(&mut self) -> Result<()> {
        let hosts = self.backend.refresh().context("Failed to reload SSH config")?;
        self.replace_hosts(hosts);
        self.set_status(format!("Reloaded {} hosts", self.hosts.len()));
        Ok(())
    }

    pub fn replace_hosts(&mut self, hosts: Vec<sshm::models::SshHost>) {
        self.hosts = hosts;
        self.update_groups();
        self.filter_hosts();
    }

    /// Open the selected host with the configured terminal program.
    pub fn connect_selected_host<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let Some(host) = self.get_current_selected_host().cloned() else {
            return Ok(());
        };
        let program = self.config.default_terminal;
        tracing::info!("Enter pressed, selected host: {}", host.name);

        if program == TerminalProgram::Inline {
            self.suspend_tui(terminal)?;
            let result = ssh_service::connect_inline(&host.name);
            self.resume_tui(terminal)?;
            result?;
            self.set_status(format!("SSH session to {} ended", host.name));
            return Ok(());
        }

        self.backend.open_terminal(&host.name, program)?;
        self.set_status(format!(
            "Opened {} in {}",
            host.name,
            program.as_str()
        ));
        Ok(())
    }

    pub fn copy_selected_host(&mut self) -> Result<()> {
        let Some(host) = self.get_current_selected_host() else {
            return Ok(());
        };
        let command = ssh_service::ssh_command(&host.name);

        let mut clipboard = arboard::Clipboard::new().context("Clipboard unavailable")?;
        clipboard
            .set_text(command.clone())
            .context("Failed to copy to clipboard")?;

        self.set_status(format!("Copied: {}", command));
        Ok(())
    }
}
