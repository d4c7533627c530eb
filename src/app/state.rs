use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use ratatui::{backend::Backend, widgets::ListState, Terminal};
use std::path::PathBuf;
use std::time::Instant;

use sshm::config::AppConfig;
use sshm::models::SshHost;
use sshm::LocalBackend;

use crate::app::types::{ActivePanel, FilteredHost, GroupFilter, InputMode};
use crate::app::App;

impl App {
    pub fn new(config: AppConfig, ssh_config: PathBuf) -> Self {
        tracing::info!("SSH config path: {:?}", ssh_config);

        let mut app = Self {
            should_quit: false,
            backend: LocalBackend::new(&ssh_config),
            config,
            hosts: Vec::new(),
            input_mode: InputMode::Normal,
            active_panel: ActivePanel::Hosts,
            status_message: None,

            groups: vec![GroupFilter::All],
            selected_group: 0,
            hosts_in_current_group: Vec::new(),
            selected_host: 0,

            search_query: String::new(),
            filtered_hosts: Vec::new(),
            search_selected: 0,

            help_scroll_position: 0,
            editor: None,

            host_list_state: ListState::default(),
            group_list_state: ListState::default(),
        };

        // A missing config is not fatal: the browser opens empty
        if let Err(e) = app.load_all_hosts() {
            tracing::warn!("Initial host load failed: {:#}", e);
            app.set_status(format!("Error: {:#}", e));
        }
        app.group_list_state.select(Some(app.selected_group));
        app
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    pub fn clear_status_message(&mut self) {
        self.status_message = None;
    }

    pub fn switch_panel(&mut self) {
        self.active_panel = match self.active_panel {
            ActivePanel::Groups => ActivePanel::Hosts,
            ActivePanel::Hosts => ActivePanel::Groups,
        };

        tracing::debug!("Switched to {:?} panel", self.active_panel);

        if self.active_panel == ActivePanel::Hosts && !self.hosts_in_current_group.is_empty() {
            self.selected_host = self
                .selected_host
                .min(self.hosts_in_current_group.len().saturating_sub(1));
            self.host_list_state.select(Some(self.selected_host));
        }
    }

    pub fn update_hosts_for_selected_group(&mut self) {
        let filter = self
            .groups
            .get(self.selected_group)
            .copied()
            .unwrap_or(GroupFilter::All);

        self.hosts_in_current_group = self
            .hosts
            .iter()
            .enumerate()
            .filter(|(_, host)| filter.matches(host))
            .map(|(i, _)| i)
            .collect();

        self.selected_host = 0;
        if self.hosts_in_current_group.is_empty() {
            self.host_list_state.select(None);
        } else {
            self.host_list_state.select(Some(0));
        }
    }

    pub fn select_next(&mut self) {
        match self.active_panel {
            ActivePanel::Groups => {
                if self.groups.is_empty() {
                    return;
                }
                self.selected_group = (self.selected_group + 1) % self.groups.len();
                self.group_list_state.select(Some(self.selected_group));
                self.update_hosts_for_selected_group();
            }
            ActivePanel::Hosts => {
                if self.hosts_in_current_group.is_empty() {
                    return;
                }
                self.selected_host = (self.selected_host + 1) % self.hosts_in_current_group.len();
                self.host_list_state.select(Some(self.selected_host));
            }
        }
    }

    pub fn select_previous(&mut self) {
        match self.active_panel {
            ActivePanel::Groups => {
                if self.groups.is_empty() {
                    return;
                }
                let total = self.groups.len();
                self.selected_group = (self.selected_group + total - 1) % total;
                self.group_list_state.select(Some(self.selected_group));
                self.update_hosts_for_selected_group();
            }
            ActivePanel::Hosts => {
                if self.hosts_in_current_group.is_empty() {
                    return;
                }
                let total = self.hosts_in_current_group.len();
                self.selected_host = (self.selected_host + total - 1) % total;
                self.host_list_state.select(Some(self.selected_host));
            }
        }
    }

    /// Hand the terminal over to a child process (ssh, an editor).
    pub fn suspend_tui<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        let mut stdout = std::io::stdout();
        execute!(&mut stdout, LeaveAlternateScreen, DisableMouseCapture)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;

        tracing::debug!("TUI suspended");
        Ok(())
    }

    pub fn resume_tui<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        enable_raw_mode().context("Failed to re-enable raw mode")?;
        let mut stdout = std::io::stdout();
        execute!(&mut stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("Failed to re-enter alternate screen")?;
        terminal.clear().context("Failed to clear terminal")?;

        tracing::debug!("TUI resumed");
        Ok(())
    }

    // Search logic
    pub fn filter_hosts(&mut self) {
        let query = self.search_query.trim();
        if query.is_empty() {
            self.filtered_hosts = (0..self.hosts.len())
                .map(|i| FilteredHost {
                    original_index: i,
                    score: 0,
                    matched_indices: Vec::new(),
                })
                .collect();
        } else {
            let matcher = SkimMatcherV2::default();
            let mut matches: Vec<FilteredHost> = self
                .hosts
                .iter()
                .enumerate()
                .filter_map(|(i, host)| {
                    if let Some((score, indices)) = matcher.fuzzy_indices(&host.name, query) {
                        return Some(FilteredHost {
                            original_index: i,
                            score,
                            matched_indices: indices,
                        });
                    }
                    // Hostname hits rank below alias hits and are not highlighted
                    matcher
                        .fuzzy_match(&host.hostname, query)
                        .map(|score| FilteredHost {
                            original_index: i,
                            score: score / 2,
                            matched_indices: Vec::new(),
                        })
                })
                .collect();
            matches.sort_by(|a, b| b.score.cmp(&a.score));
            self.filtered_hosts = matches;
        }

        if self.search_selected >= self.filtered_hosts.len() {
            self.search_selected = 0;
        }

        match self.input_mode {
            InputMode::Search if self.filtered_hosts.is_empty() => {
                self.host_list_state.select(None)
            }
            InputMode::Search => self.host_list_state.select(Some(self.search_selected)),
            _ => self.host_list_state.select(Some(self.selected_host)),
        }
    }

    pub fn get_current_selected_host(&self) -> Option<&SshHost> {
        match self.input_mode {
            InputMode::Search => self
                .filtered_hosts
                .get(self.search_selected)
                .and_then(|fh| self.hosts.get(fh.original_index)),
            _ => self
                .hosts_in_current_group
                .get(self.selected_host)
                .and_then(|&idx| self.hosts.get(idx)),
        }
    }

    pub fn search_select_next(&mut self) {
        if self.filtered_hosts.is_empty() {
            return;
        }
        self.search_selected = (self.search_selected + 1) % self.filtered_hosts.len();
        self.host_list_state.select(Some(self.search_selected));
    }

    pub fn search_select_previous(&mut self) {
        if self.filtered_hosts.is_empty() {
            return;
        }
        let total = self.filtered_hosts.len();
        self.search_selected = (self.search_selected + total - 1) % total;
        self.host_list_state.select(Some(self.search_selected));
    }

    pub fn enter_search_mode(&mut self) {
        self.input_mode = InputMode::Search;
        self.active_panel = ActivePanel::Hosts;
        self.search_query.clear();
        self.search_selected = 0;
        self.filter_hosts();
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.input_mode = InputMode::Normal;
        self.search_selected = 0;
        self.filtered_hosts.clear();
        if self.hosts_in_current_group.is_empty() {
            self.host_list_state.select(None);
        } else {
            self.host_list_state.select(Some(self.selected_host));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sshm::models::HostGroup;
    use tempfile::TempDir;

    fn app_with(config: &str) -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let ssh_config = dir.path().join("config");
        std::fs::write(&ssh_config, config).unwrap();
        let app = App::new(AppConfig::default(), ssh_config);
        (dir, app)
    }

    #[test]
    fn test_groups_follow_present_hosts() {
        let (_dir, app) = app_with(
            "Host gh\n  HostName github.com\nHost box\n  HostName 192.168.1.4\n",
        );
        assert_eq!(
            app.groups,
            vec![
                GroupFilter::All,
                GroupFilter::Only(HostGroup::Local),
                GroupFilter::Only(HostGroup::Github),
            ]
        );
        assert_eq!(app.hosts_in_current_group, vec![0, 1]);
    }

    #[test]
    fn test_select_group_filters_hosts() {
        let (_dir, mut app) = app_with(
            "Host gh\n  HostName github.com\nHost box\n  HostName 192.168.1.4\n",
        );
        app.active_panel = ActivePanel::Groups;
        app.select_next();
        assert_eq!(app.groups[app.selected_group], GroupFilter::Only(HostGroup::Local));
        assert_eq!(app.hosts_in_current_group, vec![1]);
        assert_eq!(app.get_current_selected_host().unwrap().name, "box");
    }

    #[test]
    fn test_fuzzy_search_ranks_alias_matches() {
        let (_dir, mut app) = app_with(
            "Host prod-web\n  HostName 203.0.113.1\nHost staging\n  HostName 203.0.113.2\n",
        );
        app.enter_search_mode();
        app.search_query = "pw".to_string();
        app.filter_hosts();

        assert_eq!(app.filtered_hosts.len(), 1);
        assert_eq!(app.get_current_selected_host().unwrap().name, "prod-web");
        assert!(!app.filtered_hosts[0].matched_indices.is_empty());
    }

    #[test]
    fn test_missing_config_opens_empty() {
        let dir = TempDir::new().unwrap();
        let app = App::new(AppConfig::default(), dir.path().join("nope"));
        assert!(app.hosts.is_empty());
        assert!(app.status_message.is_some());
    }
}
