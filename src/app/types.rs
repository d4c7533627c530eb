use std::time::Instant;

use ratatui::widgets::ListState;

use sshm::config::AppConfig;
use sshm::models::{HostGroup, SshHost};
use sshm::{EditSession, LocalBackend, PendingClose};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePanel {
    Groups,
    Hosts,
}

/// Entry of the groups panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupFilter {
    All,
    Only(HostGroup),
}

impl GroupFilter {
    pub fn label(&self) -> &'static str {
        match self {
            GroupFilter::All => "all",
            GroupFilter::Only(group) => group.as_str(),
        }
    }

    pub fn matches(&self, host: &SshHost) -> bool {
        match self {
            GroupFilter::All => true,
            GroupFilter::Only(group) => host.group == *group,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilteredHost {
    pub original_index: usize,
    pub score: i64,
    pub matched_indices: Vec<usize>,
}

#[derive(Debug)]
pub enum EditorPhase {
    Editing(EditSession<LocalBackend>),
    ConfirmingClose(PendingClose<LocalBackend>),
}

impl EditorPhase {
    pub fn session(&self) -> &EditSession<LocalBackend> {
        match self {
            EditorPhase::Editing(session) => session,
            EditorPhase::ConfirmingClose(pending) => pending.session(),
        }
    }
}

/// Config editor screen. Present only while the editor is open.
#[derive(Debug)]
pub struct EditorState {
    pub phase: EditorPhase,
    pub file_list_state: ListState,
    /// Result of the last validate/save; cleared with `c`.
    pub warnings: Vec<String>,
    /// Shown until the next editor action.
    pub error: Option<String>,
    pub scroll: u16,
}

#[derive(Debug)]
pub struct App {
    pub should_quit: bool,
    pub config: AppConfig,
    pub backend: LocalBackend,

    pub hosts: Vec<SshHost>,
    pub input_mode: InputMode,
    pub active_panel: ActivePanel,
    pub status_message: Option<(String, Instant)>,

    // Group State
    pub groups: Vec<GroupFilter>,
    pub selected_group: usize,
    pub hosts_in_current_group: Vec<usize>,
    pub selected_host: usize,

    // Search Mode
    pub search_query: String,
    pub filtered_hosts: Vec<FilteredHost>,
    pub search_selected: usize,

    pub help_scroll_position: u16,

    // Editor
    pub editor: Option<EditorState>,

    pub host_list_state: ListState,
    pub group_list_state: ListState,
}
