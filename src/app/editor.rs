//! Config editor screen: drives an [`EditSession`] from key presses.

use anyhow::{bail, Context, Result};
use ratatui::{backend::Backend, widgets::ListState, Terminal};
use std::io::Write;
use std::path::Path;
use std::process::Command;

use sshm::error::SessionError;
use sshm::{CloseOutcome, EditSession, ReloadOutcome};

use crate::app::types::{EditorPhase, EditorState};
use crate::app::App;

impl App {
    pub fn open_editor(&mut self) -> Result<()> {
        let session = EditSession::open(self.backend.clone()).context("Failed to open editor")?;

        let mut file_list_state = ListState::default();
        file_list_state.select(Some(0));
        let warnings: Vec<String> = session
            .discovery_warnings()
            .iter()
            .map(|w| w.to_string())
            .collect();

        self.editor = Some(EditorState {
            phase: EditorPhase::Editing(session),
            file_list_state,
            warnings,
            error: None,
            scroll: 0,
        });
        self.set_status("Editing SSH config");
        Ok(())
    }

    fn session_mut(&mut self) -> Option<&mut EditSession<sshm::LocalBackend>> {
        match self.editor.as_mut().map(|state| &mut state.phase) {
            Some(EditorPhase::Editing(session)) => Some(session),
            _ => None,
        }
    }

    pub fn editor_cursor_next(&mut self) {
        self.move_editor_cursor(1);
    }

    pub fn editor_cursor_previous(&mut self) {
        self.move_editor_cursor(-1);
    }

    fn move_editor_cursor(&mut self, delta: isize) {
        let Some(state) = self.editor.as_mut() else {
            return;
        };
        let total = state.phase.session().files().len();
        if total == 0 {
            return;
        }
        let current = state.file_list_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(total as isize) as usize;
        state.file_list_state.select(Some(next));
    }

    pub fn editor_scroll(&mut self, delta: i32) {
        if let Some(state) = self.editor.as_mut() {
            state.scroll = (state.scroll as i32 + delta).max(0) as u16;
        }
    }

    /// Make the file under the cursor the active buffer.
    pub fn editor_select_file(&mut self) -> Result<()> {
        let Some(state) = self.editor.as_mut() else {
            return Ok(());
        };
        let index = state.file_list_state.selected().unwrap_or(0);
        let Some(path) = state
            .phase
            .session()
            .files()
            .get(index)
            .map(|f| f.path.clone())
        else {
            return Ok(());
        };

        state.error = None;
        if let EditorPhase::Editing(session) = &mut state.phase {
            if let Err(e) = session.select_file(&path) {
                state.error = Some(e.to_string());
                return Ok(());
            }
            state.scroll = 0;
        }
        Ok(())
    }

    /// Edit the active buffer in the external editor. The result stays in
    /// memory until saved.
    pub fn editor_edit_active<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let Some((path, name, content)) = self.session_mut().and_then(|session| {
            session.active_buffer().map(|b| {
                (
                    b.path().to_path_buf(),
                    b.file().name.clone(),
                    b.content().to_string(),
                )
            })
        }) else {
            return Ok(());
        };
        let command = self.config.editor_command();

        self.suspend_tui(terminal)?;
        let edited = run_external_editor(&command, &content);
        self.resume_tui(terminal)?;

        let edited = match edited {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("External editor failed: {:#}", e);
                self.set_editor_error(format!("{:#}", e));
                return Ok(());
            }
        };

        if edited == content {
            self.set_status(format!("No changes to {}", name));
            return Ok(());
        }

        self.apply_edit(&path, edited);
        self.set_status(format!("Edited {} (unsaved)", name));
        Ok(())
    }

    fn apply_edit(&mut self, path: &Path, text: String) {
        let result = match self.session_mut() {
            Some(session) => session.update_content(path, text),
            None => return,
        };
        if let Err(e) = result {
            self.set_editor_error(e.to_string());
        }
    }

    pub fn editor_validate(&mut self) {
        let Some(state) = self.editor.as_mut() else {
            return;
        };
        state.error = None;
        match state.phase.session().validate(None) {
            Ok(warnings) => {
                let message = if warnings.is_empty() {
                    "No problems found".to_string()
                } else {
                    format!("{} warnings", warnings.len())
                };
                state.warnings = warnings;
                self.set_status(message);
            }
            Err(e) => state.error = Some(e.to_string()),
        }
    }

    pub fn editor_save(&mut self) {
        let Some(state) = self.editor.as_mut() else {
            return;
        };
        let EditorPhase::Editing(session) = &mut state.phase else {
            return;
        };
        state.error = None;

        let name = session
            .active_buffer()
            .map(|b| b.file().name.clone())
            .unwrap_or_default();

        match session.save(None) {
            Ok(warnings) => {
                let hosts = session.hosts().to_vec();
                let message = if warnings.is_empty() {
                    format!("Saved {}", name)
                } else {
                    format!("Saved {} with {} warnings", name, warnings.len())
                };
                state.warnings = warnings;
                self.replace_hosts(hosts);
                self.set_status(message);
            }
            Err(SessionError::NotDirty(_)) => {
                self.set_status(format!("{} has no unsaved changes", name));
            }
            Err(e) => {
                state.error = Some(e.to_string());
            }
        }
    }

    pub fn editor_reload(&mut self) {
        let Some(state) = self.editor.as_mut() else {
            return;
        };
        let EditorPhase::Editing(session) = &mut state.phase else {
            return;
        };
        state.error = None;

        match session.reload(None) {
            Ok(ReloadOutcome::Reloaded) => self.set_status("Reloaded from disk"),
            Ok(ReloadOutcome::KeptDirty) => {
                self.set_status("Unsaved changes kept; save or discard them first")
            }
            Err(e) => state.error = Some(e.to_string()),
        }
    }

    pub fn editor_clear_warnings(&mut self) {
        if let Some(state) = self.editor.as_mut() {
            state.warnings.clear();
        }
    }

    /// Close the editor, asking first when any buffer is dirty.
    pub fn editor_request_close(&mut self) {
        let Some(state) = self.editor.take() else {
            return;
        };
        let EditorState {
            phase,
            file_list_state,
            warnings,
            error,
            scroll,
        } = state;

        let session = match phase {
            EditorPhase::Editing(session) => session,
            pending @ EditorPhase::ConfirmingClose(_) => {
                self.editor = Some(EditorState {
                    phase: pending,
                    file_list_state,
                    warnings,
                    error,
                    scroll,
                });
                return;
            }
        };

        match session.close() {
            CloseOutcome::Closed => self.finish_editor(),
            CloseOutcome::ConfirmationRequired(pending) => {
                self.editor = Some(EditorState {
                    phase: EditorPhase::ConfirmingClose(pending),
                    file_list_state,
                    warnings,
                    error,
                    scroll,
                });
            }
        }
    }

    /// Answer the close prompt. `discard` drops every unsaved change.
    pub fn editor_answer_close(&mut self, discard: bool) {
        let Some(state) = self.editor.take() else {
            return;
        };
        let EditorState {
            phase,
            file_list_state,
            warnings,
            error,
            scroll,
        } = state;

        match phase {
            EditorPhase::ConfirmingClose(pending) if discard => {
                pending.confirm();
                self.finish_editor();
            }
            EditorPhase::ConfirmingClose(pending) => {
                self.editor = Some(EditorState {
                    phase: EditorPhase::Editing(pending.cancel()),
                    file_list_state,
                    warnings,
                    error,
                    scroll,
                });
                self.set_status("Close cancelled");
            }
            editing => {
                self.editor = Some(EditorState {
                    phase: editing,
                    file_list_state,
                    warnings,
                    error,
                    scroll,
                });
            }
        }
    }

    fn finish_editor(&mut self) {
        self.editor = None;
        if let Err(e) = self.refresh_hosts() {
            self.set_status(format!("Error: {:#}", e));
        }
    }

    fn set_editor_error(&mut self, message: String) {
        if let Some(state) = self.editor.as_mut() {
            state.error = Some(message);
        }
    }
}

/// Write `content` to a temp file, run `command <file>` and read it back.
fn run_external_editor(command: &str, content: &str) -> Result<String> {
    let mut parts = command.split_whitespace();
    let program = parts.next().context("Editor command is empty")?;

    let mut file = tempfile::Builder::new()
        .prefix("sshm-")
        .suffix(".sshconfig")
        .tempfile()
        .context("Failed to create temporary file")?;
    file.write_all(content.as_bytes())
        .context("Failed to write temporary file")?;
    file.flush().context("Failed to write temporary file")?;

    tracing::info!("Launching editor: {} {:?}", command, file.path());
    let status = Command::new(program)
        .args(parts)
        .arg(file.path())
        .status()
        .with_context(|| format!("Failed to launch editor {}", program))?;
    if !status.success() {
        bail!("Editor exited with {}", status);
    }

    // Some editors replace the file rather than writing in place
    std::fs::read_to_string(file.path()).context("Failed to read edited file")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sshm::config::AppConfig;
    use tempfile::TempDir;

    fn editor_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let ssh_config = dir.path().join("config");
        std::fs::write(&ssh_config, "Include extra\nHost a\n").unwrap();
        std::fs::write(dir.path().join("extra"), "Host b\n").unwrap();
        let mut app = App::new(AppConfig::default(), ssh_config);
        app.open_editor().unwrap();
        (dir, app)
    }

    #[test]
    fn test_clean_close_returns_to_browser() {
        let (_dir, mut app) = editor_app();
        app.editor_request_close();
        assert!(app.editor.is_none());
    }

    #[test]
    fn test_dirty_close_asks_then_cancel_keeps_edits() {
        let (dir, mut app) = editor_app();
        app.apply_edit(&dir.path().join("config"), "Host changed\n".to_string());

        app.editor_request_close();
        assert!(matches!(
            app.editor.as_ref().map(|s| &s.phase),
            Some(EditorPhase::ConfirmingClose(_))
        ));

        app.editor_answer_close(false);
        let state = app.editor.as_ref().unwrap();
        assert!(state.phase.session().is_dirty());
    }

    #[test]
    fn test_save_updates_browser_hosts() {
        let (dir, mut app) = editor_app();
        app.apply_edit(
            &dir.path().join("config"),
            "Include extra\nHost a\nHost gh\n  HostName github.com\n".to_string(),
        );

        app.editor_save();

        assert!(app.editor.as_ref().unwrap().error.is_none());
        assert_eq!(app.hosts.len(), 3);
        assert!(dir.path().join("config.bak").exists());
    }

    #[test]
    fn test_select_second_file() {
        let (dir, mut app) = editor_app();
        app.editor_cursor_next();
        app.editor_select_file().unwrap();
        let session = app.editor.as_ref().unwrap().phase.session();
        assert_eq!(session.active_path(), dir.path().join("extra"));
    }

    #[cfg(unix)]
    #[test]
    fn test_external_editor_round_trip() {
        // `true` leaves the file as written
        let text = run_external_editor("true", "Host a\n").unwrap();
        assert_eq!(text, "Host a\n");
        assert!(run_external_editor("", "Host a\n").is_err());
    }
}
