use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::Backend;
use ratatui::Terminal;

use crate::app::types::{ActivePanel, EditorPhase, InputMode};
use crate::app::App;

impl App {
    pub fn handle_key<B: Backend>(&mut self, key: KeyEvent, terminal: &mut Terminal<B>) -> Result<()> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }

        if self.editor.is_some() {
            return self.handle_editor_key(key, terminal);
        }

        match self.input_mode {
            InputMode::Help => self.handle_help_key(key),
            InputMode::Search => self.handle_search_key(key, terminal),
            InputMode::Normal => self.handle_normal_key(key, terminal),
        }
    }

    fn handle_normal_key<B: Backend>(&mut self, key: KeyEvent, terminal: &mut Terminal<B>) -> Result<()> {
        match key.code {
            KeyCode::Char('q') => self.handle_key_q(),
            KeyCode::Enter => self.handle_key_enter(terminal),
            KeyCode::Char('/') | KeyCode::Char('s') => {
                self.enter_search_mode();
                Ok(())
            }
            KeyCode::Char('e') => self.handle_key_e(),
            KeyCode::Char('r') => self.refresh_hosts(),
            KeyCode::Char('y') => self.copy_selected_host(),
            KeyCode::Char('?') => {
                self.input_mode = InputMode::Help;
                self.help_scroll_position = 0;
                Ok(())
            }
            KeyCode::Tab | KeyCode::Left | KeyCode::Right | KeyCode::Char('h') | KeyCode::Char('l') => {
                self.handle_key_tab()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next();
                Ok(())
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_previous();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn handle_search_key<B: Backend>(&mut self, key: KeyEvent, terminal: &mut Terminal<B>) -> Result<()> {
        match key.code {
            KeyCode::Esc => self.handle_key_esc(),
            KeyCode::Enter => self.handle_key_enter(terminal),
            KeyCode::Down => {
                self.search_select_next();
                Ok(())
            }
            KeyCode::Up => {
                self.search_select_previous();
                Ok(())
            }
            KeyCode::Backspace => {
                self.search_query.pop();
                self.filter_hosts();
                Ok(())
            }
            KeyCode::Char(c) => {
                self.search_query.push(c);
                self.search_selected = 0;
                self.filter_hosts();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn handle_help_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.help_scroll_position = self.help_scroll_position.saturating_add(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.help_scroll_position = self.help_scroll_position.saturating_sub(1);
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_editor_key<B: Backend>(&mut self, key: KeyEvent, terminal: &mut Terminal<B>) -> Result<()> {
        let confirming = matches!(
            self.editor.as_ref().map(|s| &s.phase),
            Some(EditorPhase::ConfirmingClose(_))
        );
        if confirming {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.editor_answer_close(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.editor_answer_close(false)
                }
                _ => {}
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.editor_save()
            }
            KeyCode::Esc | KeyCode::Char('q') => self.editor_request_close(),
            KeyCode::Down | KeyCode::Char('j') => self.editor_cursor_next(),
            KeyCode::Up | KeyCode::Char('k') => self.editor_cursor_previous(),
            KeyCode::PageDown => self.editor_scroll(10),
            KeyCode::PageUp => self.editor_scroll(-10),
            KeyCode::Enter => self.editor_select_file()?,
            KeyCode::Char('e') => self.editor_edit_active(terminal)?,
            KeyCode::Char('v') => self.editor_validate(),
            KeyCode::Char('s') => self.editor_save(),
            KeyCode::Char('R') => self.editor_reload(),
            KeyCode::Char('c') => self.editor_clear_warnings(),
            _ => {}
        }
        Ok(())
    }

    pub fn handle_key_enter<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        if self.active_panel == ActivePanel::Groups && self.input_mode == InputMode::Normal {
            self.switch_panel();
            return Ok(());
        }
        self.connect_selected_host(terminal)
    }

    pub fn handle_key_q(&mut self) -> Result<()> {
        self.should_quit = true;
        Ok(())
    }

    pub fn handle_key_e(&mut self) -> Result<()> {
        self.input_mode = InputMode::Normal;
        self.open_editor()
    }

    pub fn handle_key_esc(&mut self) -> Result<()> {
        self.clear_search();
        Ok(())
    }

    pub fn handle_key_tab(&mut self) -> Result<()> {
        self.switch_panel();
        Ok(())
    }
}
