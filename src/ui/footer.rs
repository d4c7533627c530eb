use crate::app::{App, EditorPhase, InputMode};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

pub fn draw_footer<B: Backend>(f: &mut Frame, app: &App, area: Rect) {
    let footer = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let (nav_text, action_text) = match (app.editor.as_ref().map(|s| &s.phase), app.input_mode) {
        (Some(EditorPhase::ConfirmingClose(_)), _) => ("Unsaved changes", "[y] Discard  [n] Keep editing"),
        (Some(EditorPhase::Editing(_)), _) => (
            "↑/k ↓/j: Files  [Enter] Open  [e] Edit  PgUp/PgDn: Scroll",
            "[v] Validate [s] Save [R] Reload [q] Close",
        ),
        (None, InputMode::Normal) => (
            "↑/k ↓/j: Move  [Tab] Panel  [Enter] Connect  [/] Search",
            "[y] Copy [e] Edit [r] Reload [?] Help [q] Quit",
        ),
        (None, InputMode::Search) => ("↑ ↓: Move  [Enter] Connect", "[Esc] Exit Search  Type to filter"),
        (None, InputMode::Help) => ("↑/k ↓/j: Scroll", "[?/Esc] Close help"),
    };

    let nav_help = Paragraph::new(nav_text).style(Style::default().fg(Color::Gray));
    let action_help = Paragraph::new(action_text)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Right);

    f.render_widget(nav_help, footer[0]);
    f.render_widget(action_help, footer[1]);
}
