pub mod editor_view;
pub mod footer;
pub mod help_popup;
pub mod hosts_list;
pub mod status_bar;

use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::app::{App, AppKeymapExt, InputMode};

pub fn draw<B: Backend>(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Min(3),    // Main content
                Constraint::Length(1), // Status bar
                Constraint::Length(1), // Footer
            ]
            .as_ref(),
        )
        .split(f.size());

    if app.is_editing() {
        editor_view::draw::<B>(f, app, chunks[0]);
    } else {
        hosts_list::draw::<B>(f, app, chunks[0]);
    }

    status_bar::draw_status_bar::<B>(f, app, chunks[1]);
    footer::draw_footer::<B>(f, app, chunks[2]);

    if app.input_mode == InputMode::Help && !app.is_editing() {
        help_popup::render_help_popup::<B>(f, app);
    }
    editor_view::draw_close_prompt::<B>(f, app);
}

/// helper function to create a centered rect using up certain percentage of the available rect `r`
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}
