use ratatui::{
    backend::Backend,
    layout::Margin,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

use crate::app::App;
use crate::ui::centered_rect;

pub fn render_help_popup<B: Backend>(f: &mut Frame, app: &mut App) {
    let block = Block::default()
        .title("Keyboard Shortcuts")
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::White));

    let area = centered_rect(70, 80, f.size());
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let text = get_help_text();
    let line_count = text.lines.len();

    let inner_area = area.inner(&Margin {
        vertical: 1,
        horizontal: 1,
    });

    // Keep the last page reachable but no further
    let max_scroll = line_count.saturating_sub(inner_area.height as usize) as u16;
    app.help_scroll_position = app.help_scroll_position.min(max_scroll);

    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(Color::White))
        .scroll((app.help_scroll_position, 0));
    f.render_widget(paragraph, inner_area);

    if line_count > inner_area.height as usize {
        let mut scrollbar_state =
            ScrollbarState::new(line_count).position(app.help_scroll_position as usize);

        f.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓")),
            inner_area,
            &mut scrollbar_state,
        );
    }
}

fn heading(title: &str) -> Line<'_> {
    Line::from(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan),
    ))
}

fn entry<'a>(keys: &'a str, description: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", keys), Style::default().fg(Color::Green)),
        Span::raw(format!("- {}", description)),
    ])
}

fn get_help_text<'a>() -> Text<'a> {
    Text::from(vec![
        heading("Host Browser"),
        entry("Enter", "Open selected host in a terminal"),
        entry("Tab, ←, →", "Switch between groups and hosts"),
        entry("j, ↓", "Move down"),
        entry("k, ↑", "Move up"),
        entry("/, s", "Search hosts"),
        entry("y", "Copy ssh command"),
        entry("r", "Reload SSH config"),
        entry("e", "Edit SSH config files"),
        entry("q", "Quit"),
        Line::from(""),
        heading("Search"),
        entry("Esc", "Back to normal mode"),
        entry("Enter", "Open selected host"),
        entry("↑, ↓", "Move selection"),
        entry("Backspace", "Delete a character"),
        Line::from(""),
        heading("Config Editor"),
        entry("j, k", "Move in the file list"),
        entry("Enter", "Open file under cursor"),
        entry("e", "Edit active file in $EDITOR"),
        entry("v", "Validate active file"),
        entry("s, Ctrl+S", "Save active file (keeps .bak)"),
        entry("R", "Reload active file from disk"),
        entry("c", "Clear warnings"),
        entry("PgUp, PgDn", "Scroll the file"),
        entry("Esc, q", "Close editor"),
        Line::from(""),
        heading("Help"),
        entry("?, Esc", "Close help"),
        entry("↑, ↓", "Scroll"),
    ])
}
