use ratatui::{
    backend::Backend,
    layout::{Alignment, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;

const STATUS_TTL_SECS: u64 = 5;

pub fn draw_status_bar<B: Backend>(f: &mut Frame, app: &mut App, area: Rect) {
    let Some((message, timestamp)) = &app.status_message else {
        return;
    };

    if timestamp.elapsed().as_secs() >= STATUS_TTL_SECS {
        app.clear_status_message();
        return;
    }

    let lower = message.to_lowercase();
    let style = if lower.contains("error") || lower.contains("failed") {
        Style::default().fg(Color::Red)
    } else if lower.starts_with("saved") || lower.starts_with("copied") || lower.contains("reloaded") {
        Style::default().fg(Color::Green)
    } else if lower.contains("warning") || lower.contains("unsaved") {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Cyan)
    };

    let paragraph = Paragraph::new(message.as_str())
        .style(style)
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}
