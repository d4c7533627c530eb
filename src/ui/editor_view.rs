use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, EditorPhase};
use crate::ui::centered_rect;

pub fn draw<B: Backend>(f: &mut Frame, app: &mut App, area: Rect) {
    let Some(state) = app.editor.as_mut() else {
        return;
    };
    let session = state.phase.session();

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(area);

    // File list
    let items: Vec<ListItem> = session
        .files()
        .iter()
        .map(|file| {
            let dirty = session.buffer(&file.path).is_some_and(|b| b.is_dirty());
            let is_active = file.path == session.active_path();

            let name_style = if is_active {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let mut spans = vec![
                Span::styled(if dirty { "* " } else { "  " }, Style::default().fg(Color::Yellow)),
                Span::styled(file.name.clone(), name_style),
                Span::styled(
                    format!(" ({} hosts)", file.host_count),
                    Style::default().fg(Color::Gray),
                ),
            ];
            if file.is_main {
                spans.push(Span::styled(" main", Style::default().fg(Color::Cyan)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let files = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Config files "))
        .highlight_style(Style::default().bg(Color::DarkGray));

    // Right side: optional error banner, buffer, warnings
    let has_error = state.error.is_some();
    let warnings_height = if state.warnings.is_empty() {
        0
    } else {
        (state.warnings.len() as u16 + 2).min(10)
    };
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(if has_error { 3 } else { 0 }),
                Constraint::Min(3),
                Constraint::Length(warnings_height),
            ]
            .as_ref(),
        )
        .split(chunks[1]);

    if let Some(error) = &state.error {
        let banner = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red))
                    .title(" Error "),
            );
        f.render_widget(banner, right[0]);
    }

    if let Some(buffer) = session.active_buffer() {
        let lines: Vec<Line> = buffer
            .content()
            .lines()
            .enumerate()
            .map(|(i, line)| {
                Line::from(vec![
                    Span::styled(format!("{:>4} ", i + 1), Style::default().fg(Color::DarkGray)),
                    Span::raw(line.to_string()),
                ])
            })
            .collect();

        let title = format!(
            " {}{} ",
            buffer.file().name,
            if buffer.is_dirty() { " [modified]" } else { "" }
        );
        let border_style = if buffer.is_dirty() {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Green)
        };
        let view = Paragraph::new(lines)
            .scroll((state.scroll, 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(title),
            );
        f.render_widget(view, right[1]);
    }

    if !state.warnings.is_empty() {
        let items: Vec<ListItem> = state
            .warnings
            .iter()
            .map(|w| ListItem::new(Span::styled(w.clone(), Style::default().fg(Color::Yellow))))
            .collect();
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Warnings ({}) [c] clear ", state.warnings.len())),
        );
        f.render_widget(list, right[2]);
    }

    f.render_stateful_widget(files, chunks[0], &mut state.file_list_state);
}

/// y/n prompt listing the files whose edits would be lost.
pub fn draw_close_prompt<B: Backend>(f: &mut Frame, app: &App) {
    let Some(EditorPhase::ConfirmingClose(pending)) = app.editor.as_ref().map(|s| &s.phase) else {
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            "Discard unsaved changes?",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for path in pending.dirty_files() {
        lines.push(Line::from(Span::styled(
            format!("  {}", path.display()),
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("[y]", Style::default().fg(Color::Red)),
        Span::raw(" Discard and close   "),
        Span::styled("[n]", Style::default().fg(Color::Green)),
        Span::raw(" Keep editing"),
    ]));

    let area = centered_rect(60, 40, f.size());
    let popup = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Close editor "),
    );

    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}
