use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use std::time::SystemTime;

use sshm::models::{HostGroup, SshHost};

use crate::app::{ActivePanel, App, AppKeymapExt, FilteredHost, InputMode};

pub fn draw<B: Backend>(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage(25), // Groups panel
                Constraint::Percentage(75), // Hosts panel
            ]
            .as_ref(),
        )
        .split(area);

    draw_groups_panel::<B>(f, app, chunks[0]);
    draw_hosts_panel::<B>(f, app, chunks[1]);
}

fn group_color(group: HostGroup) -> Color {
    match group {
        HostGroup::Direct => Color::LightBlue,
        HostGroup::Proxy => Color::LightMagenta,
        HostGroup::Local => Color::LightGreen,
        HostGroup::Github => Color::LightYellow,
    }
}

fn draw_groups_panel<B: Backend>(f: &mut Frame, app: &mut App, area: Rect) {
    let is_active = app.active_panel == ActivePanel::Groups;
    let title = format!(" {} Groups ", if is_active { ">" } else { " " });

    let items: Vec<ListItem> = app
        .groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let is_selected = i == app.selected_group;
            let count = app.hosts.iter().filter(|h| group.matches(h)).count();
            let style = if is_selected && is_active {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else if is_selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            ListItem::new(Line::from(vec![
                Span::styled(if is_selected { "> " } else { "  " }, style),
                Span::styled(format!("{} ({})", group.label(), count), style),
            ]))
        })
        .collect();

    let border_style = if is_active {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    );

    f.render_stateful_widget(list, area, &mut app.group_list_state);
}

fn draw_hosts_panel<B: Backend>(f: &mut Frame, app: &mut App, area: Rect) {
    let is_search_mode = app.input_mode == InputMode::Search;
    let is_active = app.active_panel == ActivePanel::Hosts;

    let (list_area, list_border_style, list_title) = if is_search_mode {
        let search_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
            .split(area);

        let search_block = Block::default()
            .borders(Borders::ALL)
            .title(" Search (Esc to exit) ")
            .border_style(Style::default().fg(Color::Yellow));

        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let cursor = if now % 1000 < 500 { "█" } else { " " };

        let search_paragraph = Paragraph::new(format!("{}{}", app.search_query, cursor))
            .style(Style::default().fg(Color::White))
            .block(search_block);
        f.render_widget(search_paragraph, search_chunks[0]);

        (
            search_chunks[1],
            Style::default().fg(Color::Yellow),
            format!(" Results ({} matches) ", app.filtered_hosts.len()),
        )
    } else {
        (
            area,
            if is_active {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            },
            format!(
                " {} Hosts: {} ",
                if is_active { ">" } else { " " },
                app.get_current_group().map(|g| g.label()).unwrap_or("all")
            ),
        )
    };

    let rows: Vec<(Vec<usize>, &SshHost)> = if is_search_mode {
        app.filtered_hosts
            .iter()
            .filter_map(|fh: &FilteredHost| {
                app.hosts
                    .get(fh.original_index)
                    .map(|h| (fh.matched_indices.clone(), h))
            })
            .collect()
    } else {
        app.hosts_in_current_group
            .iter()
            .filter_map(|&idx| app.hosts.get(idx).map(|h| (Vec::new(), h)))
            .collect()
    };

    let selected = if is_search_mode {
        app.search_selected
    } else {
        app.selected_host
    };
    let accent = if is_search_mode {
        Color::Yellow
    } else {
        Color::Green
    };

    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(i, (matched, host))| {
            let is_selected = i == selected && is_active;
            let text_style = if is_selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let mut spans = vec![Span::styled(
                if is_selected { "> " } else { "  " },
                text_style,
            )];

            // Highlight fuzzy matches per character
            for (idx, ch) in host.name.chars().enumerate() {
                let style = if matched.contains(&idx) {
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                } else {
                    text_style
                };
                spans.push(Span::styled(ch.to_string(), style));
            }

            spans.push(Span::styled(
                format!("  {}", host.connection_string()),
                text_style.fg(if is_selected { Color::Black } else { Color::Gray }),
            ));
            if let Some(jump) = &host.proxy_jump {
                spans.push(Span::styled(
                    format!(" via {}", jump),
                    text_style.fg(if is_selected { Color::Black } else { Color::Gray }),
                ));
            }
            spans.push(Span::styled(
                format!(" [{}]", host.group),
                text_style.fg(if is_selected {
                    Color::Black
                } else {
                    group_color(host.group)
                }),
            ));
            if host.credential_agent {
                spans.push(Span::styled(" [agent]", text_style.fg(Color::Cyan)));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = if items.is_empty() {
        let message = if is_search_mode {
            format!("No results for '{}'", app.search_query)
        } else {
            "No hosts in this group".to_string()
        };
        List::new(vec![ListItem::new(Span::styled(
            message,
            Style::default().fg(Color::Gray).not_italic(),
        ))])
    } else {
        List::new(items)
    };

    let list_widget = list.block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(list_border_style)
            .title(list_title),
    );

    f.render_stateful_widget(list_widget, list_area, &mut app.host_list_state);
}
