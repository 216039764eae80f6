use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use super::super::view::OverlayRender;
use super::layout::percent_rect;

pub fn render_overlay(frame: &mut Frame<'_>, overlay: &OverlayRender<'_>) {
    match overlay {
        OverlayRender::Fuzzy {
            title,
            query,
            items,
            selected,
        } => render_fuzzy(frame, title, query, items, *selected),
        OverlayRender::Files {
            title,
            dir,
            entries,
            selected,
            error,
        } => render_files(frame, title, dir, entries, *selected, *error),
    }
}

fn highlighted_list<'a>(items: Vec<ListItem<'a>>, title: String) -> List<'a> {
    List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ")
}

fn render_fuzzy(frame: &mut Frame<'_>, title: &str, query: &str, items: &[&str], selected: usize) {
    let area = percent_rect(frame.area(), 60, 60);
    frame.render_widget(Clear, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    let prompt = Paragraph::new(Line::from(vec![
        Span::styled("› ", Style::default().fg(Color::Cyan)),
        Span::raw(query.to_string()),
    ]))
    .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(prompt, rows[0]);
    frame.set_cursor_position((query_cursor_x(rows[0], query), rows[0].y + 1));

    let list_items: Vec<ListItem<'_>> = if items.is_empty() {
        let hint = if query.trim().is_empty() {
            "No suggestions".to_string()
        } else {
            format!("Enter uses \"{}\"", query.trim())
        };
        vec![ListItem::new(hint).style(Style::default().fg(Color::DarkGray))]
    } else {
        items.iter().map(|item| ListItem::new(item.to_string())).collect()
    };
    let mut state = ListState::default();
    if !items.is_empty() {
        state.select(Some(selected.min(items.len() - 1)));
    }
    let list = highlighted_list(list_items, format!("{} matches", items.len()));
    frame.render_stateful_widget(list, rows[1], &mut state);

    let hint = Paragraph::new("Enter select • Esc cancel • ↑/↓ move")
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(hint, rows[2]);
}

fn render_files(
    frame: &mut Frame<'_>,
    title: &str,
    dir: &str,
    entries: &[&str],
    selected: usize,
    error: Option<&str>,
) {
    let area = percent_rect(frame.area(), 70, 70);
    frame.render_widget(Clear, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    let header = Paragraph::new(dir.to_string()).style(Style::default().fg(Color::Cyan));
    frame.render_widget(header, rows[0]);

    if let Some(error) = error {
        let widget = Paragraph::new(error.to_string())
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title(title.to_string()));
        frame.render_widget(widget, rows[1]);
    } else {
        let items: Vec<ListItem<'_>> = if entries.is_empty() {
            vec![ListItem::new("No matching files").style(Style::default().fg(Color::DarkGray))]
        } else {
            entries
                .iter()
                .map(|entry| ListItem::new(entry.to_string()))
                .collect()
        };
        let mut state = ListState::default();
        if !entries.is_empty() {
            state.select(Some(selected.min(entries.len() - 1)));
        }
        let list = highlighted_list(items, title.to_string());
        frame.render_stateful_widget(list, rows[1], &mut state);
    }

    let hint = Paragraph::new("Enter open • Backspace up • Esc cancel")
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(hint, rows[2]);
}

/// Column after the border, the prompt marker and the query, kept inside the box.
fn query_cursor_x(area: Rect, query: &str) -> u16 {
    let typed = u16::try_from(query.chars().count()).unwrap_or(u16::MAX);
    area.x
        .saturating_add(typed.saturating_add(3))
        .min(area.right().saturating_sub(2))
}
