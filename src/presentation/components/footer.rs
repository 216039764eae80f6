use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::super::view::UiContext;

pub fn render_footer(frame: &mut Frame<'_>, area: Rect, ctx: &UiContext<'_>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(2)])
        .split(area);

    let actions = ctx.help.unwrap_or(" ");
    let actions_widget = Paragraph::new(format!("Actions: {actions}"))
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(actions_widget, rows[0]);

    let mut status = ctx.status_message.to_string();
    if ctx.dirty {
        status.push_str(" • unsaved changes");
    }
    status.push_str(" • focus: ");
    status.push_str(ctx.focus.label());
    if status.trim().is_empty() {
        status = "Ready".to_string();
    }

    let mode = if ctx.insert_mode {
        Span::styled("[INSERT]", Style::default().fg(Color::Green))
    } else {
        Span::styled("[NORMAL]", Style::default().fg(Color::Blue))
    };
    let mut spans = vec![Span::raw("Status: "), Span::raw(status), Span::raw(" "), mode];
    if ctx.flash {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            "[copied]",
            Style::default().fg(Color::Black).bg(Color::Green),
        ));
    }

    let status_widget = Paragraph::new(Line::from(spans))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::NONE));
    frame.render_widget(status_widget, rows[1]);
}
