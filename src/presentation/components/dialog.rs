use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::ErrorRow;

use super::super::view::SubmissionRender;
use super::layout::{percent_rect, popup_rect};

pub fn render_submission(frame: &mut Frame<'_>, submission: &SubmissionRender<'_>) {
    match submission {
        SubmissionRender::Idle => {}
        SubmissionRender::Submitting => render_submitting(frame),
        SubmissionRender::Duplicate { run_id } => render_duplicate(frame, run_id),
        SubmissionRender::Error { message, row } => render_error(frame, message, *row),
        SubmissionRender::Success { run_id } => render_success(frame, run_id),
    }
}

fn render_submitting(frame: &mut Frame<'_>) {
    let area = popup_rect(frame.area(), 40, 5);
    frame.render_widget(Clear, area);
    let widget = Paragraph::new(vec![
        Line::from("Submitting run…"),
        Line::from(Span::styled(
            "Esc to cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(widget, area);
}

fn render_duplicate(frame: &mut Frame<'_>, run_id: &str) {
    let area = popup_rect(frame.area(), 56, 7);
    frame.render_widget(Clear, area);
    let widget = Paragraph::new(vec![
        Line::from(format!("This task was already submitted as run {run_id}.")),
        Line::from("Submit it again anyway?"),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y] ", Style::default().fg(Color::Green)),
            Span::raw("submit again   "),
            Span::styled("[n] ", Style::default().fg(Color::Red)),
            Span::raw("back to form"),
        ]),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Duplicate run")
            .border_style(Style::default().fg(Color::Yellow)),
    );
    frame.render_widget(widget, area);
}

fn render_error(frame: &mut Frame<'_>, message: &str, row: ErrorRow) {
    let area = percent_rect(frame.area(), 70, 50);
    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Submission failed")
        .border_style(Style::default().fg(Color::Red));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(2),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let selected = Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let message_style = if row == ErrorRow::Message {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let message_widget = Paragraph::new(message.to_string())
        .wrap(Wrap { trim: false })
        .style(message_style);
    frame.render_widget(message_widget, rows[0]);

    let back_style = if row == ErrorRow::BackToForm {
        selected
    } else {
        Style::default().fg(Color::Gray)
    };
    frame.render_widget(
        Paragraph::new(Span::styled("[ Back to form ]", back_style)).alignment(Alignment::Center),
        rows[1],
    );

    let hint = Paragraph::new("j/k move • y copy • Enter/Esc back • r retry")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(hint, rows[2]);
}

fn render_success(frame: &mut Frame<'_>, run_id: &str) {
    let area = popup_rect(frame.area(), 44, 5);
    frame.render_widget(Clear, area);
    let widget = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("Run {run_id} created"),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "press any key to continue",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(widget, area);
}
