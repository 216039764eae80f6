use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::{
    app::ErrorRow,
    form::{FieldRegistry, Focus, SlotId},
};

use super::components::{render_footer, render_form, render_overlay, render_submission};

pub const MIN_WIDTH: u16 = 60;
pub const MIN_HEIGHT: u16 = 16;

pub struct UiContext<'a> {
    pub registry: &'a FieldRegistry,
    pub slots: &'a [SlotId],
    pub focus: Focus,
    pub insert_mode: bool,
    pub status_message: &'a str,
    pub help: Option<&'a str>,
    pub validation_hint: Option<&'a str>,
    pub dirty: bool,
    pub flash: bool,
    pub submission: SubmissionRender<'a>,
    pub overlay: Option<OverlayRender<'a>>,
}

pub enum SubmissionRender<'a> {
    Idle,
    Submitting,
    Duplicate { run_id: &'a str },
    Error { message: &'a str, row: ErrorRow },
    Success { run_id: &'a str },
}

pub enum OverlayRender<'a> {
    Fuzzy {
        title: &'a str,
        query: &'a str,
        items: Vec<&'a str>,
        selected: usize,
    },
    Files {
        title: &'static str,
        dir: String,
        entries: Vec<&'a str>,
        selected: usize,
        error: Option<&'a str>,
    },
}

pub fn draw(frame: &mut Frame<'_>, ctx: UiContext<'_>) {
    let area = frame.area();
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let placeholder = Paragraph::new(format!(
            "Terminal too small ({}×{}). Resize to at least {MIN_WIDTH}×{MIN_HEIGHT}.",
            area.width, area.height
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(placeholder, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(7), Constraint::Length(4)])
        .split(area);

    let cursor_enabled = ctx.overlay.is_none() && matches!(
        ctx.submission,
        SubmissionRender::Idle | SubmissionRender::Success { .. }
    );
    render_form(frame, chunks[0], &ctx, cursor_enabled);
    render_footer(frame, chunks[1], &ctx);

    if let Some(overlay) = &ctx.overlay {
        render_overlay(frame, overlay);
    } else {
        render_submission(frame, &ctx.submission);
    }
}
