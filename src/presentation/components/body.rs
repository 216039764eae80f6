use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use crate::form::{FieldRegistry, Focus, SlotId};

use super::super::view::UiContext;

const LABEL_WIDTH: usize = 15;
/// Marker (2) + label + one space.
const VALUE_COLUMN: usize = LABEL_WIDTH + 3;

struct CursorHint {
    line: usize,
    column: u16,
}

pub fn render_form(frame: &mut Frame<'_>, area: Rect, ctx: &UiContext<'_>, enable_cursor: bool) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut focused_span = (0usize, 0usize);
    let mut cursor_hint = None;

    for slot in ctx.slots {
        let is_focused = ctx.focus == Focus::Slot(*slot);
        let start = lines.len();
        let hint = push_slot_lines(&mut lines, ctx.registry, *slot, is_focused, ctx.insert_mode);
        if is_focused {
            focused_span = (start, lines.len());
            cursor_hint = hint.map(|hint| CursorHint {
                line: start + hint.line,
                column: hint.column,
            });
        }
    }

    let inner_height = chunks[0].height.saturating_sub(2) as usize;
    let scroll = focused_span.1.saturating_sub(inner_height).min(focused_span.0);

    let mut title = String::from("New run");
    if let Some(loaded) = ctx.registry.loaded_config() {
        title.push_str(&format!(" • from {}", loaded.file_identity()));
    }
    let mode_badge = if ctx.insert_mode {
        Span::styled(" INSERT ", Style::default().fg(Color::Black).bg(Color::Green))
    } else {
        Span::styled(" NORMAL ", Style::default().fg(Color::Black).bg(Color::Blue))
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(vec![Span::raw(title), Span::raw(" "), mode_badge]));
    let inner = block.inner(chunks[0]);
    let form = Paragraph::new(lines)
        .scroll((scroll as u16, 0))
        .block(block);
    frame.render_widget(form, chunks[0]);

    render_buttons(frame, chunks[1], ctx);

    if enable_cursor
        && ctx.insert_mode
        && let Some(hint) = cursor_hint
        && hint.line >= scroll
        && hint.line - scroll < inner.height as usize
    {
        let y = inner.y.saturating_add((hint.line - scroll) as u16);
        let x = inner
            .x
            .saturating_add(hint.column)
            .min(inner.right().saturating_sub(1));
        frame.set_cursor_position((x, y));
    }
}

fn push_slot_lines(
    lines: &mut Vec<Line<'static>>,
    registry: &FieldRegistry,
    slot: SlotId,
    is_focused: bool,
    insert_mode: bool,
) -> Option<CursorHint> {
    let marker = if is_focused { "» " } else { "  " };
    let label_style = if is_focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let label = format!("{marker}{:<width$} ", slot.label(), width = LABEL_WIDTH);
    let value_style = if is_focused && insert_mode {
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let placeholder_style = Style::default().fg(Color::DarkGray);

    match slot {
        SlotId::ConfigLoader => {
            let value = registry.get(slot);
            let span = if value.is_empty() {
                Span::styled("Enter to browse for a task file", placeholder_style)
            } else {
                Span::styled(value.to_string(), value_style)
            };
            lines.push(Line::from(vec![Span::styled(label, label_style), span]));
            None
        }
        SlotId::RunTypeToggle => {
            let current = registry.run_type().as_str();
            let mut spans = vec![Span::styled(label, label_style)];
            for option in ["run", "plan"] {
                let (mark, style) = if option == current {
                    ("●", Style::default().fg(Color::Green))
                } else {
                    ("○", placeholder_style)
                };
                spans.push(Span::styled(format!("{mark} {option}  "), style));
            }
            lines.push(Line::from(spans));
            None
        }
        editable => {
            let buffer = registry.buffer(editable)?;
            if buffer.is_empty() {
                let text = match editable {
                    SlotId::Text(kind) => kind.placeholder(),
                    SlotId::Prompt => "what should the agent do?",
                    _ => "additional context",
                };
                lines.push(Line::from(vec![
                    Span::styled(label, label_style),
                    Span::styled(text, placeholder_style),
                ]));
                return Some(CursorHint {
                    line: 0,
                    column: VALUE_COLUMN as u16,
                });
            }

            let (cursor_line, cursor_col) = buffer.cursor_position();
            let mut hint = None;
            let indent = " ".repeat(VALUE_COLUMN);
            for (index, text) in buffer.as_str().split('\n').enumerate() {
                let prefix = if index == 0 {
                    Span::styled(label.clone(), label_style)
                } else {
                    Span::raw(indent.clone())
                };
                if index == cursor_line {
                    let before: String = text.chars().take(cursor_col).collect();
                    hint = Some(CursorHint {
                        line: index,
                        column: (VALUE_COLUMN + before.width()) as u16,
                    });
                }
                lines.push(Line::from(vec![
                    prefix,
                    Span::styled(text.to_string(), value_style),
                ]));
            }
            hint
        }
    }
}

fn render_buttons(frame: &mut Frame<'_>, area: Rect, ctx: &UiContext<'_>) {
    let button = |label: &'static str, focused: bool| {
        if focused {
            Span::styled(
                format!("[ {label} ]"),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(format!("[ {label} ]"), Style::default().fg(Color::Gray))
        }
    };
    let mut spans = vec![
        Span::raw("  "),
        button("Submit", ctx.focus == Focus::Submit),
        Span::raw("  "),
        button("Back", ctx.focus == Focus::Back),
    ];
    if let Some(hint) = ctx.validation_hint {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("⚠ {hint}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }
    let widget = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(widget, area);
}
