use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};
use crate::app::App;

const SEND_LABEL: &str = " [ Send ] ";

/// Hard-wrap a styled line at `width` characters, keeping span styles.
fn wrap_line(line: &Line<'static>, width: usize, out: &mut Vec<Line<'static>>) {
    let width = width.max(1);
    let mut row: Vec<Span<'static>> = Vec::new();
    let mut col = 0usize;

    for span in &line.spans {
        let mut buf = String::new();
        for c in span.content.chars() {
            if col == width {
                if !buf.is_empty() {
                    row.push(Span::styled(std::mem::take(&mut buf), span.style));
                }
                out.push(Line::from(std::mem::take(&mut row)));
                col = 0;
            }
            buf.push(c);
            col += 1;
        }
        if !buf.is_empty() {
            row.push(Span::styled(buf, span.style));
        }
    }

    out.push(Line::from(row));
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Input box width is known before its height; measure first so the layout fits it.
    app.chat.input_mut().set_width(area.width.saturating_sub(2) as usize);
    let input_height = app.chat.input().height().saturating_add(2);

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(input_height),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" chatbox ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.endpoint.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().fg(Color::Yellow);
    let mut spans = vec![
        Span::styled(" Enter", key_style),
        Span::raw(" send  "),
        Span::styled("Shift+Enter", key_style),
        Span::raw(" newline  "),
        Span::styled("Ctrl+S", key_style),
        Span::raw(" send  "),
        Span::styled("PgUp/PgDn", key_style),
        Span::raw(" scroll  "),
        Span::styled("Esc", key_style),
        Span::raw(" quit"),
    ];

    let in_flight = app.chat.turns_in_flight();
    if in_flight > 1 {
        spans.push(Span::styled(
            format!("  [{} waiting]", in_flight),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing
    app.chat_area = Some(area);

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Conversation ");

    let surface = app.chat.view();
    let text = if surface.is_empty() && !surface.is_typing() {
        Text::from(Span::styled(
            "Say something...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line<'static>> = Vec::new();
        for line in surface.lines() {
            wrap_line(line, inner_width, &mut lines);
        }

        if surface.is_typing() {
            lines.push(Line::from(Span::styled(
                "Bot",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("typing{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let content_rows = u16::try_from(text.lines.len()).unwrap_or(u16::MAX);
    let surface = app.chat.view_mut();
    surface.fit(content_rows, inner_height);

    let chat = Paragraph::new(text)
        .block(block)
        .scroll((surface.scroll(), 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let label_width = SEND_LABEL.chars().count() as u16;
    app.send_area = Some(Rect::new(
        area.x + area.width.saturating_sub(label_width + 1),
        area.y + area.height.saturating_sub(1),
        label_width.min(area.width),
        1,
    ));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Message ")
        .title_bottom(
            Line::from(Span::styled(SEND_LABEL, Style::default().fg(Color::Black).bg(Color::Yellow)))
                .right_aligned(),
        );

    let input = app.chat.input();
    let inner_height = area.height.saturating_sub(2);
    let (cursor_row, cursor_col) = input.cursor_position();

    // Keep the cursor row on screen when the box is taller than the terminal allows
    let scroll_offset = cursor_row.saturating_sub(inner_height.saturating_sub(1));

    let lines: Vec<Line> = input.visual_lines().into_iter().map(Line::from).collect();
    let paragraph = Paragraph::new(lines)
        .style(Style::default().fg(Color::Cyan))
        .block(block)
        .scroll((scroll_offset, 0));

    frame.render_widget(paragraph, area);

    frame.set_cursor_position((
        area.x + cursor_col + 1,
        area.y + cursor_row - scroll_offset + 1,
    ));
}
