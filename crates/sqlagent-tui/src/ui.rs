use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
};
use sqlagent_core::{Message, Role};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, BackendHealth};

const PLACEHOLDER: &str = "Ask a question (e.g., 'How many tracks are there?')";

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str, base: Style) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c != '*' || chars.peek() != Some(&'*') {
            current_text.push(c);
            continue;
        }
        chars.next();

        // Find closing **
        let mut bold_text = String::new();
        let mut found_close = false;
        while let Some(c) = chars.next() {
            if c == '*' && chars.peek() == Some(&'*') {
                chars.next();
                found_close = true;
                break;
            }
            bold_text.push(c);
        }

        if found_close && !bold_text.is_empty() {
            if !current_text.is_empty() {
                spans.push(Span::styled(std::mem::take(&mut current_text), base));
            }
            spans.push(Span::styled(bold_text, base.add_modifier(Modifier::BOLD)));
        } else {
            // No closing **, treat as literal
            current_text.push_str("**");
            current_text.push_str(&bold_text);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::styled(current_text, base));
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, transcript, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let health = match &app.health {
        BackendHealth::Checking => {
            Span::styled(" checking backend... ", Style::default().fg(Color::Yellow))
        }
        BackendHealth::Up { provider } => Span::styled(
            match provider {
                Some(p) => format!(" ● online ({}) ", p),
                None => " ● online ".to_string(),
            },
            Style::default().fg(Color::Green),
        ),
        BackendHealth::Down(_) => Span::styled(" ● offline ", Style::default().fg(Color::Red)),
    };

    let title = Line::from(vec![
        Span::styled(" 📊 AI SQL Agent ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.client.endpoint().to_string(), Style::default().fg(Color::Gray)),
        health,
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn push_block(lines: &mut Vec<Line<'static>>, heading: &'static str, body: &str, color: Color) {
    lines.push(Line::from(Span::styled(
        format!("  {}", heading),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )));
    for line in body.lines() {
        lines.push(Line::from(Span::styled(
            format!("  │ {}", line),
            Style::default().fg(color),
        )));
    }
}

fn message_lines(msg: &Message, lines: &mut Vec<Line<'static>>) {
    match msg.role {
        Role::User => {
            lines.push(Line::from(Span::styled(
                "You:",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            for line in msg.content.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        Role::Assistant => {
            let (label_color, body) = if msg.is_error {
                (Color::Red, Style::default().fg(Color::Red))
            } else {
                (Color::Yellow, Style::default())
            };
            lines.push(Line::from(Span::styled(
                "Agent:",
                Style::default().fg(label_color).add_modifier(Modifier::BOLD),
            )));
            for line in msg.content.lines() {
                lines.push(parse_markdown_line(line, body));
            }
            if let Some(sql) = &msg.sql {
                push_block(lines, "Generated SQL", sql, Color::Green);
            }
            if let Some(result) = &msg.result {
                push_block(lines, "Raw Result", result, Color::Blue);
            }
        }
    }
    lines.push(Line::default());
}

fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for msg in &app.chat.transcript {
        message_lines(msg, &mut lines);
    }

    if app.chat.busy {
        lines.push(Line::from(Span::styled(
            "Agent:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }
    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");
    let inner = block.inner(area);
    app.chat_height = inner.height;

    // Count rows with the same word wrapping the paragraph renders with
    let chat = Paragraph::new(Text::from(transcript_lines(app))).wrap(Wrap { trim: false });
    let rows = u16::try_from(chat.line_count(inner.width)).unwrap_or(u16::MAX);
    let max_scroll = rows.saturating_sub(inner.height);

    if app.follow_tail || app.chat_scroll >= max_scroll {
        app.chat_scroll = max_scroll;
        app.follow_tail = true;
    }

    let chat = chat.block(block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);

    if max_scroll > 0 {
        let mut scrollbar_state =
            ScrollbarState::new(usize::from(max_scroll)).position(usize::from(app.chat_scroll));
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}

/// Display column of the `cursor`-th character; wide glyphs take two cells.
fn cursor_column(input: &str, cursor: usize) -> u16 {
    let width: usize = input.chars().take(cursor).filter_map(|c| c.width()).sum();
    u16::try_from(width).unwrap_or(u16::MAX)
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let (title, border_color) = if app.can_edit() {
        (" Ask ", Color::Cyan)
    } else {
        (" Waiting for the agent... ", Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);
    let inner = block.inner(area);

    let cursor = cursor_column(app.input(), app.input_cursor);
    // Keep the cursor in view on long questions
    let offset = cursor.saturating_sub(inner.width.saturating_sub(1));

    let input = if app.input().is_empty() {
        Paragraph::new(PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
    } else {
        let style = if app.can_edit() {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Paragraph::new(app.input().to_string())
            .style(style)
            .scroll((0, offset))
    };
    frame.render_widget(input.block(block), area);

    if app.can_edit() {
        frame.set_cursor_position((inner.x + cursor - offset, inner.y));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = if app.chat.busy {
        (" WAITING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" READY ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
    ];
    if !app.chat.busy {
        spans.extend([
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
        ]);
    }
    spans.extend([
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Ctrl-End ", key_style),
        Span::styled(" latest ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
