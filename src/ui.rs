use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
};
use crate::app::{App, FocusPane, InputMode, ResponseView};
use crate::command::{Command, IssueFields};

/// Width of the label column in the issue form
const LABEL_COL: usize = 11;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, command tabs, body, footer
    let [header_area, tabs_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_tabs(app, frame, tabs_area);

    // Body: form on the left, response on the right
    let [form_area, response_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(body_area);

    match app.command {
        Command::Ask => render_ask_form(app, frame, form_area),
        Command::RiskCheck => render_risk_form(app, frame, form_area),
        Command::UpdateIssue => render_issue_form(app, frame, form_area),
    }

    render_response(app, frame, response_area);
    render_footer(app, frame, footer_area);

    if let Some(notice) = &app.notice {
        render_notice(notice, frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            " PMO Agent Dashboard ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_tabs(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans: Vec<Span> = Vec::new();
    for (i, command) in Command::all().into_iter().enumerate() {
        let style = if command == app.command {
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {} {} ", i + 1, command.title()), style));
        spans.push(Span::raw(" "));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Commands ");

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn form_block(app: &App, title: &'static str) -> Block<'static> {
    let border_color = if app.focus == FocusPane::Form {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title)
}

/// Horizontal scrolling for single-line inputs: keep the cursor visible and
/// return the slice of the value that fits.
fn visible_slice(value: &str, cursor: usize, width: usize) -> (usize, String) {
    let scroll_offset = if width == 0 {
        0
    } else if cursor >= width {
        cursor - width + 1
    } else {
        0
    };

    let visible: String = value.chars().skip(scroll_offset).take(width.max(1)).collect();
    (scroll_offset, visible)
}

fn render_ask_form(app: &App, frame: &mut Frame, area: Rect) {
    let block = form_block(app, " Ask ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let editing = app.input_mode == InputMode::Editing && app.focus == FocusPane::Form;
    let cursor = if editing { app.cursor } else { 0 };
    let (scroll_offset, visible) = visible_slice(&app.query_input, cursor, inner.width as usize);

    let lines = vec![
        Line::from(Span::styled(
            "Question",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(visible, Style::default().fg(Color::Cyan))),
        Line::default(),
        Line::from(Span::styled(
            "Enter sends /ask with the question above.",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    frame.render_widget(Paragraph::new(lines), inner);

    if editing {
        let cursor_x = (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((inner.x + cursor_x, inner.y + 1));
    }
}

fn render_risk_form(app: &App, frame: &mut Frame, area: Rect) {
    let block = form_block(app, " Risk Check ");

    let text = Text::from(vec![
        Line::from("Scans the issue log and schedule for overdue and stalled work."),
        Line::default(),
        Line::from(Span::styled(
            "No input required. Press Enter to run /risk-alert.",
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_issue_form(app: &App, frame: &mut Frame, area: Rect) {
    let block = form_block(app, " Update Issue ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let value_width = inner.width.saturating_sub(LABEL_COL as u16) as usize;
    let mut lines: Vec<Line> = Vec::new();
    let mut cursor_pos = None;

    for (idx, label) in IssueFields::labels().into_iter().enumerate() {
        let focused = idx == app.issue_field && app.focus == FocusPane::Form;
        let editing_here = focused && app.input_mode == InputMode::Editing;

        let marker = if IssueFields::required(idx) { "*" } else { " " };
        let label_text = format!("{:<width$}", format!("{label}{marker}"), width = LABEL_COL);
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let value = app.issue.field(idx).map(String::as_str).unwrap_or("");
        let cursor = if editing_here { app.cursor } else { 0 };
        let (scroll_offset, visible) = visible_slice(value, cursor, value_width);

        if editing_here {
            let cursor_x = LABEL_COL as u16 + (app.cursor - scroll_offset) as u16;
            cursor_pos = Some((inner.x + cursor_x, inner.y + idx as u16));
        }

        let value_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };

        lines.push(Line::from(vec![
            Span::styled(label_text, label_style),
            Span::styled(visible, value_style),
        ]));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "* required fields. Enter moves to the next field, s submits.",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines), inner);

    if let Some(pos) = cursor_pos {
        frame.set_cursor_position(pos);
    }
}

fn render_response(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Response;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Response ");

    app.response_height = block.inner(area).height;

    let text: Text = match &app.response {
        ResponseView::Hidden => Text::from(Span::styled(
            "No response yet. Submit a command.",
            Style::default().fg(Color::DarkGray),
        )),
        ResponseView::Loading => {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            Text::from(Span::styled(
                format!("Sending{}", dots),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ))
        }
        ResponseView::Reply(body) => Text::from(
            body.lines()
                .map(|line| Line::from(line.to_string()))
                .collect::<Vec<_>>(),
        ),
        ResponseView::Error(body) => Text::from(
            body.lines()
                .map(|line| {
                    Line::from(Span::styled(
                        line.to_string(),
                        Style::default().fg(Color::Red),
                    ))
                })
                .collect::<Vec<_>>(),
        ),
    };

    app.total_response_lines = text.lines.len() as u16;

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.response_scroll, 0));

    frame.render_widget(paragraph, area);

    // Render scrollbar
    if app.total_response_lines > app.response_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state = ScrollbarState::new(app.total_response_lines as usize)
            .position(app.response_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.input_mode {
        InputMode::Normal => " FORM ",
        InputMode::Editing => " EDIT ",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Normal => {
            let mut hints = vec![
                Span::styled(" 1-3 ", key_style),
                Span::styled(" command ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" focus ", label_style),
            ];

            match (app.focus, app.command) {
                (FocusPane::Form, Command::Ask) => hints.extend(vec![
                    Span::styled(" Enter ", key_style),
                    Span::styled(" edit ", label_style),
                ]),
                (FocusPane::Form, Command::RiskCheck) => hints.extend(vec![
                    Span::styled(" Enter ", key_style),
                    Span::styled(" run ", label_style),
                ]),
                (FocusPane::Form, Command::UpdateIssue) => hints.extend(vec![
                    Span::styled(" j/k ", key_style),
                    Span::styled(" field ", label_style),
                    Span::styled(" Enter ", key_style),
                    Span::styled(" edit ", label_style),
                ]),
                (FocusPane::Response, _) => hints.extend(vec![
                    Span::styled(" j/k ", key_style),
                    Span::styled(" scroll ", label_style),
                ]),
            }

            hints.extend(vec![
                Span::styled(" s ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
            hints
        }
        InputMode::Editing => {
            let enter_label = match app.command {
                Command::UpdateIssue => " next field ",
                _ => " send ",
            };
            vec![
                Span::styled(" Enter ", key_style),
                Span::styled(enter_label, label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" stop typing ", label_style),
            ]
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_notice(notice: &str, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 50.min(area.width.saturating_sub(4));
    let popup_height = 7.min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Notice ");

    let text = Text::from(vec![
        Line::from(notice.to_string()),
        Line::default(),
        Line::from(Span::styled(
            "Press any key to continue",
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        popup_area,
    );
}
