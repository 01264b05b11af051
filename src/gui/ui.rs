//! Rendering of the terminal view.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, TableState, Wrap},
};

use super::app::{App, Focus, Modal, View, CLOSED_PLACEHOLDER};
use crate::domain::risk::RiskTier;
use crate::domain::snapshot::TOOL_NAME;

const HIGH_RISK_BG: Color = Color::Rgb(0x8b, 0x00, 0x00);
const MID_RISK_BG: Color = Color::Rgb(0xb8, 0x86, 0x0b);

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Body
            Constraint::Length(3), // Status
        ])
        .split(frame.area());

    draw_title(frame, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(0)])
        .split(chunks[1]);

    draw_sidebar(frame, body[0], app);
    match &app.view {
        View::Closed => draw_closed(frame, body[1]),
        View::Section(name) => draw_section(frame, body[1], app, name),
        View::Processes => draw_processes(frame, body[1], app),
        View::Details => draw_details(frame, body[1], app),
    }

    draw_status(frame, chunks[2], app);

    if let Some(modal) = &app.modal {
        draw_modal(frame, modal);
    }
}

fn draw_title(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));

    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", TOOL_NAME),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("snapshot {}", app.snapshot.timestamp.format("%Y-%m-%d %H:%M:%S UTC")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(title).block(block), area);
}

fn focus_border(app: &App, focus: Focus) -> Style {
    if app.focus == focus && app.modal.is_none() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .sidebar
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let selected = i == app.sidebar_index;
            let prefix = if selected { "> " } else { "  " };
            let style = if selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(format!("{}{}", prefix, item.label())).style(style)
        })
        .collect();

    let block = Block::default()
        .title(" Modules ")
        .borders(Borders::ALL)
        .border_style(focus_border(app, Focus::Sidebar));

    frame.render_widget(List::new(items).block(block), area);
}

fn content_block<'a>(app: &App, title: &'a str) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(focus_border(app, Focus::Content))
}

fn draw_closed(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let text = Paragraph::new(CLOSED_PLACEHOLDER)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(text, area);
}

fn draw_section(frame: &mut Frame, area: Rect, app: &App, name: &str) {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("[{}]", name),
            Style::default().fg(Color::Yellow),
        )),
        Line::default(),
    ];
    if let Some(output) = app.snapshot.section(name) {
        lines.extend(output.lines().into_iter().map(Line::from));
    }

    let title = format!(" {} ", name);
    let text = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.section_scroll, 0))
        .block(content_block(app, &title));
    frame.render_widget(text, area);
}

fn draw_processes(frame: &mut Frame, area: Rect, app: &App) {
    let header = Row::new(["PID", "NAME", "USER", "STATUS", "RISK"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let rows = app.processes.iter().map(|r| {
        let style = match r.tier {
            RiskTier::High => Style::default().bg(HIGH_RISK_BG).fg(Color::White),
            RiskTier::Mid => Style::default().bg(MID_RISK_BG).fg(Color::Black),
            RiskTier::Low => Style::default(),
        };
        Row::new([
            Cell::from(r.pid.to_string()),
            Cell::from(r.name.clone()),
            Cell::from(r.user.clone().unwrap_or_default()),
            Cell::from(r.status.clone()),
            Cell::from(r.score.to_string()),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(8),
        Constraint::Percentage(35),
        Constraint::Percentage(25),
        Constraint::Length(11),
        Constraint::Length(5),
    ];

    let title = format!(" Processes ({}) ", app.processes.len());
    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .block(content_block(app, &title));

    let mut state = TableState::default().with_selected(Some(app.process_index));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_details(frame: &mut Frame, area: Rect, app: &App) {
    let header = Row::new(["PID", "NAME", "USER", "STATUS", "OPEN_FILES", "CONNECTIONS"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let rows = app.details.iter().map(|d| {
        Row::new([
            Cell::from(d.pid.to_string()),
            Cell::from(d.name.clone()),
            Cell::from(d.user.clone().unwrap_or_default()),
            Cell::from(d.status.clone()),
            Cell::from(d.open_files.summary()),
            Cell::from(d.connections.summary()),
        ])
    });

    let widths = [
        Constraint::Length(8),
        Constraint::Percentage(18),
        Constraint::Percentage(12),
        Constraint::Length(10),
        Constraint::Percentage(30),
        Constraint::Percentage(30),
    ];

    let title = format!(" Process Details ({}) ", app.details.len());
    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .block(content_block(app, &title));

    let mut state = TableState::default().with_selected(Some(app.details_index));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_status(frame: &mut Frame, area: Rect, app: &App) {
    let (text, style) = if let Some(ref msg) = app.status_message {
        let color = if app.status_is_error {
            Color::Red
        } else {
            Color::Green
        };
        (msg.clone(), Style::default().fg(color))
    } else {
        (help_text(app).to_string(), Style::default().fg(Color::DarkGray))
    };

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));

    let status = Paragraph::new(format!(" {} ", text))
        .style(style)
        .block(block);

    frame.render_widget(status, area);
}

fn help_text(app: &App) -> &'static str {
    match (&app.modal, app.focus, &app.view) {
        (Some(Modal::PidPrompt { .. }), _, _) => "0-9: Type PID | Enter: Submit | Esc: Cancel",
        (Some(Modal::Confirm { .. }), _, _) => "y: Yes | n: No",
        (Some(_), _, _) => "Enter: Close",
        (None, Focus::Sidebar, _) => "↑↓: Navigate | Enter: Open | Tab: Content | q: Quit",
        (None, Focus::Content, View::Processes) => {
            "↑↓: Select | r: Refresh | t: Terminate | k: Kill tree | s: Suspend | u: Resume | Esc: Back"
        }
        (None, Focus::Content, View::Details) => {
            "↑↓: Select | Enter: Full details | r: Refresh | t: Terminate | k: Kill tree | s: Suspend | u: Resume | Esc: Back"
        }
        (None, Focus::Content, _) => "↑↓: Scroll | Tab: Sidebar | Esc: Back",
    }
}

fn draw_modal(frame: &mut Frame, modal: &Modal) {
    let (title, body, color, size) = match modal {
        Modal::PidPrompt { input } => (
            " Terminate Process ".to_string(),
            format!("Enter PID to terminate:\n\n{}_", input),
            Color::Cyan,
            (50, 25),
        ),
        Modal::Confirm { prompt, .. } => (
            " Confirm ".to_string(),
            format!("{}\n\n[y] Yes   [n] No", prompt),
            Color::Yellow,
            (60, 25),
        ),
        Modal::Message {
            title,
            body,
            is_error,
        } => (
            format!(" {} ", title),
            body.clone(),
            if *is_error { Color::Red } else { Color::Green },
            (60, 25),
        ),
        Modal::FullValue { title, body } => (
            format!(" {} ", title),
            body.clone(),
            Color::Cyan,
            (80, 70),
        ),
    };

    let popup_area = centered_rect(size.0, size.1, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    let text = Paragraph::new(body)
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false })
        .block(block);

    frame.render_widget(text, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
