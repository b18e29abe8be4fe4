use std::path::Path;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};

use crate::db::Status;

use super::super::display::{format_time, status_marker, truncate};
use super::actions::TuiRow;

pub(super) fn draw_tui(
    frame: &mut Frame,
    dir: &Path,
    items: &[TuiRow],
    table_state: &mut TableState,
    status: &str,
) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let outstanding = items
        .iter()
        .filter(|item| matches!(item.status, Status::New | Status::Playing))
        .count();
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "MTRACK",
            Style::default()
                .fg(Color::Rgb(110, 170, 255))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(
            truncate(&dir.display().to_string(), 60),
            Style::default().fg(Color::Rgb(185, 195, 210)),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(
            format!("{outstanding}/{} to watch", items.len()),
            Style::default().fg(Color::Yellow),
        ),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Directory"));
    frame.render_widget(header, chunks[0]);

    let rows: Vec<Row> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            Row::new(vec![
                Cell::from((idx + 1).to_string()),
                Cell::from(format!("[{}]", status_marker(item.status))),
                Cell::from(item.name.clone()),
                Cell::from(item.resume.map(format_time).unwrap_or_default()),
            ])
            .style(row_style(item.status))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Min(20),
            Constraint::Length(10),
        ],
    )
    .header(
        Row::new(vec!["#", "", "File", "Resume"]).style(
            Style::default()
                .fg(Color::Rgb(110, 170, 255))
                .add_modifier(Modifier::BOLD),
        ),
    )
    .block(panel_block("Files"))
    .row_highlight_style(
        Style::default()
            .bg(Color::Rgb(110, 170, 255))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▸ ");
    frame.render_stateful_widget(table, chunks[1], table_state);

    let controls = Paragraph::new(Line::from(Span::styled(
        "↑/↓ move  Enter play  n next  m mark  s skip  u unmark  r refresh  q quit",
        Style::default().fg(Color::Rgb(185, 195, 210)),
    )))
    .alignment(Alignment::Center)
    .block(panel_block("Controls"));
    frame.render_widget(controls, chunks[2]);

    let status_widget = Paragraph::new(status.to_string())
        .style(status_style(status))
        .block(panel_block("Status"));
    frame.render_widget(status_widget, chunks[3]);
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn row_style(status: Status) -> Style {
    match status {
        Status::Playing => Style::default().fg(Color::Yellow),
        Status::Done => Style::default().fg(Color::Green),
        Status::Skip => Style::default().fg(Color::DarkGray),
        Status::New => Style::default().fg(Color::Rgb(230, 235, 242)),
    }
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(Color::Rgb(205, 165, 255))
    } else {
        Style::default().fg(Color::Rgb(230, 235, 242))
    }
}
