use crate::app::model::Status;
use crate::view::{Mode, View};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

const STATUS_WIDTH: u16 = 8;
const BORDER: Color = Color::Indexed(240);

const LIST_HELP: &str = "enter open · r rerun · R rerun all · d remove · q quit";
const DETAIL_HELP: &str = "esc back · j/k next/prev · pgup/pgdn scroll · r rerun";

pub fn status_style(status: Status) -> Style {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match status {
        Status::Running => bold.fg(Color::Yellow),
        Status::Pass => bold.fg(Color::Green),
        Status::Fail => bold.fg(Color::Red),
        Status::Error => bold.fg(Color::Rgb(0xFF, 0x80, 0x00)),
        _ => Style::default(),
    }
}

pub fn draw(frame: &mut Frame, view: &mut View) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.size());

    match view.mode() {
        Mode::Detail => draw_detail(frame, view, chunks[0]),
        Mode::List | Mode::Input => draw_list(frame, view, chunks[0]),
    }
    draw_footer(frame, view, chunks[1]);
}

fn draw_list(frame: &mut Frame, view: &mut View, area: Rect) {
    let rows: Vec<Row> = view
        .rows()
        .into_iter()
        .map(|(identity, status)| {
            Row::new(vec![
                Cell::from(status.label()).style(status_style(status)),
                Cell::from(identity),
            ])
        })
        .collect();
    if rows.is_empty() {
        view.table_state().select(None);
    }

    let header = Row::new(vec!["Status", "Test/Suite"]).style(Style::default().fg(BORDER));
    let table = Table::new(rows, [Constraint::Length(STATUS_WIDTH), Constraint::Min(1)])
        .header(header)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(BORDER)))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(table, area, view.table_state());
}

fn draw_detail(frame: &mut Frame, view: &View, area: Rect) {
    let detail = match view.detail() {
        Some(detail) => detail,
        None => return,
    };
    let title = Line::from(vec![
        Span::raw(" "),
        Span::styled(detail.status.label(), status_style(detail.status)),
        Span::raw(format!(" | {} ", detail.identity)),
    ]);
    let paragraph = Paragraph::new(detail.body)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(BORDER))
                .title(title),
        )
        .wrap(Wrap { trim: false })
        .scroll((view.scroll(), 0));
    frame.render_widget(paragraph, area);
}

fn draw_footer(frame: &mut Frame, view: &View, area: Rect) {
    let mut spans = vec![];
    for (status, count) in view.counts() {
        spans.push(Span::styled(status.label(), status_style(status)));
        spans.push(Span::raw(format!(" {}  ", count)));
    }
    let help = match view.mode() {
        Mode::List => LIST_HELP.to_owned(),
        Mode::Detail => DETAIL_HELP.to_owned(),
        Mode::Input => format!("> {}", view.input()),
    };
    spans.push(Span::styled(help, Style::default().fg(BORDER)));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
