//! Optional status TUI (SPEC_FULL §15), grounded on the teacher's
//! `crates/server/src/tui.rs` layout (header/status/detail/help panel
//! split via `ratatui::layout::Layout`) but showing per-game tick and
//! player/snake counts instead of dual's UDP packet-loss/RTT panel, which
//! has no counterpart once the transport is TCP.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};
use ratatui::Frame;

use snake::PlayerStat;

pub struct GameStatus {
    pub field: u32,
    pub tick: u64,
    pub live_snakes: usize,
    pub foods: usize,
    pub players: Vec<PlayerStat>,
}

pub fn render(frame: &mut Frame, games: &[GameStatus], log_lines: &[String]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(8),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], games);
    render_players(frame, chunks[1], games);
    render_log(frame, chunks[2], log_lines);
    render_help(frame, chunks[3]);
}

fn render_header(frame: &mut Frame, area: Rect, games: &[GameStatus]) {
    let block = Block::default()
        .title(" snake-arena server ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let text = games
        .iter()
        .map(|g| format!("field {}: tick {}  snakes {}  foods {}", g.field, g.tick, g.live_snakes, g.foods))
        .collect::<Vec<_>>()
        .join("   |   ");

    let paragraph = Paragraph::new(text).block(block).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, area);
}

fn render_players(frame: &mut Frame, area: Rect, games: &[GameStatus]) {
    let block = Block::default()
        .title(" Players ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let rows: Vec<Row> = games
        .iter()
        .flat_map(|g| g.players.iter().map(move |p| (g.field, p)))
        .map(|(field, p)| {
            Row::new(vec![
                field.to_string(),
                p.player_id.to_string(),
                p.login.clone(),
                p.level.to_string(),
                p.connections.to_string(),
                p.live_snakes.to_string(),
                format!("{:.0}", p.w_sum),
                format!("{:.0}", p.w_max),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(14),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(7),
        Constraint::Length(8),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["field", "id", "login", "lvl", "conns", "snakes", "w_sum", "w_max"]).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(block);

    frame.render_widget(table, area);
}

fn render_log(frame: &mut Frame, area: Rect, log_lines: &[String]) {
    let block = Block::default()
        .title(" Log ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let lines: Vec<Line> = log_lines
        .iter()
        .rev()
        .take((area.height.saturating_sub(2)) as usize)
        .rev()
        .map(|l| Line::from(Span::raw(l.clone())))
        .collect();

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = Paragraph::new("Press 'q' or ESC to quit")
        .block(block)
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC));

    frame.render_widget(text, area);
}
