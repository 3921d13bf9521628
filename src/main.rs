use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph};

use scout_predict::export::{self, ExportReport};
use scout_predict::feed;
use scout_predict::predict::{self, Market, MarketProbabilities, Side, TeamStatistics};
use scout_predict::state::{
    AppState, Delta, ExportStatus, MatchView, ProviderCommand, View, apply_delta, league_label,
};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        let mut state = AppState::new();
        state.loading = true;
        Self {
            state,
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.search_active {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.state.end_search(),
                KeyCode::Backspace => self.state.pop_search_char(),
                KeyCode::Char(ch) => self.state.push_search_char(ch),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('l') => self.state.cycle_league_mode(),
            KeyCode::Char('L') => self.state.cycle_league_mode_back(),
            KeyCode::Char('/') => self.state.begin_search(),
            KeyCode::Char('c') => self.state.clear_search(),
            KeyCode::Char('r') => self.request_refresh(),
            KeyCode::Char('s') => {
                self.state.save_selected_to_history(Utc::now());
            }
            KeyCode::Char('e') => self.export_csv(),
            KeyCode::Char('x') => self.export_xlsx(),
            KeyCode::Char('J') => self.export_history(),
            KeyCode::Char('h') => self.state.toggle_view(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn request_refresh(&mut self) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Data refresh unavailable");
            return;
        };
        if tx.send(ProviderCommand::Refresh).is_err() {
            self.state.push_log("[WARN] Refresh request failed");
        } else {
            self.state.loading = true;
            self.state.push_log("[INFO] Refresh request sent");
        }
    }

    fn export_csv(&mut self) {
        let path = export::export_dir().join(export::CSV_FILE);
        let filtered = self.state.filtered_matches();
        let result = export::export_csv(&path, &filtered);
        self.finish_export("CSV", result);
    }

    fn export_xlsx(&mut self) {
        let path = export::export_dir().join(export::XLSX_FILE);
        let filtered = self.state.filtered_matches();
        let result = export::export_xlsx(&path, &filtered);
        self.finish_export("XLSX", result);
    }

    fn export_history(&mut self) {
        if self.state.history.is_empty() {
            self.state.push_log("[INFO] History is empty");
            return;
        }
        let path = export::export_dir().join(export::HISTORY_FILE);
        let result = export::export_history_json(&path, &self.state.history);
        self.finish_export("History", result);
    }

    fn finish_export(&mut self, kind: &str, result: anyhow::Result<ExportReport>) {
        match result {
            Ok(report) => {
                let path = report.path.display().to_string();
                self.state.push_log(format!(
                    "[INFO] {kind} export: {} rows from {} matches -> {path}",
                    report.rows, report.matches
                ));
                self.state.last_export = ExportStatus {
                    path: Some(path),
                    rows: report.rows,
                    at: Some(Utc::now()),
                };
            }
            Err(err) => {
                self.state
                    .push_log(format!("[WARN] {kind} export failed: {err:#}"));
            }
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    feed::spawn_mock_provider(tx, cmd_rx);

    let mut app = App::new(Some(cmd_tx));
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.view {
        View::Matches => render_matches(frame, chunks[1], &app.state),
        View::History => render_history(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state)).style(Style::default().fg(Color::Gray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let view = match state.view {
        View::Matches => "MATCHES",
        View::History => "HISTORY",
    };
    let search = if state.search_active {
        format!("Search: {}_", state.query)
    } else if state.query.is_empty() {
        "Search: -".to_string()
    } else {
        format!("Search: {}", state.query)
    };
    let status = if state.loading { " | Loading..." } else { "" };
    let line1 = format!(
        "SCOUTPREDICT | {} | {view} | {search}{status}",
        league_label(state.league_mode)
    );
    let line2 = match (&state.last_export.path, state.last_export.at) {
        (Some(path), Some(at)) => format!(
            "Last export {}: {} rows -> {path}",
            at.format("%H:%M:%S"),
            state.last_export.rows
        ),
        (Some(path), None) => format!("Last export: {} rows -> {path}", state.last_export.rows),
        (None, _) => "Corners & cards".to_string(),
    };
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    if state.search_active {
        return "Type to search | Backspace Delete | Enter/Esc Done".to_string();
    }
    match state.view {
        View::Matches => {
            "j/k Move | l/L League | / Search | c Clear | r Refresh | s Save | e CSV | x XLSX | h History | ? Help | q Quit".to_string()
        }
        View::History => "j/k Move | J Export JSON | h Matches | ? Help | q Quit".to_string(),
    }
}

fn render_matches(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let visible_rows = columns[0].height.saturating_sub(2) as usize;
    let list = Paragraph::new(match_list_text(state, visible_rows))
        .block(Block::default().title("Matches").borders(Borders::ALL));
    frame.render_widget(list, columns[0]);

    match state.selected_match() {
        Some(m) => render_match_detail(frame, columns[1], m),
        None => {
            let msg = if state.loading {
                "Loading matches..."
            } else {
                "No matches for this league/search"
            };
            let empty = Paragraph::new(msg)
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().title("Prediction").borders(Borders::ALL));
            frame.render_widget(empty, columns[1]);
        }
    }
}

fn match_list_text(state: &AppState, visible_rows: usize) -> String {
    let filtered = state.filtered_matches();
    if filtered.is_empty() {
        return if state.loading {
            "Loading matches...".to_string()
        } else {
            "No matches".to_string()
        };
    }

    const ROWS_PER_MATCH: usize = 2;
    let visible = (visible_rows / ROWS_PER_MATCH).max(1);
    let (start, end) = visible_range(state.selected, filtered.len(), visible);

    filtered[start..end]
        .iter()
        .enumerate()
        .map(|(offset, m)| {
            let prefix = if start + offset == state.selected {
                "> "
            } else {
                "  "
            };
            format!(
                "{prefix}{} {}\n    {}",
                m.fixture.kickoff.format("%m-%d %H:%M"),
                m.fixture.title(),
                m.suggestion_text()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_history(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let visible_rows = columns[0].height.saturating_sub(2) as usize;
    let list = Paragraph::new(history_list_text(state, visible_rows))
        .block(Block::default().title("History").borders(Borders::ALL));
    frame.render_widget(list, columns[0]);

    match state.selected_history() {
        Some(entry) => render_match_detail(frame, columns[1], &entry.view),
        None => {
            let empty = Paragraph::new("Press s on a match to save it here")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().title("Snapshot").borders(Borders::ALL));
            frame.render_widget(empty, columns[1]);
        }
    }
}

fn history_list_text(state: &AppState, visible_rows: usize) -> String {
    if state.history.is_empty() {
        return "No saved predictions".to_string();
    }
    let (start, end) = visible_range(
        state.history_selected,
        state.history.len(),
        visible_rows.max(1),
    );
    state.history[start..end]
        .iter()
        .enumerate()
        .map(|(offset, entry)| {
            let prefix = if start + offset == state.history_selected {
                "> "
            } else {
                "  "
            };
            format!(
                "{prefix}{} #{} {}",
                entry.saved_at.format("%H:%M:%S"),
                entry.match_id,
                entry.view.fixture.title()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_match_detail(frame: &mut Frame, area: Rect, m: &MatchView) {
    let block = Block::default()
        .title(format!("{} | {}", m.fixture.title(), m.suggestion_text()))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(7)])
        .split(inner);

    let sides = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    render_team_card(frame, sides[0], m, Side::Home);
    render_team_card(frame, sides[1], m, Side::Away);

    let ranked = Paragraph::new(ranked_text(m))
        .block(Block::default().title("Ranked").borders(Borders::TOP));
    frame.render_widget(ranked, rows[1]);
}

fn render_team_card(frame: &mut Frame, area: Rect, m: &MatchView, side: Side) {
    let team = m.fixture.team(side);
    let probs = m.prediction.for_side(side);
    let highlight = m.prediction.suggestion.team == side;

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let name_style = if highlight {
        Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    frame.render_widget(Paragraph::new(team.name.as_str()).style(name_style), sections[0]);
    frame.render_widget(market_bar_chart(probs), sections[1]);
    frame.render_widget(Paragraph::new(team_stats_text(&team.stats)), sections[2]);
}

fn market_bar_chart(probs: &MarketProbabilities) -> BarChart<'static> {
    let bars: Vec<Bar<'static>> = Market::ALL
        .into_iter()
        .map(|market| {
            let p = probs.get(market);
            Bar::default()
                .label(short_market_label(market).into())
                .value(u64::from(p))
                .text_value(format!("{p}%"))
                .style(Style::default().fg(probability_color(p)))
        })
        .collect();

    BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(0)
        .max(100)
}

fn probability_color(p: u8) -> Color {
    if p >= 70 {
        Color::Green
    } else if p >= 45 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn short_market_label(market: Market) -> &'static str {
    match market {
        Market::Corner35 => "C3.5",
        Market::Corner45 => "C4.5",
        Market::Cards15 => "K1.5",
    }
}

fn team_stats_text(stats: &TeamStatistics) -> String {
    let last_five = stats
        .last_five
        .iter()
        .map(|m| format!("{}c/{}k", m.corners, m.cards))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "Corners for:     {:.2}\nCorners against: {:.2}\nCards:           {:.2}\nLast 5: {}",
        stats.avg_corners_for,
        stats.avg_corners_against,
        stats.avg_cards_for,
        if last_five.is_empty() { "-".to_string() } else { last_five }
    )
}

fn ranked_text(m: &MatchView) -> String {
    predict::rank_opportunities(&m.prediction.home, &m.prediction.away)
        .iter()
        .enumerate()
        .map(|(idx, o)| {
            format!(
                "{}. {:<14} {:<12} {:>3}%",
                idx + 1,
                m.fixture.team(o.team).name,
                predict::market_label(o.market),
                o.probability
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    let start = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "ScoutPredict - Help",
        "",
        "Matches:",
        "  j/k or ↑/↓   Move",
        "  l / L        Next / previous league",
        "  /            Search team name",
        "  c            Clear search",
        "  r            Refresh mock data",
        "  s            Save prediction to history",
        "  e            Export filtered to CSV",
        "  x            Export filtered to XLSX",
        "",
        "History:",
        "  h            Toggle history view",
        "  J            Export history to JSON",
        "",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
