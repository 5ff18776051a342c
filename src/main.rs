use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine, Points};
use ratatui::widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table};

use hoops_terminal::config::{AppConfig, load_dotenv};
use hoops_terminal::fake_export::demo_export;
use hoops_terminal::game_clock::format_clock;
use hoops_terminal::persist;
use hoops_terminal::state::{AppState, EMPTY_NOTICE, Focus, InputMode};
use hoops_terminal::table_export::{default_export_path, export_views};
use hoops_terminal::view::{ChartView, TableView};

struct App {
    state: AppState,
    should_quit: bool,
}

impl App {
    fn new(config: AppConfig) -> Self {
        let mut state = AppState::new(config);
        if let Some(selection) = persist::load_selection(&state.config.data_file) {
            state.restore_selection(selection);
            state.push_log("[INFO] Restored last selection");
        }
        Self {
            state,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.input_mode == InputMode::IngestPath {
            self.on_input_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Tab => self.state.cycle_focus(),
            KeyCode::Char('j') | KeyCode::Down => self.state.move_cursor(true),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_cursor(false),
            KeyCode::Char(' ') | KeyCode::Enter => {
                if self.state.toggle_current() {
                    self.save_selection();
                }
            }
            KeyCode::Char('r') => {
                self.state.reset_selection();
                self.save_selection();
            }
            KeyCode::Char('i') => {
                self.state.input_mode = InputMode::IngestPath;
                self.state.input.clear();
            }
            KeyCode::Char('g') => self.ingest_demo(),
            KeyCode::Char('e') => self.export(),
            _ => {}
        }
    }

    fn on_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.input_mode = InputMode::Normal;
                self.state.input.clear();
            }
            KeyCode::Enter => {
                self.state.input_mode = InputMode::Normal;
                let raw = std::mem::take(&mut self.state.input);
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return;
                }
                if self.state.ingest_file(&PathBuf::from(trimmed)) {
                    self.save_selection();
                }
            }
            KeyCode::Backspace => {
                self.state.input.pop();
            }
            KeyCode::Char(c) => self.state.input.push(c),
            _ => {}
        }
    }

    fn ingest_demo(&mut self) {
        let raw = demo_export(&mut rand::thread_rng(), &self.state.config.team);
        self.state.ingest_bytes(raw.as_bytes(), "demo export");
    }

    fn export(&mut self) {
        let Some(Ok(table)) = &self.state.views.table else {
            self.state.push_log("[INFO] Nothing to export");
            return;
        };
        let chart = match &self.state.views.chart {
            Some(Ok(chart)) => Some(chart),
            _ => None,
        };
        let path = default_export_path(&self.state.config.export_dir);
        let result = export_views(&path, table, chart);
        match result {
            Ok(report) => self.state.push_log(format!(
                "[INFO] Exported {} rows and {} points to {}",
                report.table_rows,
                report.chart_points,
                report.path.display()
            )),
            Err(err) => self.state.push_log(format!("[WARN] Export failed: {err:#}")),
        }
    }

    fn save_selection(&self) {
        persist::save_selection(&self.state.config.data_file, &self.state.selection);
    }
}

fn main() -> io::Result<()> {
    load_dotenv();
    let config = AppConfig::from_env();
    let mut app = App::new(config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
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
    let state = &app.state;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(10),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(20)])
        .split(chunks[1]);
    render_sidebar(frame, body[0], state);

    if state.is_empty() {
        let empty = Paragraph::new(EMPTY_NOTICE)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, body[1]);
    } else {
        let views = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(body[1]);
        render_chart(frame, views[0], state);
        render_table(frame, views[1], state);
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    frame.render_widget(Paragraph::new(footer_text(state)), chunks[3]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    format!(
        "HOOPS TERMINAL | {} | {} rows | {}",
        state.config.team,
        state.dataset.len(),
        state.store.path().display()
    )
}

fn footer_text(state: &AppState) -> String {
    match state.input_mode {
        InputMode::IngestPath => format!("Ingest file: {}_  (Enter load | Esc cancel)", state.input),
        InputMode::Normal => {
            "Tab Focus | j/k Move | Space Toggle | r Reset | i Ingest | g Demo | e Export | ? Help | q Quit"
                .to_string()
        }
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, state: &AppState) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);
    render_options(
        frame,
        parts[0],
        state,
        Focus::Matches,
        "Matches",
        &state.views.match_options,
        state.match_cursor,
    );
    render_options(
        frame,
        parts[1],
        state,
        Focus::Players,
        "Players",
        &state.views.player_options,
        state.player_cursor,
    );
}

fn render_options(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    focus: Focus,
    title: &str,
    options: &[String],
    cursor: usize,
) {
    let focused = state.focus == focus;
    let visible = area.height.saturating_sub(2) as usize;
    let (start, end) = visible_range(cursor, options.len(), visible);

    let items = options[start..end]
        .iter()
        .enumerate()
        .map(|(offset, value)| {
            let mark = if state.is_option_selected(focus, value) {
                "[x]"
            } else {
                "[ ]"
            };
            let style = if focused && start + offset == cursor {
                Style::default().fg(Color::White).bg(Color::DarkGray)
            } else {
                Style::default()
            };
            ListItem::new(format!("{mark} {value}")).style(style)
        })
        .collect::<Vec<_>>();

    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let list = List::new(items).block(
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(border),
    );
    frame.render_widget(list, area);
}

fn render_chart(frame: &mut Frame, area: Rect, state: &AppState) {
    let chart = match &state.views.chart {
        Some(Ok(chart)) => chart,
        Some(Err(err)) => {
            let msg = Paragraph::new(format!("Chart unavailable: {err}"))
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().title("Contribution vs Time").borders(Borders::ALL));
            frame.render_widget(msg, area);
            return;
        }
        None => return,
    };

    let title = chart_title(chart);
    let points = chart
        .points()
        .map(|(contribution, secs, name)| (contribution, secs, name.to_string()))
        .collect::<Vec<_>>();
    if points.is_empty() {
        let msg = Paragraph::new("No players with playing time in this selection")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(msg, area);
        return;
    }

    let (x_bounds, y_bounds) = chart_bounds(&points);
    let coords = points.iter().map(|(x, y, _)| (*x, *y)).collect::<Vec<_>>();
    let median_time = chart.median_time;
    let median_contribution = chart.median_contribution;

    let canvas = Canvas::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(move |ctx| {
            if let Some(median) = median_contribution {
                dashed_line(ctx, (median, y_bounds[0]), (median, y_bounds[1]), Color::Red);
            }
            if let Some(median) = median_time {
                dashed_line(ctx, (x_bounds[0], median), (x_bounds[1], median), Color::Red);
                ctx.print(
                    x_bounds[0],
                    median,
                    Span::styled(format_clock(median), Style::default().fg(Color::Red)),
                );
            }
            ctx.draw(&Points {
                coords: &coords,
                color: Color::Cyan,
            });
            for (x, y, name) in &points {
                ctx.print(*x, *y, name.clone());
            }
            ctx.print(
                x_bounds[0],
                y_bounds[1],
                Span::styled(format_clock(y_bounds[1]), Style::default().fg(Color::DarkGray)),
            );
            ctx.print(
                x_bounds[0],
                y_bounds[0],
                Span::styled(format_clock(y_bounds[0]), Style::default().fg(Color::DarkGray)),
            );
        });
    frame.render_widget(canvas, area);
}

fn chart_title(chart: &ChartView) -> String {
    let scope = if chart.aggregated {
        "totals per player"
    } else {
        "per match"
    };
    let medians = match (chart.median_contribution, chart.median_time) {
        (Some(c), Some(t)) => format!(" | median {c:.1} @ {}", format_clock(t)),
        _ => String::new(),
    };
    format!("Contribution vs Time ({scope}){medians}")
}

/// Padded bounds around the plotted points.
fn chart_bounds(points: &[(f64, f64, String)]) -> ([f64; 2], [f64; 2]) {
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for (x, y, _) in points {
        min_x = min_x.min(*x);
        max_x = max_x.max(*x);
        min_y = min_y.min(*y);
        max_y = max_y.max(*y);
    }
    let pad_x = ((max_x - min_x) * 0.1).max(1.0);
    let pad_y = ((max_y - min_y) * 0.1).max(30.0);
    (
        [min_x - pad_x, max_x + pad_x],
        [(min_y - pad_y).max(0.0), max_y + pad_y],
    )
}

fn dashed_line(
    ctx: &mut ratatui::widgets::canvas::Context<'_>,
    from: (f64, f64),
    to: (f64, f64),
    color: Color,
) {
    const SEGMENTS: usize = 24;
    for step in (0..SEGMENTS).step_by(2) {
        let t0 = step as f64 / SEGMENTS as f64;
        let t1 = (step + 1) as f64 / SEGMENTS as f64;
        ctx.draw(&CanvasLine {
            x1: from.0 + (to.0 - from.0) * t0,
            y1: from.1 + (to.1 - from.1) * t0,
            x2: from.0 + (to.0 - from.0) * t1,
            y2: from.1 + (to.1 - from.1) * t1,
            color,
        });
    }
}

fn render_table(frame: &mut Frame, area: Rect, state: &AppState) {
    let table = match &state.views.table {
        Some(Ok(table)) => table,
        Some(Err(err)) => {
            let msg = Paragraph::new(format!("Table unavailable: {err}"))
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().title("Players").borders(Borders::ALL));
            frame.render_widget(msg, area);
            return;
        }
        None => return,
    };

    let focused = state.focus == Focus::Table;
    let visible = area.height.saturating_sub(3) as usize;
    let (start, end) = visible_range(state.table_scroll, table.rows.len(), visible);
    let header = Row::new(table.columns.iter().map(|c| Cell::from(c.clone())))
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = table.rows[start..end]
        .iter()
        .enumerate()
        .map(|(offset, row)| {
            let style = if focused && start + offset == state.table_scroll {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            Row::new(row.iter().map(|v| Cell::from(v.clone()))).style(style)
        })
        .collect::<Vec<_>>();

    let widths = table_widths(table);
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let widget = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(format!("Players ({} rows)", table.rows.len()))
            .borders(Borders::ALL)
            .border_style(border),
    );
    frame.render_widget(widget, area);
}

fn table_widths(table: &TableView) -> Vec<Constraint> {
    table
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let widest = table
                .rows
                .iter()
                .filter_map(|row| row.get(idx))
                .map(|v| v.chars().count())
                .max()
                .unwrap_or(0)
                .max(column.chars().count());
            Constraint::Length(widest.min(24) as u16 + 1)
        })
        .collect()
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 || visible == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }
    let start = selected.saturating_sub(visible / 2).min(total - visible);
    (start, start + visible)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Hoops Terminal - Help",
        "",
        "Filters:",
        "  Tab          Cycle Matches / Players / Table",
        "  j/k or ↑/↓   Move",
        "  Space/Enter  Toggle value (\"all\" selects everything)",
        "  r            Reset to all",
        "",
        "Data:",
        "  i            Ingest an export file",
        "  g            Ingest a generated demo match",
        "  e            Export table and chart data to xlsx",
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
