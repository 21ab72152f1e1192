use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

mod demo_feed;
mod persist;
mod state;

use crate::state::{apply_delta, AppState, Focus, SelectorRow, Toast, ToastKind};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<state::ProviderCommand>>,
    store_dir: Option<PathBuf>,
    demo_auto: Duration,
    last_demo: Instant,
}

impl App {
    fn new(
        state: AppState,
        cmd_tx: Option<mpsc::Sender<state::ProviderCommand>>,
        store_dir: Option<PathBuf>,
    ) -> Self {
        // 0 disables the periodic demo reports.
        let demo_auto = std::env::var("ENERGY_DEMO_AUTO_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(0);
        Self {
            state,
            should_quit: false,
            cmd_tx,
            store_dir,
            demo_auto: Duration::from_secs(demo_auto),
            last_demo: Instant::now(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.help_overlay {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.state.help_overlay = false;
            }
            return;
        }

        if self.state.results_overlay {
            match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                    self.state.results_overlay = false;
                    self.state.results_scroll = 0;
                }
                KeyCode::Char('j') | KeyCode::Down => {
                    self.state.results_scroll = self.state.results_scroll.saturating_add(1);
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.state.results_scroll = self.state.results_scroll.saturating_sub(1);
                }
                _ => {}
            }
            return;
        }

        match self.state.focus {
            Focus::NameInput => match key.code {
                KeyCode::Enter => self.submit_new_team(),
                KeyCode::Esc | KeyCode::Tab => self.state.focus = Focus::TeamList,
                KeyCode::Backspace => {
                    self.state.name_input.pop();
                }
                KeyCode::Char(c) => self.state.name_input.push(c),
                _ => {}
            },
            Focus::TeamList => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
                KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
                KeyCode::Enter => self.state.activate_selected(),
                KeyCode::Char('n') | KeyCode::Tab => self.state.focus = Focus::NameInput,
                KeyCode::Char('r') => {
                    self.state.results_overlay = true;
                    self.state.results_scroll = 0;
                }
                KeyCode::Char('g') => self.request_demo_game(true),
                KeyCode::Char('?') => self.state.help_overlay = true,
                _ => {}
            },
        }
    }

    fn submit_new_team(&mut self) {
        let raw = self.state.name_input.clone();
        match self.state.create_team(&raw) {
            Ok(name) => {
                self.state.name_input.clear();
                self.state.focus = Focus::TeamList;
                self.state
                    .push_toast(ToastKind::Success, format!("Команда \"{name}\" создана!"));
                self.state.push_log(format!("[INFO] Team created: {name}"));
            }
            Err(err) => {
                if let state::RegistryError::DuplicateName(name) = &err {
                    self.state
                        .push_log(format!("[WARN] Duplicate team name: {name}"));
                }
                // Input stays as typed so it can be corrected.
                self.state.push_toast(ToastKind::Error, err.to_string());
            }
        }
    }

    fn request_demo_game(&mut self, announce: bool) {
        let Some(tx) = &self.cmd_tx else {
            if announce {
                self.state.push_log("[INFO] Demo provider unavailable");
            }
            return;
        };
        let teams: Vec<String> = self.state.teams.iter().map(|t| t.name.clone()).collect();
        if teams.is_empty() {
            if announce {
                self.state
                    .push_toast(ToastKind::Info, "Сначала создайте команду!");
            }
            return;
        }
        if tx
            .send(state::ProviderCommand::SimulateGame { teams })
            .is_err()
        {
            if announce {
                self.state.push_log("[WARN] Demo game request failed");
            }
        } else {
            if announce {
                self.state.push_log("[INFO] Demo game requested");
            }
            self.last_demo = Instant::now();
        }
    }

    fn maybe_auto_demo(&mut self) {
        if self.demo_auto.is_zero() {
            return;
        }
        if self.last_demo.elapsed() >= self.demo_auto {
            self.request_demo_game(false);
        }
    }

    fn flush_stores(&mut self) {
        match &self.store_dir {
            Some(dir) => persist::flush(dir, &mut self.state),
            None => self.state.clear_dirty(),
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    // Load before touching the terminal so a corrupt store fails readably.
    let store_dir = persist::store_dir();
    let mut loaded = AppState::new();
    if let Some(dir) = &store_dir {
        persist::load_into_state(dir, &mut loaded)
            .with_context(|| format!("loading team store from {}", dir.display()))?;
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    demo_feed::spawn_demo_provider(tx, cmd_rx);

    let mut app = App::new(loaded, Some(cmd_tx), store_dir);
    if app.store_dir.is_none() {
        app.state
            .push_log("[WARN] No storage directory resolved; teams will not be saved");
    }

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
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.maybe_auto_demo();
        app.state.prune_toasts(Instant::now());

        // Dirty stores hit disk before the frame that shows their effect.
        app.flush_stores();

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
            app.flush_stores();
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
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_board(frame, chunks[1], &app.state);

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    // Toasts sit under the modal overlays.
    render_toasts(frame, frame.size(), &app.state);

    if app.state.results_overlay {
        render_results_overlay(frame, frame.size(), &app.state);
    }
    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let current = if state.current_team.is_empty() {
        "без команды".to_string()
    } else {
        state.current_team.clone()
    };
    let title = format!("ENERGY TEAMS | Команд: {} | {}", state.teams.len(), current);
    let line1 = format!("  _+_   {title}");
    let line2 = " |###|".to_string();
    let line3 = " |___|".to_string();
    format!("{line1}\n{line2}\n{line3}")
}

fn footer_text(state: &AppState) -> String {
    if state.results_overlay {
        return "Esc/Enter Close | j/k/↑/↓ Scroll".to_string();
    }
    match state.focus {
        Focus::NameInput => "Enter Create team | Esc/Tab Back".to_string(),
        Focus::TeamList => {
            "j/k/↑/↓ Move | Enter Select | n New team | r Results | g Demo game | ? Help | q Quit"
                .to_string()
        }
    }
}

fn render_board(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(42), Constraint::Min(30)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(columns[1]);

    render_selector(frame, left[0], state);
    render_name_input(frame, left[1], state);
    render_banner(frame, right[0], state);
    render_console(frame, right[1], state);
}

fn render_selector(frame: &mut Frame, area: Rect, state: &AppState) {
    let border_style = if state.focus == Focus::TeamList && !state.results_overlay {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let block = Block::default()
        .title("Команды")
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let rows = state.selector_rows();
    let visible = inner.height as usize;
    let (start, end) = visible_range(state.selected, rows.len(), visible);

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: inner.x,
            y: inner.y + i as u16,
            width: inner.width,
            height: 1,
        };

        let row = rows[idx];
        let cursor = idx == state.selected;
        let is_current = matches!(row, SelectorRow::Team(t)
            if state.teams.get(t).is_some_and(|team| team.name == state.current_team));

        let mut style = match row {
            SelectorRow::NoSelection => Style::default().fg(Color::DarkGray),
            SelectorRow::Team(_) => Style::default(),
        };
        if is_current {
            style = Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD);
        }
        if cursor {
            style = style.bg(Color::DarkGray);
        }

        let prefix = if cursor { "> " } else { "  " };
        let line = format!("{prefix}{}", state.selector_label(row));
        frame.render_widget(Paragraph::new(line).style(style), row_area);
    }
}

fn render_name_input(frame: &mut Frame, area: Rect, state: &AppState) {
    let focused = state.focus == Focus::NameInput && !state.results_overlay;
    let border_style = if focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    let block = Block::default()
        .title("Новая команда")
        .borders(Borders::ALL)
        .border_style(border_style);

    let (text, style) = if state.name_input.is_empty() && !focused {
        ("Новая команда".to_string(), Style::default().fg(Color::DarkGray))
    } else if focused {
        (format!("{}_", state.name_input), Style::default())
    } else {
        (state.name_input.clone(), Style::default())
    };

    frame.render_widget(Paragraph::new(text).style(style).block(block), area);
}

fn render_banner(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));
    let style = if state.current_team.is_empty() {
        Style::default().add_modifier(Modifier::ITALIC)
    } else {
        Style::default().fg(Color::Yellow)
    };
    frame.render_widget(
        Paragraph::new(state.banner_line()).style(style).block(block),
        area,
    );
}

fn render_console(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Console").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 {
        return;
    }
    let text = console_text(state, inner.height as usize);
    frame.render_widget(Paragraph::new(text), inner);
}

fn console_text(state: &AppState, max_lines: usize) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let mut lines: Vec<String> = state
        .logs
        .iter()
        .rev()
        .take(max_lines)
        .cloned()
        .collect();
    lines.reverse();
    lines.join("\n")
}

fn render_results_overlay(frame: &mut Frame, area: Rect, state: &AppState) {
    let popup_area = centered_rect(70, 70, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title("🏆 Таблица результатов")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    if inner.height < 2 || inner.width == 0 {
        return;
    }

    let standings = state.standings();
    if standings.is_empty() {
        let empty = Paragraph::new("Нет команд").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let widths = results_columns();
    let header_area = Rect { height: 1, ..inner };
    render_results_header(frame, header_area, &widths);

    let list_area = Rect {
        x: inner.x,
        y: inner.y + 1,
        width: inner.width,
        height: inner.height - 1,
    };
    let visible = list_area.height as usize;
    let total = standings.len();
    let max_start = total.saturating_sub(visible);
    let start = (state.results_scroll as usize).min(max_start);
    let end = (start + visible).min(total);

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);

        let team = standings[idx];
        render_cell_text(frame, cols[0], &team.name, Style::default());
        render_cell_text(frame, cols[1], &team.score.to_string(), Style::default());
        render_cell_text(
            frame,
            cols[2],
            &team.games_played.len().to_string(),
            Style::default(),
        );
        render_cell_text(
            frame,
            cols[3],
            &team.created_at.format("%d.%m.%Y").to_string(),
            Style::default(),
        );
    }
}

fn results_columns() -> [Constraint; 4] {
    [
        Constraint::Min(14),
        Constraint::Length(8),
        Constraint::Length(13),
        Constraint::Length(12),
    ]
}

fn render_results_header(frame: &mut Frame, area: Rect, widths: &[Constraint]) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(area);
    let style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);

    render_cell_text(frame, cols[0], "Команда", style);
    render_cell_text(frame, cols[1], "Баллы", style);
    render_cell_text(frame, cols[2], "Игр сыграно", style);
    render_cell_text(frame, cols[3], "Создана", style);
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let paragraph = Paragraph::new(text.to_string()).style(style);
    frame.render_widget(paragraph, area);
}

fn render_toasts(frame: &mut Frame, area: Rect, state: &AppState) {
    let now = Instant::now();
    let mut y = area.y.saturating_add(1);

    for toast in state.toasts.iter() {
        let width = (toast.text.chars().count() as u16 + 4).min(area.width.saturating_sub(2));
        if width < 5 || y + 3 > area.bottom() {
            break;
        }
        let toast_area = Rect {
            x: area.right().saturating_sub(width + 1),
            y,
            width,
            height: 3,
        };
        frame.render_widget(Clear, toast_area);

        let mut style = toast_style(toast);
        if toast.is_fading(now) {
            style = style.add_modifier(Modifier::DIM);
        }
        let paragraph = Paragraph::new(toast.text.clone())
            .style(style)
            .block(Block::default().borders(Borders::ALL).style(style));
        frame.render_widget(paragraph, toast_area);

        y += 3;
    }
}

fn toast_style(toast: &Toast) -> Style {
    match toast.kind {
        ToastKind::Success => Style::default().bg(Color::Green).fg(Color::White),
        ToastKind::Error => Style::default().bg(Color::Red).fg(Color::White),
        ToastKind::Info => Style::default().bg(Color::Blue).fg(Color::White),
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Energy Teams - Help",
        "",
        "Team list:",
        "  j/k or ↑/↓   Move",
        "  Enter        Select team (top row clears selection)",
        "  n / Tab      New team name input",
        "  r            Results table",
        "  g            Simulate a demo game",
        "",
        "Name input:",
        "  Enter        Create team",
        "  Esc / Tab    Back to the list",
        "",
        "Global:",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
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
