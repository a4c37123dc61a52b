use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use weigh_in::{ContestantRegistry, FlatStore, Leaderboard, RankedContestant, NO_CONTESTANTS};

const PAGE_SIZE: usize = 20;

pub struct App {
    pub leaderboard: Leaderboard,
    pub state: TableState,
    pub show_detail: bool,
    pub source: String,
}

impl App {
    pub fn new(leaderboard: Leaderboard, source: String) -> Self {
        let mut app = Self {
            leaderboard,
            state: TableState::default(),
            show_detail: false,
            source,
        };
        app.reset_selection();
        app
    }

    fn reset_selection(&mut self) {
        if self.leaderboard.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    /// Swap in a fresh leaderboard, keeping the selection where possible
    pub fn reload(&mut self, leaderboard: Leaderboard) {
        let previous = self.state.selected();
        self.leaderboard = leaderboard;

        match (previous, self.leaderboard.len()) {
            (_, 0) => self.state.select(None),
            (Some(i), len) => self.state.select(Some(i.min(len - 1))),
            (None, _) => self.state.select(Some(0)),
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected(&self) -> Option<&RankedContestant> {
        self.state.selected().and_then(|i| self.leaderboard.get(i))
    }

    pub fn next(&mut self) {
        let len = self.leaderboard.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.leaderboard.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.leaderboard.len();
        if len == 0 {
            return;
        }
        let i = self
            .state
            .selected()
            .map(|i| (i + PAGE_SIZE).min(len - 1))
            .unwrap_or(0);
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.leaderboard.is_empty() {
            return;
        }
        let i = self
            .state
            .selected()
            .map(|i| i.saturating_sub(PAGE_SIZE))
            .unwrap_or(0);
        self.state.select(Some(i));
    }

    pub fn stats(&self) -> LeaderboardStats {
        let mut stats = LeaderboardStats::default();

        for entry in self.leaderboard.entries() {
            stats.contestants += 1;
            stats.total_lost += entry.record.weight_lost;
            if entry.record.weight_lost < 0.0 {
                stats.gaining += 1;
            }
        }

        stats
    }
}

#[derive(Default)]
pub struct LeaderboardStats {
    pub contestants: usize,
    pub total_lost: f64,
    pub gaining: usize,
}

pub fn run_ui<S: FlatStore>(app: &mut App, registry: &ContestantRegistry<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, registry);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.context("leaderboard UI failed")
}

fn run_app<B: ratatui::backend::Backend, S: FlatStore>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    registry: &ContestantRegistry<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Char('r') => app.reload(registry.rankings()),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home if !app.leaderboard.is_empty() => app.state.select(Some(0)),
                KeyCode::End if !app.leaderboard.is_empty() => {
                    app.state.select(Some(app.leaderboard.len() - 1))
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Leaderboard
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.stats();

    let spans = vec![
        Span::styled(
            "Leaderboard",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Contestants: {}", stats.contestants),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("↓ {:.1} lbs total", stats.total_lost),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(format!("↑ {}", stats.gaining), Style::default().fg(Color::Red)),
        Span::raw("  |  "),
        Span::styled(app.source.clone(), Style::default().fg(Color::DarkGray)),
    ];

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn loss_color(percentage_lost: f64) -> Color {
    if percentage_lost > 0.0 {
        Color::Green
    } else if percentage_lost < 0.0 {
        Color::Red
    } else {
        Color::White
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" Rankings ");

    if app.leaderboard.is_empty() {
        let empty = Paragraph::new(format!("  {}", NO_CONTESTANTS)).block(block);
        f.render_widget(empty, area);
        return;
    }

    let header_cells = ["#", "Name", "Starting", "Current", "Lost", "% Lost", "Age"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.leaderboard.entries().iter().map(|entry| {
        let r = &entry.record;
        let color = loss_color(r.percentage_lost);

        Row::new(vec![
            Cell::from(format!("{}", entry.rank)),
            Cell::from(truncate(&entry.name, 24)),
            Cell::from(format!("{:.1}", r.starting_weight)),
            Cell::from(format!("{:.1}", r.current_weight)),
            Cell::from(format!("{:.1}", r.weight_lost)).style(Style::default().fg(color)),
            Cell::from(format!("{:.1}%", r.percentage_lost)).style(Style::default().fg(color)),
            Cell::from(format!("{}", r.age)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(26),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(5),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let spans = vec![
        Span::styled(
            format!(" Row: {}/{} ", selected, app.leaderboard.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Details | "),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" Reload | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" Fast | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Contestant Details ");

    let Some(entry) = app.selected() else {
        f.render_widget(Paragraph::new("No contestant selected").block(block), area);
        return;
    };
    let r = &entry.record;
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let field = |name: &'static str, value: String| {
        Line::from(vec![Span::styled(format!("  {}: ", name), label), Span::raw(value)])
    };

    let content = vec![
        Line::from(""),
        field("Rank", format!("{}", entry.rank)),
        field("Name", entry.name.clone()),
        Line::from(""),
        field("Date of Birth", r.date_of_birth.clone()),
        field("Age", format!("{}", r.age)),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        field("Starting", format!("{:.1} lbs", r.starting_weight)),
        field("Current", format!("{:.1} lbs", r.current_weight)),
        Line::from(vec![
            Span::styled("  Lost: ", label),
            Span::styled(
                format!("{:.1} lbs ({:.1}%)", r.weight_lost, r.percentage_lost),
                Style::default().fg(loss_color(r.percentage_lost)),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Press Enter to close",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]),
    ];

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weigh_in::{ContestantRecord, Snapshot};

    fn board(n: usize) -> Leaderboard {
        let snapshot: Snapshot = (0..n)
            .map(|i| {
                let mut record = ContestantRecord::new("1990-01-01".to_string(), 36, 200.0);
                record.set_derived(i as f64, i as f64 / 2.0);
                (format!("C{}", i), record)
            })
            .collect();
        Leaderboard::from_snapshot(&snapshot)
    }

    #[test]
    fn test_empty_board_has_no_selection() {
        let mut app = App::new(board(0), "contestants.json".into());

        assert_eq!(app.state.selected(), None);
        app.next();
        app.page_down();
        assert_eq!(app.state.selected(), None);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = App::new(board(3), "contestants.json".into());

        app.previous();
        assert_eq!(app.state.selected(), Some(2));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_reload_clamps_selection() {
        let mut app = App::new(board(5), "contestants.json".into());
        app.state.select(Some(4));

        app.reload(board(2));
        assert_eq!(app.state.selected(), Some(1));

        app.reload(board(0));
        assert_eq!(app.state.selected(), None);
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("Zoë", 10), "Zoë");
        assert_eq!(truncate("Bartholomew Featherstonehaugh", 10), "Barthol...");
    }
}
