// 🖥️ Review UI - Browse one batch run in the terminal
// Pages: Matched | Unmatched | Clusters. Enter toggles the detail panel.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
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
use std::collections::HashMap;
use std::io;
use ucic_resolver::{BatchReport, MatchResult, PartyRecord, PartyType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Matched,
    Unmatched,
    Clusters,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Matched => Page::Unmatched,
            Page::Unmatched => Page::Clusters,
            Page::Clusters => Page::Matched,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Matched => Page::Clusters,
            Page::Unmatched => Page::Matched,
            Page::Clusters => Page::Unmatched,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Matched => "Matched",
            Page::Unmatched => "Unmatched",
            Page::Clusters => "Clusters",
        }
    }

    fn columns(&self) -> [&'static str; 6] {
        match self {
            Page::Matched => ["Row", "Name", "DOB", "PAN", "UCIC", "Tier"],
            Page::Unmatched => ["Row", "Name", "DOB", "PAN", "Aadhar", "Type"],
            Page::Clusters => ["Cluster", "Row", "Name", "DOB", "UCIC", "Type"],
        }
    }
}

/// One table line plus the key/value pairs shown in the detail panel
#[derive(Debug, Clone)]
pub struct ReviewRow {
    pub cells: [String; 6],
    pub detail: Vec<(String, String)>,
}

pub struct App {
    pub current_page: Page,
    pub matched: Vec<ReviewRow>,
    pub unmatched: Vec<ReviewRow>,
    pub clusters: Vec<ReviewRow>,
    pub cluster_count: usize,
    pub run_id: String,
    states: HashMap<Page, TableState>,
    pub show_detail: bool,
}

impl App {
    /// `master` and `incoming` are the normalized records the report was built from
    pub fn new(report: &BatchReport, master: &[PartyRecord], incoming: &[PartyRecord]) -> Self {
        let mut matched = Vec::new();
        let mut unmatched = Vec::new();

        for resolution in &report.resolutions {
            let Some(record) = incoming.get(resolution.row) else {
                continue;
            };
            let mut detail = record_detail(record);
            detail.push(("Fingerprint".to_string(), short(&resolution.fingerprint)));

            match &resolution.result {
                MatchResult::Resolved(ucic) => {
                    let tier = resolution.tier.map(|t| t.as_str()).unwrap_or("");
                    detail.push(("Matched UCIC".to_string(), ucic.clone()));
                    detail.push(("Tier".to_string(), tier.to_string()));
                    if let Some(score) = resolution.score {
                        detail.push(("Score".to_string(), format!("{:.2}", score)));
                    }
                    matched.push(ReviewRow {
                        cells: [
                            (record.row + 1).to_string(),
                            record.identity_name(),
                            record.date_of_birth.to_string(),
                            record.primary_id.clone().unwrap_or_default(),
                            ucic.clone(),
                            tier.to_string(),
                        ],
                        detail,
                    });
                }
                MatchResult::Unresolved => unmatched.push(ReviewRow {
                    cells: [
                        (record.row + 1).to_string(),
                        record.identity_name(),
                        record.date_of_birth.to_string(),
                        record.primary_id.clone().unwrap_or_default(),
                        record.secondary_id_suffix.clone(),
                        record.party_type.to_string(),
                    ],
                    detail,
                }),
            }
        }

        let mut clusters = Vec::new();
        let mut cluster_count = 0;
        if let Some(clustering) = &report.clustering {
            for party_type in [PartyType::Person, PartyType::Organization] {
                let list = match party_type {
                    PartyType::Person => &clustering.person,
                    PartyType::Organization => &clustering.organization,
                };
                for (n, cluster) in list.iter().enumerate() {
                    cluster_count += 1;
                    let cluster_id = format!("{}_cluster_{:03}", party_type.slug(), n + 1);
                    for &member in &cluster.members {
                        let Some(record) = master.get(member) else {
                            continue;
                        };
                        let mut detail = record_detail(record);
                        detail.push(("Cluster".to_string(), cluster_id.clone()));
                        detail.push(("Cluster size".to_string(), cluster.len().to_string()));
                        clusters.push(ReviewRow {
                            cells: [
                                cluster_id.clone(),
                                (record.row + 1).to_string(),
                                record.identity_name(),
                                record.date_of_birth.to_string(),
                                record.unique_customer_id.clone(),
                                record.party_type.to_string(),
                            ],
                            detail,
                        });
                    }
                }
            }
        }

        let mut states = HashMap::new();
        for (page, rows) in [(Page::Matched, &matched), (Page::Unmatched, &unmatched), (Page::Clusters, &clusters)] {
            let mut state = TableState::default();
            if !rows.is_empty() {
                state.select(Some(0));
            }
            states.insert(page, state);
        }

        Self {
            current_page: Page::Matched,
            matched,
            unmatched,
            clusters,
            cluster_count,
            run_id: report.run_id.clone(),
            states,
            show_detail: false,
        }
    }

    pub fn rows(&self) -> &[ReviewRow] {
        match self.current_page {
            Page::Matched => &self.matched,
            Page::Unmatched => &self.unmatched,
            Page::Clusters => &self.clusters,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.states.get(&self.current_page).and_then(|s| s.selected())
    }

    pub fn selected_row(&self) -> Option<&ReviewRow> {
        self.selected().and_then(|i| self.rows().get(i))
    }

    fn select(&mut self, index: Option<usize>) {
        self.states.entry(self.current_page).or_default().select(index);
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn next(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let i = self.selected().map(|i| (i + 20).min(len - 1)).unwrap_or(0);
        self.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = self.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
        self.select(Some(i));
    }

    pub fn first(&mut self) {
        if !self.rows().is_empty() {
            self.select(Some(0));
        }
    }

    pub fn last(&mut self) {
        let len = self.rows().len();
        if len > 0 {
            self.select(Some(len - 1));
        }
    }
}

fn record_detail(record: &PartyRecord) -> Vec<(String, String)> {
    let mut detail = vec![
        ("Source row".to_string(), (record.row + 1).to_string()),
        ("Party type".to_string(), record.party_type.to_string()),
    ];
    match record.party_type {
        PartyType::Person => {
            detail.push(("First name".to_string(), record.first_name.clone()));
            detail.push(("Last name".to_string(), record.last_name.clone()));
        }
        PartyType::Organization => {
            detail.push(("Organization".to_string(), record.organization_name.clone()));
        }
    }
    let pan = match (&record.primary_id, record.primary_id_valid) {
        (Some(pan), true) => pan.clone(),
        (Some(pan), false) => format!("{} (invalid)", pan),
        (None, _) => String::new(),
    };
    detail.push(("PAN".to_string(), pan));
    detail.push(("Aadhar suffix".to_string(), record.secondary_id_suffix.clone()));
    detail.push(("DOB".to_string(), record.date_of_birth.to_string()));
    if record.has_ucic() {
        detail.push(("UCIC".to_string(), record.unique_customer_id.clone()));
    }
    detail
}

fn short(fingerprint: &str) -> String {
    fingerprint.chars().take(12).collect()
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('1') => app.current_page = Page::Matched,
                KeyCode::Char('2') => app.current_page = Page::Unmatched,
                KeyCode::Char('3') => app.current_page = Page::Clusters,
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.first(),
                KeyCode::End => app.last(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
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
    let pages = [
        (Page::Matched, app.matched.len(), Color::Green),
        (Page::Unmatched, app.unmatched.len(), Color::Red),
        (Page::Clusters, app.cluster_count, Color::Magenta),
    ];

    let mut tab_spans = vec![];
    for (i, (page, count, color)) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
        tab_spans.push(Span::styled(format!(" ({})", count), Style::default().fg(*color)));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Run {}", short(&app.run_id)),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let page = app.current_page;

    let header_cells = page.columns().into_iter().map(|h| {
        Cell::from(h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let accent = match page {
        Page::Matched => Color::Green,
        Page::Unmatched => Color::Red,
        Page::Clusters => Color::Magenta,
    };

    let rows: Vec<Row> = app
        .rows()
        .iter()
        .map(|row| {
            let cells = row.cells.iter().enumerate().map(|(i, text)| {
                let cell = Cell::from(truncate(text, 30));
                if (page == Page::Clusters && i == 0) || (page == Page::Matched && i == 4) {
                    cell.style(Style::default().fg(accent))
                } else {
                    cell
                }
            });
            Row::new(cells.collect::<Vec<_>>()).height(1)
        })
        .collect();

    let widths = match page {
        Page::Clusters => [
            Constraint::Length(26),
            Constraint::Length(7),
            Constraint::Length(32),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(14),
        ],
        _ => [
            Constraint::Length(7),
            Constraint::Length(32),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(14),
        ],
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" {} ", page.title())),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    let state = app.states.entry(page).or_default();
    f.render_stateful_widget(table, area, state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = match app.selected_row() {
        Some(row) => row
            .detail
            .iter()
            .map(|(key, value)| {
                Line::from(vec![
                    Span::styled(format!("{:<14}", key), Style::default().fg(Color::Cyan)),
                    Span::raw(value.clone()),
                ])
            })
            .collect(),
        None => vec![Line::from(Span::styled(
            "Nothing selected",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Details "),
    );

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.rows().len();

    let status_spans = vec![
        Span::styled(format!(" Row: {}/{} ", selected, total), Style::default().fg(Color::Cyan)),
        Span::raw(" | "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Details | "),
        Span::styled("Tab/1-3", Style::default().fg(Color::Yellow)),
        Span::raw(" Page | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" Fast | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
