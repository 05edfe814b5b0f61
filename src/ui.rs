use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use fundef_registry::{ApportionmentReport, Draft, ServantStatus, TeacherRecord};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

const PAGE_JUMP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Teachers,
    Apportionment,
    Drafts,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Teachers => Page::Apportionment,
            Page::Apportionment => Page::Drafts,
            Page::Drafts => Page::Teachers,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Teachers => Page::Drafts,
            Page::Apportionment => Page::Teachers,
            Page::Drafts => Page::Apportionment,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Teachers => "Professores",
            Page::Apportionment => "Rateio",
            Page::Drafts => "Rascunhos",
        }
    }
}

pub struct App {
    pub teachers: Vec<TeacherRecord>,
    pub filtered_teachers: Vec<TeacherRecord>,
    pub state: TableState,
    pub drafts: Vec<Draft>,
    pub drafts_state: TableState,
    pub report: Option<ApportionmentReport>,
    pub report_state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
    pub status_filter: Option<ServantStatus>,
}

impl App {
    pub fn new(
        teachers: Vec<TeacherRecord>,
        drafts: Vec<Draft>,
        report: Option<ApportionmentReport>,
    ) -> Self {
        let filtered_teachers = teachers.clone();

        let mut app = Self {
            teachers,
            filtered_teachers,
            state: TableState::default(),
            drafts,
            drafts_state: TableState::default(),
            report,
            report_state: TableState::default(),
            current_page: Page::Teachers,
            show_detail: false,
            status_filter: None,
        };

        for page in [Page::Teachers, Page::Apportionment, Page::Drafts] {
            if app.len_of(page) > 0 {
                app.state_of(page).select(Some(0));
            }
        }
        app
    }

    fn len_of(&self, page: Page) -> usize {
        match page {
            Page::Teachers => self.filtered_teachers.len(),
            Page::Apportionment => self.report.as_ref().map_or(0, |r| r.rows.len()),
            Page::Drafts => self.drafts.len(),
        }
    }

    fn state_of(&mut self, page: Page) -> &mut TableState {
        match page {
            Page::Teachers => &mut self.state,
            Page::Apportionment => &mut self.report_state,
            Page::Drafts => &mut self.drafts_state,
        }
    }

    fn select(&mut self, index: Option<usize>) {
        let page = self.current_page;
        self.state_of(page).select(index);
    }

    fn selected(&mut self) -> Option<usize> {
        let page = self.current_page;
        self.state_of(page).selected()
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_teacher(&self) -> Option<&TeacherRecord> {
        self.state.selected().and_then(|i| self.filtered_teachers.get(i))
    }

    pub fn apply_filter(&mut self, status: Option<ServantStatus>) {
        self.status_filter = status;

        self.filtered_teachers = match status {
            None => self.teachers.clone(),
            Some(status) => self
                .teachers
                .iter()
                .filter(|t| t.status == status)
                .cloned()
                .collect(),
        };

        // Reset selection to first item
        if !self.filtered_teachers.is_empty() {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
        }
    }

    pub fn clear_filter(&mut self) {
        self.apply_filter(None);
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn next(&mut self) {
        let len = self.len_of(self.current_page);
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
        let len = self.len_of(self.current_page);
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
        let len = self.len_of(self.current_page);
        if len == 0 {
            return;
        }
        let i = match self.selected() {
            Some(i) => (i + PAGE_JUMP).min(len - 1),
            None => 0,
        };
        self.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.len_of(self.current_page) == 0 {
            return;
        }
        let i = self.selected().map_or(0, |i| i.saturating_sub(PAGE_JUMP));
        self.select(Some(i));
    }

    pub fn first(&mut self) {
        if self.len_of(self.current_page) > 0 {
            self.select(Some(0));
        }
    }

    pub fn last(&mut self) {
        let len = self.len_of(self.current_page);
        if len > 0 {
            self.select(Some(len - 1));
        }
    }

    pub fn stats(&self) -> TeacherStats {
        let mut stats = TeacherStats::default();

        for teacher in &self.teachers {
            match teacher.status {
                ServantStatus::Active => stats.active += 1,
                ServantStatus::Retired => stats.retired += 1,
                ServantStatus::Deceased => stats.deceased += 1,
                ServantStatus::NoBond => stats.no_bond += 1,
            }
            stats.total_months += teacher.months_worked as u64;
        }

        stats
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct TeacherStats {
    pub active: usize,
    pub retired: usize,
    pub deceased: usize,
    pub no_bond: usize,
    pub total_months: u64,
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

    res?;
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
                KeyCode::Char('c') => {
                    app.clear_filter();
                    app.current_page = Page::Teachers;
                }
                KeyCode::Char('1') if app.current_page == Page::Teachers => {
                    app.apply_filter(Some(ServantStatus::Active))
                }
                KeyCode::Char('2') if app.current_page == Page::Teachers => {
                    app.apply_filter(Some(ServantStatus::Retired))
                }
                KeyCode::Char('3') if app.current_page == Page::Teachers => {
                    app.apply_filter(Some(ServantStatus::Deceased))
                }
                KeyCode::Char('4') if app.current_page == Page::Teachers => {
                    app.apply_filter(Some(ServantStatus::NoBond))
                }
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

    if app.show_detail && app.current_page == Page::Teachers {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_teachers(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Teachers => render_teachers(f, chunks[1], app),
            Page::Apportionment => render_apportionment(f, chunks[1], app),
            Page::Drafts => render_drafts(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.stats();

    let mut tab_spans = vec![];
    for (i, page) in [Page::Teachers, Page::Apportionment, Page::Drafts].iter().enumerate() {
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
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Total: {}", app.teachers.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Ativos {}", stats.active),
        Style::default().fg(Color::Green),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("Meses {}", stats.total_months),
        Style::default().fg(Color::Cyan),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn status_color(status: ServantStatus) -> Color {
    match status {
        ServantStatus::Active => Color::Green,
        ServantStatus::Retired => Color::Cyan,
        ServantStatus::Deceased => Color::Red,
        ServantStatus::NoBond => Color::Yellow,
    }
}

fn render_teachers(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.filtered_teachers.iter().map(|t| {
        let color = status_color(t.status);
        Row::new(vec![
            Cell::from(truncate(&t.name, 30)),
            Cell::from(t.cpf.formatted()),
            Cell::from(truncate(&t.school, 24)),
            Cell::from(t.status.label()).style(Style::default().fg(color)),
            Cell::from(t.months_worked.to_string()),
        ])
        .height(1)
    });

    let title = match app.status_filter {
        Some(status) => format!(" Professores ({}) ", status.label()),
        None => " Professores ".to_string(),
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(16),
            Constraint::Length(26),
            Constraint::Length(13),
            Constraint::Length(6),
        ],
    )
    .header(header_row(&["Nome", "CPF", "Escola", "Situação", "Meses"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_apportionment(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(report) = &app.report else {
        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from("  Nenhum rateio calculado."),
            Line::from(""),
            Line::from(Span::styled(
                "  Abra a interface com --total <valor> para calcular o rateio.",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title(" Rateio "));
        f.render_widget(hint, area);
        return;
    };

    let rows = report.rows.iter().map(|r| {
        Row::new(vec![
            Cell::from(truncate(&r.name, 30)),
            Cell::from(r.cpf.clone()),
            Cell::from(r.months_worked.to_string()),
            Cell::from(r.share.to_brl()).style(Style::default().fg(Color::Green)),
        ])
        .height(1)
    });

    let title = format!(" {} ", report.summary());
    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(16),
            Constraint::Length(6),
            Constraint::Length(22),
        ],
    )
    .header(header_row(&["Nome", "CPF", "Meses", "Valor"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(title),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.report_state);
}

fn render_drafts(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.drafts.iter().map(|d| {
        let name = d.reference_name();
        Row::new(vec![
            Cell::from(d.id.to_string()),
            Cell::from(if name.is_empty() { "(sem nome)".to_string() } else { truncate(&name, 30) }),
            Cell::from(d.form.cpf.clone().unwrap_or_default()),
            Cell::from(d.updated_at.format("%d/%m/%Y %H:%M").to_string()),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(32),
            Constraint::Length(16),
            Constraint::Length(18),
        ],
    )
    .header(header_row(&["ID", "Nome", "CPF", "Atualizado"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Rascunhos "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.drafts_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &mut App) {
    let page = app.current_page;
    let selected = app.state_of(page).selected().map(|i| i + 1).unwrap_or(0);
    let total = app.len_of(page);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if page == Page::Teachers {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled("1-4", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Situação"));
        if app.status_filter.is_some() {
            status_spans.push(Span::raw(" ("));
            status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" clear)"));
        }
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Details | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let Some(t) = app.selected_teacher() else {
        let empty = Paragraph::new("Nenhum professor selecionado")
            .block(Block::default().borders(Borders::ALL).title(" Detalhes "));
        f.render_widget(empty, area);
        return;
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let section = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let field = |name: &'static str, value: String| {
        Line::from(vec![Span::styled(format!("  {}: ", name), label), Span::raw(value)])
    };

    let content = vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {}", t.name), section)),
        Line::from(""),
        field("CPF", t.cpf.formatted()),
        field("RG", t.rg.clone()),
        field("Telefone", t.phone.clone()),
        field("E-mail", t.email.clone()),
        field("Endereço", t.address.clone()),
        Line::from(""),
        Line::from(Span::styled("  FUNCIONAL", section)),
        field("Matrícula", t.registration.clone()),
        field("Escola", t.school.clone()),
        field("Cargo", t.role.clone()),
        field("Admissão", t.admission_date.format("%d/%m/%Y").to_string()),
        field("Situação", t.status.label().to_string()),
        field("Carga horária", format!("{}h", t.workload_hours)),
        Line::from(""),
        Line::from(Span::styled("  BANCÁRIO", section)),
        field("Banco", t.bank.clone()),
        field("Agência", t.branch.clone()),
        field("Conta", format!("{} ({})", t.account, t.account_type.label())),
        Line::from(""),
        Line::from(Span::styled("  FUNDEF", section)),
        field(
            "Período",
            format!(
                "{} a {}",
                t.fundef_start.format("%d/%m/%Y"),
                t.fundef_end.format("%d/%m/%Y")
            ),
        ),
        field("Meses trabalhados", t.months_worked.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "  Press Enter to close",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ];

    let detail_panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Detalhes "),
    );

    f.render_widget(detail_panel, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
