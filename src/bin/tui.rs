use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Frame, Terminal, layout::{Constraint, Direction, Layout, Rect}, style::{Color, Modifier, Style}, text::{Line, Span}, widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, TableState}};
use tokio::sync::mpsc::{self, UnboundedSender};

use taskdeck::client::{self, api::TaskApi, form::{Field, TaskForm}, pagination, state::{Command, Dialog, Mode, Outcome, ToastKind, ViewState}};
use taskdeck::config::Config;
use taskdeck::domain::task::{Priority, Status};

const TICK: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    let api = TaskApi::new(config.api_url.clone());

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, api, config).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, api: TaskApi, config: Config) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut state = ViewState::new(config.page_size);
    let first = state.fetch(1);
    dispatch(&api, &tx, vec![first]);

    loop {
        while let Ok(outcome) = rx.try_recv() {
            let commands = state.apply(outcome);
            dispatch(&api, &tx, commands);
        }
        state.expire_toast(Instant::now());
        terminal.draw(|f| draw(f, &state, &config.api_url))?;
        if state.quit { break; }

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                // Only act on key presses; ignore repeats and releases to prevent duplicate input
                if key.kind != KeyEventKind::Press { continue; }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') { break; }
                let commands = state.on_key(key.code);
                dispatch(&api, &tx, commands);
            }
        }
    }
    Ok(())
}

fn dispatch(api: &TaskApi, tx: &UnboundedSender<Outcome>, commands: Vec<Command>) {
    for command in commands {
        let api = api.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(client::execute(&api, command).await);
        });
    }
}

fn priority_color(p: Priority) -> Color {
    match p {
        Priority::Minor => Color::Gray,
        Priority::Low => Color::Green,
        Priority::Moderate => Color::Yellow,
        Priority::Important => Color::Rgb(255, 165, 0),
        Priority::Critical => Color::Red,
    }
}

fn draw(f: &mut Frame, state: &ViewState, api_url: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(Priority::ALL.len() as u16 + 2),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.size());

    let loading = if state.loading { "  (loading…)" } else { "" };
    let header = Paragraph::new(format!("a: add  e/Enter: edit  d: delete  space: done  /: search  p/s: filters  ←/→: page  q: quit{loading}"))
        .block(Block::default().borders(Borders::ALL).title(format!("taskdeck @ {api_url}")));
    f.render_widget(header, chunks[0]);

    draw_summary(f, state, chunks[1]);
    draw_filters(f, state, chunks[2]);
    draw_table(f, state, chunks[3]);
    draw_pager(f, state, chunks[4]);

    match &state.mode {
        Mode::Browse | Mode::Search => {}
        Mode::PriorityFilter { cursor } => {
            let items = Priority::ALL.iter().map(|p| {
                let count = state.data.priority_counts.get(p).copied().unwrap_or(0);
                (state.priority_filter.contains(p), format!("{p} ({count})"), Style::default().fg(priority_color(*p)))
            });
            draw_picker(f, "Filter by Priority", items.collect(), *cursor);
        }
        Mode::StatusFilter { cursor } => {
            let items = Status::ALL.iter().map(|s| {
                let count = state.data.status_counts.get(s).copied().unwrap_or(0);
                (state.status_filter.contains(s), format!("{s} ({count})"), Style::default())
            });
            draw_picker(f, "Filter by status", items.collect(), *cursor);
        }
        Mode::Adding(dialog) => draw_dialog(f, "Add Task", "Create task here. Enter to save, Esc to cancel.", dialog),
        Mode::Editing { dialog, .. } => draw_dialog(f, "Edit Task", "Update the task. Enter to save, Esc to cancel.", dialog),
        Mode::ConfirmDelete { task, submitting } => {
            let area = centered(f.size(), 60, 7);
            f.render_widget(Clear, area);
            let hint = if *submitting { "Deleting…" } else { "y/Enter: delete  n/Esc: cancel" };
            let body = vec![
                Line::from("This action cannot be undone. This will permanently delete:"),
                Line::from(Span::styled(task.description.clone(), Style::default().add_modifier(Modifier::BOLD))),
                Line::from(""),
                Line::from(hint),
            ];
            f.render_widget(Paragraph::new(body).block(Block::default().borders(Borders::ALL).title("Are you sure?")), area);
        }
    }

    if let Some(toast) = &state.toast {
        let width = (toast.message.len().max(toast.title.len()) as u16 + 4).min(f.size().width);
        let area = Rect { x: f.size().width.saturating_sub(width), y: f.size().height.saturating_sub(4), width, height: 4.min(f.size().height) };
        let color = match toast.kind { ToastKind::Success => Color::Green, ToastKind::Error => Color::Red };
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(toast.message.clone())
                .block(Block::default().borders(Borders::ALL).title(toast.title).border_style(Style::default().fg(color))),
            area,
        );
    }
}

fn draw_summary(f: &mut Frame, state: &ViewState, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(20)])
        .split(area);

    let total = Paragraph::new(vec![Line::from(""), Line::from(Span::styled(state.data.total_tasks.to_string(), Style::default().add_modifier(Modifier::BOLD)))])
        .block(Block::default().borders(Borders::ALL).title("Total Tasks"));
    f.render_widget(total, cols[0]);

    let lines: Vec<Line> = Priority::ALL
        .iter()
        .map(|p| {
            let count = state.data.priority_counts.get(p).copied().unwrap_or(0);
            let mut spans = vec![Span::styled(format!("● {p:<10} {count:>4}   "), Style::default().fg(priority_color(*p)))];
            for s in Status::ALL {
                let n = state.data.priority_status_counts.get(p).and_then(|row| row.get(&s)).copied().unwrap_or(0);
                spans.push(Span::raw(format!("{s}: {n:<5}")));
            }
            Line::from(spans)
        })
        .collect();
    f.render_widget(Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Tasks by Priority and Status")), cols[1]);
}

fn draw_filters(f: &mut Frame, state: &ViewState, area: Rect) {
    let search_style = if state.mode == Mode::Search { Style::default().fg(Color::Cyan) } else { Style::default() };
    let cursor = if state.mode == Mode::Search { "_" } else { "" };
    let selected = |n: usize, empty: &'static str| if n > 0 { format!("{n} selected") } else { empty.to_string() };
    let mut spans = vec![
        Span::styled(format!("Search: {}{cursor}", state.search), search_style),
        Span::raw("   |   "),
        Span::raw(selected(state.priority_filter.len(), "Filter by Priority")),
        Span::raw("   |   "),
        Span::raw(selected(state.status_filter.len(), "Filter by status")),
    ];
    if state.is_filtering() {
        spans.push(Span::raw("   |   "));
        spans.push(Span::styled("r: Reset", Style::default().fg(Color::Red)));
        spans.push(Span::raw(format!("   Results: {}", state.data.total_count)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title("Filters")), area);
}

fn draw_table(f: &mut Frame, state: &ViewState, area: Rect) {
    let rows: Vec<Row> = state.data.tasks.iter().map(|t| {
        let mark = if t.status == Status::Done { "[x]" } else { "[ ]" };
        let due = t.due_date.map(|d| d.format("%b %-d, %Y").to_string()).unwrap_or_else(|| "—".to_string());
        Row::new(vec![
            Cell::from(mark),
            Cell::from(t.description.clone()),
            Cell::from(t.status.as_str()),
            Cell::from(Span::styled(t.priority.as_str(), Style::default().fg(priority_color(t.priority)))),
            Cell::from(due),
        ])
    }).collect();
    let widths = [Constraint::Length(4), Constraint::Min(20), Constraint::Length(10), Constraint::Length(10), Constraint::Length(14)];
    let table = Table::new(rows, widths)
        .header(Row::new(vec!["", "Description", "Status", "Priority", "Due Date"]).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(Block::default().borders(Borders::ALL).title("Tasks"))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
        .highlight_symbol(">> ");
    let mut table_state = TableState::default();
    if !state.data.tasks.is_empty() && state.mode != Mode::Search { table_state.select(Some(state.selected)); }
    f.render_stateful_widget(table, area, &mut table_state);
}

fn draw_pager(f: &mut Frame, state: &ViewState, area: Rect) {
    let current = u64::from(state.data.current_page);
    let total = state.data.total_pages;
    let dim = Style::default().fg(Color::DarkGray);
    let mut spans = vec![Span::styled("< Previous ", if pagination::has_prev(current) { Style::default() } else { dim })];
    let (pages, ellipsis) = pagination::window(current, total);
    for page in pages {
        let style = if page == current { Style::default().add_modifier(Modifier::REVERSED) } else { Style::default() };
        spans.push(Span::styled(format!(" {page} "), style));
    }
    if ellipsis { spans.push(Span::raw(" ... ")); }
    spans.push(Span::styled(" Next >", if pagination::has_next(current, total) { Style::default() } else { dim }));
    f.render_widget(Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL)), area);
}

fn draw_picker(f: &mut Frame, title: &str, items: Vec<(bool, String, Style)>, cursor: usize) {
    let area = centered(f.size(), 34, items.len() as u16 + 4);
    f.render_widget(Clear, area);
    let list: Vec<ListItem> = items
        .into_iter()
        .enumerate()
        .map(|(i, (checked, label, style))| {
            let mark = if checked { "[x]" } else { "[ ]" };
            let style = if i == cursor { style.add_modifier(Modifier::REVERSED) } else { style };
            ListItem::new(Line::from(Span::styled(format!("{mark} {label}"), style)))
        })
        .collect();
    f.render_widget(List::new(list).block(Block::default().borders(Borders::ALL).title(format!("{title} (space: toggle, Esc: close)"))), area);
}

fn draw_dialog(f: &mut Frame, title: &str, subtitle: &str, dialog: &Dialog) {
    let area = centered(f.size(), 64, 12);
    f.render_widget(Clear, area);
    let form: &TaskForm = &dialog.form;
    let focus = |field: Field| if form.field == field { Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD) } else { Style::default() };
    let caret = |field: Field| if form.field == field { "_" } else { "" };
    let mut lines = vec![
        Line::from(subtitle.to_string()),
        Line::from(""),
        Line::from(Span::styled(format!("Description: {}{}", form.description, caret(Field::Description)), focus(Field::Description))),
        Line::from(Span::styled(format!("Status:      ◀ {} ▶", form.status), focus(Field::Status))),
        Line::from(Span::styled(format!("Priority:    ◀ {} ▶", form.priority), focus(Field::Priority))),
        Line::from(Span::styled(format!("Due date:    {}{} (YYYY-MM-DD, blank for none)", form.due_date, caret(Field::DueDate)), focus(Field::DueDate))),
        Line::from(""),
    ];
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(error.to_string(), Style::default().fg(Color::Red))));
    }
    lines.push(Line::from(if dialog.submitting { "Saving…" } else { "Tab: next field  ←/→: change choice" }));
    f.render_widget(Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title.to_string())), area);
}

fn centered(outer: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(outer.width);
    let height = height.min(outer.height);
    Rect { x: outer.x + (outer.width - width) / 2, y: outer.y + (outer.height - height) / 2, width, height }
}
