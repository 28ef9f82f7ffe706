//! Full-screen kanban board: one column per status.

use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io;
use tracing::warn;

use crate::input::TaskPatch;
use crate::task::{Status, Task};
use crate::task_store::TaskStore;

const HELP: &str = "←/→ column  ↑/↓ task  Enter advance status  q quit";

#[derive(Debug, Default)]
pub struct Board {
    selected_status: usize,
    selected_task: usize,
    message: Option<String>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    fn status(&self) -> Status {
        Status::ALL[self.selected_status]
    }

    fn column_len(&self, store: &TaskStore) -> usize {
        store.list(Some(self.status())).len()
    }

    fn clamp_task(&mut self, store: &TaskStore) {
        let len = self.column_len(store);
        self.selected_task = self.selected_task.min(len.saturating_sub(1));
    }

    /// Move the selected task one column to the right and persist.
    fn advance(&mut self, store: &mut TaskStore) {
        let Some(id) = store
            .list(Some(self.status()))
            .get(self.selected_task)
            .map(|t| t.id)
        else {
            return;
        };
        let patch = TaskPatch {
            status: Some(self.status().advance()),
            ..TaskPatch::default()
        };
        self.message = match store.edit(id, patch) {
            Ok(task) => Some(format!("#{} moved to {}", task.id, task.status)),
            Err(err) => {
                warn!(%err, "failed to advance task");
                Some(err.to_string())
            }
        };
        self.clamp_task(store);
    }

    /// Returns `true` when the board should close.
    pub fn handle_key(&mut self, code: KeyCode, store: &mut TaskStore) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left => {
                self.selected_status = self.selected_status.saturating_sub(1);
                self.clamp_task(store);
            }
            KeyCode::Right => {
                self.selected_status = (self.selected_status + 1).min(Status::ALL.len() - 1);
                self.clamp_task(store);
            }
            KeyCode::Up => self.selected_task = self.selected_task.saturating_sub(1),
            KeyCode::Down => {
                self.selected_task += 1;
                self.clamp_task(store);
            }
            KeyCode::Enter => self.advance(store),
            _ => {}
        }
        false
    }
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    board: &mut Board,
    store: &mut TaskStore,
    today: NaiveDate,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, board, store, today))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && board.handle_key(key.code, store) {
                return Ok(());
            }
        }
    }
}

fn task_item(task: &Task, today: NaiveDate) -> ListItem<'static> {
    let mut spans = vec![
        Span::raw(format!("[#{}] ", task.id)),
        Span::styled(task.title.clone(), Style::default().fg(Color::White)),
    ];
    if !task.due_date.is_empty() {
        let style = if task.is_overdue(today) {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!(" (Due: {})", task.due_date), style));
    }
    ListItem::new(Line::from(spans))
}

pub fn draw(f: &mut Frame, board: &Board, store: &TaskStore, today: NaiveDate) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(rows[0]);

    for (i, status) in Status::ALL.into_iter().enumerate() {
        let tasks = store.list(Some(status));
        let title = format!("{} {} ({})", status.glyph(), status.as_str().to_uppercase(), tasks.len());
        let items: Vec<ListItem> = tasks.iter().map(|t| task_item(t, today)).collect();
        let focused = board.selected_status == i;

        let list = List::new(items)
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(if focused {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default()
                    }),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = ListState::default().with_selected(focused.then_some(board.selected_task));
        f.render_stateful_widget(list, columns[i], &mut state);
    }

    let footer = board.message.as_deref().unwrap_or(HELP);
    f.render_widget(Paragraph::new(footer), rows[1]);
}
