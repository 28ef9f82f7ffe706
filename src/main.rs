use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

mod analytics;
mod config;
mod error;
mod input;
mod render;
mod shell;
mod task;
mod task_store;
mod ui;

use analytics::Analytics;
use config::AppConfig;
use input::{parse_task_id, NewTask, TaskForm, TaskPatch};
use task::Status;
use task_store::TaskStore;

/// Personal task tracker backed by a JSON file.
#[derive(Parser, Debug)]
#[command(name = "taskman", version)]
struct Cli {
    /// Task file (overrides `data_file` from the config).
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    /// Config file to use instead of ./taskman.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive numbered menu (the default).
    Menu,

    /// Full-screen kanban board.
    Board,

    /// Print tasks, optionally only those with one status.
    List {
        #[arg(long)]
        status: Option<Status>,
    },

    /// Case-insensitive search over title, description and category.
    Search { keyword: String },

    /// Print analytics.
    Stats,

    /// Create a task without prompts.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        priority: String,
        #[arg(long, default_value = "")]
        status: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        due: String,
        #[arg(long, default_value = "")]
        estimate: String,
    },

    /// Mark a task completed.
    Done { id: String },
}

fn main() -> Result<()> {
    install_tracing();
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let config = AppConfig::load(cli.config.as_deref(), &cwd)?;
    let path = cli.file.clone().unwrap_or_else(|| config.data_file.clone());
    if colors_disabled(&config, cli.no_color) {
        crossterm::style::force_color_output(false);
    }

    let (store, warning) = TaskStore::open(path);
    if let Some(err) = warning {
        eprintln!("⚠️  Error loading tasks ({err}). Starting fresh.");
    }
    tracing::debug!(
        path = %store.path().display(),
        next_id = store.next_id(),
        "task store ready"
    );
    let today = Local::now().date_naive();
    execute_command(cli.cmd.unwrap_or(Command::Menu), store, today)
}

/// Colors are only ever forced off, so `NO_COLOR` keeps working otherwise.
fn colors_disabled(config: &AppConfig, no_color: bool) -> bool {
    !config.color || no_color
}

fn install_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .try_init();
}

fn execute_command(command: Command, mut store: TaskStore, today: NaiveDate) -> Result<()> {
    let mut out = io::stdout().lock();
    match command {
        Command::Menu => {
            writeln!(out, "{}", "=".repeat(render::RULE))?;
            writeln!(out, "🚀 Welcome to Task Management System!")?;
            shell::Shell::new(store, io::stdin().lock(), out, today).run()?;
        }
        Command::Board => {
            drop(out);
            run_board(&mut store, today)?;
        }
        Command::List { status } => {
            let tasks = store.list(status);
            if tasks.is_empty() {
                writeln!(out, "📭 No tasks found.")?;
            } else {
                render::task_list(&mut out, tasks, today)?;
            }
        }
        Command::Search { keyword } => {
            let found = store.search(&keyword)?;
            writeln!(out, "🔍 Found {} task(s) matching '{keyword}':", found.len())?;
            for task in found {
                render::task(&mut out, task, today)?;
            }
        }
        Command::Stats => match Analytics::compute(store.tasks()) {
            Some(stats) => render::analytics(&mut out, &stats)?,
            None => writeln!(out, "📭 No tasks to analyze!")?,
        },
        Command::Add {
            title,
            description,
            priority,
            status,
            category,
            due,
            estimate,
        } => {
            let form = TaskForm {
                title,
                description,
                priority,
                status,
                category,
                due_date: due,
                estimated_hours: estimate,
            };
            let task = store.add(NewTask::try_from(form)?, today)?;
            writeln!(out, "✅ Task '{}' created with id {}", task.title, task.id)?;
        }
        Command::Done { id } => {
            let patch = TaskPatch {
                status: Some(Status::Completed),
                ..TaskPatch::default()
            };
            let task = store.edit(parse_task_id(&id)?, patch)?;
            writeln!(out, "✅ Task '{}' completed", task.title)?;
        }
    }
    Ok(())
}

fn run_board(store: &mut TaskStore, today: NaiveDate) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut board = ui::Board::new();
    let result = ui::run_app(&mut terminal, &mut board, store, today);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    store.save()?;
    result.context("board failed")
}
