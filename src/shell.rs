//! Numbered-menu session driving a [`TaskStore`].

use std::io::{self, BufRead, Write};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::analytics::Analytics;
use crate::error::{InputError, StoreError};
use crate::input::{parse_task_id, EditForm, NewTask, TaskForm, TaskPatch};
use crate::render::{self, RULE};
use crate::task::Status;
use crate::task_store::TaskStore;

const MENU: [&str; 8] = [
    "1. ➕ Add New Task",
    "2. 📋 View All Tasks",
    "3. 🔍 Search Tasks",
    "4. ✏️  Edit Task",
    "5. 🗑️  Delete Task",
    "6. 📊 View Analytics",
    "7. 🔧 Filter by Status",
    "8. 💾 Save & Exit",
];

pub struct Shell<R, W> {
    store: TaskStore,
    input: R,
    out: W,
    today: NaiveDate,
    eof: bool,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(store: TaskStore, input: R, out: W, today: NaiveDate) -> Self {
        Shell {
            store,
            input,
            out,
            today,
            eof: false,
        }
    }

    /// Run until the user picks Save & Exit or input runs out, then hand the
    /// store back.
    pub fn run(mut self) -> io::Result<TaskStore> {
        loop {
            render::banner(&mut self.out, RULE, "🎯 TASK MANAGEMENT SYSTEM")?;
            for line in MENU {
                writeln!(self.out, "{line}")?;
            }
            render::rule(&mut self.out, RULE)?;

            let choice = self.prompt("\nEnter your choice (1-8): ")?;
            if self.eof {
                debug!("input closed, saving and exiting");
                self.exit()?;
                return Ok(self.store);
            }
            match choice.as_str() {
                "1" => self.add()?,
                "2" => self.view(None)?,
                "3" => self.search()?,
                "4" => self.edit()?,
                "5" => self.delete()?,
                "6" => self.analytics()?,
                "7" => self.filter()?,
                "8" => {
                    self.exit()?;
                    return Ok(self.store);
                }
                _ => writeln!(self.out, "❌ Invalid choice! Please enter 1-8.")?,
            }
        }
    }

    fn prompt(&mut self, message: &str) -> io::Result<String> {
        write!(self.out, "{message}")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            self.eof = true;
        }
        Ok(line.trim().to_owned())
    }

    fn saved(&mut self, result: Result<(), StoreError>) -> io::Result<bool> {
        match result {
            Ok(()) => {
                writeln!(self.out, "✅ Tasks saved successfully!")?;
                Ok(true)
            }
            Err(err) => {
                warn!(%err, "save failed");
                writeln!(self.out, "❌ {err}")?;
                Ok(false)
            }
        }
    }

    fn add(&mut self) -> io::Result<()> {
        render::banner(&mut self.out, 50, "📝 CREATE NEW TASK")?;
        let title = self.prompt("Title: ")?;
        if title.is_empty() {
            writeln!(self.out, "❌ {}", InputError::EmptyTitle)?;
            return Ok(());
        }
        let form = TaskForm {
            title,
            description: self.prompt("Description: ")?,
            priority: self.prompt("\nPriority (low/medium/high): ")?,
            status: self.prompt("Status (todo/in-progress/completed): ")?,
            category: self.prompt(
                "Category (Development/Design/Testing/Documentation/Security/Database): ",
            )?,
            due_date: self.prompt("Due Date (YYYY-MM-DD) [optional]: ")?,
            estimated_hours: self.prompt("Estimated Hours: ")?,
        };
        let new = match NewTask::try_from(form) {
            Ok(new) => new,
            Err(err) => return writeln!(self.out, "❌ {err}"),
        };

        let result = self.store.add(new, self.today).map(|t| t.title.clone());
        match result {
            Ok(title) => {
                self.saved(Ok(()))?;
                writeln!(self.out, "\n✅ Task '{title}' created successfully!")
            }
            Err(err) => self.saved(Err(err)).map(drop),
        }
    }

    fn view(&mut self, status: Option<Status>) -> io::Result<()> {
        if self.store.is_empty() {
            return writeln!(self.out, "\n📭 No tasks found. Create one to get started!");
        }
        let tasks = self.store.list(status);
        if tasks.is_empty() {
            let label = status.map_or("any", Status::as_str);
            return writeln!(self.out, "\n📭 No tasks found with status: {label}");
        }
        render::task_list(&mut self.out, tasks, self.today)
    }

    fn filter(&mut self) -> io::Result<()> {
        writeln!(self.out, "\nFilter by status:")?;
        writeln!(self.out, "1. Todo\n2. In Progress\n3. Completed")?;
        let status = match self.prompt("Choose (1-3): ")?.as_str() {
            "1" => Status::Todo,
            "2" => Status::InProgress,
            "3" => Status::Completed,
            _ => return Ok(()),
        };
        self.view(Some(status))
    }

    fn search(&mut self) -> io::Result<()> {
        let keyword = self.prompt("\n🔍 Enter search keyword: ")?;
        match self.store.search(&keyword) {
            Err(_) => writeln!(self.out, "❌ Please enter a search term!"),
            Ok(found) if found.is_empty() => {
                writeln!(self.out, "\n📭 No tasks found matching '{keyword}'")
            }
            Ok(found) => {
                writeln!(
                    self.out,
                    "\n🔍 Found {} task(s) matching '{keyword}':",
                    found.len()
                )?;
                for task in found {
                    render::task(&mut self.out, task, self.today)?;
                }
                Ok(())
            }
        }
    }

    /// Prompt for an id and confirm the task exists.
    fn pick_task(&mut self, action: &str) -> io::Result<Option<u32>> {
        self.view(None)?;
        let raw = self.prompt(&format!("\nEnter Task ID to {action}: "))?;
        let id = match parse_task_id(&raw) {
            Ok(id) => id,
            Err(err) => {
                debug!(%err, "rejected task id");
                writeln!(self.out, "❌ Invalid input!")?;
                return Ok(None);
            }
        };
        if self.store.get(id).is_none() {
            writeln!(self.out, "❌ Task not found!")?;
            return Ok(None);
        }
        Ok(Some(id))
    }

    fn edit(&mut self) -> io::Result<()> {
        let Some(id) = self.pick_task("edit")? else {
            return Ok(());
        };
        let Some(current) = self.store.get(id).cloned() else {
            return Ok(());
        };

        writeln!(self.out, "\n📝 Editing: {}", current.title)?;
        writeln!(self.out, "(Press Enter to keep current value)\n")?;
        let form = EditForm {
            title: self.prompt(&format!("Title [{}]: ", current.title))?,
            description: self.prompt(&format!("Description [{}]: ", current.description))?,
            priority: self.prompt(&format!("Priority [{}]: ", current.priority))?,
            status: self.prompt(&format!("Status [{}]: ", current.status))?,
            category: self.prompt(&format!("Category [{}]: ", current.category))?,
            due_date: self.prompt(&format!("Due Date [{}]: ", current.due_date))?,
            estimated_hours: self
                .prompt(&format!("Estimated Hours [{}]: ", current.estimated_hours))?,
            actual_hours: self.prompt(&format!("Actual Hours [{}]: ", current.actual_hours))?,
        };

        let result = self.store.edit(id, TaskPatch::from(form)).map(drop);
        if self.saved(result)? {
            writeln!(self.out, "\n✅ Task updated successfully!")?;
        }
        Ok(())
    }

    fn delete(&mut self) -> io::Result<()> {
        let Some(id) = self.pick_task("delete")? else {
            return Ok(());
        };
        let title = self
            .store
            .get(id)
            .map(|t| t.title.clone())
            .unwrap_or_default();
        let answer = self.prompt(&format!(
            "Are you sure you want to delete '{title}'? (yes/no): "
        ))?;

        match self.store.delete(id, &answer) {
            Ok(Some(_)) => {
                self.saved(Ok(()))?;
                writeln!(self.out, "✅ Task deleted successfully!")
            }
            Ok(None) => writeln!(self.out, "❌ Deletion cancelled."),
            Err(err) => self.saved(Err(err)).map(drop),
        }
    }

    fn analytics(&mut self) -> io::Result<()> {
        match Analytics::compute(self.store.tasks()) {
            Some(stats) => render::analytics(&mut self.out, &stats),
            None => writeln!(self.out, "\n📭 No tasks to analyze!"),
        }
    }

    fn exit(&mut self) -> io::Result<()> {
        let result = self.store.save();
        self.saved(result)?;
        writeln!(self.out, "\n👋 Goodbye! Your tasks are saved.")
    }
}
