//! Plain-text rendering for the menu shell and one-shot commands.

use std::io::{self, Write};

use chrono::NaiveDate;
use crossterm::style::Stylize;

use crate::analytics::{Analytics, EfficiencyNote};
use crate::task::{HoursNote, Task};

pub const WIDE_RULE: usize = 80;
pub const RULE: usize = 60;

pub fn rule(out: &mut impl Write, width: usize) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(width))
}

pub fn banner(out: &mut impl Write, width: usize, title: &str) -> io::Result<()> {
    writeln!(out)?;
    rule(out, width)?;
    writeln!(out, "{title}")?;
    rule(out, width)
}

pub fn task(out: &mut impl Write, task: &Task, today: NaiveDate) -> io::Result<()> {
    writeln!(
        out,
        "\n{} ID: {} | {} {}",
        task.status.glyph(),
        task.id,
        task.priority.glyph(),
        task.title.as_str().bold()
    )?;
    writeln!(out, "   Description: {}", task.description)?;
    writeln!(
        out,
        "   Category: {} | Priority: {} | Status: {}",
        task.category,
        task.priority.as_str().to_uppercase(),
        task.status.as_str().to_uppercase()
    )?;

    if !task.due_date.is_empty() {
        write!(out, "   Due Date: {}", task.due_date)?;
        if task.is_overdue(today) {
            write!(out, " ⚠️ {}", "OVERDUE!".red())?;
        }
        writeln!(out)?;
    }

    writeln!(
        out,
        "   Hours: Estimated {}h | Actual {}h",
        task.estimated_hours, task.actual_hours
    )?;
    match task.hours_note() {
        Some(HoursNote::OnTrack) => writeln!(out, "   ✅ {}", "On track!".green())?,
        Some(HoursNote::Over(by)) => {
            writeln!(out, "   ⚠️  {}", format!("Over estimate by {by}h").yellow())?
        }
        None => {}
    }
    writeln!(out, "{}", "-".repeat(WIDE_RULE))
}

pub fn task_list<'a>(
    out: &mut impl Write,
    tasks: impl IntoIterator<Item = &'a Task>,
    today: NaiveDate,
) -> io::Result<()> {
    banner(out, WIDE_RULE, "📋 TASK LIST")?;
    for t in tasks {
        task(out, t, today)?;
    }
    Ok(())
}

pub fn analytics(out: &mut impl Write, stats: &Analytics) -> io::Result<()> {
    banner(out, RULE, "📊 TASK ANALYTICS")?;

    writeln!(out, "\n📈 Status Distribution:")?;
    for share in &stats.statuses {
        writeln!(
            out,
            "  {:15} | {} {} ({:.1}%)",
            share.status.as_str().to_uppercase(),
            "█".repeat(share.bar_len()),
            share.count,
            share.percentage
        )?;
    }

    writeln!(out, "\n🎯 Priority Distribution:")?;
    for (priority, count) in &stats.priorities {
        writeln!(
            out,
            "  {} {:10} | {count} tasks",
            priority.glyph(),
            priority.as_str().to_uppercase()
        )?;
    }

    writeln!(out, "\n📁 Category Distribution:")?;
    for (category, count) in &stats.categories {
        writeln!(out, "  {category:20} | {count} tasks")?;
    }

    let time = &stats.time;
    writeln!(out, "\n⏱️  Time Tracking:")?;
    writeln!(out, "  Total Estimated: {}h", time.estimated_total)?;
    writeln!(out, "  Total Actual:    {}h", time.actual_total)?;
    if time.estimated_total > 0 {
        writeln!(out, "  Efficiency:      {:.1}%", time.efficiency)?;
        match time.note() {
            Some(EfficiencyNote::UnderEstimate) => {
                writeln!(out, "  ✅ {}", "Under estimated time!".green())?
            }
            Some(EfficiencyNote::OverEstimate) => {
                writeln!(out, "  ⚠️  {}", "Over estimated time".yellow())?
            }
            None => {}
        }
    }

    writeln!(
        out,
        "\n🎯 Completion Rate: {:.1}% ({}/{})",
        stats.completion_rate, stats.completed, stats.total
    )?;
    rule(out, RULE)
}
