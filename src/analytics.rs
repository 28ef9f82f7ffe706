//! Aggregate figures over the current task list. Nothing here touches disk.

use crate::task::{Priority, Status, Task};

/// Each bar unit stands for this many percent.
pub const PERCENT_PER_BAR_UNIT: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StatusShare {
    pub status: Status,
    pub count: usize,
    pub percentage: f64,
}

impl StatusShare {
    pub fn bar_len(&self) -> usize {
        (self.percentage / PERCENT_PER_BAR_UNIT).round() as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EfficiencyNote {
    UnderEstimate,
    OverEstimate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeTracking {
    pub estimated_total: u64,
    pub actual_total: u64,
    /// `estimated / actual * 100`, or 0 when nothing has been logged yet.
    pub efficiency: f64,
}

impl TimeTracking {
    pub fn note(&self) -> Option<EfficiencyNote> {
        if self.efficiency > 100.0 {
            Some(EfficiencyNote::UnderEstimate)
        } else if self.efficiency < 100.0 {
            Some(EfficiencyNote::OverEstimate)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analytics {
    pub total: usize,
    /// Statuses present, in declaration order.
    pub statuses: Vec<StatusShare>,
    /// Priorities present, low to high.
    pub priorities: Vec<(Priority, usize)>,
    /// Most common first; ties keep first-seen order.
    pub categories: Vec<(String, usize)>,
    pub time: TimeTracking,
    pub completed: usize,
    pub completion_rate: f64,
}

impl Analytics {
    /// Returns `None` when there is nothing to analyze.
    pub fn compute(tasks: &[Task]) -> Option<Analytics> {
        if tasks.is_empty() {
            return None;
        }
        let total = tasks.len();

        let statuses = Status::ALL
            .into_iter()
            .map(|status| (status, tasks.iter().filter(|t| t.status == status).count()))
            .filter(|&(_, count)| count > 0)
            .map(|(status, count)| StatusShare {
                status,
                count,
                percentage: percent(count, total),
            })
            .collect();

        let priorities = Priority::ALL
            .into_iter()
            .map(|p| (p, tasks.iter().filter(|t| t.priority == p).count()))
            .filter(|&(_, count)| count > 0)
            .collect();

        let mut categories: Vec<(String, usize)> = Vec::new();
        for task in tasks {
            match categories.iter_mut().find(|(name, _)| *name == task.category) {
                Some((_, count)) => *count += 1,
                None => categories.push((task.category.clone(), 1)),
            }
        }
        categories.sort_by(|a, b| b.1.cmp(&a.1));

        let estimated_total: u64 = tasks.iter().map(|t| u64::from(t.estimated_hours)).sum();
        let actual_total: u64 = tasks.iter().map(|t| u64::from(t.actual_hours)).sum();
        let efficiency = if actual_total > 0 {
            estimated_total as f64 / actual_total as f64 * 100.0
        } else {
            0.0
        };

        let completed = tasks.iter().filter(|t| t.status == Status::Completed).count();

        Some(Analytics {
            total,
            statuses,
            priorities,
            categories,
            time: TimeTracking {
                estimated_total,
                actual_total,
                efficiency,
            },
            completed,
            completion_rate: percent(completed, total),
        })
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    part as f64 / whole as f64 * 100.0
}
