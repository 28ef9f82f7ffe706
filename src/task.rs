use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::InputError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Priority::Low => "🟢",
            Priority::Medium => "🟡",
            Priority::High => "🔴",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == token)
            .ok_or_else(|| InputError::UnknownPriority(s.trim().to_owned()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Completed,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in-progress",
            Status::Completed => "completed",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Status::Todo => "⏳",
            Status::InProgress => "🔄",
            Status::Completed => "✅",
        }
    }

    /// Next column on the board; completed tasks stay put.
    pub fn advance(self) -> Status {
        match self {
            Status::Todo => Status::InProgress,
            Status::InProgress | Status::Completed => Status::Completed,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        Status::ALL
            .into_iter()
            .find(|st| st.as_str() == token)
            .ok_or_else(|| InputError::UnknownStatus(s.trim().to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub category: String,
    /// `YYYY-MM-DD`, or empty when unset.
    pub due_date: String,
    pub created_at: NaiveDate,
    #[serde(deserialize_with = "lenient_hours")]
    pub estimated_hours: u32,
    #[serde(deserialize_with = "lenient_hours")]
    pub actual_hours: u32,
}

/// Older files may hold negative hour counts; read them as 0.
fn lenient_hours<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let hours = i64::deserialize(deserializer)?;
    Ok(u32::try_from(hours.max(0)).unwrap_or(u32::MAX))
}

/// How the tracked hours compare to the estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoursNote {
    OnTrack,
    Over(u32),
}

impl Task {
    pub fn due(&self) -> Option<NaiveDate> {
        if self.due_date.is_empty() {
            return None;
        }
        NaiveDate::parse_from_str(&self.due_date, DATE_FORMAT).ok()
    }

    /// Derived at query time, never stored.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != Status::Completed && self.due().is_some_and(|due| due < today)
    }

    pub fn hours_note(&self) -> Option<HoursNote> {
        if self.estimated_hours == 0 || self.actual_hours == 0 {
            return None;
        }
        if self.actual_hours <= self.estimated_hours {
            Some(HoursNote::OnTrack)
        } else {
            Some(HoursNote::Over(self.actual_hours - self.estimated_hours))
        }
    }

    /// Case-insensitive substring match on title, description and category.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        [&self.title, &self.description, &self.category]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}
