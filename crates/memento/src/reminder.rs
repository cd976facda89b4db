//! Reminder and calendar records as read from a [`ReminderStore`](crate::store::ReminderStore).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named grouping of reminders (a list, not a calendar of dated events).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default = "default_true")]
    pub allows_modifications: bool,
}

fn default_true() -> bool {
    true
}

impl Calendar {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            color: None,
            allows_modifications: true,
        }
    }
}

/// A reminder as the store reports it. Read-only to the pipeline; the only
/// mutation is moving it to another calendar through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRecord {
    /// Opaque store identifier.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub completed: bool,
    /// Title of the calendar the reminder belongs to.
    pub calendar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// 0 = none, 1 = high ... 9 = low.
    #[serde(default)]
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ReminderRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, calendar: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            notes: String::new(),
            completed: false,
            calendar: calendar.into(),
            due_date: None,
            priority: 0,
            url: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Title and notes joined by a newline, trimmed. This is what the model sees.
    pub fn text(&self) -> String {
        format!("{}\n{}", self.title, self.notes).trim().to_string()
    }
}
