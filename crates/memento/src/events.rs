//! Events emitted by the [`SyncEngine`](crate::sync::SyncEngine) during a pass.
//!
//! Callers implement [`EventHandler`] to observe a pass for logging,
//! progress display, or tests.
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | Tests or fire-and-forget runs |
//! | [`LoggingHandler`] | Structured logging via `tracing` |
//! | [`FnEventHandler`] | Quick closures for simple callbacks |

use tracing::{debug, info, warn};

use crate::error::Error;
use crate::extract::ExtractedFields;
use crate::reminder::ReminderRecord;
use crate::sync::SyncReport;

/// Why a reminder was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Already in the marker calendar.
    AlreadyProcessed,
    /// Its calendar is on the skip list.
    SkippedCalendar,
}

#[derive(Debug)]
pub enum SyncEvent<'a> {
    /// Pending reminders were fetched.
    PassStarted { pending: usize },
    /// The marker calendar did not exist and was created.
    MarkerCalendarCreated { name: &'a str },
    Skipped {
        reminder: &'a ReminderRecord,
        reason: SkipReason,
    },
    Extracted {
        reminder: &'a ReminderRecord,
        fields: &'a ExtractedFields,
    },
    /// The receipt was handed to the sink in full.
    Printed {
        reminder: &'a ReminderRecord,
        commands: usize,
    },
    MarkedProcessed {
        reminder: &'a ReminderRecord,
        calendar: &'a str,
    },
    /// Processing failed; the reminder was not marked.
    Failed {
        reminder: &'a ReminderRecord,
        error: &'a Error,
    },
    PassFinished { report: &'a SyncReport },
}

pub trait EventHandler: Send + Sync {
    /// Called for each event during a pass. The default ignores it.
    fn on_event(&self, event: &SyncEvent<'_>) {
        let _ = event;
    }
}

pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// An event handler backed by a closure.
pub struct FnEventHandler<F>(F);

impl<F: Fn(&SyncEvent<'_>) + Send + Sync> FnEventHandler<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F: Fn(&SyncEvent<'_>) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: &SyncEvent<'_>) {
        (self.0)(event)
    }
}

/// Logs every event through `tracing`.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &SyncEvent<'_>) {
        match event {
            SyncEvent::PassStarted { pending } => {
                info!("{pending} pending reminder(s)");
            }
            SyncEvent::MarkerCalendarCreated { name } => {
                info!("created marker calendar '{name}'");
            }
            SyncEvent::Skipped { reminder, reason } => {
                debug!(id = %reminder.id, calendar = %reminder.calendar, ?reason, "skipped");
            }
            SyncEvent::Extracted { reminder, fields } => {
                debug!(
                    id = %reminder.id,
                    title = %fields.title,
                    link = fields.link.as_deref().unwrap_or("-"),
                    assignee = fields.assignee.as_deref().unwrap_or("-"),
                    "extracted"
                );
            }
            SyncEvent::Printed { reminder, commands } => {
                info!(id = %reminder.id, "printed '{}' ({commands} commands)", reminder.title);
            }
            SyncEvent::MarkedProcessed { reminder, calendar } => {
                debug!(id = %reminder.id, "moved to '{calendar}'");
            }
            SyncEvent::Failed { reminder, error } => {
                warn!(id = %reminder.id, "failed to process '{}': {error}", reminder.title);
            }
            SyncEvent::PassFinished { report } => {
                info!(
                    "pass finished: {} processed, {} skipped, {} failed",
                    report.processed.len(),
                    report.skipped.len(),
                    report.failed.len()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn fn_handler_receives_events() {
        let seen = Mutex::new(Vec::new());
        let handler = FnEventHandler::new(|e: &SyncEvent<'_>| {
            if let SyncEvent::PassStarted { pending } = e {
                seen.lock().unwrap().push(*pending);
            }
        });
        handler.on_event(&SyncEvent::PassStarted { pending: 3 });
        handler.on_event(&SyncEvent::MarkerCalendarCreated { name: "Processed" });
        assert_eq!(*seen.lock().unwrap(), vec![3]);
    }

    #[test]
    fn logging_handler_accepts_every_event() {
        let reminder = ReminderRecord::new("1", "t", "Inbox");
        let fields = ExtractedFields::titled("t");
        let report = SyncReport::default();
        let error = Error::CalendarNotFound("x".into());
        let events = [
            SyncEvent::PassStarted { pending: 1 },
            SyncEvent::MarkerCalendarCreated { name: "Processed" },
            SyncEvent::Skipped {
                reminder: &reminder,
                reason: SkipReason::SkippedCalendar,
            },
            SyncEvent::Extracted {
                reminder: &reminder,
                fields: &fields,
            },
            SyncEvent::Printed {
                reminder: &reminder,
                commands: 10,
            },
            SyncEvent::MarkedProcessed {
                reminder: &reminder,
                calendar: "Processed",
            },
            SyncEvent::Failed {
                reminder: &reminder,
                error: &error,
            },
            SyncEvent::PassFinished { report: &report },
        ];
        for event in &events {
            LoggingHandler.on_event(event);
        }
    }
}
