//! One pass over the pending reminders.
//!
//! [`SyncEngine::run_once`] makes sure the marker calendar exists, lists the
//! pending reminders and handles each eligible one to completion before
//! starting the next:
//!
//! 1. extract fields from the reminder's text,
//! 2. apply the default assignee,
//! 3. lay out the receipt and build its full command list,
//! 4. emit the commands to the sink,
//! 5. move the reminder into the marker calendar.
//!
//! A failure at any step leaves the reminder where it was, so the next pass
//! picks it up again. Reminders already in the marker calendar or in a
//! skipped calendar are never touched.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::events::{EventHandler, NoopHandler, SkipReason, SyncEvent};
use crate::extract::Extractor;
use crate::layout::{LayoutConfig, Receipt};
use crate::model::LanguageModel;
use crate::normalize::Normalizer;
use crate::reminder::ReminderRecord;
use crate::sink::{PrintSink, emit};
use crate::store::{ReminderStore, StoreError, StoreFuture};

/// Name of the marker calendar unless configured otherwise.
pub const DEFAULT_PROCESSED_CALENDAR: &str = "Processed";

/// Upper bound on any single store call unless configured otherwise.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// What to do when a single reminder fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the pass and return the error.
    #[default]
    Abort,
    /// Record the failure and move on to the next reminder. Fatal errors
    /// (see [`Error::is_fatal`](crate::Error::is_fatal)) still stop the pass.
    Continue,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Calendar that marks a reminder as printed.
    pub processed_calendar: String,
    /// Calendars whose reminders are never printed.
    pub skip_calendars: Vec<String>,
    pub store_timeout: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESSED_CALENDAR)
    }
}

impl SyncConfig {
    pub fn new(processed_calendar: impl Into<String>) -> Self {
        Self {
            processed_calendar: processed_calendar.into(),
            skip_calendars: Vec::new(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            failure_policy: FailurePolicy::Abort,
        }
    }

    pub fn with_skip_calendars(mut self, calendars: Vec<String>) -> Self {
        self.skip_calendars = calendars;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    fn skip_reason(&self, reminder: &ReminderRecord) -> Option<SkipReason> {
        if reminder.calendar == self.processed_calendar {
            Some(SkipReason::AlreadyProcessed)
        } else if self.skip_calendars.contains(&reminder.calendar) {
            Some(SkipReason::SkippedCalendar)
        } else {
            None
        }
    }
}

/// Outcome of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Ids printed and moved, in processing order.
    pub processed: Vec<String>,
    /// Ids left alone because of their calendar.
    pub skipped: Vec<String>,
    /// Ids that failed under [`FailurePolicy::Continue`], with the error text.
    pub failed: Vec<(String, String)>,
}

/// Bound a store call by `after`.
async fn bounded<T>(
    operation: &'static str,
    after: Duration,
    call: StoreFuture<'_, T>,
) -> std::result::Result<T, StoreError> {
    tokio::time::timeout(after, call)
        .await
        .map_err(|_| StoreError::Timeout { operation, after })?
}

/// Drives reminders from a store through extraction and layout into a sink.
pub struct SyncEngine<'a, S, M, P> {
    store: S,
    extractor: Extractor<M>,
    normalizer: Normalizer,
    layout: LayoutConfig,
    sink: P,
    config: SyncConfig,
    event_handler: &'a dyn EventHandler,
}

impl<'a, S, M, P> SyncEngine<'a, S, M, P>
where
    S: ReminderStore,
    M: LanguageModel,
    P: PrintSink,
{
    pub fn new(store: S, extractor: Extractor<M>, sink: P) -> Self {
        Self {
            store,
            extractor,
            normalizer: Normalizer::default(),
            layout: LayoutConfig::default(),
            sink,
            config: SyncConfig::default(),
            event_handler: &NoopHandler,
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_event_handler(mut self, handler: &'a dyn EventHandler) -> Self {
        self.event_handler = handler;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    /// Run one pass over the pending reminders.
    pub async fn run_once(&mut self) -> Result<SyncReport> {
        self.ensure_marker_calendar().await?;

        let pending = bounded(
            "list_pending",
            self.config.store_timeout,
            self.store.list_pending(),
        )
        .await?;
        self.event_handler.on_event(&SyncEvent::PassStarted {
            pending: pending.len(),
        });

        let mut report = SyncReport::default();
        for reminder in &pending {
            if let Some(reason) = self.config.skip_reason(reminder) {
                self.event_handler
                    .on_event(&SyncEvent::Skipped { reminder, reason });
                report.skipped.push(reminder.id.clone());
                continue;
            }

            match self.process(reminder).await {
                Ok(()) => report.processed.push(reminder.id.clone()),
                Err(error) => {
                    self.event_handler.on_event(&SyncEvent::Failed {
                        reminder,
                        error: &error,
                    });
                    if error.is_fatal() || self.config.failure_policy == FailurePolicy::Abort {
                        return Err(error);
                    }
                    report.failed.push((reminder.id.clone(), error.to_string()));
                }
            }
        }

        self.event_handler
            .on_event(&SyncEvent::PassFinished { report: &report });
        Ok(report)
    }

    async fn ensure_marker_calendar(&self) -> Result<()> {
        let name = self.config.processed_calendar.as_str();
        let timeout = self.config.store_timeout;
        let existing = bounded(
            "find_calendar_by_name",
            timeout,
            self.store.find_calendar_by_name(name),
        )
        .await?;
        if existing.is_none() {
            bounded("create_calendar", timeout, self.store.create_calendar(name)).await?;
            self.event_handler
                .on_event(&SyncEvent::MarkerCalendarCreated { name });
        }
        Ok(())
    }

    async fn process(&mut self, reminder: &ReminderRecord) -> Result<()> {
        debug!(id = %reminder.id, calendar = %reminder.calendar, "processing");
        let fields = self.extractor.extract(&reminder.text()).await?;
        self.event_handler.on_event(&SyncEvent::Extracted {
            reminder,
            fields: &fields,
        });

        let fields = self.normalizer.apply(fields);
        let commands = Receipt::compose(&reminder.title, &fields, &self.layout).commands();
        emit(&mut self.sink, &commands)?;
        self.event_handler.on_event(&SyncEvent::Printed {
            reminder,
            commands: commands.len(),
        });

        let calendar = self.config.processed_calendar.as_str();
        bounded(
            "move_to_calendar",
            self.config.store_timeout,
            self.store.move_to_calendar(&reminder.id, calendar),
        )
        .await?;
        self.event_handler
            .on_event(&SyncEvent::MarkedProcessed { reminder, calendar });
        Ok(())
    }
}
