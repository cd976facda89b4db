//! The reminders store seam.
//!
//! The pipeline consumes exactly four operations: list pending reminders,
//! look a calendar up by name, create a calendar, and move a reminder into a
//! calendar. Implementations must bound their own latency; the sync loop
//! additionally wraps every call in a timeout.
//!
//! | Store | Use case |
//! |-------|----------|
//! | [`MemoryStore`] | Tests and embedding callers |
//! | [`JsonFileStore`] | A JSON document on disk, used by the `memento` binary |

mod file;
mod memory;

pub use file::{JsonFileStore, StoreDocument};
pub use memory::MemoryStore;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

use crate::reminder::{Calendar, ReminderRecord};

/// Boxed future returned by [`ReminderStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store refused access or is unreachable.
    #[error("access to reminders was denied: {0}")]
    AccessDenied(String),
    #[error("calendar not found: {0}")]
    CalendarNotFound(String),
    #[error("reminder not found: {0}")]
    ReminderNotFound(String),
    #[error("store operation '{operation}' timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed store document: {0}")]
    Format(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

/// A reminders store.
///
/// Uses boxed futures so that the trait is dyn-compatible.
pub trait ReminderStore: Send + Sync {
    /// All reminders that are not completed, in store order.
    fn list_pending(&self) -> StoreFuture<'_, Vec<ReminderRecord>>;

    /// The calendar whose title is exactly `name`, if any.
    fn find_calendar_by_name(&self, name: &str) -> StoreFuture<'_, Option<Calendar>>;

    /// Create a calendar titled `name` and return it.
    fn create_calendar(&self, name: &str) -> StoreFuture<'_, Calendar>;

    /// Reassign reminder `id` to the calendar titled `calendar`.
    ///
    /// Fails with [`StoreError::CalendarNotFound`] if no such calendar exists.
    fn move_to_calendar(&self, id: &str, calendar: &str) -> StoreFuture<'_, ()>;
}

impl<S: ReminderStore + ?Sized> ReminderStore for &S {
    fn list_pending(&self) -> StoreFuture<'_, Vec<ReminderRecord>> {
        (**self).list_pending()
    }

    fn find_calendar_by_name(&self, name: &str) -> StoreFuture<'_, Option<Calendar>> {
        (**self).find_calendar_by_name(name)
    }

    fn create_calendar(&self, name: &str) -> StoreFuture<'_, Calendar> {
        (**self).create_calendar(name)
    }

    fn move_to_calendar(&self, id: &str, calendar: &str) -> StoreFuture<'_, ()> {
        (**self).move_to_calendar(id, calendar)
    }
}
