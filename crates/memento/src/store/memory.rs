use std::sync::Mutex;

use super::{ReminderStore, StoreError, StoreFuture};
use crate::reminder::{Calendar, ReminderRecord};

#[derive(Debug, Default)]
struct State {
    calendars: Vec<Calendar>,
    reminders: Vec<ReminderRecord>,
    denied: bool,
    next_calendar_id: u32,
}

impl State {
    fn ensure_calendar(&mut self, title: &str) -> Calendar {
        if let Some(cal) = self.calendars.iter().find(|c| c.title == title) {
            return cal.clone();
        }
        self.next_calendar_id += 1;
        let cal = Calendar::new(format!("cal-{}", self.next_calendar_id), title);
        self.calendars.push(cal.clone());
        cal
    }

    fn check_access(&self) -> Result<(), StoreError> {
        if self.denied {
            Err(StoreError::AccessDenied("no access to reminders".into()))
        } else {
            Ok(())
        }
    }
}

/// An in-process reminders store.
///
/// Reminders added with [`with_reminder`](Self::with_reminder) create their
/// calendar on the fly.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calendar(self, title: &str) -> Self {
        self.lock().ensure_calendar(title);
        self
    }

    pub fn with_reminder(self, reminder: ReminderRecord) -> Self {
        {
            let mut state = self.lock();
            state.ensure_calendar(&reminder.calendar);
            state.reminders.push(reminder);
        }
        self
    }

    /// Make every subsequent operation fail with [`StoreError::AccessDenied`].
    pub fn deny_access(&self) {
        self.lock().denied = true;
    }

    pub fn calendars(&self) -> Vec<Calendar> {
        self.lock().calendars.clone()
    }

    /// Calendar title of reminder `id`.
    pub fn calendar_of(&self, id: &str) -> Option<String> {
        self.lock()
            .reminders
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.calendar.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn do_move(&self, id: &str, calendar: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.check_access()?;
        if !state.calendars.iter().any(|c| c.title == calendar) {
            return Err(StoreError::CalendarNotFound(calendar.to_string()));
        }
        let reminder = state
            .reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::ReminderNotFound(id.to_string()))?;
        reminder.calendar = calendar.to_string();
        Ok(())
    }
}

impl ReminderStore for MemoryStore {
    fn list_pending(&self) -> StoreFuture<'_, Vec<ReminderRecord>> {
        let result = {
            let state = self.lock();
            state.check_access().map(|()| {
                state
                    .reminders
                    .iter()
                    .filter(|r| !r.completed)
                    .cloned()
                    .collect()
            })
        };
        Box::pin(async move { result })
    }

    fn find_calendar_by_name(&self, name: &str) -> StoreFuture<'_, Option<Calendar>> {
        let result = {
            let state = self.lock();
            state
                .check_access()
                .map(|()| state.calendars.iter().find(|c| c.title == name).cloned())
        };
        Box::pin(async move { result })
    }

    fn create_calendar(&self, name: &str) -> StoreFuture<'_, Calendar> {
        let result = {
            let mut state = self.lock();
            state.check_access().map(|()| state.ensure_calendar(name))
        };
        Box::pin(async move { result })
    }

    fn move_to_calendar(&self, id: &str, calendar: &str) -> StoreFuture<'_, ()> {
        let result = self.do_move(id, calendar);
        Box::pin(async move { result })
    }
}
