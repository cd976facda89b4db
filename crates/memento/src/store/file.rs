use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::{ReminderStore, StoreError, StoreFuture};
use crate::reminder::{Calendar, ReminderRecord};

/// On-disk layout of a [`JsonFileStore`].
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub calendars: Vec<Calendar>,
    #[serde(default)]
    pub reminders: Vec<ReminderRecord>,
}

/// A reminders store kept in a single JSON document.
///
/// Every operation re-reads the file so that edits made between passes are
/// picked up. Writes go to a sibling temp file which is then renamed over the
/// original.
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the document.
    pub async fn load(&self) -> Result<StoreDocument, StoreError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(StoreError::AccessDenied(format!(
                    "{}: {e}",
                    self.path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&text)?)
    }

    /// Replace the document on disk.
    pub async fn save(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(
            path = %self.path.display(),
            reminders = doc.reminders.len(),
            "store saved"
        );
        Ok(())
    }

    async fn create(&self, name: String) -> Result<Calendar, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        if let Some(existing) = doc.calendars.iter().find(|c| c.title == name) {
            return Ok(existing.clone());
        }
        let calendar = Calendar::new(next_calendar_id(&doc), name);
        doc.calendars.push(calendar.clone());
        self.save(&doc).await?;
        Ok(calendar)
    }

    async fn reassign(&self, id: String, calendar: String) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        if !doc.calendars.iter().any(|c| c.title == calendar) {
            return Err(StoreError::CalendarNotFound(calendar));
        }
        let reminder = doc
            .reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::ReminderNotFound(id))?;
        reminder.calendar = calendar;
        self.save(&doc).await
    }
}

fn next_calendar_id(doc: &StoreDocument) -> String {
    let mut n = doc.calendars.len() + 1;
    loop {
        let id = format!("cal-{n}");
        if !doc.calendars.iter().any(|c| c.id == id) {
            return id;
        }
        n += 1;
    }
}

impl ReminderStore for JsonFileStore {
    fn list_pending(&self) -> StoreFuture<'_, Vec<ReminderRecord>> {
        Box::pin(async move {
            let doc = self.load().await?;
            Ok(doc.reminders.into_iter().filter(|r| !r.completed).collect())
        })
    }

    fn find_calendar_by_name(&self, name: &str) -> StoreFuture<'_, Option<Calendar>> {
        let name = name.to_string();
        Box::pin(async move {
            let doc = self.load().await?;
            Ok(doc.calendars.into_iter().find(|c| c.title == name))
        })
    }

    fn create_calendar(&self, name: &str) -> StoreFuture<'_, Calendar> {
        Box::pin(self.create(name.to_string()))
    }

    fn move_to_calendar(&self, id: &str, calendar: &str) -> StoreFuture<'_, ()> {
        Box::pin(self.reassign(id.to_string(), calendar.to_string()))
    }
}
