//! Integration tests for a full sync pass.
//!
//! These drive `SyncEngine` with an in-memory store, a scripted model that
//! answers by looking at the reminder text, and a recording sink.

use std::sync::Mutex;

use memento::events::{FnEventHandler, SyncEvent};
use memento::extract::Extractor;
use memento::layout::{Alignment, PrintCommand, Scale};
use memento::model::{LanguageModel, ModelError, ModelFuture};
use memento::normalize::Normalizer;
use memento::reminder::ReminderRecord;
use memento::sink::RecordingSink;
use memento::store::{JsonFileStore, MemoryStore, StoreDocument};
use memento::sync::{FailurePolicy, SyncConfig, SyncEngine};
use memento::Error;

/// Answers with the first reply whose key occurs in the reminder text.
struct Scripted {
    replies: Vec<(&'static str, &'static str)>,
    prompts: Mutex<Vec<String>>,
}

impl Scripted {
    fn new(replies: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            replies,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl LanguageModel for Scripted {
    fn complete(&self, prompt: &str) -> ModelFuture<'_> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let text = prompt
            .split("Reminder text to process:\n")
            .nth(1)
            .unwrap_or_default();
        let reply = self
            .replies
            .iter()
            .find(|(key, _)| text.contains(key))
            .map(|(_, reply)| reply.to_string())
            .ok_or_else(|| ModelError::Api(format!("no scripted reply for {text:?}")));
        Box::pin(async move { reply })
    }
}

const MILK_REPLY: &str = r#"{"title": "Buy Milk", "text": "Buy milk", "link": "http://x.co/a", "assignee": "Alice"}"#;
const DISHES_REPLY: &str = r#"{"title": "Do The Dishes", "text": null, "link": null, "assignee": null}"#;

fn texts(commands: &[PrintCommand]) -> Vec<&str> {
    commands
        .iter()
        .filter_map(|c| match c {
            PrintCommand::Text(t) => Some(t.as_str()),
            _ => None,
        })
        .collect()
}

// ── Happy path ───────────────────────────────────────────────────────

#[tokio::test]
async fn milk_reminder_prints_title_link_and_assignee() {
    let store = MemoryStore::new()
        .with_reminder(ReminderRecord::new("r1", "Buy milk @Alice http://x.co/a", "Inbox"));
    let model = Scripted::new(vec![("Buy milk", MILK_REPLY)]);
    let mut engine = SyncEngine::new(&store, Extractor::new(model), RecordingSink::new());

    let report = engine.run_once().await.unwrap();
    assert_eq!(report.processed, vec!["r1"]);
    assert!(report.failed.is_empty());

    let commands = engine.sink().commands();
    assert_eq!(engine.sink().receipts(), 1);
    assert_eq!(commands.last(), Some(&PrintCommand::Cut));

    // The body repeats the title, so only the title box is printed as text.
    let lines = texts(commands);
    assert!(lines[0].starts_with('┌'), "title box first: {lines:?}");
    assert!(
        lines.iter().any(|l| l.contains("Buy Milk @alice")),
        "printed title is the reminder's own title, title-cased: {lines:?}"
    );
    assert!(lines.contains(&"#Alice"));

    let barcodes: Vec<&PrintCommand> = commands
        .iter()
        .filter(|c| matches!(c, PrintCommand::Barcode(_)))
        .collect();
    assert_eq!(barcodes.len(), 1);
    assert_eq!(*barcodes[0], PrintCommand::Barcode("http://x.co/a".into()));

    // Link precedes assignee.
    let link_at = commands
        .iter()
        .position(|c| matches!(c, PrintCommand::Barcode(_)))
        .unwrap();
    let assignee_at = commands
        .iter()
        .position(|c| *c == PrintCommand::Text("#Alice".into()))
        .unwrap();
    assert!(link_at < assignee_at);

    assert_eq!(store.calendar_of("r1").as_deref(), Some("Processed"));
}

#[tokio::test]
async fn every_block_returns_to_neutral_state() {
    let store = MemoryStore::new().with_reminder(
        ReminderRecord::new("r1", "Buy milk", "Inbox").with_notes("@Alice http://x.co/a"),
    );
    let model = Scripted::new(vec![("Buy milk", MILK_REPLY)]);
    let mut engine = SyncEngine::new(&store, Extractor::new(model), RecordingSink::new());
    engine.run_once().await.unwrap();

    let commands = engine.sink().commands();
    let before_cut = &commands[commands.len() - 3..commands.len() - 1];
    assert_eq!(
        before_cut,
        &[
            PrintCommand::SetAlignment(Alignment::Left),
            PrintCommand::SetScale(Scale::NORMAL),
        ]
    );
}

#[tokio::test]
async fn model_sees_title_and_notes() {
    let store = MemoryStore::new()
        .with_reminder(ReminderRecord::new("r1", "Buy milk", "Inbox").with_notes("two litres"));
    let model = Scripted::new(vec![("Buy milk", MILK_REPLY)]);
    let mut engine = SyncEngine::new(&store, Extractor::new(&model), RecordingSink::new());
    engine.run_once().await.unwrap();

    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Reminder text to process:\nBuy milk\ntwo litres\n"));
}

// ── Normalization ────────────────────────────────────────────────────

#[tokio::test]
async fn default_assignee_fills_missing_mention() {
    let store = MemoryStore::new().with_reminder(ReminderRecord::new("r1", "Do the dishes", "Inbox"));
    let model = Scripted::new(vec![("dishes", DISHES_REPLY)]);
    let mut engine = SyncEngine::new(&store, Extractor::new(model), RecordingSink::new())
        .with_normalizer(Normalizer::new(Some("Jane".into())));
    engine.run_once().await.unwrap();

    let lines = texts(engine.sink().commands());
    assert!(lines.contains(&"#Jane"), "{lines:?}");
    assert!(!engine
        .sink()
        .commands()
        .iter()
        .any(|c| matches!(c, PrintCommand::Barcode(_))));
}

#[tokio::test]
async fn no_default_means_no_assignee_block() {
    let store = MemoryStore::new().with_reminder(ReminderRecord::new("r1", "Do the dishes", "Inbox"));
    let model = Scripted::new(vec![("dishes", DISHES_REPLY)]);
    let mut engine = SyncEngine::new(&store, Extractor::new(model), RecordingSink::new());
    engine.run_once().await.unwrap();

    let lines = texts(engine.sink().commands());
    assert!(lines.iter().all(|l| !l.starts_with('#')), "{lines:?}");
}

// ── Selection ────────────────────────────────────────────────────────

#[tokio::test]
async fn skip_list_and_marker_calendar_are_untouched() {
    let store = MemoryStore::new()
        .with_calendar("Processed")
        .with_reminder(ReminderRecord::new("done", "Buy milk", "Processed"))
        .with_reminder(ReminderRecord::new("shop", "Buy milk", "Shopping"))
        .with_reminder(ReminderRecord::new("todo", "Do the dishes", "Inbox"));
    let model = Scripted::new(vec![("Buy milk", MILK_REPLY), ("dishes", DISHES_REPLY)]);
    let mut engine = SyncEngine::new(&store, Extractor::new(&model), RecordingSink::new())
        .with_config(SyncConfig::default().with_skip_calendars(vec!["Shopping".into()]));

    let report = engine.run_once().await.unwrap();
    assert_eq!(report.processed, vec!["todo"]);
    assert_eq!(report.skipped, vec!["done", "shop"]);
    assert_eq!(engine.sink().receipts(), 1);
    assert_eq!(model.prompts.lock().unwrap().len(), 1, "skipped reminders never reach the model");
    assert_eq!(store.calendar_of("shop").as_deref(), Some("Shopping"));
}

#[tokio::test]
async fn completed_reminders_are_ignored() {
    let mut done = ReminderRecord::new("r1", "Buy milk", "Inbox");
    done.completed = true;
    let store = MemoryStore::new().with_reminder(done);
    let model = Scripted::new(vec![("Buy milk", MILK_REPLY)]);
    let mut engine = SyncEngine::new(&store, Extractor::new(model), RecordingSink::new());

    let report = engine.run_once().await.unwrap();
    assert!(report.processed.is_empty());
    assert_eq!(store.calendar_of("r1").as_deref(), Some("Inbox"));
}

#[tokio::test]
async fn second_pass_prints_nothing() {
    let store = MemoryStore::new().with_reminder(ReminderRecord::new("r1", "Buy milk", "Inbox"));
    let model = Scripted::new(vec![("Buy milk", MILK_REPLY)]);
    let mut engine = SyncEngine::new(&store, Extractor::new(model), RecordingSink::new());

    engine.run_once().await.unwrap();
    let report = engine.run_once().await.unwrap();
    assert!(report.processed.is_empty());
    assert_eq!(report.skipped, vec!["r1"]);
    assert_eq!(engine.sink().receipts(), 1);
}

#[tokio::test]
async fn custom_marker_calendar_is_created() {
    let store = MemoryStore::new().with_reminder(ReminderRecord::new("r1", "Buy milk", "Inbox"));
    let model = Scripted::new(vec![("Buy milk", MILK_REPLY)]);
    let mut engine = SyncEngine::new(&store, Extractor::new(model), RecordingSink::new())
        .with_config(SyncConfig::new("Printed"));
    engine.run_once().await.unwrap();

    assert!(store.calendars().iter().any(|c| c.title == "Printed"));
    assert_eq!(store.calendar_of("r1").as_deref(), Some("Printed"));
}

// ── Ordering ─────────────────────────────────────────────────────────

#[tokio::test]
async fn reminders_are_handled_one_at_a_time() {
    let store = MemoryStore::new()
        .with_reminder(ReminderRecord::new("r1", "Buy milk", "Inbox"))
        .with_reminder(ReminderRecord::new("r2", "Do the dishes", "Inbox"));
    let model = Scripted::new(vec![("Buy milk", MILK_REPLY), ("dishes", DISHES_REPLY)]);

    let log = Mutex::new(Vec::new());
    let handler = FnEventHandler::new(|event: &SyncEvent<'_>| {
        let entry = match event {
            SyncEvent::Extracted { reminder, .. } => format!("extract {}", reminder.id),
            SyncEvent::Printed { reminder, .. } => format!("print {}", reminder.id),
            SyncEvent::MarkedProcessed { reminder, .. } => format!("mark {}", reminder.id),
            _ => return,
        };
        log.lock().unwrap().push(entry);
    });

    let mut engine = SyncEngine::new(&store, Extractor::new(model), RecordingSink::new())
        .with_event_handler(&handler);
    engine.run_once().await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "extract r1", "print r1", "mark r1", "extract r2", "print r2", "mark r2",
        ]
    );

    // The first cut separates the two receipts.
    let commands = engine.sink().commands();
    let first_cut = commands
        .iter()
        .position(|c| *c == PrintCommand::Cut)
        .unwrap();
    let (first, second) = commands.split_at(first_cut);
    assert!(texts(first).iter().any(|l| l.contains("Buy Milk")));
    assert!(texts(second).iter().any(|l| l.contains("Do The Dishes")));
}

// ── Failures ─────────────────────────────────────────────────────────

#[tokio::test]
async fn printer_failure_leaves_reminder_in_place() {
    let store = MemoryStore::new().with_reminder(ReminderRecord::new("r1", "Buy milk", "Inbox"));
    let model = Scripted::new(vec![("Buy milk", MILK_REPLY)]);
    let mut engine = SyncEngine::new(&store, Extractor::new(model), RecordingSink::failing_after(3));

    let err = engine.run_once().await.unwrap_err();
    assert!(matches!(err, Error::PrintTransport(_)), "got {err:?}");
    assert_eq!(engine.sink().receipts(), 0);
    assert_eq!(store.calendar_of("r1").as_deref(), Some("Inbox"));
}

#[tokio::test]
async fn invalid_model_output_is_an_extraction_error() {
    let store = MemoryStore::new().with_reminder(ReminderRecord::new("r1", "Buy milk", "Inbox"));
    let model = Scripted::new(vec![("Buy milk", r#"{"text": "no title here"}"#)]);
    let mut engine = SyncEngine::new(&store, Extractor::new(model), RecordingSink::new());

    let err = engine.run_once().await.unwrap_err();
    assert!(matches!(err, Error::Extraction(_)), "got {err:?}");
    assert!(engine.sink().commands().is_empty(), "nothing reaches paper");
    assert_eq!(store.calendar_of("r1").as_deref(), Some("Inbox"));
}

#[tokio::test]
async fn abort_policy_stops_at_first_failure() {
    let store = MemoryStore::new()
        .with_reminder(ReminderRecord::new("bad", "Gibberish", "Inbox"))
        .with_reminder(ReminderRecord::new("good", "Buy milk", "Inbox"));
    let model = Scripted::new(vec![("Gibberish", "no json at all"), ("Buy milk", MILK_REPLY)]);
    let mut engine = SyncEngine::new(&store, Extractor::new(model), RecordingSink::new());

    assert!(engine.run_once().await.is_err());
    assert_eq!(engine.sink().receipts(), 0);
    assert_eq!(store.calendar_of("good").as_deref(), Some("Inbox"));
}

#[tokio::test]
async fn continue_policy_records_failure_and_proceeds() {
    let store = MemoryStore::new()
        .with_reminder(ReminderRecord::new("bad", "Gibberish", "Inbox"))
        .with_reminder(ReminderRecord::new("good", "Buy milk", "Inbox"));
    let model = Scripted::new(vec![("Gibberish", "no json at all"), ("Buy milk", MILK_REPLY)]);
    let mut engine = SyncEngine::new(&store, Extractor::new(model), RecordingSink::new())
        .with_config(SyncConfig::default().with_failure_policy(FailurePolicy::Continue));

    let report = engine.run_once().await.unwrap();
    assert_eq!(report.processed, vec!["good"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "bad");
    assert!(report.failed[0].1.contains("no JSON"), "{:?}", report.failed);
    assert_eq!(store.calendar_of("bad").as_deref(), Some("Inbox"));
    assert_eq!(store.calendar_of("good").as_deref(), Some("Processed"));
}

// ── File store ───────────────────────────────────────────────────────

#[tokio::test]
async fn json_file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reminders.json");
    let doc = StoreDocument {
        calendars: Vec::new(),
        reminders: vec![ReminderRecord::new("r1", "Buy milk", "Inbox")],
    };
    std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

    let model = Scripted::new(vec![("Buy milk", MILK_REPLY)]);
    let mut engine = SyncEngine::new(
        JsonFileStore::new(&path),
        Extractor::new(model),
        RecordingSink::new(),
    );
    let report = engine.run_once().await.unwrap();
    assert_eq!(report.processed, vec!["r1"]);

    let saved = engine.store().load().await.unwrap();
    assert!(saved.calendars.iter().any(|c| c.title == "Processed"));
    assert_eq!(saved.reminders[0].calendar, "Processed");
}
