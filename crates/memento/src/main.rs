//! Prints pending reminders as receipts.
//!
//! Reads reminders from a JSON store, extracts their fields with a local
//! Ollama model and writes a plain-text preview of every receipt to stdout.
//!
//! # Examples
//!
//! ```sh
//! # One pass over the store, keep going when a reminder fails
//! memento run --store ~/reminders.json --continue-on-error
//!
//! # Show the prompt sent for a piece of text
//! memento prompt "Buy milk @Alice http://x.co/a"
//!
//! # Preview a receipt without the model
//! memento render --title "Buy milk" --text "Two litres" --assignee Alice
//! ```

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use memento::config::{ConfigError, MementoConfig};
use memento::events::LoggingHandler;
use memento::extract::{ExtractedFields, Extractor, build_prompt};
use memento::layout::Receipt;
use memento::sink::{PreviewSink, emit};
use memento::store::JsonFileStore;
use memento::sync::{FailurePolicy, SyncEngine};
use memento::{Error, LanguageModel};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "memento", version, about = "Print pending reminders as receipts")]
struct Cli {
    /// Configuration file. Defaults to `$XDG_CONFIG_HOME/memento/config.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one pass over the pending reminders.
    Run {
        /// JSON reminders document.
        #[arg(long)]
        store: Option<PathBuf>,

        /// Model name.
        #[arg(long, env = "OLLAMA_MODEL")]
        model: Option<String>,

        /// Assignee used when a reminder names none.
        #[arg(long, env = "DEFAULT_ASSIGNEE")]
        default_assignee: Option<String>,

        /// Comma-separated calendars to leave alone.
        #[arg(long, env = "SKIP_CALENDARS")]
        skip_calendars: Option<String>,

        /// Log failed reminders and carry on instead of stopping.
        #[arg(long)]
        continue_on_error: bool,
    },
    /// Print the prompt that would be sent for TEXT.
    Prompt { text: String },
    /// Preview a receipt from explicit fields.
    Render {
        #[arg(long)]
        title: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        link: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "memento=debug" } else { "memento=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<MementoConfig, Error> {
    Ok(match path {
        Some(path) => MementoConfig::load(path)?,
        None => MementoConfig::load_default()?,
    })
}

async fn run(cli: Cli) -> Result<(), Error> {
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Run {
            store,
            model,
            default_assignee,
            skip_calendars,
            continue_on_error,
        } => {
            if let Some(model) = model {
                config.model.model = model;
            }
            if default_assignee.is_some() {
                config.sync.default_assignee = default_assignee;
            }
            if let Some(skip) = skip_calendars {
                config.set_skip_calendars(&skip);
            }
            if continue_on_error {
                config.sync.failure_policy = FailurePolicy::Continue;
            }
            if let Some(store) = store {
                config.store.path = Some(store);
            }
            config.validate()?;

            let store_path = config.store.path.clone().ok_or_else(|| {
                Error::Config(ConfigError::Invalid(
                    "no reminders store given; pass --store or set store.path".into(),
                ))
            })?;
            let client = config.build_client()?;
            info!(
                model = client.name(),
                store = %store_path.display(),
                "starting pass"
            );

            let extractor = Extractor::new(client).with_retry(config.retry_config());
            let handler = LoggingHandler;
            let mut engine = SyncEngine::new(
                JsonFileStore::new(store_path),
                extractor,
                PreviewSink::new(io::stdout().lock()),
            )
            .with_normalizer(config.normalizer())
            .with_layout(config.layout.clone())
            .with_config(config.sync_config())
            .with_event_handler(&handler);

            let report = engine.run_once().await?;
            for (id, error) in &report.failed {
                eprintln!("{id}: {error}");
            }
        }
        Command::Prompt { text } => {
            println!("{}", build_prompt(&text));
        }
        Command::Render {
            title,
            text,
            link,
            assignee,
        } => {
            let fields = ExtractedFields {
                title: title.clone(),
                text,
                link,
                assignee,
            };
            let fields = config.normalizer().apply(fields);
            let commands = Receipt::compose(&title, &fields, &config.layout).commands();
            emit(&mut PreviewSink::new(io::stdout().lock()), &commands)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
