pub mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use common::logger::init_logger;
use driver::fixture::{FixtureSandbox, PageFixture};
use session::store::sqlite_store::SqlitePreferenceStore;
use session::store::{PreferenceStore, load_config, save_config};
use session::SessionSnapshot;
use tokio::time::{interval, timeout};
use tracing::{info, warn};
use tracker::{
    HttpNotificationSink, LogSink, NotificationSink, TracingSurface, TrackerConfig, TrackerDeps,
    TrackerError, TrackerHandle, spawn_tracker,
};

use cli::{Cli, Command, ConfigCommand, RunArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger("cart-cli", cli.json_logs);

    let settings = TrackerConfig::from_env();
    let store = Arc::new(SqlitePreferenceStore::new(&settings.database_url).await?);

    match cli.command {
        Command::Config(ConfigCommand::Show) => {
            let cfg = load_config(store.as_ref()).await?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
        Command::Config(ConfigCommand::Set(args)) => {
            let current = load_config(store.as_ref()).await?;
            let next = current.apply(args.into_patch())?;
            save_config(store.as_ref(), &next).await?;
            println!("{}", serde_json::to_string_pretty(&next)?);
        }
        Command::Run(args) => run(settings, store, args).await?,
    }

    Ok(())
}

fn notification_sink(settings: &TrackerConfig) -> anyhow::Result<Arc<dyn NotificationSink>> {
    match &settings.notify_base_url {
        Some(url) => {
            let sink = HttpNotificationSink::new(url)?;
            info!(url = %sink.url(), "posting cart notifications");
            Ok(Arc::new(sink))
        }
        None => {
            info!("NOTIFY_BASE_URL not set; cart notifications go to the log");
            Ok(Arc::new(LogSink))
        }
    }
}

async fn run(
    settings: TrackerConfig,
    store: Arc<dyn PreferenceStore>,
    args: RunArgs,
) -> anyhow::Result<()> {
    let fixtures = PageFixture::from_json_file(&args.fixture)?;
    info!(pages = fixtures.len(), fixture = %args.fixture.display(), "page fixture loaded");

    let deps = TrackerDeps {
        sandbox: Arc::new(FixtureSandbox::new(fixtures)),
        sink: notification_sink(&settings)?,
        surface: Arc::new(TracingSurface),
        store,
    };
    let tracker = spawn_tracker(settings, deps).await?;

    let target = args.target();
    match tracker.start_automatic_carting(target.clone()).await {
        Ok(attempt) => info!(event_id = %target.event_id, attempt, "carting started"),
        Err(TrackerError::Rejected(reason)) => {
            warn!(event_id = %target.event_id, %reason, "carting not started");
        }
        Err(e) => return Err(e.into()),
    }

    tokio::select! {
        settled = timeout(Duration::from_secs(args.wait_secs), wait_settled(&tracker, &target.event_id)) => {
            match settled {
                Ok(res) => res?,
                Err(_) => warn!(wait_secs = args.wait_secs, "gave up waiting for an outcome"),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted");
        }
    }

    let snapshot = tracker.status().await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    tracker.shutdown().await?;
    Ok(())
}

/// Returns once the event is completed, or failed with no retry queued.
async fn wait_settled(tracker: &TrackerHandle, event_id: &str) -> Result<(), TrackerError> {
    let mut tick = interval(Duration::from_millis(500));
    loop {
        tick.tick().await;
        let snapshot = tracker.status().await?;
        if is_settled(&snapshot, event_id) {
            return Ok(());
        }
    }
}

fn is_settled(snapshot: &SessionSnapshot, event_id: &str) -> bool {
    if snapshot.active.contains_key(event_id) {
        return false;
    }
    if snapshot.completed.contains_key(event_id) {
        return true;
    }
    snapshot
        .failed
        .get(event_id)
        .is_none_or(|f| !f.retry_scheduled)
}
