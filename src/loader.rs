//! Background data loading for the dashboard
//!
//! Page queries run on the blocking pool against a shared connection; the
//! monitoring run gets its own task and connection. Results come back to the
//! UI loop over an unbounded channel that is drained every frame.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

use crate::api::PncpClient;
use crate::commands::recent_since;
use crate::config::Settings;
use crate::monitor::{Monitor, RunReport};
use crate::notifier::Notifier;
use crate::store::{Database, Statistics, StoreResult};
use crate::views::procurements::PageQuery;
use crate::views::{OverviewData, ProcurementPage};

/// Runs shown on the overview
const OVERVIEW_RUNS: usize = 5;

/// Results delivered to the UI loop
#[derive(Debug)]
pub enum DataEvent {
    Overview {
        ticket: u64,
        result: Result<OverviewData, String>,
    },
    Procurements {
        ticket: u64,
        result: Result<ProcurementPage, String>,
    },
    Statistics {
        ticket: u64,
        result: Result<Statistics, String>,
    },
    MonitorFinished(Result<RunReport, String>),
}

pub struct Loader {
    db: Arc<Mutex<Database>>,
    settings: Settings,
    tx: UnboundedSender<DataEvent>,
}

impl Loader {
    pub fn new(db: Database, settings: Settings) -> (Self, UnboundedReceiver<DataEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let loader = Self {
            db: Arc::new(Mutex::new(db)),
            settings,
            tx,
        };
        (loader, rx)
    }

    /// Run `query` on the blocking pool and send its result wrapped by `wrap`
    fn spawn_query<T, Q, W>(&self, query: Q, wrap: W)
    where
        T: Send + 'static,
        Q: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
        W: FnOnce(Result<T, String>) -> DataEvent + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let tx = self.tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = match db.lock() {
                Ok(guard) => query(&*guard).map_err(|e| e.to_string()),
                Err(_) => Err("conexão com o banco indisponível".to_string()),
            };
            if tx.send(wrap(result)).is_err() {
                warn!("Dashboard closed before a load finished");
            }
        });
    }

    pub fn load_overview(&self, ticket: u64) {
        let since = recent_since(&self.settings);
        self.spawn_query(
            move |db| {
                Ok(OverviewData {
                    statistics: db.statistics(since)?,
                    runs: db.recent_runs(OVERVIEW_RUNS)?,
                })
            },
            move |result| DataEvent::Overview { ticket, result },
        );
    }

    pub fn load_procurements(&self, ticket: u64, query: PageQuery) {
        self.spawn_query(
            move |db| {
                Ok(ProcurementPage {
                    items: db.list(&query.filter, query.limit, query.offset)?,
                    total: db.count(&query.filter)?,
                    modalities: db.modalities_present()?,
                })
            },
            move |result| DataEvent::Procurements { ticket, result },
        );
    }

    pub fn load_statistics(&self, ticket: u64) {
        let since = recent_since(&self.settings);
        self.spawn_query(
            move |db| db.statistics(since),
            move |result| DataEvent::Statistics { ticket, result },
        );
    }

    /// Start a monitoring run in the background
    pub fn spawn_monitor(&self) {
        let settings = self.settings.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = run_monitor(&settings).await.map_err(|e| format!("{:#}", e));
            if tx.send(DataEvent::MonitorFinished(result)).is_err() {
                warn!("Dashboard closed before the monitoring run finished");
            }
        });
    }
}

/// One monitoring run followed by notification of what is pending
async fn run_monitor(settings: &Settings) -> Result<RunReport> {
    let client = PncpClient::new(settings)?;
    let db = Database::open(&settings.database_path)
        .with_context(|| format!("opening database {}", settings.database_path.display()))?;
    let mut monitor = Monitor::new(client, db, settings);
    let report = monitor.run(settings.lookback_days, &[]).await?;

    let notifier = Notifier::from_settings(settings)?;
    if notifier.is_enabled() {
        match monitor.notify_pending(&notifier).await {
            Ok(sent) => info!("{} procurement(s) notified after dashboard run", sent),
            Err(e) => warn!("Notification failed: {:#}", e),
        }
    }
    Ok(report)
}
