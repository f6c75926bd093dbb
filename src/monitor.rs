//! Monitoring run: search the API, persist what is new, log the run

use anyhow::{anyhow, Result};
use chrono::{Days, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{error, info};

use crate::api::{Modality, ProcurementSource, SearchQuery};
use crate::config::Settings;
use crate::notifier::Notifier;
use crate::store::{Database, NewProcurement};

/// Setting key holding the timestamp of the last successful run
pub const LAST_RUN_KEY: &str = "last_run_at";

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub success: bool,
    pub found: usize,
    pub inserted: usize,
    pub executed_at: NaiveDateTime,
}

pub struct Monitor<S> {
    source: S,
    db: Database,
    ibge_code: String,
    municipality: String,
    portal_base_url: String,
}

impl<S: ProcurementSource> Monitor<S> {
    pub fn new(source: S, db: Database, settings: &Settings) -> Self {
        info!(
            "Monitor ready for {} ({})",
            settings.municipality, settings.ibge_code
        );
        Self {
            source,
            db,
            ibge_code: settings.ibge_code.clone(),
            municipality: settings.municipality.clone(),
            portal_base_url: settings.portal_base_url.clone(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Search `[today - lookback_days, today]`. Empty `modalities` means all.
    pub async fn run(&mut self, lookback_days: u32, modalities: &[Modality]) -> Result<RunReport> {
        let to = Local::now().date_naive();
        let from = to
            .checked_sub_days(Days::new(u64::from(lookback_days)))
            .ok_or_else(|| anyhow!("lookback of {} days is out of range", lookback_days))?;
        self.run_window(from, to, modalities).await
    }

    pub async fn run_window(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
        modalities: &[Modality],
    ) -> Result<RunReport> {
        info!("Starting monitoring run for {}", self.municipality);
        info!("Period: {} to {}", from.format("%d/%m/%Y"), to.format("%d/%m/%Y"));

        let query = SearchQuery {
            ibge_code: self.ibge_code.clone(),
            from,
            to,
            modalities: modalities.to_vec(),
        };

        match self.fetch_and_store(&query).await {
            Ok((found, inserted)) => {
                let executed_at = Local::now().naive_local();
                self.db
                    .record_run(found, inserted, true, "Monitoramento executado com sucesso")?;
                self.db
                    .set_setting(LAST_RUN_KEY, &executed_at.format("%Y-%m-%d %H:%M:%S").to_string())?;
                info!("Monitoring finished: {} found, {} new", found, inserted);
                Ok(RunReport {
                    success: true,
                    found,
                    inserted,
                    executed_at,
                })
            }
            Err(e) => {
                error!("Monitoring run failed: {:#}", e);
                self.db.record_run(0, 0, false, &format!("Erro: {}", e))?;
                Err(e)
            }
        }
    }

    async fn fetch_and_store(&mut self, query: &SearchQuery) -> Result<(usize, usize)> {
        let fetched = self.source.search(query).await?;
        info!("Total procurements found: {}", fetched.len());

        let records = fetched
            .iter()
            .map(|f| NewProcurement::from_fetched(f, &self.portal_base_url))
            .collect::<Result<Vec<_>, _>>()?;
        let inserted = self.db.save_all(&records)?;
        info!("New procurements: {}", inserted);
        Ok((fetched.len(), inserted))
    }

    /// Send every pending procurement and mark the delivered ones.
    /// Returns how many were marked.
    pub async fn notify_pending(&mut self, notifier: &Notifier) -> Result<usize> {
        if !notifier.is_enabled() {
            info!("Notifications disabled; nothing sent");
            return Ok(0);
        }
        let pending = self.db.pending_notifications()?;
        if pending.is_empty() {
            info!("No procurement pending notification");
            return Ok(0);
        }

        let sent = notifier.dispatch(&pending).await?;
        if sent == 0 {
            return Ok(0);
        }
        for p in &pending {
            self.db.mark_notified(p.id)?;
        }
        info!("{} procurement(s) marked as notified", pending.len());
        Ok(pending.len())
    }
}
