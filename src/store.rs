//! SQLite persistence
//!
//! Stores procurements deduplicated on (agency CNPJ, year, sequential),
//! tracks which ones were already notified, keeps a log of monitoring runs
//! and a small key/value settings table.

use chrono::{Duration as ChronoDuration, NaiveDate};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::api::modality::Modality;
use crate::api::FetchedProcurement;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS procurements (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      purchase_number TEXT,
      year INTEGER,
      sequential INTEGER,
      ibge_code TEXT,
      agency_cnpj TEXT NOT NULL DEFAULT '',
      agency_name TEXT,
      description TEXT,
      estimated_value REAL,
      awarded_value REAL,
      modality_code INTEGER,
      modality_name TEXT,
      published_at TEXT,
      status TEXT,
      portal_link TEXT,
      raw_json TEXT,
      captured_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
      notified INTEGER NOT NULL DEFAULT 0,
      notified_at TEXT,
      UNIQUE(agency_cnpj, year, sequential)
    );
    CREATE TABLE IF NOT EXISTS settings (
      key TEXT PRIMARY KEY,
      value TEXT NOT NULL,
      updated_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
    );
    CREATE TABLE IF NOT EXISTS runs (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      executed_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
      found INTEGER NOT NULL,
      inserted INTEGER NOT NULL,
      success INTEGER NOT NULL,
      message TEXT NOT NULL DEFAULT ''
    );
    CREATE INDEX IF NOT EXISTS idx_procurements_published ON procurements(published_at);
    CREATE INDEX IF NOT EXISTS idx_procurements_notified ON procurements(notified);
    CREATE INDEX IF NOT EXISTS idx_procurements_modality ON procurements(modality_code);
";

const SELECT_PROCUREMENT: &str = "SELECT id, purchase_number, year, sequential, ibge_code, agency_cnpj, \
     agency_name, description, estimated_value, awarded_value, modality_code, modality_name, \
     published_at, status, portal_link, captured_at, notified, notified_at FROM procurements";

/// Storage failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("cannot create directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A stored procurement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Procurement {
    pub id: i64,
    pub purchase_number: Option<String>,
    pub year: Option<i32>,
    pub sequential: Option<i64>,
    pub ibge_code: Option<String>,
    pub agency_cnpj: String,
    pub agency_name: Option<String>,
    pub description: Option<String>,
    pub estimated_value: Option<f64>,
    pub awarded_value: Option<f64>,
    pub modality_code: Option<i64>,
    pub modality_name: Option<String>,
    pub published_at: Option<String>,
    pub status: Option<String>,
    pub portal_link: Option<String>,
    pub captured_at: String,
    pub notified: bool,
    pub notified_at: Option<String>,
}

impl Procurement {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            purchase_number: row.get("purchase_number")?,
            year: row.get("year")?,
            sequential: row.get("sequential")?,
            ibge_code: row.get("ibge_code")?,
            agency_cnpj: row.get("agency_cnpj")?,
            agency_name: row.get("agency_name")?,
            description: row.get("description")?,
            estimated_value: row.get("estimated_value")?,
            awarded_value: row.get("awarded_value")?,
            modality_code: row.get("modality_code")?,
            modality_name: row.get("modality_name")?,
            published_at: row.get("published_at")?,
            status: row.get("status")?,
            portal_link: row.get("portal_link")?,
            captured_at: row.get("captured_at")?,
            notified: row.get::<_, i64>("notified")? != 0,
            notified_at: row.get("notified_at")?,
        })
    }

    /// Modality label, falling back to the code table
    pub fn modality_label(&self) -> String {
        self.modality_name
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Modality::label_for_code(self.modality_code).to_string())
    }

    /// `00017/2025`-style identifier for display
    pub fn display_number(&self) -> String {
        let number = self.purchase_number.as_deref().unwrap_or("N/A");
        match self.year {
            Some(year) if !number.contains('/') => format!("{}/{}", number, year),
            _ => number.to_string(),
        }
    }
}

/// Values written for a newly fetched procurement
#[derive(Debug, Clone, PartialEq)]
pub struct NewProcurement {
    pub purchase_number: Option<String>,
    pub year: Option<i32>,
    pub sequential: Option<i64>,
    pub ibge_code: Option<String>,
    pub agency_cnpj: String,
    pub agency_name: Option<String>,
    pub description: Option<String>,
    pub estimated_value: Option<f64>,
    pub awarded_value: Option<f64>,
    pub modality: Modality,
    pub published_at: Option<String>,
    pub status: Option<String>,
    pub portal_link: Option<String>,
    pub raw_json: String,
}

impl NewProcurement {
    pub fn from_fetched(fetched: &FetchedProcurement, portal_base: &str) -> StoreResult<Self> {
        let r = &fetched.record;
        Ok(Self {
            purchase_number: r.numero_compra.clone(),
            year: r.ano_compra,
            sequential: r.sequencial_compra,
            ibge_code: r.ibge_code(),
            agency_cnpj: r.agency_cnpj().unwrap_or_default().to_string(),
            agency_name: r.agency_name().map(str::to_string),
            description: r.objeto_compra.clone(),
            estimated_value: r.valor_total_estimado,
            awarded_value: r.valor_total_homologado,
            modality: fetched.modality,
            published_at: r.data_publicacao_pncp.clone(),
            status: r.status(),
            portal_link: fetched.portal_link(portal_base),
            raw_json: serde_json::to_string(&fetched.raw)?,
        })
    }
}

/// Listing filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    pub modality: Option<Modality>,
    /// Inclusive lower bound on publication date
    pub published_from: Option<NaiveDate>,
    /// Inclusive upper bound on publication date
    pub published_to: Option<NaiveDate>,
}

impl ListFilter {
    fn where_clause(&self) -> (String, Vec<SqlValue>) {
        let mut sql = String::from(" WHERE 1=1");
        let mut args = Vec::new();
        if let Some(m) = self.modality {
            sql.push_str(" AND modality_code = ?");
            args.push(SqlValue::Integer(m.code() as i64));
        }
        if let Some(from) = self.published_from {
            sql.push_str(" AND published_at >= ?");
            args.push(SqlValue::Text(from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.published_to {
            // compare against the next day so timestamps on `to` are included
            sql.push_str(" AND published_at < ?");
            let next = to + ChronoDuration::days(1);
            args.push(SqlValue::Text(next.format("%Y-%m-%d").to_string()));
        }
        (sql, args)
    }
}

/// Count per modality
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalityCount {
    pub modality_code: Option<i64>,
    pub label: String,
    pub count: u64,
    pub estimated_value: f64,
}

/// Aggregate figures over the whole store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub total: u64,
    pub total_estimated_value: f64,
    /// Capture time of the newest row
    pub last_capture: Option<String>,
    /// Rows published on or after the recent-window start
    pub recent: u64,
    /// Ordered by count desc, then label
    pub by_modality: Vec<ModalityCount>,
}

impl Statistics {
    /// Family of the most frequent modality (`Pregão`), if any
    pub fn most_common_family(&self) -> Option<&str> {
        self.by_modality
            .first()
            .map(|m| crate::api::modality::label_family(&m.label))
    }
}

/// One row of the run log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub id: i64,
    pub executed_at: String,
    pub found: u64,
    pub inserted: u64,
    pub success: bool,
    pub message: String,
}

/// SQLite-backed store
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (and create if needed) the database file
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let db = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        db.init_schema()?;
        debug!("Connected to database: {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        db.init_schema()?;
        Ok(db)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Insert unless the dedup key already exists. `true` for a new row.
    pub fn save(&self, record: &NewProcurement) -> StoreResult<bool> {
        insert(&self.conn, record)
    }

    /// Insert many records in one transaction; returns how many were new
    pub fn save_all(&mut self, records: &[NewProcurement]) -> StoreResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        for record in records {
            if insert(&tx, record)? {
                inserted += 1;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    pub fn get(&self, id: i64) -> StoreResult<Option<Procurement>> {
        let sql = format!("{} WHERE id = ?1", SELECT_PROCUREMENT);
        Ok(self
            .conn
            .query_row(&sql, params![id], Procurement::from_row)
            .optional()?)
    }

    /// Not yet notified, newest publication first
    pub fn pending_notifications(&self) -> StoreResult<Vec<Procurement>> {
        let sql = format!(
            "{} WHERE notified = 0 ORDER BY published_at DESC, id DESC",
            SELECT_PROCUREMENT
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Procurement::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn mark_notified(&self, id: i64) -> StoreResult<()> {
        self.conn.execute(
            "UPDATE procurements SET notified = 1, notified_at = datetime('now', 'localtime') WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    /// Filtered page, newest publication first
    pub fn list(&self, filter: &ListFilter, limit: usize, offset: usize) -> StoreResult<Vec<Procurement>> {
        let (clause, mut args) = filter.where_clause();
        let sql = format!(
            "{}{} ORDER BY published_at DESC, id DESC LIMIT ? OFFSET ?",
            SELECT_PROCUREMENT, clause
        );
        args.push(SqlValue::Integer(limit as i64));
        args.push(SqlValue::Integer(offset as i64));
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), Procurement::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn count(&self, filter: &ListFilter) -> StoreResult<u64> {
        let (clause, args) = filter.where_clause();
        let sql = format!("SELECT COUNT(*) FROM procurements{}", clause);
        let n: i64 = self
            .conn
            .query_row(&sql, params_from_iter(args), |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Modalities that have at least one stored row, in code order
    pub fn modalities_present(&self) -> StoreResult<Vec<Modality>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT modality_code FROM procurements WHERE modality_code IS NOT NULL ORDER BY modality_code",
        )?;
        let codes = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        let mut out = Vec::new();
        for code in codes {
            if let Some(m) = u8::try_from(code?).ok().and_then(Modality::from_code) {
                out.push(m);
            }
        }
        Ok(out)
    }

    /// Aggregates; `recent_since` starts the recent-procurements window
    pub fn statistics(&self, recent_since: NaiveDate) -> StoreResult<Statistics> {
        let (total, value, last_capture): (i64, f64, Option<String>) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(estimated_value), 0), MAX(captured_at) FROM procurements",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let recent: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM procurements WHERE published_at >= ?1",
            params![recent_since.format("%Y-%m-%d").to_string()],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT modality_code, modality_name, COUNT(*) AS n, COALESCE(SUM(estimated_value), 0) \
             FROM procurements GROUP BY modality_code, modality_name \
             ORDER BY n DESC, modality_name ASC",
        )?;
        let by_modality = stmt
            .query_map([], |row| {
                let code: Option<i64> = row.get(0)?;
                let name: Option<String> = row.get(1)?;
                Ok(ModalityCount {
                    modality_code: code,
                    label: name
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| Modality::label_for_code(code).to_string()),
                    count: row.get::<_, i64>(2)? as u64,
                    estimated_value: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Statistics {
            total: total as u64,
            total_estimated_value: value,
            last_capture,
            recent: recent as u64,
            by_modality,
        })
    }

    pub fn record_run(&self, found: usize, inserted: usize, success: bool, message: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO runs (found, inserted, success, message) VALUES (?1, ?2, ?3, ?4)",
            params![found as i64, inserted as i64, success, message],
        )?;
        Ok(())
    }

    /// Most recent runs first
    pub fn recent_runs(&self, limit: usize) -> StoreResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, executed_at, found, inserted, success, message FROM runs ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(RunRecord {
                id: row.get(0)?,
                executed_at: row.get(1)?,
                found: row.get::<_, i64>(2)? as u64,
                inserted: row.get::<_, i64>(3)? as u64,
                success: row.get(4)?,
                message: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now', 'localtime')",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn setting(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?)
    }
}

fn insert(conn: &Connection, r: &NewProcurement) -> StoreResult<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO procurements (
           purchase_number, year, sequential, ibge_code, agency_cnpj, agency_name, description,
           estimated_value, awarded_value, modality_code, modality_name, published_at, status,
           portal_link, raw_json
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            r.purchase_number,
            r.year,
            r.sequential,
            r.ibge_code,
            r.agency_cnpj,
            r.agency_name,
            r.description,
            r.estimated_value,
            r.awarded_value,
            r.modality.code() as i64,
            r.modality.label(),
            r.published_at,
            r.status,
            r.portal_link,
            r.raw_json,
        ],
    )?;

    if changed == 1 {
        info!(
            "New procurement saved: {}/{}",
            r.year.map(|y| y.to_string()).unwrap_or_default(),
            r.sequential.map(|s| s.to_string()).unwrap_or_default()
        );
        Ok(true)
    } else {
        debug!("Procurement already stored: {:?}/{:?}", r.year, r.sequential);
        Ok(false)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn new_record(seq: i64, modality: Modality, value: f64, published: &str) -> NewProcurement {
        NewProcurement {
            purchase_number: Some(format!("{:05}/2025", seq)),
            year: Some(2025),
            sequential: Some(seq),
            ibge_code: Some("3304706".to_string()),
            agency_cnpj: "29138448000198".to_string(),
            agency_name: Some("MUNICIPIO DE SANTO ANTONIO DE PADUA".to_string()),
            description: Some(format!("Objeto {}", seq)),
            estimated_value: Some(value),
            awarded_value: None,
            modality,
            published_at: Some(published.to_string()),
            status: Some("Divulgada no PNCP".to_string()),
            portal_link: Some(format!("https://pncp.gov.br/app/editais/29138448000198/2025/{}", seq)),
            raw_json: "{}".to_string(),
        }
    }

    fn seeded() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        db.save_all(&[
            new_record(17, Modality::PregaoEletronico, 7_631_669.79, "2025-05-12T08:16:48"),
            new_record(42, Modality::PregaoEletronico, 242_030.00, "2025-05-13T07:19:16"),
            new_record(18, Modality::DispensaDeLicitacao, 720_591.72, "2025-05-14T07:05:04"),
        ])
        .unwrap();
        db
    }

    #[test]
    fn test_dedup_on_agency_year_sequential() {
        let db = Database::open_in_memory().unwrap();
        let rec = new_record(1, Modality::Concurso, 10.0, "2025-01-01T00:00:00");
        assert!(db.save(&rec).unwrap());
        assert!(!db.save(&rec).unwrap());

        let mut other_agency = rec.clone();
        other_agency.agency_cnpj = "00000000000191".to_string();
        assert!(db.save(&other_agency).unwrap());
        assert_eq!(db.count(&ListFilter::default()).unwrap(), 2);
    }

    #[test]
    fn test_save_all_counts_only_new() {
        let mut db = seeded();
        let again = db
            .save_all(&[
                new_record(17, Modality::PregaoEletronico, 1.0, "2025-05-12T08:16:48"),
                new_record(99, Modality::Concurso, 1.0, "2025-05-20T10:00:00"),
            ])
            .unwrap();
        assert_eq!(again, 1);
        assert_eq!(db.count(&ListFilter::default()).unwrap(), 4);
    }

    #[test]
    fn test_list_newest_first_and_paginated() {
        let db = seeded();
        let all = db.list(&ListFilter::default(), 10, 0).unwrap();
        let seqs: Vec<_> = all.iter().map(|p| p.sequential.unwrap()).collect();
        assert_eq!(seqs, vec![18, 42, 17]);

        let page = db.list(&ListFilter::default(), 2, 2).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].sequential, Some(17));
    }

    #[test]
    fn test_filters() {
        let db = seeded();
        let pregao = ListFilter {
            modality: Some(Modality::PregaoEletronico),
            ..Default::default()
        };
        assert_eq!(db.count(&pregao).unwrap(), 2);

        let one_day = ListFilter {
            published_from: NaiveDate::from_ymd_opt(2025, 5, 13),
            published_to: NaiveDate::from_ymd_opt(2025, 5, 13),
            ..Default::default()
        };
        let rows = db.list(&one_day, 10, 0).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sequential, Some(42));
    }

    #[test]
    fn test_statistics_agree_with_listing() {
        let db = seeded();
        let stats = db.statistics(NaiveDate::from_ymd_opt(2025, 5, 13).unwrap()).unwrap();
        assert_eq!(stats.total, db.count(&ListFilter::default()).unwrap());
        assert!((stats.total_estimated_value - 8_594_291.51).abs() < 0.001);
        assert_eq!(stats.recent, 2);
        assert!(stats.last_capture.is_some());
        assert_eq!(stats.by_modality.len(), 2);
        assert_eq!(stats.by_modality[0].label, "Pregão - Eletrônico");
        assert_eq!(stats.by_modality[0].count, 2);
        assert_eq!(stats.most_common_family(), Some("Pregão"));
        let summed: u64 = stats.by_modality.iter().map(|m| m.count).sum();
        assert_eq!(summed, stats.total);
    }

    #[test]
    fn test_statistics_empty_store() {
        let db = Database::open_in_memory().unwrap();
        let stats = db.statistics(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()).unwrap();
        assert_eq!(stats, Statistics::default());
        assert_eq!(stats.most_common_family(), None);
    }

    #[test]
    fn test_notification_flags() {
        let db = seeded();
        let pending = db.pending_notifications().unwrap();
        assert_eq!(pending.len(), 3);
        assert_eq!(pending[0].sequential, Some(18));

        db.mark_notified(pending[0].id).unwrap();
        assert_eq!(db.pending_notifications().unwrap().len(), 2);
        let marked = db.get(pending[0].id).unwrap().unwrap();
        assert!(marked.notified);
        assert!(marked.notified_at.is_some());
    }

    #[test]
    fn test_run_log_and_settings() {
        let db = Database::open_in_memory().unwrap();
        db.record_run(5, 2, true, "ok").unwrap();
        db.record_run(0, 0, false, "Erro: timeout").unwrap();
        let runs = db.recent_runs(10).unwrap();
        assert_eq!(runs.len(), 2);
        assert!(!runs[0].success);
        assert_eq!(runs[1].inserted, 2);

        assert_eq!(db.setting("last_run_at").unwrap(), None);
        db.set_setting("last_run_at", "a").unwrap();
        db.set_setting("last_run_at", "b").unwrap();
        assert_eq!(db.setting("last_run_at").unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn test_modalities_present() {
        let db = seeded();
        assert_eq!(
            db.modalities_present().unwrap(),
            vec![Modality::PregaoEletronico, Modality::DispensaDeLicitacao]
        );
    }

    #[test]
    fn test_open_on_disk_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("monitor.db");
        {
            let db = Database::open(&path).unwrap();
            db.save(&new_record(1, Modality::Concurso, 1.0, "2025-01-01")).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.count(&ListFilter::default()).unwrap(), 1);
        assert_eq!(db.path(), Some(path.as_path()));
    }

    #[test]
    fn test_display_number() {
        let db = seeded();
        let p = db.list(&ListFilter::default(), 1, 0).unwrap().remove(0);
        assert_eq!(p.display_number(), "00018/2025");
        assert_eq!(p.modality_label(), "Dispensa de Licitação");
    }
}
