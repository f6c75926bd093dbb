//! One-shot CLI commands

use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};
use serde::Serialize;

use crate::api::PncpClient;
use crate::cli::Commands;
use crate::config::Settings;
use crate::format;
use crate::monitor::Monitor;
use crate::notifier::Notifier;
use crate::store::{Database, ListFilter, Procurement, RunRecord, Statistics};

#[derive(Serialize)]
struct JsonOut<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Serialize)]
struct MonitorOut {
    report: crate::monitor::RunReport,
    notified: usize,
    statistics: Statistics,
}

#[derive(Serialize)]
struct ListOut {
    total: u64,
    items: Vec<Procurement>,
}

pub async fn execute(command: Commands, settings: &Settings, json: bool) -> Result<()> {
    match command {
        Commands::Dashboard => anyhow::bail!("the dashboard needs an interactive terminal"),
        Commands::Monitor {
            days,
            modalities,
            notify,
        } => {
            let client = PncpClient::new(settings)?;
            let db = open_db(settings)?;
            let mut monitor = Monitor::new(client, db, settings);
            let report = monitor
                .run(days.unwrap_or(settings.lookback_days), &modalities)
                .await?;
            let notified = if notify {
                let notifier = Notifier::from_settings(settings)?;
                monitor.notify_pending(&notifier).await?
            } else {
                0
            };
            let statistics = monitor.database().statistics(recent_since(settings))?;
            let out = MonitorOut {
                report,
                notified,
                statistics,
            };
            print_one(json, out, |o| {
                let mut text = format!(
                    "Executado em {}: {} encontrada(s), {} nova(s)",
                    o.report.executed_at.format("%d/%m/%Y às %H:%M"),
                    o.report.found,
                    o.report.inserted
                );
                if notify {
                    text.push_str(&format!(", {} notificada(s)", o.notified));
                }
                text.push('\n');
                text.push_str(&statistics_text(&o.statistics));
                text
            })
        }
        Commands::List {
            limit,
            offset,
            modality,
            from,
            to,
        } => {
            let db = open_db(settings)?;
            let filter = ListFilter {
                modality,
                published_from: from,
                published_to: to,
            };
            let out = ListOut {
                total: db.count(&filter)?,
                items: db.list(&filter, limit, offset)?,
            };
            if json {
                return print_one(true, out, |_| String::new());
            }
            println!("{} contratação(ões)", out.total);
            print_out(false, &out.items, procurement_row)
        }
        Commands::Stats => {
            let db = open_db(settings)?;
            let stats = db.statistics(recent_since(settings))?;
            print_one(json, stats, statistics_text)
        }
        Commands::Runs { limit } => {
            let db = open_db(settings)?;
            let runs = db.recent_runs(limit)?;
            print_out(json, &runs, run_row)
        }
        Commands::Notify => {
            let client = PncpClient::new(settings)?;
            let mut monitor = Monitor::new(client, open_db(settings)?, settings);
            let notifier = Notifier::from_settings(settings)?;
            let sent = monitor.notify_pending(&notifier).await?;
            print_one(json, sent, |n| format!("{} contratação(ões) notificada(s)", n))
        }
        Commands::Details {
            cnpj,
            year,
            sequential,
        } => {
            let client = PncpClient::new(settings)?;
            let details = client.fetch_details(&cnpj, year, sequential).await?;
            match details {
                Some(value) => print_one(json, value, |v| {
                    serde_json::to_string_pretty(v).unwrap_or_default()
                }),
                None => anyhow::bail!("procurement {}/{}/{} not found", cnpj, year, sequential),
            }
        }
    }
}

fn open_db(settings: &Settings) -> Result<Database> {
    Database::open(&settings.database_path)
        .with_context(|| format!("opening database {}", settings.database_path.display()))
}

/// Start of the "recent" window; clamps to the earliest date on overflow
pub fn recent_since(settings: &Settings) -> NaiveDate {
    Local::now()
        .date_naive()
        .checked_sub_days(Days::new(u64::from(settings.recent_window_days)))
        .unwrap_or(NaiveDate::MIN)
}

fn procurement_row(p: &Procurement) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        p.display_number(),
        format::date(p.published_at.as_deref().unwrap_or("")),
        p.modality_label(),
        format::currency(p.estimated_value.unwrap_or(0.0)),
        format::truncate(p.description.as_deref().unwrap_or("-"), 80)
    )
}

fn run_row(r: &RunRecord) -> String {
    format!(
        "{}\t{}\t{} encontrada(s)\t{} nova(s)\t{}",
        format::datetime(&r.executed_at),
        if r.success { "ok" } else { "falha" },
        r.found,
        r.inserted,
        r.message
    )
}

pub fn statistics_text(s: &Statistics) -> String {
    let mut out = format!(
        "Total de contratações: {}\nValor total estimado: {}\nÚltima atualização: {}\nNovas (janela recente): {}\n",
        s.total,
        format::currency(s.total_estimated_value),
        s.last_capture.as_deref().map(format::datetime).unwrap_or_else(|| "-".to_string()),
        s.recent
    );
    for m in &s.by_modality {
        out.push_str(&format!(
            "  {:<28} {:>5}  {:>6}  {}\n",
            m.label,
            m.count,
            format::percent(m.count, s.total),
            format::currency(m.estimated_value)
        ));
    }
    out
}

fn print_out<T: Serialize>(json: bool, data: &[T], row: impl Fn(&T) -> String) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        for d in data {
            println!("{}", row(d));
        }
    }
    Ok(())
}

fn print_one<T: Serialize>(json: bool, data: T, row: impl Fn(&T) -> String) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        println!("{}", row(&data));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ModalityCount;

    #[test]
    fn test_statistics_text() {
        let stats = Statistics {
            total: 3,
            total_estimated_value: 1500.5,
            last_capture: None,
            recent: 1,
            by_modality: vec![ModalityCount {
                modality_code: Some(6),
                label: "Pregão - Eletrônico".to_string(),
                count: 1,
                estimated_value: 1500.5,
            }],
        };
        let text = statistics_text(&stats);
        assert!(text.contains("Total de contratações: 3"));
        assert!(text.contains("R$ 1.500,50"));
        assert!(text.contains("Última atualização: -"));
        assert!(text.contains("33,3%"));
    }

    #[test]
    fn test_recent_since_clamps() {
        let settings = Settings {
            recent_window_days: u32::MAX,
            ..Settings::default()
        };
        assert_eq!(recent_since(&settings), NaiveDate::MIN);

        let settings = Settings {
            recent_window_days: 0,
            ..Settings::default()
        };
        assert_eq!(recent_since(&settings), Local::now().date_naive());
    }

    #[test]
    fn test_run_row() {
        let row = run_row(&RunRecord {
            id: 1,
            executed_at: "2025-05-12 10:00:00".to_string(),
            found: 4,
            inserted: 1,
            success: false,
            message: "Erro: timeout".to_string(),
        });
        assert!(row.starts_with("12/05/2025 às 10:00\tfalha"));
        assert!(row.ends_with("Erro: timeout"));
    }
}
