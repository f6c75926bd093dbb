use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::Modality;
use crate::config::MAX_WINDOW_DAYS;

#[derive(Parser, Debug)]
#[command(
    name = "pncp-monitor",
    version,
    about = "Monitor municipal procurements published on PNCP"
)]
pub struct Cli {
    #[arg(long, global = true, env = "PNCP_CONFIG", help = "YAML settings file")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Interactive dashboard (default)
    Dashboard,
    /// Run one monitoring pass
    Monitor {
        #[arg(
            long,
            value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_WINDOW_DAYS)),
            help = "Days to look back (default from settings)"
        )]
        days: Option<u32>,
        #[arg(long = "modality", value_parser = parse_modality, help = "Modality code 1-13, repeatable")]
        modalities: Vec<Modality>,
        #[arg(long, default_value_t = false, help = "Dispatch notifications afterwards")]
        notify: bool,
    },
    /// List stored procurements, newest first
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, value_parser = parse_modality)]
        modality: Option<Modality>,
        #[arg(long, help = "Published on or after (YYYY-MM-DD)")]
        from: Option<NaiveDate>,
        #[arg(long, help = "Published on or before (YYYY-MM-DD)")]
        to: Option<NaiveDate>,
    },
    /// Aggregate statistics
    Stats,
    /// Recent monitoring runs
    Runs {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Send pending notifications
    Notify,
    /// Fetch the full record of one procurement from PNCP
    Details {
        cnpj: String,
        year: i32,
        sequential: i64,
    },
}

fn parse_modality(raw: &str) -> Result<Modality, String> {
    let code: u8 = raw
        .parse()
        .map_err(|_| format!("modality must be a number between 1 and 13, got {:?}", raw))?;
    Modality::try_from(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["pncp-monitor"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn test_monitor_args() {
        let cli = Cli::try_parse_from([
            "pncp-monitor",
            "--json",
            "monitor",
            "--days",
            "30",
            "--modality",
            "6",
            "--modality",
            "8",
            "--notify",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(
            cli.command,
            Some(Commands::Monitor {
                days: Some(30),
                modalities: vec![Modality::PregaoEletronico, Modality::DispensaDeLicitacao],
                notify: true,
            })
        );
    }

    #[test]
    fn test_days_is_bounded() {
        assert!(Cli::try_parse_from(["pncp-monitor", "monitor", "--days", "3650"]).is_ok());
        assert!(Cli::try_parse_from(["pncp-monitor", "monitor", "--days", "200000000"]).is_err());
    }

    #[test]
    fn test_bad_modality_rejected() {
        assert!(Cli::try_parse_from(["pncp-monitor", "list", "--modality", "14"]).is_err());
        assert!(Cli::try_parse_from(["pncp-monitor", "list", "--modality", "x"]).is_err());
    }

    #[test]
    fn test_list_dates() {
        let cli = Cli::try_parse_from(["pncp-monitor", "list", "--from", "2025-05-01", "--limit", "5"]).unwrap();
        match cli.command {
            Some(Commands::List { from, limit, to, .. }) => {
                assert_eq!(from, NaiveDate::from_ymd_opt(2025, 5, 1));
                assert_eq!(limit, 5);
                assert_eq!(to, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
