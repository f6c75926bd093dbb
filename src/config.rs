//! Runtime configuration
//!
//! Settings come from an optional YAML file and are then overridden by
//! `PNCP_*` environment variables. Every field has a default; the defaults target
//! Santo Antônio de Pádua - RJ.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "pncp_monitor.yaml";

/// Longest search or statistics window accepted, in days
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Outgoing mail server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    /// Upgrade the connection with STARTTLS; plain SMTP otherwise
    pub starttls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address; falls back to `username`
    pub from: Option<String>,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            starttls: true,
            username: None,
            password: None,
            from: None,
        }
    }
}

/// Notification delivery settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    /// E-mail recipients; also forwarded in webhook payloads
    pub recipients: Vec<String>,
    /// Mail server; the e-mail channel is off without it
    pub smtp: Option<SmtpSettings>,
    /// Webhook receiving new-procurement alerts
    pub webhook_url: Option<String>,
    /// Write alerts to the log. Alerts delivered only here still count as
    /// notified, so this is off unless asked for.
    pub log_channel: bool,
}

/// Dashboard color overrides (`#rrggbb`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeSettings {
    pub accent: Option<String>,
    pub background: Option<String>,
}

/// All runtime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// IBGE municipality code (7 digits)
    pub ibge_code: String,
    /// Display name of the monitored municipality
    pub municipality: String,
    pub database_path: PathBuf,
    /// Log destination while the dashboard owns the terminal
    pub log_file: PathBuf,
    pub api_base_url: String,
    pub portal_base_url: String,
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub page_size: u32,
    /// Upper bound on pages fetched per modality
    pub max_pages: u32,
    /// Pause between modality queries
    pub modality_delay_ms: u64,
    /// Default search window of a monitoring run
    pub lookback_days: u32,
    /// Window of the "recent procurements" figure
    pub recent_window_days: u32,
    /// Dashboard auto-refresh interval
    pub refresh_secs: u64,
    pub notify: NotifySettings,
    pub theme: ThemeSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ibge_code: "3304706".to_string(),
            municipality: "Santo Antônio de Pádua - RJ".to_string(),
            database_path: PathBuf::from("pncp_monitor.db"),
            log_file: PathBuf::from("pncp_monitor.log"),
            api_base_url: "https://pncp.gov.br/api/consulta/v1".to_string(),
            portal_base_url: "https://pncp.gov.br/app/editais".to_string(),
            timeout_secs: 30,
            retry_attempts: 3,
            page_size: 50,
            max_pages: 10,
            modality_delay_ms: 500,
            lookback_days: 7,
            recent_window_days: 30,
            refresh_secs: 60,
            notify: NotifySettings::default(),
            theme: ThemeSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings: explicit path, else `PNCP_CONFIG`, else
    /// `pncp_monitor.yaml` if present, else defaults. Env overrides apply last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("PNCP_CONFIG").ok().map(PathBuf::from))
            .or_else(|| {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            });

        let mut settings = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Parse a YAML settings file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Apply `PNCP_*` overrides using the given lookup
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("PNCP_IBGE_CODE") {
            self.ibge_code = v;
        }
        if let Some(v) = lookup("PNCP_MUNICIPALITY") {
            self.municipality = v;
        }
        if let Some(v) = lookup("PNCP_DATABASE") {
            self.database_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("PNCP_API_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("PNCP_WEBHOOK_URL") {
            self.notify.webhook_url = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("PNCP_EMAIL_TO") {
            self.notify.recipients = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = lookup("PNCP_SMTP_HOST").filter(|s| !s.is_empty()) {
            self.notify.smtp.get_or_insert_with(SmtpSettings::default).host = v;
        }
        if let Some(smtp) = self.notify.smtp.as_mut() {
            if let Some(v) = lookup("PNCP_SMTP_USER") {
                smtp.username = Some(v);
            }
            if let Some(v) = lookup("PNCP_SMTP_PASSWORD") {
                smtp.password = Some(v);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ibge_code.len() != 7 || !self.ibge_code.chars().all(|c| c.is_ascii_digit()) {
            bail!("IBGE code must have 7 digits, got {:?}", self.ibge_code);
        }
        if self.retry_attempts == 0 {
            bail!("retry_attempts must be at least 1");
        }
        if !(10..=500).contains(&self.page_size) {
            bail!("page_size must be between 10 and 500, got {}", self.page_size);
        }
        if self.max_pages == 0 {
            bail!("max_pages must be at least 1");
        }
        if self.lookback_days > MAX_WINDOW_DAYS {
            bail!("lookback_days must be at most {}, got {}", MAX_WINDOW_DAYS, self.lookback_days);
        }
        if self.recent_window_days > MAX_WINDOW_DAYS {
            bail!(
                "recent_window_days must be at most {}, got {}",
                MAX_WINDOW_DAYS,
                self.recent_window_days
            );
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn modality_delay(&self) -> Duration {
        Duration::from_millis(self.modality_delay_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let s = Settings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.ibge_code, "3304706");
        assert_eq!(s.retry_attempts, 3);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let s = Settings::from_yaml("municipality: Niterói - RJ\nibge_code: \"3303302\"\nnotify:\n  recipients: [a@b.br]\n").unwrap();
        assert_eq!(s.municipality, "Niterói - RJ");
        assert_eq!(s.ibge_code, "3303302");
        assert_eq!(s.notify.recipients, vec!["a@b.br".to_string()]);
        assert!(!s.notify.log_channel);
        assert_eq!(s.notify.smtp, None);
        assert_eq!(s.page_size, 50);
        assert_eq!(s.theme, ThemeSettings::default());
    }

    #[test]
    fn test_theme_section() {
        let s = Settings::from_yaml("theme:\n  accent: \"#3a7bd5\"\n").unwrap();
        assert_eq!(s.theme.accent.as_deref(), Some("#3a7bd5"));
        assert_eq!(s.theme.background, None);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Settings::from_yaml("  \n").unwrap(), Settings::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PNCP_IBGE_CODE", "3550308"),
            ("PNCP_DATABASE", "/tmp/x.db"),
            ("PNCP_WEBHOOK_URL", "http://hook"),
        ]
        .into_iter()
        .collect();
        let mut s = Settings::default();
        s.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(s.ibge_code, "3550308");
        assert_eq!(s.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(s.notify.webhook_url.as_deref(), Some("http://hook"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut s = Settings::default();
        s.ibge_code = "33047".to_string();
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.page_size = 5;
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.retry_attempts = 0;
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.recent_window_days = u32::MAX;
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.lookback_days = MAX_WINDOW_DAYS + 1;
        assert!(s.validate().is_err());
        s.lookback_days = MAX_WINDOW_DAYS;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_smtp_section_and_env() {
        let s = Settings::from_yaml(
            "notify:\n  recipients: [a@b.br]\n  smtp:\n    host: mail.local\n    port: 2525\n    starttls: false\n",
        )
        .unwrap();
        let smtp = s.notify.smtp.as_ref().unwrap();
        assert_eq!(smtp.host, "mail.local");
        assert_eq!(smtp.port, 2525);
        assert!(!smtp.starttls);
        assert_eq!(smtp.from, None);

        let env: HashMap<&str, &str> = [
            ("PNCP_SMTP_HOST", "smtp.pncp.local"),
            ("PNCP_SMTP_USER", "monitor@pncp.local"),
            ("PNCP_EMAIL_TO", "x@y.br, z@w.br"),
        ]
        .into_iter()
        .collect();
        let mut s = Settings::default();
        s.apply_env(|k| env.get(k).map(|v| v.to_string()));
        let smtp = s.notify.smtp.as_ref().unwrap();
        assert_eq!(smtp.host, "smtp.pncp.local");
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.username.as_deref(), Some("monitor@pncp.local"));
        assert_eq!(s.notify.recipients, vec!["x@y.br".to_string(), "z@w.br".to_string()]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.yaml");
        std::fs::write(&path, "lookback_days: 30\n").unwrap();
        let s = Settings::from_file(&path).unwrap();
        assert_eq!(s.lookback_days, 30);
    }
}
