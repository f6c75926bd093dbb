//! PNCP consultation API client
//!
//! Searches procurements published for one municipality, modality by
//! modality, following pagination and retrying transient failures with
//! exponential backoff.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::models::{extract_records, FetchedProcurement, PageInfo};
use super::modality::Modality;
use crate::config::Settings;

/// Client-side failures
#[derive(Debug, thiserror::Error)]
pub enum PncpError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last: String,
    },
    #[error("invalid response body from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// What to search for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub ibge_code: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Empty means every modality
    pub modalities: Vec<Modality>,
}

impl SearchQuery {
    /// Modalities to visit, expanding "all"
    pub fn effective_modalities(&self) -> Vec<Modality> {
        if self.modalities.is_empty() {
            Modality::ALL.to_vec()
        } else {
            self.modalities.clone()
        }
    }
}

/// Anything that can produce procurements for a query
#[async_trait]
pub trait ProcurementSource: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<FetchedProcurement>, PncpError>;
}

/// One decoded response page
#[derive(Debug, Default)]
struct Page {
    records: Vec<Value>,
    info: PageInfo,
}

/// HTTP client for `https://pncp.gov.br/api/consulta/v1`
pub struct PncpClient {
    http: reqwest::Client,
    base_url: String,
    retry_attempts: u32,
    page_size: u32,
    max_pages: u32,
    modality_delay: Duration,
    backoff_base: Duration,
}

impl PncpClient {
    pub fn new(settings: &Settings) -> Result<Self, PncpError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(concat!("pncp-monitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(PncpError::Client)?;

        Ok(Self {
            http,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            retry_attempts: settings.retry_attempts.max(1),
            page_size: settings.page_size,
            max_pages: settings.max_pages.max(1),
            modality_delay: settings.modality_delay(),
            backoff_base: Duration::from_secs(1),
        })
    }

    /// Override the backoff unit (delay before retry n is `base * 2^n`)
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Override the pause between modalities
    pub fn with_modality_delay(mut self, delay: Duration) -> Self {
        self.modality_delay = delay;
        self
    }

    /// Search every requested modality. A modality that fails is logged and
    /// skipped; the others still contribute.
    pub async fn search_municipality(&self, query: &SearchQuery) -> Vec<FetchedProcurement> {
        let modalities = query.effective_modalities();
        let mut all = Vec::new();

        for (i, modality) in modalities.iter().enumerate() {
            info!("Searching modality {} ({})", modality.code(), modality.label());

            match self.fetch_modality(query, *modality).await {
                Ok(found) if found.is_empty() => info!("No procurements found"),
                Ok(found) => {
                    info!("Found {} procurements", found.len());
                    all.extend(found);
                }
                Err(e) => error!("Failed to search modality {}: {}", modality.code(), e),
            }

            if i + 1 < modalities.len() && !self.modality_delay.is_zero() {
                tokio::time::sleep(self.modality_delay).await;
            }
        }

        info!("Total procurements found: {}", all.len());
        all
    }

    /// Every page of one modality, up to `max_pages`
    async fn fetch_modality(
        &self,
        query: &SearchQuery,
        modality: Modality,
    ) -> Result<Vec<FetchedProcurement>, PncpError> {
        let mut out = Vec::new();
        let mut page_number = 1;

        loop {
            let page = self.fetch_page(query, modality, page_number).await?;
            let empty = page.records.is_empty();
            out.extend(
                page.records
                    .into_iter()
                    .map(|raw| FetchedProcurement::from_value(raw, modality)),
            );

            if empty || !page.info.has_more(page_number) {
                break;
            }
            if page_number >= self.max_pages {
                warn!(
                    "Stopping modality {} at page limit {}",
                    modality.code(),
                    self.max_pages
                );
                break;
            }
            page_number += 1;
        }

        Ok(out)
    }

    fn page_params(&self, query: &SearchQuery, modality: Modality, page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("dataInicial", query.from.format("%Y%m%d").to_string()),
            ("dataFinal", query.to.format("%Y%m%d").to_string()),
            ("codigoMunicipioIbge", query.ibge_code.clone()),
            ("codigoModalidadeContratacao", modality.code().to_string()),
            ("pagina", page.to_string()),
            ("tamanhoPagina", self.page_size.to_string()),
        ]
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt)
    }

    async fn fetch_page(
        &self,
        query: &SearchQuery,
        modality: Modality,
        page: u32,
    ) -> Result<Page, PncpError> {
        let url = format!("{}/contratacoes/publicacao", self.base_url);
        let params = self.page_params(query, modality, page);
        let mut last = String::new();

        for attempt in 0..self.retry_attempts {
            debug!("GET {} page {} (attempt {})", url, page, attempt + 1);

            match self.http.get(&url).query(&params).send().await {
                Ok(response) => {
                    let status = response.status();
                    match status.as_u16() {
                        200 => {
                            let body: Value = response.json().await.map_err(|e| PncpError::Decode {
                                url: url.clone(),
                                message: e.to_string(),
                            })?;
                            return Ok(Page {
                                records: extract_records(&body),
                                info: PageInfo::from_value(&body),
                            });
                        }
                        204 => return Ok(Page::default()),
                        422 => {
                            warn!("Invalid IBGE code: {}", query.ibge_code);
                            return Ok(Page::default());
                        }
                        404 => {
                            warn!("Endpoint not found: {}", url);
                            return Ok(Page::default());
                        }
                        _ => {
                            let text = response.text().await.unwrap_or_default();
                            let snippet: String = text.chars().take(200).collect();
                            warn!("Status {}: {}", status, snippet);
                            last = format!("HTTP {}", status);
                        }
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        warn!("Timeout on attempt {}", attempt + 1);
                    } else {
                        error!("Request error: {}", e);
                    }
                    last = e.to_string();
                    if attempt + 1 < self.retry_attempts {
                        tokio::time::sleep(self.backoff(attempt)).await;
                    }
                }
            }
        }

        Err(PncpError::RetriesExhausted {
            url,
            attempts: self.retry_attempts,
            last,
        })
    }

    /// Full record of one procurement; `None` when the portal has no such entry
    pub async fn fetch_details(
        &self,
        cnpj: &str,
        year: i32,
        sequential: i64,
    ) -> Result<Option<Value>, PncpError> {
        let url = format!("{}/orgaos/{}/compras/{}/{}", self.base_url, cnpj, year, sequential);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| PncpError::Http {
                url: url.clone(),
                source,
            })?;

        if response.status().as_u16() != 200 {
            warn!("Failed to fetch details: {}", response.status());
            return Ok(None);
        }

        let body = response.json().await.map_err(|e| PncpError::Decode {
            url,
            message: e.to_string(),
        })?;
        Ok(Some(body))
    }
}

#[async_trait]
impl ProcurementSource for PncpClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<FetchedProcurement>, PncpError> {
        Ok(self.search_municipality(query).await)
    }
}
