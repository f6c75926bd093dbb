//! New-procurement alerts
//!
//! Renders a plain-text and an HTML digest of unnotified procurements and
//! hands it to every configured channel.

use chrono::{Local, NaiveDateTime};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{Settings, SmtpSettings};
use crate::format;
use crate::store::Procurement;

const PORTAL_HOME: &str = "https://pncp.gov.br";
const TEXT_DESCRIPTION_LIMIT: usize = 150;
const HTML_DESCRIPTION_LIMIT: usize = 200;
const RULE_WIDTH: usize = 60;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("webhook {url} unreachable: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("webhook {url} answered {status}")]
    Status { url: String, status: u16 },
    #[error("invalid e-mail address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },
    #[error("e-mail channel has no sender address")]
    NoSender,
    #[error("e-mail channel has no recipients")]
    NoRecipients,
    #[error("failed to build e-mail: {0}")]
    Message(#[source] lettre::error::Error),
    #[error("SMTP delivery via {host} failed: {source}")]
    Smtp {
        host: String,
        #[source]
        source: lettre::transport::smtp::Error,
    },
}

/// Delivery channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    /// Emit the text digest through tracing
    Log,
    /// POST the digest as JSON
    Webhook { url: String },
    /// Multipart text/HTML e-mail to the recipients
    Smtp(SmtpSettings),
}

/// A rendered digest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub subject: String,
    pub text: String,
    pub html: String,
    pub recipients: Vec<String>,
    pub count: usize,
}

pub struct Notifier {
    municipality: String,
    recipients: Vec<String>,
    channels: Vec<Channel>,
    http: reqwest::Client,
}

impl Notifier {
    pub fn new(
        municipality: impl Into<String>,
        recipients: Vec<String>,
        channels: Vec<Channel>,
    ) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(NotifyError::Client)?;
        Ok(Self {
            municipality: municipality.into(),
            recipients,
            channels,
            http,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, NotifyError> {
        let mut channels = Vec::new();
        if settings.notify.log_channel {
            channels.push(Channel::Log);
        }
        match &settings.notify.smtp {
            Some(_) if settings.notify.recipients.is_empty() => {
                warn!("SMTP configured without recipients; e-mail channel disabled");
            }
            Some(smtp) => channels.push(Channel::Smtp(smtp.clone())),
            None => {}
        }
        if let Some(url) = settings.notify.webhook_url.as_ref().filter(|u| !u.is_empty()) {
            channels.push(Channel::Webhook { url: url.clone() });
        }
        Self::new(
            settings.municipality.clone(),
            settings.notify.recipients.clone(),
            channels,
        )
    }

    pub fn is_enabled(&self) -> bool {
        !self.channels.is_empty()
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn subject(&self) -> String {
        format!("Novas Contratações - {}", self.municipality)
    }

    pub fn compose(&self, records: &[Procurement], sent_at: NaiveDateTime) -> Notification {
        Notification {
            subject: self.subject(),
            text: render_text(records, &self.municipality, sent_at),
            html: render_html(records, &self.municipality, sent_at),
            recipients: self.recipients.clone(),
            count: records.len(),
        }
    }

    /// Send a digest of `records` to every channel. Returns the number of
    /// records delivered; zero when there is nothing to send.
    pub async fn dispatch(&self, records: &[Procurement]) -> Result<usize, NotifyError> {
        if records.is_empty() {
            info!("No procurements to notify");
            return Ok(0);
        }
        if !self.is_enabled() {
            warn!("No notification channel configured; {} alert(s) held back", records.len());
            return Ok(0);
        }

        let notification = self.compose(records, Local::now().naive_local());
        for channel in &self.channels {
            match channel {
                Channel::Log => {
                    info!("{}", notification.subject);
                    for line in notification.text.lines().filter(|l| !l.trim().is_empty()) {
                        info!("{}", line);
                    }
                }
                Channel::Webhook { url } => self.post(url, &notification).await?,
                Channel::Smtp(smtp) => send_mail(smtp, &notification).await?,
            }
        }

        info!(
            "Notification sent for {} procurement(s) to {} recipient(s)",
            notification.count,
            notification.recipients.len()
        );
        Ok(notification.count)
    }

    async fn post(&self, url: &str, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(url)
            .json(notification)
            .send()
            .await
            .map_err(|source| NotifyError::Http {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

fn mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.trim().parse().map_err(|source| NotifyError::Address {
        address: address.to_string(),
        source,
    })
}

async fn send_mail(smtp: &SmtpSettings, notification: &Notification) -> Result<(), NotifyError> {
    if notification.recipients.is_empty() {
        return Err(NotifyError::NoRecipients);
    }
    let from = smtp
        .from
        .as_deref()
        .or(smtp.username.as_deref())
        .ok_or(NotifyError::NoSender)?;

    let mut builder = Message::builder()
        .from(mailbox(from)?)
        .subject(notification.subject.as_str());
    for recipient in &notification.recipients {
        builder = builder.to(mailbox(recipient)?);
    }
    let message = builder
        .multipart(MultiPart::alternative_plain_html(
            notification.text.clone(),
            notification.html.clone(),
        ))
        .map_err(NotifyError::Message)?;

    let smtp_error = |source: lettre::transport::smtp::Error| NotifyError::Smtp {
        host: smtp.host.clone(),
        source,
    };
    let relay = if smtp.starttls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host).map_err(smtp_error)?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp.host.as_str())
    };
    let mut transport = relay
        .port(smtp.port)
        .timeout(Some(Duration::from_secs(30)));
    if let (Some(user), Some(password)) = (&smtp.username, &smtp.password) {
        transport = transport.credentials(Credentials::new(user.clone(), password.clone()));
    }

    transport.build().send(message).await.map_err(smtp_error)?;
    info!(
        "E-mail sent via {}:{} to {} recipient(s)",
        smtp.host,
        smtp.port,
        notification.recipients.len()
    );
    Ok(())
}

fn heading(p: &Procurement) -> String {
    let number = p.purchase_number.as_deref().unwrap_or("N/A");
    let year = p.year.map(|y| y.to_string()).unwrap_or_else(|| "N/A".to_string());
    format!("Contratação Nº {}/{}", number, year)
}

fn render_text(records: &[Procurement], municipality: &str, sent_at: NaiveDateTime) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = format!(
        "NOVAS CONTRATAÇÕES DETECTADAS\n{}\n{}\n\n\
         Foram encontradas {} nova(s) contratação(ões) no Portal Nacional \
         de Contratações Públicas (PNCP).\n\n",
        municipality,
        rule,
        records.len()
    );

    for (i, p) in records.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}\n   Modalidade: {}\n   Objeto: {}\n   Valor Estimado: {}\n\n",
            i + 1,
            heading(p),
            p.modality_label(),
            format::truncate(p.description.as_deref().unwrap_or("N/A"), TEXT_DESCRIPTION_LIMIT),
            format::currency(p.estimated_value.unwrap_or(0.0)),
        ));
    }

    out.push_str(&format!(
        "{}\nEste é um e-mail automático do Sistema de Monitoramento PNCP.\nData de envio: {}\n",
        rule,
        sent_at.format("%d/%m/%Y às %H:%M")
    ));
    out
}

fn render_html(records: &[Procurement], municipality: &str, sent_at: NaiveDateTime) -> String {
    let mut out = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<style>\n\
         body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 800px; margin: 0 auto; padding: 20px; }\n\
         .header { background: #667eea; color: white; padding: 30px; border-radius: 10px 10px 0 0; text-align: center; }\n\
         .content { background: #f8f9fa; padding: 30px; border-radius: 0 0 10px 10px; }\n\
         .procurement { background: white; padding: 20px; margin-bottom: 20px; border-radius: 8px; border-left: 4px solid #667eea; }\n\
         .label { font-weight: bold; color: #555; }\n\
         .value { color: #28a745; font-weight: bold; }\n\
         .modality { display: inline-block; background: #e3f2fd; color: #1976d2; padding: 4px 12px; border-radius: 20px; font-size: 12px; }\n\
         .link-btn { display: inline-block; background: #667eea; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px; }\n\
         .footer { text-align: center; color: #666; font-size: 12px; margin-top: 30px; border-top: 1px solid #ddd; }\n\
         </style>\n</head>\n<body>\n",
    );

    out.push_str(&format!(
        "<div class=\"header\">\n<h1>Novas Contratações Detectadas</h1>\n<p>{}</p>\n</div>\n\
         <div class=\"content\">\n<p>Foram encontradas <strong>{} nova(s) contratação(ões)</strong> \
         no Portal Nacional de Contratações Públicas (PNCP).</p>\n",
        escape_html(municipality),
        records.len()
    ));

    for p in records {
        let published = p
            .published_at
            .as_deref()
            .map(format::datetime)
            .unwrap_or_else(|| "N/A".to_string());
        let link = p
            .portal_link
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(PORTAL_HOME);
        out.push_str(&format!(
            "<div class=\"procurement\">\n<h3>{}</h3>\n\
             <p><span class=\"modality\">{}</span></p>\n\
             <p><span class=\"label\">Objeto:</span> {}</p>\n\
             <p><span class=\"label\">Valor Estimado:</span> <span class=\"value\">{}</span></p>\n\
             <p><span class=\"label\">Data de Publicação:</span> {}</p>\n\
             <a href=\"{}\" class=\"link-btn\" target=\"_blank\">Ver no PNCP →</a>\n</div>\n",
            escape_html(&heading(p)),
            escape_html(&p.modality_label()),
            escape_html(&format::truncate(
                p.description.as_deref().unwrap_or("N/A"),
                HTML_DESCRIPTION_LIMIT
            )),
            format::currency(p.estimated_value.unwrap_or(0.0)),
            escape_html(&published),
            escape_html(link),
        ));
    }

    out.push_str(&format!(
        "<div class=\"footer\">\n<p>Este é um e-mail automático do Sistema de Monitoramento PNCP.</p>\n\
         <p>Data de envio: {}</p>\n</div>\n</div>\n</body>\n</html>\n",
        sent_at.format("%d/%m/%Y às %H:%M")
    ));
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
