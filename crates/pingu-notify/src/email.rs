//! Email delivery over plain SMTP.

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use pingu_core::config::EmailConfig;
use pingu_core::Episode;
use tracing::{debug, info};

use crate::error::{NotifyError, NotifyResult};
use crate::message::{alert_body, alert_subject, Report};

pub const DEFAULT_PORT: u16 = 25;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Split a `;`-separated address list, dropping blank entries.
pub fn parse_addresses(list: &str) -> Vec<&str> {
    list.split(';').map(str::trim).filter(|a| !a.is_empty()).collect()
}

fn mailboxes(field: &'static str, list: &str) -> NotifyResult<Vec<Mailbox>> {
    parse_addresses(list)
        .into_iter()
        .map(|address| {
            address.parse::<Mailbox>().map_err(|e| NotifyError::InvalidAddress {
                field,
                address: address.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Validated SMTP server and addressing.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailSettings {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
    pub cc: Vec<Mailbox>,
}

impl EmailSettings {
    /// Validate merged email options. The host is required, the sender must
    /// be exactly one valid address, and every recipient must parse.
    pub fn from_config(config: &EmailConfig) -> NotifyResult<Self> {
        let host = config
            .host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(NotifyError::MissingHost)?;

        let from_list = config.from.as_deref().unwrap_or_default();
        let mut from = mailboxes("from", from_list)?;
        if from.len() != 1 {
            return Err(NotifyError::SenderCount(from_list.to_string()));
        }

        let to = mailboxes("to", config.to.as_deref().unwrap_or_default())?;
        let cc = mailboxes("cc", config.cc.as_deref().unwrap_or_default())?;
        if to.is_empty() && cc.is_empty() {
            return Err(NotifyError::NoRecipients);
        }

        Ok(Self {
            host: host.to_string(),
            port: config.port.unwrap_or(DEFAULT_PORT),
            user: config.user.clone().filter(|u| !u.is_empty()),
            password: config.password.clone(),
            from: from.remove(0),
            to,
            cc,
        })
    }
}

/// Subject and plain-text body of one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn alert(url: &str, episode: &Episode) -> Self {
        Self {
            subject: alert_subject(url),
            body: alert_body(url, episode),
        }
    }

    pub fn report(report: &Report) -> Self {
        Self {
            subject: report.subject(),
            body: report.to_text(),
        }
    }
}

/// Delivers notifications.
pub trait Notifier {
    fn send(&self, message: &EmailMessage) -> NotifyResult<()>;
}

/// Unencrypted SMTP delivery with optional credentials.
#[derive(Debug)]
pub struct SmtpNotifier {
    settings: EmailSettings,
    transport: SmtpTransport,
}

impl SmtpNotifier {
    pub fn new(settings: EmailSettings) -> Self {
        let mut builder = SmtpTransport::builder_dangerous(&settings.host)
            .port(settings.port)
            .timeout(Some(CONNECT_TIMEOUT));
        if let Some(user) = &settings.user {
            let password = settings.password.clone().unwrap_or_default();
            builder = builder.credentials(Credentials::new(user.clone(), password));
        }
        Self {
            transport: builder.build(),
            settings,
        }
    }

    pub fn settings(&self) -> &EmailSettings {
        &self.settings
    }

    /// Build the wire message for `message` without sending it.
    pub fn compose(&self, message: &EmailMessage) -> NotifyResult<Message> {
        let mut builder = Message::builder()
            .from(self.settings.from.clone())
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN);
        for to in &self.settings.to {
            builder = builder.to(to.clone());
        }
        for cc in &self.settings.cc {
            builder = builder.cc(cc.clone());
        }
        builder
            .body(message.body.clone())
            .map_err(|e| NotifyError::Build(e.to_string()))
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, message: &EmailMessage) -> NotifyResult<()> {
        let email = self.compose(message)?;
        debug!(
            host = %self.settings.host,
            port = self.settings.port,
            recipients = email.envelope().to().len(),
            "sending email"
        );
        self.transport.send(&email).map_err(|e| NotifyError::Send {
            host: self.settings.host.clone(),
            reason: e.to_string(),
        })?;
        info!(subject = %message.subject, "email sent");
        Ok(())
    }
}
