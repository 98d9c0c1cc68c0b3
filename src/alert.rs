//! Failure alerts by email.
//!
//! Delivery is best effort: any failure while building or sending the
//! message is written to the log target and goes no further. A failed alert
//! is never itself alerted.

use crate::application::SmtpConfig;
use crate::logger::Logger;
use chrono::{DateTime, Local};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Timestamp format of the alert body's `Time:` line.
const ALERT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("invalid address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },
    #[error(transparent)]
    Message(#[from] lettre::error::Error),
    #[error(transparent)]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// A failure notification ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl AlertMessage {
    pub fn failure(
        config: &SmtpConfig,
        job_name: &str,
        error_message: &str,
        time: DateTime<Local>,
    ) -> Self {
        Self {
            from: config.from.clone(),
            to: config.to.clone(),
            subject: format!("BACKUP FAILED: {job_name}"),
            body: format!(
                "Backup job failed\n\nJob name: {job_name}\nTime: {}\nError: {error_message}",
                time.format(ALERT_TIMESTAMP_FORMAT)
            ),
        }
    }
}

/// Mail transport seam.
pub trait Mailer {
    fn send(&self, message: &AlertMessage) -> Result<(), AlertError>;
}

/// Sends alerts through an SMTP relay with STARTTLS and login credentials.
///
/// Every call opens its own session and closes it before returning.
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<SmtpTransport, AlertError> {
        let credentials =
            Credentials::new(self.config.username.clone(), self.config.password.clone());
        let mut builder = SmtpTransport::starttls_relay(&self.config.host)?
            .port(self.config.port)
            .credentials(credentials);
        if let Some(secs) = self.config.timeout_secs {
            builder = builder.timeout(Some(Duration::from_secs(secs)));
        }
        Ok(builder.build())
    }
}

fn mailbox(address: &str) -> Result<Mailbox, AlertError> {
    address.parse().map_err(|source| AlertError::Address {
        address: address.to_string(),
        source,
    })
}

impl Mailer for SmtpMailer {
    fn send(&self, alert: &AlertMessage) -> Result<(), AlertError> {
        let message = Message::builder()
            .from(mailbox(&alert.from)?)
            .to(mailbox(&alert.to)?)
            .subject(alert.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(alert.body.clone())?;

        let transport = self.transport()?;
        transport.send(&message)?;
        debug!(relay = %self.config.host, to = %alert.to, "Alert sent");
        Ok(())
    }
}

/// Builds failure alerts and hands them to a [`Mailer`].
pub struct Alerter<'a, M: Mailer> {
    config: &'a SmtpConfig,
    mailer: M,
    logger: &'a Logger,
}

impl<'a, M: Mailer> Alerter<'a, M> {
    pub fn new(config: &'a SmtpConfig, mailer: M, logger: &'a Logger) -> Self {
        Self {
            config,
            mailer,
            logger,
        }
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    /// Sends the failure alert for `job_name`. Delivery errors are logged only.
    pub fn send_failure_alert(&self, job_name: &str, error_message: &str, time: DateTime<Local>) {
        let message = AlertMessage::failure(self.config, job_name, error_message, time);
        if let Err(e) = self.mailer.send(&message) {
            debug!(job = job_name, error = %e, "Email alert failed");
            self.logger.log(&format!("FAIL - Email alert failed: {e}"));
        }
    }
}
