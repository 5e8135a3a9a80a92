//! Outgoing mail.
//!
//! The service only sends password reset links. Delivery sits behind the
//! [`Mailer`] trait; [`SmtpMailer`] talks to the configured relay and
//! [`LogMailer`] stands in when no relay is configured.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AppConfig;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid mail address '{address}': {reason}")]
    Address { address: String, reason: String },
    #[error("Failed to set up SMTP relay {host}: {reason}")]
    Transport { host: String, reason: String },
    #[error("Failed to deliver mail to {to}: {reason}")]
    Delivery { to: String, reason: String },
}

#[async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug {
    async fn send_password_reset(
        &self,
        to: &str,
        name: &str,
        reset_link: &str,
    ) -> Result<(), MailError>;
}

/// Picks the SMTP relay when `smtp_host` is set, the log otherwise.
pub fn mailer_from_config(config: &AppConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match config.smtp_host.as_deref() {
        Some(host) => {
            info!("Sending mail through SMTP relay {}:{}", host, config.smtp_port);
            Ok(Arc::new(SmtpMailer::from_config(config, host)?))
        }
        None => {
            warn!("SMTP_HOST is not set, password reset mail only goes to the log");
            Ok(Arc::new(LogMailer::from_config(config)))
        }
    }
}

fn parse_address(address: &str) -> Result<Address, MailError> {
    address.trim().parse::<Address>().map_err(|e| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

fn reset_body(name: &str, reset_link: &str) -> String {
    format!(
        "Hello {},\n\nA password reset was requested for your account. \
         Open the link below to choose a new password:\n\n{}\n\n\
         If you did not ask for this, ignore this message.\n",
        name, reset_link
    )
}

/// STARTTLS relay built from the `smtp_*` settings.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    host: String,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from.to_string())
            .field("host", &self.host)
            .finish()
    }
}

impl SmtpMailer {
    pub fn from_config(config: &AppConfig, host: &str) -> Result<Self, MailError> {
        let from = Mailbox::new(None, parse_address(&config.smtp_from)?);

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| MailError::Transport {
                host: host.to_string(),
                reason: e.to_string(),
            })?
            .port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            host: host.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_password_reset(
        &self,
        to: &str,
        name: &str,
        reset_link: &str,
    ) -> Result<(), MailError> {
        let recipient = Mailbox::new(Some(name.to_string()), parse_address(to)?);
        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject("Password reset")
            .header(ContentType::TEXT_PLAIN)
            .body(reset_body(name, reset_link))
            .map_err(|e| MailError::Delivery {
                to: to.to_string(),
                reason: e.to_string(),
            })?;

        self.transport.send(message).await.map_err(|e| MailError::Delivery {
            to: to.to_string(),
            reason: e.to_string(),
        })?;
        debug!("Password reset mail handed to {}", self.host);
        Ok(())
    }
}

/// Mailer that records outgoing messages in the log instead of sending them.
///
/// Only the envelope is logged; the link carries a live token.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            from: config.smtp_from.clone(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(
        &self,
        to: &str,
        name: &str,
        _reset_link: &str,
    ) -> Result<(), MailError> {
        parse_address(to)?;
        info!("Password reset mail from {} to {} <{}> not sent, no SMTP relay", self.from, name, to);
        Ok(())
    }
}
