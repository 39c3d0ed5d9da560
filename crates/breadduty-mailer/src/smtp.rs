//! SMTP transport — async lettre sending.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use breadduty_core::config::SmtpConfig;
use breadduty_core::{Error, Result};

/// The email collaborator interface the core consumes.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send_mail(&self, to: &str, to_name: &str, subject: &str, body: &str) -> Result<()>;
}

/// Real SMTP mailer. The transport is built once from process configuration
/// (host, port, credentials, TLS mode) and reused for every send.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        if config.host.is_empty() {
            return Err(Error::Config("smtp.host is not configured".into()));
        }
        if config.from_email.is_empty() {
            return Err(Error::Config("smtp.from_email is not configured".into()));
        }

        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid from address: {e}")))?;

        let builder = match config.tls.as_str() {
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| Error::Config(format!("SMTP relay: {e}")))?,
            "starttls" => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| Error::Config(format!("SMTP relay: {e}")))?,
            "none" => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
            other => {
                return Err(Error::Config(format!(
                    "Unknown smtp.tls mode '{other}' (expected tls, starttls, or none)"
                )));
            }
        };

        let mut builder = builder
            .port(config.port)
            .timeout(Some(std::time::Duration::from_secs(config.timeout_secs)));
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send_mail(&self, to: &str, to_name: &str, subject: &str, body: &str) -> Result<()> {
        let to_mailbox: Mailbox = format!("{to_name} <{to}>")
            .parse()
            .map_err(|e| Error::Transport(format!("Invalid to address: {e}")))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| Error::Transport(format!("Build email: {e}")))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| Error::Transport(format!("SMTP send: {e}")))?;

        tracing::info!("Email sent to {to_name} <{to}>");
        Ok(())
    }
}

/// No-op transport used when SMTP is not configured — logs instead of
/// sending so the rest of the service keeps working in development.
pub struct NullTransport;

#[async_trait]
impl MailTransport for NullTransport {
    async fn send_mail(&self, to: &str, to_name: &str, subject: &str, _body: &str) -> Result<()> {
        tracing::warn!("SMTP not configured; dropping mail to {to_name} <{to}>: {subject}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.office.test".into(),
            from_email: "roster@office.test".into(),
            ..SmtpConfig::default()
        }
    }

    #[tokio::test]
    async fn test_from_config_requires_host_and_from() {
        assert!(SmtpMailer::from_config(&SmtpConfig::default()).is_err());

        let mut missing_from = config();
        missing_from.from_email = String::new();
        assert!(SmtpMailer::from_config(&missing_from).is_err());

        assert!(SmtpMailer::from_config(&config()).is_ok());
    }

    #[tokio::test]
    async fn test_tls_modes() {
        for mode in ["tls", "starttls", "none"] {
            let mut cfg = config();
            cfg.tls = mode.into();
            assert!(SmtpMailer::from_config(&cfg).is_ok(), "mode {mode}");
        }

        let mut cfg = config();
        cfg.tls = "ssl3".into();
        assert!(matches!(
            SmtpMailer::from_config(&cfg),
            Err(Error::Config(_))
        ));
    }
}
