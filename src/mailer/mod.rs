use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    config::SmtpConfig,
    error::{AppError, Result},
};

/// Outbound email transport. OTP delivery is the only consumer; failures
/// are logged by callers, never retried here.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| AppError::Internal("SMTP enabled but no host configured".to_string()))?;
        let from_address = config
            .from_address
            .clone()
            .ok_or_else(|| AppError::Internal("SMTP enabled but no from address configured".to_string()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| AppError::Internal(format!("Invalid SMTP relay: {}", e)))?;

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from_address,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?,
            )
            .to(to
                .parse()
                .map_err(|e| AppError::BadRequest(format!("Invalid recipient address: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to build message: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::External(format!("SMTP send failed: {}", e)))?;

        Ok(())
    }
}

/// Stand-in when SMTP isn't configured: logs the message and succeeds.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<()> {
        tracing::info!("Email delivery disabled; would send '{}' to {}", subject, to);
        Ok(())
    }
}
