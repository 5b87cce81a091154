use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;

use crate::{
    config::OtpConfig,
    domain::{EmailOtp, OtpVerification},
    error::{AppError, Result},
    mailer::Mailer,
    repository::OtpRepository,
};

/// Fixed code issued (and accepted) under the dev auto-verify policy.
pub const DEV_SENTINEL_CODE: &str = "123456";

/// How codes are generated and checked. Injected at construction so a
/// production wiring never carries the bypass branch implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPolicy {
    Standard,
    /// Issues the sentinel code and accepts any submitted code.
    DevAutoVerify,
}

pub struct OtpService {
    repo: Arc<dyn OtpRepository>,
    mailer: Arc<dyn Mailer>,
    policy: OtpPolicy,
    code_length: usize,
    ttl: Duration,
}

impl OtpService {
    pub fn new(repo: Arc<dyn OtpRepository>, mailer: Arc<dyn Mailer>, config: &OtpConfig) -> Self {
        let policy = if config.dev_auto_verify {
            tracing::warn!("OTP dev auto-verify is enabled; any code will be accepted");
            OtpPolicy::DevAutoVerify
        } else {
            OtpPolicy::Standard
        };

        Self {
            repo,
            mailer,
            policy,
            code_length: config.code_length,
            ttl: Duration::seconds(config.ttl_seconds),
        }
    }

    pub fn generate_code(&self) -> String {
        match self.policy {
            OtpPolicy::DevAutoVerify => DEV_SENTINEL_CODE.to_string(),
            OtpPolicy::Standard => {
                let mut rng = rand::thread_rng();
                (0..self.code_length)
                    .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
                    .collect()
            }
        }
    }

    /// Stores a code for the email, superseding any outstanding one.
    pub async fn store(&self, email: &str, code: &str) -> Result<EmailOtp> {
        let now = Utc::now();
        let record = EmailOtp {
            email: email.to_string(),
            code: code.to_string(),
            created_at: now,
            expires_at: now + self.ttl,
        };

        self.repo.replace(&record).await?;
        Ok(record)
    }

    /// Generates, stores, and emails a fresh code.
    pub async fn issue(&self, email: &str) -> Result<EmailOtp> {
        let code = self.generate_code();
        let record = self.store(email, &code).await?;

        let ttl_minutes = self.ttl.num_minutes();
        let body = format!(
            "<p>Your verification code is <strong>{}</strong>.</p>\
             <p>It expires in {} minutes.</p>",
            code, ttl_minutes
        );

        if let Err(e) = self.mailer.send(email, "Your verification code", &body).await {
            tracing::error!("Failed to send OTP email to {}: {}", email, e);
            return Err(AppError::External("Failed to send verification email".to_string()));
        }

        Ok(record)
    }

    /// Single-use verification: the row is deleted on success. A code that
    /// matches but has expired is never accepted.
    pub async fn verify(&self, email: &str, submitted_code: &str) -> Result<OtpVerification> {
        if self.policy == OtpPolicy::DevAutoVerify {
            self.repo.delete(email).await?;
            return Ok(OtpVerification::Verified);
        }

        let Some(record) = self.repo.find_by_email(email).await? else {
            return Ok(OtpVerification::NotFound);
        };

        if record.code != submitted_code {
            return Ok(OtpVerification::InvalidCode);
        }

        if record.is_expired(Utc::now()) {
            return Ok(OtpVerification::Expired);
        }

        self.repo.delete(email).await?;
        Ok(OtpVerification::Verified)
    }

    /// Seconds until the outstanding code expires, floored at zero. `None`
    /// when no code is outstanding.
    pub async fn remaining_seconds(&self, email: &str) -> Result<Option<i64>> {
        let record = self.repo.find_by_email(email).await?;

        Ok(record.map(|r| (r.expires_at - Utc::now()).num_seconds().max(0)))
    }

    pub async fn purge_expired(&self) -> Result<u64> {
        self.repo.purge_expired().await
    }
}
