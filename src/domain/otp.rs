use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One outstanding verification code per email address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailOtp {
    pub email: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl EmailOtp {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Outcome of a verification attempt. The three rejection cases get
/// distinct user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpVerification {
    Verified,
    Expired,
    InvalidCode,
    NotFound,
}

impl OtpVerification {
    pub fn is_verified(&self) -> bool {
        matches!(self, OtpVerification::Verified)
    }

    pub fn message(&self) -> &'static str {
        match self {
            OtpVerification::Verified => "Email verified successfully",
            OtpVerification::Expired => "Verification code has expired",
            OtpVerification::InvalidCode => "Invalid verification code",
            OtpVerification::NotFound => "No verification code found for this email",
        }
    }
}
