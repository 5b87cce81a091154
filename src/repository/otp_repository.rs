use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::{
    domain::EmailOtp,
    error::{AppError, Result},
    repository::OtpRepository,
};

#[derive(FromRow)]
struct OtpRow {
    email: String,
    code: String,
    created_at: NaiveDateTime,
    expires_at: NaiveDateTime,
}

pub struct SqliteOtpRepository {
    pool: SqlitePool,
}

impl SqliteOtpRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_otp(row: OtpRow) -> EmailOtp {
        EmailOtp {
            email: row.email,
            code: row.code,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            expires_at: DateTime::from_naive_utc_and_offset(row.expires_at, Utc),
        }
    }
}

#[async_trait]
impl OtpRepository for SqliteOtpRepository {
    async fn replace(&self, record: &EmailOtp) -> Result<()> {
        // Upsert keyed on email: a re-issued code supersedes the old one.
        sqlx::query(
            r#"
            INSERT INTO email_otps (email, code, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET
                code = excluded.code,
                created_at = excluded.created_at,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(&record.email)
        .bind(&record.code)
        .bind(record.created_at.naive_utc())
        .bind(record.expires_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<EmailOtp>> {
        let row = sqlx::query_as::<_, OtpRow>(
            "SELECT email, code, created_at, expires_at FROM email_otps WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.map(Self::row_to_otp))
    }

    async fn delete(&self, email: &str) -> Result<()> {
        sqlx::query("DELETE FROM email_otps WHERE email = ?")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query("DELETE FROM email_otps WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
