use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use gymbook::{
    config::OtpConfig,
    domain::{EmailOtp, OtpVerification},
    error::Result,
    mailer::Mailer,
    repository::{OtpRepository, SqliteOtpRepository},
    service::{OtpService, DEV_SENTINEL_CODE},
};

/// Captures outbound mail instead of sending it.
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        self.sent.lock().unwrap().push((
            to.to_string(),
            subject.to_string(),
            html_body.to_string(),
        ));
        Ok(())
    }
}

async fn setup() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

fn otp_service(pool: &SqlitePool, mailer: Arc<RecordingMailer>) -> OtpService {
    OtpService::new(
        Arc::new(SqliteOtpRepository::new(pool.clone())),
        mailer,
        &OtpConfig::default(),
    )
}

#[tokio::test]
async fn test_issue_supersedes_previous_code() -> anyhow::Result<()> {
    let pool = setup().await?;
    let mailer = Arc::new(RecordingMailer::default());
    let service = otp_service(&pool, mailer.clone());

    let first = service.issue("member@example.com").await?;
    let second = service.issue("member@example.com").await?;

    // The first code is no longer live.
    if first.code != second.code {
        let outcome = service.verify("member@example.com", &first.code).await?;
        assert_eq!(outcome, OtpVerification::InvalidCode);
    }

    // Exactly one row remains for the email.
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM email_otps WHERE email = ?",
    )
    .bind("member@example.com")
    .fetch_one(&pool)
    .await?;
    assert_eq!(count, 1);

    // The superseding code still verifies.
    let outcome = service.verify("member@example.com", &second.code).await?;
    assert_eq!(outcome, OtpVerification::Verified);

    // Both issues went out by email with the code in the body.
    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].2.contains(&second.code));

    Ok(())
}

#[tokio::test]
async fn test_verify_is_single_use() -> anyhow::Result<()> {
    let pool = setup().await?;
    let service = otp_service(&pool, Arc::new(RecordingMailer::default()));

    let record = service.issue("member@example.com").await?;

    let first = service.verify("member@example.com", &record.code).await?;
    assert_eq!(first, OtpVerification::Verified);

    // Replaying the same code finds no row.
    let replay = service.verify("member@example.com", &record.code).await?;
    assert_eq!(replay, OtpVerification::NotFound);

    Ok(())
}

#[tokio::test]
async fn test_expired_code_is_never_accepted() -> anyhow::Result<()> {
    let pool = setup().await?;
    let service = otp_service(&pool, Arc::new(RecordingMailer::default()));
    let repo = SqliteOtpRepository::new(pool.clone());

    // Plant a matching code that expired a minute ago.
    let now = Utc::now();
    repo.replace(&EmailOtp {
        email: "member@example.com".to_string(),
        code: "424242".to_string(),
        created_at: now - Duration::seconds(660),
        expires_at: now - Duration::seconds(60),
    })
    .await?;

    let outcome = service.verify("member@example.com", "424242").await?;
    assert_eq!(outcome, OtpVerification::Expired);

    // A wrong code against the same stale row reads as invalid, not expired.
    let outcome = service.verify("member@example.com", "000000").await?;
    assert_eq!(outcome, OtpVerification::InvalidCode);

    Ok(())
}

#[tokio::test]
async fn test_verify_unknown_email_is_not_found() -> anyhow::Result<()> {
    let pool = setup().await?;
    let service = otp_service(&pool, Arc::new(RecordingMailer::default()));

    let outcome = service.verify("nobody@example.com", "123456").await?;
    assert_eq!(outcome, OtpVerification::NotFound);

    Ok(())
}

#[tokio::test]
async fn test_remaining_seconds_floors_at_zero() -> anyhow::Result<()> {
    let pool = setup().await?;
    let service = otp_service(&pool, Arc::new(RecordingMailer::default()));
    let repo = SqliteOtpRepository::new(pool.clone());

    assert_eq!(service.remaining_seconds("nobody@example.com").await?, None);

    service.issue("member@example.com").await?;
    let first = service.remaining_seconds("member@example.com").await?.unwrap();
    assert!(first > 0 && first <= 600);

    // Non-increasing between calls with no intervening store.
    let second = service.remaining_seconds("member@example.com").await?.unwrap();
    assert!(second <= first);

    // An expired row clamps to zero rather than going negative.
    let now = Utc::now();
    repo.replace(&EmailOtp {
        email: "stale@example.com".to_string(),
        code: "111111".to_string(),
        created_at: now - Duration::seconds(700),
        expires_at: now - Duration::seconds(100),
    })
    .await?;
    assert_eq!(service.remaining_seconds("stale@example.com").await?, Some(0));

    Ok(())
}

#[tokio::test]
async fn test_dev_auto_verify_policy() -> anyhow::Result<()> {
    let pool = setup().await?;
    let service = OtpService::new(
        Arc::new(SqliteOtpRepository::new(pool.clone())),
        Arc::new(RecordingMailer::default()),
        &OtpConfig {
            dev_auto_verify: true,
            ..OtpConfig::default()
        },
    );

    assert_eq!(service.generate_code(), DEV_SENTINEL_CODE);

    // Any code is accepted, even with no stored row.
    let outcome = service.verify("member@example.com", "anything").await?;
    assert_eq!(outcome, OtpVerification::Verified);

    Ok(())
}

#[tokio::test]
async fn test_purge_expired_leaves_live_rows() -> anyhow::Result<()> {
    let pool = setup().await?;
    let service = otp_service(&pool, Arc::new(RecordingMailer::default()));
    let repo = SqliteOtpRepository::new(pool.clone());

    service.issue("live@example.com").await?;

    let now = Utc::now();
    repo.replace(&EmailOtp {
        email: "stale@example.com".to_string(),
        code: "999999".to_string(),
        created_at: now - Duration::seconds(700),
        expires_at: now - Duration::seconds(100),
    })
    .await?;

    let purged = service.purge_expired().await?;
    assert_eq!(purged, 1);

    assert!(repo.find_by_email("live@example.com").await?.is_some());
    assert!(repo.find_by_email("stale@example.com").await?.is_none());

    Ok(())
}
