pub mod otp_service;
pub mod payment_service;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::AuthService;
use crate::config::Settings;
use crate::mailer::Mailer;
use crate::payments::SignatureVerifier;
use crate::repository::*;

pub use otp_service::{OtpPolicy, OtpService, DEV_SENTINEL_CODE};
pub use payment_service::PaymentService;

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub gym_repo: Arc<dyn GymRepository>,
    pub otp_service: Arc<OtpService>,
    pub payment_service: Arc<PaymentService>,
    pub auth_service: Arc<AuthService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(pool: SqlitePool, settings: &Settings, mailer: Arc<dyn Mailer>) -> Self {
        let user_repo: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(pool.clone()));
        let gym_repo: Arc<dyn GymRepository> = Arc::new(SqliteGymRepository::new(pool.clone()));
        let otp_repo: Arc<dyn OtpRepository> = Arc::new(SqliteOtpRepository::new(pool.clone()));
        let payment_repo: Arc<dyn PaymentRepository> =
            Arc::new(SqlitePaymentRepository::new(pool.clone()));

        let otp_service = Arc::new(OtpService::new(otp_repo, mailer, &settings.otp));

        let verifier = settings
            .gateway
            .secret
            .clone()
            .map(SignatureVerifier::new);
        let payment_service = Arc::new(PaymentService::new(
            payment_repo,
            gym_repo.clone(),
            verifier,
        ));

        let auth_service = Arc::new(AuthService::new(pool.clone()));

        Self {
            user_repo,
            gym_repo,
            otp_service,
            payment_service,
            auth_service,
            db_pool: pool,
        }
    }
}
