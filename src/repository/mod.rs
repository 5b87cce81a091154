use async_trait::async_trait;

use crate::domain::*;
use crate::error::Result;

pub mod gym_repository;
pub mod otp_repository;
pub mod payment_repository;
pub mod user_repository;

pub use gym_repository::SqliteGymRepository;
pub use otp_repository::SqliteOtpRepository;
pub use payment_repository::SqlitePaymentRepository;
pub use user_repository::SqliteUserRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, email: &str, password_hash: &str, full_name: &str) -> Result<User>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn mark_email_verified(&self, email: &str) -> Result<()>;
}

#[async_trait]
pub trait GymRepository: Send + Sync {
    async fn create(&self, name: &str, status: GymStatus) -> Result<Gym>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Gym>>;
    async fn find_active(&self, id: i64) -> Result<Option<Gym>>;
}

#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Replaces any outstanding code for the email with the given record.
    async fn replace(&self, record: &EmailOtp) -> Result<()>;
    async fn find_by_email(&self, email: &str) -> Result<Option<EmailOtp>>;
    async fn delete(&self, email: &str) -> Result<()>;
    /// Removes expired rows; returns how many were deleted.
    async fn purge_expired(&self) -> Result<u64>;
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_id: i64,
    pub gym_id: i64,
    pub amount_cents: i64,
    pub base_amount_cents: i64,
    pub related_entity_type: Option<RelatedEntity>,
    pub related_entity_id: Option<i64>,
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Inserts a pending row and returns its id.
    async fn create(&self, payment: NewPayment) -> Result<i64>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Payment>>;
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Payment>>;
    /// Flips a pending row owned by the actor to completed, inside a single
    /// transaction. Fails with a conflict if the row is missing, not
    /// pending, or owned by someone else.
    async fn complete_pending(
        &self,
        actor: &ActorContext,
        id: i64,
        transaction_id: &str,
        payment_method: Option<&str>,
    ) -> Result<Payment>;
    /// Marks a pending row owned by the actor as cancelled, storing the
    /// reason in notes. Single conditional statement, no transaction.
    async fn cancel_pending(&self, actor: &ActorContext, id: i64, reason: &str) -> Result<Payment>;
}
