use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::{
    domain::{ActorContext, Payment, PaymentStatus, RelatedEntity},
    error::{AppError, Result},
    repository::{NewPayment, PaymentRepository},
};

#[derive(FromRow)]
struct PaymentRow {
    id: i64,
    user_id: i64,
    gym_id: i64,
    amount_cents: i64,
    base_amount_cents: i64,
    status: String,
    transaction_id: Option<String>,
    payment_method: Option<String>,
    notes: Option<String>,
    related_entity_type: Option<String>,
    related_entity_id: Option<i64>,
    created_at: NaiveDateTime,
    paid_at: Option<NaiveDateTime>,
}

const PAYMENT_COLUMNS: &str = "id, user_id, gym_id, amount_cents, base_amount_cents, status, \
     transaction_id, payment_method, notes, related_entity_type, related_entity_id, \
     created_at, paid_at";

pub struct SqlitePaymentRepository {
    pool: SqlitePool,
}

impl SqlitePaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_payment(row: PaymentRow) -> Result<Payment> {
        Ok(Payment {
            id: row.id,
            user_id: row.user_id,
            gym_id: row.gym_id,
            amount_cents: row.amount_cents,
            base_amount_cents: row.base_amount_cents,
            status: Self::parse_status(&row.status)?,
            transaction_id: row.transaction_id,
            payment_method: row.payment_method,
            notes: row.notes,
            related_entity_type: row
                .related_entity_type
                .as_deref()
                .map(Self::parse_related_entity)
                .transpose()?,
            related_entity_id: row.related_entity_id,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            paid_at: row.paid_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
        })
    }

    fn parse_status(s: &str) -> Result<PaymentStatus> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            "failed" => Ok(PaymentStatus::Failed),
            _ => Err(AppError::Database(format!("Invalid payment status: {}", s))),
        }
    }

    fn parse_related_entity(s: &str) -> Result<RelatedEntity> {
        match s {
            "plan" => Ok(RelatedEntity::Plan),
            "schedule" => Ok(RelatedEntity::Schedule),
            "product" => Ok(RelatedEntity::Product),
            "service" => Ok(RelatedEntity::Service),
            _ => Err(AppError::Database(format!("Invalid related entity type: {}", s))),
        }
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepository {
    async fn create(&self, payment: NewPayment) -> Result<i64> {
        let now = Utc::now().naive_utc();
        let related_type = payment.related_entity_type.map(|t| t.as_str());

        let result = sqlx::query(
            r#"
            INSERT INTO payments (
                user_id, gym_id, amount_cents, base_amount_cents, status,
                related_entity_type, related_entity_id, created_at
            ) VALUES (?, ?, ?, ?, 'pending', ?, ?, ?)
            "#,
        )
        .bind(payment.user_id)
        .bind(payment.gym_id)
        .bind(payment.amount_cents)
        .bind(payment.base_amount_cents)
        .bind(related_type)
        .bind(payment.related_entity_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE id = ?",
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_payment(r)?)),
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE user_id = ? ORDER BY created_at DESC",
            PAYMENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn complete_pending(
        &self,
        actor: &ActorContext,
        id: i64,
        transaction_id: &str,
        payment_method: Option<&str>,
    ) -> Result<Payment> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Re-read under the transaction: the ownership triple plus the
        // pending filter is the double-completion guard. Concurrent
        // completions serialize on the row lock; the loser sees no row.
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE id = ? AND user_id = ? AND gym_id = ? AND status = 'pending'",
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .bind(actor.user_id)
        .bind(actor.gym_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if row.is_none() {
            tx.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Err(AppError::Conflict(
                "Invalid payment or already processed".to_string(),
            ));
        }

        let now = Utc::now().naive_utc();
        sqlx::query(
            r#"
            UPDATE payments
            SET status = 'completed',
                transaction_id = ?,
                payment_method = ?,
                paid_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(transaction_id)
        .bind(payment_method)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve completed payment".to_string()))
    }

    async fn cancel_pending(&self, actor: &ActorContext, id: i64, reason: &str) -> Result<Payment> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'cancelled',
                notes = ?
            WHERE id = ? AND user_id = ? AND gym_id = ? AND status = 'pending'
            "#,
        )
        .bind(reason)
        .bind(id)
        .bind(actor.user_id)
        .bind(actor.gym_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Payment not found or not pending".to_string(),
            ));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve cancelled payment".to_string()))
    }
}
