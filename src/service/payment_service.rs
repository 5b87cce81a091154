use std::sync::Arc;

use crate::{
    domain::{ActorContext, GatewayResponse, Payment, PaymentType},
    error::{AppError, Result},
    payments::SignatureVerifier,
    repository::{GymRepository, NewPayment, PaymentRepository},
};

pub struct PaymentService {
    payments: Arc<dyn PaymentRepository>,
    gyms: Arc<dyn GymRepository>,
    verifier: Option<SignatureVerifier>,
}

impl PaymentService {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        gyms: Arc<dyn GymRepository>,
        verifier: Option<SignatureVerifier>,
    ) -> Self {
        Self {
            payments,
            gyms,
            verifier,
        }
    }

    /// Creates a pending payment for the actor's gym and returns its id.
    /// The gym must exist and be active.
    pub async fn initialize(
        &self,
        actor: &ActorContext,
        amount_cents: i64,
        base_amount_cents: i64,
        payment_type: PaymentType,
        related_id: Option<i64>,
    ) -> Result<i64> {
        if amount_cents <= 0 {
            return Err(AppError::Validation("Amount must be positive".to_string()));
        }

        self.gyms
            .find_active(actor.gym_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Gym not found or inactive".to_string()))?;

        let related_entity_type = payment_type.related_entity();
        let related_entity_id = related_entity_type.and(related_id);

        let id = self
            .payments
            .create(NewPayment {
                user_id: actor.user_id,
                gym_id: actor.gym_id,
                amount_cents,
                base_amount_cents,
                related_entity_type,
                related_entity_id,
            })
            .await?;

        tracing::info!(
            "Initialized payment {} for user {} at gym {}",
            id,
            actor.user_id,
            actor.gym_id
        );

        Ok(id)
    }

    /// Completes a pending payment from a gateway confirmation. Signature-
    /// bearing responses are verified before the row is touched; the state
    /// flip itself happens inside a single transaction keyed on the
    /// ownership triple, so a payment completes at most once.
    pub async fn process(
        &self,
        actor: &ActorContext,
        payment_id: i64,
        response: GatewayResponse,
    ) -> Result<Payment> {
        if response.requires_signature_check() {
            let verifier = self
                .verifier
                .as_ref()
                .ok_or_else(|| AppError::Payment("Payment gateway not configured".to_string()))?;

            let order_id = response
                .order_id
                .as_deref()
                .ok_or_else(|| AppError::BadRequest("Missing order id".to_string()))?;
            let signature = response.signature.as_deref().unwrap_or_default();

            if !verifier.verify(order_id, &response.payment_id, signature) {
                tracing::warn!("Rejected payment {} confirmation: invalid signature", payment_id);
                return Err(AppError::Payment("Invalid signature".to_string()));
            }
        }

        let payment = self
            .payments
            .complete_pending(
                actor,
                payment_id,
                &response.payment_id,
                response.payment_method.as_deref(),
            )
            .await?;

        tracing::info!(
            "Payment {} completed with transaction {}",
            payment.id,
            response.payment_id
        );

        Ok(payment)
    }

    /// Cancels a pending payment, recording the reason in notes. Fails if
    /// the payment has already reached a terminal state.
    pub async fn cancel(&self, actor: &ActorContext, payment_id: i64, reason: &str) -> Result<Payment> {
        let payment = self.payments.cancel_pending(actor, payment_id, reason).await?;

        tracing::info!("Payment {} cancelled: {}", payment.id, reason);

        Ok(payment)
    }

    pub async fn find_for_user(&self, user_id: i64, payment_id: i64) -> Result<Option<Payment>> {
        let payment = self.payments.find_by_id(payment_id).await?;

        Ok(payment.filter(|p| p.user_id == user_id))
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Payment>> {
        self.payments.list_for_user(user_id).await
    }
}
