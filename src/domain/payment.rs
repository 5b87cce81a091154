use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub gym_id: i64,
    pub amount_cents: i64,
    pub base_amount_cents: i64,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub related_entity_type: Option<RelatedEntity>,
    pub related_entity_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Transitions are one-directional: a payment leaves `Pending` exactly once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Cancelled,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

/// What a payment is for. Drives the related-entity tag on the row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Membership,
    Visit,
    Product,
    Service,
    Other,
}

impl PaymentType {
    /// Fixed mapping from payment type to the entity the payment references.
    pub fn related_entity(&self) -> Option<RelatedEntity> {
        match self {
            PaymentType::Membership => Some(RelatedEntity::Plan),
            PaymentType::Visit => Some(RelatedEntity::Schedule),
            PaymentType::Product => Some(RelatedEntity::Product),
            PaymentType::Service => Some(RelatedEntity::Service),
            PaymentType::Other => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RelatedEntity {
    Plan,
    Schedule,
    Product,
    Service,
}

impl RelatedEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelatedEntity::Plan => "plan",
            RelatedEntity::Schedule => "schedule",
            RelatedEntity::Product => "product",
            RelatedEntity::Service => "service",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InitializePaymentRequest {
    pub gym_id: i64,
    pub amount_cents: i64,
    pub base_amount_cents: i64,
    pub payment_type: PaymentType,
    pub related_id: Option<i64>,
}

/// Confirmation payload relayed from the payment gateway callback.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayResponse {
    /// Gateway-side payment identifier, stored as our transaction_id.
    pub payment_id: String,
    pub order_id: Option<String>,
    pub signature: Option<String>,
    pub payment_method: Option<String>,
}

impl GatewayResponse {
    /// Signature-bearing providers must pass HMAC verification before the
    /// payment row is touched.
    pub fn requires_signature_check(&self) -> bool {
        self.signature.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_type_maps_to_related_entity() {
        assert_eq!(PaymentType::Membership.related_entity(), Some(RelatedEntity::Plan));
        assert_eq!(PaymentType::Visit.related_entity(), Some(RelatedEntity::Schedule));
        assert_eq!(PaymentType::Product.related_entity(), Some(RelatedEntity::Product));
        assert_eq!(PaymentType::Service.related_entity(), Some(RelatedEntity::Service));
        assert_eq!(PaymentType::Other.related_entity(), None);
    }

    #[test]
    fn pending_is_the_only_non_terminal_status() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Completed.is_terminal());
        assert!(PaymentStatus::Cancelled.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
    }
}
