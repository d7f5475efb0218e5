//! Payment DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::payment::Payment;

/// Payment details in API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentDto {
    pub id: i64,
    pub booking_id: i64,
    /// Booking, Cancellation fee, No show fee or Overstay fee
    pub payment_type: String,
    /// Pending, Paid or Expired
    pub status: String,
    #[schema(value_type = String, example = "200.00")]
    pub money_to_pay: Decimal,
    /// Checkout session reference, absent until a session is attached
    pub session_id: Option<String>,
    /// URL the guest pays at
    pub session_url: Option<String>,
    pub created_at: String,
}

impl From<Payment> for PaymentDto {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            booking_id: p.booking_id,
            payment_type: p.payment_type.as_str().to_string(),
            status: p.status.as_str().to_string(),
            money_to_pay: p.money_to_pay,
            session_id: p.session_id,
            session_url: p.session_url,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// Settlement webhook payload from the checkout provider
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutWebhookPayload {
    pub session_id: String,
}

/// Result of a processed settlement webhook
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookOutcomeDto {
    /// "settled" or "replayed"
    pub outcome: String,
}

/// Query parameters for the post-payment redirect pages
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SessionRedirectQuery {
    pub session_id: Option<String>,
}

/// Body of the post-payment redirect pages
#[derive(Debug, Serialize, ToSchema)]
pub struct RedirectMessageDto {
    pub message: String,
}
