use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::catalog::models::{ContainerSize, price_to_cents, serialize_cents};
use crate::magic_link::utils::{normalize_email, valid_email};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseStatus {
    Pending,
    #[default]
    PaymentReceived,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl PurchaseStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::PaymentReceived => "PAYMENT_RECEIVED",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
        }
    }

    pub(crate) fn from_db(value: &str) -> Result<Self, sqlx::Error> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "PAYMENT_RECEIVED" => Ok(Self::PaymentReceived),
            "PROCESSING" => Ok(Self::Processing),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            "REFUNDED" => Ok(Self::Refunded),
            _ => Err(sqlx::Error::Decode(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid purchases.status value: {value}"),
            )))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: Uuid,
    pub container_id: Uuid,
    pub payment_id: String,
    #[serde(rename = "amount", serialize_with = "serialize_cents")]
    #[schema(value_type = f64)]
    pub amount_cents: i64,
    pub buyer_email: String,
    pub status: PurchaseStatus,
    pub customer_id: Option<String>,
    pub payment_method: Option<String>,
    pub shipping_address: Option<String>,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The slice of a container shown next to each sale.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseContainer {
    pub title: String,
    #[serde(rename = "price", serialize_with = "serialize_cents")]
    #[schema(value_type = f64)]
    pub price_cents: i64,
    pub size: ContainerSize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseWithContainer {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub container: PurchaseContainer,
}

/// Body posted by the checkout flow once the gateway confirms payment.
///
/// Every field is optional on the wire so missing ones map to a single `400`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseRequest {
    pub container_id: Option<String>,
    pub payment_reference: Option<String>,
    pub amount: Option<f64>,
    pub buyer_email: Option<String>,
    pub status: Option<PurchaseStatus>,
    pub customer_id: Option<String>,
    pub payment_method: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPurchase {
    pub container_id: Uuid,
    pub payment_id: String,
    pub amount_cents: i64,
    pub buyer_email: String,
    pub status: PurchaseStatus,
    pub customer_id: Option<String>,
    pub payment_method: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseInputError {
    MissingFields,
    Invalid(String),
}

impl PurchaseInputError {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::MissingFields => "Missing required fields",
            Self::Invalid(message) => message,
        }
    }
}

impl CreatePurchaseRequest {
    /// # Errors
    /// `MissingFields` when any required field is absent, blank or zero.
    pub fn validate(self) -> Result<NewPurchase, PurchaseInputError> {
        let container_id = present(self.container_id);
        let payment_id = present(self.payment_reference);
        let buyer_email = present(self.buyer_email);
        let amount = self.amount.filter(|amount| *amount != 0.0);

        let (Some(container_id), Some(payment_id), Some(amount), Some(buyer_email)) =
            (container_id, payment_id, amount, buyer_email)
        else {
            return Err(PurchaseInputError::MissingFields);
        };

        let container_id = Uuid::parse_str(&container_id)
            .map_err(|_| PurchaseInputError::Invalid("Invalid container id".to_string()))?;
        let amount_cents = price_to_cents(amount).map_err(PurchaseInputError::Invalid)?;

        let buyer_email = normalize_email(&buyer_email);
        if !valid_email(&buyer_email) {
            return Err(PurchaseInputError::Invalid("Invalid buyer email".to_string()));
        }

        Ok(NewPurchase {
            container_id,
            payment_id,
            amount_cents,
            buyer_email,
            status: self.status.unwrap_or_default(),
            customer_id: present(self.customer_id),
            payment_method: present(self.payment_method),
            estimated_delivery: self.estimated_delivery,
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
