//! Purchases recorded after the payment gateway confirms a checkout.

pub mod models;
pub mod repo;

pub use models::{
    CreatePurchaseRequest, NewPurchase, Purchase, PurchaseContainer, PurchaseInputError,
    PurchaseStatus, PurchaseWithContainer,
};
pub use repo::CreateOutcome;
