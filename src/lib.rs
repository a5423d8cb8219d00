//! Remesa Commerce
//!
//! Self-hosted storefront and remittance backend.
//!
//! ## Features
//! - Remittance corridors: market rate, commission structure, amount limits
//! - Remittance lifecycle: proof upload, validation, processing, delivery
//! - Cart checkout with coupon codes and loyalty-tier discounts
//! - Delivery-deadline alerts for the admin dashboard

pub mod checkout;
pub mod config;
pub mod domain;
pub mod notify;
pub mod store;

use thiserror::Error;

use crate::domain::aggregates::remittance::RemittanceStatus;

// =============================================================================
// Error Types
// =============================================================================

/// Service-level error taxonomy.
///
/// Primary operations (order creation, state transitions) surface every
/// variant; secondary effects (offer-usage recording, notifications) are
/// logged and swallowed by their callers instead.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Input violates a business rule. Recoverable locally.
    #[error("{0}")]
    Validation(String),

    /// Another session transitioned the remittance first; the caller should
    /// refresh and retry deliberately, not blindly.
    #[error("remittance changed concurrently, expected status {expected}")]
    StaleState { expected: RemittanceStatus },

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Store/network failure. Retryable.
    #[error("external service failure")]
    External(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }
}

impl From<domain::aggregates::remittance::TransitionError> for ServiceError {
    fn from(e: domain::aggregates::remittance::TransitionError) -> Self {
        ServiceError::Validation(e.to_string())
    }
}

impl From<domain::aggregates::remittance::CreateRemittanceError> for ServiceError {
    fn from(e: domain::aggregates::remittance::CreateRemittanceError) -> Self {
        ServiceError::Validation(e.to_string())
    }
}

impl From<domain::aggregates::remittance_type::TypeConfigError> for ServiceError {
    fn from(e: domain::aggregates::remittance_type::TypeConfigError) -> Self {
        ServiceError::Validation(e.to_string())
    }
}

impl From<domain::aggregates::offer::OfferConfigError> for ServiceError {
    fn from(e: domain::aggregates::offer::OfferConfigError) -> Self {
        ServiceError::Validation(e.to_string())
    }
}

impl From<domain::aggregates::order::OrderError> for ServiceError {
    fn from(e: domain::aggregates::order::OrderError) -> Self {
        ServiceError::Validation(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
