//! Domain events, published to the notification bus after state changes
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Remittance(RemittanceEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RemittanceEvent {
    Created { remittance_id: Uuid, remittance_number: String, amount: Decimal, currency: String },
    ProofUploaded { remittance_id: Uuid, remittance_number: String, reference: String },
    PaymentValidated { remittance_id: Uuid, remittance_number: String, amount_to_deliver: Decimal, delivery_currency: String },
    PaymentRejected { remittance_id: Uuid, remittance_number: String, reason: String },
    ProcessingStarted { remittance_id: Uuid, remittance_number: String },
    Delivered { remittance_id: Uuid, remittance_number: String },
    Completed { remittance_id: Uuid, remittance_number: String },
    Cancelled { remittance_id: Uuid, remittance_number: String },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Submitted { order_id: Uuid, order_number: String, total: Decimal, currency: String },
    PaymentValidated { order_id: Uuid, order_number: String },
    PaymentRejected { order_id: Uuid, order_number: String },
}

impl DomainEvent {
    /// Bus subject the event is published under.
    pub fn subject(&self) -> String {
        match self {
            DomainEvent::Remittance(e) => format!("remesa.remittance.{}", e.name()),
            DomainEvent::Order(e) => format!("remesa.order.{}", e.name()),
        }
    }
}

impl RemittanceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RemittanceEvent::Created { .. } => "created",
            RemittanceEvent::ProofUploaded { .. } => "proof_uploaded",
            RemittanceEvent::PaymentValidated { .. } => "payment_validated",
            RemittanceEvent::PaymentRejected { .. } => "payment_rejected",
            RemittanceEvent::ProcessingStarted { .. } => "processing_started",
            RemittanceEvent::Delivered { .. } => "delivered",
            RemittanceEvent::Completed { .. } => "completed",
            RemittanceEvent::Cancelled { .. } => "cancelled",
        }
    }
}

impl OrderEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OrderEvent::Submitted { .. } => "submitted",
            OrderEvent::PaymentValidated { .. } => "payment_validated",
            OrderEvent::PaymentRejected { .. } => "payment_rejected",
        }
    }
}
