//! Remittance aggregate and its status state machine.
//!
//! A remittance is created against a corridor in `PaymentPending` and from
//! then on only moves through [`Remittance::apply`]. The aggregate re-checks
//! legality against its own status on every call; callers must not assume the
//! status they last read is still current (another admin session may have
//! acted first), which is why persistence additionally applies transitions as
//! a conditional update on the expected prior status.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::remittance_type::{DeliveryMethod, RemittanceType};
use crate::domain::events::{DomainEvent, RemittanceEvent};
use crate::domain::rates::RemittanceQuote;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemittanceStatus {
    PaymentPending,
    PaymentProofUploaded,
    PaymentValidated,
    PaymentRejected,
    Processing,
    Delivered,
    Completed,
    Cancelled,
}

impl RemittanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RemittanceStatus::PaymentPending => "payment_pending",
            RemittanceStatus::PaymentProofUploaded => "payment_proof_uploaded",
            RemittanceStatus::PaymentValidated => "payment_validated",
            RemittanceStatus::PaymentRejected => "payment_rejected",
            RemittanceStatus::Processing => "processing",
            RemittanceStatus::Delivered => "delivered",
            RemittanceStatus::Completed => "completed",
            RemittanceStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RemittanceStatus::Completed | RemittanceStatus::Cancelled)
    }
}

impl fmt::Display for RemittanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("unrecognized remittance status")]
pub struct ParseRemittanceStatusError;

impl FromStr for RemittanceStatus {
    type Err = ParseRemittanceStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "payment_pending" => Ok(RemittanceStatus::PaymentPending),
            "payment_proof_uploaded" => Ok(RemittanceStatus::PaymentProofUploaded),
            "payment_validated" => Ok(RemittanceStatus::PaymentValidated),
            "payment_rejected" => Ok(RemittanceStatus::PaymentRejected),
            "processing" => Ok(RemittanceStatus::Processing),
            "delivered" => Ok(RemittanceStatus::Delivered),
            "completed" => Ok(RemittanceStatus::Completed),
            "cancelled" => Ok(RemittanceStatus::Cancelled),
            _ => Err(ParseRemittanceStatusError),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub phone: String,
    pub city: Option<String>,
    pub province: Option<String>,
    pub municipality: Option<String>,
    pub address: Option<String>,
    pub id_number: Option<String>,
    pub bank_account: Option<String>,
    pub bank_name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Remittance {
    pub id: Uuid,
    pub remittance_number: String,
    pub user_id: Option<Uuid>,
    pub remittance_type_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    /// Derived, never independently mutated: frozen by the validation
    /// transition at the rate in effect at that moment.
    pub amount_to_deliver: Option<Decimal>,
    pub delivery_currency: String,
    pub commission_total: Option<Decimal>,
    /// Exchange rate the validation quote used, kept for audit once the
    /// corridor is re-priced.
    pub rate_applied: Option<Decimal>,
    pub recipient: Recipient,
    pub delivery_method: DeliveryMethod,
    pub status: RemittanceStatus,
    pub payment_proof_url: Option<String>,
    pub payment_reference: Option<String>,
    pub payment_rejection_reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub validated_at: Option<DateTime<Utc>>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub events: Vec<DomainEvent>,
}

pub struct NewRemittance {
    pub user_id: Option<Uuid>,
    pub amount: Decimal,
    pub recipient: Recipient,
    /// Defaults to the corridor's configured method.
    pub delivery_method: Option<DeliveryMethod>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum CreateRemittanceError {
    #[error("this remittance type is not active")]
    TypeInactive,
    #[error("amount is below the corridor minimum of {min}")]
    BelowMinimum { min: Decimal },
    #[error("amount exceeds the corridor maximum of {max}")]
    AboveMaximum { max: Decimal },
    #[error("commission consumes the entire amount")]
    CommissionExceedsAmount,
}

/// Requested state change, user- or admin-initiated.
#[derive(Clone, Debug)]
pub enum Transition {
    /// User attaches the Zelle proof. Also the re-submission path after a
    /// rejection.
    UploadProof {
        proof_url: String,
        reference: String,
        notes: Option<String>,
    },
    /// Admin accepts the proof; freezes the delivery quote and starts the
    /// delivery clock.
    ValidatePayment {
        quote: RemittanceQuote,
        notes: Option<String>,
    },
    /// Admin refuses the proof. The reason is mandatory.
    RejectPayment { reason: String },
    StartProcessing { notes: Option<String> },
    ConfirmDelivery { notes: Option<String> },
    Complete { notes: Option<String> },
    /// User-initiated, only before an admin has taken over.
    Cancel { reason: Option<String> },
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::UploadProof { .. } => "upload proof for",
            Transition::ValidatePayment { .. } => "validate",
            Transition::RejectPayment { .. } => "reject",
            Transition::StartProcessing { .. } => "start processing",
            Transition::ConfirmDelivery { .. } => "confirm delivery of",
            Transition::Complete { .. } => "complete",
            Transition::Cancel { .. } => "cancel",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum TransitionError {
    #[error("cannot {event} a remittance in status {from}")]
    Illegal {
        from: RemittanceStatus,
        event: &'static str,
    },
    #[error("a rejection reason is required")]
    MissingRejectionReason,
    #[error("commission consumes the entire amount")]
    CommissionExceedsAmount,
}

impl Remittance {
    pub fn create(
        remittance_number: String,
        new: NewRemittance,
        rtype: &RemittanceType,
        now: DateTime<Utc>,
    ) -> Result<Self, CreateRemittanceError> {
        if !rtype.is_active {
            return Err(CreateRemittanceError::TypeInactive);
        }
        if new.amount < rtype.min_amount {
            return Err(CreateRemittanceError::BelowMinimum { min: rtype.min_amount });
        }
        if let Some(max) = rtype.max_amount {
            if new.amount > max {
                return Err(CreateRemittanceError::AboveMaximum { max });
            }
        }
        if rtype.quote(new.amount).net_amount <= Decimal::ZERO {
            return Err(CreateRemittanceError::CommissionExceedsAmount);
        }
        let id = Uuid::new_v4();
        let mut remittance = Self {
            id,
            remittance_number: remittance_number.clone(),
            user_id: new.user_id,
            remittance_type_id: rtype.id,
            amount: new.amount,
            currency: rtype.currency_code.clone(),
            amount_to_deliver: None,
            delivery_currency: rtype.delivery_currency.clone(),
            commission_total: None,
            rate_applied: None,
            recipient: new.recipient,
            delivery_method: new.delivery_method.unwrap_or(rtype.delivery_method),
            status: RemittanceStatus::PaymentPending,
            payment_proof_url: None,
            payment_reference: None,
            payment_rejection_reason: None,
            notes: new.notes,
            created_at: now,
            updated_at: now,
            validated_at: None,
            processing_started_at: None,
            delivered_at: None,
            events: vec![],
        };
        remittance.raise(RemittanceEvent::Created {
            remittance_id: id,
            remittance_number,
            amount: remittance.amount,
            currency: remittance.currency.clone(),
        });
        Ok(remittance)
    }

    /// Applies a transition after re-checking it is legal from the current
    /// status. On success the relevant side effects (timestamps, notes,
    /// rejection reason, frozen quote) are recorded and an event is raised.
    pub fn apply(&mut self, transition: Transition, now: DateTime<Utc>) -> Result<(), TransitionError> {
        use RemittanceStatus as S;
        match (self.status, transition) {
            (
                S::PaymentPending | S::PaymentRejected,
                Transition::UploadProof {
                    proof_url,
                    reference,
                    notes,
                },
            ) => {
                self.payment_proof_url = Some(proof_url);
                self.payment_reference = Some(reference.clone());
                self.payment_rejection_reason = None;
                if notes.is_some() {
                    self.notes = notes;
                }
                self.status = S::PaymentProofUploaded;
                self.raise(RemittanceEvent::ProofUploaded {
                    remittance_id: self.id,
                    remittance_number: self.remittance_number.clone(),
                    reference,
                });
            }
            (S::PaymentProofUploaded, Transition::ValidatePayment { quote, notes }) => {
                if quote.net_amount <= Decimal::ZERO {
                    return Err(TransitionError::CommissionExceedsAmount);
                }
                self.amount_to_deliver = Some(quote.amount_to_deliver);
                self.commission_total = Some(quote.total_commission);
                self.rate_applied = Some(quote.exchange_rate);
                self.validated_at = Some(now);
                if notes.is_some() {
                    self.notes = notes;
                }
                self.status = S::PaymentValidated;
                self.raise(RemittanceEvent::PaymentValidated {
                    remittance_id: self.id,
                    remittance_number: self.remittance_number.clone(),
                    amount_to_deliver: quote.amount_to_deliver,
                    delivery_currency: self.delivery_currency.clone(),
                });
            }
            (S::PaymentProofUploaded, Transition::RejectPayment { reason }) => {
                let reason = reason.trim();
                if reason.is_empty() {
                    return Err(TransitionError::MissingRejectionReason);
                }
                self.payment_rejection_reason = Some(reason.to_string());
                self.status = S::PaymentRejected;
                self.raise(RemittanceEvent::PaymentRejected {
                    remittance_id: self.id,
                    remittance_number: self.remittance_number.clone(),
                    reason: reason.to_string(),
                });
            }
            (S::PaymentValidated, Transition::StartProcessing { notes }) => {
                self.processing_started_at = Some(now);
                if notes.is_some() {
                    self.notes = notes;
                }
                self.status = S::Processing;
                self.raise(RemittanceEvent::ProcessingStarted {
                    remittance_id: self.id,
                    remittance_number: self.remittance_number.clone(),
                });
            }
            (S::Processing, Transition::ConfirmDelivery { notes }) => {
                self.delivered_at = Some(now);
                if notes.is_some() {
                    self.notes = notes;
                }
                self.status = S::Delivered;
                self.raise(RemittanceEvent::Delivered {
                    remittance_id: self.id,
                    remittance_number: self.remittance_number.clone(),
                });
            }
            (S::Delivered, Transition::Complete { notes }) => {
                if notes.is_some() {
                    self.notes = notes;
                }
                self.status = S::Completed;
                self.raise(RemittanceEvent::Completed {
                    remittance_id: self.id,
                    remittance_number: self.remittance_number.clone(),
                });
            }
            (S::PaymentPending | S::PaymentRejected, Transition::Cancel { reason }) => {
                if reason.is_some() {
                    self.notes = reason;
                }
                self.status = S::Cancelled;
                self.raise(RemittanceEvent::Cancelled {
                    remittance_id: self.id,
                    remittance_number: self.remittance_number.clone(),
                });
            }
            (from, transition) => {
                return Err(TransitionError::Illegal {
                    from,
                    event: transition.name(),
                })
            }
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn raise(&mut self, event: RemittanceEvent) {
        self.events.push(DomainEvent::Remittance(event));
    }
}
