//! Delivery deadline alerts for the admin dashboard.
//!
//! Advisory only: an alert never transitions state, escalation is a human
//! decision. Computed from the current time on every call and never stored.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::aggregates::remittance::{Remittance, RemittanceStatus};
use crate::domain::aggregates::remittance_type::RemittanceType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeliveryAlert {
    pub level: AlertLevel,
    pub message: String,
}

/// Urgency of a remittance against its corridor's delivery window.
///
/// The clock starts when payment was validated and keeps running through
/// `Processing`. Delivered and completed remittances report `Success`;
/// statuses before validation (and cancellations) carry no alert.
pub fn calculate_delivery_alert(
    remittance: &Remittance,
    rtype: &RemittanceType,
    now: DateTime<Utc>,
) -> Option<DeliveryAlert> {
    match remittance.status {
        RemittanceStatus::PaymentValidated | RemittanceStatus::Processing => {}
        RemittanceStatus::Delivered | RemittanceStatus::Completed => {
            return Some(DeliveryAlert {
                level: AlertLevel::Success,
                message: "Delivered".to_string(),
            });
        }
        RemittanceStatus::PaymentPending
        | RemittanceStatus::PaymentProofUploaded
        | RemittanceStatus::PaymentRejected
        | RemittanceStatus::Cancelled => return None,
    }

    let clock_start = remittance.validated_at.unwrap_or(remittance.created_at);
    let days_elapsed = (now - clock_start).num_seconds() as f64 / 86_400.0;
    let days_remaining = rtype.max_delivery_days as f64 - days_elapsed;

    let alert = if days_remaining <= 0.0 {
        DeliveryAlert {
            level: AlertLevel::Error,
            message: format!("Delivery overdue by {} day(s)", (-days_remaining).ceil() as i64),
        }
    } else if days_remaining <= rtype.warning_days as f64 {
        DeliveryAlert {
            level: AlertLevel::Warning,
            message: format!(
                "{} day(s) remaining, delivery deadline approaching",
                days_remaining.ceil() as i64
            ),
        }
    } else {
        DeliveryAlert {
            level: AlertLevel::Info,
            message: format!("{} day(s) remaining", days_remaining.ceil() as i64),
        }
    };
    Some(alert)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::remittance::{NewRemittance, Recipient, Transition};
    use crate::domain::aggregates::remittance_type::{CommissionSpec, DeliveryMethod, NewRemittanceType};
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn corridor() -> RemittanceType {
        RemittanceType::create(
            NewRemittanceType {
                name: "USD -> CUP".into(),
                currency_code: "USD".into(),
                delivery_currency: "CUP".into(),
                exchange_rate: Decimal::new(320, 0),
                commission: CommissionSpec::Explicit {
                    percentage: Decimal::new(5, 0),
                    fixed: Decimal::ZERO,
                },
                min_amount: Decimal::ZERO,
                max_amount: None,
                delivery_method: DeliveryMethod::Cash,
                max_delivery_days: 3,
                warning_days: 1,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn validated(rtype: &RemittanceType, validated_at: DateTime<Utc>) -> Remittance {
        let mut r = Remittance::create(
            "REM-00000042".into(),
            NewRemittance {
                user_id: None,
                amount: Decimal::new(100, 0),
                recipient: Recipient::default(),
                delivery_method: None,
                notes: None,
            },
            rtype,
            validated_at - Duration::hours(2),
        )
        .unwrap();
        r.apply(
            Transition::UploadProof {
                proof_url: "https://proofs/42.jpg".into(),
                reference: "Z-42".into(),
                notes: None,
            },
            validated_at - Duration::hours(1),
        )
        .unwrap();
        r.apply(
            Transition::ValidatePayment { quote: rtype.quote(r.amount), notes: None },
            validated_at,
        )
        .unwrap();
        r
    }

    #[test]
    fn test_overdue_at_exact_deadline() {
        let rtype = corridor();
        let now = Utc::now();
        let r = validated(&rtype, now - Duration::days(3));
        let alert = calculate_delivery_alert(&r, &rtype, now).unwrap();
        assert_eq!(alert.level, AlertLevel::Error);
    }

    #[test]
    fn test_warning_at_exact_warning_boundary() {
        let rtype = corridor();
        let now = Utc::now();
        // validated (max_delivery_days - warning_days) ago: exactly warning_days left
        let r = validated(&rtype, now - Duration::days(2));
        let alert = calculate_delivery_alert(&r, &rtype, now).unwrap();
        assert_eq!(alert.level, AlertLevel::Warning);
    }

    #[test]
    fn test_info_inside_normal_window() {
        let rtype = corridor();
        let now = Utc::now();
        let r = validated(&rtype, now - Duration::hours(6));
        let alert = calculate_delivery_alert(&r, &rtype, now).unwrap();
        assert_eq!(alert.level, AlertLevel::Info);
    }

    #[test]
    fn test_clock_keeps_running_through_processing() {
        let rtype = corridor();
        let now = Utc::now();
        let mut r = validated(&rtype, now - Duration::days(4));
        r.apply(Transition::StartProcessing { notes: None }, now - Duration::days(1))
            .unwrap();
        let alert = calculate_delivery_alert(&r, &rtype, now).unwrap();
        assert_eq!(alert.level, AlertLevel::Error);
    }

    #[test]
    fn test_delivered_reports_success() {
        let rtype = corridor();
        let now = Utc::now();
        let mut r = validated(&rtype, now - Duration::days(1));
        r.apply(Transition::StartProcessing { notes: None }, now).unwrap();
        r.apply(Transition::ConfirmDelivery { notes: None }, now).unwrap();
        let alert = calculate_delivery_alert(&r, &rtype, now).unwrap();
        assert_eq!(alert.level, AlertLevel::Success);
    }

    #[test]
    fn test_no_alert_before_validation() {
        let rtype = corridor();
        let now = Utc::now();
        let r = Remittance::create(
            "REM-00000043".into(),
            NewRemittance {
                user_id: None,
                amount: Decimal::new(100, 0),
                recipient: Recipient::default(),
                delivery_method: None,
                notes: None,
            },
            &rtype,
            now - Duration::days(10),
        )
        .unwrap();
        assert!(calculate_delivery_alert(&r, &rtype, now).is_none());
    }
}
