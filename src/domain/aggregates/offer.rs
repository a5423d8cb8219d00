//! Offer (coupon) entity and eligibility checks

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::OfferCode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountType::Percentage => f.write_str("percentage"),
            DiscountType::Fixed => f.write_str("fixed"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("unrecognized discount type")]
pub struct ParseDiscountTypeError;

impl FromStr for DiscountType {
    type Err = ParseDiscountTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "percentage" => Ok(DiscountType::Percentage),
            "fixed" => Ok(DiscountType::Fixed),
            _ => Err(ParseDiscountTypeError),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Offer {
    pub id: Uuid,
    pub code: OfferCode,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_purchase_amount: Decimal,
    pub max_usage_global: Option<i64>,
    pub max_usage_per_user: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Usage counters read alongside an offer. Per-user count is zero for
/// anonymous carts.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct OfferUsage {
    pub global: i64,
    pub by_user: i64,
}

/// Why an offer cannot be applied. Serialized `code` drives the localized
/// message shown to the shopper.
#[derive(Clone, Debug, PartialEq, Error, Serialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferRejection {
    #[error("no active offer matches this code")]
    NotFound,
    #[error("this offer is not valid at this time")]
    Expired,
    #[error("subtotal {current} is below the required minimum of {required}")]
    MinAmount { required: Decimal, current: Decimal },
    #[error("this offer has reached its usage limit")]
    GlobalLimit,
    #[error("usage limit reached for this user ({used}/{limit})")]
    UserLimit { used: i64, limit: i64 },
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum OfferConfigError {
    #[error("percentage discounts must be between 0 and 100")]
    InvalidPercentage,
    #[error("discount value must be positive")]
    InvalidValue,
    #[error("start date must precede end date")]
    InvalidDates,
    #[error("minimum purchase amount cannot be negative")]
    InvalidMinimum,
}

pub struct NewOffer {
    pub code: OfferCode,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_purchase_amount: Decimal,
    pub max_usage_global: Option<i64>,
    pub max_usage_per_user: Option<i64>,
}

impl Offer {
    pub fn create(new: NewOffer, now: DateTime<Utc>) -> Result<Self, OfferConfigError> {
        if new.discount_value <= Decimal::ZERO {
            return Err(OfferConfigError::InvalidValue);
        }
        if new.discount_type == DiscountType::Percentage && new.discount_value > Decimal::ONE_HUNDRED {
            return Err(OfferConfigError::InvalidPercentage);
        }
        if let (Some(start), Some(end)) = (new.start_date, new.end_date) {
            if start > end {
                return Err(OfferConfigError::InvalidDates);
            }
        }
        if new.min_purchase_amount < Decimal::ZERO {
            return Err(OfferConfigError::InvalidMinimum);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            code: new.code,
            description: new.description,
            discount_type: new.discount_type,
            discount_value: new.discount_value,
            start_date: new.start_date,
            end_date: new.end_date,
            min_purchase_amount: new.min_purchase_amount,
            max_usage_global: new.max_usage_global,
            max_usage_per_user: new.max_usage_per_user,
            is_active: true,
            created_at: now,
        })
    }

    /// Eligibility checks in order, short-circuiting at the first failure.
    /// Usage counters are re-read at application time; this only judges the
    /// snapshot it is handed.
    pub fn check(&self, subtotal: Decimal, usage: OfferUsage, now: DateTime<Utc>) -> Result<(), OfferRejection> {
        if !self.is_active {
            return Err(OfferRejection::NotFound);
        }
        if self.end_date.is_some_and(|end| now > end) || self.start_date.is_some_and(|start| now < start) {
            return Err(OfferRejection::Expired);
        }
        if subtotal < self.min_purchase_amount {
            return Err(OfferRejection::MinAmount {
                required: self.min_purchase_amount,
                current: subtotal,
            });
        }
        if self.max_usage_global.is_some_and(|limit| usage.global >= limit) {
            return Err(OfferRejection::GlobalLimit);
        }
        if let Some(limit) = self.max_usage_per_user {
            if usage.by_user >= limit {
                return Err(OfferRejection::UserLimit {
                    used: usage.by_user,
                    limit,
                });
            }
        }
        Ok(())
    }

    /// Discount granted against `base` (the post-category-discount amount).
    /// Never exceeds the base, so the discounted portion cannot go negative.
    pub fn discount_amount(&self, base: Decimal) -> Decimal {
        let raw = match self.discount_type {
            DiscountType::Percentage => base * self.discount_value / Decimal::ONE_HUNDRED,
            DiscountType::Fixed => self.discount_value,
        };
        raw.min(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn offer(min_purchase: Decimal) -> Offer {
        Offer::create(
            NewOffer {
                code: OfferCode::new("VERANO25").unwrap(),
                description: None,
                discount_type: DiscountType::Percentage,
                discount_value: Decimal::new(25, 0),
                start_date: None,
                end_date: None,
                min_purchase_amount: min_purchase,
                max_usage_global: None,
                max_usage_per_user: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_min_amount_boundary() {
        let offer = offer(Decimal::new(50, 0));
        let now = Utc::now();
        let below = offer.check(Decimal::new(4999, 2), OfferUsage::default(), now);
        assert_eq!(
            below,
            Err(OfferRejection::MinAmount {
                required: Decimal::new(50, 0),
                current: Decimal::new(4999, 2),
            })
        );
        assert!(offer.check(Decimal::new(5000, 2), OfferUsage::default(), now).is_ok());
    }

    #[test]
    fn test_inactive_reads_as_not_found() {
        let mut offer = offer(Decimal::ZERO);
        offer.is_active = false;
        assert_eq!(
            offer.check(Decimal::new(100, 0), OfferUsage::default(), Utc::now()),
            Err(OfferRejection::NotFound)
        );
    }

    #[test]
    fn test_date_window() {
        let now = Utc::now();
        let mut offer = offer(Decimal::ZERO);
        offer.end_date = Some(now - Duration::days(1));
        assert_eq!(
            offer.check(Decimal::new(100, 0), OfferUsage::default(), now),
            Err(OfferRejection::Expired)
        );
        offer.end_date = None;
        offer.start_date = Some(now + Duration::days(1));
        assert_eq!(
            offer.check(Decimal::new(100, 0), OfferUsage::default(), now),
            Err(OfferRejection::Expired)
        );
    }

    #[test]
    fn test_usage_caps() {
        let now = Utc::now();
        let mut offer = offer(Decimal::ZERO);
        offer.max_usage_global = Some(10);
        offer.max_usage_per_user = Some(2);
        let ok = OfferUsage { global: 9, by_user: 1 };
        assert!(offer.check(Decimal::new(100, 0), ok, now).is_ok());
        let global_hit = OfferUsage { global: 10, by_user: 0 };
        assert_eq!(
            offer.check(Decimal::new(100, 0), global_hit, now),
            Err(OfferRejection::GlobalLimit)
        );
        let user_hit = OfferUsage { global: 3, by_user: 2 };
        assert_eq!(
            offer.check(Decimal::new(100, 0), user_hit, now),
            Err(OfferRejection::UserLimit { used: 2, limit: 2 })
        );
    }

    #[test]
    fn test_fixed_discount_capped_at_base() {
        let fixed = Offer::create(
            NewOffer {
                code: OfferCode::new("MENOS25").unwrap(),
                description: None,
                discount_type: DiscountType::Fixed,
                discount_value: Decimal::new(25, 0),
                start_date: None,
                end_date: None,
                min_purchase_amount: Decimal::ZERO,
                max_usage_global: None,
                max_usage_per_user: None,
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(fixed.discount_amount(Decimal::new(10, 0)), Decimal::new(10, 0));
        assert_eq!(fixed.discount_amount(Decimal::new(100, 0)), Decimal::new(25, 0));
    }

    #[test]
    fn test_create_rejects_bad_percentage() {
        let result = Offer::create(
            NewOffer {
                code: OfferCode::new("ROTO").unwrap(),
                description: None,
                discount_type: DiscountType::Percentage,
                discount_value: Decimal::new(150, 0),
                start_date: None,
                end_date: None,
                min_purchase_amount: Decimal::ZERO,
                max_usage_global: None,
                max_usage_per_user: None,
            },
            Utc::now(),
        );
        assert_eq!(result.unwrap_err(), OfferConfigError::InvalidPercentage);
    }
}
