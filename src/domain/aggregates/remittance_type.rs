//! Remittance corridor configuration (admin-managed)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::rates::{derive_commission_percent_from_rates, simulate_remittance, RemittanceQuote};

/// How the recipient gets the money.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    Cash,
    Transfer,
    Card,
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMethod::Cash => f.write_str("cash"),
            DeliveryMethod::Transfer => f.write_str("transfer"),
            DeliveryMethod::Card => f.write_str("card"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("unrecognized delivery method")]
pub struct ParseDeliveryMethodError;

impl FromStr for DeliveryMethod {
    type Err = ParseDeliveryMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cash" => Ok(DeliveryMethod::Cash),
            "transfer" => Ok(DeliveryMethod::Transfer),
            "card" => Ok(DeliveryMethod::Card),
            _ => Err(ParseDeliveryMethodError),
        }
    }
}

/// A corridor: origin/delivery currency pair with its market rate, commission
/// structure, amount limits and delivery window.
#[derive(Clone, Debug, Serialize)]
pub struct RemittanceType {
    pub id: Uuid,
    pub name: String,
    pub currency_code: String,
    pub delivery_currency: String,
    pub exchange_rate: Decimal,
    pub commission_percentage: Decimal,
    pub commission_fixed: Decimal,
    pub min_amount: Decimal,
    /// `None` means unbounded.
    pub max_amount: Option<Decimal>,
    pub delivery_method: DeliveryMethod,
    pub max_delivery_days: i32,
    pub warning_days: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum TypeConfigError {
    #[error("exchange rate must be positive")]
    InvalidRate,
    #[error("commission percentage must be at least 0 and below 100")]
    InvalidCommissionPercentage,
    #[error("fixed commission cannot be negative")]
    InvalidCommissionFixed,
    #[error("delivery rate cannot exceed the market rate")]
    DeliveryRateAboveMarket,
    #[error("amount limits must satisfy 0 <= min <= max")]
    InvalidAmountLimits,
    #[error("delivery window must be positive, with warning days inside it")]
    InvalidDeliveryWindow,
}

/// Commission input for a corridor: either the explicit structure, or a
/// delivery rate the admin quotes ("1 USD delivers at 288") from which the
/// percentage is derived against the market rate.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionSpec {
    Explicit {
        percentage: Decimal,
        fixed: Decimal,
    },
    DeliveryRate {
        delivery_rate: Decimal,
        fixed: Decimal,
    },
}

pub struct NewRemittanceType {
    pub name: String,
    pub currency_code: String,
    pub delivery_currency: String,
    pub exchange_rate: Decimal,
    pub commission: CommissionSpec,
    pub min_amount: Decimal,
    pub max_amount: Option<Decimal>,
    pub delivery_method: DeliveryMethod,
    pub max_delivery_days: i32,
    pub warning_days: i32,
}

impl RemittanceType {
    pub fn create(new: NewRemittanceType, now: DateTime<Utc>) -> Result<Self, TypeConfigError> {
        let (commission_percentage, commission_fixed) =
            resolve_commission(new.exchange_rate, &new.commission)?;
        validate_limits(new.min_amount, new.max_amount)?;
        validate_window(new.max_delivery_days, new.warning_days)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: new.name,
            currency_code: new.currency_code,
            delivery_currency: new.delivery_currency,
            exchange_rate: new.exchange_rate,
            commission_percentage,
            commission_fixed,
            min_amount: new.min_amount,
            max_amount: new.max_amount,
            delivery_method: new.delivery_method,
            max_delivery_days: new.max_delivery_days,
            warning_days: new.warning_days,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Re-prices the corridor. Remittances already validated keep the rate
    /// frozen on them; pending ones will be quoted at the new rate.
    pub fn update_rates(
        &mut self,
        exchange_rate: Decimal,
        commission: CommissionSpec,
        now: DateTime<Utc>,
    ) -> Result<(), TypeConfigError> {
        let (percentage, fixed) = resolve_commission(exchange_rate, &commission)?;
        self.exchange_rate = exchange_rate;
        self.commission_percentage = percentage;
        self.commission_fixed = fixed;
        self.touch(now);
        Ok(())
    }

    pub fn update_limits(
        &mut self,
        min_amount: Decimal,
        max_amount: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> Result<(), TypeConfigError> {
        validate_limits(min_amount, max_amount)?;
        self.min_amount = min_amount;
        self.max_amount = max_amount;
        self.touch(now);
        Ok(())
    }

    pub fn update_window(
        &mut self,
        max_delivery_days: i32,
        warning_days: i32,
        now: DateTime<Utc>,
    ) -> Result<(), TypeConfigError> {
        validate_window(max_delivery_days, warning_days)?;
        self.max_delivery_days = max_delivery_days;
        self.warning_days = warning_days;
        self.touch(now);
        Ok(())
    }

    pub fn activate(&mut self, now: DateTime<Utc>) {
        self.is_active = true;
        self.touch(now);
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.touch(now);
    }

    /// Quotes an amount through this corridor at its current rate.
    pub fn quote(&self, amount: Decimal) -> RemittanceQuote {
        simulate_remittance(
            amount,
            self.exchange_rate,
            self.commission_percentage,
            self.commission_fixed,
        )
    }

    /// Effective rate the sender is offered after the percentage commission.
    pub fn delivery_rate(&self) -> Decimal {
        self.exchange_rate * (Decimal::ONE - self.commission_percentage / Decimal::ONE_HUNDRED)
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

fn resolve_commission(
    exchange_rate: Decimal,
    commission: &CommissionSpec,
) -> Result<(Decimal, Decimal), TypeConfigError> {
    if exchange_rate <= Decimal::ZERO {
        return Err(TypeConfigError::InvalidRate);
    }
    let (percentage, fixed) = match *commission {
        CommissionSpec::Explicit { percentage, fixed } => (percentage, fixed),
        CommissionSpec::DeliveryRate { delivery_rate, fixed } => {
            if delivery_rate > exchange_rate {
                return Err(TypeConfigError::DeliveryRateAboveMarket);
            }
            (derive_commission_percent_from_rates(exchange_rate, delivery_rate), fixed)
        }
    };
    if percentage < Decimal::ZERO || percentage >= Decimal::ONE_HUNDRED {
        return Err(TypeConfigError::InvalidCommissionPercentage);
    }
    if fixed < Decimal::ZERO {
        return Err(TypeConfigError::InvalidCommissionFixed);
    }
    Ok((percentage, fixed))
}

fn validate_limits(min: Decimal, max: Option<Decimal>) -> Result<(), TypeConfigError> {
    if min < Decimal::ZERO || max.is_some_and(|max| max < min) {
        return Err(TypeConfigError::InvalidAmountLimits);
    }
    Ok(())
}

fn validate_window(max_delivery_days: i32, warning_days: i32) -> Result<(), TypeConfigError> {
    if max_delivery_days <= 0 || warning_days < 0 || warning_days > max_delivery_days {
        return Err(TypeConfigError::InvalidDeliveryWindow);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_type(commission: CommissionSpec) -> NewRemittanceType {
        NewRemittanceType {
            name: "USD -> CUP cash".into(),
            currency_code: "USD".into(),
            delivery_currency: "CUP".into(),
            exchange_rate: Decimal::new(320, 0),
            commission,
            min_amount: Decimal::new(10, 0),
            max_amount: Some(Decimal::new(1000, 0)),
            delivery_method: DeliveryMethod::Cash,
            max_delivery_days: 3,
            warning_days: 1,
        }
    }

    #[test]
    fn test_create_with_explicit_commission() {
        let t = RemittanceType::create(
            new_type(CommissionSpec::Explicit {
                percentage: Decimal::new(5, 0),
                fixed: Decimal::new(2, 0),
            }),
            Utc::now(),
        )
        .unwrap();
        assert!(t.is_active);
        assert_eq!(t.quote(Decimal::new(100, 0)).total_commission, Decimal::new(7, 0));
    }

    #[test]
    fn test_commission_derived_from_delivery_rate() {
        let t = RemittanceType::create(
            new_type(CommissionSpec::DeliveryRate {
                delivery_rate: Decimal::new(288, 0),
                fixed: Decimal::ZERO,
            }),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(t.commission_percentage, Decimal::new(10, 0));
        assert_eq!(t.delivery_rate(), Decimal::new(288, 0));
    }

    #[test]
    fn test_delivery_rate_above_market_rejected() {
        let result = RemittanceType::create(
            new_type(CommissionSpec::DeliveryRate {
                delivery_rate: Decimal::new(330, 0),
                fixed: Decimal::ZERO,
            }),
            Utc::now(),
        );
        assert_eq!(result.unwrap_err(), TypeConfigError::DeliveryRateAboveMarket);
    }

    #[test]
    fn test_commission_percentage_must_stay_below_100() {
        let result = RemittanceType::create(
            new_type(CommissionSpec::Explicit {
                percentage: Decimal::new(100, 0),
                fixed: Decimal::ZERO,
            }),
            Utc::now(),
        );
        assert_eq!(result.unwrap_err(), TypeConfigError::InvalidCommissionPercentage);
    }

    #[test]
    fn test_amount_limits_checked() {
        let mut bad = new_type(CommissionSpec::Explicit {
            percentage: Decimal::ZERO,
            fixed: Decimal::ZERO,
        });
        bad.min_amount = Decimal::new(500, 0);
        bad.max_amount = Some(Decimal::new(100, 0));
        assert_eq!(
            RemittanceType::create(bad, Utc::now()).unwrap_err(),
            TypeConfigError::InvalidAmountLimits
        );
    }

    #[test]
    fn test_warning_days_must_fit_window() {
        let mut bad = new_type(CommissionSpec::Explicit {
            percentage: Decimal::ZERO,
            fixed: Decimal::ZERO,
        });
        bad.warning_days = 5;
        assert_eq!(
            RemittanceType::create(bad, Utc::now()).unwrap_err(),
            TypeConfigError::InvalidDeliveryWindow
        );
    }
}
