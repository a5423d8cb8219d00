//! Corridor rate and commission math.
//!
//! A corridor converts an amount in the origin currency into the delivery
//! currency after subtracting a percentage commission plus a fixed fee, both
//! denominated in the origin currency.

use rust_decimal::Decimal;
use serde::Serialize;

/// Full breakdown of a transfer simulation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RemittanceQuote {
    pub amount: Decimal,
    pub commission_pct_amount: Decimal,
    pub commission_fixed_amount: Decimal,
    pub total_commission: Decimal,
    pub net_amount: Decimal,
    pub exchange_rate: Decimal,
    pub amount_to_deliver: Decimal,
    /// Post-commission rate actually obtained by the sender. Zero when the
    /// amount is zero.
    pub effective_rate: Decimal,
}

/// Forward simulation: amount sent -> amount delivered.
///
/// `net_amount` goes negative when the commission exceeds the amount; callers
/// must treat that as invalid input rather than a deliverable quote.
pub fn simulate_remittance(
    amount: Decimal,
    exchange_rate: Decimal,
    commission_percentage: Decimal,
    commission_fixed: Decimal,
) -> RemittanceQuote {
    let commission_pct_amount = amount * commission_percentage / Decimal::ONE_HUNDRED;
    let total_commission = commission_pct_amount + commission_fixed;
    let net_amount = amount - total_commission;
    let amount_to_deliver = net_amount * exchange_rate;
    let effective_rate = if amount.is_zero() {
        Decimal::ZERO
    } else {
        amount_to_deliver / amount
    };
    RemittanceQuote {
        amount,
        commission_pct_amount,
        commission_fixed_amount: commission_fixed,
        total_commission,
        net_amount,
        exchange_rate,
        amount_to_deliver,
        effective_rate,
    }
}

/// Reverse simulation: solves for the amount to send so that the recipient
/// receives `desired_delivery_amount`.
///
/// Returns `None` when the commission consumes the entire amount
/// (percentage at or above 100%) or the rate is not positive.
pub fn simulate_reverse_remittance(
    desired_delivery_amount: Decimal,
    exchange_rate: Decimal,
    commission_percentage: Decimal,
    commission_fixed: Decimal,
) -> Option<RemittanceQuote> {
    let denominator = Decimal::ONE - commission_percentage / Decimal::ONE_HUNDRED;
    if denominator <= Decimal::ZERO || exchange_rate <= Decimal::ZERO {
        return None;
    }
    let amount_to_send = (desired_delivery_amount / exchange_rate + commission_fixed) / denominator;
    // Re-run the forward math so every derived field stays consistent with it.
    Some(simulate_remittance(
        amount_to_send,
        exchange_rate,
        commission_percentage,
        commission_fixed,
    ))
}

/// Derives the implied commission percentage from a market rate and the
/// (lower) rate offered for delivery. Admin configuration convenience.
pub fn derive_commission_percent_from_rates(market_rate: Decimal, delivery_rate: Decimal) -> Decimal {
    if market_rate <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if delivery_rate <= Decimal::ZERO {
        return Decimal::ONE_HUNDRED;
    }
    if delivery_rate >= market_rate {
        return Decimal::ZERO;
    }
    (Decimal::ONE - delivery_rate / market_rate) * Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(mantissa: i64, scale: u32) -> Decimal {
        Decimal::new(mantissa, scale)
    }

    #[test]
    fn test_forward_breakdown() {
        // 100 sent at rate 320, 5% + 2 fixed commission
        let q = simulate_remittance(dec(100, 0), dec(320, 0), dec(5, 0), dec(2, 0));
        assert_eq!(q.commission_pct_amount, dec(5, 0));
        assert_eq!(q.total_commission, dec(7, 0));
        assert_eq!(q.net_amount, dec(93, 0));
        assert_eq!(q.amount_to_deliver, dec(29760, 0));
        assert_eq!(q.effective_rate, dec(2976, 1));
    }

    #[test]
    fn test_forward_zero_amount_has_zero_effective_rate() {
        let q = simulate_remittance(Decimal::ZERO, dec(320, 0), dec(5, 0), Decimal::ZERO);
        assert_eq!(q.effective_rate, Decimal::ZERO);
        assert_eq!(q.amount_to_deliver, Decimal::ZERO);
    }

    #[test]
    fn test_forward_commission_can_exceed_amount() {
        let q = simulate_remittance(dec(1, 0), dec(320, 0), dec(5, 0), dec(2, 0));
        assert!(q.net_amount < Decimal::ZERO);
    }

    #[test]
    fn test_reverse_inverts_forward() {
        let cases = [
            (dec(100, 0), dec(320, 0), dec(5, 0), dec(2, 0)),
            (dec(2550, 1), dec(1175, 2), dec(85, 1), Decimal::ZERO),
            (dec(1, 0), dec(1, 0), Decimal::ZERO, Decimal::ZERO),
            (dec(99999, 2), dec(36, 0), dec(12, 0), dec(150, 2)),
        ];
        let tolerance = Decimal::new(1, 9);
        for (amount, rate, pct, fixed) in cases {
            let forward = simulate_remittance(amount, rate, pct, fixed);
            let reverse =
                simulate_reverse_remittance(forward.amount_to_deliver, rate, pct, fixed).unwrap();
            assert!(
                (reverse.amount - amount).abs() < tolerance,
                "expected {} got {}",
                amount,
                reverse.amount
            );
        }
    }

    #[test]
    fn test_reverse_impossible_commission() {
        assert!(simulate_reverse_remittance(dec(100, 0), dec(320, 0), dec(100, 0), Decimal::ZERO)
            .is_none());
        assert!(simulate_reverse_remittance(dec(100, 0), dec(320, 0), dec(150, 0), Decimal::ZERO)
            .is_none());
    }

    #[test]
    fn test_commission_monotonicity() {
        let amount = dec(200, 0);
        let rate = dec(118, 0);
        let mut last = simulate_remittance(amount, rate, Decimal::ZERO, Decimal::ZERO).amount_to_deliver;
        for pct in [1i64, 5, 10, 25, 50, 99] {
            let delivered = simulate_remittance(amount, rate, dec(pct, 0), Decimal::ZERO).amount_to_deliver;
            assert!(delivered <= last, "increasing pct must not increase delivery");
            last = delivered;
        }
        let mut last = simulate_remittance(amount, rate, dec(5, 0), Decimal::ZERO).amount_to_deliver;
        for fixed in [1i64, 2, 10, 50] {
            let delivered = simulate_remittance(amount, rate, dec(5, 0), dec(fixed, 0)).amount_to_deliver;
            assert!(delivered <= last, "increasing fixed fee must not increase delivery");
            last = delivered;
        }
    }

    #[test]
    fn test_derive_commission_percent() {
        assert_eq!(derive_commission_percent_from_rates(dec(320, 0), dec(288, 0)), dec(10, 0));
        // degenerate inputs
        assert_eq!(derive_commission_percent_from_rates(Decimal::ZERO, dec(288, 0)), Decimal::ZERO);
        assert_eq!(
            derive_commission_percent_from_rates(dec(320, 0), Decimal::ZERO),
            Decimal::ONE_HUNDRED
        );
        // delivery at or above market means no commission
        assert_eq!(derive_commission_percent_from_rates(dec(320, 0), dec(320, 0)), Decimal::ZERO);
        assert_eq!(derive_commission_percent_from_rates(dec(320, 0), dec(330, 0)), Decimal::ZERO);
    }
}
