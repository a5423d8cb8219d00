//! Checkout pricing: loyalty-tier and coupon discounts stacked over a cart
//! subtotal, plus shipping.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::CategoryDiscounts;
use crate::domain::aggregates::offer::Offer;

/// Loyalty tier of the purchasing user. Resolved outside this crate; only the
/// configured percentage is consumed here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserCategory {
    #[default]
    Regular,
    Pro,
    Vip,
}

impl UserCategory {
    pub fn discount_percentage(self, discounts: CategoryDiscounts) -> Decimal {
        match self {
            UserCategory::Regular => Decimal::ZERO,
            UserCategory::Pro => discounts.pro,
            UserCategory::Vip => discounts.vip,
        }
    }
}

/// Every intermediate of the pricing pipeline, frozen onto the order at
/// creation time and echoed back for the checkout summary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub category_discount_amount: Decimal,
    pub after_category_discount: Decimal,
    pub offer_discount_amount: Decimal,
    pub after_all_discounts: Decimal,
    pub total_discount: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
}

/// One row of the checkout summary. `percent_of_subtotal` is relative to the
/// original subtotal, not to the base the discount was actually applied
/// against; the UI shows both views.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiscountLine {
    pub label: &'static str,
    pub amount: Decimal,
    pub percent_of_subtotal: Decimal,
}

/// Category discount applies first, then the offer against the already
/// discounted base, then shipping on top. The product portion never goes
/// below zero, so `total >= shipping_cost` holds.
pub fn calculate_order_total(
    subtotal: Decimal,
    category_discount: Decimal,
    offer: Option<&Offer>,
    shipping_cost: Decimal,
) -> OrderTotals {
    let category_discount_amount = subtotal * category_discount / Decimal::ONE_HUNDRED;
    let after_category_discount = subtotal - category_discount_amount;
    let offer_discount_amount = offer
        .map(|o| o.discount_amount(after_category_discount))
        .unwrap_or(Decimal::ZERO);
    let after_all_discounts = after_category_discount - offer_discount_amount;
    OrderTotals {
        subtotal,
        category_discount_amount,
        after_category_discount,
        offer_discount_amount,
        after_all_discounts,
        total_discount: category_discount_amount + offer_discount_amount,
        shipping_cost,
        total: after_all_discounts + shipping_cost,
    }
}

impl OrderTotals {
    /// Per-discount rows for display, each recomputed as a percentage of the
    /// original subtotal.
    pub fn discount_breakdown(&self) -> Vec<DiscountLine> {
        let percent_of = |amount: Decimal| {
            if self.subtotal.is_zero() {
                Decimal::ZERO
            } else {
                amount / self.subtotal * Decimal::ONE_HUNDRED
            }
        };
        let mut lines = Vec::new();
        if !self.category_discount_amount.is_zero() {
            lines.push(DiscountLine {
                label: "category",
                amount: self.category_discount_amount,
                percent_of_subtotal: percent_of(self.category_discount_amount),
            });
        }
        if !self.offer_discount_amount.is_zero() {
            lines.push(DiscountLine {
                label: "offer",
                amount: self.offer_discount_amount,
                percent_of_subtotal: percent_of(self.offer_discount_amount),
            });
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::offer::{DiscountType, NewOffer};
    use crate::domain::value_objects::OfferCode;
    use chrono::Utc;

    fn offer(discount_type: DiscountType, value: Decimal) -> Offer {
        Offer::create(
            NewOffer {
                code: OfferCode::new("PRUEBA").unwrap(),
                description: None,
                discount_type,
                discount_value: value,
                start_date: None,
                end_date: None,
                min_purchase_amount: Decimal::ZERO,
                max_usage_global: None,
                max_usage_per_user: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_discounts_stack_category_first() {
        let offer = offer(DiscountType::Percentage, Decimal::new(20, 0));
        let totals = calculate_order_total(
            Decimal::new(100, 0),
            Decimal::new(10, 0),
            Some(&offer),
            Decimal::new(5, 0),
        );
        assert_eq!(totals.category_discount_amount, Decimal::new(10, 0));
        assert_eq!(totals.after_category_discount, Decimal::new(90, 0));
        assert_eq!(totals.offer_discount_amount, Decimal::new(18, 0));
        assert_eq!(totals.after_all_discounts, Decimal::new(72, 0));
        assert_eq!(totals.total_discount, Decimal::new(28, 0));
        assert_eq!(totals.total, Decimal::new(77, 0));
    }

    #[test]
    fn test_fixed_discount_never_negative() {
        let offer = offer(DiscountType::Fixed, Decimal::new(25, 0));
        // 10 subtotal, no category benefit: the fixed 25 is capped at 10
        let totals = calculate_order_total(Decimal::new(10, 0), Decimal::ZERO, Some(&offer), Decimal::new(3, 0));
        assert_eq!(totals.offer_discount_amount, Decimal::new(10, 0));
        assert_eq!(totals.after_all_discounts, Decimal::ZERO);
        assert_eq!(totals.total, totals.shipping_cost);
    }

    #[test]
    fn test_no_offer_no_category() {
        let totals = calculate_order_total(Decimal::new(40, 0), Decimal::ZERO, None, Decimal::new(7, 0));
        assert_eq!(totals.total_discount, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::new(47, 0));
        assert!(totals.discount_breakdown().is_empty());
    }

    #[test]
    fn test_breakdown_percent_of_original_subtotal() {
        let offer = offer(DiscountType::Percentage, Decimal::new(20, 0));
        let totals = calculate_order_total(
            Decimal::new(100, 0),
            Decimal::new(10, 0),
            Some(&offer),
            Decimal::ZERO,
        );
        let lines = totals.discount_breakdown();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].percent_of_subtotal, Decimal::new(10, 0));
        // 18 off 100 original, even though the offer itself is 20% of 90
        assert_eq!(lines[1].amount, Decimal::new(18, 0));
        assert_eq!(lines[1].percent_of_subtotal, Decimal::new(18, 0));
    }

    #[test]
    fn test_category_tiers_consume_configured_percentages() {
        let discounts = CategoryDiscounts {
            pro: Decimal::new(5, 0),
            vip: Decimal::new(10, 0),
        };
        assert_eq!(UserCategory::Regular.discount_percentage(discounts), Decimal::ZERO);
        assert_eq!(UserCategory::Pro.discount_percentage(discounts), Decimal::new(5, 0));
        assert_eq!(UserCategory::Vip.discount_percentage(discounts), Decimal::new(10, 0));
    }
}
