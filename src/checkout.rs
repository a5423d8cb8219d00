//! Checkout orchestration: coupon validation, pricing, order creation and the
//! secondary effects that follow it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::CategoryDiscounts;
use crate::domain::aggregates::cart::Cart;
use crate::domain::aggregates::offer::{Offer, OfferRejection, OfferUsage};
use crate::domain::aggregates::order::{NewOrder, Order, OrderItem};
use crate::domain::pricing::{calculate_order_total, OrderTotals, UserCategory};
use crate::domain::value_objects::OfferCode;
use crate::notify::Notify;
use crate::store::CheckoutStore;
use crate::{Result, ServiceError};

/// Outcome of a coupon check. A rejection is a regular answer for the
/// storefront to display, not a service failure.
#[derive(Clone, Debug)]
pub enum OfferValidation {
    Valid { offer: Offer, usage: OfferUsage },
    Rejected(OfferRejection),
}

/// Looks up the (normalized) code and judges it against the cart subtotal and
/// the current usage counters. Store failures surface as retryable errors.
pub async fn validate_and_get_offer<S: CheckoutStore>(
    store: &S,
    code: &str,
    subtotal: Decimal,
    user_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<OfferValidation> {
    let code = match OfferCode::new(code) {
        Ok(code) => code,
        Err(_) => return Ok(OfferValidation::Rejected(OfferRejection::NotFound)),
    };
    let Some(offer) = store.offer_by_code(&code).await? else {
        return Ok(OfferValidation::Rejected(OfferRejection::NotFound));
    };
    let usage = store.offer_usage(offer.id, user_id).await?;
    match offer.check(subtotal, usage, now) {
        Ok(()) => Ok(OfferValidation::Valid { offer, usage }),
        Err(rejection) => Ok(OfferValidation::Rejected(rejection)),
    }
}

pub struct CheckoutInput {
    pub user_id: Option<Uuid>,
    pub customer_email: String,
    pub cart: Cart,
    pub user_category: UserCategory,
    pub coupon_code: Option<String>,
    pub shipping_cost: Decimal,
    pub shipping_zone_id: Option<Uuid>,
    pub zelle_account_id: Option<Uuid>,
    pub payment_proof_url: Option<String>,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug)]
pub struct CheckoutOutcome {
    pub order: Order,
    pub totals: OrderTotals,
}

/// Sequences a checkout: coupon -> totals -> order persistence -> secondary
/// effects. The order is created exactly once with its totals frozen; a
/// failure to record offer usage or to notify never rolls it back.
pub async fn place_order<S: CheckoutStore, N: Notify>(
    store: &S,
    notifier: &N,
    discounts: CategoryDiscounts,
    input: CheckoutInput,
    now: DateTime<Utc>,
) -> Result<CheckoutOutcome> {
    if input.cart.is_empty() {
        return Err(ServiceError::validation("cart is empty"));
    }
    let subtotal = input.cart.subtotal().amount();

    let offer = match &input.coupon_code {
        Some(code) => {
            match validate_and_get_offer(store, code, subtotal, input.user_id, now).await? {
                OfferValidation::Valid { offer, .. } => Some(offer),
                OfferValidation::Rejected(rejection) => {
                    return Err(ServiceError::Validation(rejection.to_string()));
                }
            }
        }
        None => None,
    };

    let totals = calculate_order_total(
        subtotal,
        input.user_category.discount_percentage(discounts),
        offer.as_ref(),
        input.shipping_cost,
    );

    let order_number = format!("ORD-{:08}", rand::random::<u32>());
    let items: Vec<OrderItem> = input.cart.items().iter().map(OrderItem::from_cart_item).collect();
    let mut order = Order::place(
        NewOrder {
            order_number,
            user_id: input.user_id,
            customer_email: input.customer_email,
            items,
            currency: input.cart.currency().to_string(),
            offer_id: offer.as_ref().map(|o| o.id),
            zelle_account_id: input.zelle_account_id,
            shipping_zone_id: input.shipping_zone_id,
            payment_proof_url: input.payment_proof_url,
            payment_reference: input.payment_reference,
            notes: input.notes,
        },
        &totals,
        now,
    )?;
    store.insert_order(&order).await?;

    // The order exists from here on; everything below is best-effort.
    match (&offer, input.user_id) {
        (Some(offer), Some(user_id)) => {
            if let Err(e) = store.record_offer_usage(offer.id, user_id, order.id).await {
                warn!(order = %order.order_number, offer = %offer.code, error = %e,
                    "failed to record offer usage");
            }
        }
        (Some(offer), None) => {
            debug!(order = %order.order_number, offer = %offer.code,
                "anonymous checkout, offer usage not recorded");
        }
        (None, _) => {}
    }
    for event in order.take_events() {
        notifier.publish(&event).await;
    }

    Ok(CheckoutOutcome { order, totals })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::cart::CartItem;
    use crate::domain::aggregates::offer::{DiscountType, NewOffer};
    use crate::domain::aggregates::order::ItemType;
    use crate::domain::events::DomainEvent;
    use crate::domain::value_objects::Money;
    use std::sync::Mutex;

    struct MemStore {
        offer: Option<Offer>,
        usage: OfferUsage,
        orders: Mutex<Vec<Order>>,
        usage_records: Mutex<Vec<(Uuid, Uuid, Uuid)>>,
        fail_usage_recording: bool,
    }

    impl MemStore {
        fn new(offer: Option<Offer>) -> Self {
            Self {
                offer,
                usage: OfferUsage::default(),
                orders: Mutex::new(vec![]),
                usage_records: Mutex::new(vec![]),
                fail_usage_recording: false,
            }
        }
    }

    impl CheckoutStore for MemStore {
        async fn offer_by_code(&self, code: &OfferCode) -> Result<Option<Offer>> {
            Ok(self.offer.clone().filter(|o| o.code == *code && o.is_active))
        }
        async fn offer_usage(&self, _offer_id: Uuid, _user_id: Option<Uuid>) -> Result<OfferUsage> {
            Ok(self.usage)
        }
        async fn insert_order(&self, order: &Order) -> Result<()> {
            self.orders.lock().unwrap().push(order.clone());
            Ok(())
        }
        async fn record_offer_usage(&self, offer_id: Uuid, user_id: Uuid, order_id: Uuid) -> Result<()> {
            if self.fail_usage_recording {
                return Err(ServiceError::External(sqlx::Error::PoolTimedOut));
            }
            self.usage_records.lock().unwrap().push((offer_id, user_id, order_id));
            Ok(())
        }
    }

    struct MemNotify {
        subjects: Mutex<Vec<String>>,
    }

    impl Notify for MemNotify {
        async fn publish(&self, event: &DomainEvent) {
            self.subjects.lock().unwrap().push(event.subject());
        }
    }

    fn offer(code: &str, min_purchase: Decimal) -> Offer {
        Offer::create(
            NewOffer {
                code: OfferCode::new(code).unwrap(),
                description: None,
                discount_type: DiscountType::Percentage,
                discount_value: Decimal::new(10, 0),
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

    fn cart(total_units: u32) -> Cart {
        let mut cart = Cart::new("USD");
        cart.add_item(CartItem {
            reference_id: Uuid::new_v4(),
            item_type: ItemType::Product,
            name: "Arroz 5kg".into(),
            quantity: total_units,
            unit_price: Money::usd(Decimal::new(10, 0)),
        });
        cart
    }

    fn input(cart: Cart, coupon: Option<&str>, user_id: Option<Uuid>) -> CheckoutInput {
        CheckoutInput {
            user_id,
            customer_email: "cliente@example.com".into(),
            cart,
            user_category: UserCategory::Regular,
            coupon_code: coupon.map(str::to_string),
            shipping_cost: Decimal::new(5, 0),
            shipping_zone_id: None,
            zelle_account_id: None,
            payment_proof_url: Some("https://proofs/zelle-1.jpg".into()),
            payment_reference: Some("Z-555".into()),
            notes: None,
        }
    }

    fn notify() -> MemNotify {
        MemNotify { subjects: Mutex::new(vec![]) }
    }

    #[tokio::test]
    async fn test_checkout_with_coupon() {
        let store = MemStore::new(Some(offer("PROMO10", Decimal::ZERO)));
        let notifier = notify();
        let outcome = place_order(
            &store,
            &notifier,
            CategoryDiscounts::default(),
            input(cart(10), Some("promo10"), Some(Uuid::new_v4())),
            Utc::now(),
        )
        .await
        .unwrap();

        // 100 - 10% + 5 shipping
        assert_eq!(outcome.order.total_amount, Decimal::new(95, 0));
        assert_eq!(outcome.totals.offer_discount_amount, Decimal::new(10, 0));
        assert_eq!(store.orders.lock().unwrap().len(), 1);
        assert_eq!(store.usage_records.lock().unwrap().len(), 1);
        let subjects = notifier.subjects.lock().unwrap();
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0], "remesa.order.submitted");
    }

    #[tokio::test]
    async fn test_usage_recording_failure_does_not_fail_checkout() {
        let mut store = MemStore::new(Some(offer("PROMO10", Decimal::ZERO)));
        store.fail_usage_recording = true;
        let notifier = notify();
        let outcome = place_order(
            &store,
            &notifier,
            CategoryDiscounts::default(),
            input(cart(10), Some("PROMO10"), Some(Uuid::new_v4())),
            Utc::now(),
        )
        .await;

        let outcome = outcome.expect("order must survive a usage-recording failure");
        assert_eq!(store.orders.lock().unwrap().len(), 1);
        assert!(store.usage_records.lock().unwrap().is_empty());
        assert_eq!(outcome.order.offer_id, store.offer.as_ref().map(|o| o.id));
    }

    #[tokio::test]
    async fn test_rejected_coupon_fails_checkout_before_persisting() {
        let store = MemStore::new(Some(offer("PROMO10", Decimal::new(500, 0))));
        let notifier = notify();
        let result = place_order(
            &store,
            &notifier,
            CategoryDiscounts::default(),
            input(cart(10), Some("PROMO10"), Some(Uuid::new_v4())),
            Utc::now(),
        )
        .await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert!(store.orders.lock().unwrap().is_empty());
        assert!(notifier.subjects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let store = MemStore::new(None);
        let notifier = notify();
        let result = place_order(
            &store,
            &notifier,
            CategoryDiscounts::default(),
            input(Cart::new("USD"), None, None),
            Utc::now(),
        )
        .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_validate_and_get_offer_unknown_code() {
        let store = MemStore::new(None);
        let result = validate_and_get_offer(&store, "NADA", Decimal::new(100, 0), None, Utc::now())
            .await
            .unwrap();
        assert!(matches!(result, OfferValidation::Rejected(OfferRejection::NotFound)));
    }

    #[tokio::test]
    async fn test_category_discount_stacks_before_offer() {
        let store = MemStore::new(Some(offer("PROMO10", Decimal::ZERO)));
        let notifier = notify();
        let discounts = CategoryDiscounts {
            pro: Decimal::new(5, 0),
            vip: Decimal::new(10, 0),
        };
        let mut checkout = input(cart(10), Some("PROMO10"), Some(Uuid::new_v4()));
        checkout.user_category = UserCategory::Vip;
        let outcome = place_order(&store, &notifier, discounts, checkout, Utc::now())
            .await
            .unwrap();

        // 100 -> 90 after the vip 10%, -> 81 after the 10% coupon, +5 shipping
        assert_eq!(outcome.totals.category_discount_amount, Decimal::new(10, 0));
        assert_eq!(outcome.totals.offer_discount_amount, Decimal::new(9, 0));
        assert_eq!(outcome.order.total_amount, Decimal::new(86, 0));
    }
}
