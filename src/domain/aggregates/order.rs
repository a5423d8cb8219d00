//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::cart::CartItem;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::pricing::OrderTotals;

/// Fulfilment pipeline. Progresses independently of `OrderPaymentStatus`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("unrecognized order status")]
pub struct ParseOrderStatusError;

impl FromStr for OrderStatus {
    type Err = ParseOrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(ParseOrderStatusError),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderPaymentStatus {
    #[default]
    Pending,
    Validated,
    Rejected,
}

impl OrderPaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderPaymentStatus::Pending => "pending",
            OrderPaymentStatus::Validated => "validated",
            OrderPaymentStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for OrderPaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("unrecognized order payment status")]
pub struct ParseOrderPaymentStatusError;

impl FromStr for OrderPaymentStatus {
    type Err = ParseOrderPaymentStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderPaymentStatus::Pending),
            "validated" => Ok(OrderPaymentStatus::Validated),
            "rejected" => Ok(OrderPaymentStatus::Rejected),
            _ => Err(ParseOrderPaymentStatusError),
        }
    }
}

/// Storefront line item kind: a single product or a bundled combo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Product,
    Combo,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Product => f.write_str("product"),
            ItemType::Combo => f.write_str("combo"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("unrecognized item type")]
pub struct ParseItemTypeError;

impl FromStr for ItemType {
    type Err = ParseItemTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "product" => Ok(ItemType::Product),
            "combo" => Ok(ItemType::Combo),
            _ => Err(ParseItemTypeError),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub item_type: ItemType,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl OrderItem {
    pub fn from_cart_item(item: &CartItem) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_type: item.item_type,
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.amount(),
            total_price: item.line_total().amount(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Option<Uuid>,
    pub customer_email: String,
    pub status: OrderStatus,
    pub payment_status: OrderPaymentStatus,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub offer_id: Option<Uuid>,
    pub zelle_account_id: Option<Uuid>,
    pub shipping_zone_id: Option<Uuid>,
    pub payment_proof_url: Option<String>,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub events: Vec<DomainEvent>,
}

pub struct NewOrder {
    pub order_number: String,
    pub user_id: Option<Uuid>,
    pub customer_email: String,
    pub items: Vec<OrderItem>,
    pub currency: String,
    pub offer_id: Option<Uuid>,
    pub zelle_account_id: Option<Uuid>,
    pub shipping_zone_id: Option<Uuid>,
    pub payment_proof_url: Option<String>,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum OrderError {
    #[error("an order needs at least one item")]
    NoItems,
    #[error("a delivered order can no longer be cancelled")]
    CannotCancel,
}

impl Order {
    /// Totals arrive from the pricing pipeline, computed once at checkout and
    /// frozen here; later offer or rate changes never alter a placed order.
    pub fn place(new: NewOrder, totals: &OrderTotals, now: DateTime<Utc>) -> Result<Self, OrderError> {
        if new.items.is_empty() {
            return Err(OrderError::NoItems);
        }
        let id = Uuid::new_v4();
        let mut order = Self {
            id,
            order_number: new.order_number.clone(),
            user_id: new.user_id,
            customer_email: new.customer_email,
            status: OrderStatus::Pending,
            payment_status: OrderPaymentStatus::Pending,
            subtotal: totals.subtotal,
            discount_amount: totals.total_discount,
            shipping_cost: totals.shipping_cost,
            total_amount: totals.total,
            currency: new.currency,
            offer_id: new.offer_id,
            zelle_account_id: new.zelle_account_id,
            shipping_zone_id: new.shipping_zone_id,
            payment_proof_url: new.payment_proof_url,
            payment_reference: new.payment_reference,
            notes: new.notes,
            items: new.items,
            created_at: now,
            updated_at: now,
            events: vec![],
        };
        order.raise(OrderEvent::Submitted {
            order_id: id,
            order_number: new.order_number,
            total: totals.total,
            currency: order.currency.clone(),
        });
        Ok(order)
    }

    pub fn validate_payment(&mut self, now: DateTime<Utc>) {
        self.payment_status = OrderPaymentStatus::Validated;
        self.status = OrderStatus::Processing;
        self.touch(now);
        self.raise(OrderEvent::PaymentValidated {
            order_id: self.id,
            order_number: self.order_number.clone(),
        });
    }

    pub fn reject_payment(&mut self, now: DateTime<Utc>) {
        self.payment_status = OrderPaymentStatus::Rejected;
        self.touch(now);
        self.raise(OrderEvent::PaymentRejected {
            order_id: self.id,
            order_number: self.order_number.clone(),
        });
    }

    pub fn ship(&mut self, now: DateTime<Utc>) {
        self.status = OrderStatus::Shipped;
        self.touch(now);
    }

    pub fn deliver(&mut self, now: DateTime<Utc>) {
        self.status = OrderStatus::Delivered;
        self.touch(now);
    }

    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = OrderStatus::Completed;
        self.touch(now);
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), OrderError> {
        if matches!(self.status, OrderStatus::Delivered | OrderStatus::Completed) {
            return Err(OrderError::CannotCancel);
        }
        self.status = OrderStatus::Cancelled;
        self.touch(now);
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }
    fn raise(&mut self, e: OrderEvent) {
        self.events.push(DomainEvent::Order(e));
    }
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pricing::calculate_order_total;

    fn items() -> Vec<OrderItem> {
        vec![OrderItem {
            id: Uuid::new_v4(),
            item_type: ItemType::Product,
            name: "Cafe molido 1kg".into(),
            quantity: 2,
            unit_price: Decimal::new(10, 0),
            total_price: Decimal::new(20, 0),
        }]
    }

    fn place(items: Vec<OrderItem>, totals: &OrderTotals) -> Result<Order, OrderError> {
        Order::place(
            NewOrder {
                order_number: "ORD-00000001".into(),
                user_id: None,
                customer_email: "test@example.com".into(),
                items,
                currency: "USD".into(),
                offer_id: None,
                zelle_account_id: None,
                shipping_zone_id: None,
                payment_proof_url: None,
                payment_reference: None,
                notes: None,
            },
            totals,
            Utc::now(),
        )
    }

    #[test]
    fn test_totals_frozen_at_placement() {
        let totals = calculate_order_total(Decimal::new(20, 0), Decimal::ZERO, None, Decimal::new(5, 0));
        let order = place(items(), &totals).unwrap();
        assert_eq!(order.total_amount, Decimal::new(25, 0));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, OrderPaymentStatus::Pending);
    }

    #[test]
    fn test_empty_order_rejected() {
        let totals = calculate_order_total(Decimal::ZERO, Decimal::ZERO, None, Decimal::ZERO);
        assert_eq!(place(vec![], &totals).unwrap_err(), OrderError::NoItems);
    }

    #[test]
    fn test_order_workflow() {
        let totals = calculate_order_total(Decimal::new(20, 0), Decimal::ZERO, None, Decimal::ZERO);
        let mut order = place(items(), &totals).unwrap();
        order.validate_payment(Utc::now());
        assert_eq!(order.status, OrderStatus::Processing);
        order.ship(Utc::now());
        order.deliver(Utc::now());
        assert_eq!(order.cancel(Utc::now()).unwrap_err(), OrderError::CannotCancel);
        order.complete(Utc::now());
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.take_events().len(), 2);
    }
}
