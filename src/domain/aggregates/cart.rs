//! Cart Aggregate

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::aggregates::order::ItemType;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug)]
pub struct Cart {
    id: Uuid,
    user_id: Option<Uuid>,
    items: Vec<CartItem>,
    subtotal: Money,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct CartItem {
    /// Product or combo the line refers to.
    pub reference_id: Uuid,
    pub item_type: ItemType,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl CartItem {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

impl Cart {
    pub fn new(currency: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            items: vec![],
            subtotal: Money::zero(currency),
            currency: currency.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn for_user(user_id: Uuid, currency: &str) -> Self {
        let mut cart = Self::new(currency);
        cart.user_id = Some(user_id);
        cart
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }
    pub fn subtotal(&self) -> &Money {
        &self.subtotal
    }
    pub fn currency(&self) -> &str {
        &self.currency
    }
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn add_item(&mut self, item: CartItem) {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.reference_id == item.reference_id && i.item_type == item.item_type)
        {
            existing.quantity += item.quantity;
        } else {
            self.items.push(item);
        }
        self.recalculate();
    }

    pub fn update_quantity(&mut self, reference_id: Uuid, quantity: u32) -> Result<(), CartError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.reference_id == reference_id)
            .ok_or(CartError::ItemNotFound)?;
        if quantity == 0 {
            self.items.retain(|i| i.reference_id != reference_id);
        } else {
            item.quantity = quantity;
        }
        self.recalculate();
        Ok(())
    }

    pub fn remove_item(&mut self, reference_id: Uuid) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| i.reference_id != reference_id);
        if self.items.len() == before {
            return Err(CartError::ItemNotFound);
        }
        self.recalculate();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.recalculate();
    }

    fn recalculate(&mut self) {
        self.subtotal = self
            .items
            .iter()
            .fold(Money::zero(&self.currency), |acc, i| acc.add(&i.line_total()).unwrap_or(acc));
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone)]
pub enum CartError {
    ItemNotFound,
}
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Item not found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn item(reference_id: Uuid, qty: u32) -> CartItem {
        CartItem {
            reference_id,
            item_type: ItemType::Product,
            name: "Aceite 1L".into(),
            quantity: qty,
            unit_price: Money::usd(Decimal::new(10, 0)),
        }
    }

    #[test]
    fn test_cart_operations() {
        let p1 = Uuid::new_v4();
        let mut cart = Cart::new("USD");
        cart.add_item(item(p1, 2));
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.subtotal().amount(), Decimal::new(20, 0));
        cart.add_item(item(p1, 1));
        assert_eq!(cart.items()[0].quantity, 3); // Merged
        cart.update_quantity(p1, 1).unwrap();
        assert_eq!(cart.subtotal().amount(), Decimal::new(10, 0));
        cart.remove_item(p1).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_combo_lines_kept_apart_from_products() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new("USD");
        cart.add_item(item(id, 1));
        let mut combo = item(id, 1);
        combo.item_type = ItemType::Combo;
        cart.add_item(combo);
        assert_eq!(cart.item_count(), 2);
    }
}
