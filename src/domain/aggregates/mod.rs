//! Aggregates module
pub mod cart;
pub mod offer;
pub mod order;
pub mod remittance;
pub mod remittance_type;

pub use cart::{Cart, CartError, CartItem};
pub use offer::{DiscountType, Offer, OfferRejection, OfferUsage};
pub use order::{ItemType, Order, OrderError, OrderItem, OrderPaymentStatus, OrderStatus};
pub use remittance::{NewRemittance, Recipient, Remittance, RemittanceStatus, Transition, TransitionError};
pub use remittance_type::{CommissionSpec, DeliveryMethod, NewRemittanceType, RemittanceType, TypeConfigError};
