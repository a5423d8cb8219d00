//! Postgres persistence.
//!
//! Runtime-checked queries over a shared pool. Status columns are plain TEXT
//! round-tripped through the domain enums, so an unrecognized stored value
//! surfaces as a decode error instead of leaking into the state machine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::aggregates::offer::{Offer, OfferUsage};
use crate::domain::aggregates::order::{Order, OrderItem};
use crate::domain::aggregates::remittance::{Recipient, Remittance, RemittanceStatus, Transition};
use crate::domain::aggregates::remittance_type::RemittanceType;
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::OfferCode;
use crate::notify::NotificationSettings;
use crate::{Result, ServiceError};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

fn decode_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(e))
}

// =============================================================================
// Rows
// =============================================================================

#[derive(sqlx::FromRow)]
struct RemittanceTypeRow {
    id: Uuid,
    name: String,
    currency_code: String,
    delivery_currency: String,
    exchange_rate: Decimal,
    commission_percentage: Decimal,
    commission_fixed: Decimal,
    min_amount: Decimal,
    max_amount: Option<Decimal>,
    delivery_method: String,
    max_delivery_days: i32,
    warning_days: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RemittanceTypeRow> for RemittanceType {
    type Error = sqlx::Error;

    fn try_from(row: RemittanceTypeRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(RemittanceType {
            id: row.id,
            name: row.name,
            currency_code: row.currency_code,
            delivery_currency: row.delivery_currency,
            exchange_rate: row.exchange_rate,
            commission_percentage: row.commission_percentage,
            commission_fixed: row.commission_fixed,
            min_amount: row.min_amount,
            max_amount: row.max_amount,
            delivery_method: row.delivery_method.parse().map_err(decode_err)?,
            max_delivery_days: row.max_delivery_days,
            warning_days: row.warning_days,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RemittanceRow {
    id: Uuid,
    remittance_number: String,
    user_id: Option<Uuid>,
    remittance_type_id: Uuid,
    amount: Decimal,
    currency: String,
    amount_to_deliver: Option<Decimal>,
    delivery_currency: String,
    commission_total: Option<Decimal>,
    rate_applied: Option<Decimal>,
    recipient_name: String,
    recipient_phone: String,
    recipient_city: Option<String>,
    recipient_province: Option<String>,
    recipient_municipality: Option<String>,
    recipient_address: Option<String>,
    recipient_id_number: Option<String>,
    recipient_bank_account: Option<String>,
    recipient_bank_name: Option<String>,
    delivery_method: String,
    status: String,
    payment_proof_url: Option<String>,
    payment_reference: Option<String>,
    payment_rejection_reason: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    validated_at: Option<DateTime<Utc>>,
    processing_started_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
}

impl TryFrom<RemittanceRow> for Remittance {
    type Error = sqlx::Error;

    fn try_from(row: RemittanceRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Remittance {
            id: row.id,
            remittance_number: row.remittance_number,
            user_id: row.user_id,
            remittance_type_id: row.remittance_type_id,
            amount: row.amount,
            currency: row.currency,
            amount_to_deliver: row.amount_to_deliver,
            delivery_currency: row.delivery_currency,
            commission_total: row.commission_total,
            rate_applied: row.rate_applied,
            recipient: Recipient {
                name: row.recipient_name,
                phone: row.recipient_phone,
                city: row.recipient_city,
                province: row.recipient_province,
                municipality: row.recipient_municipality,
                address: row.recipient_address,
                id_number: row.recipient_id_number,
                bank_account: row.recipient_bank_account,
                bank_name: row.recipient_bank_name,
            },
            delivery_method: row.delivery_method.parse().map_err(decode_err)?,
            status: row.status.parse().map_err(decode_err)?,
            payment_proof_url: row.payment_proof_url,
            payment_reference: row.payment_reference,
            payment_rejection_reason: row.payment_rejection_reason,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            validated_at: row.validated_at,
            processing_started_at: row.processing_started_at,
            delivered_at: row.delivered_at,
            events: vec![],
        })
    }
}

#[derive(sqlx::FromRow)]
struct OfferRow {
    id: Uuid,
    code: String,
    description: Option<String>,
    discount_type: String,
    discount_value: Decimal,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    min_purchase_amount: Decimal,
    max_usage_global: Option<i64>,
    max_usage_per_user: Option<i64>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<OfferRow> for Offer {
    type Error = sqlx::Error;

    fn try_from(row: OfferRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Offer {
            id: row.id,
            code: OfferCode::new(row.code).map_err(decode_err)?,
            description: row.description,
            discount_type: row.discount_type.parse().map_err(decode_err)?,
            discount_value: row.discount_value,
            start_date: row.start_date,
            end_date: row.end_date,
            min_purchase_amount: row.min_purchase_amount,
            max_usage_global: row.max_usage_global,
            max_usage_per_user: row.max_usage_per_user,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    user_id: Option<Uuid>,
    customer_email: String,
    status: String,
    payment_status: String,
    subtotal: Decimal,
    discount_amount: Decimal,
    shipping_cost: Decimal,
    total_amount: Decimal,
    currency: String,
    offer_id: Option<Uuid>,
    zelle_account_id: Option<Uuid>,
    shipping_zone_id: Option<Uuid>,
    payment_proof_url: Option<String>,
    payment_reference: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    item_type: String,
    name: String,
    quantity: i32,
    unit_price: Decimal,
    total_price: Decimal,
}

fn order_from_rows(row: OrderRow, item_rows: Vec<OrderItemRow>) -> std::result::Result<Order, sqlx::Error> {
    let items = item_rows
        .into_iter()
        .map(|i| {
            Ok(OrderItem {
                id: i.id,
                item_type: i.item_type.parse().map_err(decode_err)?,
                name: i.name,
                quantity: u32::try_from(i.quantity).unwrap_or(0),
                unit_price: i.unit_price,
                total_price: i.total_price,
            })
        })
        .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;
    Ok(Order {
        id: row.id,
        order_number: row.order_number,
        user_id: row.user_id,
        customer_email: row.customer_email,
        status: row.status.parse().map_err(decode_err)?,
        payment_status: row.payment_status.parse().map_err(decode_err)?,
        subtotal: row.subtotal,
        discount_amount: row.discount_amount,
        shipping_cost: row.shipping_cost,
        total_amount: row.total_amount,
        currency: row.currency,
        offer_id: row.offer_id,
        zelle_account_id: row.zelle_account_id,
        shipping_zone_id: row.shipping_zone_id,
        payment_proof_url: row.payment_proof_url,
        payment_reference: row.payment_reference,
        notes: row.notes,
        items,
        created_at: row.created_at,
        updated_at: row.updated_at,
        events: vec![],
    })
}

/// Admin action on the simpler order pipeline.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    ValidatePayment,
    RejectPayment,
    Ship,
    Deliver,
    Complete,
    Cancel,
}

// =============================================================================
// Store
// =============================================================================

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // --- remittance types ---

    pub async fn insert_remittance_type(&self, t: &RemittanceType) -> Result<()> {
        sqlx::query(
            "INSERT INTO remittance_types (id, name, currency_code, delivery_currency, exchange_rate, \
             commission_percentage, commission_fixed, min_amount, max_amount, delivery_method, \
             max_delivery_days, warning_days, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(t.id)
        .bind(&t.name)
        .bind(&t.currency_code)
        .bind(&t.delivery_currency)
        .bind(t.exchange_rate)
        .bind(t.commission_percentage)
        .bind(t.commission_fixed)
        .bind(t.min_amount)
        .bind(t.max_amount)
        .bind(t.delivery_method.to_string())
        .bind(t.max_delivery_days)
        .bind(t.warning_days)
        .bind(t.is_active)
        .bind(t.created_at)
        .bind(t.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_remittance_type(&self, t: &RemittanceType) -> Result<()> {
        let result = sqlx::query(
            "UPDATE remittance_types SET name = $2, exchange_rate = $3, commission_percentage = $4, \
             commission_fixed = $5, min_amount = $6, max_amount = $7, delivery_method = $8, \
             max_delivery_days = $9, warning_days = $10, is_active = $11, updated_at = $12 WHERE id = $1",
        )
        .bind(t.id)
        .bind(&t.name)
        .bind(t.exchange_rate)
        .bind(t.commission_percentage)
        .bind(t.commission_fixed)
        .bind(t.min_amount)
        .bind(t.max_amount)
        .bind(t.delivery_method.to_string())
        .bind(t.max_delivery_days)
        .bind(t.warning_days)
        .bind(t.is_active)
        .bind(t.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("remittance type"));
        }
        Ok(())
    }

    pub async fn remittance_type(&self, id: Uuid) -> Result<RemittanceType> {
        let row = sqlx::query_as::<_, RemittanceTypeRow>("SELECT * FROM remittance_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("remittance type"))?;
        Ok(row.try_into()?)
    }

    pub async fn list_remittance_types(&self, include_inactive: bool) -> Result<Vec<RemittanceType>> {
        let sql = if include_inactive {
            "SELECT * FROM remittance_types ORDER BY name"
        } else {
            "SELECT * FROM remittance_types WHERE is_active ORDER BY name"
        };
        let rows = sqlx::query_as::<_, RemittanceTypeRow>(sql).fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| r.try_into().map_err(ServiceError::from))
            .collect()
    }

    /// Remittances created against this corridor that are still waiting for
    /// payment validation, i.e. would be quoted at the new rate if it changes.
    pub async fn count_pending_for_type(&self, id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM remittances WHERE remittance_type_id = $1 AND status IN ($2, $3)",
        )
        .bind(id)
        .bind(RemittanceStatus::PaymentPending.as_str())
        .bind(RemittanceStatus::PaymentProofUploaded.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // --- remittances ---

    pub async fn insert_remittance(&self, r: &Remittance) -> Result<()> {
        sqlx::query(
            "INSERT INTO remittances (id, remittance_number, user_id, remittance_type_id, amount, currency, \
             amount_to_deliver, delivery_currency, commission_total, rate_applied, recipient_name, \
             recipient_phone, recipient_city, recipient_province, recipient_municipality, recipient_address, \
             recipient_id_number, recipient_bank_account, recipient_bank_name, delivery_method, status, \
             payment_proof_url, payment_reference, payment_rejection_reason, notes, created_at, updated_at, \
             validated_at, processing_started_at, delivered_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, \
             $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30)",
        )
        .bind(r.id)
        .bind(&r.remittance_number)
        .bind(r.user_id)
        .bind(r.remittance_type_id)
        .bind(r.amount)
        .bind(&r.currency)
        .bind(r.amount_to_deliver)
        .bind(&r.delivery_currency)
        .bind(r.commission_total)
        .bind(r.rate_applied)
        .bind(&r.recipient.name)
        .bind(&r.recipient.phone)
        .bind(&r.recipient.city)
        .bind(&r.recipient.province)
        .bind(&r.recipient.municipality)
        .bind(&r.recipient.address)
        .bind(&r.recipient.id_number)
        .bind(&r.recipient.bank_account)
        .bind(&r.recipient.bank_name)
        .bind(r.delivery_method.to_string())
        .bind(r.status.as_str())
        .bind(&r.payment_proof_url)
        .bind(&r.payment_reference)
        .bind(&r.payment_rejection_reason)
        .bind(&r.notes)
        .bind(r.created_at)
        .bind(r.updated_at)
        .bind(r.validated_at)
        .bind(r.processing_started_at)
        .bind(r.delivered_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remittance(&self, id: Uuid) -> Result<Remittance> {
        let row = sqlx::query_as::<_, RemittanceRow>("SELECT * FROM remittances WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("remittance"))?;
        Ok(row.try_into()?)
    }

    pub async fn remittance_by_number(&self, number: &str) -> Result<Remittance> {
        let row = sqlx::query_as::<_, RemittanceRow>("SELECT * FROM remittances WHERE remittance_number = $1")
            .bind(number)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("remittance"))?;
        Ok(row.try_into()?)
    }

    pub async fn list_remittances(
        &self,
        status: Option<RemittanceStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Remittance>, i64)> {
        let (rows, total): (Vec<RemittanceRow>, i64) = match status {
            Some(status) => {
                let rows = sqlx::query_as::<_, RemittanceRow>(
                    "SELECT * FROM remittances WHERE status = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
                )
                .bind(status.as_str())
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;
                let total = sqlx::query_scalar("SELECT COUNT(*) FROM remittances WHERE status = $1")
                    .bind(status.as_str())
                    .fetch_one(&self.pool)
                    .await?;
                (rows, total)
            }
            None => {
                let rows = sqlx::query_as::<_, RemittanceRow>(
                    "SELECT * FROM remittances ORDER BY created_at DESC LIMIT $1 OFFSET $2",
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;
                let total = sqlx::query_scalar("SELECT COUNT(*) FROM remittances")
                    .fetch_one(&self.pool)
                    .await?;
                (rows, total)
            }
        };
        let remittances = rows
            .into_iter()
            .map(|r| r.try_into().map_err(ServiceError::from))
            .collect::<Result<Vec<_>>>()?;
        Ok((remittances, total))
    }

    /// Loads the remittance, applies the transition in the domain (which
    /// re-checks legality), then persists it conditionally on the status that
    /// was loaded. If another session moved the row first the update matches
    /// nothing and the caller gets [`ServiceError::StaleState`] instead of a
    /// silently double-applied transition.
    pub async fn apply_transition(
        &self,
        id: Uuid,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<(Remittance, Vec<DomainEvent>)> {
        let mut remittance = self.remittance(id).await?;
        let expected = remittance.status;
        remittance.apply(transition, now)?;

        let result = sqlx::query(
            "UPDATE remittances SET status = $3, payment_proof_url = $4, payment_reference = $5, \
             payment_rejection_reason = $6, notes = $7, amount_to_deliver = $8, commission_total = $9, \
             rate_applied = $10, validated_at = $11, processing_started_at = $12, delivered_at = $13, \
             updated_at = $14 WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(expected.as_str())
        .bind(remittance.status.as_str())
        .bind(&remittance.payment_proof_url)
        .bind(&remittance.payment_reference)
        .bind(&remittance.payment_rejection_reason)
        .bind(&remittance.notes)
        .bind(remittance.amount_to_deliver)
        .bind(remittance.commission_total)
        .bind(remittance.rate_applied)
        .bind(remittance.validated_at)
        .bind(remittance.processing_started_at)
        .bind(remittance.delivered_at)
        .bind(remittance.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM remittances WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
            return Err(if exists {
                ServiceError::StaleState { expected }
            } else {
                ServiceError::NotFound("remittance")
            });
        }

        let events = remittance.take_events();
        Ok((remittance, events))
    }

    // --- offers ---

    pub async fn insert_offer(&self, offer: &Offer) -> Result<()> {
        sqlx::query(
            "INSERT INTO offers (id, code, description, discount_type, discount_value, start_date, end_date, \
             min_purchase_amount, max_usage_global, max_usage_per_user, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(offer.id)
        .bind(offer.code.as_str())
        .bind(&offer.description)
        .bind(offer.discount_type.to_string())
        .bind(offer.discount_value)
        .bind(offer.start_date)
        .bind(offer.end_date)
        .bind(offer.min_purchase_amount)
        .bind(offer.max_usage_global)
        .bind(offer.max_usage_per_user)
        .bind(offer.is_active)
        .bind(offer.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_offers(&self) -> Result<Vec<Offer>> {
        let rows = sqlx::query_as::<_, OfferRow>("SELECT * FROM offers ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|r| r.try_into().map_err(ServiceError::from))
            .collect()
    }

    // --- orders ---

    pub async fn order(&self, id: Uuid) -> Result<Order> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("order"))?;
        let items = sqlx::query_as::<_, OrderItemRow>("SELECT * FROM order_items WHERE order_id = $1")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(order_from_rows(row, items)?)
    }

    pub async fn list_orders(&self, limit: i64, offset: i64) -> Result<(Vec<Order>, i64)> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(&self.pool).await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>("SELECT * FROM order_items WHERE order_id = ANY($1)")
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;
        let mut items_by_order: std::collections::HashMap<Uuid, Vec<OrderItemRow>> = std::collections::HashMap::new();
        for item in item_rows {
            items_by_order.entry(item.order_id).or_default().push(item);
        }
        let orders = rows
            .into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                order_from_rows(row, items).map_err(ServiceError::from)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((orders, total))
    }

    pub async fn apply_order_action(
        &self,
        id: Uuid,
        action: OrderAction,
        now: DateTime<Utc>,
    ) -> Result<(Order, Vec<DomainEvent>)> {
        let mut order = self.order(id).await?;
        match action {
            OrderAction::ValidatePayment => order.validate_payment(now),
            OrderAction::RejectPayment => order.reject_payment(now),
            OrderAction::Ship => order.ship(now),
            OrderAction::Deliver => order.deliver(now),
            OrderAction::Complete => order.complete(now),
            OrderAction::Cancel => order.cancel(now)?,
        }
        sqlx::query("UPDATE orders SET status = $2, payment_status = $3, updated_at = $4 WHERE id = $1")
            .bind(id)
            .bind(order.status.as_str())
            .bind(order.payment_status.as_str())
            .bind(order.updated_at)
            .execute(&self.pool)
            .await?;
        let events = order.take_events();
        Ok((order, events))
    }

    // --- notification settings ---

    pub async fn notification_settings(&self) -> Result<Option<NotificationSettings>> {
        let row = sqlx::query_as::<_, NotificationSettingsRow>(
            "SELECT whatsapp_number, notify_email, orders_enabled, remittances_enabled \
             FROM notification_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| NotificationSettings {
            whatsapp_number: r.whatsapp_number,
            notify_email: r.notify_email,
            orders_enabled: r.orders_enabled,
            remittances_enabled: r.remittances_enabled,
        }))
    }

    pub async fn upsert_notification_settings(&self, settings: &NotificationSettings) -> Result<()> {
        sqlx::query(
            "INSERT INTO notification_settings (id, whatsapp_number, notify_email, orders_enabled, \
             remittances_enabled, updated_at) VALUES (1, $1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET whatsapp_number = $1, notify_email = $2, orders_enabled = $3, \
             remittances_enabled = $4, updated_at = $5",
        )
        .bind(&settings.whatsapp_number)
        .bind(&settings.notify_email)
        .bind(settings.orders_enabled)
        .bind(settings.remittances_enabled)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct NotificationSettingsRow {
    whatsapp_number: Option<String>,
    notify_email: Option<String>,
    orders_enabled: bool,
    remittances_enabled: bool,
}

// =============================================================================
// Checkout seam
// =============================================================================

/// The slice of persistence the checkout orchestrator needs. Kept narrow so
/// the usage-recording and notification isolation rules stay testable with
/// in-memory doubles.
#[allow(async_fn_in_trait)]
pub trait CheckoutStore {
    async fn offer_by_code(&self, code: &OfferCode) -> Result<Option<Offer>>;
    async fn offer_usage(&self, offer_id: Uuid, user_id: Option<Uuid>) -> Result<OfferUsage>;
    async fn insert_order(&self, order: &Order) -> Result<()>;
    async fn record_offer_usage(&self, offer_id: Uuid, user_id: Uuid, order_id: Uuid) -> Result<()>;
}

impl CheckoutStore for PgStore {
    async fn offer_by_code(&self, code: &OfferCode) -> Result<Option<Offer>> {
        let row = sqlx::query_as::<_, OfferRow>("SELECT * FROM offers WHERE code = $1 AND is_active")
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| r.try_into().map_err(ServiceError::from)).transpose()
    }

    async fn offer_usage(&self, offer_id: Uuid, user_id: Option<Uuid>) -> Result<OfferUsage> {
        let global: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM offer_usage WHERE offer_id = $1")
            .bind(offer_id)
            .fetch_one(&self.pool)
            .await?;
        let by_user: i64 = match user_id {
            Some(user_id) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM offer_usage WHERE offer_id = $1 AND user_id = $2")
                    .bind(offer_id)
                    .bind(user_id)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => 0,
        };
        Ok(OfferUsage { global, by_user })
    }

    /// Order and items land in one transaction: a checkout either fully
    /// persists or fully fails.
    async fn insert_order(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO orders (id, order_number, user_id, customer_email, status, payment_status, subtotal, \
             discount_amount, shipping_cost, total_amount, currency, offer_id, zelle_account_id, \
             shipping_zone_id, payment_proof_url, payment_reference, notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(order.user_id)
        .bind(&order.customer_email)
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.subtotal)
        .bind(order.discount_amount)
        .bind(order.shipping_cost)
        .bind(order.total_amount)
        .bind(&order.currency)
        .bind(order.offer_id)
        .bind(order.zelle_account_id)
        .bind(order.shipping_zone_id)
        .bind(&order.payment_proof_url)
        .bind(&order.payment_reference)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;
        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, item_type, name, quantity, unit_price, total_price) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(item.id)
            .bind(order.id)
            .bind(item.item_type.to_string())
            .bind(&item.name)
            .bind(item.quantity as i32)
            .bind(item.unit_price)
            .bind(item.total_price)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn record_offer_usage(&self, offer_id: Uuid, user_id: Uuid, order_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO offer_usage (id, offer_id, user_id, order_id, used_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::now_v7())
        .bind(offer_id)
        .bind(user_id)
        .bind(order_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
