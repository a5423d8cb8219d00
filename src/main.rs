//! Remesa Commerce - Self-hosted storefront and remittance service

use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, response::{IntoResponse, Response}, routing::{get, post}, Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;
use validator::Validate;

use remesa_commerce::checkout::{self, CheckoutInput, OfferValidation};
use remesa_commerce::config::{AppConfig, CategoryDiscounts};
use remesa_commerce::domain::aggregates::cart::{Cart, CartItem};
use remesa_commerce::domain::aggregates::offer::{DiscountType, NewOffer, Offer};
use remesa_commerce::domain::aggregates::order::{ItemType, Order};
use remesa_commerce::domain::aggregates::remittance::{
    NewRemittance, Recipient, Remittance, RemittanceStatus, Transition,
};
use remesa_commerce::domain::aggregates::remittance_type::{
    CommissionSpec, DeliveryMethod, NewRemittanceType, RemittanceType,
};
use remesa_commerce::domain::alerts::{calculate_delivery_alert, DeliveryAlert};
use remesa_commerce::domain::pricing::{DiscountLine, OrderTotals, UserCategory};
use remesa_commerce::domain::rates::{simulate_reverse_remittance, RemittanceQuote};
use remesa_commerce::domain::value_objects::{Money, OfferCode};
use remesa_commerce::notify::{NotificationSettings, Notifier};
use remesa_commerce::store::{OrderAction, PgStore};
use remesa_commerce::ServiceError;

#[derive(Clone)]
pub struct AppState {
    pub store: PgStore,
    pub notifier: Notifier,
    pub discounts: CategoryDiscounts,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = PgPoolOptions::new().max_connections(10).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    let store = PgStore::new(db);

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "notification bus unreachable, notifications disabled");
                None
            }
        },
        None => None,
    };
    let cached_settings = store.notification_settings().await.ok().flatten().unwrap_or_default();
    let notifier = Notifier::new(nats, store.clone(), cached_settings);
    let state = AppState { store, notifier, discounts: config.category_discounts };

    let app = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "remesa-commerce"})) }))
        .route("/api/v1/quote", post(quote))
        .route("/api/v1/quote/reverse", post(reverse_quote))
        .route("/api/v1/remittance-types", get(list_remittance_types).post(create_remittance_type))
        .route("/api/v1/remittance-types/:id", get(get_remittance_type).put(update_remittance_type).delete(deactivate_remittance_type))
        .route("/api/v1/remittances", get(list_remittances).post(create_remittance))
        .route("/api/v1/remittances/:id", get(get_remittance))
        .route("/api/v1/remittances/by-number/:number", get(get_remittance_by_number))
        .route("/api/v1/remittances/:id/alert", get(remittance_alert))
        .route("/api/v1/remittances/:id/proof", post(upload_proof))
        .route("/api/v1/remittances/:id/validate", post(validate_payment))
        .route("/api/v1/remittances/:id/reject", post(reject_payment))
        .route("/api/v1/remittances/:id/process", post(start_processing))
        .route("/api/v1/remittances/:id/deliver", post(confirm_delivery))
        .route("/api/v1/remittances/:id/complete", post(complete_remittance))
        .route("/api/v1/remittances/:id/cancel", post(cancel_remittance))
        .route("/api/v1/offers", get(list_offers).post(create_offer))
        .route("/api/v1/offers/validate", post(validate_offer))
        .route("/api/v1/checkout", post(checkout_handler))
        .route("/api/v1/orders", get(list_orders))
        .route("/api/v1/orders/:id", get(get_order))
        .route("/api/v1/orders/:id/action", post(order_action))
        .route("/api/v1/settings/notifications", get(get_notification_settings).put(update_notification_settings))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    tracing::info!("remesa-commerce listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}

// =============================================================================
// Error mapping
// =============================================================================

struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::StaleState { .. } => StatusCode::CONFLICT,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::External(e) => {
                tracing::error!(error = %e, "storage failure");
                StatusCode::BAD_GATEWAY
            }
        };
        (status, Json(serde_json::json!({"error": self.0.to_string()}))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

fn invalid(e: validator::ValidationErrors) -> ApiError {
    ApiError(ServiceError::Validation(e.to_string()))
}

// =============================================================================
// Quotes
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub remittance_type_id: Uuid,
    pub amount: Decimal,
}

async fn quote(State(s): State<AppState>, Json(r): Json<QuoteRequest>) -> ApiResult<Json<RemittanceQuote>> {
    let rtype = s.store.remittance_type(r.remittance_type_id).await?;
    Ok(Json(rtype.quote(r.amount)))
}

#[derive(Debug, Deserialize)]
pub struct ReverseQuoteRequest {
    pub remittance_type_id: Uuid,
    pub desired_delivery_amount: Decimal,
}

async fn reverse_quote(State(s): State<AppState>, Json(r): Json<ReverseQuoteRequest>) -> ApiResult<Json<RemittanceQuote>> {
    let rtype = s.store.remittance_type(r.remittance_type_id).await?;
    let quote = simulate_reverse_remittance(
        r.desired_delivery_amount,
        rtype.exchange_rate,
        rtype.commission_percentage,
        rtype.commission_fixed,
    )
    .ok_or_else(|| ServiceError::validation("commission consumes the entire amount"))?;
    Ok(Json(quote))
}

// =============================================================================
// Remittance types (admin)
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRemittanceTypeRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 3, max = 3))]
    pub currency_code: String,
    #[validate(length(min = 3, max = 3))]
    pub delivery_currency: String,
    pub exchange_rate: Decimal,
    pub commission: CommissionSpec,
    #[serde(default)]
    pub min_amount: Decimal,
    pub max_amount: Option<Decimal>,
    pub delivery_method: DeliveryMethod,
    pub max_delivery_days: i32,
    pub warning_days: i32,
}

async fn create_remittance_type(
    State(s): State<AppState>,
    Json(r): Json<CreateRemittanceTypeRequest>,
) -> ApiResult<(StatusCode, Json<RemittanceType>)> {
    r.validate().map_err(invalid)?;
    let rtype = RemittanceType::create(
        NewRemittanceType {
            name: r.name,
            currency_code: r.currency_code.to_uppercase(),
            delivery_currency: r.delivery_currency.to_uppercase(),
            exchange_rate: r.exchange_rate,
            commission: r.commission,
            min_amount: r.min_amount,
            max_amount: r.max_amount,
            delivery_method: r.delivery_method,
            max_delivery_days: r.max_delivery_days,
            warning_days: r.warning_days,
        },
        Utc::now(),
    )
    .map_err(ServiceError::from)?;
    s.store.insert_remittance_type(&rtype).await?;
    Ok((StatusCode::CREATED, Json(rtype)))
}

#[derive(Debug, Deserialize)]
pub struct TypeListParams {
    pub all: Option<bool>,
}

async fn list_remittance_types(
    State(s): State<AppState>,
    Query(p): Query<TypeListParams>,
) -> ApiResult<Json<Vec<RemittanceType>>> {
    Ok(Json(s.store.list_remittance_types(p.all.unwrap_or(false)).await?))
}

async fn get_remittance_type(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<RemittanceType>> {
    Ok(Json(s.store.remittance_type(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRemittanceTypeRequest {
    pub name: Option<String>,
    pub exchange_rate: Decimal,
    pub commission: CommissionSpec,
    #[serde(default)]
    pub min_amount: Decimal,
    pub max_amount: Option<Decimal>,
    pub max_delivery_days: i32,
    pub warning_days: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct UpdateRemittanceTypeResponse {
    pub remittance_type: RemittanceType,
    pub pending_remittances: i64,
    /// Informational only: pending remittances will be quoted at the new rate
    /// once validated.
    pub warning: Option<String>,
}

async fn update_remittance_type(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<UpdateRemittanceTypeRequest>,
) -> ApiResult<Json<UpdateRemittanceTypeResponse>> {
    let mut rtype = s.store.remittance_type(id).await?;
    let now = Utc::now();
    if let Some(name) = r.name {
        rtype.name = name;
    }
    rtype.update_rates(r.exchange_rate, r.commission, now).map_err(ServiceError::from)?;
    rtype.update_limits(r.min_amount, r.max_amount, now).map_err(ServiceError::from)?;
    rtype.update_window(r.max_delivery_days, r.warning_days, now).map_err(ServiceError::from)?;
    if r.is_active {
        rtype.activate(now);
    } else {
        rtype.deactivate(now);
    }

    let pending = s.store.count_pending_for_type(id).await?;
    s.store.update_remittance_type(&rtype).await?;
    let warning = (pending > 0)
        .then(|| format!("{pending} pending remittance(s) were created under the previous rate"));
    Ok(Json(UpdateRemittanceTypeResponse { remittance_type: rtype, pending_remittances: pending, warning }))
}

async fn deactivate_remittance_type(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    let mut rtype = s.store.remittance_type(id).await?;
    rtype.deactivate(Utc::now());
    s.store.update_remittance_type(&rtype).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Remittances
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RecipientRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 5))]
    pub phone: String,
    pub city: Option<String>,
    pub province: Option<String>,
    pub municipality: Option<String>,
    pub address: Option<String>,
    pub id_number: Option<String>,
    pub bank_account: Option<String>,
    pub bank_name: Option<String>,
}

impl From<RecipientRequest> for Recipient {
    fn from(r: RecipientRequest) -> Self {
        Recipient {
            name: r.name,
            phone: r.phone,
            city: r.city,
            province: r.province,
            municipality: r.municipality,
            address: r.address,
            id_number: r.id_number,
            bank_account: r.bank_account,
            bank_name: r.bank_name,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRemittanceRequest {
    pub remittance_type_id: Uuid,
    pub user_id: Option<Uuid>,
    pub amount: Decimal,
    #[validate]
    pub recipient: RecipientRequest,
    pub delivery_method: Option<DeliveryMethod>,
    pub notes: Option<String>,
}

async fn create_remittance(
    State(s): State<AppState>,
    Json(r): Json<CreateRemittanceRequest>,
) -> ApiResult<(StatusCode, Json<Remittance>)> {
    r.validate().map_err(invalid)?;
    let rtype = s.store.remittance_type(r.remittance_type_id).await?;
    let number = format!("REM-{:08}", rand::random::<u32>());
    let mut remittance = Remittance::create(
        number,
        NewRemittance {
            user_id: r.user_id,
            amount: r.amount,
            recipient: r.recipient.into(),
            delivery_method: r.delivery_method,
            notes: r.notes,
        },
        &rtype,
        Utc::now(),
    )
    .map_err(ServiceError::from)?;
    s.store.insert_remittance(&remittance).await?;
    for event in remittance.take_events() {
        s.notifier.send(&event).await;
    }
    Ok((StatusCode::CREATED, Json(remittance)))
}

#[derive(Debug, Deserialize)]
pub struct RemittanceListParams {
    pub status: Option<RemittanceStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

async fn list_remittances(
    State(s): State<AppState>,
    Query(p): Query<RemittanceListParams>,
) -> ApiResult<Json<PaginatedResponse<Remittance>>> {
    let page = p.page.unwrap_or(1).max(1);
    let per_page = p.per_page.unwrap_or(20).min(100);
    let (data, total) = s
        .store
        .list_remittances(p.status, per_page as i64, ((page - 1) * per_page) as i64)
        .await?;
    Ok(Json(PaginatedResponse { data, total, page }))
}

async fn get_remittance(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Remittance>> {
    Ok(Json(s.store.remittance(id).await?))
}

async fn get_remittance_by_number(
    State(s): State<AppState>,
    Path(number): Path<String>,
) -> ApiResult<Json<Remittance>> {
    Ok(Json(s.store.remittance_by_number(&number).await?))
}

async fn remittance_alert(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Option<DeliveryAlert>>> {
    let remittance = s.store.remittance(id).await?;
    let rtype = s.store.remittance_type(remittance.remittance_type_id).await?;
    Ok(Json(calculate_delivery_alert(&remittance, &rtype, Utc::now())))
}

async fn run_transition(s: &AppState, id: Uuid, transition: Transition) -> ApiResult<Json<Remittance>> {
    let (remittance, events) = s.store.apply_transition(id, transition, Utc::now()).await?;
    for event in &events {
        s.notifier.send(event).await;
    }
    Ok(Json(remittance))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UploadProofRequest {
    #[validate(url)]
    pub proof_url: String,
    #[validate(length(min = 1))]
    pub reference: String,
    pub notes: Option<String>,
}

async fn upload_proof(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<UploadProofRequest>,
) -> ApiResult<Json<Remittance>> {
    r.validate().map_err(invalid)?;
    run_transition(
        &s,
        id,
        Transition::UploadProof { proof_url: r.proof_url, reference: r.reference, notes: r.notes },
    )
    .await
}

#[derive(Debug, Default, Deserialize)]
pub struct NotesRequest {
    pub notes: Option<String>,
}

async fn validate_payment(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<NotesRequest>,
) -> ApiResult<Json<Remittance>> {
    // Quote at the rate in effect right now; the transition freezes it onto
    // the remittance.
    let remittance = s.store.remittance(id).await?;
    let rtype = s.store.remittance_type(remittance.remittance_type_id).await?;
    run_transition(
        &s,
        id,
        Transition::ValidatePayment { quote: rtype.quote(remittance.amount), notes: r.notes },
    )
    .await
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

async fn reject_payment(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<RejectRequest>,
) -> ApiResult<Json<Remittance>> {
    run_transition(&s, id, Transition::RejectPayment { reason: r.reason }).await
}

async fn start_processing(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<NotesRequest>,
) -> ApiResult<Json<Remittance>> {
    run_transition(&s, id, Transition::StartProcessing { notes: r.notes }).await
}

async fn confirm_delivery(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<NotesRequest>,
) -> ApiResult<Json<Remittance>> {
    run_transition(&s, id, Transition::ConfirmDelivery { notes: r.notes }).await
}

async fn complete_remittance(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<NotesRequest>,
) -> ApiResult<Json<Remittance>> {
    run_transition(&s, id, Transition::Complete { notes: r.notes }).await
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

async fn cancel_remittance(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<CancelRequest>,
) -> ApiResult<Json<Remittance>> {
    run_transition(&s, id, Transition::Cancel { reason: r.reason }).await
}

// =============================================================================
// Offers
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOfferRequest {
    #[validate(length(min = 1, max = 40))]
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub min_purchase_amount: Decimal,
    pub max_usage_global: Option<i64>,
    pub max_usage_per_user: Option<i64>,
}

async fn create_offer(
    State(s): State<AppState>,
    Json(r): Json<CreateOfferRequest>,
) -> ApiResult<(StatusCode, Json<Offer>)> {
    r.validate().map_err(invalid)?;
    let code = OfferCode::new(r.code).map_err(|e| ServiceError::Validation(e.to_string()))?;
    let offer = Offer::create(
        NewOffer {
            code,
            description: r.description,
            discount_type: r.discount_type,
            discount_value: r.discount_value,
            start_date: r.start_date,
            end_date: r.end_date,
            min_purchase_amount: r.min_purchase_amount,
            max_usage_global: r.max_usage_global,
            max_usage_per_user: r.max_usage_per_user,
        },
        Utc::now(),
    )
    .map_err(ServiceError::from)?;
    s.store.insert_offer(&offer).await?;
    Ok((StatusCode::CREATED, Json(offer)))
}

async fn list_offers(State(s): State<AppState>) -> ApiResult<Json<Vec<Offer>>> {
    Ok(Json(s.store.list_offers().await?))
}

#[derive(Debug, Deserialize)]
pub struct ValidateOfferRequest {
    pub code: String,
    pub subtotal: Decimal,
    pub user_id: Option<Uuid>,
}

async fn validate_offer(
    State(s): State<AppState>,
    Json(r): Json<ValidateOfferRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let outcome = checkout::validate_and_get_offer(&s.store, &r.code, r.subtotal, r.user_id, Utc::now()).await?;
    Ok(Json(match outcome {
        OfferValidation::Valid { offer, usage } => {
            serde_json::json!({"valid": true, "offer": offer, "usage": usage})
        }
        OfferValidation::Rejected(rejection) => {
            serde_json::json!({"valid": false, "message": rejection.to_string(), "rejection": rejection})
        }
    }))
}

// =============================================================================
// Checkout and orders
// =============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct CheckoutItemRequest {
    pub reference_id: Uuid,
    pub item_type: ItemType,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    pub user_id: Option<Uuid>,
    #[validate(email)]
    pub customer_email: String,
    #[serde(default)]
    pub user_category: UserCategory,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[validate(length(min = 1))]
    pub items: Vec<CheckoutItemRequest>,
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub shipping_cost: Decimal,
    pub shipping_zone_id: Option<Uuid>,
    pub zelle_account_id: Option<Uuid>,
    pub payment_proof_url: Option<String>,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order: Order,
    pub totals: OrderTotals,
    pub discount_breakdown: Vec<DiscountLine>,
}

async fn checkout_handler(
    State(s): State<AppState>,
    Json(r): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<CheckoutResponse>)> {
    r.validate().map_err(invalid)?;
    let mut cart = match r.user_id {
        Some(user_id) => Cart::for_user(user_id, &r.currency),
        None => Cart::new(&r.currency),
    };
    for item in &r.items {
        cart.add_item(CartItem {
            reference_id: item.reference_id,
            item_type: item.item_type,
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: Money::new(item.unit_price, &r.currency),
        });
    }
    let outcome = checkout::place_order(
        &s.store,
        &s.notifier,
        s.discounts,
        CheckoutInput {
            user_id: r.user_id,
            customer_email: r.customer_email,
            cart,
            user_category: r.user_category,
            coupon_code: r.coupon_code,
            shipping_cost: r.shipping_cost,
            shipping_zone_id: r.shipping_zone_id,
            zelle_account_id: r.zelle_account_id,
            payment_proof_url: r.payment_proof_url,
            payment_reference: r.payment_reference,
            notes: r.notes,
        },
        Utc::now(),
    )
    .await?;
    let discount_breakdown = outcome.totals.discount_breakdown();
    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse { order: outcome.order, totals: outcome.totals, discount_breakdown }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

async fn list_orders(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> ApiResult<Json<PaginatedResponse<Order>>> {
    let page = p.page.unwrap_or(1).max(1);
    let per_page = p.per_page.unwrap_or(20).min(100);
    let (data, total) = s.store.list_orders(per_page as i64, ((page - 1) * per_page) as i64).await?;
    Ok(Json(PaginatedResponse { data, total, page }))
}

async fn get_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Order>> {
    Ok(Json(s.store.order(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct OrderActionRequest {
    pub action: OrderAction,
}

async fn order_action(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    Json(r): Json<OrderActionRequest>,
) -> ApiResult<Json<Order>> {
    let (order, events) = s.store.apply_order_action(id, r.action, Utc::now()).await?;
    for event in &events {
        s.notifier.send(event).await;
    }
    Ok(Json(order))
}

// =============================================================================
// Notification settings
// =============================================================================

/// Startup snapshot, for the admin screen. Sends always re-read the stored
/// settings.
async fn get_notification_settings(State(s): State<AppState>) -> Json<NotificationSettings> {
    Json(s.notifier.cached_settings().clone())
}

async fn update_notification_settings(
    State(s): State<AppState>,
    Json(settings): Json<NotificationSettings>,
) -> ApiResult<Json<NotificationSettings>> {
    s.store.upsert_notification_settings(&settings).await?;
    Ok(Json(settings))
}
