//! Environment configuration

use anyhow::Context;
use rust_decimal::Decimal;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub nats_url: Option<String>,
    pub category_discounts: CategoryDiscounts,
}

/// Loyalty-tier percentages. The tier itself is resolved by the auth layer;
/// this service only needs the numbers.
#[derive(Clone, Copy, Debug, Default)]
pub struct CategoryDiscounts {
    pub pro: Decimal,
    pub vip: Decimal,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().context("PORT must be a number")?,
            Err(_) => 8083,
        };
        let nats_url = std::env::var("NATS_URL").ok();
        let category_discounts = CategoryDiscounts {
            pro: percent_from_env("CATEGORY_DISCOUNT_PRO")?,
            vip: percent_from_env("CATEGORY_DISCOUNT_VIP")?,
        };
        Ok(Self {
            database_url,
            port,
            nats_url,
            category_discounts,
        })
    }
}

fn percent_from_env(key: &str) -> anyhow::Result<Decimal> {
    match std::env::var(key) {
        Ok(raw) => {
            let value: Decimal = raw.parse().with_context(|| format!("{key} must be a decimal percentage"))?;
            Ok(value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
        }
        Err(_) => Ok(Decimal::ZERO),
    }
}
