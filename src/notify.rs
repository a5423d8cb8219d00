//! Fire-and-forget notifications over the NATS bus.
//!
//! Notification failures are logged and swallowed: they must never turn a
//! successful order or state transition into an error.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::events::DomainEvent;
use crate::store::PgStore;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub whatsapp_number: Option<String>,
    pub notify_email: Option<String>,
    pub orders_enabled: bool,
    pub remittances_enabled: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            whatsapp_number: None,
            notify_email: None,
            orders_enabled: true,
            remittances_enabled: true,
        }
    }
}

impl NotificationSettings {
    pub fn enabled_for(&self, event: &DomainEvent) -> bool {
        match event {
            DomainEvent::Order(_) => self.orders_enabled,
            DomainEvent::Remittance(_) => self.remittances_enabled,
        }
    }
}

/// Outbound-notification seam used by the checkout orchestrator.
#[allow(async_fn_in_trait)]
pub trait Notify {
    async fn publish(&self, event: &DomainEvent);
}

#[derive(Clone)]
pub struct Notifier {
    client: Option<async_nats::Client>,
    store: PgStore,
    cached: NotificationSettings,
}

impl Notifier {
    pub fn new(client: Option<async_nats::Client>, store: PgStore, cached: NotificationSettings) -> Self {
        Self { client, store, cached }
    }

    /// Startup snapshot. Display only; anything that actually sends goes
    /// through [`Notifier::fresh_settings`].
    pub fn cached_settings(&self) -> &NotificationSettings {
        &self.cached
    }

    /// Settings as currently stored, re-read before every send. Falls back to
    /// the startup snapshot when the read fails.
    pub async fn fresh_settings(&self) -> NotificationSettings {
        match self.store.notification_settings().await {
            Ok(Some(settings)) => settings,
            Ok(None) => NotificationSettings::default(),
            Err(e) => {
                warn!(error = %e, "could not refresh notification settings, using startup snapshot");
                self.cached.clone()
            }
        }
    }

    pub async fn send(&self, event: &DomainEvent) {
        let settings = self.fresh_settings().await;
        if !settings.enabled_for(event) {
            debug!(subject = %event.subject(), "notifications disabled for this event kind");
            return;
        }
        let Some(client) = &self.client else {
            debug!(subject = %event.subject(), "no notification bus configured");
            return;
        };
        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(subject = %event.subject(), error = %e, "could not serialize notification");
                return;
            }
        };
        if let Err(e) = client.publish(event.subject(), payload.into()).await {
            warn!(subject = %event.subject(), error = %e, "failed to publish notification");
        }
    }
}

impl Notify for Notifier {
    async fn publish(&self, event: &DomainEvent) {
        self.send(event).await;
    }
}
