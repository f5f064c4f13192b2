/// Typed view of the payment provider's webhook events
///
/// Only the fields reconciliation needs are decoded. Reference fields such as
/// `customer` arrive either as a bare id or as an expanded object; both are
/// accepted.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Error type for event decoding
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Body is not a well-formed event
    #[error("Invalid event payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// An id, or an expanded object carrying one
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object { id } => id,
        }
    }
}

/// `checkout.session.completed` payload
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,

    #[serde(default)]
    pub client_reference_id: Option<String>,

    #[serde(default)]
    pub customer: Option<Expandable>,

    #[serde(default)]
    pub subscription: Option<Expandable>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// `customer.subscription.*` payload
#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub id: String,

    #[serde(default)]
    pub customer: Option<Expandable>,

    pub status: String,

    #[serde(default)]
    pub metadata: HashMap<String, String>,

    #[serde(default)]
    pub items: SubscriptionItems,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
    pub price: Price,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    pub id: String,
}

impl Subscription {
    /// Price of the first line item
    pub fn price_id(&self) -> Option<&str> {
        self.items.data.first().map(|item| item.price.id.as_str())
    }
}

/// Event kinds reconciliation acts on
#[derive(Debug, Clone)]
pub enum BillingEvent {
    CheckoutCompleted(CheckoutSession),
    SubscriptionUpdated(Subscription),
    SubscriptionDeleted(Subscription),

    /// Any other event type; acknowledged and ignored
    Other,
}

/// A decoded webhook event
#[derive(Debug, Clone)]
pub struct Event {
    pub id: String,
    pub event_type: String,
    pub kind: BillingEvent,
}

#[derive(Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawData,
}

#[derive(Deserialize)]
struct RawData {
    object: JsonValue,
}

/// Decodes a raw webhook body
pub fn parse_event(body: &[u8]) -> Result<Event, EventError> {
    let raw: RawEvent = serde_json::from_slice(body)?;

    let kind = match raw.event_type.as_str() {
        "checkout.session.completed" => {
            BillingEvent::CheckoutCompleted(serde_json::from_value(raw.data.object)?)
        }
        "customer.subscription.updated" => {
            BillingEvent::SubscriptionUpdated(serde_json::from_value(raw.data.object)?)
        }
        "customer.subscription.deleted" => {
            BillingEvent::SubscriptionDeleted(serde_json::from_value(raw.data.object)?)
        }
        _ => BillingEvent::Other,
    };

    Ok(Event {
        id: raw.id,
        event_type: raw.event_type,
        kind,
    })
}
