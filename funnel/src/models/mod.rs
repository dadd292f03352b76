//! Domain models for the offer funnel pipeline.
//!
//! - [`EventKind`] - Event category (offer received, viewed, completed, transaction)
//! - [`Event`] / [`EventLog`] - Raw events with their original columns
//! - [`CleanedEvent`] - An event plus the fields extracted from its payload
//! - [`Offer`] - Promotional offer definition
//! - [`Dimension`] / [`SliceKey`] - Offer attributes used to slice a funnel

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

// =============================================================================
// Event Kind
// =============================================================================

/// Category of a customer event.
///
/// Labels outside the four known categories are kept verbatim in
/// [`EventKind::Other`]; they never take part in a funnel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    OfferReceived,
    OfferViewed,
    OfferCompleted,
    Transaction,
    Other(String),
}

impl EventKind {
    /// Funnel stages in canonical order.
    pub const FUNNEL_STAGES: [EventKind; 3] = [
        EventKind::OfferReceived,
        EventKind::OfferViewed,
        EventKind::OfferCompleted,
    ];

    /// Parse an event label. Matching ignores case and surrounding whitespace.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "offer received" => Self::OfferReceived,
            "offer viewed" => Self::OfferViewed,
            "offer completed" => Self::OfferCompleted,
            "transaction" => Self::Transaction,
            _ => Self::Other(label.trim().to_string()),
        }
    }

    /// Label as it appears in the event log.
    pub fn as_str(&self) -> &str {
        match self {
            Self::OfferReceived => "offer received",
            Self::OfferViewed => "offer viewed",
            Self::OfferCompleted => "offer completed",
            Self::Transaction => "transaction",
            Self::Other(label) => label,
        }
    }

    /// Position in the canonical funnel, `None` for non-funnel events.
    pub fn stage_rank(&self) -> Option<u8> {
        match self {
            Self::OfferReceived => Some(0),
            Self::OfferViewed => Some(1),
            Self::OfferCompleted => Some(2),
            Self::Transaction | Self::Other(_) => None,
        }
    }

    pub fn is_funnel_stage(&self) -> bool {
        self.stage_rank().is_some()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for EventKind {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

// =============================================================================
// Events
// =============================================================================

/// A single row of the event log.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub customer_id: String,
    pub event: EventKind,
    /// Raw semi-structured payload.
    pub value: String,
    /// Every original cell of the row, aligned with [`EventLog::headers`].
    pub columns: Vec<String>,
}

impl Event {
    /// Build an event whose original columns are exactly
    /// `customer_id`, `event` and `value`.
    pub fn new(customer_id: impl Into<String>, event: EventKind, value: impl Into<String>) -> Self {
        let customer_id = customer_id.into();
        let value = value.into();
        let columns = vec![customer_id.clone(), event.as_str().to_string(), value.clone()];
        Self {
            customer_id,
            event,
            value,
            columns,
        }
    }
}

/// The event log as read from its source table.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    /// Original column names, in order.
    pub headers: Vec<String>,
    pub events: Vec<Event>,
}

impl EventLog {
    /// Log built from events created with [`Event::new`].
    pub fn from_events(events: Vec<Event>) -> Self {
        Self {
            headers: vec!["customer_id".into(), "event".into(), "value".into()],
            events,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// An event with the typed fields extracted from its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedEvent {
    pub source: Event,
    pub transaction_amount: Option<f64>,
    pub offer_id: Option<String>,
    pub reward_amount: Option<f64>,
}

impl CleanedEvent {
    pub fn customer_id(&self) -> &str {
        &self.source.customer_id
    }

    pub fn kind(&self) -> &EventKind {
        &self.source.event
    }
}

// =============================================================================
// Offers
// =============================================================================

/// A promotional offer definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub offer_id: String,
    pub offer_type: String,
    #[serde(default)]
    pub difficulty: Option<f64>,
    #[serde(default)]
    pub reward: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

// =============================================================================
// Slicing
// =============================================================================

/// Offer attribute used to partition a funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    OfferType,
    Difficulty,
    Reward,
    Duration,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::OfferType,
        Dimension::Difficulty,
        Dimension::Reward,
        Dimension::Duration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OfferType => "offer_type",
            Self::Difficulty => "difficulty",
            Self::Reward => "reward",
            Self::Duration => "duration",
        }
    }

    /// Whether minimum-value filters apply to this dimension.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::OfferType)
    }

    /// Value of this dimension for an offer; `None` when the offer lacks it.
    pub fn value(&self, offer: &Offer) -> Option<SliceKey> {
        match self {
            Self::OfferType => Some(SliceKey::Text(offer.offer_type.clone())),
            Self::Difficulty => offer.difficulty.map(SliceKey::Number),
            Self::Reward => offer.reward.map(SliceKey::Number),
            Self::Duration => offer.duration.map(SliceKey::Number),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "offer_type" | "type" => Ok(Self::OfferType),
            "difficulty" => Ok(Self::Difficulty),
            "reward" => Ok(Self::Reward),
            "duration" => Ok(Self::Duration),
            other => Err(format!(
                "unknown dimension '{}' (expected offer_type, difficulty, reward or duration)",
                other
            )),
        }
    }
}

/// Value of a slicing dimension.
///
/// Numbers order numerically (total order) and sort before text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SliceKey {
    Number(f64),
    Text(String),
}

impl SliceKey {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl PartialEq for SliceKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SliceKey {}

impl PartialOrd for SliceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SliceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

impl Hash for SliceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Number(n) => {
                0u8.hash(state);
                n.to_bits().hash(state);
            }
            Self::Text(s) => {
                1u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl fmt::Display for SliceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_labels() {
        assert_eq!(EventKind::from_label("offer received"), EventKind::OfferReceived);
        assert_eq!(EventKind::from_label("  Offer Viewed "), EventKind::OfferViewed);
        assert_eq!(EventKind::from_label("transaction"), EventKind::Transaction);
        assert_eq!(
            EventKind::from_label("offer expired"),
            EventKind::Other("offer expired".into())
        );
        assert_eq!(EventKind::OfferCompleted.to_string(), "offer completed");
    }

    #[test]
    fn test_event_kind_serde_uses_labels() {
        let json = serde_json::to_string(&EventKind::OfferViewed).unwrap();
        assert_eq!(json, "\"offer viewed\"");
        let back: EventKind = serde_json::from_str("\"offer received\"").unwrap();
        assert_eq!(back, EventKind::OfferReceived);
    }

    #[test]
    fn test_stage_rank() {
        assert_eq!(EventKind::OfferReceived.stage_rank(), Some(0));
        assert_eq!(EventKind::OfferCompleted.stage_rank(), Some(2));
        assert!(!EventKind::Transaction.is_funnel_stage());
    }

    #[test]
    fn test_dimension_parse() {
        assert_eq!("offer-type".parse::<Dimension>().unwrap(), Dimension::OfferType);
        assert_eq!("Difficulty".parse::<Dimension>().unwrap(), Dimension::Difficulty);
        assert!("channel".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_dimension_value_missing_attribute() {
        let offer = Offer {
            offer_id: "a".into(),
            offer_type: "bogo".into(),
            difficulty: None,
            reward: Some(10.0),
            duration: Some(7.0),
        };
        assert_eq!(Dimension::Difficulty.value(&offer), None);
        assert_eq!(Dimension::Reward.value(&offer), Some(SliceKey::Number(10.0)));
        assert_eq!(
            Dimension::OfferType.value(&offer),
            Some(SliceKey::Text("bogo".into()))
        );
    }

    #[test]
    fn test_slice_key_ordering_and_display() {
        let mut keys = vec![
            SliceKey::Text("discount".into()),
            SliceKey::Number(10.0),
            SliceKey::Number(5.0),
            SliceKey::Text("bogo".into()),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                SliceKey::Number(5.0),
                SliceKey::Number(10.0),
                SliceKey::Text("bogo".into()),
                SliceKey::Text("discount".into()),
            ]
        );
        assert_eq!(SliceKey::Number(5.0).to_string(), "5");
        assert_eq!(SliceKey::Number(2.5).to_string(), "2.5");
    }
}
