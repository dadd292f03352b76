//! Semi-structured payload parsing.
//!
//! Event payloads are dictionaries written with single-quoted strings,
//! e.g. `{'offer id': '9b98b8c7', 'amount': 0.83}`. Quotes are normalized to
//! JSON before parsing; typed fields are then looked up by a list of
//! candidate keys, first usable value wins.

use serde_json::{Map, Value};
use std::borrow::Cow;

use crate::error::PayloadError;

/// Keys holding the transaction amount.
pub const AMOUNT_KEYS: &[&str] = &["amount"];

/// Keys holding the offer id. Producers disagree on the spelling,
/// `offer_id` is preferred.
pub const OFFER_ID_KEYS: &[&str] = &["offer_id", "offer id"];

/// Keys holding the reward amount.
pub const REWARD_KEYS: &[&str] = &["reward"];

/// A parsed payload map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Parse a raw payload.
    ///
    /// Blank text is an empty map. Anything that is not a map after quote
    /// normalization is an error.
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::default());
        }

        let normalized = normalize_quotes(raw);
        match serde_json::from_str::<Value>(&normalized) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(_) => Err(PayloadError::NotAMap),
            Err(e) => Err(PayloadError::Malformed(e.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First value among `keys` readable as a finite number.
    ///
    /// Numeric strings such as `'12.5'` count as numbers.
    pub fn number(&self, keys: &[&str]) -> Option<f64> {
        keys.iter()
            .filter_map(|key| self.0.get(*key))
            .find_map(as_number)
    }

    /// First value among `keys` readable as non-empty text.
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.0.get(*key))
            .find_map(as_text)
    }
}

/// Replace single-quote string delimiters with double quotes.
pub fn normalize_quotes(raw: &str) -> Cow<'_, str> {
    if raw.contains('\'') {
        Cow::Owned(raw.replace('\'', "\""))
    } else {
        Cow::Borrowed(raw)
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The three typed fields carried by an event payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayloadFields {
    pub transaction_amount: Option<f64>,
    pub offer_id: Option<String>,
    pub reward_amount: Option<f64>,
}

impl PayloadFields {
    pub fn extract(payload: &Payload) -> Self {
        Self {
            transaction_amount: payload.number(AMOUNT_KEYS),
            offer_id: payload.text(OFFER_ID_KEYS),
            reward_amount: payload.number(REWARD_KEYS),
        }
    }

    /// Parse and extract in one step. A malformed payload yields all nulls
    /// together with the reason.
    pub fn from_raw(raw: &str) -> (Self, Option<PayloadError>) {
        match Payload::parse(raw) {
            Ok(payload) => (Self::extract(&payload), None),
            Err(e) => (Self::default(), Some(e)),
        }
    }
}
