use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::MetricsResult;
use crate::types::ConnectionState;

/// Event delivered by the session's real-time channel.
///
/// Wire form is `{"type": "<kind>", "data": {...}}`; other keys are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Envelope")]
pub enum ConsoleEvent {
    /// A new session was established. No payload is consulted.
    Connected,
    Metrics(MetricsPayload),
    TransportState(ConnectionState),
    Unknown(String),
}

impl ConsoleEvent {
    pub fn from_json(line: &str) -> MetricsResult<Self> {
        Ok(serde_json::from_str(line)?)
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Connected => "connected",
            Self::Metrics(_) => "metrics",
            Self::TransportState(_) => "transport-state",
            Self::Unknown(kind) => kind,
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl From<Envelope> for ConsoleEvent {
    fn from(envelope: Envelope) -> Self {
        match envelope.kind.as_str() {
            "connected" => Self::Connected,
            "metrics" => Self::Metrics(MetricsPayload::from_value(envelope.data)),
            "transport-state" | "transport_state" => match envelope.data.get("state") {
                Some(Value::String(state)) => Self::TransportState(ConnectionState::from(state.as_str())),
                _ => {
                    log::debug!("transport-state event without a state string");
                    Self::Unknown(envelope.kind)
                }
            },
            _ => Self::Unknown(envelope.kind),
        }
    }
}

/// One latency report from a pipeline processor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProcessingMetric {
    pub processor: String,
    /// Seconds
    pub value: f64,
}

/// Token usage record; absent or non-numeric counters read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TokenRecord {
    #[serde(default, deserialize_with = "lenient_count")]
    pub completion_tokens: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub prompt_tokens: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_tokens: u64,
}

/// Body of a metrics event.
///
/// Both parts are optional: a missing or non-array `processing` yields no
/// entries, and only the first element of `tokens` is kept.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetricsPayload {
    #[serde(default, deserialize_with = "lenient_entries")]
    pub processing: Vec<ProcessingMetric>,
    #[serde(default, rename = "tokens", deserialize_with = "first_record")]
    pub token_record: Option<TokenRecord>,
}

impl MetricsPayload {
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_else(|error| {
            log::debug!("ignoring malformed metrics payload: {}", error);
            Self::default()
        })
    }

    pub fn with_processing<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            processing: entries
                .into_iter()
                .map(|(processor, value)| ProcessingMetric {
                    processor: processor.into(),
                    value,
                })
                .collect(),
            token_record: None,
        }
    }

    pub fn with_tokens(record: TokenRecord) -> Self {
        Self {
            processing: Vec::new(),
            token_record: Some(record),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.processing.is_empty() && self.token_record.is_none()
    }
}

fn lenient_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(error) => {
                log::debug!("skipping malformed processing entry: {}", error);
                None
            }
        })
        .collect())
}

fn first_record<'de, D>(deserializer: D) -> Result<Option<TokenRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };

    match items.into_iter().next() {
        Some(first @ Value::Object(_)) => Ok(serde_json::from_value(first).ok()),
        _ => Ok(None),
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|n| n.is_finite() && *n >= 0.0)
                .map(|n| n as u64)
        }),
        _ => None,
    };
    Ok(count.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_metrics_event_with_processing_and_tokens() {
        let event = ConsoleEvent::from_json(
            r#"{"label":"rtvi-ai","type":"metrics","data":{
                "processing":[{"processor":"llm","value":0.25},{"processor":"tts","value":0.1}],
                "tokens":[{"processor":"llm","completion_tokens":5,"prompt_tokens":3,"total_tokens":8},
                          {"completion_tokens":100}]
            }}"#,
        )
        .expect("parse");

        let ConsoleEvent::Metrics(payload) = event else {
            panic!("expected metrics event");
        };
        assert_eq!(payload.processing.len(), 2);
        assert_eq!(payload.processing[0].processor, "llm");
        assert_eq!(
            payload.token_record,
            Some(TokenRecord {
                completion_tokens: 5,
                prompt_tokens: 3,
                total_tokens: 8,
            })
        );
    }

    #[test]
    fn connected_ignores_payload() {
        let event = ConsoleEvent::from_json(r#"{"type":"connected","data":{"anything":1}}"#)
            .expect("parse");
        assert_eq!(event, ConsoleEvent::Connected);
    }

    #[test]
    fn transport_state_maps_to_connection_state() {
        let event = ConsoleEvent::from_json(r#"{"type":"transport-state","data":{"state":"connecting"}}"#)
            .expect("parse");
        assert_eq!(event, ConsoleEvent::TransportState(ConnectionState::Connecting));
    }

    #[test]
    fn unknown_types_are_kept_by_name() {
        let event = ConsoleEvent::from_json(r#"{"type":"bot-ready"}"#).expect("parse");
        assert_eq!(event.kind(), "bot-ready");
    }

    #[test]
    fn malformed_parts_are_skipped() {
        let payload = MetricsPayload::from_value(json!({
            "processing": {"processor": "llm"},
            "tokens": "lots"
        }));
        assert!(payload.is_empty());

        let payload = MetricsPayload::from_value(json!({
            "processing": [{"processor": "stt", "value": 0.2}, {"value": 0.4}, 7],
            "tokens": []
        }));
        assert_eq!(payload.processing.len(), 1);
        assert_eq!(payload.token_record, None);

        assert!(MetricsPayload::from_value(Value::Null).is_empty());
    }

    #[test]
    fn only_first_token_record_is_consulted() {
        let payload = MetricsPayload::from_value(json!({
            "tokens": ["bogus", {"prompt_tokens": 9}]
        }));
        assert_eq!(payload.token_record, None);
    }

    #[test]
    fn missing_and_odd_token_counts_read_as_zero() {
        let payload = MetricsPayload::from_value(json!({
            "tokens": [{"prompt_tokens": 4.0, "completion_tokens": null, "total_tokens": "x"}]
        }));
        assert_eq!(
            payload.token_record,
            Some(TokenRecord {
                completion_tokens: 0,
                prompt_tokens: 4,
                total_tokens: 0,
            })
        );
    }

    #[test]
    fn missing_type_is_an_error() {
        assert!(ConsoleEvent::from_json(r#"{"data":{}}"#).is_err());
    }
}
