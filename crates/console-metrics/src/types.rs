use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    pub completion_tokens: u64,
    pub prompt_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn add_assign(&mut self, other: TokenUsage) {
        self.completion_tokens = self.completion_tokens.saturating_add(other.completion_tokens);
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }

    pub fn get(&self, field: TokenField) -> u64 {
        match field {
            TokenField::Prompt => self.prompt_tokens,
            TokenField::Completion => self.completion_tokens,
            TokenField::Total => self.total_tokens,
        }
    }
}

/// One of the three counters carried by a token usage record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TokenField {
    Prompt,
    Completion,
    Total,
}

impl TokenField {
    pub const ALL: [TokenField; 3] = [Self::Prompt, Self::Completion, Self::Total];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prompt => "prompt_tokens",
            Self::Completion => "completion_tokens",
            Self::Total => "total_tokens",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Prompt => "Prompt Tokens",
            Self::Completion => "Completion Tokens",
            Self::Total => "Total Tokens",
        }
    }
}

/// A single latency observation for a processor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    pub processor: String,
    /// Receipt time in milliseconds since the Unix epoch
    pub timestamp_millis: i64,
    /// Latency in seconds as reported by the pipeline
    pub value_seconds: f64,
}

/// Transport state reported by the connection layer.
///
/// The set of states is owned by the transport; values this crate does not
/// recognise are preserved in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConnectionState {
    Idle,
    Disconnected,
    Initializing,
    Initialized,
    Authenticating,
    Authenticated,
    Connecting,
    Connected,
    Ready,
    Disconnecting,
    Error,
    Other(String),
}

impl ConnectionState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Disconnected => "disconnected",
            Self::Initializing => "initializing",
            Self::Initialized => "initialized",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Ready => "ready",
            Self::Disconnecting => "disconnecting",
            Self::Error => "error",
            Self::Other(value) => value,
        }
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Authenticating | Self::Connecting)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected | Self::Ready)
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::Disconnected
    }
}

impl From<&str> for ConnectionState {
    fn from(value: &str) -> Self {
        match value {
            "idle" => Self::Idle,
            "disconnected" => Self::Disconnected,
            "initializing" => Self::Initializing,
            "initialized" => Self::Initialized,
            "authenticating" => Self::Authenticating,
            "authenticated" => Self::Authenticated,
            "connecting" => Self::Connecting,
            "connected" => Self::Connected,
            "ready" => Self::Ready,
            "disconnecting" => Self::Disconnecting,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ConnectionState {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ConnectionState> for String {
    fn from(value: ConnectionState) -> Self {
        match value {
            ConnectionState::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which view the metrics panel should show.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    Metrics,
    Connecting,
    Disconnected,
    WaitingForData,
}

impl ViewState {
    pub fn classify(connection: &ConnectionState, has_data: bool) -> Self {
        if has_data {
            Self::Metrics
        } else if connection.is_connecting() {
            Self::Connecting
        } else if !connection.is_connected() {
            Self::Disconnected
        } else {
            Self::WaitingForData
        }
    }

    pub fn placeholder(self) -> Option<&'static str> {
        match self {
            Self::Metrics => None,
            Self::Connecting => Some("Connecting to agent..."),
            Self::Disconnected => Some("Not connected to agent"),
            Self::WaitingForData => Some("Waiting for metrics data..."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_state_round_trips_known_and_unknown_values() {
        let parsed: ConnectionState = serde_json::from_str("\"ready\"").expect("parse");
        assert_eq!(parsed, ConnectionState::Ready);

        let parsed: ConnectionState = serde_json::from_str("\"reconnecting\"").expect("parse");
        assert_eq!(parsed, ConnectionState::Other("reconnecting".to_string()));
        assert_eq!(
            serde_json::to_string(&parsed).expect("serialize"),
            "\"reconnecting\""
        );
    }

    #[test]
    fn classify_prefers_data_over_connection_state() {
        assert_eq!(
            ViewState::classify(&ConnectionState::Disconnected, true),
            ViewState::Metrics
        );
    }

    #[test]
    fn classify_buckets_connection_states() {
        let cases = [
            (ConnectionState::Authenticating, ViewState::Connecting),
            (ConnectionState::Connecting, ViewState::Connecting),
            (ConnectionState::Connected, ViewState::WaitingForData),
            (ConnectionState::Ready, ViewState::WaitingForData),
            (ConnectionState::Idle, ViewState::Disconnected),
            (ConnectionState::Error, ViewState::Disconnected),
            (ConnectionState::Initialized, ViewState::Disconnected),
        ];

        for (state, expected) in cases {
            assert_eq!(ViewState::classify(&state, false), expected, "{state}");
        }
    }

    #[test]
    fn token_usage_add_assign_sums_each_field() {
        let mut usage = TokenUsage {
            completion_tokens: 5,
            prompt_tokens: 3,
            total_tokens: 8,
        };
        usage.add_assign(TokenUsage {
            completion_tokens: 2,
            prompt_tokens: 1,
            total_tokens: 3,
        });

        assert_eq!(usage.get(TokenField::Completion), 7);
        assert_eq!(usage.get(TokenField::Prompt), 4);
        assert_eq!(usage.get(TokenField::Total), 11);
    }

    #[test]
    fn token_usage_add_assign_saturates() {
        let mut usage = TokenUsage {
            completion_tokens: 0,
            prompt_tokens: 1,
            total_tokens: u64::MAX,
        };
        usage.add_assign(TokenUsage {
            completion_tokens: 3,
            prompt_tokens: u64::MAX,
            total_tokens: 1,
        });

        assert_eq!(usage.completion_tokens, 3);
        assert_eq!(usage.prompt_tokens, u64::MAX);
        assert_eq!(usage.total_tokens, u64::MAX);
    }
}
