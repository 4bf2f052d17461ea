//! Agent message decoding
//!
//! Messages arriving from the agent are tagged JSON objects. Only the sync
//! trigger tag means anything to the coordinator; every other tag is
//! ignored.

use serde::{Deserialize, Serialize};

/// Tag identifying a sync-trigger message
pub const TRIGGER_SYNC_TAG: &str = "TRIGGER_SYNC";

/// A tagged message posted by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Message tag
    #[serde(rename = "type")]
    pub kind: String,
    /// Tag-specific payload, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl AgentMessage {
    /// Build a message with the given tag and no payload
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            payload: None,
        }
    }

    /// Build a sync-trigger message
    pub fn trigger_sync() -> Self {
        Self::new(TRIGGER_SYNC_TAG)
    }

    /// Whether this message asks the application to resume queued work
    pub fn is_trigger_sync(&self) -> bool {
        self.kind == TRIGGER_SYNC_TAG
    }

    /// Decode a raw JSON message, `None` if it is malformed or untagged
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// Encode as JSON
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("agent message serialization failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_trigger_sync() {
        let msg = AgentMessage::decode(r#"{"type":"TRIGGER_SYNC"}"#).unwrap();
        assert!(msg.is_trigger_sync());
    }

    #[test]
    fn test_decode_other_tag() {
        let msg = AgentMessage::decode(r#"{"type":"OTHER"}"#).unwrap();
        assert!(!msg.is_trigger_sync());
    }

    #[test]
    fn test_decode_malformed() {
        assert!(AgentMessage::decode("not json").is_none());
        assert!(AgentMessage::decode(r#"{"untagged":true}"#).is_none());
    }

    #[test]
    fn test_payload_preserved() {
        let msg = AgentMessage::decode(r#"{"type":"TRIGGER_SYNC","payload":{"queued":3}}"#).unwrap();
        assert_eq!(msg.payload.unwrap()["queued"], 3);
    }

    #[test]
    fn test_encode_round_trips_tag() {
        let encoded = AgentMessage::trigger_sync().encode();
        assert!(encoded.contains(r#""type":"TRIGGER_SYNC""#));
    }
}
