use crate::LegId;

/// Event type names emitted by the media server.
pub mod names {
    pub const CALL_ANSWERED: &str = "CallAnswered";
    pub const ANSWER_FAILED: &str = "AnswerFailed";
    pub const CALL_HUNG_UP: &str = "CallHungUp";
    pub const PLAYBACK_FINISHED: &str = "PlaybackFinished";
    pub const PLAYBACK_FAILED: &str = "PlaybackFailed";
    pub const GATHER_FINISHED: &str = "GatherFinished";
    pub const GATHER_FAILED: &str = "GatherFailed";
    pub const DIAL_ANSWERED: &str = "DialAnswered";
    pub const DIAL_FAILED: &str = "DialFailed";
    pub const RECORDING_FINISHED: &str = "RecordingFinished";
    pub const RECORDING_FAILED: &str = "RecordingFailed";
}

/// An inbound notification from the media server, `{type, data, legId}` on the wire.
///
/// `data` is verb specific and opaque to the correlation engine.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    event_type: String,

    #[serde(default)]
    data: serde_json::Value,

    #[serde(rename = "legId")]
    leg_id: LegId,
}

impl Event {
    pub fn new(leg_id: LegId, event_type: &str, data: impl Into<serde_json::Value>) -> Self {
        Self {
            event_type: event_type.to_string(),
            data: data.into(),
            leg_id,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }

    pub fn leg_id(&self) -> &LegId {
        &self.leg_id
    }

    pub fn into_data(self) -> serde_json::Value {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_wire_event() {
        let json = r#"{"type":"PlaybackFinished","data":"1","legId":"leg-1"}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type(), names::PLAYBACK_FINISHED);
        assert_eq!(event.data(), &serde_json::json!("1"));
        assert_eq!(event.leg_id(), &LegId::new("leg-1"));
    }

    #[test]
    fn test_missing_data_defaults_to_null() {
        let json = r#"{"type":"CallHungUp","legId":"leg-2"}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert!(event.data().is_null());
    }

    #[test]
    fn test_missing_leg_is_rejected() {
        let json = r#"{"type":"PlaybackFinished","data":"1"}"#;
        assert!(serde_json::from_str::<Event>(json).is_err());
    }
}
