mod args;

pub use args::*;

use crate::LegId;

/// Outbound command, `{verb, args}` on the wire.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "verb", content = "args")]
pub enum Command {
    #[serde(rename = "answer")]
    Answer,
    #[serde(rename = "hangup")]
    Hangup,
    #[serde(rename = "play")]
    Play(PlayCommand),
    #[serde(rename = "gather")]
    Gather(GatherCommand),
    #[serde(rename = "dial")]
    Dial(DialCommand),
    #[serde(rename = "record")]
    Record(RecordCommand),
}

impl Command {
    pub fn verb(&self) -> &'static str {
        match self {
            Command::Answer => "answer",
            Command::Hangup => "hangup",
            Command::Play(_) => "play",
            Command::Gather(_) => "gather",
            Command::Dial(_) => "dial",
            Command::Record(_) => "record",
        }
    }
}

/// A command addressed to one leg, the frame written to the command channel.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CommandEnvelope {
    #[serde(rename = "legId")]
    leg_id: LegId,

    #[serde(flatten)]
    command: Command,
}

impl CommandEnvelope {
    pub fn new(leg_id: LegId, command: Command) -> Self {
        Self { leg_id, command }
    }

    pub fn leg_id(&self) -> &LegId {
        &self.leg_id
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_play() {
        let command = Command::Play(PlayCommand::new("sound:hello-world"));
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(json, r#"{"verb":"play","args":{"media":"sound:hello-world"}}"#);
    }

    #[test]
    fn test_serialize_envelope() {
        let envelope = CommandEnvelope::new(
            LegId::new("leg-1"),
            Command::Dial(DialCommand::new("sip:17853178070@trunk").with_timeout_secs(30)),
        );
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "legId": "leg-1",
                "verb": "dial",
                "args": {"destination": "sip:17853178070@trunk", "timeoutSecs": 30}
            })
        );
    }

    #[test]
    fn test_serialize_unit_verb() {
        let json = serde_json::to_value(Command::Hangup).unwrap();
        assert_eq!(json, serde_json::json!({"verb": "hangup"}));
    }

    #[test]
    fn test_deserialize_gather() {
        let json = r##"{"verb":"gather","args":{"maxDigits":4,"finishOnKey":"#"}}"##;
        let command: Command = serde_json::from_str(json).unwrap();
        match command {
            Command::Gather(gather) => {
                assert_eq!(gather.max_digits(), Some(4));
                assert_eq!(gather.finish_on_key(), Some("#"));
                assert_eq!(gather.prompt(), None);
            }
            other => panic!("expected gather, got {:?}", other),
        }
    }
}
