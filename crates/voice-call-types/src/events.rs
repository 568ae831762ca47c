pub mod client;
pub mod server;

use client::*;
use server::*;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "call.start")]
    CallStart(CallStartRequestEvent),
    #[serde(rename = "call.stop")]
    CallStop(CallStopRequestEvent),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "close")]
    Close {
        reason: Option<String>,
    },
    #[serde(rename = "error")]
    Error(ErrorEvent),
    #[serde(rename = "call-start")]
    CallStart(CallStartEvent),
    #[serde(rename = "call-end")]
    CallEnd(CallEndEvent),
    #[serde(rename = "message")]
    Message(MessageEvent),
    #[serde(rename = "speech-start")]
    SpeechStart(SpeechEvent),
    #[serde(rename = "speech-end")]
    SpeechEnd(SpeechEvent),
    #[serde(rename = "volume-level")]
    VolumeLevel(VolumeLevelEvent),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageRole, TranscriptType};
    use crate::variables::VariableValues;

    #[test]
    fn test_server_events_parse_by_type_tag() {
        let start: ServerEvent = serde_json::from_str(r#"{"type":"call-start","call_id":"c1"}"#).unwrap();
        assert!(matches!(start, ServerEvent::CallStart(e) if e.call_id() == Some("c1")));

        let end: ServerEvent = serde_json::from_str(r#"{"type":"call-end"}"#).unwrap();
        assert!(matches!(end, ServerEvent::CallEnd(_)));

        let speech: ServerEvent = serde_json::from_str(r#"{"type":"speech-start"}"#).unwrap();
        assert!(matches!(speech, ServerEvent::SpeechStart(_)));

        let message: ServerEvent = serde_json::from_str(
            r#"{"type":"message","message":{"type":"transcript","transcriptType":"partial","role":"user","transcript":"I think"}}"#,
        )
        .unwrap();
        match message {
            ServerEvent::Message(m) => {
                assert_eq!(m.message().role(), Some(MessageRole::User));
                assert_eq!(m.message().transcript_type(), Some(TranscriptType::Partial));
            }
            other => panic!("Expected a message event, got {:?}", other),
        }
    }

    #[test]
    fn test_call_start_request_serializes_target_and_variables() {
        let event = ClientEvent::CallStart(
            CallStartRequestEvent::assistant("asst_1")
                .with_variables(VariableValues::new().with("questions", "- Why Rust?")),
        );
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "call.start");
        assert_eq!(json["assistant_id"], "asst_1");
        assert!(json["workflow_id"].is_null());
        assert_eq!(json["variable_values"]["questions"], "- Why Rust?");
    }
}
