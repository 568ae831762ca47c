mod error;

pub use error::ErrorDetails;

use crate::message::TranscriptMessage;

/// `error` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorEvent {
    #[serde(default)]
    event_id: Option<String>,

    /// Details about the error
    error: ErrorDetails,
}

impl ErrorEvent {
    pub fn new(error: ErrorDetails) -> Self {
        Self {
            event_id: None,
            error,
        }
    }

    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    pub fn error(&self) -> &ErrorDetails {
        &self.error
    }
}

/// `call-start` event, sent once the call is live.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CallStartEvent {
    #[serde(default)]
    event_id: Option<String>,
    #[serde(default)]
    call_id: Option<String>,
}

impl CallStartEvent {
    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    pub fn call_id(&self) -> Option<&str> {
        self.call_id.as_deref()
    }
}

/// `call-end` event
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CallEndEvent {
    #[serde(default)]
    event_id: Option<String>,
    /// Why the gateway ended the call, if it says
    #[serde(default)]
    ended_reason: Option<String>,
}

impl CallEndEvent {
    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    pub fn ended_reason(&self) -> Option<&str> {
        self.ended_reason.as_deref()
    }
}

/// `message` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MessageEvent {
    #[serde(default)]
    event_id: Option<String>,
    message: TranscriptMessage,
}

impl MessageEvent {
    pub fn new(message: TranscriptMessage) -> Self {
        Self {
            event_id: None,
            message,
        }
    }

    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    pub fn message(&self) -> &TranscriptMessage {
        &self.message
    }

    pub fn into_message(self) -> TranscriptMessage {
        self.message
    }
}

/// `speech-start` / `speech-end` events for the assistant voice.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SpeechEvent {
    #[serde(default)]
    event_id: Option<String>,
}

impl SpeechEvent {
    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }
}

/// `volume-level` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VolumeLevelEvent {
    #[serde(default)]
    event_id: Option<String>,
    /// Assistant output level between 0.0 and 1.0
    volume: f32,
}

impl VolumeLevelEvent {
    pub fn volume(&self) -> f32 {
        self.volume
    }
}
