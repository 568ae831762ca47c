use crate::generic_types::ProviderMessage;
use serde::{Deserialize, Serialize};

/// Who said an utterance. Serialized with the names the feedback service
/// and the voice provider use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    Candidate,
    #[serde(rename = "assistant")]
    Panelist,
    #[serde(rename = "system")]
    System,
}

/// One finalized utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: Role,
    pub content: String,
}

impl TranscriptMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// The ordered, append-only conversation log of one call.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    messages: Vec<TranscriptMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the message if it is a final transcript and returns the
    /// appended entry. Partial fragments and non-transcript messages are
    /// dropped, as are transcripts missing a role or text.
    pub fn on_message_event(&mut self, message: &ProviderMessage) -> Option<&TranscriptMessage> {
        if !message.is_final_transcript() {
            return None;
        }
        let (Some(role), Some(text)) = (message.role, message.transcript.as_ref()) else {
            tracing::debug!("dropping malformed transcript message: {:?}", message);
            return None;
        };
        self.messages.push(TranscriptMessage::new(role, text.clone()));
        self.messages.last()
    }

    pub fn messages(&self) -> &[TranscriptMessage] {
        &self.messages
    }

    /// The most recent utterance, used for live captions.
    pub fn latest(&self) -> Option<&TranscriptMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn to_vec(&self) -> Vec<TranscriptMessage> {
        self.messages.clone()
    }
}

/// Coarse question-boundary heuristic: any panelist utterance containing a
/// question mark counts as a question having been asked.
pub fn is_question_boundary(message: &TranscriptMessage) -> bool {
    message.role == Role::Panelist && message.content.contains('?')
}
