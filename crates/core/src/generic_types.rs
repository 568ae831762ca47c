use crate::transcript::Role;
use std::collections::BTreeMap;

/// Template variables handed to the provider when a call starts.
pub type CallVariables = BTreeMap<String, String>;

/// What the provider should dial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// A fully AI-driven workflow that generates the interview questions itself.
    Workflow(String),
    /// A scripted assistant that asks the questions passed in the variables.
    Assistant(String),
}

impl CallTarget {
    pub fn id(&self) -> &str {
        match self {
            CallTarget::Workflow(id) | CallTarget::Assistant(id) => id,
        }
    }
}

/// Whether a transcript fragment is final or still being revised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptType {
    Partial,
    Final,
}

/// A `message` event as emitted by any voice provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderMessage {
    pub kind: String,
    pub transcript_type: Option<TranscriptType>,
    pub role: Option<Role>,
    pub transcript: Option<String>,
}

impl ProviderMessage {
    pub fn transcript(role: Role, transcript_type: TranscriptType, text: &str) -> Self {
        Self {
            kind: "transcript".to_string(),
            transcript_type: Some(transcript_type),
            role: Some(role),
            transcript: Some(text.to_string()),
        }
    }

    /// Shorthand for a finalized utterance.
    pub fn final_transcript(role: Role, text: &str) -> Self {
        Self::transcript(role, TranscriptType::Final, text)
    }

    pub fn is_final_transcript(&self) -> bool {
        self.kind == "transcript" && self.transcript_type == Some(TranscriptType::Final)
    }
}

/// Generic events that any voice provider can emit back to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    CallStarted,
    CallEnded,
    Message(ProviderMessage),
    SpeechStarted,
    SpeechEnded,
    Error(String),
}
