/// Who produced an utterance, as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// Whether a transcript fragment is still being revised by the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptType {
    Partial,
    Final,
}

/// Payload of a `message` server event.
///
/// The gateway multiplexes several message kinds over the same event
/// (`transcript`, `status-update`, `function-call`, ...). Only the fields a
/// transcript carries are modelled; everything is optional so unknown kinds
/// still deserialize and can be discarded by the consumer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    transcript_type: Option<TranscriptType>,
    #[serde(default)]
    role: Option<MessageRole>,
    #[serde(default)]
    transcript: Option<String>,
}

impl TranscriptMessage {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            transcript_type: None,
            role: None,
            transcript: None,
        }
    }

    /// Shorthand for a `transcript` message.
    pub fn transcript(role: MessageRole, transcript_type: TranscriptType, text: &str) -> Self {
        Self::new("transcript")
            .with_role(role)
            .with_transcript_type(transcript_type)
            .with_text(text)
    }

    pub fn with_role(mut self, role: MessageRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_transcript_type(mut self, transcript_type: TranscriptType) -> Self {
        self.transcript_type = Some(transcript_type);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.transcript = Some(text.to_string());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn transcript_type(&self) -> Option<TranscriptType> {
        self.transcript_type
    }

    pub fn role(&self) -> Option<MessageRole> {
        self.role
    }

    pub fn text(&self) -> Option<&str> {
        self.transcript.as_deref()
    }
}
