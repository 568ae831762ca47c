pub mod feedback;
pub mod generic_types;
pub mod navigation;
pub mod panel;
pub mod progress;
pub mod scheduler;
pub mod session;
pub mod transcript;
pub mod voice_provider;

pub use feedback::{FeedbackClient, FeedbackDispatcher, FeedbackService, NavigationOutcome};
pub use generic_types::{CallEvent, CallTarget, CallVariables, ProviderMessage, TranscriptType};
pub use navigation::{Navigator, Route};
pub use panel::{
    Candidate, ExpectedSpeakerPolicy, InterviewType, Panel, PanelistId, QuestionType,
    RandomSpeakerPolicy, SpeakerPolicy,
};
pub use session::{
    CallController, CallDeps, CallHandle, CallStatus, SessionConfig, SessionKind, SessionSnapshot,
};
pub use transcript::{Role, Transcript, TranscriptMessage};
pub use voice_provider::{EventHub, Subscription, VoiceProvider};
