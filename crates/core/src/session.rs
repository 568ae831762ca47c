use crate::feedback::{FeedbackDispatcher, FeedbackService, NavigationOutcome};
use crate::generic_types::{CallEvent, CallTarget, CallVariables, ProviderMessage};
use crate::navigation::{Navigator, Route};
use crate::panel::{
    Candidate, InterviewType, Panel, PanelistId, QuestionType, SpeakerContext, SpeakerCoordinator,
    SpeakerPolicy, expected_speaker,
};
use crate::progress::QuestionProgress;
use crate::scheduler::Scheduler;
use crate::transcript::{Transcript, TranscriptMessage, is_question_boundary};
use crate::voice_provider::{Subscription, VoiceProvider};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Upper bound on waiting for the provider to hang up before reusing it or
/// closing the session.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Pause between a panelist asking a question and the progress moving on.
pub const DEFAULT_QUESTION_ADVANCE_DELAY: Duration = Duration::from_millis(1500);
/// How long the "generating feedback" indicator stays up before navigating.
pub const DEFAULT_FEEDBACK_DISPLAY_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Inactive,
    Connecting,
    Active,
    Finished,
}

impl CallStatus {
    /// The only legal edges of the call lifecycle. `Connecting -> Inactive`
    /// is the failure path; a finished session is never reused.
    pub fn can_transition_to(self, next: CallStatus) -> bool {
        use CallStatus::*;
        matches!(
            (self, next),
            (Inactive, Connecting) | (Connecting, Active) | (Connecting, Inactive) | (Active, Finished)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionKind {
    /// An AI-driven workflow that interviews the user to generate a new
    /// question set. Nothing is evaluated afterwards.
    Generate { workflow_id: String },
    /// A scripted mock interview that is evaluated once it ends.
    Interview {
        assistant_id: String,
        questions: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub interview_id: String,
    pub user_id: String,
    pub user_name: String,
    pub job_role: String,
    pub interview_type: InterviewType,
    pub kind: SessionKind,
    pub feedback_id: Option<String>,
    pub question_advance_delay: Duration,
    pub feedback_display_delay: Duration,
}

impl SessionConfig {
    pub fn interview(
        interview_id: &str,
        user_id: &str,
        assistant_id: &str,
        questions: Vec<String>,
    ) -> Self {
        Self {
            interview_id: interview_id.to_string(),
            user_id: user_id.to_string(),
            user_name: "Candidate".to_string(),
            job_role: "Software Engineer".to_string(),
            interview_type: InterviewType::Mixed,
            kind: SessionKind::Interview {
                assistant_id: assistant_id.to_string(),
                questions,
            },
            feedback_id: None,
            question_advance_delay: DEFAULT_QUESTION_ADVANCE_DELAY,
            feedback_display_delay: DEFAULT_FEEDBACK_DISPLAY_DELAY,
        }
    }

    pub fn generate(user_id: &str, user_name: &str, workflow_id: &str) -> Self {
        Self {
            interview_id: format!("generate-{user_id}"),
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            job_role: "Software Engineer".to_string(),
            interview_type: InterviewType::Mixed,
            kind: SessionKind::Generate {
                workflow_id: workflow_id.to_string(),
            },
            feedback_id: None,
            question_advance_delay: DEFAULT_QUESTION_ADVANCE_DELAY,
            feedback_display_delay: DEFAULT_FEEDBACK_DISPLAY_DELAY,
        }
    }

    pub fn with_user_name(mut self, user_name: &str) -> Self {
        self.user_name = user_name.to_string();
        self
    }

    pub fn with_job_role(mut self, job_role: &str) -> Self {
        self.job_role = job_role.to_string();
        self
    }

    pub fn with_interview_type(mut self, interview_type: InterviewType) -> Self {
        self.interview_type = interview_type;
        self
    }

    pub fn with_feedback_id(mut self, feedback_id: &str) -> Self {
        self.feedback_id = Some(feedback_id.to_string());
        self
    }

    pub fn with_question_advance_delay(mut self, delay: Duration) -> Self {
        self.question_advance_delay = delay;
        self
    }

    pub fn with_feedback_display_delay(mut self, delay: Duration) -> Self {
        self.feedback_display_delay = delay;
        self
    }

    pub fn total_questions(&self) -> usize {
        match &self.kind {
            SessionKind::Generate { .. } => 0,
            SessionKind::Interview { questions, .. } => questions.len(),
        }
    }

    /// The provider target and template variables for this session.
    pub fn call_target(&self) -> (CallTarget, CallVariables) {
        let mut variables = CallVariables::new();
        match &self.kind {
            SessionKind::Generate { workflow_id } => {
                variables.insert("username".to_string(), self.user_name.clone());
                variables.insert("userid".to_string(), self.user_id.clone());
                (CallTarget::Workflow(workflow_id.clone()), variables)
            }
            SessionKind::Interview {
                assistant_id,
                questions,
            } => {
                variables.insert("questions".to_string(), format_questions(questions));
                (CallTarget::Assistant(assistant_id.clone()), variables)
            }
        }
    }
}

/// Renders the question list the way the interviewer assistant expects it:
/// one `- question` per line.
pub fn format_questions(questions: &[String]) -> String {
    questions
        .iter()
        .map(|q| format!("- {q}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The root aggregate of one interview attempt.
#[derive(Debug)]
pub struct CallSession {
    status: CallStatus,
    started_at: Option<DateTime<Utc>>,
    progress: QuestionProgress,
    transcript: Transcript,
}

impl CallSession {
    pub fn new(total_questions: usize) -> Self {
        Self {
            status: CallStatus::Inactive,
            started_at: None,
            progress: QuestionProgress::new(total_questions),
            transcript: Transcript::new(),
        }
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn progress(&self) -> &QuestionProgress {
        &self.progress
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.started_at.map(|started| Utc::now() - started)
    }

    /// Applies `next` if the lifecycle allows it. Going live stamps the start
    /// time and marks the first question as asked.
    pub fn transition(&mut self, next: CallStatus) -> bool {
        if !self.status.can_transition_to(next) {
            tracing::debug!("Ignoring transition {:?} -> {:?}", self.status, next);
            return false;
        }
        tracing::info!("Call status {:?} -> {:?}", self.status, next);
        self.status = next;
        if next == CallStatus::Active {
            self.started_at = Some(Utc::now());
            self.progress.begin();
        }
        true
    }
}

/// Everything the UI layer observes about a live session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub status: CallStatus,
    pub current_question_index: usize,
    pub total_questions: usize,
    pub question_type: QuestionType,
    pub speaking_person_id: Option<PanelistId>,
    pub expected_speaker: Option<PanelistId>,
    pub is_generating_feedback: bool,
    pub latest_message: Option<TranscriptMessage>,
    pub message_count: usize,
    pub candidate_muted: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub route: Option<Route>,
}

impl SessionSnapshot {
    fn initial(total_questions: usize) -> Self {
        Self {
            status: CallStatus::Inactive,
            current_question_index: 0,
            total_questions,
            question_type: QuestionType::None,
            speaking_person_id: None,
            expected_speaker: None,
            is_generating_feedback: false,
            latest_message: None,
            message_count: 0,
            candidate_muted: false,
            started_at: None,
            last_error: None,
            route: None,
        }
    }
}

#[derive(Debug)]
enum Input {
    Start,
    EndCall,
    ToggleMute,
    Exit,
    StartSettled {
        attempt: u64,
        result: anyhow::Result<()>,
    },
    AdvanceQuestion,
    FeedbackSettled(NavigationOutcome),
    Navigate(Route),
}

enum Next {
    Input(Option<Input>),
    Event(Option<CallEvent>),
}

/// The collaborators a session talks to.
pub struct CallDeps {
    pub provider: Arc<dyn VoiceProvider>,
    pub feedback: Arc<dyn FeedbackService>,
    pub navigator: Arc<dyn Navigator>,
    pub speaker_policy: Box<dyn SpeakerPolicy>,
}

/// Imperative entry points and observable state for the UI layer.
#[derive(Clone)]
pub struct CallHandle {
    tx: mpsc::UnboundedSender<Input>,
    state: watch::Receiver<SessionSnapshot>,
    panel: Arc<Panel>,
}

impl CallHandle {
    /// Join the call. A no-op unless the session is inactive.
    pub fn start(&self) -> bool {
        self.send(Input::Start)
    }

    /// Hang up. A no-op once the session is finished.
    pub fn end_call(&self) -> bool {
        self.send(Input::EndCall)
    }

    pub fn toggle_mute(&self) -> bool {
        self.send(Input::ToggleMute)
    }

    /// Leave the interview screen, tearing the session down.
    pub fn exit(&self) -> bool {
        self.send(Input::Exit)
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Resolves with the first snapshot matching `predicate`, or `None` if
    /// the session closed without ever matching.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Option<SessionSnapshot> {
        let mut rx = self.state.clone();
        rx.wait_for(predicate).await.ok().map(|s| s.clone())
    }

    fn send(&self, input: Input) -> bool {
        self.tx.send(input).is_ok()
    }
}

/// Drives one interview call from connection to navigation.
///
/// The controller is the single owner of the session state. Provider events,
/// user commands, delayed work and async completions are all funnelled into
/// one loop and handled to completion one at a time, in arrival order.
pub struct CallController {
    config: SessionConfig,
    session: CallSession,
    panel: Arc<Panel>,
    candidate: Candidate,
    speakers: SpeakerCoordinator,
    provider: Arc<dyn VoiceProvider>,
    dispatcher: FeedbackDispatcher,
    navigator: Arc<dyn Navigator>,
    scheduler: Scheduler<Input>,
    inputs: mpsc::WeakUnboundedSender<Input>,
    inputs_rx: mpsc::UnboundedReceiver<Input>,
    state_tx: watch::Sender<SessionSnapshot>,
    subscription: Option<Subscription>,
    attempt: u64,
    abandoned_call_ends: usize,
    stopping: Option<JoinHandle<()>>,
    is_generating_feedback: bool,
    feedback_dispatched: bool,
    last_error: Option<String>,
    route: Option<Route>,
}

impl CallController {
    pub fn new(config: SessionConfig, deps: CallDeps) -> (Self, CallHandle) {
        let (tx, inputs_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) =
            watch::channel(SessionSnapshot::initial(config.total_questions()));
        let panel = Arc::new(Panel::generate(&config.interview_id, &config.job_role));

        let controller = Self {
            session: CallSession::new(config.total_questions()),
            candidate: Candidate::new(config.user_name.clone()),
            panel: panel.clone(),
            speakers: SpeakerCoordinator::new(deps.speaker_policy),
            provider: deps.provider,
            dispatcher: FeedbackDispatcher::new(deps.feedback),
            navigator: deps.navigator,
            scheduler: Scheduler::new(tx.downgrade()),
            inputs: tx.downgrade(),
            inputs_rx,
            state_tx,
            subscription: None,
            attempt: 0,
            abandoned_call_ends: 0,
            stopping: None,
            is_generating_feedback: false,
            feedback_dispatched: false,
            last_error: None,
            route: None,
            config,
        };
        controller.publish();

        let handle = CallHandle {
            tx,
            state: state_rx,
            panel,
        };
        (controller, handle)
    }

    /// Runs the session until it navigates away, the user exits, or every
    /// handle is dropped. Returns the route taken, if any.
    pub async fn run(mut self) -> Option<Route> {
        self.subscription = Some(self.provider.subscribe());
        tracing::info!(
            "Interview session {} ready with {} panelists",
            self.config.interview_id,
            self.panel.len()
        );

        loop {
            let next = tokio::select! {
                input = self.inputs_rx.recv() => Next::Input(input),
                event = next_event(&mut self.subscription) => Next::Event(event),
            };
            let flow = match next {
                Next::Input(Some(input)) => self.handle_input(input),
                Next::Input(None) => {
                    tracing::debug!("All session handles dropped");
                    ControlFlow::Break(())
                }
                Next::Event(Some(event)) => self.handle_event(event),
                Next::Event(None) => {
                    tracing::warn!("Voice provider event stream closed");
                    self.subscription = None;
                    ControlFlow::Continue(())
                }
            };
            if flow.is_break() {
                break;
            }
        }

        self.teardown().await;
        self.route.clone()
    }

    fn handle_input(&mut self, input: Input) -> ControlFlow<()> {
        match input {
            Input::Start => self.start_call(),
            Input::EndCall => return self.end_call(),
            Input::ToggleMute => {
                let muted = self.candidate.toggle_mute();
                tracing::info!("Candidate microphone {}", if muted { "muted" } else { "live" });
            }
            Input::Exit => {
                tracing::info!("Leaving interview {}", self.config.interview_id);
                return ControlFlow::Break(());
            }
            Input::StartSettled { attempt, result } => self.on_start_settled(attempt, result),
            Input::AdvanceQuestion => self.advance_question(),
            Input::FeedbackSettled(outcome) => return self.on_feedback_settled(outcome),
            Input::Navigate(route) => return self.navigate(route),
        }
        self.publish();
        ControlFlow::Continue(())
    }

    fn handle_event(&mut self, event: CallEvent) -> ControlFlow<()> {
        tracing::debug!("Provider event: {:?}", event);
        match event {
            CallEvent::CallStarted => {
                if self.set_status(CallStatus::Active) {
                    self.abandoned_call_ends = 0;
                    tracing::info!(
                        "Call is live, question {}/{}",
                        self.session.progress.current(),
                        self.session.progress.total()
                    );
                }
            }
            CallEvent::CallEnded => match self.session.status {
                CallStatus::Active => {
                    self.set_status(CallStatus::Finished);
                    return self.on_finished();
                }
                // The hang-up of an abandoned attempt, not of the one in flight.
                CallStatus::Inactive | CallStatus::Connecting if self.abandoned_call_ends > 0 => {
                    self.abandoned_call_ends -= 1;
                    tracing::debug!("Ignoring call end from an abandoned attempt");
                }
                CallStatus::Connecting => {
                    tracing::warn!("Call ended before it connected");
                    self.last_error = Some("call ended before it connected".to_string());
                    self.set_status(CallStatus::Inactive);
                }
                status => tracing::debug!("Ignoring call end while {:?}", status),
            },
            CallEvent::Message(message) => self.on_message(&message),
            CallEvent::SpeechStarted => {
                let status = self.session.status;
                let question_index = self.session.progress.current();
                let question_type = self.config.interview_type.question_type(question_index);
                let expected = expected_speaker(&self.panel, status, question_type);
                let context = SpeakerContext {
                    panel: &self.panel,
                    expected: expected.as_ref(),
                    question_index,
                };
                self.speakers.on_speech_start(status, &context);
            }
            CallEvent::SpeechEnded => self.speakers.on_speech_end(),
            CallEvent::Error(message) => {
                tracing::warn!("Voice provider error: {}", message);
                self.last_error = Some(message);
            }
        }
        self.publish();
        ControlFlow::Continue(())
    }

    fn start_call(&mut self) {
        if self.session.status != CallStatus::Inactive {
            tracing::debug!("Start ignored while {:?}", self.session.status);
            return;
        }
        let Some(tx) = self.inputs.upgrade() else {
            return;
        };
        self.last_error = None;
        self.attempt += 1;
        self.set_status(CallStatus::Connecting);

        let attempt = self.attempt;
        let (target, variables) = self.config.call_target();
        tracing::info!("Starting call attempt {} with {:?}", attempt, target);
        let provider = self.provider.clone();
        let pending_stop = self.stopping.take();
        tokio::spawn(async move {
            // A hang-up from an abandoned attempt must reach the provider first.
            if let Some(stop) = pending_stop {
                wait_for_stop(stop).await;
            }
            let result = provider.start(target, variables).await;
            if tx.send(Input::StartSettled { attempt, result }).is_err() {
                tracing::debug!("Call start settled after the session closed");
            }
        });
    }

    fn on_start_settled(&mut self, attempt: u64, result: anyhow::Result<()>) {
        if attempt != self.attempt {
            tracing::debug!("Discarding result of abandoned call attempt {}", attempt);
            return;
        }
        match result {
            Ok(()) => tracing::debug!("Provider accepted the call request"),
            Err(e) if self.session.status == CallStatus::Connecting => {
                tracing::error!("Failed to start call: {:?}", e);
                self.last_error = Some(format!("{e:#}"));
                self.set_status(CallStatus::Inactive);
            }
            Err(e) => {
                tracing::warn!(
                    "Call start failed after status moved to {:?}: {:?}",
                    self.session.status,
                    e
                );
            }
        }
    }

    fn end_call(&mut self) -> ControlFlow<()> {
        match self.session.status {
            CallStatus::Active => {
                self.set_status(CallStatus::Finished);
                self.stop_provider();
                self.on_finished()
            }
            CallStatus::Connecting => {
                tracing::info!("Abandoning call attempt {}", self.attempt);
                // Late results of this attempt are stale from here on.
                self.attempt += 1;
                self.abandoned_call_ends += 1;
                self.stop_provider();
                self.set_status(CallStatus::Inactive);
                self.publish();
                ControlFlow::Continue(())
            }
            status => {
                tracing::debug!("End call ignored while {:?}", status);
                ControlFlow::Continue(())
            }
        }
    }

    fn on_message(&mut self, message: &ProviderMessage) {
        let status = self.session.status;
        if !matches!(status, CallStatus::Connecting | CallStatus::Active) {
            tracing::debug!("Dropping message while {:?}", status);
            return;
        }
        let Some(appended) = self.session.transcript.on_message_event(message) else {
            return;
        };
        tracing::debug!("{:?}: {}", appended.role, appended.content);

        if is_question_boundary(appended) && status == CallStatus::Active {
            self.scheduler
                .schedule(self.config.question_advance_delay, Input::AdvanceQuestion);
        }
    }

    fn advance_question(&mut self) {
        if self.session.status != CallStatus::Active {
            tracing::debug!("Question advance dropped while {:?}", self.session.status);
            return;
        }
        if self.session.progress.advance() {
            tracing::info!(
                "Question {}/{}",
                self.session.progress.current(),
                self.session.progress.total()
            );
        }
    }

    // Runs exactly once, on the transition into Finished.
    fn on_finished(&mut self) -> ControlFlow<()> {
        self.scheduler.cancel_pending();
        if self.feedback_dispatched {
            return ControlFlow::Continue(());
        }
        self.feedback_dispatched = true;

        if let SessionKind::Generate { .. } = self.config.kind {
            tracing::info!("Question generation call finished");
            return self.navigate(Route::Home);
        }
        if self.session.transcript.is_empty() {
            tracing::info!("Call finished without a transcript, skipping feedback");
            return self.navigate(Route::Home);
        }
        let Some(tx) = self.inputs.upgrade() else {
            return self.navigate(Route::Home);
        };

        self.is_generating_feedback = true;
        self.publish();

        let dispatcher = self.dispatcher.clone();
        let transcript = self.session.transcript.to_vec();
        let interview_id = self.config.interview_id.clone();
        let user_id = self.config.user_id.clone();
        let feedback_id = self.config.feedback_id.clone();
        tokio::spawn(async move {
            let outcome = dispatcher
                .dispatch(transcript, &interview_id, &user_id, feedback_id.as_deref())
                .await;
            if tx.send(Input::FeedbackSettled(outcome)).is_err() {
                tracing::debug!("Feedback settled after the session closed, discarding");
            }
        });
        ControlFlow::Continue(())
    }

    fn on_feedback_settled(&mut self, outcome: NavigationOutcome) -> ControlFlow<()> {
        let route = outcome.route(&self.config.interview_id);
        match outcome {
            NavigationOutcome::FeedbackReady { .. } => {
                let scheduled = self
                    .scheduler
                    .schedule(self.config.feedback_display_delay, Input::Navigate(route.clone()));
                if !scheduled {
                    return self.navigate(route);
                }
                self.publish();
                ControlFlow::Continue(())
            }
            NavigationOutcome::Home => self.navigate(route),
        }
    }

    fn navigate(&mut self, route: Route) -> ControlFlow<()> {
        self.is_generating_feedback = false;
        tracing::info!("Navigating to {}", route.path());
        self.navigator.go_to(&route);
        self.route = Some(route);
        self.publish();
        ControlFlow::Break(())
    }

    async fn teardown(&mut self) {
        self.scheduler.cancel_pending();
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        if matches!(
            self.session.status,
            CallStatus::Active | CallStatus::Connecting
        ) {
            self.stop_provider();
        }
        if let Some(stop) = self.stopping.take() {
            wait_for_stop(stop).await;
        }
        self.speakers.on_speech_end();
        self.publish();
        tracing::info!("Interview session {} closed", self.config.interview_id);
    }

    // Hanging up runs beside the loop so a slow provider never blocks inputs.
    fn stop_provider(&mut self) {
        let provider = self.provider.clone();
        let previous = self.stopping.take();
        self.stopping = Some(tokio::spawn(async move {
            if let Some(previous) = previous {
                wait_for_stop(previous).await;
            }
            if let Err(e) = provider.stop().await {
                tracing::warn!("Failed to stop call: {:?}", e);
            }
        }));
    }

    fn set_status(&mut self, next: CallStatus) -> bool {
        let moved = self.session.transition(next);
        if moved {
            self.speakers.on_status(next);
        }
        moved
    }

    fn snapshot(&self) -> SessionSnapshot {
        let status = self.session.status;
        let current = self.session.progress.current();
        let question_type = self.config.interview_type.question_type(current);
        SessionSnapshot {
            status,
            current_question_index: current,
            total_questions: self.session.progress.total(),
            question_type,
            speaking_person_id: self.speakers.speaking_person_id().cloned(),
            expected_speaker: expected_speaker(&self.panel, status, question_type),
            is_generating_feedback: self.is_generating_feedback,
            latest_message: self.session.transcript.latest().cloned(),
            message_count: self.session.transcript.len(),
            candidate_muted: self.candidate.muted,
            started_at: self.session.started_at,
            last_error: self.last_error.clone(),
            route: self.route.clone(),
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.snapshot());
    }
}

async fn wait_for_stop(stop: JoinHandle<()>) {
    if tokio::time::timeout(STOP_GRACE, stop).await.is_err() {
        tracing::warn!("Voice provider did not hang up within {:?}", STOP_GRACE);
    }
}

async fn next_event(subscription: &mut Option<Subscription>) -> Option<CallEvent> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::MockFeedbackService;
    use crate::panel::ExpectedSpeakerPolicy;
    use crate::voice_provider::{EventHub, MockVoiceProvider};

    struct NoNavigation;

    impl Navigator for NoNavigation {
        fn go_to(&self, _route: &Route) {}
    }

    #[test]
    fn test_only_lifecycle_edges_are_allowed() {
        use CallStatus::*;
        let all = [Inactive, Connecting, Active, Finished];
        let allowed = [
            (Inactive, Connecting),
            (Connecting, Active),
            (Connecting, Inactive),
            (Active, Finished),
        ];
        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_going_live_stamps_start_and_first_question() {
        let mut session = CallSession::new(4);
        assert!(!session.transition(CallStatus::Active));
        assert!(session.transition(CallStatus::Connecting));
        assert!(session.started_at().is_none());

        assert!(session.transition(CallStatus::Active));
        assert!(session.started_at().is_some());
        assert!(session.elapsed().is_some());
        assert_eq!(session.progress().current(), 1);

        assert!(session.transition(CallStatus::Finished));
        assert!(!session.transition(CallStatus::Active));
        assert_eq!(session.status(), CallStatus::Finished);
    }

    #[test]
    fn test_interview_target_formats_questions() {
        let config = SessionConfig::interview(
            "iv-1",
            "u-1",
            "asst-1",
            vec!["Why Rust?".to_string(), "Explain ownership.".to_string()],
        );
        let (target, variables) = config.call_target();

        assert_eq!(target, CallTarget::Assistant("asst-1".to_string()));
        assert_eq!(
            variables.get("questions").map(String::as_str),
            Some("- Why Rust?\n- Explain ownership.")
        );
        assert_eq!(config.total_questions(), 2);
    }

    #[test]
    fn test_generate_target_passes_user_variables() {
        let config = SessionConfig::generate("u-9", "Robin", "wf-1");
        let (target, variables) = config.call_target();

        assert_eq!(target, CallTarget::Workflow("wf-1".to_string()));
        assert_eq!(variables.get("username").map(String::as_str), Some("Robin"));
        assert_eq!(variables.get("userid").map(String::as_str), Some("u-9"));
        assert_eq!(config.total_questions(), 0);
    }

    #[test]
    fn test_session_loop_can_be_spawned() {
        fn assert_send<T: Send>(_: &T) {}

        let config = SessionConfig::interview("iv-1", "u-1", "asst-1", vec![]);
        let (controller, _handle) = CallController::new(
            config,
            CallDeps {
                provider: Arc::new(MockVoiceProvider::new()),
                feedback: Arc::new(MockFeedbackService::new()),
                navigator: Arc::new(NoNavigation),
                speaker_policy: Box::new(crate::panel::RandomSpeakerPolicy::seeded(7)),
            },
        );
        let run = controller.run();
        assert_send(&run);
    }

    #[tokio::test]
    async fn test_provider_rejection_returns_to_inactive() {
        let hub = EventHub::new();
        let mut provider = MockVoiceProvider::new();
        provider
            .expect_subscribe()
            .times(1)
            .returning(move || hub.subscribe());
        provider
            .expect_start()
            .withf(|target, variables| {
                target.id() == "asst-1" && variables.contains_key("questions")
            })
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("assistant not found")));
        provider.expect_stop().never();
        let mut feedback = MockFeedbackService::new();
        feedback.expect_create_feedback().never();

        let config =
            SessionConfig::interview("iv-1", "u-1", "asst-1", vec!["Why Rust?".to_string()]);
        let (controller, handle) = CallController::new(
            config,
            CallDeps {
                provider: Arc::new(provider),
                feedback: Arc::new(feedback),
                navigator: Arc::new(NoNavigation),
                speaker_policy: Box::new(ExpectedSpeakerPolicy),
            },
        );
        let task = tokio::spawn(controller.run());

        assert!(handle.start());
        let snapshot = handle.wait_for(|s| s.last_error.is_some()).await.unwrap();
        assert_eq!(snapshot.status, CallStatus::Inactive);
        assert_eq!(snapshot.last_error.as_deref(), Some("assistant not found"));

        handle.exit();
        assert_eq!(task.await.unwrap(), None);
    }
}
