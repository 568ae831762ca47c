#![allow(dead_code)]

use anyhow::{Result, bail};
use async_trait::async_trait;
use interview_core::feedback::{FeedbackRequest, FeedbackResult};
use interview_core::{
    CallController, CallDeps, CallEvent, CallHandle, CallTarget, CallVariables, EventHub,
    ExpectedSpeakerPolicy, FeedbackService, Navigator, Route, SessionConfig, SessionSnapshot,
    Subscription, VoiceProvider,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// A voice provider whose events are pushed by the test through its hub.
#[derive(Default)]
pub struct FakeProvider {
    pub hub: EventHub,
    pub starts: Mutex<Vec<(CallTarget, CallVariables)>>,
    pub stops: AtomicUsize,
    pub fail_start: bool,
    pub stop_hangs: bool,
    /// Per-attempt latency and outcome of `start`, consumed in order.
    pub scripted_starts: Mutex<VecDeque<(Duration, Result<(), &'static str>)>>,
}

impl FakeProvider {
    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }

    pub fn scripted(starts: Vec<(Duration, Result<(), &'static str>)>) -> Self {
        Self {
            scripted_starts: Mutex::new(starts.into()),
            ..Self::default()
        }
    }

    pub fn hanging_stop() -> Self {
        Self {
            stop_hangs: true,
            ..Self::default()
        }
    }

    pub fn emit(&self, event: CallEvent) {
        self.hub.publish(event);
    }

    pub fn start_count(&self) -> usize {
        self.starts.lock().unwrap().len()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceProvider for FakeProvider {
    async fn start(&self, target: CallTarget, variables: CallVariables) -> Result<()> {
        self.starts.lock().unwrap().push((target, variables));
        let scripted = self.scripted_starts.lock().unwrap().pop_front();
        if let Some((latency, outcome)) = scripted {
            tokio::time::sleep(latency).await;
            return outcome.map_err(|e| anyhow::anyhow!(e));
        }
        if self.fail_start {
            bail!("microphone permission denied");
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.stop_hangs {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        self.hub.subscribe()
    }
}

pub enum Reply {
    Ready(&'static str),
    Unsuccessful,
    Unreachable,
}

pub struct FakeFeedback {
    pub reply: Reply,
    pub latency: Duration,
    pub requests: Mutex<Vec<FeedbackRequest>>,
}

impl FakeFeedback {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            latency: Duration::from_millis(300),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl FeedbackService for FakeFeedback {
    async fn create_feedback(&self, request: FeedbackRequest) -> Result<FeedbackResult> {
        self.requests.lock().unwrap().push(request);
        tokio::time::sleep(self.latency).await;
        match self.reply {
            Reply::Ready(id) => Ok(FeedbackResult {
                success: true,
                feedback_id: Some(id.to_string()),
            }),
            Reply::Unsuccessful => Ok(FeedbackResult {
                success: false,
                feedback_id: None,
            }),
            Reply::Unreachable => bail!("feedback service unavailable"),
        }
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn go_to(&self, route: &Route) {
        self.routes.lock().unwrap().push(route.clone());
    }
}

pub struct Harness {
    pub handle: CallHandle,
    pub provider: Arc<FakeProvider>,
    pub feedback: Arc<FakeFeedback>,
    pub navigator: Arc<RecordingNavigator>,
    task: Mutex<Option<JoinHandle<Option<Route>>>>,
}

impl Harness {
    pub fn spawn(config: SessionConfig, provider: FakeProvider, feedback: FakeFeedback) -> Self {
        Self::spawn_shared(config, Arc::new(provider), feedback)
    }

    pub fn spawn_shared(
        config: SessionConfig,
        provider: Arc<FakeProvider>,
        feedback: FakeFeedback,
    ) -> Self {
        let feedback = Arc::new(feedback);
        let navigator = Arc::new(RecordingNavigator::default());
        let deps = CallDeps {
            provider: provider.clone(),
            feedback: feedback.clone(),
            navigator: navigator.clone(),
            speaker_policy: Box::new(ExpectedSpeakerPolicy),
        };
        let (controller, handle) = CallController::new(config, deps);
        let task = tokio::spawn(controller.run());
        Self {
            handle,
            provider,
            feedback,
            navigator,
            task: Mutex::new(Some(task)),
        }
    }

    /// Waits for a matching snapshot, failing the test instead of hanging.
    pub async fn until(&self, predicate: impl FnMut(&SessionSnapshot) -> bool) -> SessionSnapshot {
        tokio::time::timeout(Duration::from_secs(60), self.handle.wait_for(predicate))
            .await
            .expect("timed out waiting for session state")
            .expect("session closed before reaching the expected state")
    }

    /// Waits for the session task to return its route.
    pub async fn finish(&self) -> Option<Route> {
        let task = self.task.lock().unwrap().take().expect("session already finished");
        tokio::time::timeout(Duration::from_secs(60), task)
            .await
            .expect("session did not finish")
            .expect("session task panicked")
    }
}

pub fn questions() -> Vec<String> {
    vec![
        "What is your experience with caching?".to_string(),
        "Tell me about a conflict with a teammate.".to_string(),
        "How would you design a rate limiter?".to_string(),
    ]
}

pub fn interview_config() -> SessionConfig {
    SessionConfig::interview("iv-1", "u-1", "asst-1", questions())
        .with_user_name("Sam")
        .with_job_role("Backend Engineer")
}
