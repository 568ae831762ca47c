use anyhow::{Context, Result};
use async_trait::async_trait;
use interview_core::generic_types::{
    CallEvent, CallTarget, CallVariables, ProviderMessage, TranscriptType,
};
use interview_core::transcript::Role;
use interview_core::voice_provider::{EventHub, Subscription, VoiceProvider};
use tokio::sync::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use voice_call::types::events::client::CallStartRequestEvent;
use voice_call::types::{MessageRole, ServerEvent, TranscriptMessage, VariableValues};
use voice_call::{CallClient, ServerRx};

pub const EVENT_CAPACITY: usize = 1024;

/// An adapter that implements the generic `VoiceProvider` trait for the
/// voice gateway client. It is generic over `CallClient` so the underlying
/// connection can be mocked in tests.
pub struct GatewayAdapter<C: CallClient> {
    client: Mutex<C>,
    hub: EventHub,
    forwarder: JoinHandle<()>,
}

impl GatewayAdapter<voice_call::Client> {
    pub async fn connect(config: voice_call::Config) -> Result<Self> {
        let client = voice_call::connect_with_config(EVENT_CAPACITY, config)
            .await
            .context("Failed to connect to the voice gateway")?;
        Self::new(client).await
    }
}

impl<C: CallClient> GatewayAdapter<C> {
    pub async fn new(mut client: C) -> Result<Self> {
        let server_rx = client
            .server_events()
            .await
            .context("Failed to subscribe to gateway events")?;
        let hub = EventHub::new();
        let forwarder = tokio::spawn(forward(server_rx, hub.clone()));
        Ok(Self {
            client: Mutex::new(client),
            hub,
            forwarder,
        })
    }
}

impl<C: CallClient> Drop for GatewayAdapter<C> {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

#[async_trait]
impl<C: CallClient + 'static> VoiceProvider for GatewayAdapter<C> {
    async fn start(&self, target: CallTarget, variables: CallVariables) -> Result<()> {
        let mut values = VariableValues::new();
        for (key, value) in &variables {
            values.insert(key, value);
        }
        let request = match &target {
            CallTarget::Workflow(id) => CallStartRequestEvent::workflow(id),
            CallTarget::Assistant(id) => CallStartRequestEvent::assistant(id),
        }
        .with_variables(values);

        self.client
            .lock()
            .await
            .start_call(request)
            .await
            .with_context(|| format!("Failed to start call with {}", target.id()))
    }

    async fn stop(&self) -> Result<()> {
        self.client
            .lock()
            .await
            .stop_call()
            .await
            .context("Failed to stop call")
    }

    fn subscribe(&self) -> Subscription {
        self.hub.subscribe()
    }
}

async fn forward(mut server_rx: ServerRx, hub: EventHub) {
    loop {
        match server_rx.recv().await {
            Ok(event) => {
                if let Some(event) = translate(event) {
                    hub.publish(event);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Gateway event forwarder lagged, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => {
                tracing::info!("Gateway event stream closed, stopping forwarder");
                break;
            }
        }
    }
}

/// Maps a gateway event onto the provider-neutral event set. Events the
/// session has no use for map to `None`.
pub fn translate(event: ServerEvent) -> Option<CallEvent> {
    match event {
        ServerEvent::CallStart(data) => {
            tracing::debug!("Call started: {:?}", data.call_id());
            Some(CallEvent::CallStarted)
        }
        ServerEvent::CallEnd(data) => {
            tracing::info!("Call ended: {}", data.ended_reason().unwrap_or("no reason given"));
            Some(CallEvent::CallEnded)
        }
        ServerEvent::Message(data) => Some(CallEvent::Message(provider_message(data.into_message()))),
        ServerEvent::SpeechStart(_) => Some(CallEvent::SpeechStarted),
        ServerEvent::SpeechEnd(_) => Some(CallEvent::SpeechEnded),
        ServerEvent::Error(data) => Some(CallEvent::Error(data.error().message().to_string())),
        // A dropped connection ends whatever call was running on it.
        ServerEvent::Close { reason } => {
            tracing::info!("Gateway connection closed: {:?}", reason);
            Some(CallEvent::CallEnded)
        }
        ServerEvent::VolumeLevel(_) => None,
    }
}

fn provider_message(message: TranscriptMessage) -> ProviderMessage {
    ProviderMessage {
        kind: message.kind().to_string(),
        transcript_type: message.transcript_type().map(|t| match t {
            voice_call::types::TranscriptType::Partial => TranscriptType::Partial,
            voice_call::types::TranscriptType::Final => TranscriptType::Final,
        }),
        role: message.role().map(|role| match role {
            MessageRole::User => Role::Candidate,
            MessageRole::Assistant => Role::Panelist,
            MessageRole::System => Role::System,
        }),
        transcript: message.text().map(str::to_string),
    }
}
