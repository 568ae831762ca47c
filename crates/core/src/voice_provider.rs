use crate::generic_types::{CallEvent, CallTarget, CallVariables};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc;

/// A trait abstracting the external real-time voice call provider.
///
/// The session never talks to a concrete SDK; it starts and stops calls
/// through this trait and consumes the provider's events through a scoped
/// [`Subscription`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    /// Dials the target. Resolves once the provider accepted the request,
    /// which is not the same as the call being live (`CallEvent::CallStarted`).
    async fn start(&self, target: CallTarget, variables: CallVariables) -> Result<()>;

    /// Hangs up the current call.
    async fn stop(&self) -> Result<()>;

    /// Registers a listener for provider events. The listener is removed
    /// when the returned subscription is dropped.
    fn subscribe(&self) -> Subscription;
}

type Listeners = Mutex<Registry>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: BTreeMap<u64, mpsc::UnboundedSender<CallEvent>>,
}

/// Fan-out point between a provider connection and its listeners.
///
/// Providers publish into the hub; every live [`Subscription`] receives each
/// event in emission order.
#[derive(Clone, Default)]
pub struct EventHub {
    registry: Arc<Listeners>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = match self.registry.lock() {
            Ok(mut registry) => {
                let id = registry.next_id;
                registry.next_id += 1;
                registry.listeners.insert(id, tx);
                id
            }
            Err(_) => {
                tracing::error!("event hub registry poisoned, subscription will be inert");
                u64::MAX
            }
        };
        Subscription {
            id,
            rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Delivers `event` to every listener and returns how many received it.
    pub fn publish(&self, event: CallEvent) -> usize {
        let Ok(mut registry) = self.registry.lock() else {
            tracing::error!("event hub registry poisoned, dropping {:?}", event);
            return 0;
        };
        // Listeners whose receiver is gone are pruned as we go.
        registry
            .listeners
            .retain(|_, tx| tx.send(event.clone()).is_ok());
        registry.listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.registry
            .lock()
            .map(|registry| registry.listeners.len())
            .unwrap_or(0)
    }
}

/// A scoped registration on an [`EventHub`].
///
/// Dropping the subscription unregisters it, so every exit path of its owner
/// releases the listener.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<CallEvent>,
    registry: Weak<Listeners>,
}

impl Subscription {
    /// Waits for the next event. Returns `None` once the hub is gone and all
    /// buffered events were consumed.
    pub async fn recv(&mut self) -> Option<CallEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<CallEvent> {
        self.rx.try_recv().ok()
    }

    /// Explicitly releases the listener. Equivalent to dropping it.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut registry) = registry.lock() {
                registry.listeners.remove(&self.id);
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic_types::ProviderMessage;
    use crate::transcript::Role;

    #[tokio::test]
    async fn test_events_are_delivered_in_emission_order() {
        let hub = EventHub::new();
        let mut sub = hub.subscribe();

        hub.publish(CallEvent::CallStarted);
        hub.publish(CallEvent::Message(ProviderMessage::final_transcript(
            Role::Panelist,
            "Hello there.",
        )));
        hub.publish(CallEvent::CallEnded);

        assert_eq!(sub.recv().await, Some(CallEvent::CallStarted));
        assert!(matches!(sub.recv().await, Some(CallEvent::Message(_))));
        assert_eq!(sub.recv().await, Some(CallEvent::CallEnded));
    }

    #[test]
    fn test_dropping_subscription_releases_listener() {
        let hub = EventHub::new();
        let first = hub.subscribe();
        let second = hub.subscribe();
        assert_eq!(hub.listener_count(), 2);

        drop(first);
        assert_eq!(hub.listener_count(), 1);

        second.unsubscribe();
        assert_eq!(hub.listener_count(), 0);
        assert_eq!(hub.publish(CallEvent::SpeechStarted), 0);
    }

    #[test]
    fn test_repeated_sessions_do_not_leak_listeners() {
        let hub = EventHub::new();
        for _ in 0..10 {
            let mut sub = hub.subscribe();
            hub.publish(CallEvent::CallStarted);
            assert_eq!(sub.try_recv(), Some(CallEvent::CallStarted));
        }
        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_subscription_ends_when_hub_is_dropped() {
        let hub = EventHub::new();
        let mut sub = hub.subscribe();
        hub.publish(CallEvent::SpeechEnded);
        drop(hub);

        assert_eq!(sub.recv().await, Some(CallEvent::SpeechEnded));
        assert_eq!(sub.recv().await, None);
    }
}
