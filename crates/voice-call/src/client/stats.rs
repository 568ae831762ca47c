/// Running counters for the traffic seen on one gateway connection.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Stats {
    events_received: u64,
    messages_received: u64,
    errors_received: u64,
}

impl Stats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, event: &crate::types::ServerEvent) {
        self.events_received += 1;
        match event {
            crate::types::ServerEvent::Message(_) => self.messages_received += 1,
            crate::types::ServerEvent::Error(_) => self.errors_received += 1,
            _ => {}
        }
    }

    pub fn events_received(&self) -> u64 {
        self.events_received
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received
    }

    pub fn errors_received(&self) -> u64 {
        self.errors_received
    }
}
