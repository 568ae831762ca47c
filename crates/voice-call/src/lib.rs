mod client;

pub use voice_call_types as types;
pub use client::{CallClient, Client, ServerRx, Stats, connect, connect_with_config};
pub use client::config::{Config, ConfigBuilder};
