pub const VOICE_API_KEY: &str = "VOICE_API_KEY";
pub const VOICE_GATEWAY_URL: &str = "VOICE_GATEWAY_URL";

pub const BASE_URL: &str = "wss://gateway.voicecall.dev/v1";
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const PROTOCOL_HEADER: &str = "Voice-Call-Protocol";
pub const PROTOCOL_VERSION: &str = "events=v1";
