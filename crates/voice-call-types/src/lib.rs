//now people using the types library can use these types
pub mod events;
pub mod message;
pub mod variables;

//re-export types for easier access
pub use events::{ClientEvent, ServerEvent};
pub use message::{MessageRole, TranscriptMessage, TranscriptType};
pub use variables::VariableValues;
