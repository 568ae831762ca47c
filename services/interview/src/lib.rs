pub mod config;
pub mod gateway_adapter;
pub mod question_loader;
pub mod terminal;
