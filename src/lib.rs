pub mod chat;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod logging;
pub mod memory;
pub mod personality;
pub mod utils;
