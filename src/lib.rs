// Public API for integration tests and embedding into a chat client

pub mod config;
pub mod engine;
pub mod help;
pub mod protocol;
pub mod questions;
pub mod state;
pub mod types;
