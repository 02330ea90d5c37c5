pub mod battleground;
pub mod config;
pub mod constants;
pub mod effects;
pub mod engine;
pub mod presentation;
pub mod server_protocol;
pub mod server_utils;
pub mod stats_store;
pub mod types;
