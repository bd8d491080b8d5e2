pub mod batch;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod i18n;
pub mod retry;
pub mod security;
pub mod server;
pub mod translation;
