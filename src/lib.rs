//! Telegram relay for a Valetudo robot vacuum.

pub mod auth;
pub mod config;
pub mod relay;
pub mod startup;
pub mod valetudo;
