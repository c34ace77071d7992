//! Core coursehub library (config, session manager, API client, endpoints).

pub mod api;
pub mod claims;
pub mod client;
pub mod config;
pub mod session;
