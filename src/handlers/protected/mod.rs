// handlers/protected/mod.rs - Protected handlers (bearer token required)
pub mod auth;
