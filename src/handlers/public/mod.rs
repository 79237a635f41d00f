// handlers/public/mod.rs - Public handlers (no authentication)
pub mod auth;
pub mod contact;
pub mod locations;
pub mod properties;
pub mod system;
