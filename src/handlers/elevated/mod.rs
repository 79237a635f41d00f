// handlers/elevated/mod.rs - Elevated handlers (bearer token with ADMIN role)
pub mod messages;
pub mod properties;
pub mod taxonomy;
pub mod users;
