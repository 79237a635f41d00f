pub mod property_service;
pub mod storage;

pub use property_service::{PropertyError, PropertyService};
pub use storage::{ImageStorage, LocalImageStorage, StorageError};
