pub mod contact_message;
pub mod property;
pub mod taxonomy;
pub mod user;

pub use contact_message::ContactMessage;
pub use property::{ContactDraft, ContactInfo, Image, PropertyAggregate, PropertyDraft, PropertyPatch, PropertyRow};
pub use taxonomy::{Feature, Neighborhood, Region};
pub use user::{NewUser, User, UserChanges};
