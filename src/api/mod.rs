pub mod format;
pub mod property_form;
