pub mod format;
pub mod types;
pub mod validate;
