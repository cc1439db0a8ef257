//! Result resolution for gamified surveys
//!
//! ## Current API
//!
//! - Normalize stored survey and answer documents
//! - Calculate dragger scores
//! - Rank chosen tags and match personalized results
//! - Store answers and resolved results
//!
pub mod engine;
pub mod error;
pub mod render;
pub mod results;
pub mod settings;
pub mod store;
pub mod survey;
pub mod util;
