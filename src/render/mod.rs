pub mod helpers;
pub mod report;
