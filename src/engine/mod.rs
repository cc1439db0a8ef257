pub mod pick;
pub mod resolve;
pub mod score;
pub mod tags;
