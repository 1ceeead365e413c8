pub mod merge;
pub mod reset;
pub mod streak;
