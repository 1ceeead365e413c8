pub mod category;
pub mod config;
pub mod document;

pub use category::*;
pub use config::*;
pub use document::*;
