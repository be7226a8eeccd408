// HTTP routes
pub mod extraction;
pub mod health;

pub use extraction::*;
pub use health::*;
