// HTTP routes
pub mod health;
pub mod migrations;

pub use health::*;
pub use migrations::*;
