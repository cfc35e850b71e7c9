// HTTP routes
pub mod collection;
pub mod health;

pub use collection::*;
pub use health::*;
