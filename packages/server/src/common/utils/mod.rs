pub mod duration;
pub mod price;

pub use duration::*;
pub use price::*;
