pub mod config;
pub mod duration;
pub mod error;
pub mod scaler;

pub use config::*;
pub use duration::parse_duration;
pub use error::*;
pub use scaler::*;
