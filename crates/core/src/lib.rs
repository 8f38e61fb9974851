pub mod config;
pub mod error;
pub mod measurement;

pub use config::Config;
pub use error::*;
pub use measurement::*;
