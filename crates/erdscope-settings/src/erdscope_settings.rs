//! erdscope settings
//!
//! File locations, user preferences, saved diagram states and the logging
//! subscriber.

pub mod logging;
mod preferences;
mod settings_file;
mod state_store;

pub use preferences::*;
pub use settings_file::*;
pub use state_store::*;
