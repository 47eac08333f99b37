pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::EngineConfig;

pub use adapters::{roster::CsvRoster, storage::LocalStorage};
pub use core::engine::AssignmentEngine;
pub use utils::error::{EngineError, Result};
