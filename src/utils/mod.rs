pub mod brutus_toml;
pub mod config;
pub mod env;
pub mod found_log;
pub mod logger;

pub use config::*;
pub use env::db_path_from_env;
pub use found_log::{FoundLog, ResultSink};
pub use logger::{LogReporter, Reporter, setup_logging};
