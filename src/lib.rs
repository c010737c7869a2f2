pub mod audio;
pub mod config;
mod logging;
mod telemetry;

pub use logging::{init_logging, log_debug, log_file_path};
pub use telemetry::init_tracing;
