pub mod log;
pub mod output;

pub use log::{CaptureLog, Log, LogLevel, NullLog};
pub use output::{OutputFormatter, OutputMode};
