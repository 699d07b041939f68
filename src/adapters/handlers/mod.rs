//! Business handler adapters.

mod logging_handler;

pub use logging_handler::LoggingEventHandler;
