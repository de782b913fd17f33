//! Utility modules shared by hosts and add-ins

pub mod env;
pub mod error;
pub mod logging;

pub use env::env_opt;
pub use error::{expected_to_option, log_error, result_to_option};
pub use logging::{init_addin_logging, init_logging, init_logging_from_config};
#[cfg(feature = "json-logging")]
pub use logging::init_json_logging;
