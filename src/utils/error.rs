//! Log-and-recover helpers
//!
//! The resolver's recoverable failures (an unreadable directory, a file that
//! is not a module, a failed load) are logged and turned into a decline or a
//! skip instead of being propagated to the host.

use tracing::{debug, warn};

/// Execute an operation and log errors without failing
///
/// Returns `Some(T)` on success, `None` on error (after logging at warn level).
///
/// # Example
/// ```rust
/// use addin_resolver::utils::log_error;
///
/// let entries = log_error(|| std::fs::read_dir("/no/such/addin"), "Failed to read addin");
/// assert!(entries.is_none());
/// ```
pub fn log_error<F, T, E>(operation: F, context: &str) -> Option<T>
where
    F: FnOnce() -> Result<T, E>,
    E: std::fmt::Display,
{
    result_to_option(operation(), context)
}

/// Convert a Result to an Option, logging the error at warn level
pub fn result_to_option<T, E>(result: Result<T, E>, context: &str) -> Option<T>
where
    E: std::fmt::Display,
{
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{}: {}", context, e);
            None
        }
    }
}

/// Convert a Result to an Option, logging the error at debug level
///
/// For failures that are expected during normal operation, such as junk files
/// in an add-in directory.
pub fn expected_to_option<T, E>(result: Result<T, E>, context: &str) -> Option<T>
where
    E: std::fmt::Display,
{
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("{}: {}", context, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_error_passes_values_through() {
        assert_eq!(log_error(|| Ok::<_, String>(7), "unused"), Some(7));
        assert_eq!(log_error(|| Err::<u8, _>("boom"), "failed"), None);
    }

    #[test]
    fn test_expected_to_option() {
        assert_eq!(expected_to_option(Ok::<_, String>("Foo"), "unused"), Some("Foo"));
        assert_eq!(expected_to_option(Err::<&str, _>("not a module"), "skipped"), None);
    }
}
