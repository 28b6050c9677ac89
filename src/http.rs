//! Shared HTTP client factory.
//!
//! Provides consistent HTTP client configuration across the codebase.

use reqwest::Client;
use std::time::Duration;

/// Default timeout for formatting and rewrite calls (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Short timeout for the connectivity test (10 seconds).
pub const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Long timeout for poster generation (10 minutes).
pub const POSTER_TIMEOUT: Duration = Duration::from_secs(600);

/// Create a new HTTP client with a custom timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_client_returns_valid_client() {
        let client = create_client_with_timeout(PING_TIMEOUT);
        assert!(std::mem::size_of_val(&client) > 0);
    }

    #[test]
    fn default_timeout_is_30_seconds() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(30));
    }

    #[test]
    fn ping_timeout_is_shorter_than_default() {
        assert!(PING_TIMEOUT < DEFAULT_TIMEOUT);
    }

    #[test]
    fn poster_timeout_is_ten_minutes() {
        assert_eq!(POSTER_TIMEOUT, Duration::from_secs(600));
    }
}
