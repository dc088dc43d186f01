//! Grepable error codes shared by every layer.
//!
//! User-facing command paths never surface these; they end in a `Reply`.
//! The HTTP layer uses them for the few failures that are not the user's
//! concern (bad bot token, store outages).

/// Stable, grepable error code plus a retry hint.
pub trait ErrorCode {
    /// Upper-snake code such as `E_REMOTE_TRANSPORT`.
    fn error_code(&self) -> &'static str;

    /// Whether the caller may retry the same request unchanged.
    fn retryable(&self) -> bool {
        false
    }
}
