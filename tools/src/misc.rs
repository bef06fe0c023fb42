use std::time::Duration;

/// Current timestamp as a `Duration` since the UNIX epoch.
///
/// # Panics
/// Panics if the system clock is set before the UNIX epoch.
#[must_use]
pub fn get_current_timestamp() -> Duration {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before unix epoch")
}
