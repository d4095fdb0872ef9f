//! Liveness page.

pub const RUNNING: &str = "Running Backend Server....!!!";

/// Answers as long as the process serves HTTP, whatever the store state.
pub async fn status() -> &'static str {
    RUNNING
}
