//! Bridge-level error types
//!
//! Errors raised by a foreign runtime are never wrapped in these; a runtime's
//! own error type absorbs `BridgeError` through `From` so both travel on the
//! same `Result`.

use std::path::PathBuf;
use std::time::Duration;

/// Failures of the bridge machinery itself
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    #[error("Event loop is closed")]
    LoopClosed,

    #[error("Blocking call issued from the event loop thread would deadlock")]
    ReentrantCall,

    #[error("Call did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Callback panicked on the event loop: {0}")]
    CallbackPanicked(String),

    #[error("Foreign runtime '{0}' is not initialized on the event loop")]
    RuntimeMissing(&'static str),

    #[error("Failed to read helper script {path}: {message}")]
    HelperUnreadable { path: PathBuf, message: String },

    #[error("Failed to start event loop: {0}")]
    LoopStart(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Render a panic payload as text
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
