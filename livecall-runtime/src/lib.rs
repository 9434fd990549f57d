//! livecall Runtime - single event-loop bridge to an embedded foreign runtime
//!
//! This crate lets a notebook host call into a separate interpreter (the
//! "foreign runtime") from any of its session threads. It includes:
//!
//! - **Host runtime**: one dedicated event-loop thread that runs submitted
//!   jobs one at a time, in submission order
//! - **Bridge**: lazily creates exactly one foreign-runtime instance and
//!   runs work against it, blocking the caller until the work is done
//! - **Sessions**: per-session context carried onto the loop with each call
//! - **Signals**: re-arms Ctrl-C after the foreign runtime takes it over
//! - **Config**: `livecall.yml` settings for the runtime and the server
//!
//! ## Architecture
//!
//! ```text
//! session thread --schedule--> event loop (owns R) --completion--> session thread
//! ```
//!
//! The foreign runtime `R` is created on the loop thread and never leaves
//! it, so `R` itself does not need to be `Send`. Only values and errors
//! travel back to callers.
//!
//! ## Example
//!
//! ```rust,ignore
//! use livecall_runtime::{Bridge, HostRuntime, RuntimeConfig};
//!
//! let config = RuntimeConfig::default();
//! let host = HostRuntime::new(&config)?;
//! let bridge = Bridge::new(host, config, |_| Ok(MyKernel::default()));
//!
//! let evaluate = bridge.call(|kernel: &mut MyKernel, src: String| kernel.evaluate(&src));
//! let value = evaluate("1 + 1".to_string())?;
//! ```
//!
//! ## Errors
//!
//! Errors raised by the foreign runtime come back unchanged. Failures of the
//! bridge itself ([`BridgeError`]) are converted into the runtime's error
//! type through `From`.

pub mod bridge;
pub mod config;
pub mod error;
pub mod host;
pub mod session;
pub mod signals;

pub use bridge::{Bridge, ForeignRuntime, RuntimeHandle};
pub use config::{Config, ConfigError, RuntimeConfig, ServerConfig};
pub use error::{BridgeError, BridgeResult};
pub use host::{HostRuntime, Job, LoopLocals};
pub use session::{SessionContext, SessionGuard};

pub use livecall_types::{MimeData, MimePayload, MimeType, RasterFormat};
