//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Run (app.rs):
//!     Build instance → Start servers (group.rs) → Start barrier
//!     → Register → Arm termination trigger (signals.rs) → Wait
//!
//! Stop (app.rs):
//!     Deregister → Cancel run token → Stoppers call Server::stop
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGQUIT/SIGINT (configurable) → App::stop
//! ```
//!
//! # Design Decisions
//! - Servers start concurrently; one stopper task per server waits for cancellation
//! - First failure cancels every sibling; its error is what `run` returns
//! - Every stop and deregister call has its own deadline
//! - Registration failure rolls back started servers without waiting on them

pub mod app;
pub mod group;
pub mod options;
pub mod signals;

pub use app::App;
pub use group::{StartBarrier, TaskGroup};
pub use options::{AppBuilder, DEFAULT_REGISTRAR_TIMEOUT, DEFAULT_STOP_TIMEOUT};
pub use signals::{Signal, SignalListener};
