//! Host abstraction for platform-independent engine code.
//!
//! The engine needs three things from its surroundings: a wall clock, a place
//! to write diagnostic messages, and a way to hand risk events to whoever is
//! listening. All three are expressed through [`EngineHost`] so that the same
//! engine runs under the tokio server, inside a GUI application, or in tests
//! with a hand-driven clock.
//!
//! # Delivery semantics
//!
//! Events are one-shot. The engine calls [`EngineHost::emit`] once per event,
//! after releasing its internal locks, and never replays. Implementations must
//! not block: a slow consumer should be handled by a bounded channel that
//! drops, not by waiting inside `emit`.
//!
//! # Example
//!
//! ```rust
//! use ecdis_risk_core::{EngineHost, RiskEvent};
//!
//! struct StdoutHost;
//!
//! impl EngineHost for StdoutHost {
//!     fn current_time_ms(&self) -> u64 {
//!         0
//!     }
//!     fn emit(&self, event: RiskEvent) {
//!         println!("{:?}", event);
//!     }
//!     fn debug(&self, _msg: &str) {}
//!     fn info(&self, msg: &str) {
//!         println!("{}", msg);
//!     }
//! }
//! ```

use crate::risk::RiskEvent;

/// Platform services used by the collision-risk engine.
pub trait EngineHost: Send + Sync {
    /// Current wall-clock time in milliseconds since the Unix epoch.
    ///
    /// Target ages, result staleness and predicted collision times are all
    /// derived from this value.
    fn current_time_ms(&self) -> u64;

    /// Deliver an event to subscribers.
    fn emit(&self, event: RiskEvent);

    /// Log a debug message.
    fn debug(&self, msg: &str);

    /// Log an info message.
    fn info(&self, msg: &str);
}
