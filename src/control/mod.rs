//! Request pacing and lifecycle control.
//!
//! - [`inflight`] collapses concurrent identical requests into one.
//! - [`debounce`] runs only the last of a burst of calls.
//! - [`throttle`] refuses calls that repeat too soon after the last one settled.
//! - [`retry`] retries once after a rate limit.
//! - [`session`] abandons requests whose view is gone or superseded.

pub mod debounce;
pub mod inflight;
pub mod retry;
pub mod session;
pub mod throttle;

pub use debounce::DebounceGate;
pub use inflight::{Acquired, Flight, InFlight, Waiter};
pub use retry::RetryPolicy;
pub use session::{ViewSession, guarded};
pub use throttle::Throttle;
