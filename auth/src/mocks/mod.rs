//! Mock collaborators for testing.
//!
//! In-memory, deterministic implementations of the provider traits and the
//! clock, for unit and integration tests.

pub mod auth_handler;
pub mod clock;
pub mod session;

pub use auth_handler::{MockAuthHandler, RecordedCall};
pub use clock::FixedClock;
pub use session::MockSessionStore;
