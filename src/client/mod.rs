//! Consumer-side controller for one participant's view of a session.
//!
//! The engine deliberately has no push transport: clients poll the
//! current-question view on a short cadence and drive a local countdown from
//! the server-reported remaining time. This module packages that loop so
//! every consumer (mobile, web bridge, tests) shares one cancellation-safe,
//! at-most-one-request-in-flight implementation.

/// In-process [`transport::SessionApi`] binding for embedding and tests.
pub mod engine;
/// The polling state machine itself.
pub mod sync_loop;
/// Transport abstraction the loop runs against.
pub mod transport;

pub use engine::LocalSessionApi;
pub use sync_loop::{SyncCommand, SyncEvent, SyncLoopConfig, SyncLoopHandle, spawn};
pub use transport::{ApiError, SessionApi};
