//! Recognition session lifecycle
//!
//! An explicit state machine owns the continuous listen/stop lifecycle
//! of the recognition engine, including auto-restart and backoff on
//! recoverable faults.

mod machine;

pub use machine::{FaultReason, RecognitionSession, SessionCommand, SessionHandle, SessionState};
