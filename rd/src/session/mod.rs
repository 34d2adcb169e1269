//! Session state with a single owner
//!
//! SessionStore owns the SessionState and broadcasts a SessionEvent after
//! every update, replacing framework re-render hooks with plain subscribers.

mod state;
mod store;

pub use state::{EntryKind, SessionState, TranscriptEntry};
pub use store::{SessionEvent, SessionStore};
