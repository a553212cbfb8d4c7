//! Synchronization with the cloud backend.
//!
//! The backend is purely an external contract (three REST endpoints behind
//! a `{success, data?, error?}` envelope); this module tolerates its
//! absence entirely. Push is triggered after every local mutation, pull is
//! a cancellable polling loop. Conflicts resolve last-write-wins by
//! creation timestamp.

mod client;
mod coordinator;
mod error;

pub use client::SyncClient;
pub use coordinator::{PollHandle, SyncCoordinator};
pub use error::SyncError;
