//! Core type definitions for frep

mod action;
mod error;
mod replication;
mod stats;

pub use action::SyncAction;
pub use error::ReplicaError;
pub use replication::Replication;
pub use stats::{StatusReport, SyncStats};
