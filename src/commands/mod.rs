//! CLI command implementations

pub mod manage;
pub mod status;
pub mod sync;
pub mod watch;
