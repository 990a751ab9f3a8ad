//! Diff engine - Comparison logic and plan generation

mod compare;
mod engine;
mod plan;

pub use compare::files_identical;
pub use engine::DiffEngine;
pub use plan::{PlanStats, SyncPlan};
