pub mod orchestrator;
pub mod plan;
pub mod task;

pub use orchestrator::LaunchOrchestrator;
pub use plan::{asset_index_for, EffectiveAccount, LaunchPlan};
pub use task::{ProcessHandle, ProcessState};
