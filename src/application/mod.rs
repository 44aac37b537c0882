//! Application layer - turn orchestration over the domain scenes.

pub mod orchestrator;

pub use orchestrator::DialogOrchestrator;
