pub mod orchestrator;
pub mod prompt;
pub mod store;

pub use orchestrator::{GenerationOrchestrator, OrchestratorConfig};
pub use store::{MemoryReplyStore, ReplyPatch, ReplyStore};
