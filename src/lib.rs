pub mod agents;
pub mod app;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod i18n;
pub mod llm;
pub mod logging;
pub mod prompts;
pub mod types;
pub mod workflow;

// Re-export commonly used types
pub use app::launch;
pub use config::Config;
pub use conversation::ConversationManager;
pub use workflow::{Orchestrator, RunOutcome, WorkflowError};
