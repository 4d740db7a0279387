//! 工作流编排：步骤标识、共享上下文、处理器注册表、扇出、澄清挂起与状态跟踪

pub mod clarification;
pub mod context;
pub mod definition;
pub mod error;
pub mod fanout;
pub mod handler;
pub mod orchestrator;
pub mod registry;
pub mod step;
pub mod tracker;

pub use clarification::TriggerMatcher;
pub use context::{ContextKeys, ConversationTurn, Role, WorkflowContext};
pub use definition::{WorkflowDefinition, WorkflowVariant};
pub use error::WorkflowError;
pub use fanout::{ResearchTask, run_fan_out};
pub use handler::{Blocking, StepHandler, StepOutcome, SyncStepHandler};
pub use orchestrator::{Orchestrator, RunOutcome};
pub use registry::AgentRegistry;
pub use step::{StepId, StepMetadata};
pub use tracker::{RunStatus, StatusSnapshot, StepRecord, StepStatus};
