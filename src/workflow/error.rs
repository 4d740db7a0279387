use thiserror::Error;

use crate::workflow::step::StepId;
use crate::workflow::tracker::RunStatus;

/// 编排器对外暴露的错误类型
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// 配置错误：未注册的步骤、缺失的模板、非法的工作流定义。不可重试。
    #[error("configuration error: {0}")]
    Configuration(String),

    /// 步骤处理器执行失败，运行进入 error 状态
    #[error("step '{step}' (#{index}) failed: {message}")]
    StepFailed {
        step: StepId,
        index: usize,
        message: String,
    },

    #[error("workflow has not been started: no conversation history in context")]
    NotStarted,

    #[error("workflow run already finished with status '{0}'")]
    RunFinished(RunStatus),

    #[error("a step of this workflow is already executing")]
    RunInProgress,

    #[error("workflow run was cancelled")]
    Cancelled,
}

impl WorkflowError {
    pub fn configuration(message: impl Into<String>) -> Self {
        WorkflowError::Configuration(message.into())
    }

    /// 失败的步骤（仅 StepFailed 有）
    pub fn failed_step(&self) -> Option<StepId> {
        match self {
            WorkflowError::StepFailed { step, .. } => Some(*step),
            _ => None,
        }
    }
}
