use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::workflow::context::WorkflowContext;

/// 步骤执行结果
///
/// 处理器返回 `Err` 即视为失败，由编排器记录到步骤历史。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// 步骤完成，编排器前进到下一步
    Completed,
    /// 需要外部输入，整个运行在当前步骤挂起
    Suspended { question: String },
}

impl StepOutcome {
    pub fn suspended(question: impl Into<String>) -> Self {
        StepOutcome::Suspended {
            question: question.into(),
        }
    }
}

/// 流水线步骤的统一接口
///
/// 读取共享上下文中前序步骤写入的键，并写入自己的输出键。
/// 失败时已写入的键保留，不做回滚。
#[async_trait]
pub trait StepHandler: Send + Sync {
    async fn execute(
        &self,
        context: &mut WorkflowContext,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome>;
}

/// 同步（阻塞）步骤
pub trait SyncStepHandler: Send + Sync {
    fn execute(&self, context: &mut WorkflowContext) -> Result<StepOutcome>;
}

impl<F> SyncStepHandler for F
where
    F: Fn(&mut WorkflowContext) -> Result<StepOutcome> + Send + Sync,
{
    fn execute(&self, context: &mut WorkflowContext) -> Result<StepOutcome> {
        self(context)
    }
}

/// 将同步步骤适配为 `StepHandler`，在当前任务内直接调用
pub struct Blocking<H>(pub H);

#[async_trait]
impl<H> StepHandler for Blocking<H>
where
    H: SyncStepHandler,
{
    async fn execute(
        &self,
        context: &mut WorkflowContext,
        _cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        self.0.execute(context)
    }
}
