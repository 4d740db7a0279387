//! 创意生成与质疑

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::agents::AgentDeps;
use crate::types::use_case::{UseCase, UseCases};
use crate::workflow::context::{ContextKeys, WorkflowContext};
use crate::workflow::handler::{StepHandler, StepOutcome};
use crate::workflow::step::StepId;

/// 根据创意简报生成用例
///
/// 上下文中已有质疑意见时按意见修订，结果写入 `refined_ideas`；
/// 否则生成首轮用例写入 `initial_ideas`。
pub struct Ideation {
    deps: AgentDeps,
}

impl Ideation {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl StepHandler for Ideation {
    async fn execute(
        &self,
        context: &mut WorkflowContext,
        _cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let creative_brief: String = context.require(ContextKeys::CREATIVE_BRIEF)?;
        let feedback: Option<String> = context.get(ContextKeys::DEVILS_ADVOCATE_FEEDBACK);

        let (ideas, key): (UseCases, &str) = match feedback {
            Some(feedback) => (
                self.deps
                    .extract(
                        StepId::Ideation,
                        "refine_with_feedback",
                        &[
                            ("creative_brief", creative_brief.as_str()),
                            ("feedback", feedback.as_str()),
                        ],
                    )
                    .await?,
                ContextKeys::REFINED_IDEAS,
            ),
            None => (
                self.deps
                    .extract(
                        StepId::Ideation,
                        "generate_initial",
                        &[("creative_brief", creative_brief.as_str())],
                    )
                    .await?,
                ContextKeys::INITIAL_IDEAS,
            ),
        };

        info!(count = ideas.use_cases.len(), key, "use cases generated");
        context.store(key, &ideas.use_cases)?;
        Ok(StepOutcome::Completed)
    }
}

/// 对首轮用例提出质疑
pub struct DevilsAdvocate {
    deps: AgentDeps,
}

impl DevilsAdvocate {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl StepHandler for DevilsAdvocate {
    async fn execute(
        &self,
        context: &mut WorkflowContext,
        _cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let ideas: Vec<UseCase> = context.require(ContextKeys::INITIAL_IDEAS)?;
        let listing = ideas
            .iter()
            .map(|idea| format!("- {}", idea.headline()))
            .collect::<Vec<_>>()
            .join("\n");

        let feedback = self
            .deps
            .prompt(StepId::DevilsAdvocate, "critique", &[("ideas", listing.as_str())])
            .await?;

        context.store(ContextKeys::DEVILS_ADVOCATE_FEEDBACK, feedback.trim())?;
        Ok(StepOutcome::Completed)
    }
}
