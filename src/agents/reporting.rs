use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::agents::AgentDeps;
use crate::types::evaluation::RankedEntry;
use crate::workflow::context::{ContextKeys, WorkflowContext};
use crate::workflow::handler::{StepHandler, StepOutcome};
use crate::workflow::step::StepId;

/// 最终报告
pub struct ReportSynthesizer {
    deps: AgentDeps,
}

impl ReportSynthesizer {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl StepHandler for ReportSynthesizer {
    async fn execute(
        &self,
        context: &mut WorkflowContext,
        _cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let creative_brief: String = context.require(ContextKeys::CREATIVE_BRIEF)?;
        let ranked: Vec<RankedEntry> = context.require(ContextKeys::RANKED_IDEAS)?;
        let ranked_ideas = serde_json::to_string_pretty(&ranked)?;

        let report = self
            .deps
            .prompt(
                StepId::ReportSynthesizer,
                "synthesize",
                &[
                    ("creative_brief", creative_brief.as_str()),
                    ("ranked_ideas", ranked_ideas.as_str()),
                ],
            )
            .await?;

        info!(chars = report.len(), "final report written");
        context.store(ContextKeys::FINAL_REPORT, report.trim())?;
        Ok(StepOutcome::Completed)
    }
}
