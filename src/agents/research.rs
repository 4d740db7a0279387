//! 并行调研与调研汇总

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::agents::AgentDeps;
use crate::types::mission_brief::MissionBrief;
use crate::workflow::context::{ContextKeys, WorkflowContext};
use crate::workflow::fanout::{ResearchTask, run_fan_out};
use crate::workflow::handler::{StepHandler, StepOutcome};
use crate::workflow::step::StepId;

/// 流水线中唯一的扇出步骤
///
/// 五个调研智能体共享同一个任务简报，结果按下列顺序写入 `research_results`：
/// Generic Search、Business Analysis、Domain Search、Trend Spotter、User Persona。
pub struct ParallelResearch {
    deps: AgentDeps,
    task_timeout: Duration,
}

impl ParallelResearch {
    pub fn new(deps: AgentDeps, task_timeout: Duration) -> Self {
        Self { deps, task_timeout }
    }

    /// 渲染提示词并构造调研任务
    ///
    /// 模板缺失属于配置错误，在任何任务启动前返回。
    fn task(
        &self,
        name: &str,
        step: StepId,
        template: &str,
        vars: &[(&str, &str)],
    ) -> Result<ResearchTask> {
        let user_prompt = self.deps.prompts.format(step, template, vars)?;
        let system_prompt = self.deps.prompts.system_prompt(step);
        let model = self.deps.model.clone();

        Ok(ResearchTask::new(name, async move {
            model.prompt(&system_prompt, &user_prompt).await
        }))
    }

    pub fn build_tasks(&self, brief: &MissionBrief) -> Result<Vec<ResearchTask>> {
        let queries = &brief.decomposed_tasks;
        Ok(vec![
            self.task(
                "Generic Search",
                StepId::GenericSearch,
                "search",
                &[("query", queries.generic_search_query.as_str())],
            )?,
            self.task(
                "Business Analysis",
                StepId::BusinessAnalysis,
                "analyze",
                &[("query", queries.business_analysis_query.as_str())],
            )?,
            self.task(
                "Domain Search",
                StepId::DomainSearch,
                "search",
                &[
                    ("domain", brief.industry.as_str()),
                    ("query", queries.domain_specific_query.as_str()),
                ],
            )?,
            self.task(
                "Trend Spotter",
                StepId::TrendSpotter,
                "identify_trends",
                &[("query", queries.trend_spotter_query.as_str())],
            )?,
            self.task(
                "User Persona",
                StepId::UserPersona,
                "create_persona",
                &[
                    ("topic", brief.main_topic.as_str()),
                    ("industry", brief.industry.as_str()),
                ],
            )?,
        ])
    }
}

#[async_trait]
impl StepHandler for ParallelResearch {
    async fn execute(
        &self,
        context: &mut WorkflowContext,
        cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let brief: MissionBrief = context.require(ContextKeys::MISSION_BRIEF)?;
        let tasks = self.build_tasks(&brief)?;

        info!(tasks = tasks.len(), "starting parallel research");
        let results = run_fan_out(tasks, self.task_timeout, cancel).await;

        let failed = results.iter().filter(|r| r.starts_with("Error in ")).count();
        if failed > 0 {
            warn!(failed, total = results.len(), "some research tasks failed");
        }

        context.store(ContextKeys::RESEARCH_RESULTS, &results)?;
        Ok(StepOutcome::Completed)
    }
}

/// 将调研报告汇总为创意简报
pub struct SearchSummarizer {
    deps: AgentDeps,
}

impl SearchSummarizer {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl StepHandler for SearchSummarizer {
    async fn execute(
        &self,
        context: &mut WorkflowContext,
        _cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let results: Vec<String> = context.require(ContextKeys::RESEARCH_RESULTS)?;
        let reports = results
            .iter()
            .enumerate()
            .map(|(i, report)| format!("### Report {}\n{}", i + 1, report))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        let brief = self
            .deps
            .prompt(
                StepId::SearchSummarizer,
                "summarize_reports",
                &[("reports", reports.as_str())],
            )
            .await?;

        context.store(ContextKeys::CREATIVE_BRIEF, brief.trim())?;
        Ok(StepOutcome::Completed)
    }
}
