//! 流水线各步骤的处理器实现

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::config::WorkflowConfig;
use crate::llm::{self, Extractable, SharedModel};
use crate::prompts::PromptService;
use crate::types::use_case::UseCase;
use crate::workflow::clarification::TriggerMatcher;
use crate::workflow::context::{ContextKeys, WorkflowContext};
use crate::workflow::registry::AgentRegistry;
use crate::workflow::step::StepId;

pub mod evaluation;
pub mod ideation;
pub mod query_enrichment;
pub mod reporting;
pub mod research;

use evaluation::{EvaluationCoordinator, Ranking};
use ideation::{DevilsAdvocate, Ideation};
use query_enrichment::{
    Clarifier, ConversationSummarizer, DocumentSummarizer, QueryEnhancer, QueryUnderstanding,
};
use reporting::ReportSynthesizer;
use research::{ParallelResearch, SearchSummarizer};

/// 处理器共享的依赖
#[derive(Clone)]
pub struct AgentDeps {
    pub model: SharedModel,
    pub prompts: Arc<PromptService>,
}

impl AgentDeps {
    pub fn new(model: SharedModel, prompts: Arc<PromptService>) -> Self {
        Self { model, prompts }
    }

    /// 以步骤的系统提示词和渲染后的模板调用模型
    pub async fn prompt(&self, step: StepId, template: &str, vars: &[(&str, &str)]) -> Result<String> {
        let user_prompt = self.prompts.format(step, template, vars)?;
        self.model
            .prompt(&self.prompts.system_prompt(step), &user_prompt)
            .await
    }

    /// 结构化抽取
    pub async fn extract<T: Extractable>(
        &self,
        step: StepId,
        template: &str,
        vars: &[(&str, &str)],
    ) -> Result<T> {
        let user_prompt = self.prompts.format(step, template, vars)?;
        llm::extract(
            self.model.as_ref(),
            &self.prompts.system_prompt(step),
            &user_prompt,
        )
        .await
    }
}

/// 当前选定的用例：优先使用 refined_ideas
pub fn chosen_use_cases(context: &WorkflowContext) -> Result<Vec<UseCase>> {
    if context.has(ContextKeys::REFINED_IDEAS) {
        context.require(ContextKeys::REFINED_IDEAS)
    } else {
        context.require(ContextKeys::INITIAL_IDEAS)
    }
}

/// 注册默认流水线用到的全部处理器
pub fn default_registry(deps: AgentDeps, config: &WorkflowConfig) -> AgentRegistry {
    let mut registry = AgentRegistry::new();

    let matcher = TriggerMatcher::new(
        config.trigger_phrases.as_slice(),
        config.hedge_phrases.as_slice(),
    );
    let task_timeout = Duration::from_secs(config.research_task_timeout_seconds);
    let evaluators = config.evaluators.clone();

    {
        let deps = deps.clone();
        registry.register(StepId::DocumentSummarizer, move || {
            DocumentSummarizer::new(deps.clone())
        });
    }
    {
        let deps = deps.clone();
        registry.register(StepId::Clarifier, move || {
            Clarifier::new(deps.clone(), matcher.clone())
        });
    }
    {
        let deps = deps.clone();
        registry.register(StepId::ConversationSummarizer, move || {
            ConversationSummarizer::new(deps.clone())
        });
    }
    {
        let deps = deps.clone();
        registry.register(StepId::QueryEnhancer, move || QueryEnhancer::new(deps.clone()));
    }
    {
        let deps = deps.clone();
        registry.register(StepId::QueryUnderstanding, move || {
            QueryUnderstanding::new(deps.clone())
        });
    }
    {
        let deps = deps.clone();
        registry.register(StepId::ParallelResearch, move || {
            ParallelResearch::new(deps.clone(), task_timeout)
        });
    }
    {
        let deps = deps.clone();
        registry.register(StepId::SearchSummarizer, move || {
            SearchSummarizer::new(deps.clone())
        });
    }
    {
        let deps = deps.clone();
        registry.register(StepId::Ideation, move || Ideation::new(deps.clone()));
    }
    {
        let deps = deps.clone();
        registry.register(StepId::DevilsAdvocate, move || DevilsAdvocate::new(deps.clone()));
    }
    {
        let deps = deps.clone();
        registry.register(StepId::EvaluationCoordinator, move || {
            EvaluationCoordinator::new(deps.clone(), evaluators.clone())
        });
    }
    registry.register_sync(StepId::Ranking, || Ranking);
    registry.register(StepId::ReportSynthesizer, move || {
        ReportSynthesizer::new(deps.clone())
    });

    registry
}

#[cfg(test)]
mod tests;
