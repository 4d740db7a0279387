use serde::{Deserialize, Serialize};

use crate::workflow::error::WorkflowError;
use crate::workflow::step::StepId;

/// 内置的工作流变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowVariant {
    #[default]
    Default,
    Simple,
    Refine,
}

impl std::fmt::Display for WorkflowVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowVariant::Default => write!(f, "default"),
            WorkflowVariant::Simple => write!(f, "simple"),
            WorkflowVariant::Refine => write!(f, "refine"),
        }
    }
}

impl std::str::FromStr for WorkflowVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(WorkflowVariant::Default),
            "simple" => Ok(WorkflowVariant::Simple),
            "refine" => Ok(WorkflowVariant::Refine),
            _ => Err(format!("Unknown workflow variant: {}", s)),
        }
    }
}

/// 工作流定义：有序的步骤列表
///
/// 步骤的位置即执行顺序，构造后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowDefinition {
    name: String,
    steps: Vec<StepId>,
}

impl WorkflowDefinition {
    /// 由步骤列表构造自定义工作流
    pub fn custom(name: impl Into<String>, steps: Vec<StepId>) -> Result<Self, WorkflowError> {
        let name = name.into();
        if steps.is_empty() {
            return Err(WorkflowError::configuration(format!(
                "workflow '{}' has no steps",
                name
            )));
        }
        let fan_outs = steps.iter().filter(|s| s.is_fan_out()).count();
        if fan_outs > 1 {
            return Err(WorkflowError::configuration(format!(
                "workflow '{}' declares {} fan-out steps, at most one is allowed",
                name, fan_outs
            )));
        }
        Ok(Self { name, steps })
    }

    /// 由步骤名列表解析，例如配置文件中的 `["clarifier", "ranking"]`
    pub fn parse(name: impl Into<String>, step_names: &[String]) -> Result<Self, WorkflowError> {
        let steps = step_names
            .iter()
            .map(|s| s.parse::<StepId>().map_err(WorkflowError::Configuration))
            .collect::<Result<Vec<_>, _>>()?;
        Self::custom(name, steps)
    }

    pub fn from_variant(variant: WorkflowVariant) -> Self {
        match variant {
            WorkflowVariant::Default => Self::default_pipeline(),
            WorkflowVariant::Simple => Self::simple(),
            WorkflowVariant::Refine => Self::refine(),
        }
    }

    /// 完整流水线
    pub fn default_pipeline() -> Self {
        Self {
            name: "default".to_string(),
            steps: vec![
                StepId::Clarifier,
                StepId::ConversationSummarizer,
                StepId::QueryEnhancer,
                StepId::QueryUnderstanding,
                StepId::ParallelResearch,
                StepId::SearchSummarizer,
                StepId::Ideation,
                StepId::EvaluationCoordinator,
                StepId::Ranking,
                StepId::ReportSynthesizer,
            ],
        }
    }

    /// 跳过专家评估的精简流水线
    pub fn simple() -> Self {
        let steps = Self::default_pipeline()
            .steps
            .into_iter()
            .filter(|s| *s != StepId::EvaluationCoordinator)
            .collect();
        Self {
            name: "simple".to_string(),
            steps,
        }
    }

    /// 在首次创意生成后插入质疑与再次创意
    pub fn refine() -> Self {
        let mut steps = Vec::new();
        let mut inserted = false;
        for step in Self::default_pipeline().steps {
            steps.push(step);
            if step == StepId::Ideation && !inserted {
                steps.push(StepId::DevilsAdvocate);
                steps.push(StepId::Ideation);
                inserted = true;
            }
        }
        Self {
            name: "refine".to_string(),
            steps,
        }
    }

    /// 在开头加上文档摘要步骤
    pub fn with_document_summarizer(mut self) -> Self {
        if self.steps.first() != Some(&StepId::DocumentSummarizer) {
            self.steps.insert(0, StepId::DocumentSummarizer);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[StepId] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_at(&self, index: usize) -> Option<StepId> {
        self.steps.get(index).copied()
    }

    /// 扇出步骤的位置
    pub fn fan_out_index(&self) -> Option<usize> {
        self.steps.iter().position(|s| s.is_fan_out())
    }
}

impl Default for WorkflowDefinition {
    fn default() -> Self {
        Self::default_pipeline()
    }
}
