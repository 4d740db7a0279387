use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 专家评估给出的分数
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct EvaluationScore {
    /// 给出分数的评估者
    pub agent: String,
    /// 1-10
    pub score: u8,
    pub justification: String,
}

/// 一个用例及其全部评估分数
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScoredIdea {
    pub idea: String,
    pub scores: Vec<EvaluationScore>,
}

/// 排名结果
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RankedEntry {
    pub idea: String,
    /// 平均分，保留两位小数
    pub overall_score: f64,
    pub scores: Vec<EvaluationScore>,
}
