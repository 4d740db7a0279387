use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 创意阶段产出的用例
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct UseCase {
    /// 用例名称
    pub name: String,
    /// 详细描述
    pub description: String,
    /// 所属业务领域或部门
    pub area: String,
    /// 类别，例如 Customer Service、Operations
    pub category: String,
    /// 优先级 1-5
    pub priority: u8,
    /// 潜在影响 1-10
    pub impact_score: u8,
    pub implementation_complexity: String,
    /// 与业务目标的契合度 1-10
    pub alignment_score: u8,
    pub business_value: String,
    pub estimated_roi: String,
    #[serde(default)]
    pub key_benefits: Vec<String>,
    #[serde(default)]
    pub success_metrics: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    pub estimated_timeline: String,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub technologies_used: Vec<String>,
}

impl UseCase {
    /// 评估与质疑时使用的一行描述
    pub fn headline(&self) -> String {
        format!("{}: {}", self.name, self.description)
    }
}

/// 结构化抽取的外层包装
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct UseCases {
    pub use_cases: Vec<UseCase>,
}
