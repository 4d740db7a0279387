use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 调研的包含/排除条件
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
pub struct Filters {
    /// 需要包含的关键词
    pub include: Vec<String>,
    /// 需要排除的关键词
    pub exclude: Vec<String>,
}

/// 拆分给各调研智能体的子查询
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
pub struct DecomposedTasks {
    pub generic_search_query: String,
    pub business_analysis_query: String,
    pub domain_specific_query: String,
    pub trend_spotter_query: String,
}

/// 任务简报：需求理解与并行调研之间的交接契约
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
pub struct MissionBrief {
    /// 调研主题
    pub main_topic: String,
    /// 目标行业
    pub industry: String,
    /// 相关工具与技术
    pub tools_and_tech: Vec<String>,
    pub filters: Filters,
    pub decomposed_tasks: DecomposedTasks,
}

impl MissionBrief {
    /// 为空的子查询字段名
    pub fn empty_queries(&self) -> Vec<&'static str> {
        let tasks = &self.decomposed_tasks;
        [
            ("generic_search_query", &tasks.generic_search_query),
            ("business_analysis_query", &tasks.business_analysis_query),
            ("domain_specific_query", &tasks.domain_specific_query),
            ("trend_spotter_query", &tasks.trend_spotter_query),
        ]
        .into_iter()
        .filter(|(_, query)| query.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}
