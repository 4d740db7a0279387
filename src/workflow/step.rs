use serde::{Deserialize, Serialize};

/// 智能体/步骤标识
///
/// 覆盖流水线中的全部智能体，包括只在并行调研和评估内部使用的子智能体。
/// 子智能体同样拥有提示词模板，但默认不注册为可调度的步骤。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    // 需求澄清与理解
    DocumentSummarizer,
    Clarifier,
    ConversationSummarizer,
    QueryEnhancer,
    QueryUnderstanding,

    // 调研
    ParallelResearch,
    GenericSearch,
    BusinessAnalysis,
    DomainSearch,
    TrendSpotter,
    UserPersona,
    SearchSummarizer,

    // 创意
    Ideation,
    DevilsAdvocate,

    // 评估
    EvaluationCoordinator,
    TechnicalFeasibility,
    MarketViability,
    EthicalGuardian,
    Ranking,

    // 报告
    ReportSynthesizer,
}

impl StepId {
    pub const ALL: [StepId; 20] = [
        StepId::DocumentSummarizer,
        StepId::Clarifier,
        StepId::ConversationSummarizer,
        StepId::QueryEnhancer,
        StepId::QueryUnderstanding,
        StepId::ParallelResearch,
        StepId::GenericSearch,
        StepId::BusinessAnalysis,
        StepId::DomainSearch,
        StepId::TrendSpotter,
        StepId::UserPersona,
        StepId::SearchSummarizer,
        StepId::Ideation,
        StepId::DevilsAdvocate,
        StepId::EvaluationCoordinator,
        StepId::TechnicalFeasibility,
        StepId::MarketViability,
        StepId::EthicalGuardian,
        StepId::Ranking,
        StepId::ReportSynthesizer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::DocumentSummarizer => "document_summarizer",
            StepId::Clarifier => "clarifier",
            StepId::ConversationSummarizer => "conversation_summarizer",
            StepId::QueryEnhancer => "query_enhancer",
            StepId::QueryUnderstanding => "query_understanding",
            StepId::ParallelResearch => "parallel_research",
            StepId::GenericSearch => "generic_search",
            StepId::BusinessAnalysis => "business_analysis",
            StepId::DomainSearch => "domain_search",
            StepId::TrendSpotter => "trend_spotter",
            StepId::UserPersona => "user_persona",
            StepId::SearchSummarizer => "search_summarizer",
            StepId::Ideation => "ideation",
            StepId::DevilsAdvocate => "devils_advocate",
            StepId::EvaluationCoordinator => "evaluation_coordinator",
            StepId::TechnicalFeasibility => "technical_feasibility",
            StepId::MarketViability => "market_viability",
            StepId::EthicalGuardian => "ethical_guardian",
            StepId::Ranking => "ranking",
            StepId::ReportSynthesizer => "report_synthesizer",
        }
    }

    /// 并行扇出标记步骤
    pub fn is_fan_out(&self) -> bool {
        matches!(self, StepId::ParallelResearch)
    }

    /// 静态元数据，仅用于状态展示，不参与控制流
    pub fn metadata(&self) -> StepMetadata {
        let (name, description, estimated_seconds, output_keys): (
            &'static str,
            &'static str,
            u32,
            &'static [&'static str],
        ) = match self {
                StepId::DocumentSummarizer => (
                    "Document Summarizer",
                    "Summarizes uploaded documents into conversation context",
                    30,
                    &["document_summaries", "document_summary"],
                ),
                StepId::Clarifier => (
                    "Clarifier",
                    "Asks follow-up questions until the user is ready to proceed",
                    15,
                    &["conversation_history"],
                ),
                StepId::ConversationSummarizer => (
                    "Conversation Summarizer",
                    "Condenses the conversation into one paragraph",
                    15,
                    &["summary"],
                ),
                StepId::QueryEnhancer => (
                    "Query Enhancer",
                    "Turns the summary into a formal mission prompt",
                    15,
                    &["enhanced_prompt"],
                ),
                StepId::QueryUnderstanding => (
                    "Query Understanding",
                    "Extracts a structured mission brief",
                    20,
                    &["mission_brief"],
                ),
                StepId::ParallelResearch => (
                    "Parallel Research",
                    "Runs all research agents concurrently",
                    120,
                    &["research_results"],
                ),
                StepId::GenericSearch => (
                    "Generic Search",
                    "Foundational web research",
                    60,
                    &[],
                ),
                StepId::BusinessAnalysis => (
                    "Business Analysis",
                    "Market size and business potential research",
                    60,
                    &[],
                ),
                StepId::DomainSearch => (
                    "Domain Search",
                    "Industry specific research",
                    60,
                    &[],
                ),
                StepId::TrendSpotter => (
                    "Trend Spotter",
                    "Emerging trend research",
                    60,
                    &[],
                ),
                StepId::UserPersona => (
                    "User Persona",
                    "Builds personas for the key user groups",
                    60,
                    &[],
                ),
                StepId::SearchSummarizer => (
                    "Search Summarizer",
                    "Synthesizes research into a creative brief",
                    30,
                    &["creative_brief"],
                ),
                StepId::Ideation => (
                    "Ideation",
                    "Generates or refines use cases",
                    45,
                    &["initial_ideas", "refined_ideas"],
                ),
                StepId::DevilsAdvocate => (
                    "Devil's Advocate",
                    "Critiques the initial use cases",
                    30,
                    &["devils_advocate_feedback"],
                ),
                StepId::EvaluationCoordinator => (
                    "Evaluation Coordinator",
                    "Scores every use case with specialist evaluators",
                    90,
                    &["scored_ideas"],
                ),
                StepId::TechnicalFeasibility => (
                    "Technical Feasibility",
                    "Scores technical feasibility",
                    20,
                    &[],
                ),
                StepId::MarketViability => (
                    "Market Viability",
                    "Scores market viability",
                    20,
                    &[],
                ),
                StepId::EthicalGuardian => (
                    "Ethical Guardian",
                    "Scores ethical risk",
                    20,
                    &[],
                ),
                StepId::Ranking => (
                    "Ranking",
                    "Ranks use cases by their averaged scores",
                    1,
                    &["ranked_ideas"],
                ),
                StepId::ReportSynthesizer => (
                    "Report Synthesizer",
                    "Writes the final markdown strategy report",
                    45,
                    &["final_report"],
                ),
            };

        StepMetadata {
            id: *self,
            name,
            description,
            estimated_seconds,
            output_keys,
            concurrent: self.is_fan_out(),
            interactive: matches!(self, StepId::Clarifier),
        }
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StepId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        StepId::ALL
            .iter()
            .find(|id| id.as_str() == normalized)
            .copied()
            .ok_or_else(|| format!("Unknown step: {}", s))
    }
}

/// 步骤元数据
#[derive(Debug, Clone, Serialize)]
pub struct StepMetadata {
    pub id: StepId,
    pub name: &'static str,
    pub description: &'static str,
    pub estimated_seconds: u32,
    pub output_keys: &'static [&'static str],
    pub concurrent: bool,
    pub interactive: bool,
}
