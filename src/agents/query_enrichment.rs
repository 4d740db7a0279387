//! 需求澄清与理解阶段

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agents::AgentDeps;
use crate::types::document::{DocumentSummary, UploadedDocument};
use crate::types::mission_brief::MissionBrief;
use crate::workflow::clarification::TriggerMatcher;
use crate::workflow::context::{ContextKeys, ConversationTurn, Role, WorkflowContext};
use crate::workflow::handler::{StepHandler, StepOutcome};
use crate::workflow::step::StepId;

/// 摘要中保留的原文长度
const EXCERPT_CHARS: usize = 1000;

/// 渲染对话历史，每轮一行
pub fn format_history(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            format!("{}: {}", speaker, turn.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 上传文档摘要
pub struct DocumentSummarizer {
    deps: AgentDeps,
}

impl DocumentSummarizer {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl StepHandler for DocumentSummarizer {
    async fn execute(
        &self,
        context: &mut WorkflowContext,
        _cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let documents: Vec<UploadedDocument> = context
            .get(ContextKeys::UPLOADED_DOCUMENTS)
            .unwrap_or_default();
        if documents.is_empty() {
            debug!("no uploaded documents, skipping");
            return Ok(StepOutcome::Completed);
        }

        let mut summaries = Vec::with_capacity(documents.len());
        for document in &documents {
            let excerpt: String = document.content.chars().take(EXCERPT_CHARS).collect();
            // 单个文档失败不影响其余文档
            let summary = match self
                .deps
                .prompt(
                    StepId::DocumentSummarizer,
                    "summarize",
                    &[
                        ("file_name", document.name.as_str()),
                        ("content", document.content.as_str()),
                    ],
                )
                .await
            {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(file = %document.name, error = %e, "document summary failed");
                    format!("Error processing file: {}", e)
                }
            };
            summaries.push(DocumentSummary {
                file_name: document.name.clone(),
                excerpt,
                summary,
            });
        }

        let consolidated = summaries
            .iter()
            .map(|s| format!("- {}: {}", s.file_name, s.summary))
            .collect::<Vec<_>>()
            .join("\n");

        info!(documents = summaries.len(), "documents summarized");
        context.store(ContextKeys::DOCUMENT_SUMMARIES, &summaries)?;
        context.store(ContextKeys::DOCUMENT_SUMMARY, consolidated)?;
        Ok(StepOutcome::Completed)
    }
}

/// 多轮澄清
///
/// 最新的用户发言包含触发短语时结束澄清，否则生成追问并挂起运行。
pub struct Clarifier {
    deps: AgentDeps,
    matcher: TriggerMatcher,
}

impl Clarifier {
    pub fn new(deps: AgentDeps, matcher: TriggerMatcher) -> Self {
        Self { deps, matcher }
    }
}

#[async_trait]
impl StepHandler for Clarifier {
    async fn execute(
        &self,
        context: &mut WorkflowContext,
        _cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let history: Vec<ConversationTurn> = context.require(ContextKeys::CONVERSATION_HISTORY)?;
        let latest = context.latest_user_message().unwrap_or_default();

        if let Some(phrase) = self.matcher.matched_phrase(&latest) {
            info!(phrase = %phrase, "clarification finished");
            return Ok(StepOutcome::Completed);
        }

        let document_context = context
            .get::<String>(ContextKeys::DOCUMENT_SUMMARY)
            .map(|summary| format!("Uploaded document summary:\n{}\n", summary))
            .unwrap_or_default();

        let conversation = format_history(&history);
        let question = self
            .deps
            .prompt(
                StepId::Clarifier,
                "interactive",
                &[
                    ("conversation", conversation.as_str()),
                    ("latest_message", latest.as_str()),
                    ("document_context", document_context.as_str()),
                ],
            )
            .await?;

        Ok(StepOutcome::suspended(question.trim()))
    }
}

/// 将对话压缩为一段摘要
pub struct ConversationSummarizer {
    deps: AgentDeps,
}

impl ConversationSummarizer {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl StepHandler for ConversationSummarizer {
    async fn execute(
        &self,
        context: &mut WorkflowContext,
        _cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let history: Vec<ConversationTurn> = context.require(ContextKeys::CONVERSATION_HISTORY)?;
        let conversation = format_history(&history);
        let summary = self
            .deps
            .prompt(
                StepId::ConversationSummarizer,
                "summarize",
                &[("conversation", conversation.as_str())],
            )
            .await?;

        context.store(ContextKeys::SUMMARY, summary.trim())?;
        Ok(StepOutcome::Completed)
    }
}

/// 将摘要改写为正式的任务描述
pub struct QueryEnhancer {
    deps: AgentDeps,
}

impl QueryEnhancer {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl StepHandler for QueryEnhancer {
    async fn execute(
        &self,
        context: &mut WorkflowContext,
        _cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let summary: String = context.require(ContextKeys::SUMMARY)?;
        let enhanced = self
            .deps
            .prompt(StepId::QueryEnhancer, "enhance", &[("summary", summary.as_str())])
            .await?;

        context.store(ContextKeys::ENHANCED_PROMPT, enhanced.trim())?;
        Ok(StepOutcome::Completed)
    }
}

/// 抽取结构化的任务简报
pub struct QueryUnderstanding {
    deps: AgentDeps,
}

impl QueryUnderstanding {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl StepHandler for QueryUnderstanding {
    async fn execute(
        &self,
        context: &mut WorkflowContext,
        _cancel: &CancellationToken,
    ) -> Result<StepOutcome> {
        let enhanced_prompt: String = context.require(ContextKeys::ENHANCED_PROMPT)?;
        let brief: MissionBrief = self
            .deps
            .extract(
                StepId::QueryUnderstanding,
                "analyze",
                &[("enhanced_prompt", enhanced_prompt.as_str())],
            )
            .await?;

        let empty = brief.empty_queries();
        if !empty.is_empty() {
            warn!(fields = ?empty, "mission brief has empty sub-queries");
        }
        info!(topic = %brief.main_topic, industry = %brief.industry, "mission brief ready");

        context.store(ContextKeys::MISSION_BRIEF, &brief)?;
        Ok(StepOutcome::Completed)
    }
}
