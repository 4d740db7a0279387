use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::evaluation::{EvaluationCoordinator, Ranking, overall_score, rank};
use super::ideation::{DevilsAdvocate, Ideation};
use super::query_enrichment::{Clarifier, DocumentSummarizer, QueryUnderstanding};
use super::research::ParallelResearch;
use super::*;
use crate::config::Evaluator;
use crate::llm::{ExtractionKind, ModelClient};
use crate::types::document::{DocumentSummary, UploadedDocument};
use crate::types::evaluation::{EvaluationScore, RankedEntry, ScoredIdea};
use crate::types::mission_brief::MissionBrief;
use crate::workflow::definition::WorkflowDefinition;
use crate::workflow::handler::{StepHandler, StepOutcome, SyncStepHandler};

/// 按提示词内容给出固定回复的模型
#[derive(Default)]
struct MockModel {
    prompts: Mutex<Vec<String>>,
    fail_on: Option<&'static str>,
}

impl MockModel {
    fn failing_on(marker: &'static str) -> Self {
        Self {
            fail_on: Some(marker),
            ..Default::default()
        }
    }

    fn record(&self, user_prompt: &str) -> Result<()> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(user_prompt.to_string());
        }
        match self.fail_on {
            Some(marker) if user_prompt.contains(marker) => Err(anyhow!("provider unavailable")),
            _ => Ok(()),
        }
    }

    fn prompt_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }
}

fn use_case(name: &str, impact: u8, alignment: u8) -> Value {
    json!({
        "name": name,
        "description": format!("{} description", name),
        "area": "Operations",
        "category": "Automation",
        "priority": 2,
        "impact_score": impact,
        "implementation_complexity": "Medium",
        "alignment_score": alignment,
        "business_value": "Saves time",
        "estimated_roi": "20%",
        "estimated_timeline": "3 months"
    })
}

#[async_trait]
impl ModelClient for MockModel {
    async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.record(user_prompt)?;
        if system_prompt.starts_with("You are a clarifier") {
            return Ok("  Who are the target users?\n".to_string());
        }
        let first_line = user_prompt.lines().next().unwrap_or_default();
        Ok(format!("response to: {}", first_line))
    }

    async fn extract_value(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        kind: ExtractionKind,
    ) -> Result<Value> {
        self.record(user_prompt)?;
        match kind {
            ExtractionKind::MissionBrief => Ok(json!({
                "main_topic": "AI triage",
                "industry": "healthcare",
                "tools_and_tech": ["LLM"],
                "filters": {"include": [], "exclude": []},
                "decomposed_tasks": {
                    "generic_search_query": "AI triage overview",
                    "business_analysis_query": "AI triage market",
                    "domain_specific_query": "triage in emergency rooms",
                    "trend_spotter_query": "triage automation trends"
                }
            })),
            ExtractionKind::UseCases if user_prompt.contains("critical feedback") => Ok(json!({
                "use_cases": [use_case("Refined Alpha", 5, 5)]
            })),
            ExtractionKind::UseCases => Ok(json!({
                "use_cases": [use_case("Alpha", 4, 6), use_case("Beta", 9, 9)]
            })),
            ExtractionKind::EvaluationScore => {
                let score = if user_prompt.contains("Beta") { 9 } else { 12 };
                Ok(json!({"agent": "whoever", "score": score, "justification": "ok"}))
            }
        }
    }
}

fn deps(model: MockModel) -> (AgentDeps, Arc<MockModel>) {
    let model = Arc::new(model);
    let deps = AgentDeps::new(model.clone(), Arc::new(PromptService::default()));
    (deps, model)
}

fn cancel() -> CancellationToken {
    CancellationToken::new()
}

#[tokio::test]
async fn test_clarifier_asks_until_trigger_phrase() {
    let (deps, _) = deps(MockModel::default());
    let clarifier = Clarifier::new(deps, TriggerMatcher::default());

    let mut context = WorkflowContext::with_initial_message("I want an AI triage app");
    let outcome = clarifier.execute(&mut context, &cancel()).await.unwrap();
    assert_eq!(outcome, StepOutcome::suspended("Who are the target users?"));

    context.push_turn(crate::workflow::context::ConversationTurn::assistant(
        "Who are the target users?",
    ));
    context.push_turn(crate::workflow::context::ConversationTurn::user(
        "Nurses. Yes, go ahead",
    ));
    let outcome = clarifier.execute(&mut context, &cancel()).await.unwrap();
    assert_eq!(outcome, StepOutcome::Completed);
}

#[tokio::test]
async fn test_clarifier_requires_history() {
    let (deps, model) = deps(MockModel::default());
    let clarifier = Clarifier::new(deps, TriggerMatcher::default());

    let err = clarifier
        .execute(&mut WorkflowContext::new(), &cancel())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("conversation_history"));
    assert_eq!(model.prompt_count(), 0);
}

#[tokio::test]
async fn test_clarifier_includes_document_summary() {
    let (deps, model) = deps(MockModel::default());
    let clarifier = Clarifier::new(deps, TriggerMatcher::default());

    let mut context = WorkflowContext::with_initial_message("Help with our roadmap");
    context
        .store(ContextKeys::DOCUMENT_SUMMARY, "- plan.txt: expand to Europe")
        .unwrap();
    clarifier.execute(&mut context, &cancel()).await.unwrap();

    let prompts = model.prompts.lock().unwrap();
    assert!(prompts[0].contains("expand to Europe"));
    assert!(prompts[0].contains("user: Help with our roadmap"));
}

#[tokio::test]
async fn test_document_summarizer_skips_without_documents() {
    let (deps, model) = deps(MockModel::default());
    let summarizer = DocumentSummarizer::new(deps);

    let mut context = WorkflowContext::with_initial_message("hi");
    let outcome = summarizer.execute(&mut context, &cancel()).await.unwrap();

    assert_eq!(outcome, StepOutcome::Completed);
    assert!(!context.has(ContextKeys::DOCUMENT_SUMMARIES));
    assert_eq!(model.prompt_count(), 0);
}

#[tokio::test]
async fn test_document_summarizer_keeps_going_after_failure() {
    let (deps, _) = deps(MockModel::failing_on("broken.txt"));
    let summarizer = DocumentSummarizer::new(deps);

    let mut context = WorkflowContext::with_initial_message("hi");
    let documents = vec![
        UploadedDocument {
            name: "plan.txt".to_string(),
            content: "x".repeat(1500),
        },
        UploadedDocument {
            name: "broken.txt".to_string(),
            content: "unreadable".to_string(),
        },
    ];
    context
        .store(ContextKeys::UPLOADED_DOCUMENTS, &documents)
        .unwrap();

    summarizer.execute(&mut context, &cancel()).await.unwrap();

    let summaries: Vec<DocumentSummary> = context.require(ContextKeys::DOCUMENT_SUMMARIES).unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].excerpt.len(), 1000);
    assert!(summaries[0].summary.starts_with("response to:"));
    assert!(summaries[1].summary.starts_with("Error processing file:"));

    let consolidated: String = context.require(ContextKeys::DOCUMENT_SUMMARY).unwrap();
    assert!(consolidated.contains("- plan.txt:"));
    assert!(consolidated.contains("- broken.txt:"));
}

#[tokio::test]
async fn test_query_understanding_stores_mission_brief() {
    let (deps, _) = deps(MockModel::default());
    let step = QueryUnderstanding::new(deps);

    let mut context = WorkflowContext::new();
    context
        .store(ContextKeys::ENHANCED_PROMPT, "Your mission is to: study AI triage")
        .unwrap();
    step.execute(&mut context, &cancel()).await.unwrap();

    let brief: MissionBrief = context.require(ContextKeys::MISSION_BRIEF).unwrap();
    assert_eq!(brief.industry, "healthcare");
    assert!(brief.empty_queries().is_empty());
}

#[tokio::test]
async fn test_parallel_research_absorbs_task_failure() {
    let (deps, _) = deps(MockModel::failing_on("emerging trends"));
    let step = ParallelResearch::new(deps, Duration::from_secs(5));

    let mut context = WorkflowContext::new();
    context
        .store(ContextKeys::MISSION_BRIEF, MissionBrief::default())
        .unwrap();
    let outcome = step.execute(&mut context, &cancel()).await.unwrap();
    assert_eq!(outcome, StepOutcome::Completed);

    let results: Vec<String> = context.require(ContextKeys::RESEARCH_RESULTS).unwrap();
    assert_eq!(results.len(), 5);
    assert!(results[0].starts_with("response to: Research the following topic"));
    assert!(results[2].starts_with("response to: Within the  domain"));
    assert_eq!(results[3], "Error in Trend Spotter: provider unavailable");
    assert!(results[4].starts_with("response to: Create detailed personas"));
}

#[tokio::test]
async fn test_parallel_research_requires_mission_brief() {
    let (deps, model) = deps(MockModel::default());
    let step = ParallelResearch::new(deps, Duration::from_secs(5));

    let err = step
        .execute(&mut WorkflowContext::new(), &cancel())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("mission_brief"));
    assert_eq!(model.prompt_count(), 0);
}

#[tokio::test]
async fn test_ideation_refines_when_feedback_exists() {
    let (deps, _) = deps(MockModel::default());
    let ideation = Ideation::new(deps.clone());
    let advocate = DevilsAdvocate::new(deps);

    let mut context = WorkflowContext::new();
    context
        .store(ContextKeys::CREATIVE_BRIEF, "Brief about triage")
        .unwrap();

    ideation.execute(&mut context, &cancel()).await.unwrap();
    let initial: Vec<UseCase> = context.require(ContextKeys::INITIAL_IDEAS).unwrap();
    assert_eq!(initial.len(), 2);
    assert!(!context.has(ContextKeys::REFINED_IDEAS));

    advocate.execute(&mut context, &cancel()).await.unwrap();
    assert!(context.has(ContextKeys::DEVILS_ADVOCATE_FEEDBACK));

    ideation.execute(&mut context, &cancel()).await.unwrap();
    let refined: Vec<UseCase> = context.require(ContextKeys::REFINED_IDEAS).unwrap();
    assert_eq!(refined[0].name, "Refined Alpha");
    assert_eq!(chosen_use_cases(&context).unwrap(), refined);
}

#[tokio::test]
async fn test_evaluation_then_ranking() {
    let (deps, _) = deps(MockModel::default());
    let coordinator = EvaluationCoordinator::new(
        deps.clone(),
        vec![Evaluator::TechnicalFeasibility, Evaluator::MarketViability],
    );

    let mut context = WorkflowContext::new();
    context
        .store(ContextKeys::CREATIVE_BRIEF, "Brief about triage")
        .unwrap();
    Ideation::new(deps)
        .execute(&mut context, &cancel())
        .await
        .unwrap();

    coordinator.execute(&mut context, &cancel()).await.unwrap();
    let scored: Vec<ScoredIdea> = context.require(ContextKeys::SCORED_IDEAS).unwrap();
    assert_eq!(scored.len(), 2);
    assert_eq!(scored[0].scores[0].agent, "technical_feasibility");
    assert_eq!(scored[0].scores[1].agent, "market_viability");
    // 超出范围的分数被截断到 10
    assert_eq!(scored[0].scores[0].score, 10);

    SyncStepHandler::execute(&Ranking, &mut context).unwrap();
    let ranked: Vec<RankedEntry> = context.require(ContextKeys::RANKED_IDEAS).unwrap();
    assert_eq!(ranked[0].overall_score, 10.0);
    assert!(ranked[0].idea.starts_with("Alpha"));
    assert_eq!(ranked[1].overall_score, 9.0);
}

#[test]
fn test_ranking_falls_back_to_self_assessed_scores() {
    let mut context = WorkflowContext::new();
    let ideas: Vec<UseCase> = serde_json::from_value(json!([
        use_case("Alpha", 4, 6),
        use_case("Beta", 9, 8)
    ]))
    .unwrap();
    context.store(ContextKeys::INITIAL_IDEAS, &ideas).unwrap();

    SyncStepHandler::execute(&Ranking, &mut context).unwrap();

    let ranked: Vec<RankedEntry> = context.require(ContextKeys::RANKED_IDEAS).unwrap();
    assert!(ranked[0].idea.starts_with("Beta"));
    assert_eq!(ranked[0].overall_score, 8.5);
    assert_eq!(ranked[1].overall_score, 5.0);
}

#[test]
fn test_ranking_without_ideas_fails() {
    let mut context = WorkflowContext::new();
    let err = SyncStepHandler::execute(&Ranking, &mut context).unwrap_err();
    assert!(err.to_string().contains("initial_ideas"));
}

fn score(value: u8) -> EvaluationScore {
    EvaluationScore {
        agent: "technical_feasibility".to_string(),
        score: value,
        justification: String::new(),
    }
}

#[test]
fn test_overall_score_rounds_to_two_decimals() {
    assert_eq!(overall_score(&[score(7), score(8), score(8)]), 7.67);
    assert_eq!(overall_score(&[]), 0.0);
}

#[test]
fn test_rank_is_stable_for_ties() {
    let scored = vec![
        ScoredIdea {
            idea: "first".to_string(),
            scores: vec![score(6)],
        },
        ScoredIdea {
            idea: "unscored".to_string(),
            scores: vec![],
        },
        ScoredIdea {
            idea: "second".to_string(),
            scores: vec![score(6)],
        },
        ScoredIdea {
            idea: "best".to_string(),
            scores: vec![score(9)],
        },
    ];

    let order: Vec<String> = rank(scored).into_iter().map(|e| e.idea).collect();
    assert_eq!(order, vec!["best", "first", "second", "unscored"]);
}

#[test]
fn test_default_registry_covers_builtin_workflows() {
    let (deps, _) = deps(MockModel::default());
    let registry = default_registry(deps, &WorkflowConfig::default());

    for workflow in [
        WorkflowDefinition::default_pipeline(),
        WorkflowDefinition::simple(),
        WorkflowDefinition::refine().with_document_summarizer(),
    ] {
        assert!(registry.validate(&workflow).is_ok(), "{}", workflow.name());
    }
    assert!(!registry.is_registered(StepId::GenericSearch));
}
