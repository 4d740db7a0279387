use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::TempDir;

use deep_research_rs::app::{build_registry, conversation_manager, workflow_definition};
use deep_research_rs::config::{Config, Evaluator};
use deep_research_rs::llm::{ExtractionKind, ModelClient, SharedModel};
use deep_research_rs::types::document::UploadedDocument;
use deep_research_rs::types::evaluation::RankedEntry;
use deep_research_rs::workflow::{
    ContextKeys, ConversationTurn, Orchestrator, RunOutcome, RunStatus, StepId, StepStatus,
    WorkflowDefinition, WorkflowError, WorkflowVariant,
};

/// 不访问网络的脚本化模型
struct MockModel {
    fail_on: Option<&'static str>,
}

fn use_case(name: &str, impact: u8, alignment: u8) -> Value {
    json!({
        "name": name,
        "description": format!("{} for emergency departments", name),
        "area": "Clinical Operations",
        "category": "Automation",
        "priority": 1,
        "impact_score": impact,
        "implementation_complexity": "High",
        "alignment_score": alignment,
        "business_value": "Shorter waiting times",
        "estimated_roi": "15% fewer readmissions",
        "key_benefits": ["speed"],
        "estimated_timeline": "6 months",
        "technologies_used": ["LLM"]
    })
}

#[async_trait]
impl ModelClient for MockModel {
    async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        if let Some(marker) = self.fail_on {
            if user_prompt.contains(marker) {
                return Err(anyhow!("rate limited"));
            }
        }
        if system_prompt.starts_with("You are a clarifier") {
            return Ok("Which hospitals will pilot the app?".to_string());
        }
        if user_prompt.starts_with("Write the final report") {
            return Ok("# Final Report\n\nTriage Copilot ranks first.".to_string());
        }
        Ok(format!(
            "output for: {}",
            user_prompt.lines().next().unwrap_or_default()
        ))
    }

    async fn extract_value(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        kind: ExtractionKind,
    ) -> Result<Value> {
        match kind {
            ExtractionKind::MissionBrief => Ok(json!({
                "main_topic": "AI-assisted triage",
                "industry": "healthcare",
                "tools_and_tech": ["LLM", "EHR"],
                "filters": {"include": ["hospitals"], "exclude": []},
                "decomposed_tasks": {
                    "generic_search_query": "AI triage state of the art",
                    "business_analysis_query": "AI triage market size",
                    "domain_specific_query": "emergency department triage",
                    "trend_spotter_query": "clinical AI adoption"
                }
            })),
            ExtractionKind::UseCases if user_prompt.contains("critical feedback") => Ok(json!({
                "use_cases": [use_case("Refined Triage Copilot", 8, 9)]
            })),
            ExtractionKind::UseCases => Ok(json!({
                "use_cases": [
                    use_case("Bed Planner", 6, 5),
                    use_case("Triage Copilot", 9, 9)
                ]
            })),
            ExtractionKind::EvaluationScore => {
                let score = if user_prompt.contains("Triage Copilot") { 9 } else { 4 };
                Ok(json!({"agent": "evaluator", "score": score, "justification": "mock"}))
            }
        }
    }
}

fn model(fail_on: Option<&'static str>) -> SharedModel {
    Arc::new(MockModel { fail_on })
}

fn orchestrator(config: &Config, fail_on: Option<&'static str>, with_documents: bool) -> Orchestrator {
    let registry = build_registry(config, model(fail_on)).unwrap();
    let workflow = workflow_definition(config, with_documents).unwrap();
    Orchestrator::new(Arc::new(registry), workflow)
}

#[tokio::test]
async fn test_default_workflow_end_to_end() {
    let mut config = Config::default();
    config.workflow.evaluators = vec![Evaluator::TechnicalFeasibility, Evaluator::MarketViability];
    let orchestrator = orchestrator(&config, None, false);

    let outcome = orchestrator
        .start("I want an AI app for hospital triage")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        RunOutcome::AwaitingInput {
            question: "Which hospitals will pilot the app?".to_string()
        }
    );
    let status = orchestrator.get_status();
    assert_eq!(status.status, RunStatus::AwaitingInput);
    assert_eq!(status.current_index, 0);
    assert!(status.history.is_empty());

    let outcome = orchestrator.resume("Two city hospitals. Yes, go ahead").await.unwrap();
    let RunOutcome::Completed { use_cases } = outcome else {
        panic!("expected completion");
    };
    assert_eq!(use_cases.len(), 2);

    let status = orchestrator.get_status();
    assert_eq!(status.status, RunStatus::Completed);
    assert_eq!(status.progress_percent, 100.0);
    assert_eq!(status.history.len(), 10);
    assert!(status.history.iter().all(|r| r.status == StepStatus::Completed));
    assert_eq!(status.history[4].step, StepId::ParallelResearch);

    let history: Vec<ConversationTurn> = orchestrator
        .context_value(ContextKeys::CONVERSATION_HISTORY)
        .unwrap();
    assert_eq!(history.len(), 3);

    let research: Vec<String> = orchestrator
        .context_value(ContextKeys::RESEARCH_RESULTS)
        .unwrap();
    assert_eq!(research.len(), 5);

    let ranked: Vec<RankedEntry> = orchestrator
        .context_value(ContextKeys::RANKED_IDEAS)
        .unwrap();
    assert!(ranked[0].idea.starts_with("Triage Copilot"));
    assert_eq!(ranked[0].overall_score, 9.0);
    assert_eq!(ranked[0].scores.len(), 2);
    assert_eq!(ranked[1].overall_score, 4.0);

    let report: String = orchestrator
        .context_value(ContextKeys::FINAL_REPORT)
        .unwrap();
    assert!(report.starts_with("# Final Report"));

    let err = orchestrator.resume("one more thing").await.unwrap_err();
    assert!(matches!(err, WorkflowError::RunFinished(RunStatus::Completed)));
}

#[tokio::test]
async fn test_refine_workflow_with_documents() {
    let mut config = Config::default();
    config.workflow.variant = WorkflowVariant::Refine;
    let orchestrator = orchestrator(&config, None, true);
    assert_eq!(orchestrator.workflow().steps()[0], StepId::DocumentSummarizer);

    let documents = vec![UploadedDocument {
        name: "strategy.txt".to_string(),
        content: "We operate 12 hospitals and want to cut waiting times.".to_string(),
    }];
    let outcome = orchestrator
        .start_with_documents("start the agent", documents)
        .await
        .unwrap();

    let RunOutcome::Completed { use_cases } = outcome else {
        panic!("expected completion");
    };
    assert_eq!(use_cases.len(), 1);
    assert_eq!(use_cases[0]["name"], "Refined Triage Copilot");

    let status = orchestrator.get_status();
    assert_eq!(status.history.len(), 13);
    assert!(status.context_summary.contains_key(ContextKeys::DOCUMENT_SUMMARY));
    assert!(status.context_summary.contains_key(ContextKeys::DEVILS_ADVOCATE_FEEDBACK));
    assert!(status.context_summary.contains_key(ContextKeys::INITIAL_IDEAS));
}

#[tokio::test]
async fn test_simple_workflow_ranks_self_assessed_scores() {
    let mut config = Config::default();
    config.workflow.variant = WorkflowVariant::Simple;
    let orchestrator = orchestrator(&config, None, false);

    orchestrator.start("okay").await.unwrap();

    assert_eq!(orchestrator.get_status().history.len(), 9);
    let summary = orchestrator.get_context_summary(false);
    assert!(!summary.contains_key(ContextKeys::SCORED_IDEAS));

    let ranked: Vec<RankedEntry> = orchestrator
        .context_value(ContextKeys::RANKED_IDEAS)
        .unwrap();
    assert!(ranked[0].idea.starts_with("Triage Copilot"));
    assert_eq!(ranked[1].overall_score, 5.5);
}

#[tokio::test]
async fn test_report_failure_is_terminal() {
    let config = Config::default();
    let orchestrator = orchestrator(&config, Some("Write the final report"), false);

    let err = orchestrator.start("proceed").await.unwrap_err();
    match &err {
        WorkflowError::StepFailed { step, index, message } => {
            assert_eq!(*step, StepId::ReportSynthesizer);
            assert_eq!(*index, 9);
            assert!(message.contains("rate limited"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let status = orchestrator.get_status();
    assert_eq!(status.status, RunStatus::Error);
    assert_eq!(status.history.len(), 10);
    assert_eq!(status.history[9].status, StepStatus::Error);
    assert!(status.context_summary.contains_key(ContextKeys::RANKED_IDEAS));
    assert!(!status.context_summary.contains_key(ContextKeys::FINAL_REPORT));

    let err = orchestrator.resume("try again").await.unwrap_err();
    assert!(matches!(err, WorkflowError::RunFinished(RunStatus::Error)));
}

#[tokio::test]
async fn test_custom_steps_and_prompt_overrides_from_files() {
    let temp_dir = TempDir::new().unwrap();
    let prompts_path = temp_dir.path().join("prompts.toml");
    std::fs::write(
        &prompts_path,
        r#"
[query_enhancer.templates]
enhance = "MISSION FROM: {summary}"
"#,
    )
    .unwrap();
    let config_path = temp_dir.path().join("deep-research.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
prompts_path = {:?}

[workflow]
steps = ["clarifier", "conversation_summarizer", "query_enhancer"]
"#,
            prompts_path.to_string_lossy()
        ),
    )
    .unwrap();

    let config = Config::from_file(&config_path).unwrap();
    let manager = conversation_manager(&config, model(None), false).unwrap();
    let (id, orchestrator) = manager.create().await;

    let outcome = orchestrator.start("begin").await.unwrap();
    assert_eq!(outcome, RunOutcome::Completed { use_cases: vec![] });

    let enhanced: String = orchestrator
        .context_value(ContextKeys::ENHANCED_PROMPT)
        .unwrap();
    assert_eq!(enhanced, "output for: MISSION FROM: output for: Summarize the following conversation into one paragraph:");

    assert!(manager.end(&id).await);
    assert!(manager.is_empty().await);
}

#[test]
fn test_unknown_custom_step_is_rejected() {
    let mut config = Config::default();
    config.workflow.steps = Some(vec!["clarifier".to_string(), "librarian".to_string()]);
    let err = workflow_definition(&config, false).unwrap_err();
    assert!(err.to_string().contains("librarian"));
}

#[test]
fn test_default_definition_matches_pipeline() {
    let workflow = workflow_definition(&Config::default(), false).unwrap();
    assert_eq!(workflow, WorkflowDefinition::default_pipeline());
}
