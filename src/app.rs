//! 组装配置、模型与工作流，驱动交互式会话

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;

use crate::agents::{AgentDeps, default_registry};
use crate::config::Config;
use crate::conversation::ConversationManager;
use crate::llm::SharedModel;
use crate::llm::client::LLMClient;
use crate::prompts::PromptService;
use crate::types::document::UploadedDocument;
use crate::types::evaluation::RankedEntry;
use crate::workflow::context::ContextKeys;
use crate::workflow::definition::WorkflowDefinition;
use crate::workflow::orchestrator::{Orchestrator, RunOutcome};
use crate::workflow::registry::AgentRegistry;

/// 按配置确定工作流：自定义步骤优先于变体；有上传文档时在最前面插入文档摘要
pub fn workflow_definition(config: &Config, with_documents: bool) -> Result<WorkflowDefinition> {
    let workflow = match &config.workflow.steps {
        Some(steps) => WorkflowDefinition::parse("custom", steps)?,
        None => WorkflowDefinition::from_variant(config.workflow.variant),
    };
    Ok(if with_documents {
        workflow.with_document_summarizer()
    } else {
        workflow
    })
}

/// 加载提示词，存在覆盖文件时合并
pub fn prompt_service(config: &Config) -> Result<PromptService> {
    match &config.prompts_path {
        Some(path) => PromptService::from_file(path, config.target_language.clone()),
        None => Ok(PromptService::new(config.target_language.clone())),
    }
}

/// 以给定模型构建处理器注册表
pub fn build_registry(config: &Config, model: SharedModel) -> Result<AgentRegistry> {
    let prompts = Arc::new(prompt_service(config)?);
    Ok(default_registry(
        AgentDeps::new(model, prompts),
        &config.workflow,
    ))
}

/// 构建会话管理器
pub fn conversation_manager(
    config: &Config,
    model: SharedModel,
    with_documents: bool,
) -> Result<ConversationManager> {
    let registry = Arc::new(build_registry(config, model)?);
    let workflow = workflow_definition(config, with_documents)?;
    Ok(ConversationManager::new(registry, workflow)
        .with_eager_validation(config.workflow.validate_on_start))
}

/// 读取下一条非空输入，输入结束时返回 None
async fn next_input(lines: &mut Lines<BufReader<Stdin>>) -> Result<Option<String>> {
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if !line.is_empty() {
            return Ok(Some(line.to_string()));
        }
    }
    Ok(None)
}

fn print_results(orchestrator: &Orchestrator, verbose: bool) -> Result<()> {
    let ranked: Vec<RankedEntry> = orchestrator
        .context_value(ContextKeys::RANKED_IDEAS)
        .unwrap_or_default();
    if !ranked.is_empty() {
        println!("\n## Ranked use cases\n");
        for (i, entry) in ranked.iter().enumerate() {
            println!("{}. [{:.2}] {}", i + 1, entry.overall_score, entry.idea);
        }
    }

    if let Some(report) = orchestrator.context_value::<String>(ContextKeys::FINAL_REPORT) {
        println!("\n{}\n", report);
    }

    if verbose {
        let summary = orchestrator.get_context_summary(false);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

/// 交互式运行一次完整的工作流
pub async fn launch(config: &Config, documents: Vec<UploadedDocument>) -> Result<()> {
    let model: SharedModel = Arc::new(LLMClient::new(config.llm.clone())?);
    let manager = conversation_manager(config, model, !documents.is_empty())?;
    let (id, orchestrator) = manager.create().await;
    info!(
        conversation = %id,
        workflow = %orchestrator.workflow().name(),
        language = config.target_language.display_name(),
        "session ready"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Describe the idea you want to explore:");
    let Some(idea) = next_input(&mut lines).await? else {
        manager.end(&id).await;
        return Ok(());
    };

    let mut outcome = orchestrator.start_with_documents(idea, documents).await;
    loop {
        match outcome {
            Ok(RunOutcome::AwaitingInput { question }) => {
                println!("\n{}\n", question);
                match next_input(&mut lines).await? {
                    Some(answer) => outcome = orchestrator.resume(answer).await,
                    None => break,
                }
            }
            Ok(RunOutcome::Completed { use_cases }) => {
                info!(use_cases = use_cases.len(), "workflow finished");
                print_results(&orchestrator, config.verbose)?;
                break;
            }
            Err(e) => {
                manager.end(&id).await;
                return Err(e.into());
            }
        }
    }

    manager.end(&id).await;
    Ok(())
}
