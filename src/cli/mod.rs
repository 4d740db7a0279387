use crate::config::{Config, LLMProvider};
use crate::i18n::TargetLanguage;
use crate::types::document::UploadedDocument;
use crate::workflow::definition::WorkflowVariant;
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::PathBuf;

/// Deep Research RS - 多智能体调研与创意工作流
#[derive(Parser, Debug)]
#[command(name = "deep-research-rs")]
#[command(
    about = "Multi-agent research workflow: clarifies an idea through conversation, researches it in parallel, generates and scores use cases, and writes a final report."
)]
#[command(version)]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// LLM Provider (openai, anthropic, deepseek, ollama)
    #[arg(long)]
    pub provider: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub api_key: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub api_base_url: Option<String>,

    /// 高能效模型，用于常规推理任务
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 高质量模型，用于长输入，以及作为efficient失效情况下的兜底
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 工作流变体 (default, simple, refine)
    #[arg(short, long)]
    pub workflow: Option<String>,

    /// 覆盖内置提示词的 TOML 文件
    #[arg(long)]
    pub prompts: Option<PathBuf>,

    /// 目标语言 (en, zh, ja, ko, de, fr, ru)
    #[arg(long)]
    pub target_language: Option<String>,

    /// 上传的纯文本文档，可重复指定
    #[arg(short, long = "document", value_name = "PATH")]
    pub documents: Vec<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// 将CLI参数转换为配置，命令行参数优先于配置文件
    pub fn into_config(self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(provider) = self.provider {
            config.llm.provider = provider.parse::<LLMProvider>().map_err(|e| anyhow!(e))?;
        }
        if let Some(api_key) = self.api_key {
            config.llm.api_key = api_key;
        }
        if let Some(api_base_url) = self.api_base_url {
            config.llm.api_base_url = api_base_url;
        }
        if let Some(model_efficient) = self.model_efficient {
            config.llm.model_efficient = model_efficient;
        }
        if let Some(model_powerful) = self.model_powerful {
            config.llm.model_powerful = model_powerful;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }

        if let Some(workflow) = self.workflow {
            config.workflow.variant = workflow.parse::<WorkflowVariant>().map_err(|e| anyhow!(e))?;
            // 命令行指定变体时忽略配置文件中的自定义步骤
            config.workflow.steps = None;
        }
        if let Some(prompts) = self.prompts {
            config.prompts_path = Some(prompts);
        }
        if let Some(target_language) = self.target_language {
            config.target_language = target_language
                .parse::<TargetLanguage>()
                .map_err(|e| anyhow!(e))?;
        }

        config.verbose = config.verbose || self.verbose;
        Ok(config)
    }

    /// 读取 `--document` 指定的文件
    pub fn load_documents(&self) -> Result<Vec<UploadedDocument>> {
        self.documents
            .iter()
            .map(|path| {
                let content = std::fs::read_to_string(path)
                    .context(format!("Failed to read document: {:?}", path))?;
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string());
                Ok(UploadedDocument { name, content })
            })
            .collect()
    }
}

// Include tests
#[cfg(test)]
mod tests;
