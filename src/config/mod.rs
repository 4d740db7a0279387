use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::i18n::TargetLanguage;
use crate::workflow::clarification::{DEFAULT_HEDGE_PHRASES, DEFAULT_TRIGGER_PHRASES};
use crate::workflow::definition::WorkflowVariant;
use crate::workflow::step::StepId;

/// 工作目录下默认加载的配置文件
pub const DEFAULT_CONFIG_FILE: &str = "deep-research.toml";

/// 读取 API KEY 的环境变量
pub const API_KEY_ENV: &str = "DEEP_RESEARCH_LLM_API_KEY";

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// LLM模型配置
    pub llm: LLMConfig,

    /// 工作流配置
    pub workflow: WorkflowConfig,

    /// 覆盖内置提示词的 TOML 文件
    pub prompts_path: Option<PathBuf>,

    /// 目标语言
    pub target_language: TargetLanguage,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 高能效模型，用于常规推理任务
    pub model_efficient: String,

    /// 高质量模型，用于长输入，以及作为efficient失效情况下的兜底
    pub model_powerful: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 单次模型调用的超时时间（秒）
    pub timeout_seconds: u64,
}

/// 专家评估者
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Evaluator {
    TechnicalFeasibility,
    MarketViability,
    EthicalGuardian,
}

impl Evaluator {
    pub fn step_id(&self) -> StepId {
        match self {
            Evaluator::TechnicalFeasibility => StepId::TechnicalFeasibility,
            Evaluator::MarketViability => StepId::MarketViability,
            Evaluator::EthicalGuardian => StepId::EthicalGuardian,
        }
    }
}

/// 工作流配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct WorkflowConfig {
    /// 使用的工作流变体
    pub variant: WorkflowVariant,

    /// 自定义步骤列表，设置后优先于 variant
    pub steps: Option<Vec<String>>,

    /// start 时校验全部步骤均已注册
    pub validate_on_start: bool,

    /// 单个调研任务的超时时间（秒）
    pub research_task_timeout_seconds: u64,

    /// 表示“可以开始”的触发短语
    pub trigger_phrases: Vec<String>,

    /// 匹配前从消息中移除的习惯用语
    pub hedge_phrases: Vec<String>,

    /// 评估阶段启用的专家
    pub evaluators: Vec<Evaluator>,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 加载显式指定的配置文件；未指定时尝试工作目录下的默认文件
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LLMConfig::default(),
            workflow: WorkflowConfig::default(),
            prompts_path: None,
            target_language: TargetLanguage::default(),
            verbose: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var(API_KEY_ENV).unwrap_or_default(),
            api_base_url: String::from("https://api.openai.com/v1"),
            model_efficient: String::from("gpt-4o-mini"),
            model_powerful: String::from("gpt-4o"),
            max_tokens: 8192,
            temperature: 0.2,
            retry_attempts: 3,
            retry_delay_ms: 2000,
            timeout_seconds: 300,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            variant: WorkflowVariant::default(),
            steps: None,
            validate_on_start: true,
            research_task_timeout_seconds: 600,
            trigger_phrases: DEFAULT_TRIGGER_PHRASES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            hedge_phrases: DEFAULT_HEDGE_PHRASES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            evaluators: vec![Evaluator::TechnicalFeasibility],
        }
    }
}
