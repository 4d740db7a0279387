//! rig Provider 适配层
//!
//! 一次模型调用 = [`CallSpec`] 描述的模型、系统提示词与限额。
//! 文本对话走 [`ModelAgent`]，结构化抽取走 rig 的 `Extractor`（[`TypedExtractor`]），
//! 两者都在本层执行单次调用的超时。

use std::future::Future;
use std::time::Duration;

use anyhow::{Result, anyhow};
use rig::agent::Agent;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::extractor::Extractor;
use rig::providers::{anthropic, deepseek, ollama, openai};

use crate::config::{LLMConfig, LLMProvider};
use crate::llm::Extractable;

type OllamaModel = ollama::CompletionModel<reqwest::Client>;

/// 单次调用的参数
#[derive(Debug, Clone)]
pub struct CallSpec<'a> {
    pub model: &'a str,
    pub system_prompt: &'a str,
    pub max_tokens: u64,
    pub temperature: f64,
    pub timeout: Duration,
}

impl<'a> CallSpec<'a> {
    pub fn new(config: &LLMConfig, model: &'a str, system_prompt: &'a str) -> Self {
        Self {
            model,
            system_prompt,
            max_tokens: config.max_tokens.into(),
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

/// 按配置选定的 rig 客户端
#[derive(Clone)]
pub enum ProviderClient {
    OpenAI(openai::Client),
    Anthropic(anthropic::Client),
    DeepSeek(deepseek::Client),
    Ollama(ollama::Client),
}

impl ProviderClient {
    pub fn new(config: &LLMConfig) -> Result<Self> {
        let client = match config.provider {
            LLMProvider::OpenAI => Self::OpenAI(
                openai::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build(),
            ),
            LLMProvider::Anthropic => {
                Self::Anthropic(anthropic::ClientBuilder::new(&config.api_key).build()?)
            }
            LLMProvider::DeepSeek => Self::DeepSeek(
                deepseek::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build(),
            ),
            // 本地服务，不需要密钥
            LLMProvider::Ollama => Self::Ollama(ollama::Client::builder().build()),
        };
        Ok(client)
    }

    /// 文本对话用的 Agent
    pub fn agent(&self, spec: &CallSpec<'_>) -> ModelAgent {
        let inner = match self {
            // OpenAI 兼容服务统一走 chat completions 接口
            Self::OpenAI(client) => AgentInner::OpenAI(
                client
                    .completion_model(spec.model)
                    .completions_api()
                    .into_agent_builder()
                    .preamble(spec.system_prompt)
                    .max_tokens(spec.max_tokens)
                    .temperature(spec.temperature)
                    .build(),
            ),
            Self::Anthropic(client) => AgentInner::Anthropic(
                client
                    .agent(spec.model)
                    .preamble(spec.system_prompt)
                    .max_tokens(spec.max_tokens)
                    .temperature(spec.temperature)
                    .build(),
            ),
            Self::DeepSeek(client) => AgentInner::DeepSeek(
                client
                    .agent(spec.model)
                    .preamble(spec.system_prompt)
                    .max_tokens(spec.max_tokens)
                    .temperature(spec.temperature)
                    .build(),
            ),
            Self::Ollama(client) => AgentInner::Ollama(
                client
                    .agent(spec.model)
                    .preamble(spec.system_prompt)
                    .max_tokens(spec.max_tokens)
                    .temperature(spec.temperature)
                    .build(),
            ),
        };
        ModelAgent {
            inner,
            timeout: spec.timeout,
        }
    }

    /// 抽取 `T` 用的 Extractor，Schema 由 rig 以工具参数的形式交给模型
    pub fn extractor<T: Extractable>(&self, spec: &CallSpec<'_>) -> TypedExtractor<T> {
        let inner = match self {
            Self::OpenAI(client) => ExtractorInner::OpenAI(
                client
                    .extractor_completions_api::<T>(spec.model)
                    .preamble(spec.system_prompt)
                    .max_tokens(spec.max_tokens)
                    .build(),
            ),
            Self::Anthropic(client) => ExtractorInner::Anthropic(
                client
                    .extractor::<T>(spec.model)
                    .preamble(spec.system_prompt)
                    .max_tokens(spec.max_tokens)
                    .build(),
            ),
            Self::DeepSeek(client) => ExtractorInner::DeepSeek(
                client
                    .extractor::<T>(spec.model)
                    .preamble(spec.system_prompt)
                    .max_tokens(spec.max_tokens)
                    .build(),
            ),
            Self::Ollama(client) => ExtractorInner::Ollama(
                client
                    .extractor::<T>(spec.model)
                    .preamble(spec.system_prompt)
                    .max_tokens(spec.max_tokens)
                    .build(),
            ),
        };
        TypedExtractor {
            inner,
            timeout: spec.timeout,
        }
    }
}

enum AgentInner {
    OpenAI(Agent<openai::CompletionModel>),
    Anthropic(Agent<anthropic::completion::CompletionModel>),
    DeepSeek(Agent<deepseek::CompletionModel>),
    Ollama(Agent<OllamaModel>),
}

/// 绑定了模型与系统提示词的对话 Agent
pub struct ModelAgent {
    inner: AgentInner,
    timeout: Duration,
}

impl ModelAgent {
    pub async fn prompt(&self, prompt: &str) -> Result<String> {
        let call = async {
            let reply = match &self.inner {
                AgentInner::OpenAI(agent) => agent.prompt(prompt).await?,
                AgentInner::Anthropic(agent) => agent.prompt(prompt).await?,
                AgentInner::DeepSeek(agent) => agent.prompt(prompt).await?,
                AgentInner::Ollama(agent) => agent.prompt(prompt).await?,
            };
            Ok::<_, anyhow::Error>(reply)
        };
        within(self.timeout, call).await
    }
}

enum ExtractorInner<T: Extractable> {
    OpenAI(Extractor<openai::CompletionModel, T>),
    Anthropic(Extractor<anthropic::completion::CompletionModel, T>),
    DeepSeek(Extractor<deepseek::CompletionModel, T>),
    Ollama(Extractor<OllamaModel, T>),
}

/// 绑定了目标类型的结构化抽取器
pub struct TypedExtractor<T: Extractable> {
    inner: ExtractorInner<T>,
    timeout: Duration,
}

impl<T: Extractable> TypedExtractor<T> {
    pub async fn extract(&self, prompt: &str) -> Result<T> {
        let call = async {
            let value = match &self.inner {
                ExtractorInner::OpenAI(extractor) => extractor.extract(prompt).await?,
                ExtractorInner::Anthropic(extractor) => extractor.extract(prompt).await?,
                ExtractorInner::DeepSeek(extractor) => extractor.extract(prompt).await?,
                ExtractorInner::Ollama(extractor) => extractor.extract(prompt).await?,
            };
            Ok::<_, anyhow::Error>(value)
        };
        within(self.timeout, call).await
    }
}

/// 超时即失败，交由上层重试
async fn within<T>(limit: Duration, call: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| anyhow!("model call timed out after {}s", limit.as_secs()))?
}
