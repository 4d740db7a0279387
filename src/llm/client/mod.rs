//! LLM客户端 - 基于 rig 的 [`ModelClient`] 实现

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::config::LLMConfig;
use crate::llm::{Extractable, ExtractionKind, ModelClient};
use crate::types::evaluation::EvaluationScore;
use crate::types::mission_brief::MissionBrief;
use crate::types::use_case::UseCases;

mod providers;
pub mod utils;

use providers::{CallSpec, ProviderClient};
use utils::evaluate_befitting_model;

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// 通用重试逻辑，用于处理异步操作的重试机制
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, anyhow::Error>>,
    {
        let max_retries = self.config.retry_attempts.max(1);
        let retry_delay_ms = self.config.retry_delay_ms;
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    warn!(
                        attempt = retries,
                        max_attempts = max_retries,
                        error = %err,
                        "model call failed"
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    tokio::time::sleep(Duration::from_millis(retry_delay_ms)).await;
                }
            }
        }
    }

    async fn prompt_with_model(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String> {
        let agent = self
            .client
            .agent(&CallSpec::new(&self.config, model, system_prompt));
        self.retry_with_backoff(|| agent.prompt(user_prompt)).await
    }

    async fn extract_with_model<T: Extractable>(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<T> {
        let extractor = self
            .client
            .extractor::<T>(&CallSpec::new(&self.config, model, system_prompt));
        self.retry_with_backoff(|| extractor.extract(user_prompt))
            .await
    }

    /// 通过 rig Extractor 抽取 `T`；首选模型失败时带上错误信息改用高质量模型
    pub async fn extract<T: Extractable>(&self, system_prompt: &str, user_prompt: &str) -> Result<T> {
        let (befitting_model, fallover_model) =
            evaluate_befitting_model(&self.config, system_prompt, user_prompt);

        match self
            .extract_with_model::<T>(&befitting_model, system_prompt, user_prompt)
            .await
        {
            Ok(value) => Ok(value),
            Err(e) => match fallover_model {
                Some(model) => {
                    warn!(model = %model, target = %T::KIND, error = %e, "falling back to the powerful model");
                    let user_prompt_with_fixer = format!(
                        "{}\n\nA previous attempt failed with the error \"{}\". Make sure this attempt avoids it.",
                        user_prompt, e
                    );
                    self.extract_with_model::<T>(&model, system_prompt, &user_prompt_with_fixer)
                        .await
                }
                None => Err(e),
            },
        }
    }

    async fn extract_to_value<T: Extractable>(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Value> {
        let value = self.extract::<T>(system_prompt, user_prompt).await?;
        Ok(serde_json::to_value(value)?)
    }
}

#[async_trait]
impl ModelClient for LLMClient {
    async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let (befitting_model, fallover_model) =
            evaluate_befitting_model(&self.config, system_prompt, user_prompt);

        match self
            .prompt_with_model(&befitting_model, system_prompt, user_prompt)
            .await
        {
            Ok(text) => Ok(text),
            Err(e) => match fallover_model {
                Some(model) => {
                    warn!(model = %model, error = %e, "falling back to the powerful model");
                    self.prompt_with_model(&model, system_prompt, user_prompt)
                        .await
                }
                None => Err(e),
            },
        }
    }

    async fn extract_value(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        kind: ExtractionKind,
    ) -> Result<Value> {
        match kind {
            ExtractionKind::MissionBrief => {
                self.extract_to_value::<MissionBrief>(system_prompt, user_prompt)
                    .await
            }
            ExtractionKind::UseCases => {
                self.extract_to_value::<UseCases>(system_prompt, user_prompt)
                    .await
            }
            ExtractionKind::EvaluationScore => {
                self.extract_to_value::<EvaluationScore>(system_prompt, user_prompt)
                    .await
            }
        }
    }
}
