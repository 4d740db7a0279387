//! 模型调用抽象
//!
//! 步骤处理器只依赖 [`ModelClient`]，具体的 Provider 实现在 [`client`] 中。

use std::fmt;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::evaluation::EvaluationScore;
use crate::types::mission_brief::MissionBrief;
use crate::types::use_case::UseCases;

pub mod client;

/// 可在并发任务间共享的模型句柄
pub type SharedModel = Arc<dyn ModelClient>;

/// 需要结构化抽取的输出类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionKind {
    MissionBrief,
    UseCases,
    EvaluationScore,
}

impl fmt::Display for ExtractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractionKind::MissionBrief => "MissionBrief",
            ExtractionKind::UseCases => "UseCases",
            ExtractionKind::EvaluationScore => "EvaluationScore",
        };
        f.write_str(name)
    }
}

/// 可由模型抽取的类型，`KIND` 让对象安全的 [`ModelClient`] 选择具体的抽取器
pub trait Extractable: JsonSchema + DeserializeOwned + Serialize + Send + Sync + 'static {
    const KIND: ExtractionKind;
}

impl Extractable for MissionBrief {
    const KIND: ExtractionKind = ExtractionKind::MissionBrief;
}

impl Extractable for UseCases {
    const KIND: ExtractionKind = ExtractionKind::UseCases;
}

impl Extractable for EvaluationScore {
    const KIND: ExtractionKind = ExtractionKind::EvaluationScore;
}

/// 统一的模型调用接口
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// 自由文本对话
    async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    /// 抽取 `kind` 对应类型的结构化数据，以 JSON 值返回
    async fn extract_value(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        kind: ExtractionKind,
    ) -> Result<Value>;
}

/// 抽取结构化数据并反序列化为 `T`
pub async fn extract<T: Extractable>(
    model: &dyn ModelClient,
    system_prompt: &str,
    user_prompt: &str,
) -> Result<T> {
    let value = model
        .extract_value(system_prompt, user_prompt, T::KIND)
        .await?;
    serde_json::from_value(value)
        .map_err(|e| anyhow!("model output does not match {}: {}", T::KIND, e))
}
