use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 上下文中约定俗成的键
pub struct ContextKeys;

impl ContextKeys {
    pub const CONVERSATION_HISTORY: &'static str = "conversation_history";
    pub const UPLOADED_DOCUMENTS: &'static str = "uploaded_documents";
    pub const DOCUMENT_SUMMARIES: &'static str = "document_summaries";
    pub const DOCUMENT_SUMMARY: &'static str = "document_summary";
    pub const SUMMARY: &'static str = "summary";
    pub const ENHANCED_PROMPT: &'static str = "enhanced_prompt";
    pub const MISSION_BRIEF: &'static str = "mission_brief";
    pub const RESEARCH_RESULTS: &'static str = "research_results";
    pub const CREATIVE_BRIEF: &'static str = "creative_brief";
    pub const INITIAL_IDEAS: &'static str = "initial_ideas";
    pub const REFINED_IDEAS: &'static str = "refined_ideas";
    pub const DEVILS_ADVOCATE_FEEDBACK: &'static str = "devils_advocate_feedback";
    pub const SCORED_IDEAS: &'static str = "scored_ideas";
    pub const RANKED_IDEAS: &'static str = "ranked_ideas";
    pub const FINAL_REPORT: &'static str = "final_report";
}

/// 对话角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// 对话中的一轮发言
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// 上下文元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextMetadata {
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub data_sizes: BTreeMap<String, usize>,
    pub total_size: usize,
}

impl Default for ContextMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextMetadata {
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            last_updated: Utc::now(),
            data_sizes: BTreeMap::new(),
            total_size: 0,
        }
    }
}

/// 一次工作流运行共享的可变上下文
///
/// 值统一以 `serde_json::Value` 存储，读取时再反序列化为具体类型。
/// 同一时刻只有一个步骤持有它的可变引用。
#[derive(Debug, Clone, Default)]
pub struct WorkflowContext {
    data: BTreeMap<String, Value>,
    metadata: ContextMetadata,
}

impl WorkflowContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以单条用户发言初始化对话历史
    pub fn with_initial_message(message: impl Into<String>) -> Self {
        let mut context = Self::new();
        context.data.insert(
            ContextKeys::CONVERSATION_HISTORY.to_string(),
            Value::Array(vec![]),
        );
        context.push_turn(ConversationTurn::user(message));
        context
    }

    /// 存储数据
    pub fn store<T>(&mut self, key: &str, data: T) -> Result<()>
    where
        T: Serialize,
    {
        let serialized = serde_json::to_value(data)?;
        self.insert_value(key, serialized);
        Ok(())
    }

    pub fn insert_value(&mut self, key: &str, value: Value) {
        let data_size = value.to_string().len();

        if let Some(old_size) = self.metadata.data_sizes.get(key) {
            self.metadata.total_size -= old_size;
        }
        self.metadata.data_sizes.insert(key.to_string(), data_size);
        self.metadata.total_size += data_size;
        self.metadata.last_updated = Utc::now();

        self.data.insert(key.to_string(), value);
    }

    /// 获取数据，键不存在或类型不匹配时返回 None
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        self.data
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// 获取前序步骤必须写入的数据
    pub fn require<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let value = self
            .data
            .get(key)
            .ok_or_else(|| anyhow!("context key '{}' is missing", key))?;
        serde_json::from_value(value.clone())
            .map_err(|e| anyhow!("context key '{}' has an unexpected shape: {}", key, e))
    }

    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn metadata(&self) -> &ContextMetadata {
        &self.metadata
    }

    /// 对话历史；键不存在时返回 None
    pub fn conversation_history(&self) -> Option<Vec<ConversationTurn>> {
        self.get(ContextKeys::CONVERSATION_HISTORY)
    }

    /// 追加一轮对话
    pub fn push_turn(&mut self, turn: ConversationTurn) {
        let mut history = self.conversation_history().unwrap_or_default();
        history.push(turn);
        // 序列化 ConversationTurn 不会失败
        let value = serde_json::to_value(history).unwrap_or(Value::Array(vec![]));
        self.insert_value(ContextKeys::CONVERSATION_HISTORY, value);
    }

    /// 最近一条用户发言
    pub fn latest_user_message(&self) -> Option<String> {
        self.conversation_history()?
            .into_iter()
            .rev()
            .find(|turn| turn.role == Role::User)
            .map(|turn| turn.content)
    }

    /// 每个键的值形态描述，不包含值本身
    pub fn summary(&self) -> BTreeMap<String, String> {
        self.data
            .iter()
            .map(|(key, value)| (key.clone(), describe_value(value)))
            .collect()
    }

    /// 完整数据快照
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.data.clone()
    }
}

/// 低成本的值形态描述
pub fn describe_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(s) => format!("string ({} chars)", s.chars().count()),
        Value::Array(items) => format!("list with {} items", items.len()),
        Value::Object(fields) => format!("record with {} fields", fields.len()),
    }
}
