use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::step::{StepId, StepMetadata};

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Initialized,
    Running,
    AwaitingInput,
    Completed,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Initialized => "initialized",
            RunStatus::Running => "running",
            RunStatus::AwaitingInput => "awaiting_input",
            RunStatus::Completed => "completed",
            RunStatus::Error => "error",
        }
    }

    /// completed 与 error 之后不能再继续
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Error)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 单条步骤执行记录的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Error,
}

/// 步骤执行记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub index: usize,
    pub step: StepId,
    pub status: StepStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// 单个步骤的计时器
pub struct StepTimer {
    started_at: DateTime<Utc>,
    instant: Instant,
}

impl Default for StepTimer {
    fn default() -> Self {
        Self::start()
    }
}

impl StepTimer {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            instant: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.instant.elapsed().as_millis() as u64
    }
}

/// 一次运行的可观测状态
///
/// 步骤历史只追加；仅在新一轮 start 时清空。
#[derive(Debug, Clone)]
pub struct RunState {
    pub status: RunStatus,
    pub current_index: usize,
    pub total_steps: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub history: Vec<StepRecord>,
    pub pending_question: Option<String>,
    pub last_error: Option<String>,
}

impl RunState {
    pub fn new(total_steps: usize) -> Self {
        Self {
            status: RunStatus::Initialized,
            current_index: 0,
            total_steps,
            started_at: None,
            updated_at: Utc::now(),
            finished_at: None,
            history: Vec::new(),
            pending_question: None,
            last_error: None,
        }
    }

    /// 开始新一轮运行
    pub fn begin_run(&mut self) {
        let now = Utc::now();
        self.status = RunStatus::Running;
        self.current_index = 0;
        self.started_at = Some(now);
        self.updated_at = now;
        self.finished_at = None;
        self.history.clear();
        self.pending_question = None;
        self.last_error = None;
    }

    /// 从挂起处继续
    pub fn resume_run(&mut self) {
        self.status = RunStatus::Running;
        self.pending_question = None;
        self.updated_at = Utc::now();
    }

    pub fn record_success(&mut self, index: usize, step: StepId, timer: &StepTimer) {
        let now = Utc::now();
        self.history.push(StepRecord {
            index,
            step,
            status: StepStatus::Completed,
            started_at: timer.started_at,
            finished_at: now,
            duration_ms: timer.elapsed_ms(),
            error: None,
        });
        self.current_index = index + 1;
        self.updated_at = now;
    }

    pub fn record_failure(&mut self, index: usize, step: StepId, timer: &StepTimer, error: String) {
        let now = Utc::now();
        self.history.push(StepRecord {
            index,
            step,
            status: StepStatus::Error,
            started_at: timer.started_at,
            finished_at: now,
            duration_ms: timer.elapsed_ms(),
            error: Some(error.clone()),
        });
        self.status = RunStatus::Error;
        self.last_error = Some(error);
        self.updated_at = now;
        self.finished_at = Some(now);
    }

    /// 挂起不写入步骤历史，索引保持不变
    pub fn mark_awaiting_input(&mut self, question: String) {
        self.status = RunStatus::AwaitingInput;
        self.pending_question = Some(question);
        self.updated_at = Utc::now();
    }

    pub fn mark_completed(&mut self) {
        let now = Utc::now();
        self.status = RunStatus::Completed;
        self.current_index = self.total_steps;
        self.updated_at = now;
        self.finished_at = Some(now);
    }

    /// 配置错误或取消等不属于某个步骤的失败
    pub fn mark_error(&mut self, error: String) {
        let now = Utc::now();
        self.status = RunStatus::Error;
        self.last_error = Some(error);
        self.updated_at = now;
        self.finished_at = Some(now);
    }

    /// 完成百分比
    ///
    /// 按步骤数量计算的近似值，不考虑各步骤的耗时差异。
    pub fn progress_percent(&self) -> f64 {
        if self.total_steps == 0 {
            return if self.status == RunStatus::Completed {
                100.0
            } else {
                0.0
            };
        }
        let index = self.current_index.min(self.total_steps);
        index as f64 / self.total_steps as f64 * 100.0
    }
}

/// 对外暴露的只读状态快照
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub workflow: String,
    pub status: RunStatus,
    pub current_index: usize,
    pub total_steps: usize,
    pub progress_percent: f64,
    pub current_step: Option<StepMetadata>,
    pub pending_question: Option<String>,
    pub last_error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub context_summary: BTreeMap<String, String>,
    pub history: Vec<StepRecord>,
}
