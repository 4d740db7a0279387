use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::types::document::UploadedDocument;
use crate::workflow::context::{ContextKeys, ConversationTurn, WorkflowContext};
use crate::workflow::definition::WorkflowDefinition;
use crate::workflow::error::WorkflowError;
use crate::workflow::handler::StepOutcome;
use crate::workflow::registry::AgentRegistry;
use crate::workflow::tracker::{RunState, RunStatus, StatusSnapshot, StepTimer};

/// 一次 start/resume 调用的结果
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// 全部步骤完成，返回最终选定的用例列表
    Completed { use_cases: Vec<Value> },
    /// 运行挂起，等待用户回答
    AwaitingInput { question: String },
}

/// 工作流编排器
///
/// 严格按工作流定义的顺序逐个执行步骤。上下文由运行锁独占，
/// 同一时刻只有一个步骤在执行；状态与上下文快照在每次状态转换后发布，
/// 查询状态不会阻塞正在运行的步骤。
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    workflow: WorkflowDefinition,
    validate_on_start: bool,
    context: Mutex<WorkflowContext>,
    state: RwLock<RunState>,
    published: RwLock<WorkflowContext>,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(registry: Arc<AgentRegistry>, workflow: WorkflowDefinition) -> Self {
        let total_steps = workflow.len();
        Self {
            registry,
            workflow,
            validate_on_start: true,
            context: Mutex::new(WorkflowContext::new()),
            state: RwLock::new(RunState::new(total_steps)),
            published: RwLock::new(WorkflowContext::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// 是否在 start 时校验全部步骤均已注册；关闭后在调度到该步骤时才失败
    pub fn with_eager_validation(mut self, enabled: bool) -> Self {
        self.validate_on_start = enabled;
        self
    }

    pub fn workflow(&self) -> &WorkflowDefinition {
        &self.workflow
    }

    /// 以初始消息开始新一轮运行
    pub async fn start(
        &self,
        initial_message: impl Into<String>,
    ) -> Result<RunOutcome, WorkflowError> {
        self.start_with_documents(initial_message, Vec::new()).await
    }

    /// 以初始消息和上传的文档开始新一轮运行
    #[instrument(skip_all, fields(workflow = %self.workflow.name()))]
    pub async fn start_with_documents(
        &self,
        initial_message: impl Into<String>,
        documents: Vec<UploadedDocument>,
    ) -> Result<RunOutcome, WorkflowError> {
        let mut context = self
            .context
            .try_lock()
            .map_err(|_| WorkflowError::RunInProgress)?;

        if self.cancel.is_cancelled() {
            return Err(WorkflowError::Cancelled);
        }

        if self.validate_on_start {
            if let Err(e) = self.registry.validate(&self.workflow) {
                error!(error = %e, "workflow validation failed");
                self.write_state(|state| state.mark_error(e.to_string()));
                return Err(e);
            }
        }

        let mut fresh = WorkflowContext::with_initial_message(initial_message);
        if !documents.is_empty() {
            fresh
                .store(ContextKeys::UPLOADED_DOCUMENTS, &documents)
                .map_err(|e| WorkflowError::configuration(e.to_string()))?;
        }
        *context = fresh;

        self.write_state(|state| state.begin_run());
        self.publish(&context);
        info!(
            steps = self.workflow.len(),
            documents = documents.len(),
            "workflow run started"
        );

        self.drive(&mut context).await
    }

    /// 追加用户消息，从当前步骤继续
    #[instrument(skip_all, fields(workflow = %self.workflow.name()))]
    pub async fn resume(&self, user_message: impl Into<String>) -> Result<RunOutcome, WorkflowError> {
        let mut context = self
            .context
            .try_lock()
            .map_err(|_| WorkflowError::RunInProgress)?;

        if self.cancel.is_cancelled() {
            return Err(WorkflowError::Cancelled);
        }

        if context.conversation_history().is_none() {
            return Err(WorkflowError::NotStarted);
        }

        let status = self.read_state(|state| state.status);
        if status.is_terminal() {
            return Err(WorkflowError::RunFinished(status));
        }

        context.push_turn(ConversationTurn::user(user_message));
        self.write_state(|state| state.resume_run());
        self.publish(&context);
        info!(
            index = self.read_state(|state| state.current_index),
            "workflow run resumed"
        );

        self.drive(&mut context).await
    }

    /// 从当前索引开始顺序执行，直到完成、挂起或失败
    async fn drive(&self, context: &mut WorkflowContext) -> Result<RunOutcome, WorkflowError> {
        let total = self.workflow.len();

        loop {
            let index = self.read_state(|state| state.current_index);
            let Some(step) = self.workflow.step_at(index) else {
                break;
            };

            if self.cancel.is_cancelled() {
                return Err(self.abort_cancelled(context));
            }

            let handler = match self.registry.resolve(step) {
                Ok(handler) => handler,
                Err(e) => {
                    error!(step = %step, index, error = %e, "step dispatch failed");
                    self.write_state(|state| state.mark_error(e.to_string()));
                    return Err(e);
                }
            };

            info!(step = %step, index, total, "executing step");
            let timer = StepTimer::start();

            match handler.execute(context, &self.cancel).await {
                Ok(StepOutcome::Completed) => {
                    info!(
                        step = %step,
                        index,
                        duration_ms = timer.elapsed_ms(),
                        "step completed"
                    );
                    self.write_state(|state| state.record_success(index, step, &timer));
                    self.publish(context);
                    // 已完成步骤的写入与记录保留，取消只阻止后续步骤
                    if self.cancel.is_cancelled() {
                        return Err(self.abort_cancelled(context));
                    }
                }
                Ok(StepOutcome::Suspended { question }) => {
                    info!(step = %step, index, "awaiting user input");
                    context.push_turn(ConversationTurn::assistant(question.clone()));
                    self.write_state(|state| state.mark_awaiting_input(question.clone()));
                    self.publish(context);
                    return Ok(RunOutcome::AwaitingInput { question });
                }
                Err(_) if self.cancel.is_cancelled() => {
                    return Err(self.abort_cancelled(context));
                }
                Err(e) => {
                    let message = format!("{:#}", e);
                    error!(step = %step, index, error = %message, "step failed");
                    self.write_state(|state| {
                        state.record_failure(index, step, &timer, message.clone())
                    });
                    self.publish(context);
                    // 处理器内部的配置错误（如缺失的提示词模板）按原类别上报
                    return Err(match e.downcast::<WorkflowError>() {
                        Ok(config_error @ WorkflowError::Configuration(_)) => config_error,
                        _ => WorkflowError::StepFailed {
                            step,
                            index,
                            message,
                        },
                    });
                }
            }
        }

        self.write_state(|state| state.mark_completed());
        self.publish(context);
        info!("workflow run completed");

        Ok(RunOutcome::Completed {
            use_cases: final_use_cases(context),
        })
    }

    fn abort_cancelled(&self, context: &WorkflowContext) -> WorkflowError {
        info!("workflow run cancelled");
        self.write_state(|state| state.mark_error("cancelled".to_string()));
        self.publish(context);
        WorkflowError::Cancelled
    }

    /// 取消运行，进行中的扇出任务随之停止
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 只读状态快照
    pub fn get_status(&self) -> StatusSnapshot {
        let context_summary = self.read_published(|context| context.summary());
        self.read_state(|state| StatusSnapshot {
            workflow: self.workflow.name().to_string(),
            status: state.status,
            current_index: state.current_index,
            total_steps: state.total_steps,
            progress_percent: state.progress_percent(),
            current_step: self
                .workflow
                .step_at(state.current_index)
                .map(|step| step.metadata()),
            pending_question: state.pending_question.clone(),
            last_error: state.last_error.clone(),
            started_at: state.started_at,
            updated_at: state.updated_at,
            finished_at: state.finished_at,
            context_summary,
            history: state.history.clone(),
        })
    }

    /// 上下文概要；`full` 为 true 时返回完整的值
    pub fn get_context_summary(&self, full: bool) -> BTreeMap<String, Value> {
        self.read_published(|context| {
            if full {
                context.snapshot()
            } else {
                context
                    .summary()
                    .into_iter()
                    .map(|(key, shape)| (key, Value::String(shape)))
                    .collect()
            }
        })
    }

    /// 读取最近发布的上下文中的某个键
    pub fn context_value<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        self.read_published(|context| context.get(key))
    }

    fn publish(&self, context: &WorkflowContext) {
        let mut published = self.published.write().unwrap_or_else(PoisonError::into_inner);
        *published = context.clone();
    }

    fn read_published<T>(&self, f: impl FnOnce(&WorkflowContext) -> T) -> T {
        let published = self.published.read().unwrap_or_else(PoisonError::into_inner);
        f(&published)
    }

    fn read_state<T>(&self, f: impl FnOnce(&RunState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn write_state(&self, f: impl FnOnce(&mut RunState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }

    pub fn status(&self) -> RunStatus {
        self.read_state(|state| state.status)
    }
}

/// 最终用例：优先取 refined_ideas，其次 initial_ideas
fn final_use_cases(context: &WorkflowContext) -> Vec<Value> {
    [ContextKeys::REFINED_IDEAS, ContextKeys::INITIAL_IDEAS]
        .iter()
        .find_map(|key| context.get_value(key))
        .map(|value| match value {
            Value::Array(items) => items.clone(),
            Value::Object(fields) => match fields.get("use_cases") {
                Some(Value::Array(items)) => items.clone(),
                _ => vec![value.clone()],
            },
            other => vec![other.clone()],
        })
        .unwrap_or_default()
}
