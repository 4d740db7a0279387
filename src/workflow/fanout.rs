use std::future::Future;
use std::time::Duration;

use anyhow::{Result, anyhow};
use futures::future::{BoxFuture, join_all};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// 扇出中的一个独立调研任务
pub struct ResearchTask {
    name: String,
    future: BoxFuture<'static, Result<String>>,
}

impl ResearchTask {
    pub fn new<F>(name: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = Result<String>> + Send + 'static,
    {
        Self {
            name: name.into(),
            future: Box::pin(future),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// 失败任务在结果列表中的占位文本
pub fn task_error_text(name: &str, message: impl std::fmt::Display) -> String {
    format!("Error in {}: {}", name, message)
}

/// 并发执行全部任务并等待全部结束
///
/// 返回结果与提交顺序一一对应。单个任务失败、超时或被取消时
/// 以 `"Error in <name>: <message>"` 占位，不会中断其余任务。
pub async fn run_fan_out(
    tasks: Vec<ResearchTask>,
    task_timeout: Duration,
    cancel: &CancellationToken,
) -> Vec<String> {
    let pending = tasks.into_iter().map(|task| {
        let cancel = cancel.clone();
        async move {
            let ResearchTask { name, future } = task;

            let outcome = tokio::select! {
                _ = cancel.cancelled() => Err(anyhow!("cancelled")),
                result = tokio::time::timeout(task_timeout, future) => match result {
                    Ok(inner) => inner,
                    Err(_) => Err(anyhow!("timed out after {:?}", task_timeout)),
                },
            };

            match outcome {
                Ok(text) => {
                    debug!(task = %name, chars = text.len(), "research task finished");
                    text
                }
                Err(e) => {
                    warn!(task = %name, error = %e, "research task failed");
                    task_error_text(&name, e)
                }
            }
        }
    });

    join_all(pending).await
}
