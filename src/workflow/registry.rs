use std::collections::HashMap;
use std::sync::Arc;

use crate::workflow::definition::WorkflowDefinition;
use crate::workflow::error::WorkflowError;
use crate::workflow::handler::{Blocking, StepHandler, SyncStepHandler};
use crate::workflow::step::StepId;

/// 构造步骤处理器的工厂
pub type HandlerFactory = Arc<dyn Fn() -> Box<dyn StepHandler> + Send + Sync>;

/// 步骤标识到处理器工厂的映射
///
/// 每个进程构造一次，显式传给编排器。共享依赖（模型客户端、提示词服务）
/// 由工厂闭包捕获。
#[derive(Clone, Default)]
pub struct AgentRegistry {
    factories: HashMap<StepId, HandlerFactory>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册异步处理器，重复注册时覆盖旧的
    pub fn register<H, F>(&mut self, step: StepId, factory: F) -> &mut Self
    where
        H: StepHandler + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.factories
            .insert(step, Arc::new(move || Box::new(factory()) as Box<dyn StepHandler>));
        self
    }

    /// 注册同步处理器
    pub fn register_sync<H, F>(&mut self, step: StepId, factory: F) -> &mut Self
    where
        H: SyncStepHandler + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.factories.insert(
            step,
            Arc::new(move || Box::new(Blocking(factory())) as Box<dyn StepHandler>),
        );
        self
    }

    pub fn is_registered(&self, step: StepId) -> bool {
        self.factories.contains_key(&step)
    }

    pub fn registered_steps(&self) -> Vec<StepId> {
        let mut steps: Vec<StepId> = self.factories.keys().copied().collect();
        steps.sort();
        steps
    }

    /// 解析步骤对应的处理器
    pub fn resolve(&self, step: StepId) -> Result<Box<dyn StepHandler>, WorkflowError> {
        self.factories
            .get(&step)
            .map(|factory| factory())
            .ok_or_else(|| {
                WorkflowError::configuration(format!("no handler registered for step '{}'", step))
            })
    }

    /// 校验工作流中的每个步骤都已注册
    pub fn validate(&self, workflow: &WorkflowDefinition) -> Result<(), WorkflowError> {
        let missing: Vec<&str> = workflow
            .steps()
            .iter()
            .filter(|step| !self.is_registered(**step))
            .map(|step| step.as_str())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(WorkflowError::configuration(format!(
                "workflow '{}' uses unregistered steps: {}",
                workflow.name(),
                missing.join(", ")
            )))
        }
    }
}
