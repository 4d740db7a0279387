//! 会话管理：会话 ID 到编排器的映射

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::workflow::definition::WorkflowDefinition;
use crate::workflow::orchestrator::Orchestrator;
use crate::workflow::registry::AgentRegistry;

/// 每个会话拥有独立的编排器和上下文
pub struct ConversationManager {
    registry: Arc<AgentRegistry>,
    workflow: WorkflowDefinition,
    validate_on_start: bool,
    conversations: RwLock<HashMap<Uuid, Arc<Orchestrator>>>,
}

impl ConversationManager {
    pub fn new(registry: Arc<AgentRegistry>, workflow: WorkflowDefinition) -> Self {
        Self {
            registry,
            workflow,
            validate_on_start: true,
            conversations: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_eager_validation(mut self, enabled: bool) -> Self {
        self.validate_on_start = enabled;
        self
    }

    /// 新建会话
    pub async fn create(&self) -> (Uuid, Arc<Orchestrator>) {
        let id = Uuid::new_v4();
        let orchestrator = Arc::new(
            Orchestrator::new(self.registry.clone(), self.workflow.clone())
                .with_eager_validation(self.validate_on_start),
        );
        self.conversations
            .write()
            .await
            .insert(id, orchestrator.clone());
        debug!(conversation = %id, "conversation created");
        (id, orchestrator)
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<Orchestrator>> {
        self.conversations.read().await.get(id).cloned()
    }

    /// 结束会话：取消进行中的步骤并移除
    ///
    /// 返回会话是否存在。
    pub async fn end(&self, id: &Uuid) -> bool {
        match self.conversations.write().await.remove(id) {
            Some(orchestrator) => {
                orchestrator.cancel();
                info!(conversation = %id, status = %orchestrator.status(), "conversation ended");
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }
}
