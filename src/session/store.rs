//! 会话存储：每用户一个活动会话 + 每用户一把轮次锁
//!
//! 两张表都由结构锁（RwLock）保护，只在查找 / 插入时短暂持有；
//! 轮次锁由调用方在整个 run_turn 期间持有，保证同一用户的轮次串行。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::memory::MemoryStore;
use crate::session::{Session, SessionArchiver};

pub type SharedSession = Arc<Mutex<Session>>;

pub struct SessionStore {
    active: RwLock<HashMap<String, SharedSession>>,
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
    memory: Arc<MemoryStore>,
    archiver: Arc<SessionArchiver>,
}

impl SessionStore {
    pub fn new(memory: Arc<MemoryStore>, archiver: Arc<SessionArchiver>) -> Self {
        Self {
            active: RwLock::new(HashMap::new()),
            locks: RwLock::new(HashMap::new()),
            memory,
            archiver,
        }
    }

    /// 返回活动会话，不存在则创建
    pub async fn get_or_create(&self, user_id: &str) -> SharedSession {
        if let Some(session) = self.active.read().await.get(user_id) {
            return session.clone();
        }
        let mut active = self.active.write().await;
        active
            .entry(user_id.to_string())
            .or_insert_with(|| {
                tracing::info!(user_id = %user_id, "session created");
                Arc::new(Mutex::new(Session::new()))
            })
            .clone()
    }

    /// 开始新会话；已有的活动会话先按 end 归档
    pub async fn start(&self, user_id: &str) -> SharedSession {
        self.end(user_id).await;
        let session = Arc::new(Mutex::new(Session::new()));
        self.active
            .write()
            .await
            .insert(user_id.to_string(), session.clone());
        tracing::info!(user_id = %user_id, "session started");
        session
    }

    /// 结束活动会话：移出表，有消息时归档；没有活动会话返回 None
    pub async fn end(&self, user_id: &str) -> Option<SharedSession> {
        let session = self.active.write().await.remove(user_id)?;
        {
            let guard = session.lock().await;
            if guard.messages().is_empty() {
                tracing::debug!(user_id = %user_id, "empty session discarded");
            } else {
                self.archiver.archive(user_id, &guard).await;
            }
        }
        Some(session)
    }

    /// 每用户轮次锁；首次使用时创建，之后一直复用
    pub async fn lock_for(&self, user_id: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(user_id) {
            return lock.clone();
        }
        self.locks
            .write()
            .await
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// 供策略师系统提示使用的记忆上下文；无记录时为空串
    pub async fn load_memory_context(&self, user_id: &str) -> String {
        self.memory.render_context(user_id).await
    }

    pub async fn has_active(&self, user_id: &str) -> bool {
        self.active.read().await.contains_key(user_id)
    }

    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }
}
