//! 每用户长期记忆存储
//!
//! 文件为 `{dir}/memory_{user_id}.json`。update 在内部锁下完成 读取 → 修改 → 原子写回，
//! 多个归档任务并发时不会互相覆盖。

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::memory::durable::{DurableMemoryRecord, MemoryCaps};
use crate::memory::persistence::{sanitize_user_id, JsonFile, StoreError};

pub struct MemoryStore {
    dir: PathBuf,
    caps: MemoryCaps,
    retention: usize,
    lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new(dir: impl AsRef<Path>, caps: MemoryCaps, retention: usize) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            caps,
            retention,
            lock: Mutex::new(()),
        }
    }

    pub fn caps(&self) -> &MemoryCaps {
        &self.caps
    }

    /// 保留转录的最近会话数
    pub fn retention(&self) -> usize {
        self.retention
    }

    pub fn memory_path(&self, user_id: &str) -> PathBuf {
        self.dir
            .join(format!("memory_{}.json", sanitize_user_id(user_id)))
    }

    pub async fn load(&self, user_id: &str) -> Result<Option<DurableMemoryRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        JsonFile::new(self.memory_path(user_id)).load()
    }

    /// 原子读改写；记录不存在时从空记录开始
    pub async fn update<F>(&self, user_id: &str, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut DurableMemoryRecord),
    {
        let _guard = self.lock.lock().await;
        let file = JsonFile::new(self.memory_path(user_id));
        let mut record: DurableMemoryRecord = file.load()?.unwrap_or_default();
        f(&mut record);
        file.save(&record)
    }

    /// 渲染记忆上下文；无记录或读取失败时为空串
    pub async fn render_context(&self, user_id: &str) -> String {
        match self.load(user_id).await {
            Ok(Some(record)) => record.render_context(self.retention),
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "failed to load memory record");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::durable::SessionInsights;

    #[tokio::test]
    async fn test_update_creates_then_merges() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(dir.path(), MemoryCaps::default(), 3);
        assert_eq!(store.render_context("u1").await, "");

        let caps = *store.caps();
        store
            .update("u1", |r| {
                r.merge_insights(
                    &SessionInsights {
                        topics_discussed: vec!["slow mornings".into()],
                        ..Default::default()
                    },
                    None,
                    &caps,
                )
            })
            .await
            .unwrap();

        assert!(store.memory_path("u1").exists());
        let ctx = store.render_context("u1").await;
        assert!(ctx.contains("slow mornings"));
    }

    #[tokio::test]
    async fn test_corrupt_file_renders_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(dir.path(), MemoryCaps::default(), 3);
        std::fs::write(store.memory_path("u1"), "{not json").unwrap();
        assert_eq!(store.render_context("u1").await, "");
        assert!(store.update("u1", |_| {}).await.is_err());
    }
}
