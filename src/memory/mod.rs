//! 记忆层：会话内对话历史、每用户长期记忆、全局偏好日志与 JSON 持久化

pub mod conversation;
pub mod durable;
pub mod persistence;
pub mod preferences;
pub mod store;

pub use conversation::{ContentBlock, Message, MessageLog, Role};
pub use durable::{
    ArchivedSession, DurableMemoryRecord, MemoryCaps, SessionInsights, StructuredSummary,
    TranscriptEntry,
};
pub use persistence::{sanitize_user_id, JsonFile, StoreError};
pub use preferences::{build_preference_summary, ApprovalInput, PreferenceEntry, PreferenceLog};
pub use store::MemoryStore;
