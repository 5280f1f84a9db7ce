//! 会话层：会话状态、每用户会话存储与轮次锁、会话结束时的归档

pub mod archiver;
pub mod state;
pub mod store;

pub use archiver::{extract_transcript, fallback_summary, SessionArchiver};
pub use state::{Session, STANDALONE_MEDIA};
pub use store::{SessionStore, SharedSession};
