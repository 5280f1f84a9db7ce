//! Sora - 对话式内容策略助手
//!
//! 模块划分：
//! - **agent**: 无头运行时（组件装配、单条消息处理、会话开始 / 结束）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **content**: 双稿数据模型、brief、解析与格式化、平台校验、正文生成引擎
//! - **core**: 顶层错误类型
//! - **imaging**: 品牌滤镜
//! - **llm**: 文本 / 图片后端抽象与实现（OpenAI 兼容 / Mock）
//! - **memory**: 对话历史、长期记忆、偏好日志与 JSON 持久化
//! - **prompts**: 策略师与正文生成的系统提示
//! - **publish**: Instagram 直发与小红书文案格式化
//! - **session**: 会话状态、会话存储与归档
//! - **strategist**: 多轮工具循环
//! - **tools**: 七个工具的注册表、执行器与处理函数
//! - **transport**: 控制台传输层

pub mod agent;
pub mod config;
pub mod content;
pub mod core;
pub mod imaging;
pub mod llm;
pub mod memory;
pub mod prompts;
pub mod publish;
pub mod session;
pub mod strategist;
pub mod text;
pub mod tools;
pub mod transport;

pub use agent::{create_agent_components, process_message, AgentComponents};
pub use strategist::{Strategist, StrategistEvent, GENERIC_FAILURE_TEXT};
