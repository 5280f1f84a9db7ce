//! 后端层：文本 / 图片后端抽象与实现（OpenAI 兼容 / Mock）

pub mod image;
pub mod mock;
pub mod openai;
pub mod traits;

pub use image::OpenAiImageClient;
pub use mock::{MockStep, ScriptedLlmClient, StaticImageBackend};
pub use openai::OpenAiClient;
pub use traits::{
    CompletionRequest, CompletionResponse, ImageBackend, ImageSize, LlmClient, LlmError, StopReason,
    ToolSchema,
};
