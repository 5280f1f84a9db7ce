//! 工具箱：七个封闭工具的注册表、执行器与各自的处理函数

pub mod action;
pub mod approval;
pub mod executor;
pub mod media;
pub mod produce;
pub mod publishing;
pub mod registry;

pub use action::{Action, Button};
pub use executor::{ImageSizes, ToolDeps, ToolError, ToolExecutor, ToolOutput};
pub use registry::{tool_schemas, ToolKind};
