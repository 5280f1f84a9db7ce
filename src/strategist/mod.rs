//! 策略师：多轮工具循环与过程事件

pub mod engine;
pub mod events;

pub use engine::{Strategist, StrategistDeps, StrategistSettings, GENERIC_FAILURE_TEXT};
pub use events::StrategistEvent;
