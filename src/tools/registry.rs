//! 工具注册表
//!
//! 工具集合是封闭的：`ToolKind` 枚举列出全部七个工具，名称解析、描述与参数 schema 都在这里，
//! 执行器按枚举穷举分发。参数 schema 由各参数结构体经 schemars 生成。

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde_json::Value;

use crate::content::{CalendarBrief, DraftBrief};
use crate::llm::ToolSchema;
use crate::tools::approval::{PresentOptionsArgs, SaveApprovalArgs};
use crate::tools::media::{BrandFilterArgs, GenerateImageArgs};
use crate::tools::publishing::PublishArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    GenerateTextContent,
    GenerateImage,
    ApplyBrandFilter,
    PresentOptions,
    GenerateCalendar,
    SaveApproval,
    PublishContent,
}

impl ToolKind {
    pub const ALL: [ToolKind; 7] = [
        ToolKind::GenerateTextContent,
        ToolKind::GenerateImage,
        ToolKind::ApplyBrandFilter,
        ToolKind::PresentOptions,
        ToolKind::GenerateCalendar,
        ToolKind::SaveApproval,
        ToolKind::PublishContent,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::GenerateTextContent => "generate_text_content",
            ToolKind::GenerateImage => "generate_image",
            ToolKind::ApplyBrandFilter => "apply_brand_filter",
            ToolKind::PresentOptions => "present_options",
            ToolKind::GenerateCalendar => "generate_calendar",
            ToolKind::SaveApproval => "save_approval",
            ToolKind::PublishContent => "publish_content",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// 描述（供后端理解何时调用）
    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::GenerateTextContent => {
                "Execute a structured creative brief to produce social media post content with two \
options (A and B). Call this only after the idea has been shaped with the creator and a detailed \
brief is ready. The production copywriter executes the brief faithfully."
            }
            ToolKind::GenerateImage => {
                "Generate a brand-consistent AI image. Each image has a cost: only call this after \
the creator confirms they want an AI image. The image_brief is a specific, ready-to-use prompt \
describing subject, composition, colors, lighting and mood."
            }
            ToolKind::ApplyBrandFilter => {
                "Apply brand-consistent color filtering to the photo the creator uploaded: warmer \
tones, softer contrast, a subtle gold tint, optional logo. Only call when a photo was uploaded in \
this session."
            }
            ToolKind::PresentOptions => {
                "Present the generated options to the creator with Pick A / Pick B / Revise \
buttons. Call this after generate_text_content, with a short summary of each option."
            }
            ToolKind::GenerateCalendar => {
                "Generate a weekly content calendar with multiple posts. Call this when the \
creator wants to plan their content week."
            }
            ToolKind::SaveApproval => {
                "Save the approved post to preference memory. Call this immediately after the \
creator picks an option (pick_a or pick_b)."
            }
            ToolKind::PublishContent => {
                "Publish approved content. Instagram publishes directly; Rednote is formatted \
into copyable blocks for manual posting. Only call after the creator approves and asks to publish."
            }
        }
    }

    pub fn input_schema(&self) -> Value {
        match self {
            ToolKind::GenerateTextContent => schema_for::<DraftBrief>(),
            ToolKind::GenerateImage => schema_for::<GenerateImageArgs>(),
            ToolKind::ApplyBrandFilter => schema_for::<BrandFilterArgs>(),
            ToolKind::PresentOptions => schema_for::<PresentOptionsArgs>(),
            ToolKind::GenerateCalendar => schema_for::<CalendarBrief>(),
            ToolKind::SaveApproval => schema_for::<SaveApprovalArgs>(),
            ToolKind::PublishContent => schema_for::<PublishArgs>(),
        }
    }

    pub fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// 全部工具的 schema，顺序固定
pub fn tool_schemas() -> Vec<ToolSchema> {
    ToolKind::ALL.iter().map(ToolKind::schema).collect()
}

/// 参数结构体 → 内联的 JSON Schema（去掉 $schema / title / definitions）
fn schema_for<T: JsonSchema>() -> Value {
    let gen = SchemaSettings::draft07()
        .with(|s| {
            s.inline_subschemas = true;
            s.option_add_null_type = false;
        })
        .into_generator();
    let schema = gen.into_root_schema_for::<T>();
    let mut value = serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({}));
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
        obj.remove("definitions");
        if !obj.contains_key("properties") {
            obj.insert("properties".to_string(), serde_json::json!({}));
        }
    }
    value
}
