//! 内容生产：平台 / 内容类型等领域类型，正文生成引擎，双稿解析与平台校验

pub mod brief;
pub mod engine;
pub mod formatting;
pub mod validators;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use brief::{render_brief, render_calendar_request, CalendarBrief, DraftBrief};
pub use engine::ContentEngine;
pub use formatting::{
    count_hashtags, format_clean_copy, format_option_preview, parse_dual_options,
};

/// 目标平台（brief 可同时面向两个平台）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Rednote,
    Both,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Rednote => "rednote",
            Platform::Both => "both",
        }
    }
}

impl From<Channel> for Platform {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Instagram => Platform::Instagram,
            Channel::Rednote => Platform::Rednote,
        }
    }
}

/// 单一发布渠道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Instagram,
    Rednote,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Instagram => "instagram",
            Channel::Rednote => "rednote",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    FeedPost,
    Carousel,
    ReelCaption,
    Story,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::FeedPost => "feed_post",
            ContentType::Carousel => "carousel",
            ContentType::ReelCaption => "reel_caption",
            ContentType::Story => "story",
        }
    }

    /// 从生成稿中的自由文本标签归一（"Carousel, because..." → carousel），无法识别时为 feed_post
    pub fn normalize(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("carousel") {
            ContentType::Carousel
        } else if lower.contains("reel") {
            ContentType::ReelCaption
        } else if lower.contains("story") {
            ContentType::Story
        } else {
            ContentType::FeedPost
        }
    }
}

/// A / B 选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum OptionKey {
    #[serde(rename = "a", alias = "A")]
    A,
    #[serde(rename = "b", alias = "B")]
    B,
}

impl OptionKey {
    /// 会话中生成图的键
    pub fn label(&self) -> &'static str {
        match self {
            OptionKey::A => "option_a",
            OptionKey::B => "option_b",
        }
    }

    pub fn upper(&self) -> &'static str {
        match self {
            OptionKey::A => "A",
            OptionKey::B => "B",
        }
    }

    /// A 为 reflective，B 为 direct
    pub fn style(&self) -> &'static str {
        match self {
            OptionKey::A => "reflective",
            OptionKey::B => "direct",
        }
    }
}

/// 单个候选稿
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftOption {
    /// 生成稿自述的内容类型（原文）
    pub content_type: String,
    pub caption: String,
    pub hashtags: String,
    pub visual: String,
    /// 小红书中文版（结构化输出时单独给出）
    pub chinese_caption: String,
    pub raw: String,
}

impl DraftOption {
    /// caption 为空时退回原文
    pub fn body(&self) -> &str {
        if self.caption.is_empty() {
            &self.raw
        } else {
            &self.caption
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftPair {
    pub option_a: DraftOption,
    pub option_b: DraftOption,
    /// 生成后端的完整原文
    pub raw: String,
}

impl DraftPair {
    pub fn get(&self, key: OptionKey) -> &DraftOption {
        match key {
            OptionKey::A => &self.option_a,
            OptionKey::B => &self.option_b,
        }
    }
}
