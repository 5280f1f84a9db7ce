//! 平台限制校验：返回警告列表（空表示通过）

use crate::content::formatting::count_hashtags;
use crate::content::{Channel, DraftOption};

pub const INSTAGRAM_MAX_CAPTION: usize = 2200;
pub const INSTAGRAM_MAX_HASHTAGS: usize = 30;
pub const REDNOTE_MAX_TITLE: usize = 20;
pub const REDNOTE_MAX_BODY_CHARS: usize = 1000;

pub fn validate_instagram(caption: &str, hashtags: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    let len = caption.chars().count();
    if len > INSTAGRAM_MAX_CAPTION {
        warnings.push(format!(
            "Caption is {} chars (max {})",
            len, INSTAGRAM_MAX_CAPTION
        ));
    }
    let tags = count_hashtags(hashtags);
    if tags > INSTAGRAM_MAX_HASHTAGS {
        warnings.push(format!(
            "Too many hashtags: {} (max {})",
            tags, INSTAGRAM_MAX_HASHTAGS
        ));
    }
    warnings
}

pub fn validate_rednote(title: &str, body: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    let title_len = title.chars().count();
    if title_len > REDNOTE_MAX_TITLE {
        warnings.push(format!(
            "Title is {} chars (max {})",
            title_len, REDNOTE_MAX_TITLE
        ));
    }
    let body_len = body.chars().count();
    if body_len > REDNOTE_MAX_BODY_CHARS {
        warnings.push(format!(
            "Body is {} chars (max {})",
            body_len, REDNOTE_MAX_BODY_CHARS
        ));
    }
    warnings
}

/// 按渠道校验一个候选稿
pub fn validate_option(channel: Channel, option: &DraftOption) -> Vec<String> {
    match channel {
        Channel::Instagram => validate_instagram(option.body(), &option.hashtags),
        Channel::Rednote => {
            let blocks = crate::publish::rednote::RednoteFormatter.format(option, "");
            validate_rednote(&blocks.title, &blocks.body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instagram_limits() {
        assert!(validate_instagram("short", "#a #b").is_empty());

        let long = "x".repeat(2201);
        let tags: String = (0..31).map(|i| format!("#t{} ", i)).collect();
        let warnings = validate_instagram(&long, &tags);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("2201 chars"));
        assert!(warnings[1].contains("31"));
    }

    #[test]
    fn test_rednote_limits_count_chars() {
        assert!(validate_rednote("四十五岁重新开始", "正文").is_empty());
        let title = "标".repeat(21);
        let warnings = validate_rednote(&title, "");
        assert_eq!(warnings, vec!["Title is 21 chars (max 20)".to_string()]);
    }
}
