//! 生成稿解析与展示格式
//!
//! 生成后端按 `===== OPTION A (...) =====` / `===== OPTION B (...) =====` 分隔两稿，每稿内部以
//! `Content Type:` / `Caption:` / `Hashtags:` / `Visual Suggestion:` 等行首标签分段；
//! 小红书稿用 `**English Version:**` / `**Chinese Version (中文版):**` 区分中英文。

use std::sync::OnceLock;

use regex::Regex;

use crate::content::{DraftOption, DraftPair};

static OPTION_HEADER_RE: OnceLock<Regex> = OnceLock::new();
static FIELD_LABEL_RE: OnceLock<Regex> = OnceLock::new();
static HASHTAG_RE: OnceLock<Regex> = OnceLock::new();

fn option_header_re() -> &'static Regex {
    OPTION_HEADER_RE.get_or_init(|| {
        Regex::new(r"(?im)^[ \t]*={3,}[ \t]*OPTION[ \t]*([AB])\b[^\n]*$").expect("Invalid regex")
    })
}

fn field_label_re() -> &'static Regex {
    FIELD_LABEL_RE.get_or_init(|| {
        Regex::new(
            r"(?im)^[ \t]*\*{0,2}[ \t]*(content type|caption|hashtags?|visual suggestion|english version|chinese version[^:：*\n]*|中文版)[ \t]*\*{0,2}[ \t]*[:：][ \t]*\*{0,2}[ \t]*",
        )
        .expect("Invalid regex")
    })
}

fn hashtag_re() -> &'static Regex {
    HASHTAG_RE.get_or_init(|| Regex::new(r"#\w+").expect("Invalid regex"))
}

/// 解析双稿；缺少某个分隔符时对应选项为空
pub fn parse_dual_options(text: &str) -> DraftPair {
    let headers: Vec<(char, usize, usize)> = option_header_re()
        .captures_iter(text)
        .filter_map(|c| {
            let whole = c.get(0)?;
            let key = c.get(1)?.as_str().chars().next()?.to_ascii_uppercase();
            Some((key, whole.start(), whole.end()))
        })
        .collect();

    DraftPair {
        option_a: parse_single_option(option_section(text, &headers, 'A')),
        option_b: parse_single_option(option_section(text, &headers, 'B')),
        raw: text.to_string(),
    }
}

/// 某个选项的正文：从其分隔行之后到下一个分隔行（或文末）
fn option_section<'a>(text: &'a str, headers: &[(char, usize, usize)], key: char) -> &'a str {
    let Some(pos) = headers.iter().position(|(k, _, _)| *k == key) else {
        return "";
    };
    let start = headers[pos].2;
    let end = headers.get(pos + 1).map(|h| h.1).unwrap_or(text.len());
    &text[start..end]
}

/// 按行首标签切分单稿各字段
fn parse_single_option(text: &str) -> DraftOption {
    let mut option = DraftOption {
        raw: text.trim().to_string(),
        ..Default::default()
    };

    let labels: Vec<(String, usize, usize)> = field_label_re()
        .captures_iter(text)
        .filter_map(|c| {
            let whole = c.get(0)?;
            Some((c.get(1)?.as_str().to_lowercase(), whole.start(), whole.end()))
        })
        .collect();

    let mut english = String::new();
    for (i, (label, _, value_start)) in labels.iter().enumerate() {
        let value_end = labels.get(i + 1).map(|l| l.1).unwrap_or(text.len());
        let value = text[*value_start..value_end].trim();
        match label.as_str() {
            "content type" => {
                option.content_type = value.lines().next().unwrap_or("").trim().to_string();
            }
            "caption" => option.caption = value.to_string(),
            "hashtag" | "hashtags" => option.hashtags = value.to_string(),
            "visual suggestion" => option.visual = value.to_string(),
            "english version" => english = value.to_string(),
            _ => option.chinese_caption = value.to_string(),
        }
    }
    if option.caption.is_empty() {
        option.caption = english;
    }
    option
}

/// 批准后的可复制正文：caption + 空行 + hashtags
pub fn format_clean_copy(option: &DraftOption) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if !option.caption.is_empty() {
        parts.push(&option.caption);
    }
    if !option.hashtags.is_empty() {
        parts.push("");
        parts.push(&option.hashtags);
    }
    if parts.is_empty() {
        option.raw.clone()
    } else {
        parts.join("\n")
    }
}

/// 预览消息：标签、类型、正文、话题标签与配图建议
pub fn format_option_preview(option: &DraftOption, label: &str) -> String {
    let mut lines: Vec<String> = vec![format!("*{}*", label)];
    if !option.content_type.is_empty() {
        lines.push(format!("Type: {}", option.content_type));
    }
    lines.push(String::new());

    let body = option.body();
    if !body.is_empty() {
        lines.push(body.to_string());
    }
    if !option.chinese_caption.is_empty() {
        lines.push(String::new());
        lines.push(option.chinese_caption.clone());
    }
    if !option.hashtags.is_empty() {
        lines.push(String::new());
        lines.push(option.hashtags.clone());
    }
    if !option.visual.is_empty() {
        lines.push(String::new());
        lines.push(format!("Visual: {}", option.visual));
    }
    lines.join("\n")
}

pub fn count_hashtags(text: &str) -> usize {
    hashtag_re().find_iter(text).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTAGRAM_DRAFT: &str = "===== OPTION A (Reflective) =====
Content Type: Feed Post, single reflective moment
**Caption:**
What if starting over is the kindest thing you've done?

I noticed it this week.

Hashtags: #NewChapter #MidlifeJourney #SelfDiscovery
Visual Suggestion: Morning light on an open notebook

===== OPTION B (Direct) =====
Content Type: Carousel
Caption: Starting over is a skill.
Hashtags: #NewChapter
Visual Suggestion: Clean typography on cream
";

    const REDNOTE_DRAFT: &str = "===== OPTION A (Reflective) =====
Content Type: Rednote post
**English Version:**
Title: Starting over at 45
I remember the first morning.
Tags: #NewChapter #LifeAfter40

**Chinese Version (中文版):**
标题: 四十五岁重新开始
我还记得那个清晨。
标签: #人生下半场 #自我成长

===== OPTION B (Direct) =====
Caption: Short and direct.
";

    #[test]
    fn test_parse_instagram_options() {
        let pair = parse_dual_options(INSTAGRAM_DRAFT);
        let a = &pair.option_a;
        assert_eq!(a.content_type, "Feed Post, single reflective moment");
        assert!(a.caption.starts_with("What if starting over"));
        assert!(a.caption.ends_with("I noticed it this week."));
        assert_eq!(a.hashtags, "#NewChapter #MidlifeJourney #SelfDiscovery");
        assert_eq!(a.visual, "Morning light on an open notebook");

        let b = &pair.option_b;
        assert_eq!(b.content_type, "Carousel");
        assert_eq!(b.caption, "Starting over is a skill.");
        assert_eq!(pair.raw, INSTAGRAM_DRAFT);
    }

    #[test]
    fn test_parse_rednote_bilingual_sections() {
        let pair = parse_dual_options(REDNOTE_DRAFT);
        let a = &pair.option_a;
        assert!(a.caption.starts_with("Title: Starting over at 45"));
        assert!(a.caption.contains("Tags: #NewChapter"));
        assert!(!a.caption.contains("标题"));
        assert!(a.chinese_caption.starts_with("标题: 四十五岁重新开始"));
        assert_eq!(pair.option_b.caption, "Short and direct.");
    }

    #[test]
    fn test_missing_delimiters_leave_options_empty() {
        let pair = parse_dual_options("just some prose without markers");
        assert_eq!(pair.option_a, DraftOption::default());
        assert_eq!(pair.raw, "just some prose without markers");
    }

    #[test]
    fn test_clean_copy_and_preview() {
        let pair = parse_dual_options(INSTAGRAM_DRAFT);
        let clean = format_clean_copy(&pair.option_b);
        assert_eq!(clean, "Starting over is a skill.\n\n#NewChapter");

        let preview = format_option_preview(&pair.option_a, "Option A");
        assert!(preview.starts_with("*Option A*\nType: Feed Post"));
        assert!(preview.contains("Visual: Morning light"));
    }

    #[test]
    fn test_clean_copy_falls_back_to_raw() {
        let opt = DraftOption {
            raw: "raw body".into(),
            ..Default::default()
        };
        assert_eq!(format_clean_copy(&opt), "raw body");
    }

    #[test]
    fn test_count_hashtags() {
        assert_eq!(count_hashtags("#one #two three #four_five"), 3);
        assert_eq!(count_hashtags(""), 0);
    }
}
