//! 小红书手动发布：没有开放 API，批准稿被拆成可逐段复制的标题 / 正文 / 标签（中英各一份）
//!
//! 结构化双语稿（`chinese_caption` 非空）直接使用；否则按分隔标记或连续中文段落启发式切分。

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::content::DraftOption;
use crate::content::validators::REDNOTE_MAX_TITLE;

static SECTION_MARKER_RES: OnceLock<Vec<Regex>> = OnceLock::new();
static CJK_RUN_RE: OnceLock<Regex> = OnceLock::new();
static TITLE_FIELD_RE: OnceLock<Regex> = OnceLock::new();
static TAGS_FIELD_RE: OnceLock<Regex> = OnceLock::new();
static TITLE_LINE_RE: OnceLock<Regex> = OnceLock::new();
static TAGS_LINE_RE: OnceLock<Regex> = OnceLock::new();
static LEADING_MARKER_RE: OnceLock<Regex> = OnceLock::new();
static TAG_RE: OnceLock<Regex> = OnceLock::new();

fn section_marker_res() -> &'static [Regex] {
    SECTION_MARKER_RES.get_or_init(|| {
        [
            r"(?is)[-=]{3,}\s*english\s*[-=]{3,}(.*?)[-=]{3,}\s*(?:chinese|中文)\s*[-=]{3,}(.*)",
            r"(?is)\*\*\s*english\s*(?:version)?\s*:?\s*\*\*(.*?)\*\*\s*(?:chinese|中文)\s*(?:version|版本)?[^*\n]*\*\*(.*)",
            r"(?is)🇬🇧\s*english(.*?)🇨🇳\s*(?:chinese|中文)(.*)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("Invalid regex"))
        .collect()
    })
}

fn cjk_run_re() -> &'static Regex {
    CJK_RUN_RE.get_or_init(|| {
        Regex::new(r"[\x{4e00}-\x{9fff}][\x{4e00}-\x{9fff}\s，。！？、：；“”‘’（）【】…—·]{19,}")
            .expect("Invalid regex")
    })
}

fn title_field_re() -> &'static Regex {
    TITLE_FIELD_RE.get_or_init(|| {
        Regex::new(r"(?i)\*{0,2}(?:title|标题)\*{0,2}[:：][ \t]*([^\n]+)").expect("Invalid regex")
    })
}

fn tags_field_re() -> &'static Regex {
    TAGS_FIELD_RE.get_or_init(|| {
        Regex::new(r"(?is)\*{0,2}(?:tags?|hashtags?|标签)\*{0,2}[:：]\s*(.*)").expect("Invalid regex")
    })
}

fn title_line_re() -> &'static Regex {
    TITLE_LINE_RE
        .get_or_init(|| Regex::new(r"(?i)^\*{0,2}(?:title|标题)\*{0,2}[:：]").expect("Invalid regex"))
}

fn tags_line_re() -> &'static Regex {
    TAGS_LINE_RE.get_or_init(|| {
        Regex::new(r"(?i)^\*{0,2}(?:tags?|hashtags?|标签)\*{0,2}[:：]").expect("Invalid regex")
    })
}

fn leading_marker_re() -> &'static Regex {
    LEADING_MARKER_RE
        .get_or_init(|| Regex::new(r"^[-=]{3,}.*?[-=]{3,}\s*\n?").expect("Invalid regex"))
}

fn tag_re() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"#[\w\x{4e00}-\x{9fff}]+").expect("Invalid regex"))
}

/// 可逐段复制的发布块
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RednoteBlocks {
    pub title: String,
    pub body: String,
    pub tags: String,
    pub chinese_title: String,
    pub chinese_body: String,
    pub chinese_tags: String,
    /// 完整文本（clean copy，缺省为原稿）
    pub full_text: String,
}

impl RednoteBlocks {
    /// 按发送顺序排列的带标签消息，空块跳过
    pub fn labelled_blocks(&self) -> Vec<String> {
        [
            ("Title", &self.title),
            ("Body", &self.body),
            ("Tags", &self.tags),
            ("Chinese Title (中文标题)", &self.chinese_title),
            ("Chinese Body (中文正文)", &self.chinese_body),
            ("Chinese Tags (中文标签)", &self.chinese_tags),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(label, v)| format!("{}:\n{}", label, v))
        .collect()
    }
}

/// 纯格式化器，无外部调用
#[derive(Debug, Clone, Copy, Default)]
pub struct RednoteFormatter;

impl RednoteFormatter {
    pub fn format(&self, option: &DraftOption, clean_text: &str) -> RednoteBlocks {
        let source = [option.caption.as_str(), option.raw.as_str(), clean_text]
            .into_iter()
            .find(|s| !s.trim().is_empty())
            .unwrap_or("");

        let (english, chinese) = if option.chinese_caption.trim().is_empty() {
            split_languages(source)
        } else {
            (source.trim(), option.chinese_caption.trim())
        };

        let mut blocks = RednoteBlocks {
            title: extract_title(english),
            body: extract_body(english),
            tags: extract_tags(english, &option.hashtags),
            full_text: if clean_text.is_empty() {
                source.to_string()
            } else {
                clean_text.to_string()
            },
            ..Default::default()
        };
        if !chinese.is_empty() {
            blocks.chinese_title = extract_title(chinese);
            blocks.chinese_body = extract_body(chinese);
            blocks.chinese_tags = extract_tags(chinese, "");
        }
        blocks
    }

    pub fn posting_instructions(&self) -> &'static str {
        "How to post on Rednote (小红书):\n\n\
1. Open the Xiaohongshu app\n\
2. Tap the + button to create a post\n\
3. Add your image (save it from above first)\n\
4. Paste the title into the title field\n\
5. Paste the body into the content field\n\
6. Add the tags\n\
7. Review and publish\n\n\
Tip: long-press each message above to copy it."
    }
}

/// 拆分中英文：先找显式分隔标记，再找 ≥20 字的连续中文段；都没有则全部视为英文
fn split_languages(text: &str) -> (&str, &str) {
    for re in section_marker_res() {
        if let Some(c) = re.captures(text) {
            let en = c.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            let cn = c.get(2).map(|m| m.as_str().trim()).unwrap_or("");
            return (en, cn);
        }
    }

    if let Some(m) = cjk_run_re().find(text) {
        let en = text[..m.start()].trim();
        let cn = text[m.start()..].trim();
        if !en.is_empty() && !cn.is_empty() {
            return (en, cn);
        }
    }
    (text, "")
}

/// 显式 `Title:` 字段优先；否则取首个非标记行，截断到标题上限
fn extract_title(text: &str) -> String {
    if let Some(c) = title_field_re().captures(text) {
        if let Some(m) = c.get(1) {
            return m.as_str().trim().to_string();
        }
    }
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with(['#', '*', '-', '=']))
        .map(|l| l.chars().take(REDNOTE_MAX_TITLE).collect())
        .unwrap_or_default()
}

/// 去掉标题行、标签行、话题行后的正文
fn extract_body(text: &str) -> String {
    let mut skip_first = true;
    let mut body_lines: Vec<&str> = Vec::new();
    for line in text.lines() {
        let stripped = line.trim();
        if title_line_re().is_match(stripped) || tags_line_re().is_match(stripped) {
            continue;
        }
        if stripped.starts_with('#') && !stripped.starts_with("# ") {
            continue;
        }
        if skip_first && !stripped.is_empty() {
            skip_first = false;
            continue;
        }
        body_lines.push(line);
    }
    let body = body_lines.join("\n");
    leading_marker_re().replace(body.trim(), "").trim().to_string()
}

fn extract_tags(text: &str, hashtags: &str) -> String {
    if let Some(c) = tags_field_re().captures(text) {
        if let Some(m) = c.get(1) {
            return m.as_str().trim().to_string();
        }
    }
    let tags: Vec<&str> = tag_re().find_iter(text).map(|m| m.as_str()).collect();
    if !tags.is_empty() {
        return tags.join(" ");
    }
    hashtags.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_bilingual_option() {
        let option = DraftOption {
            caption: "Title: Starting over at 45\nI remember the first morning.\nIt was quiet.\nTags: #NewChapter #LifeAfter40".into(),
            chinese_caption: "标题: 四十五岁重新开始\n我还记得那个清晨。\n标签: #人生下半场 #自我成长".into(),
            ..Default::default()
        };
        let blocks = RednoteFormatter.format(&option, "clean");
        assert_eq!(blocks.title, "Starting over at 45");
        assert_eq!(blocks.body, "It was quiet.");
        assert_eq!(blocks.tags, "#NewChapter #LifeAfter40");
        assert_eq!(blocks.chinese_title, "四十五岁重新开始");
        assert_eq!(blocks.chinese_tags, "#人生下半场 #自我成长");
        assert_eq!(blocks.full_text, "clean");
    }

    #[test]
    fn test_marker_split() {
        let option = DraftOption {
            caption: "--- ENGLISH ---\nA quiet morning\nBody line\n--- CHINESE ---\n安静的早晨\n正文".into(),
            ..Default::default()
        };
        let blocks = RednoteFormatter.format(&option, "");
        assert_eq!(blocks.title, "A quiet morning");
        assert_eq!(blocks.body, "Body line");
        assert_eq!(blocks.chinese_title, "安静的早晨");
        assert_eq!(blocks.chinese_body, "正文");
        assert_eq!(blocks.full_text, option.caption);
    }

    #[test]
    fn test_cjk_run_split() {
        let option = DraftOption {
            caption: "Morning pages\nWrite three pages.\n每天早上写三页纸，不评判，不修改，只是让思绪流动起来，慢慢看见自己".into(),
            hashtags: "#MorningPages".into(),
            ..Default::default()
        };
        let blocks = RednoteFormatter.format(&option, "");
        assert_eq!(blocks.title, "Morning pages");
        assert_eq!(blocks.tags, "#MorningPages");
        assert!(blocks.chinese_title.starts_with("每天早上写三页纸"));
        assert!(blocks.chinese_title.chars().count() <= 20);
    }

    #[test]
    fn test_plain_text_title_truncated() {
        let option = DraftOption {
            raw: "This first line is definitely longer than twenty characters\nsecond".into(),
            ..Default::default()
        };
        let blocks = RednoteFormatter.format(&option, "");
        assert_eq!(blocks.title.chars().count(), 20);
        assert_eq!(blocks.body, "second");
        assert!(blocks.chinese_body.is_empty());

        let labelled = blocks.labelled_blocks();
        assert_eq!(labelled.len(), 2);
        assert!(labelled[0].starts_with("Title:\n"));
    }
}
