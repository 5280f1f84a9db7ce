//! 偏好日志：记录每次批准的帖子特征（全局，FIFO 上限），汇总后写入系统提示
//!
//! 单条记录只用于聚合统计；读改写在内部锁下完成，写文件为原子替换。

use std::path::Path;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::memory::persistence::{JsonFile, StoreError};

const PERSONAL_STORY_PHRASES: [&str; 5] = [
    "i remember",
    "i noticed",
    "i've been",
    "the other day",
    "this week",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceEntry {
    pub approved_at: String,
    pub platform: String,
    pub topic: String,
    /// "A" / "B"
    pub chosen_option: String,
    /// "reflective" / "direct"
    pub style_used: String,
    /// feed_post / carousel / reel_caption / story
    pub content_type: String,
    pub caption_length_words: usize,
    pub has_question_hook: bool,
    pub has_personal_story: bool,
    #[serde(default)]
    pub revision_notes: Vec<String>,
    pub hashtag_count: usize,
}

/// 一次批准的输入；特征（字数、问句开头、个人故事）由 caption 计算
#[derive(Debug, Clone)]
pub struct ApprovalInput<'a> {
    pub platform: &'a str,
    pub topic: &'a str,
    pub chosen_option: &'a str,
    pub style_used: &'a str,
    pub content_type: &'a str,
    pub caption: &'a str,
    pub hashtag_count: usize,
    pub revision_notes: Vec<String>,
}

impl PreferenceEntry {
    pub fn from_approval(input: ApprovalInput<'_>) -> Self {
        let first_line = input.caption.trim().lines().next().unwrap_or("").trim();
        let lower = input.caption.to_lowercase();
        Self {
            approved_at: Local::now().to_rfc3339(),
            platform: input.platform.to_string(),
            topic: input.topic.to_string(),
            chosen_option: input.chosen_option.to_string(),
            style_used: input.style_used.to_string(),
            content_type: input.content_type.to_string(),
            caption_length_words: input.caption.split_whitespace().count(),
            has_question_hook: first_line.ends_with('?'),
            has_personal_story: PERSONAL_STORY_PHRASES.iter().any(|p| lower.contains(p)),
            revision_notes: input.revision_notes,
            hashtag_count: input.hashtag_count,
        }
    }
}

/// 全局偏好日志（单文件）
pub struct PreferenceLog {
    file: JsonFile,
    cap: usize,
    lock: Mutex<()>,
}

impl PreferenceLog {
    pub fn new(path: impl AsRef<Path>, cap: usize) -> Self {
        Self {
            file: JsonFile::new(path),
            cap,
            lock: Mutex::new(()),
        }
    }

    pub async fn load(&self) -> Result<Vec<PreferenceEntry>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.file.load()?.unwrap_or_default())
    }

    /// 追加一条记录，超出上限时丢弃最旧的
    pub async fn record(&self, entry: PreferenceEntry) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries: Vec<PreferenceEntry> = self.file.load()?.unwrap_or_default();
        entries.push(entry);
        if entries.len() > self.cap {
            entries.drain(..entries.len() - self.cap);
        }
        self.file.save(&entries)
    }

    /// 汇总文本；无记录或读取失败时为空串
    pub async fn summary(&self) -> String {
        match self.load().await {
            Ok(entries) => build_preference_summary(&entries),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %self.file.path().display(),
                    "failed to read preference log"
                );
                String::new()
            }
        }
    }
}

/// 由偏好记录生成系统提示中的偏好层
pub fn build_preference_summary(entries: &[PreferenceEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let total = entries.len();

    let option_a = entries.iter().filter(|p| p.chosen_option == "A").count();
    let option_b = total - option_a;
    let preferred = if option_a >= option_b {
        "A (reflective)"
    } else {
        "B (direct)"
    };

    let words: Vec<usize> = entries.iter().map(|p| p.caption_length_words).collect();
    let avg_words = words.iter().sum::<usize>() / total;
    let min_words = words.iter().copied().min().unwrap_or(0);
    let max_words = words.iter().copied().max().unwrap_or(0);

    let question_hooks = entries.iter().filter(|p| p.has_question_hook).count();
    let personal_stories = entries.iter().filter(|p| p.has_personal_story).count();
    let frequency = |n: usize| if n > total / 2 { "often" } else { "sometimes" };

    // 出现次数相同时取最先出现的类型
    let mut type_counts: Vec<(&str, usize)> = Vec::new();
    for p in entries {
        match type_counts.iter_mut().find(|(t, _)| *t == p.content_type) {
            Some((_, n)) => *n += 1,
            None => type_counts.push((p.content_type.as_str(), 1)),
        }
    }
    let mut favorite = "feed_post";
    let mut best = 0;
    for (t, n) in &type_counts {
        if *n > best {
            favorite = t;
            best = *n;
        }
    }

    let avg_hashtags = entries.iter().map(|p| p.hashtag_count).sum::<usize>() / total;

    let mut lines = vec![
        format!("Based on {} recently approved posts:", total),
        format!(
            "- Prefers Option {}: chosen {}/{} times",
            preferred,
            option_a.max(option_b),
            total
        ),
        format!(
            "- Preferred caption length: {}-{} words (average {})",
            min_words, max_words, avg_words
        ),
        format!(
            "- Question hooks: {} used ({}/{})",
            frequency(question_hooks),
            question_hooks,
            total
        ),
        format!(
            "- Personal stories: {} included ({}/{})",
            frequency(personal_stories),
            personal_stories,
            total
        ),
        format!("- Favorite content type: {}", favorite.replace('_', " ")),
        format!("- Preferred hashtag count: ~{}", avg_hashtags),
    ];

    let revisions: Vec<String> = entries
        .iter()
        .flat_map(|p| p.revision_notes.iter().map(|r| r.to_lowercase()))
        .collect();
    let mut patterns = Vec::new();
    for (needle, label) in [
        ("short", "\"make it shorter\""),
        ("long", "\"make it longer\""),
        ("question", "\"add a question\""),
        ("personal", "\"make it more personal\""),
    ] {
        if revisions.iter().any(|r| r.contains(needle)) {
            patterns.push(label);
        }
    }
    if !patterns.is_empty() {
        lines.push(format!("- Common revision requests: {}", patterns.join(", ")));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(option: &str, content_type: &str, caption: &str) -> PreferenceEntry {
        PreferenceEntry::from_approval(ApprovalInput {
            platform: "instagram",
            topic: "starting over",
            chosen_option: option,
            style_used: if option == "A" { "reflective" } else { "direct" },
            content_type,
            caption,
            hashtag_count: 8,
            revision_notes: Vec::new(),
        })
    }

    #[test]
    fn test_caption_analysis() {
        let e = entry(
            "A",
            "feed_post",
            "What would you keep?\nI remember the first morning here.",
        );
        assert!(e.has_question_hook);
        assert!(e.has_personal_story);
        assert_eq!(e.caption_length_words, 10);
    }

    #[tokio::test]
    async fn test_fifo_cap_evicts_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let log = PreferenceLog::new(dir.path().join("preferences.json"), 10);
        for i in 0..11 {
            let mut e = entry("A", "feed_post", "caption");
            e.topic = format!("topic {i}");
            log.record(e).await.unwrap();
        }
        let entries = log.load().await.unwrap();
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0].topic, "topic 1");
        assert_eq!(entries[9].topic, "topic 10");
    }

    #[tokio::test]
    async fn test_empty_log_has_empty_summary() {
        let dir = tempfile::tempdir().unwrap();
        let log = PreferenceLog::new(dir.path().join("preferences.json"), 10);
        assert_eq!(log.summary().await, "");
    }

    #[test]
    fn test_summary_tie_prefers_a() {
        let entries = vec![
            entry("A", "carousel", "one two three"),
            entry("B", "feed_post", "one two three four five"),
        ];
        let summary = build_preference_summary(&entries);
        assert!(summary.contains("Based on 2 recently approved posts:"));
        assert!(summary.contains("Prefers Option A (reflective): chosen 1/2 times"));
        assert!(summary.contains("3-5 words (average 4)"));
        assert!(summary.contains("Favorite content type: carousel"));
        assert!(!summary.contains("Common revision requests"));
    }

    #[test]
    fn test_summary_revision_patterns() {
        let mut e = entry("B", "story", "Short one.");
        e.revision_notes = vec!["Make it SHORTER".into(), "more personal please".into()];
        let summary = build_preference_summary(&[e]);
        assert!(summary.contains("Prefers Option B (direct)"));
        assert!(summary.contains("\"make it shorter\", \"make it more personal\""));
    }
}
