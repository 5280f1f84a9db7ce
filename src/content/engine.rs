//! 正文生成引擎：brief → 双稿，日历 brief → 周计划文本
//!
//! 每次生成都重新读取品牌语调与偏好汇总，编辑语调文件无需重启。

use std::path::PathBuf;
use std::sync::Arc;

use crate::content::brief::{platform_list, render_brief, render_calendar_request};
use crate::content::{parse_dual_options, CalendarBrief, Channel, DraftBrief, DraftPair, Platform};
use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::memory::PreferenceLog;
use crate::prompts::{build_calendar_prompt, build_production_prompt, load_brand_voice};

pub struct ContentEngine {
    llm: Arc<dyn LlmClient>,
    preferences: Arc<PreferenceLog>,
    brand_voice_path: Option<PathBuf>,
    max_tokens_post: u32,
    max_tokens_calendar: u32,
}

impl ContentEngine {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        preferences: Arc<PreferenceLog>,
        brand_voice_path: Option<PathBuf>,
    ) -> Self {
        Self {
            llm,
            preferences,
            brand_voice_path,
            max_tokens_post: 3000,
            max_tokens_calendar: 8000,
        }
    }

    pub fn with_token_limits(mut self, post: u32, calendar: u32) -> Self {
        self.max_tokens_post = post;
        self.max_tokens_calendar = calendar;
        self
    }

    /// 执行 brief，返回解析后的 A / B 双稿
    pub async fn generate_from_brief(&self, brief: &DraftBrief) -> Result<DraftPair, LlmError> {
        let brand_voice = load_brand_voice(self.brand_voice_path.as_deref());
        let preference_summary = self.preferences.summary().await;
        let system = build_production_prompt(brief.platform, &brand_voice, &preference_summary);
        let request = CompletionRequest::single(system, render_brief(brief), self.max_tokens_post);

        let response = self.llm.complete(&request).await?;
        let text = response.text();
        tracing::info!(
            platform = brief.platform.as_str(),
            topic = %brief.topic,
            chars = text.chars().count(),
            "draft pair generated"
        );
        Ok(parse_dual_options(&text))
    }

    /// 周内容日历（原文返回，不做结构化解析）
    pub async fn generate_calendar(&self, brief: &CalendarBrief) -> Result<String, LlmError> {
        let brand_voice = load_brand_voice(self.brand_voice_path.as_deref());
        let preference_summary = self.preferences.summary().await;
        let platform = calendar_platform(&brief.platforms);
        let system =
            build_calendar_prompt(platform, brief.num_posts, &brand_voice, &preference_summary);
        let request = CompletionRequest::single(
            system,
            render_calendar_request(brief),
            self.max_tokens_calendar,
        );

        let response = self.llm.complete(&request).await?;
        tracing::info!(
            platforms = %platform_list(&brief.platforms),
            num_posts = brief.num_posts,
            "calendar generated"
        );
        Ok(response.text())
    }
}

fn calendar_platform(platforms: &[Channel]) -> Platform {
    let ig = platforms.contains(&Channel::Instagram);
    let rn = platforms.contains(&Channel::Rednote);
    match (ig, rn) {
        (true, true) => Platform::Both,
        (false, true) => Platform::Rednote,
        _ => Platform::Instagram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockStep, ScriptedLlmClient};
    use serde_json::json;

    #[tokio::test]
    async fn test_generate_from_brief_parses_and_uses_platform_rules() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlmClient::new(vec![MockStep::text(
            "===== OPTION A =====\nCaption: one\n===== OPTION B =====\nCaption: two",
        )]));
        let prefs = Arc::new(PreferenceLog::new(dir.path().join("p.json"), 10));
        let engine = ContentEngine::new(llm.clone(), prefs, None);

        let brief: DraftBrief = serde_json::from_value(json!({
            "platform": "rednote",
            "topic": "tea rituals",
            "content_type": "feed_post",
            "hook_direction": "a small moment",
            "content_direction": "slowness",
            "words_to_use": [],
            "words_to_avoid": []
        }))
        .unwrap();

        let pair = engine.generate_from_brief(&brief).await.unwrap();
        assert_eq!(pair.option_a.caption, "one");
        assert_eq!(pair.option_b.caption, "two");

        let requests = llm.requests().await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].system.contains("Rednote"));
        assert!(requests[0].tools.is_empty());
        assert_eq!(requests[0].max_tokens, 3000);
    }

    #[tokio::test]
    async fn test_generate_calendar_returns_raw_text() {
        let dir = tempfile::tempdir().unwrap();
        let calendar = "====== DAY 1 ======\nGrounding\n\n====== DAY 2 ======\nDepth";
        let llm = Arc::new(ScriptedLlmClient::new(vec![MockStep::text(calendar)]));
        let prefs = Arc::new(PreferenceLog::new(dir.path().join("p.json"), 10));
        let engine = ContentEngine::new(llm.clone(), prefs, None).with_token_limits(3000, 6000);

        let brief: CalendarBrief = serde_json::from_value(json!({
            "calendar_brief": "a week on rest",
            "platforms": ["instagram", "rednote"],
            "num_posts": 5
        }))
        .unwrap();

        assert_eq!(engine.generate_calendar(&brief).await.unwrap(), calendar);

        let requests = llm.requests().await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].system.contains("weekly calendar of 5 posts"));
        assert!(requests[0].tools.is_empty());
        assert_eq!(requests[0].max_tokens, 6000);
        let user = requests[0].messages[0].text();
        assert!(user.starts_with("Generate a weekly content calendar for instagram and rednote."));
        assert!(user.contains("a week on rest"));
    }

    #[tokio::test]
    async fn test_generate_calendar_propagates_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlmClient::new(vec![MockStep::Fail(LlmError::Timeout(30))]));
        let prefs = Arc::new(PreferenceLog::new(dir.path().join("p.json"), 10));
        let engine = ContentEngine::new(llm, prefs, None);
        let brief: CalendarBrief = serde_json::from_value(json!({
            "calendar_brief": "a week on rest",
            "platforms": ["instagram"],
            "num_posts": 3
        }))
        .unwrap();

        assert!(matches!(
            engine.generate_calendar(&brief).await,
            Err(LlmError::Timeout(30))
        ));
    }

    #[test]
    fn test_calendar_platform_selection() {
        assert_eq!(calendar_platform(&[]), Platform::Instagram);
        assert_eq!(calendar_platform(&[Channel::Rednote]), Platform::Rednote);
        assert_eq!(
            calendar_platform(&[Channel::Rednote, Channel::Instagram]),
            Platform::Both
        );
    }
}
