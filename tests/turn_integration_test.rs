//! 端到端轮次测试：Mock 后端 + 真实会话存储 / 记忆 / 偏好日志

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use serde_json::json;
    use sora::agent::{
        assemble_components, end_session, process_message, AgentComponents, Backends,
    };
    use sora::config::AppConfig;
    use sora::llm::{LlmError, MockStep, ScriptedLlmClient, StaticImageBackend};
    use sora::memory::{ContentBlock, PreferenceEntry, PreferenceLog, Role};
    use sora::publish::StubPublisher;
    use sora::tools::Action;
    use sora::GENERIC_FAILURE_TEXT;

    const USER: &str = "creator_1";

    const DRAFT: &str = "===== OPTION A (Reflective) =====\nContent Type: Feed Post\nCaption: What if rest is the work?\nHashtags: #Midlife #Rest\n===== OPTION B (Direct) =====\nContent Type: Carousel\nCaption: Rest is the work.\nHashtags: #Midlife";

    fn config(dir: &Path) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.app.data_dir = dir.to_path_buf();
        cfg.app.brand_voice_path = None;
        cfg
    }

    fn components(
        dir: &Path,
        llm: Arc<ScriptedLlmClient>,
        publisher: Arc<StubPublisher>,
    ) -> AgentComponents {
        assemble_components(
            &config(dir),
            Backends {
                llm,
                images: Arc::new(StaticImageBackend::new(vec![4, 5, 6])),
                publisher,
            },
        )
    }

    fn brief() -> serde_json::Value {
        json!({
            "platform": "instagram",
            "topic": "rest",
            "content_type": "feed_post",
            "hook_direction": "a gentle question",
            "content_direction": "rest as a practice",
            "words_to_use": ["season"],
            "words_to_avoid": ["hustle"]
        })
    }

    fn say(text: &str) -> Vec<ContentBlock> {
        vec![ContentBlock::text(text)]
    }

    fn texts(actions: &[Action]) -> Vec<&str> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb([120, 140, 160]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn test_draft_and_approve_records_option_a() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlmClient::new(vec![
            MockStep::tool("generate_text_content", brief()),
            MockStep::text(DRAFT),
            MockStep::tool(
                "present_options",
                json!({"option_a_summary": "reflective", "option_b_summary": "direct"}),
            ),
            MockStep::text("Take a look."),
            MockStep::tool("save_approval", json!({"option": "a"})),
            MockStep::text("Saved. Want an image?"),
        ]));
        let c = components(dir.path(), llm, Arc::new(StubPublisher::unconfigured()));

        let first = process_message(&c, USER, say("write about rest")).await;
        assert!(texts(&first)[0].starts_with("*Option A*"));
        assert!(first.iter().any(|a| matches!(a, Action::Buttons { .. })));
        assert_eq!(texts(&first).last(), Some(&"Take a look."));

        let second = process_message(&c, USER, say("[BUTTON: pick_a]")).await;
        assert!(texts(&second)[0].starts_with("Approved! Here's your final post"));
        assert!(texts(&second)[0].contains("What if rest is the work?"));

        let entries = c.preferences.load().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].chosen_option, "A");
        assert_eq!(entries[0].topic, "rest");
        assert_eq!(entries[0].platform, "instagram");
    }

    #[tokio::test]
    async fn test_revise_feedback_lands_in_preference_entry() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlmClient::new(vec![
            MockStep::tool("generate_text_content", brief()),
            MockStep::text(DRAFT),
            MockStep::text("Two options above."),
            MockStep::text("What should change in B?"),
            MockStep::tool("generate_text_content", brief()),
            MockStep::text(DRAFT),
            MockStep::text("Tighter version above."),
            MockStep::tool("save_approval", json!({"option": "b"})),
            MockStep::text("Saved."),
        ]));
        let c = components(dir.path(), llm, Arc::new(StubPublisher::unconfigured()));

        process_message(&c, USER, say("write about rest")).await;
        process_message(&c, USER, say("[BUTTON: revise_b]")).await;
        process_message(&c, USER, say("make it shorter")).await;
        process_message(&c, USER, say("[BUTTON: pick_b]")).await;

        let entries = c.preferences.load().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].chosen_option, "B");
        assert_eq!(entries[0].revision_notes, vec!["Revise B: make it shorter"]);
        assert!(c.preferences.summary().await.contains("Common revision requests"));
    }

    #[tokio::test]
    async fn test_publish_without_image_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlmClient::new(vec![
            MockStep::tool("generate_text_content", brief()),
            MockStep::text(DRAFT),
            MockStep::text("Two options above."),
            MockStep::tool("save_approval", json!({"option": "a"})),
            MockStep::text("Saved."),
            MockStep::tool("publish_content", json!({"platform": "instagram"})),
            MockStep::text("Instagram needs an image first."),
        ]));
        let publisher = Arc::new(StubPublisher::succeeding("m_42"));
        let c = components(dir.path(), llm, publisher.clone());

        process_message(&c, USER, say("write about rest")).await;
        process_message(&c, USER, say("[BUTTON: pick_a]")).await;
        let actions = process_message(&c, USER, say("[BUTTON: publish_instagram]")).await;

        assert_eq!(actions, vec![Action::text("Instagram needs an image first.")]);
        assert!(publisher.captions().await.is_empty());

        let shared = c.sessions.get_or_create(USER).await;
        let session = shared.lock().await;
        let result = session
            .messages()
            .iter()
            .flat_map(|m| m.content.iter())
            .filter_map(|b| match b {
                ContentBlock::ToolResult {
                    content, is_error, ..
                } => Some((content.as_str(), *is_error)),
                _ => None,
            })
            .last();
        match result {
            Some((content, is_error)) => {
                assert!(content.contains("requires an image"));
                assert!(is_error);
            }
            None => panic!("publish result missing from history"),
        }
        assert_eq!(session.approved_option, Some(sora::content::OptionKey::A));
    }

    #[tokio::test]
    async fn test_uploaded_photo_is_published() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlmClient::new(vec![
            MockStep::tool("apply_brand_filter", json!({"add_logo": false})),
            MockStep::text("Filtered."),
            MockStep::tool("generate_text_content", brief()),
            MockStep::text(DRAFT),
            MockStep::tool("save_approval", json!({"option": "b"})),
            MockStep::tool("publish_content", json!({"platform": "instagram"})),
            MockStep::text("Live!"),
        ]));
        let publisher = Arc::new(StubPublisher::succeeding("m_7"));
        let c = components(dir.path(), llm, publisher.clone());

        let mut content = vec![ContentBlock::image("image/png", png())];
        content.push(ContentBlock::text("here's my photo"));
        let first = process_message(&c, USER, content).await;
        assert!(matches!(&first[0], Action::Photo { .. }));

        let second = process_message(&c, USER, say("write about rest and post option b")).await;
        assert!(second.iter().any(|a| matches!(a, Action::Photo { caption, .. } if caption == "Your post photo")));
        assert_eq!(texts(&second).last(), Some(&"Live!"));
        assert_eq!(publisher.captions().await.len(), 1);
        assert!(publisher.captions().await[0].contains("Rest is the work."));
    }

    #[tokio::test]
    async fn test_backend_failure_shows_apology_and_keeps_session() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlmClient::new(vec![
            MockStep::Fail(LlmError::Http("connection reset".into())),
            MockStep::text("I'm back."),
        ]));
        let c = components(dir.path(), llm.clone(), Arc::new(StubPublisher::unconfigured()));

        let actions = process_message(&c, USER, say("hello")).await;
        assert_eq!(actions, vec![Action::text(GENERIC_FAILURE_TEXT)]);
        assert!(c.sessions.has_active(USER).await);

        let actions = process_message(&c, USER, say("hello again")).await;
        assert_eq!(actions, vec![Action::text("I'm back.")]);

        // 重试时带着失败那一轮的用户消息
        let requests = llm.requests().await;
        let last = &requests[1].messages;
        assert_eq!(last.len(), 2);
        assert!(last.iter().all(|m| m.role == Role::User));
    }

    #[tokio::test]
    async fn test_corrupt_summary_falls_back_and_feeds_next_session() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlmClient::new(vec![
            MockStep::tool("generate_text_content", brief()),
            MockStep::text(DRAFT),
            MockStep::text("Options ready."),
            MockStep::text("{\"summary\": \"unterminated"),
            MockStep::text("Welcome back."),
        ]));
        let c = components(dir.path(), llm.clone(), Arc::new(StubPublisher::unconfigured()));

        process_message(&c, USER, say("write about rest")).await;
        assert!(end_session(&c, USER).await);
        assert!(!c.sessions.has_active(USER).await);

        let record = c.memory.load(USER).await.unwrap().unwrap();
        assert_eq!(record.recent_sessions.len(), 1);
        let summary = &record.recent_sessions[0].summary;
        assert!(summary.starts_with("Topic: rest."), "{}", summary);
        assert!(summary.contains("User said: 'write about rest'"));
        assert_eq!(record.structured_summary.topics_discussed, vec!["rest"]);

        process_message(&c, USER, say("hi again")).await;
        let requests = llm.requests().await;
        let system = &requests.last().unwrap().system;
        assert!(system.contains("Topics explored: rest"));
        assert!(system.contains("Topic: rest."));
    }

    #[tokio::test]
    async fn test_transcripts_kept_for_last_three_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlmClient::always_text("noted"));
        let c = components(dir.path(), llm, Arc::new(StubPublisher::unconfigured()));

        for i in 0..5 {
            process_message(&c, USER, say(&format!("idea {}", i))).await;
            end_session(&c, USER).await;
        }

        let record = c.memory.load(USER).await.unwrap().unwrap();
        assert_eq!(record.recent_sessions.len(), 5);
        let with_transcript: Vec<bool> = record
            .recent_sessions
            .iter()
            .map(|s| s.transcript.is_some())
            .collect();
        assert_eq!(with_transcript, vec![false, false, true, true, true]);
    }

    #[tokio::test]
    async fn test_empty_session_is_not_archived() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlmClient::always_text("noted"));
        let c = components(dir.path(), llm.clone(), Arc::new(StubPublisher::unconfigured()));

        assert!(!end_session(&c, USER).await);
        c.sessions.get_or_create(USER).await;
        assert!(end_session(&c, USER).await);
        assert!(c.memory.load(USER).await.unwrap().is_none());
        assert_eq!(llm.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_preference_log_keeps_ten_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let log = PreferenceLog::new(dir.path().join("preferences.json"), 10);
        for i in 0..11 {
            let mut entry = PreferenceEntry::from_approval(sora::memory::ApprovalInput {
                platform: "instagram",
                topic: "rest",
                chosen_option: "A",
                style_used: "reflective",
                content_type: "feed_post",
                caption: "What if rest is the work?",
                hashtag_count: 2,
                revision_notes: Vec::new(),
            });
            entry.topic = format!("topic {}", i);
            log.record(entry).await.unwrap();
        }
        let entries = log.load().await.unwrap();
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0].topic, "topic 1");
        assert_eq!(entries[9].topic, "topic 10");
    }
}
