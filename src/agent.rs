//! 无头运行时
//!
//! 供任意传输层（控制台、聊天机器人、HTTP）调用：create_agent_components 按配置装配后端、
//! 工具、记忆与会话存储；process_message 在每用户轮次锁内对一条用户输入跑策略循环，
//! 后端失败时返回通用致歉文本并保留会话。

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::content::ContentEngine;
use crate::imaging::BrandFilter;
use crate::llm::{ImageBackend, ImageSize, LlmClient, OpenAiClient, OpenAiImageClient};
use crate::memory::{ContentBlock, MemoryCaps, MemoryStore, PreferenceLog};
use crate::publish::{DirectPublisher, InstagramPublisher, RednoteFormatter};
use crate::session::{SessionArchiver, SessionStore};
use crate::strategist::{
    Strategist, StrategistDeps, StrategistEvent, StrategistSettings, GENERIC_FAILURE_TEXT,
};
use crate::tools::{Action, ImageSizes, ToolDeps, ToolExecutor};

/// 外部后端：文本、图片、直发渠道
pub struct Backends {
    pub llm: Arc<dyn LlmClient>,
    pub images: Arc<dyn ImageBackend>,
    pub publisher: Arc<dyn DirectPublisher>,
}

/// 预构建的组件，多用户共享
pub struct AgentComponents {
    pub strategist: Strategist,
    pub sessions: SessionStore,
    pub preferences: Arc<PreferenceLog>,
    pub memory: Arc<MemoryStore>,
}

/// 按配置创建真实后端（OpenAI 兼容文本 / 图片端点、Instagram Graph 发布）并装配组件
pub fn create_agent_components(cfg: &AppConfig) -> AgentComponents {
    let api_key = std::env::var(&cfg.llm.api_key_env).ok();
    let client = OpenAiClient::new(
        cfg.llm.base_url.as_deref(),
        &cfg.llm.model,
        api_key.as_deref(),
        cfg.llm.timeouts.request,
    );
    tracing::info!(
        model = client.model(),
        api_key_set = api_key.is_some(),
        "text backend configured"
    );
    let llm: Arc<dyn LlmClient> = Arc::new(client);
    let images: Arc<dyn ImageBackend> = Arc::new(OpenAiImageClient::new(
        cfg.image.base_url.as_deref(),
        &cfg.image.model,
        api_key.as_deref(),
        cfg.image.timeout_secs,
    ));
    let publisher: Arc<dyn DirectPublisher> =
        Arc::new(InstagramPublisher::new(cfg.publish.instagram.clone()));

    assemble_components(
        cfg,
        Backends {
            llm,
            images,
            publisher,
        },
    )
}

/// 用给定后端装配组件（测试中传入 Mock 后端）
pub fn assemble_components(cfg: &AppConfig, backends: Backends) -> AgentComponents {
    let data_dir = &cfg.app.data_dir;
    if let Err(e) = std::fs::create_dir_all(data_dir) {
        tracing::warn!(path = %data_dir.display(), error = %e, "failed to create data dir");
    }

    let preferences = Arc::new(PreferenceLog::new(
        data_dir.join("preferences.json"),
        cfg.memory.max_preferences,
    ));
    let memory = Arc::new(MemoryStore::new(
        data_dir.join("memory"),
        MemoryCaps::from(&cfg.memory),
        cfg.strategist.transcript_retention,
    ));
    let archiver = Arc::new(SessionArchiver::new(
        backends.llm.clone(),
        memory.clone(),
        cfg.llm.max_tokens_summary,
    ));
    let sessions = SessionStore::new(memory.clone(), archiver);

    let content = ContentEngine::new(
        backends.llm.clone(),
        preferences.clone(),
        cfg.app.brand_voice_path.clone(),
    )
    .with_token_limits(cfg.llm.max_tokens_post, cfg.llm.max_tokens_calendar);

    let tool_deps = ToolDeps {
        content: Arc::new(content),
        images: backends.images,
        image_sizes: ImageSizes {
            instagram: ImageSize(cfg.image.instagram_size.clone()),
            rednote: ImageSize(cfg.image.rednote_size.clone()),
        },
        editor: Arc::new(BrandFilter::new(cfg.app.logo_path.clone())),
        preferences: preferences.clone(),
        publisher: backends.publisher,
        rednote: RednoteFormatter,
    };

    let strategist = Strategist::new(
        StrategistDeps {
            llm: backends.llm,
            tools: ToolExecutor::new(tool_deps, cfg.strategist.tool_timeout_secs),
            brand_voice_path: cfg.app.brand_voice_path.clone(),
        },
        StrategistSettings {
            max_iterations: cfg.strategist.max_iterations,
            max_tokens: cfg.llm.max_tokens_strategist,
            publish_enabled: cfg.app.publish_enabled,
        },
    );

    tracing::info!(
        data_dir = %data_dir.display(),
        max_iterations = cfg.strategist.max_iterations,
        publish_enabled = cfg.app.publish_enabled,
        "agent components ready"
    );

    AgentComponents {
        strategist,
        sessions,
        preferences,
        memory,
    }
}

/// 处理单条用户输入，返回待发送的动作
pub async fn process_message(
    components: &AgentComponents,
    user_id: &str,
    content: Vec<ContentBlock>,
) -> Vec<Action> {
    run(components, user_id, content, None).await
}

/// 同 process_message，并通过 event_tx 推送过程事件
pub async fn process_message_stream(
    components: &AgentComponents,
    user_id: &str,
    content: Vec<ContentBlock>,
    event_tx: mpsc::UnboundedSender<StrategistEvent>,
) -> Vec<Action> {
    run(components, user_id, content, Some(&event_tx)).await
}

async fn run(
    components: &AgentComponents,
    user_id: &str,
    content: Vec<ContentBlock>,
    event_tx: Option<&mpsc::UnboundedSender<StrategistEvent>>,
) -> Vec<Action> {
    let turn_lock = components.sessions.lock_for(user_id).await;
    let _turn = turn_lock.lock().await;

    let shared = components.sessions.get_or_create(user_id).await;
    let mut session = shared.lock().await;

    // 最近一张上传的图片成为本会话的照片
    if let Some(photo) = content.iter().rev().find_map(|b| match b {
        ContentBlock::Image { data, .. } => Some(data.clone()),
        _ => None,
    }) {
        session.uploaded_media = Some(photo);
    }
    session.note_user_input(&content);

    let memory_context = components.sessions.load_memory_context(user_id).await;
    match components
        .strategist
        .run_turn_with_events(&mut session, content, &memory_context, event_tx)
        .await
    {
        Ok(actions) => actions,
        Err(e) => {
            tracing::error!(
                user_id = %user_id,
                session_id = %session.id,
                error = %e,
                "turn failed"
            );
            vec![Action::text(GENERIC_FAILURE_TEXT)]
        }
    }
}

/// 开始新会话（已有会话先归档）
pub async fn start_session(components: &AgentComponents, user_id: &str) {
    let turn_lock = components.sessions.lock_for(user_id).await;
    let _turn = turn_lock.lock().await;
    components.sessions.start(user_id).await;
}

/// 结束并归档当前会话；返回是否存在活动会话
pub async fn end_session(components: &AgentComponents, user_id: &str) -> bool {
    let turn_lock = components.sessions.lock_for(user_id).await;
    let _turn = turn_lock.lock().await;
    components.sessions.end(user_id).await.is_some()
}
