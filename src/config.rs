//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SORA__*` 覆盖（双下划线表示嵌套，如 `SORA__LLM__MODEL=gpt-4o`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub image: ImageSection,
    pub strategist: StrategistSection,
    pub memory: MemorySection,
    pub publish: PublishSection,
}

/// [app] 段：数据目录、品牌语调文件、Logo、发布开关
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    /// 会话记忆、偏好日志、生成图片的根目录
    pub data_dir: PathBuf,
    /// 品牌语调指南（每轮重新读取，可热替换）
    pub brand_voice_path: Option<PathBuf>,
    /// 水印 Logo（PNG，带透明通道）
    pub logo_path: Option<PathBuf>,
    /// 是否在批准后提供发布
    pub publish_enabled: bool,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "sora".to_string(),
            data_dir: PathBuf::from("data"),
            brand_voice_path: Some(PathBuf::from("assets/brand_voice_guide.txt")),
            logo_path: None,
            publish_enabled: false,
        }
    }
}

/// [llm] 段：文本后端与各类调用的输出上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub base_url: Option<String>,
    pub model: String,
    /// 读取 API Key 的环境变量名
    pub api_key_env: String,
    pub max_tokens_strategist: u32,
    pub max_tokens_post: u32,
    pub max_tokens_calendar: u32,
    pub max_tokens_summary: u32,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: None,
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens_strategist: 2048,
            max_tokens_post: 3000,
            max_tokens_calendar: 8000,
            max_tokens_summary: 500,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    /// 单次请求超时（秒），超时按普通后端失败处理
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 60 }
    }
}

/// [image] 段：图片生成模型与平台尺寸
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageSection {
    pub base_url: Option<String>,
    pub model: String,
    pub instagram_size: String,
    pub rednote_size: String,
    pub timeout_secs: u64,
}

impl Default for ImageSection {
    fn default() -> Self {
        Self {
            base_url: None,
            model: "dall-e-3".to_string(),
            instagram_size: "1024x1024".to_string(),
            rednote_size: "1024x1792".to_string(),
            timeout_secs: 120,
        }
    }
}

/// [strategist] 段：工具循环上限、转录保留窗口、单个工具超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrategistSection {
    pub max_iterations: usize,
    pub transcript_retention: usize,
    pub tool_timeout_secs: u64,
}

impl Default for StrategistSection {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            transcript_retention: 3,
            tool_timeout_secs: 180,
        }
    }
}

/// [memory] 段：偏好日志与长期记忆各列表上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemorySection {
    pub max_preferences: usize,
    pub topics_cap: usize,
    pub parked_cap: usize,
    pub decisions_cap: usize,
    pub style_cap: usize,
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            max_preferences: 10,
            topics_cap: 20,
            parked_cap: 10,
            decisions_cap: 10,
            style_cap: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PublishSection {
    pub instagram: InstagramSection,
}

/// [publish.instagram] 段：Graph API 凭据与图床
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InstagramSection {
    pub app_id: String,
    pub app_secret: String,
    pub token_file: PathBuf,
    pub graph_api_version: String,
    pub graph_base_url: String,
    pub imgbb_api_key: String,
    pub imgbb_upload_url: String,
    pub timeout_secs: u64,
}

impl Default for InstagramSection {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: String::new(),
            token_file: PathBuf::from("config/instagram_token.json"),
            graph_api_version: "v21.0".to_string(),
            graph_base_url: "https://graph.facebook.com".to_string(),
            imgbb_api_key: String::new(),
            imgbb_upload_url: "https://api.imgbb.com/1/upload".to_string(),
            timeout_secs: 30,
        }
    }
}

/// 从 config 目录加载配置，环境变量 SORA__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 SORA__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SORA")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
