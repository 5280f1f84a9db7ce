//! Prompt 模板：策略师、正文生成、会话摘要；品牌语调指南从文件热加载

pub mod platform;
pub mod production;
pub mod strategist;

use std::path::Path;

pub use production::{build_calendar_prompt, build_production_prompt};
pub use strategist::{build_strategist_system_prompt, StrategistPromptParts};

/// 语调规则（用词 / 禁用词 / 文风）
pub const VOICE_RULES: &str = r#"USE these words and phrases:
- transition, shift, crossroads (not crisis, breakdown)
- explore, discover, uncover (not fix, heal, solve)
- chapter, season, phase (not new beginning, fresh start)
- navigate, walk through (not conquer, overcome, battle)
- clarity, direction, insight (not answer, solution)
- guide, partner, companion (not guru, expert, teacher)
- "you" as direct address (not "people", "many", "some")
- might, could, consider (not should, must, need to)

NEVER USE (always list in words_to_avoid):
- manifest, vibration, energy
- toxic, trauma (unless clinically appropriate)
- authentic self, true self
- just, simply, easy
- should, must, need to
- unlock, unleash
- crisis, breakdown
- guru, expert, teacher (about the creator)

STYLE:
- Contractions always; Oxford comma always
- At most one exclamation mark per post
- Tone of a wise friend writing a personal note; never saccharine or preachy"#;

/// 视觉规范（图片 brief 用）
pub const VISUAL_GUIDELINES: &str = r#"- Palette: warm golds, soft creams, earth tones, sage greens, muted naturals
- Light: natural and soft, morning or golden hour
- Style: editorial photography, clean, minimal, calm
- Subjects: journals, nature paths, tea or coffee, plants, contemplative settings, natural textures
- Mood: serene, warm, inviting, grounded
- Avoid: harsh or neon colors, busy compositions, stock-photo feel, corporate settings, posed people
- Aspect: Instagram 1:1 square, Rednote vertical"#;

/// 会话摘要指令：要求后端只返回 JSON
pub const SUMMARIZE_PROMPT: &str = r#"You are summarizing a content creation session between the creator (user) and Sora (their content strategist).

Read the transcript and return a JSON object with exactly these fields:

{
  "summary": "2-3 sentence narrative of what happened in this session",
  "topics_discussed": ["content topics that came up"],
  "parked_ideas": ["ideas mentioned but not produced into posts"],
  "style_preferences": "new style preferences the creator expressed, or an empty string",
  "decisions": ["key decisions, e.g. 'prefers Option A reflective style'"]
}

Rules:
- Only include what actually happened; do not speculate
- A parked idea from an earlier session that was produced now is not parked
- Keep every field concise
- Return ONLY the JSON object, no markdown fences"#;

const BRAND_VOICE_FALLBACK: &str =
    "(Brand voice guide not found. Use a warm, grounded wellness-coaching tone.)";

/// 读取品牌语调指南；每次调用都重新读取文件，缺失或读取失败时返回兜底说明
pub fn load_brand_voice(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return BRAND_VOICE_FALLBACK.to_string();
    };
    match std::fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => BRAND_VOICE_FALLBACK.to_string(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "brand voice guide unavailable");
            BRAND_VOICE_FALLBACK.to_string()
        }
    }
}
