//! 策略师系统提示：身份、品牌语调、语气规则、视觉规范、平台规则、记忆、偏好、发布说明，按层拼接

use crate::prompts::platform::{INSTAGRAM_RULES, REDNOTE_RULES};
use crate::prompts::{VISUAL_GUIDELINES, VOICE_RULES};

const STRATEGIST_IDENTITY: &str = r#"You are Sora, content strategist and creative director for a wellness coaching brand
serving midlife adults (40-55).

You are not the copywriter. You are a strategic partner who:
1. Listens: the creator may bring a vague thought or a fully written post
2. Shapes the idea briefly: suggests angles, flags what may not land, asks focused questions
3. Writes precise production briefs for the copywriter and the image generator
4. Presents the assembled options and guides the creator through approval

CONVERSATION:
- Be concise and match the creator's energy.
- Ask at most 1-2 clarifying questions. If the idea is clear, go straight to production.
- When in doubt, produce something; revising is easier than talking.
- If the creator supplies their own text, put it in the brief's user_script so it gets refined, not replaced.

TOOLS:
- Never write captions yourself. Build a structured brief and call generate_text_content.
- Briefs are specific: words to use and avoid, hook, content and CTA direction, form, style,
  word count, emotional register, hashtag guidance.
- Image briefs for generate_image are ready-to-use prompts: subject, composition, palette, lighting, mood.
- Never call generate_image without the creator's confirmation. Ask first.
- After content is generated, call present_options.
- After an approval, call save_approval.

BUTTONS:
- Button presses arrive as "[BUTTON: pick_a]", "[BUTTON: revise_b]", "[BUTTON: publish_instagram]" and so on.
- pick_a / pick_b: call save_approval for that option, then offer next steps.
- revise_a / revise_b: ask what to change, then send a revised brief to generate_text_content.
- publish_*: call publish_content. publish_skip: close gracefully.

NO ECHOING:
- Tool output (options, clean copy, images) is shown to the creator automatically.
  Do not repeat or re-summarize it. Acknowledge briefly and move on.

CALENDAR:
- For "plan my week" style requests, settle themes, post count and platforms, then call generate_calendar.

PHOTOS:
- When a photo arrives, acknowledge it and offer apply_brand_filter. The photo is paired with the post.
"#;

/// 组装策略师系统提示所需的各层输入
#[derive(Debug, Clone, Default)]
pub struct StrategistPromptParts<'a> {
    pub brand_voice: &'a str,
    pub memory_context: &'a str,
    pub preference_summary: &'a str,
    pub publish_enabled: bool,
}

pub fn build_strategist_system_prompt(parts: &StrategistPromptParts<'_>) -> String {
    let mut layers: Vec<String> = vec![
        "# ROLE: CONTENT STRATEGIST".to_string(),
        STRATEGIST_IDENTITY.to_string(),
        "# BRAND VOICE GUIDE".to_string(),
        parts.brand_voice.to_string(),
        "# VOICE RULES".to_string(),
        VOICE_RULES.to_string(),
        "# VISUAL GUIDELINES".to_string(),
        VISUAL_GUIDELINES.to_string(),
        "# PLATFORM RULES".to_string(),
        "--- INSTAGRAM ---".to_string(),
        INSTAGRAM_RULES.to_string(),
        "--- REDNOTE ---".to_string(),
        REDNOTE_RULES.to_string(),
    ];

    if !parts.memory_context.is_empty() {
        layers.push("# MEMORY FROM PAST SESSIONS".to_string());
        layers.push(parts.memory_context.to_string());
    }

    if !parts.preference_summary.is_empty() {
        layers.push("# STYLE PREFERENCES (recently approved posts)".to_string());
        layers.push(parts.preference_summary.to_string());
        layers.push(
            "These are soft tendencies. The creator's explicit direction always wins.".to_string(),
        );
    }

    if parts.publish_enabled {
        layers.push(
            "# PUBLISHING\nAfter an approval, offer to publish with publish_content.\nInstagram publishes directly; Rednote gets formatted copy blocks."
                .to_string(),
        );
    } else {
        layers.push(
            "# PUBLISHING\nPublishing is not configured. After approval the clean copy is shown for manual posting."
                .to_string(),
        );
    }

    layers.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_layers_only_when_present() {
        let bare = build_strategist_system_prompt(&StrategistPromptParts {
            brand_voice: "VOICE GUIDE",
            ..Default::default()
        });
        assert!(bare.contains("VOICE GUIDE"));
        assert!(!bare.contains("# MEMORY FROM PAST SESSIONS"));
        assert!(!bare.contains("# STYLE PREFERENCES"));
        assert!(bare.contains("Publishing is not configured"));

        let full = build_strategist_system_prompt(&StrategistPromptParts {
            brand_voice: "VOICE GUIDE",
            memory_context: "Topics explored: grief",
            preference_summary: "Based on 3 recently approved posts:",
            publish_enabled: true,
        });
        assert!(full.contains("Topics explored: grief"));
        assert!(full.contains("Based on 3 recently approved posts:"));
        assert!(full.contains("offer to publish with publish_content"));
    }
}
