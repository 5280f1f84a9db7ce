//! 正文生成（copywriter）系统提示与日历规则

use crate::content::Platform;
use crate::prompts::platform::platform_rules;
use crate::prompts::VOICE_RULES;

const COPYWRITER_IDENTITY: &str = r#"You are the production copywriter for a wellness coaching brand serving
midlife adults (40-55) through life transitions and personal growth.

Every piece must read as if the creator wrote it personally, never like a marketer or an AI.
Follow the brand voice guide exactly and produce copy that can be posted as-is.
Execute the strategist's brief faithfully: its hook, direction, word lists and register are binding."#;

const DUAL_OPTIONS: &str = r#"DUAL OPTIONS:
Always produce exactly two genuinely different options.

OPTION A (Reflective): opens with a question or introspective line; contemplative, narrative,
slightly longer.
OPTION B (Direct): opens with a clear statement; grounded and action-oriented, slightly shorter.

Both stay fully on-brand, include hashtags and a visual suggestion, and are ready to post.

FORMAT:
===== OPTION A (Reflective) =====
Content Type: [type]: [one-line reason]
...

===== OPTION B (Direct) =====
Content Type: [type]: [one-line reason]
..."#;

const CONTENT_TYPE_RULES: &str = r#"CONTENT TYPE:
Honor the content type in the brief. Without one, choose: multi-point or list-like topics become
carousels, single-emotion narratives become feed posts. Rednote always uses its native post format."#;

const OUTPUT_FORMAT: &str = r#"OUTPUT FORMAT:
Each option contains, as labelled lines:
Content Type: [Feed Post / Carousel / Reel Caption / Story]: [reason]
Caption: the full ready-to-post caption
Hashtags: platform-appropriate hashtags in one block
Visual Suggestion: one sentence describing the ideal image (warm golds, creams, earth tones, natural light)
Carousels also include a Slide Breakdown inside the caption."#;

/// 正文生成系统提示
pub fn build_production_prompt(
    platform: Platform,
    brand_voice: &str,
    preference_summary: &str,
) -> String {
    let mut layers: Vec<String> = vec![
        "# LAYER 1: IDENTITY".to_string(),
        COPYWRITER_IDENTITY.to_string(),
        "# LAYER 2: BRAND VOICE GUIDE".to_string(),
        brand_voice.to_string(),
        "# LAYER 3: VOICE RULES".to_string(),
        VOICE_RULES.to_string(),
        "# LAYER 4: PLATFORM RULES".to_string(),
        platform_rules(platform),
        "# LAYER 5: DUAL OPTIONS".to_string(),
        DUAL_OPTIONS.to_string(),
        "# LAYER 6: CONTENT TYPE".to_string(),
        CONTENT_TYPE_RULES.to_string(),
    ];

    if !preference_summary.is_empty() {
        layers.push("# LAYER 7: PREFERENCE MEMORY".to_string());
        layers.push(format!(
            "Learned from recently approved posts:\n{}\n\nTreat these as tendencies, not rules.",
            preference_summary
        ));
    }

    layers.push("# OUTPUT FORMAT".to_string());
    layers.push(OUTPUT_FORMAT.to_string());
    layers.join("\n\n")
}

/// 周日历系统提示：正文提示 + 日历规则
pub fn build_calendar_prompt(
    platform: Platform,
    num_posts: u32,
    brand_voice: &str,
    preference_summary: &str,
) -> String {
    let base = build_production_prompt(platform, brand_voice, preference_summary);
    format!(
        "{}\n\n# CALENDAR RULES\n\nYou are writing a weekly calendar of {} posts.\n\
1. Every post is distinct: no repeated themes or phrases across the week.\n\
2. Vary the register (reflective, affirming, practical, story-driven) and the openings.\n\
3. Give the week an arc: grounding early, deeper exploration midweek, rest and integration at the end.\n\
4. Each post has Option A and Option B as in single-post generation, with its own content type.\n\
5. Label every post with its day.\n\n\
FORMAT:\n====== DAY 1 ======\n[angle]\n\n===== OPTION A (Reflective) =====\n...\n\n===== OPTION B (Direct) =====\n...\n\n====== DAY 2 ======\n...",
        base, num_posts
    )
}
