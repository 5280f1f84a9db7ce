//! 平台规则模板（Instagram / 小红书），同时用于策略师 brief 构造与正文生成

use crate::content::Platform;

pub const INSTAGRAM_RULES: &str = r#"PLATFORM: Instagram
LANGUAGE: English only

CONTENT TYPES:
- Feed Post: reflective, narrative, emotionally driven (single image + caption)
- Carousel: multi-step insights, lists, frameworks, how-to content (3-7 slides)
- Reel Caption: short hook that accompanies video
- Story: casual, in-the-moment engagement prompt

FEED POST STRUCTURE:
1. HOOK: the first line, visible before "...more". Under 15 words.
2. BODY: 2-3 short paragraphs with a reflective turn, blank lines between them.
3. INVITATION: a soft closing question, DM invitation, or "save this" prompt. Never salesy.

CAROUSEL STRUCTURE:
1. Cover slide title under 10 words
2. Slides 2-6: one insight each, able to stand alone
3. Final slide: summary or a prompt to save/share
4. Caption: brief context plus hashtags

REEL CAPTION STRUCTURE:
1. Hook under 10 words
2. One or two sentences of context
3. A simple engagement prompt

FORMATTING:
- Feed captions run 150-300 words
- 0-2 emojis, only where they add warmth
- 8-12 hashtags in a separate block after the caption: one brand tag, 3-4 niche, 3-4 topic, 2-3 broad
- Contractions always, Oxford comma always, address the reader as "you"
"#;

pub const REDNOTE_RULES: &str = r#"PLATFORM: Rednote (Xiaohongshu / Little Red Book)
LANGUAGES: English AND Chinese versions

RULES:
- Every post has a visible title of 10-20 characters, honest rather than clickbait, 1-2 emojis allowed
- More personal and story-driven than Instagram, shorter sentences, more paragraph breaks
- 2-4 emojis woven in naturally
- 5-8 tags in # format, English and Chinese

BODY STRUCTURE:
1. Personal opening: a relatable moment or micro-story
2. Insight, delivered conversationally
3. One practical takeaway or reflection prompt
4. Warm sign-off or question

CHINESE VERSION:
- A cultural adaptation, not a literal translation
- Use 你, never 您; conversational Mandarin, not literary
- Adapt idioms and references for a Chinese-speaking audience

OUTPUT FORMAT (both versions, clearly separated):

**English Version:**
Title: [title]
[body]
Tags: #tag1 #tag2 ...

**Chinese Version (中文版):**
标题: [Chinese title]
[Chinese body]
标签: #标签1 #标签2 ...
"#;

/// 按目标平台选择规则；both 时两套规则并列
pub fn platform_rules(platform: Platform) -> String {
    match platform {
        Platform::Instagram => INSTAGRAM_RULES.to_string(),
        Platform::Rednote => REDNOTE_RULES.to_string(),
        Platform::Both => format!(
            "Generate content for BOTH platforms with a separate version for each.\n\n--- INSTAGRAM RULES ---\n{}\n\n--- REDNOTE RULES ---\n{}",
            INSTAGRAM_RULES, REDNOTE_RULES
        ),
    }
}
