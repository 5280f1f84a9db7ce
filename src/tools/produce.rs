//! 正文生产工具：generate_text_content、generate_calendar

use serde_json::Value;

use crate::content::validators::validate_option;
use crate::content::{
    format_option_preview, CalendarBrief, Channel, DraftBrief, DraftPair, OptionKey, Platform,
};
use crate::session::Session;
use crate::text::truncate_chars;
use crate::tools::executor::{parse_args, ToolDeps, ToolError, ToolOutput};
use crate::tools::Action;

const ACK_PREVIEW_CHARS: usize = 150;

pub async fn generate_text_content(
    deps: &ToolDeps,
    input: Value,
    session: &mut Session,
) -> Result<ToolOutput, ToolError> {
    let brief: DraftBrief = parse_args(input)?;
    let pair = match deps.content.generate_from_brief(&brief).await {
        Ok(pair) => pair,
        Err(e) => return Ok(ToolOutput::failure(format!("Content generation failed: {}", e))),
    };

    let actions = vec![
        Action::text(format_option_preview(&pair.option_a, "Option A")),
        Action::text(format_option_preview(&pair.option_b, "Option B")),
    ];
    let mut ack = draft_ack(&pair);
    let warnings = platform_warnings(brief.platform, &pair);
    if !warnings.is_empty() {
        ack.push_str("\n\nPlatform check:\n");
        ack.push_str(&warnings.join("\n"));
    }

    session.generated_options = Some(pair);
    session.platform = Some(brief.platform);
    session.topic = Some(brief.topic);
    Ok(ToolOutput::ok(ack, actions))
}

pub async fn generate_calendar(deps: &ToolDeps, input: Value) -> Result<ToolOutput, ToolError> {
    let brief: CalendarBrief = parse_args(input)?;
    match deps.content.generate_calendar(&brief).await {
        Ok(calendar) => Ok(ToolOutput::ok(
            format!("Calendar generated with {} posts.", brief.num_posts),
            vec![Action::text(calendar)],
        )),
        Err(e) => Ok(ToolOutput::failure(format!("Calendar generation failed: {}", e))),
    }
}

/// 回给后端的确认：两稿字数与开头
fn draft_ack(pair: &DraftPair) -> String {
    let describe = |key: OptionKey| {
        let body = pair.get(key).body();
        format!(
            "Option {} ({} words): {}...",
            key.upper(),
            body.split_whitespace().count(),
            truncate_chars(body, ACK_PREVIEW_CHARS)
        )
    };
    format!(
        "Content generated successfully.\n\n{}\n\n{}",
        describe(OptionKey::A),
        describe(OptionKey::B)
    )
}

/// 按目标平台逐稿校验，返回 "- Option A (instagram): ..." 形式的警告行
fn platform_warnings(platform: Platform, pair: &DraftPair) -> Vec<String> {
    let channels: &[Channel] = match platform {
        Platform::Instagram => &[Channel::Instagram],
        Platform::Rednote => &[Channel::Rednote],
        Platform::Both => &[Channel::Instagram, Channel::Rednote],
    };
    let mut lines = Vec::new();
    for key in [OptionKey::A, OptionKey::B] {
        for channel in channels {
            for warning in validate_option(*channel, pair.get(key)) {
                lines.push(format!("- Option {} ({}): {}", key.upper(), channel.as_str(), warning));
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::DraftOption;

    #[test]
    fn test_draft_ack_counts_words() {
        let pair = DraftPair {
            option_a: DraftOption {
                caption: "one two three".into(),
                ..Default::default()
            },
            option_b: DraftOption {
                raw: "raw only text".into(),
                ..Default::default()
            },
            raw: String::new(),
        };
        let ack = draft_ack(&pair);
        assert!(ack.starts_with("Content generated successfully."));
        assert!(ack.contains("Option A (3 words): one two three..."));
        assert!(ack.contains("Option B (3 words): raw only text..."));
    }

    #[test]
    fn test_platform_warnings_for_long_caption() {
        let pair = DraftPair {
            option_a: DraftOption {
                caption: "x".repeat(2300),
                ..Default::default()
            },
            ..Default::default()
        };
        let warnings = platform_warnings(Platform::Instagram, &pair);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("- Option A (instagram): Caption is 2300 chars"));
        assert!(platform_warnings(Platform::Instagram, &DraftPair::default()).is_empty());
    }
}
