//! 审批工具：present_options（按钮）、save_approval（写入偏好日志并给出可复制终稿）

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::content::{format_clean_copy, count_hashtags, ContentType, OptionKey, Platform};
use crate::memory::{ApprovalInput, PreferenceEntry};
use crate::session::Session;
use crate::tools::executor::{parse_args, ToolDeps, ToolError, ToolOutput};
use crate::tools::{Action, Button};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PresentOptionsArgs {
    /// Brief description of Option A shown above the buttons
    pub option_a_summary: String,
    /// Brief description of Option B shown above the buttons
    pub option_b_summary: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SaveApprovalArgs {
    /// Which option the creator approved
    pub option: OptionKey,
    /// Platform of the approved post; defaults to the platform of the current draft
    #[serde(default)]
    pub platform: Option<Platform>,
    /// Topic of the approved post; defaults to the topic of the current draft
    #[serde(default)]
    pub topic: Option<String>,
}

pub fn present_options(input: Value, session: &mut Session) -> Result<ToolOutput, ToolError> {
    let args: PresentOptionsArgs = parse_args(input)?;
    if session.generated_options.is_none() {
        return Ok(ToolOutput::failure(
            "No generated options to present. Call generate_text_content first.",
        ));
    }

    let rows = vec![
        vec![Button::new("Pick A", "pick_a"), Button::new("Pick B", "pick_b")],
        vec![
            Button::new("Revise A", "revise_a"),
            Button::new("Revise B", "revise_b"),
        ],
    ];
    Ok(ToolOutput::ok(
        "Options presented with Pick/Revise buttons. Waiting for the creator's selection.",
        vec![Action::Buttons {
            text: format!(
                "A: {}\nB: {}\n\nWhich do you prefer?",
                args.option_a_summary, args.option_b_summary
            ),
            rows,
        }],
    ))
}

pub async fn save_approval(
    deps: &ToolDeps,
    input: Value,
    session: &mut Session,
) -> Result<ToolOutput, ToolError> {
    let args: SaveApprovalArgs = parse_args(input)?;
    let Some(pair) = session.generated_options.as_ref() else {
        return Ok(ToolOutput::failure("No generated options to save."));
    };
    let option = pair.get(args.option).clone();

    let platform = args
        .platform
        .or(session.platform)
        .unwrap_or(Platform::Instagram);
    let topic = args
        .topic
        .or_else(|| session.topic.clone())
        .unwrap_or_default();
    let entry = PreferenceEntry::from_approval(ApprovalInput {
        platform: platform.as_str(),
        topic: &topic,
        chosen_option: args.option.upper(),
        style_used: args.option.style(),
        content_type: ContentType::normalize(&option.content_type).as_str(),
        caption: option.body(),
        hashtag_count: count_hashtags(&option.hashtags),
        revision_notes: session.revision_notes.clone(),
    });
    if let Err(e) = deps.preferences.record(entry).await {
        return Err(ToolError::Failed(format!("could not save preference: {}", e)));
    }
    session.take_revision_notes();
    session.approved_option = Some(args.option);

    let mut actions = vec![Action::text(format!(
        "Approved! Here's your final post, ready to copy:\n\n{}",
        format_clean_copy(&option)
    ))];
    if let Some(image) = session.generated_media.get(args.option.label()) {
        actions.push(Action::photo(image.clone(), "Your post image"));
    } else if let Some(photo) = &session.uploaded_media {
        actions.push(Action::photo(photo.clone(), "Your post photo"));
    }

    Ok(ToolOutput::ok(
        format!(
            "Post saved to preference memory. Option {} approved.",
            args.option.upper()
        ),
        actions,
    ))
}
