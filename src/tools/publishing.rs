//! publish_content：Instagram 走直发渠道，小红书输出可复制的分段文案与发布步骤

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::content::{format_clean_copy, Channel, DraftOption, OptionKey};
use crate::session::Session;
use crate::tools::executor::{parse_args, ToolDeps, ToolError, ToolOutput};
use crate::tools::Action;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PublishArgs {
    /// Platform to publish to
    pub platform: Channel,
    /// Which option to publish; defaults to the approved option
    #[serde(default)]
    pub option: Option<OptionKey>,
}

/// 失败时会话状态不变（审批结果保留）
pub async fn publish_content(
    deps: &ToolDeps,
    input: Value,
    session: &mut Session,
) -> Result<ToolOutput, ToolError> {
    let args: PublishArgs = parse_args(input)?;
    let Some(pair) = session.generated_options.as_ref() else {
        return Ok(ToolOutput::failure("No content to publish."));
    };
    let key = args
        .option
        .or(session.approved_option)
        .unwrap_or(OptionKey::A);
    let option = pair.get(key);
    let clean = format_clean_copy(option);

    match args.platform {
        Channel::Instagram => publish_instagram(deps, &clean, session.media_for(key)).await,
        Channel::Rednote => Ok(publish_rednote(deps, option, &clean)),
    }
}

async fn publish_instagram(
    deps: &ToolDeps,
    caption: &str,
    image: Option<&[u8]>,
) -> Result<ToolOutput, ToolError> {
    let Some(image) = image else {
        return Ok(ToolOutput::failure(
            "Instagram requires an image. No image available for this post.",
        ));
    };
    if !deps.publisher.is_configured().await {
        return Ok(ToolOutput::failure(
            "Instagram is not configured. Complete the Instagram setup (app credentials and token file) first.",
        ));
    }

    match deps.publisher.publish(image, caption).await {
        Ok(receipt) => {
            tracing::info!(media_id = %receipt.media_id, "instagram post published");
            Ok(ToolOutput::ok(
                format!("Published to Instagram! Media ID: {}", receipt.media_id),
                Vec::new(),
            ))
        }
        Err(e) => {
            tracing::warn!(error = %e, "instagram publish failed");
            Ok(ToolOutput::failure(format!("Instagram publish failed: {}", e)))
        }
    }
}

fn publish_rednote(deps: &ToolDeps, option: &DraftOption, clean: &str) -> ToolOutput {
    let blocks = deps.rednote.format(option, clean);
    let mut actions: Vec<Action> = blocks
        .labelled_blocks()
        .into_iter()
        .map(Action::text)
        .collect();
    actions.push(Action::text(deps.rednote.posting_instructions()));
    ToolOutput::ok("Rednote content formatted into copyable blocks.", actions)
}
