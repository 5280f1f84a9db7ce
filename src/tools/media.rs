//! 图片工具：generate_image（AI 生成）、apply_brand_filter（处理用户上传的照片）

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::content::Channel;
use crate::session::{Session, STANDALONE_MEDIA};
use crate::text::truncate_chars;
use crate::tools::executor::{parse_args, ToolDeps, ToolError, ToolOutput};
use crate::tools::Action;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GenerateImageArgs {
    /// Detailed image prompt: subject, composition, color palette, lighting, mood. Under 100 words.
    pub image_brief: String,
    /// Platform (instagram = square 1:1, rednote = vertical)
    pub platform: Channel,
    /// Which option this image is for: 'option_a', 'option_b', or 'standalone'
    #[serde(default = "default_option_label")]
    pub option_label: String,
}

fn default_option_label() -> String {
    STANDALONE_MEDIA.to_string()
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BrandFilterArgs {
    /// Whether to add the brand logo watermark
    #[serde(default = "default_add_logo")]
    pub add_logo: bool,
}

fn default_add_logo() -> bool {
    true
}

pub async fn generate_image(
    deps: &ToolDeps,
    input: Value,
    session: &mut Session,
) -> Result<ToolOutput, ToolError> {
    let args: GenerateImageArgs = parse_args(input)?;
    let size = match args.platform {
        Channel::Instagram => &deps.image_sizes.instagram,
        Channel::Rednote => &deps.image_sizes.rednote,
    };

    let image = match deps.images.generate(&args.image_brief, size).await {
        Ok(bytes) => bytes,
        Err(e) => return Ok(ToolOutput::failure(format!("Image generation failed: {}", e))),
    };

    let label = if args.option_label.trim().is_empty() {
        default_option_label()
    } else {
        args.option_label.trim().to_string()
    };
    session.generated_media.insert(label.clone(), image.clone());

    Ok(ToolOutput::ok(
        format!(
            "Image generated for {}. Prompt: {}",
            label,
            truncate_chars(&args.image_brief, 100)
        ),
        vec![Action::photo(image, "AI-generated image")],
    ))
}

/// 滤镜是纯 CPU 计算，放到 blocking 线程池
pub async fn apply_brand_filter(
    deps: &ToolDeps,
    input: Value,
    session: &mut Session,
) -> Result<ToolOutput, ToolError> {
    let args: BrandFilterArgs = parse_args(input)?;
    let Some(photo) = session.uploaded_media.clone() else {
        return Ok(ToolOutput::failure("No photo uploaded in this session."));
    };

    let editor = deps.editor.clone();
    let filtered =
        tokio::task::spawn_blocking(move || editor.apply_brand_filter(&photo, args.add_logo)).await;
    let filtered = match filtered {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => return Ok(ToolOutput::failure(format!("Brand filter failed: {}", e))),
        Err(e) => return Ok(ToolOutput::failure(format!("Brand filter failed: {}", e))),
    };

    session.uploaded_media = Some(filtered.clone());
    Ok(ToolOutput::ok(
        "Brand filter applied. Photo ready.",
        vec![Action::photo(
            filtered,
            "Your photo with brand-consistent filtering applied.",
        )],
    ))
}
