//! 发布渠道：Instagram 直发（Graph API），小红书手动复制

pub mod instagram;
pub mod mock;
pub mod rednote;

use async_trait::async_trait;
use thiserror::Error;

pub use instagram::InstagramPublisher;
pub use mock::StubPublisher;
pub use rednote::{RednoteBlocks, RednoteFormatter};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PublishError {
    #[error("Instagram token has expired, re-run the Instagram setup")]
    TokenExpired,

    #[error("Instagram rate limit exceeded, try again in {retry_after_minutes} minutes")]
    RateLimited { retry_after_minutes: u64 },

    #[error("Image upload failed: {0}")]
    ImageUpload(String),

    #[error("Media container failed: {0}")]
    Container(String),

    #[error("Publishing failed: {0}")]
    Publish(String),
}

/// 发布成功回执
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReceipt {
    pub media_id: String,
}

/// 直发渠道接口
#[async_trait]
pub trait DirectPublisher: Send + Sync {
    /// 凭据齐全且令牌未过期
    async fn is_configured(&self) -> bool;

    async fn publish(&self, image: &[u8], caption: &str) -> Result<PublishReceipt, PublishError>;
}
