//! 测试用发布器：固定配置状态与结果，记录收到的 caption

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::publish::{DirectPublisher, PublishError, PublishReceipt};

pub struct StubPublisher {
    configured: bool,
    result: Result<PublishReceipt, PublishError>,
    captions: Mutex<Vec<String>>,
}

impl StubPublisher {
    /// 已配置，发布总是成功
    pub fn succeeding(media_id: &str) -> Self {
        Self {
            configured: true,
            result: Ok(PublishReceipt {
                media_id: media_id.to_string(),
            }),
            captions: Mutex::new(Vec::new()),
        }
    }

    /// 已配置，发布总是失败
    pub fn failing(error: PublishError) -> Self {
        Self {
            configured: true,
            result: Err(error),
            captions: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            result: Err(PublishError::Publish("not configured".to_string())),
            captions: Mutex::new(Vec::new()),
        }
    }

    pub async fn captions(&self) -> Vec<String> {
        self.captions.lock().await.clone()
    }
}

#[async_trait]
impl DirectPublisher for StubPublisher {
    async fn is_configured(&self) -> bool {
        self.configured
    }

    async fn publish(&self, _image: &[u8], caption: &str) -> Result<PublishReceipt, PublishError> {
        self.captions.lock().await.push(caption.to_string());
        self.result.clone()
    }
}
