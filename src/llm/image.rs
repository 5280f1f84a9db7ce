//! 图片生成客户端（OpenAI 兼容 images/generations）
//!
//! 请求 `response_format = b64_json`，直接得到图片字节；若端点只返回 url 则再下载一次。

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;

use crate::llm::{ImageBackend, ImageSize, LlmError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiImageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl OpenAiImageClient {
    pub fn new(
        base_url: Option<&str>,
        model: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
    ) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_default();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key,
            model: model.to_string(),
            timeout_secs,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl OpenAiImageClient {
    fn http_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.timeout_secs)
        } else {
            LlmError::Http(e.to_string())
        }
    }
}

#[async_trait]
impl ImageBackend for OpenAiImageClient {
    async fn generate(&self, prompt: &str, size: &ImageSize) -> Result<Vec<u8>, LlmError> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "size": size.as_str(),
            "quality": "standard",
            "n": 1,
            "response_format": "b64_json",
        });
        let resp = self
            .http
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.http_error(e))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(LlmError::RateLimited { retry_after_ms: 0 });
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{}: {}", status, text)));
        }

        let parsed: ImagesResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let datum = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("no image in response".to_string()))?;

        if let Some(b64) = datum.b64_json {
            return base64::engine::general_purpose::STANDARD
                .decode(b64.as_bytes())
                .map_err(|e| LlmError::InvalidResponse(e.to_string()));
        }
        let url = datum.url.ok_or_else(|| {
            LlmError::InvalidResponse("image has neither data nor url".to_string())
        })?;
        let bytes = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.http_error(e))?
            .bytes()
            .await
            .map_err(|e| self.http_error(e))?;
        Ok(bytes.to_vec())
    }
}
