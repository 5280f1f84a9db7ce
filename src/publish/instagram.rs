//! Instagram Graph API 发布
//!
//! 流程：图床上传（imgbb，10 分钟后自动删除）→ 创建媒体容器 → 轮询容器状态至 FINISHED → media_publish。
//! 长期令牌存放在 JSON 文件中，剩余不足 7 天时自动续期；续期失败只记日志。

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::InstagramSection;
use crate::memory::JsonFile;
use crate::publish::{DirectPublisher, PublishError, PublishReceipt};

const REFRESH_WITHIN_DAYS: i64 = 7;
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 5_184_000;
const IMGBB_EXPIRATION_SECS: u32 = 600;
const RATE_LIMIT_RETRY_MINUTES: u64 = 15;
const TOKEN_EXPIRED_CODE: i64 = 190;
const POLL_INTERVAL: Duration = Duration::from_secs(3);
const POLL_TIMEOUT: Duration = Duration::from_secs(60);

/// 令牌文件内容；未知字段原样保留
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenData {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub ig_user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refreshed_at: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl TokenData {
    /// 无法解析的过期时间视为未知（不阻止发布）
    fn expiry(&self) -> Option<DateTime<Utc>> {
        let raw = self.expires_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }
}

pub struct InstagramPublisher {
    http: reqwest::Client,
    settings: InstagramSection,
    token_file: JsonFile,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl InstagramPublisher {
    pub fn new(settings: InstagramSection) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            http,
            token_file: JsonFile::new(&settings.token_file),
            settings,
            poll_interval: POLL_INTERVAL,
            poll_timeout: POLL_TIMEOUT,
        }
    }

    fn graph_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.settings.graph_base_url.trim_end_matches('/'),
            self.settings.graph_api_version,
            path
        )
    }

    async fn load_token(&self) -> Option<TokenData> {
        match self.token_file.load_async::<TokenData>().await {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(
                    path = %self.token_file.path().display(),
                    error = %e,
                    "failed to load Instagram token"
                );
                None
            }
        }
    }

    /// 已过期返回 TokenExpired；剩余 ≤7 天时尝试续期，续期失败沿用旧令牌
    async fn refresh_token_if_needed(
        &self,
        mut data: TokenData,
    ) -> Result<TokenData, PublishError> {
        let Some(expiry) = data.expiry() else {
            return Ok(data);
        };
        let now = Utc::now();
        if expiry < now {
            return Err(PublishError::TokenExpired);
        }
        let days_left = (expiry - now).num_days();
        if days_left > REFRESH_WITHIN_DAYS {
            return Ok(data);
        }

        tracing::info!(days_left, "Instagram token close to expiry, refreshing");
        match self.exchange_token(&data.access_token).await {
            Ok((token, expires_in)) => {
                let now = Utc::now();
                data.access_token = token;
                data.expires_at = Some((now + chrono::Duration::seconds(expires_in)).to_rfc3339());
                data.refreshed_at = Some(now.to_rfc3339());
                if let Err(e) = self.token_file.save_async(&data).await {
                    tracing::error!(error = %e, "failed to save refreshed Instagram token");
                }
                tracing::info!(expires_at = ?data.expires_at, "Instagram token refreshed");
            }
            Err(e) => tracing::error!(error = %e, "Instagram token refresh failed"),
        }
        Ok(data)
    }

    async fn exchange_token(&self, current: &str) -> Result<(String, i64), PublishError> {
        let resp = self
            .http
            .get(self.graph_url("oauth/access_token"))
            .query(&[
                ("grant_type", "fb_exchange_token"),
                ("client_id", self.settings.app_id.as_str()),
                ("client_secret", self.settings.app_secret.as_str()),
                ("fb_exchange_token", current),
            ])
            .send()
            .await
            .map_err(|e| PublishError::Publish(e.to_string()))?;
        let body = check_graph_response(resp).await?;
        let token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PublishError::Publish("refresh response has no access_token".to_string())
            })?;
        let expires_in = body
            .get("expires_in")
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        Ok((token.to_string(), expires_in))
    }

    async fn upload_image(&self, image: &[u8]) -> Result<String, PublishError> {
        if self.settings.imgbb_api_key.is_empty() {
            return Err(PublishError::ImageUpload(
                "imgbb API key not configured".to_string(),
            ));
        }
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let expiration = IMGBB_EXPIRATION_SECS.to_string();
        let resp = self
            .http
            .post(&self.settings.imgbb_upload_url)
            .form(&[
                ("key", self.settings.imgbb_api_key.as_str()),
                ("image", encoded.as_str()),
                ("expiration", expiration.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PublishError::ImageUpload(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(PublishError::ImageUpload(format!("HTTP {}", resp.status())));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| PublishError::ImageUpload(e.to_string()))?;
        parse_imgbb_url(&body)
    }

    async fn create_container(
        &self,
        ig_user_id: &str,
        image_url: &str,
        caption: &str,
        token: &str,
    ) -> Result<String, PublishError> {
        let resp = self
            .http
            .post(self.graph_url(&format!("{}/media", ig_user_id)))
            .form(&[
                ("image_url", image_url),
                ("caption", caption),
                ("access_token", token),
            ])
            .send()
            .await
            .map_err(|e| PublishError::Container(e.to_string()))?;
        let body = check_graph_response(resp).await?;
        response_id(&body).ok_or_else(|| PublishError::Container("response has no id".to_string()))
    }

    /// 轮询容器状态；网络错误只记日志继续轮询
    async fn wait_for_container(&self, creation_id: &str, token: &str) -> Result<(), PublishError> {
        let deadline = tokio::time::Instant::now() + self.poll_timeout;
        while tokio::time::Instant::now() < deadline {
            let polled = self
                .http
                .get(self.graph_url(creation_id))
                .query(&[("fields", "status_code,status"), ("access_token", token)])
                .send()
                .await;
            match polled {
                Ok(resp) => {
                    let body: Value = resp.json().await.unwrap_or(Value::Null);
                    match body.get("status_code").and_then(Value::as_str) {
                        Some("FINISHED") => return Ok(()),
                        Some("ERROR") => {
                            let status = body
                                .get("status")
                                .and_then(Value::as_str)
                                .unwrap_or("Unknown error");
                            return Err(PublishError::Container(format!(
                                "processing failed: {}",
                                status
                            )));
                        }
                        _ => {}
                    }
                }
                Err(e) => tracing::warn!(error = %e, "container status poll failed"),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        Err(PublishError::Container(format!(
            "processing timed out after {} seconds",
            self.poll_timeout.as_secs()
        )))
    }

    async fn publish_container(
        &self,
        ig_user_id: &str,
        creation_id: &str,
        token: &str,
    ) -> Result<String, PublishError> {
        let resp = self
            .http
            .post(self.graph_url(&format!("{}/media_publish", ig_user_id)))
            .form(&[("creation_id", creation_id), ("access_token", token)])
            .send()
            .await
            .map_err(|e| PublishError::Publish(e.to_string()))?;
        let body = check_graph_response(resp).await?;
        response_id(&body).ok_or_else(|| PublishError::Publish("response has no id".to_string()))
    }
}

#[async_trait]
impl DirectPublisher for InstagramPublisher {
    async fn is_configured(&self) -> bool {
        if self.settings.app_id.is_empty() || self.settings.app_secret.is_empty() {
            return false;
        }
        let Some(data) = self.load_token().await else {
            return false;
        };
        if data.access_token.is_empty() {
            return false;
        }
        data.expiry().map(|exp| exp >= Utc::now()).unwrap_or(true)
    }

    async fn publish(&self, image: &[u8], caption: &str) -> Result<PublishReceipt, PublishError> {
        let data = self.load_token().await.ok_or(PublishError::TokenExpired)?;
        let data = self.refresh_token_if_needed(data).await?;
        if data.access_token.is_empty() {
            return Err(PublishError::TokenExpired);
        }
        if data.ig_user_id.is_empty() {
            return Err(PublishError::Publish(
                "no Instagram user id in token file".to_string(),
            ));
        }
        let token = data.access_token.as_str();
        let ig_user_id = data.ig_user_id.as_str();

        let image_url = self.upload_image(image).await?;
        tracing::info!(url = %image_url, "image uploaded to temporary host");

        let creation_id = self
            .create_container(ig_user_id, &image_url, caption, token)
            .await?;
        tracing::info!(creation_id = %creation_id, "media container created");

        self.wait_for_container(&creation_id, token).await?;

        let media_id = self.publish_container(ig_user_id, &creation_id, token).await?;
        tracing::info!(media_id = %media_id, "published to Instagram");
        Ok(PublishReceipt { media_id })
    }
}

fn response_id(body: &Value) -> Option<String> {
    body.get("id").and_then(Value::as_str).map(String::from)
}

fn parse_imgbb_url(body: &Value) -> Result<String, PublishError> {
    if !body.get("success").and_then(Value::as_bool).unwrap_or(false) {
        return Err(PublishError::ImageUpload(format!("imgbb error: {}", body)));
    }
    body.pointer("/data/url")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| PublishError::ImageUpload("imgbb response has no url".to_string()))
}

async fn check_graph_response(resp: reqwest::Response) -> Result<Value, PublishError> {
    let status = resp.status().as_u16();
    let text = resp
        .text()
        .await
        .map_err(|e| PublishError::Publish(e.to_string()))?;
    if status >= 400 {
        return Err(map_graph_error(status, &text));
    }
    serde_json::from_str(&text)
        .map_err(|e| PublishError::Publish(format!("invalid response: {}", e)))
}

/// Graph API 错误映射：429 → 限流，code 190 → 令牌失效，其余 → Publish
pub(crate) fn map_graph_error(status: u16, body: &str) -> PublishError {
    if status == 429 {
        return PublishError::RateLimited {
            retry_after_minutes: RATE_LIMIT_RETRY_MINUTES,
        };
    }
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let Some(error) = parsed.as_ref().and_then(|v| v.get("error")) else {
        return PublishError::Publish(format!("Instagram API error: {}", body));
    };
    let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
    if code == TOKEN_EXPIRED_CODE {
        return PublishError::TokenExpired;
    }
    let message = error.get("message").and_then(Value::as_str).unwrap_or(body);
    PublishError::Publish(format!("Instagram API error ({}): {}", code, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(dir: &std::path::Path) -> InstagramSection {
        InstagramSection {
            app_id: "app".into(),
            app_secret: "secret".into(),
            token_file: dir.join("token.json"),
            ..Default::default()
        }
    }

    fn write_token(dir: &std::path::Path, expires_at: chrono::DateTime<Utc>) {
        let data = json!({
            "access_token": "tok",
            "ig_user_id": "1789",
            "expires_at": expires_at.to_rfc3339(),
            "page_id": "kept"
        });
        std::fs::write(dir.join("token.json"), data.to_string()).unwrap();
    }

    #[test]
    fn test_graph_error_mapping() {
        assert_eq!(
            map_graph_error(429, ""),
            PublishError::RateLimited {
                retry_after_minutes: 15
            }
        );
        assert_eq!(
            map_graph_error(400, r#"{"error":{"code":190,"message":"expired"}}"#),
            PublishError::TokenExpired
        );
        assert_eq!(
            map_graph_error(400, r#"{"error":{"code":100,"message":"bad param"}}"#),
            PublishError::Publish("Instagram API error (100): bad param".into())
        );
        assert!(matches!(map_graph_error(500, "oops"), PublishError::Publish(m) if m.contains("oops")));
    }

    #[tokio::test]
    async fn test_is_configured_requires_credentials_and_fresh_token() {
        let dir = tempfile::tempdir().unwrap();

        let publisher = InstagramPublisher::new(settings(dir.path()));
        assert!(!publisher.is_configured().await, "no token file yet");

        write_token(dir.path(), Utc::now() + chrono::Duration::days(30));
        assert!(publisher.is_configured().await);

        write_token(dir.path(), Utc::now() - chrono::Duration::days(1));
        assert!(!publisher.is_configured().await);

        std::fs::write(dir.path().join("token.json"), "{not json").unwrap();
        assert!(!publisher.is_configured().await);

        let mut no_app = settings(dir.path());
        no_app.app_id.clear();
        write_token(dir.path(), Utc::now() + chrono::Duration::days(30));
        assert!(!InstagramPublisher::new(no_app).is_configured().await);
    }

    #[tokio::test]
    async fn test_expired_token_rejected_before_network() {
        let dir = tempfile::tempdir().unwrap();
        write_token(dir.path(), Utc::now() - chrono::Duration::hours(1));
        let publisher = InstagramPublisher::new(settings(dir.path()));
        let err = publisher.publish(b"img", "caption").await.unwrap_err();
        assert_eq!(err, PublishError::TokenExpired);
    }

    #[test]
    fn test_token_data_keeps_unknown_fields() {
        let data: TokenData =
            serde_json::from_str(r#"{"access_token":"t","ig_user_id":"1","page_id":"p"}"#).unwrap();
        assert!(data.expiry().is_none());
        let back = serde_json::to_value(&data).unwrap();
        assert_eq!(back["page_id"], "p");
    }

    #[test]
    fn test_imgbb_response_parsing() {
        let ok = json!({"success": true, "data": {"url": "https://i.ibb.co/x.png"}});
        assert_eq!(parse_imgbb_url(&ok).unwrap(), "https://i.ibb.co/x.png");
        let bad = json!({"success": false});
        assert!(matches!(parse_imgbb_url(&bad), Err(PublishError::ImageUpload(_))));
    }
}
